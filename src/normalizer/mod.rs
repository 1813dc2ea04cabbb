//! Raw store in, clean store out: an ordered pipeline of validation and
//! standardization stages with per-stage counts.

pub mod report;
pub mod stages;
pub mod vocab;

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::StoreIoError;
use crate::record::{CleanRecord, Field, RawRecord, UNCLASSIFIED};
use crate::settings::NormalizerSettings;
use crate::stats::{self, DatasetProfile};
use crate::store::{read_records, write_records};
use report::{new_run_id, StageTracker};
use stages::{StageContext, PIPELINE};
use vocab::{CountryVocabulary, SpecialtyVocabulary};

pub const DEFAULT_MAX_EXPERIENCE_YEARS: u8 = 70;

/// A field a clean record must carry to survive the final gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Qualifications,
    /// The scraped specialty text is non-empty.
    Specialty,
    /// The specialty matched the vocabulary.
    ClassifiedSpecialty,
    ExperienceRaw,
    ExperienceYears,
    Hospital,
    Location,
    Country,
}

impl RequiredField {
    pub fn is_present(self, r: &CleanRecord) -> bool {
        match self {
            RequiredField::Name => r.raw.has(Field::Name),
            RequiredField::Qualifications => r.raw.has(Field::Qualifications),
            RequiredField::Specialty => r.raw.has(Field::Specialty),
            RequiredField::ClassifiedSpecialty => r.specialty_normalized != UNCLASSIFIED,
            RequiredField::ExperienceRaw => r.raw.has(Field::ExperienceRaw),
            RequiredField::ExperienceYears => r.experience_years.is_some(),
            RequiredField::Hospital => r.raw.has(Field::Hospital),
            RequiredField::Location => r.raw.has(Field::Location),
            RequiredField::Country => r.country.is_some(),
        }
    }
}

/// Everything the stages consult. Built once, never mutated by a run.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub specialties: SpecialtyVocabulary,
    pub countries: CountryVocabulary,
    pub allowed_countries: Vec<String>,
    pub required_fields: Vec<RequiredField>,
    /// Qualification prefixes that mark a registration-number-only profile.
    pub placeholder_markers: Vec<String>,
    /// Qualification tokens that are site chrome, not degrees.
    pub qualification_noise: Vec<String>,
    pub max_experience_years: u8,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            specialties: SpecialtyVocabulary::standard(),
            countries: CountryVocabulary::standard(),
            allowed_countries: vec!["Bangladesh".to_string(), "India".to_string()],
            required_fields: vec![
                RequiredField::Hospital,
                RequiredField::Location,
                RequiredField::Specialty,
            ],
            placeholder_markers: vec!["BMDC".to_string(), "Doctor Reg".to_string()],
            qualification_noise: vec![
                "Domiciliary Services".to_string(),
                "Find Doctor".to_string(),
            ],
            max_experience_years: DEFAULT_MAX_EXPERIENCE_YEARS,
        }
    }
}

impl NormalizerConfig {
    pub fn from_settings(settings: &NormalizerSettings) -> Self {
        Self {
            allowed_countries: settings.allowed_countries.clone(),
            required_fields: settings.required_fields.clone(),
            ..Self::default()
        }
    }
}

pub struct NormalizeOutcome {
    pub records: Vec<CleanRecord>,
    pub tracker: StageTracker,
    pub before: DatasetProfile,
    pub after: DatasetProfile,
}

pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Run every stage in order over `raw`. Touches no files.
    pub fn normalize(&self, raw: Vec<RawRecord>, restrict_countries: bool) -> (Vec<CleanRecord>, StageTracker) {
        let ctx = StageContext {
            config: &self.config,
            restrict_countries,
        };
        let mut tracker = StageTracker::new(new_run_id());
        let mut records: Vec<CleanRecord> = raw.into_iter().map(CleanRecord::from).collect();

        for stage in PIPELINE {
            let input = records.len();
            let out = (stage.apply)(records, &ctx);
            tracker.record(stage.name, input, out.records.len(), out.altered);
            records = out.records;
        }
        (records, tracker)
    }

    /// Load `input`, normalize, and rewrite `output` from scratch.
    pub fn run(&self, input: &Path, output: &Path, restrict_countries: bool) -> Result<NormalizeOutcome, StoreIoError> {
        let raw: Vec<RawRecord> = read_records(input)?;
        info!(path = %input.display(), records = raw.len(), restrict_countries, "normalizing");
        let before = stats::profile_raw(&raw);

        let (records, mut tracker) = self.normalize(raw, restrict_countries);
        write_records(output, &CleanRecord::HEADER, &records)?;
        tracker.record("persist", records.len(), records.len(), 0);
        info!(path = %output.display(), records = records.len(), "clean store written");

        let after = stats::profile_clean(&records);
        Ok(NormalizeOutcome {
            records,
            tracker,
            before,
            after,
        })
    }
}
