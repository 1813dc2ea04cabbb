//! The cleaning pipeline as an ordered list of pure steps.
//!
//! Each step takes the working set by value and hands back the surviving
//! records plus how many of them it changed. Removal counts are derived by
//! the caller from the input/output sizes.

use std::collections::HashSet;
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use super::NormalizerConfig;
use crate::record::{CleanRecord, Field, RawRecord, UNCLASSIFIED};
use crate::utils::{collapse_whitespace, is_blank};

static FIRST_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

const LABEL_PREFIXES: &[&str] = &["Qualifications:", "Qualification:", "Degrees:", "Degree:", "Education:"];

pub struct StageContext<'a> {
    pub config: &'a NormalizerConfig,
    pub restrict_countries: bool,
}

pub struct Transformed {
    pub records: Vec<CleanRecord>,
    pub altered: usize,
}

impl Transformed {
    fn filtered(records: Vec<CleanRecord>) -> Self {
        Self { records, altered: 0 }
    }
}

pub type StageFn = fn(Vec<CleanRecord>, &StageContext<'_>) -> Transformed;

#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub apply: StageFn,
}

pub const PIPELINE: [Stage; 9] = [
    Stage { name: "reject placeholder profiles", apply: reject_placeholder_profiles },
    Stage { name: "reject repeated values", apply: reject_repeated_values },
    Stage { name: "clean qualifications", apply: clean_qualifications },
    Stage { name: "standardize experience", apply: standardize_experience },
    Stage { name: "standardize specialty", apply: standardize_specialty },
    Stage { name: "extract country", apply: extract_country },
    Stage { name: "country filter", apply: filter_countries },
    Stage { name: "deduplicate", apply: deduplicate },
    Stage { name: "drop missing critical", apply: drop_missing_critical },
];

// ── 1. placeholder profiles ──

pub fn reject_placeholder_profiles(records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    let markers = &ctx.config.placeholder_markers;
    Transformed::filtered(
        records
            .into_iter()
            .filter(|r| !is_placeholder_profile(&r.raw, markers))
            .collect(),
    )
}

/// Registration-ID marker where degrees should be, or nothing scraped at all.
fn is_placeholder_profile(r: &RawRecord, markers: &[String]) -> bool {
    let quals = r.qualifications.trim().to_lowercase();
    let marker_only = markers
        .iter()
        .any(|m| !m.is_empty() && quals.starts_with(&m.to_lowercase()));
    marker_only || Field::ALL.iter().all(|f| !r.has(*f))
}

// ── 2. repeated values ──

pub fn reject_repeated_values(records: Vec<CleanRecord>, _ctx: &StageContext<'_>) -> Transformed {
    Transformed::filtered(
        records
            .into_iter()
            .filter(|r| !has_repeated_values(&r.raw))
            .collect(),
    )
}

/// Two different fields holding the same text is a broken extraction.
fn has_repeated_values(r: &RawRecord) -> bool {
    let mut seen = HashSet::new();
    Field::ALL
        .iter()
        .map(|f| r.field(*f).trim())
        .filter(|v| !is_blank(v))
        .any(|v| !seen.insert(v))
}

// ── 3. qualifications ──

pub fn clean_qualifications(mut records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    let mut altered = 0;
    for r in records.iter_mut() {
        let cleaned = clean_qualification_text(&r.raw.qualifications, &ctx.config.qualification_noise);
        if cleaned != r.raw.qualifications {
            r.raw.qualifications = cleaned;
            altered += 1;
        }
    }
    Transformed { records, altered }
}

pub(crate) fn clean_qualification_text(text: &str, noise: &[String]) -> String {
    let mut seen = HashSet::new();
    text.split(',')
        .map(|token| strip_label(&collapse_whitespace(token)))
        .filter(|t| !is_blank(t))
        .filter(|t| !noise.iter().any(|n| t.eq_ignore_ascii_case(n)))
        .filter(|t| seen.insert(t.to_lowercase()))
        .join(", ")
}

fn strip_label(token: &str) -> String {
    LABEL_PREFIXES
        .iter()
        .find_map(|p| token.strip_prefix(p))
        .unwrap_or(token)
        .trim()
        .to_string()
}

// ── 4. experience ──

pub fn standardize_experience(mut records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    let mut altered = 0;
    for r in records.iter_mut() {
        r.experience_years = parse_experience(&r.raw.experience_raw, ctx.config.max_experience_years);
        if r.experience_years.is_some() {
            altered += 1;
        }
    }
    Transformed { records, altered }
}

/// First integer in the text, kept only when it lies in `0..=max`.
pub(crate) fn parse_experience(raw: &str, max: u8) -> Option<u8> {
    let digits = FIRST_INT_RE.find(raw)?;
    let years: u32 = digits.as_str().parse().ok()?;
    (years <= u32::from(max)).then_some(years as u8)
}

// ── 5. specialty ──

pub fn standardize_specialty(mut records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    let mut altered = 0;
    for r in records.iter_mut() {
        match ctx.config.specialties.classify(&r.raw.specialty) {
            Some(name) => {
                r.specialty_normalized = name.to_string();
                altered += 1;
            }
            None => r.specialty_normalized = UNCLASSIFIED.to_string(),
        }
    }
    Transformed { records, altered }
}

// ── 6. country ──

pub fn extract_country(mut records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    let mut altered = 0;
    for r in records.iter_mut() {
        r.country = ctx.config.countries.find(&r.raw.location).map(str::to_string);
        if r.country.is_some() {
            altered += 1;
        }
    }
    Transformed { records, altered }
}

// ── 7. optional country filter ──

pub fn filter_countries(records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    if !ctx.restrict_countries {
        return Transformed::filtered(records);
    }
    let allowed = &ctx.config.allowed_countries;
    Transformed::filtered(
        records
            .into_iter()
            .filter(|r| {
                r.country
                    .as_deref()
                    .is_some_and(|c| allowed.iter().any(|a| a.eq_ignore_ascii_case(c)))
            })
            .collect(),
    )
}

// ── 8. dedup ──

pub fn deduplicate(records: Vec<CleanRecord>, _ctx: &StageContext<'_>) -> Transformed {
    let mut seen = HashSet::new();
    Transformed::filtered(
        records
            .into_iter()
            .filter(|r| seen.insert(r.reference().to_string()))
            .collect(),
    )
}

// ── 9. critical fields ──

pub fn drop_missing_critical(records: Vec<CleanRecord>, ctx: &StageContext<'_>) -> Transformed {
    let required = &ctx.config.required_fields;
    Transformed::filtered(
        records
            .into_iter()
            .filter(|r| required.iter().all(|f| f.is_present(r)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::RequiredField;

    fn raw(reference: &str) -> RawRecord {
        RawRecord {
            name: "Dr. Rahim Uddin".into(),
            qualifications: "MBBS, FCPS (Medicine)".into(),
            specialty: "Medicine Specialist".into(),
            experience_raw: "12 Years of Experience".into(),
            hospital: "Dhaka Medical College Hospital".into(),
            location: "Bakshibazar, Dhaka, Bangladesh".into(),
            ..RawRecord::new(reference)
        }
    }

    fn run(stage: StageFn, records: Vec<RawRecord>, restrict: bool) -> Transformed {
        let config = NormalizerConfig::default();
        let ctx = StageContext { config: &config, restrict_countries: restrict };
        stage(records.into_iter().map(CleanRecord::from).collect(), &ctx)
    }

    #[test]
    fn placeholder_marker_profiles_dropped() {
        let mut bmdc = raw("R1");
        bmdc.qualifications = "BMDC Reg. No: A-12345".into();
        let mut empty = RawRecord::new("R2");
        empty.name = " N/A ".into();
        let out = run(reject_placeholder_profiles, vec![bmdc, empty, raw("R3")], false);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].reference(), "R3");
    }

    #[test]
    fn repeated_values_dropped() {
        let mut broken = raw("R1");
        broken.specialty = broken.hospital.clone();
        let mut blanks = raw("R2");
        blanks.specialty = String::new();
        blanks.experience_raw = String::new();
        let out = run(reject_repeated_values, vec![broken, blanks], false);
        // two empty fields are not a repetition
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].reference(), "R2");
    }

    #[test]
    fn qualification_noise_removed() {
        let noise = NormalizerConfig::default().qualification_noise;
        assert_eq!(
            clean_qualification_text("Domiciliary Services, Find Doctor, MBBS, FCPS (Medicine)", &noise),
            "MBBS, FCPS (Medicine)"
        );
        assert_eq!(
            clean_qualification_text("Qualifications: MBBS,  MD ,MBBS,, ", &noise),
            "MBBS, MD"
        );
        assert_eq!(clean_qualification_text("Find Doctor", &noise), "");
    }

    #[test]
    fn qualification_stage_counts_changes() {
        let mut noisy = raw("R1");
        noisy.qualifications = "Find Doctor, MBBS".into();
        let out = run(clean_qualifications, vec![noisy, raw("R2")], false);
        assert_eq!(out.altered, 1);
        assert_eq!(out.records[0].raw.qualifications, "MBBS");
    }

    #[test]
    fn experience_parsing() {
        assert_eq!(parse_experience("15 years", 70), Some(15));
        assert_eq!(parse_experience("Experience Overall: 0 Years", 70), Some(0));
        assert_eq!(parse_experience("70+ Years of Experience", 70), Some(70));
        assert_eq!(parse_experience("71 Years", 70), None);
        assert_eq!(parse_experience("Since 1998", 70), None);
        assert_eq!(parse_experience("Years of Experience", 70), None);
        assert_eq!(parse_experience("99999999999999999999", 70), None);
        assert_eq!(parse_experience("", 70), None);
    }

    #[test]
    fn experience_never_drops() {
        let mut odd = raw("R1");
        odd.experience_raw = "many".into();
        let out = run(standardize_experience, vec![odd, raw("R2")], false);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].experience_years, None);
        assert_eq!(out.records[1].experience_years, Some(12));
        assert_eq!(out.altered, 1);
    }

    #[test]
    fn specialty_falls_back_to_unclassified() {
        let mut odd = raw("R1");
        odd.specialty = "Something Else".into();
        let out = run(standardize_specialty, vec![odd, raw("R2")], false);
        assert_eq!(out.records[0].specialty_normalized, UNCLASSIFIED);
        assert_eq!(out.records[1].specialty_normalized, "Medicine Specialist");
    }

    #[test]
    fn country_filter_only_when_restricted() {
        let mut abroad = raw("R1");
        abroad.location = "Karachi, Pakistan".into();
        let mut unknown = raw("R2");
        unknown.location = "Somewhere".into();

        let config = NormalizerConfig::default();
        let ctx = StageContext { config: &config, restrict_countries: true };
        let with_country = extract_country(
            vec![abroad, unknown, raw("R3")].into_iter().map(CleanRecord::from).collect(),
            &ctx,
        );
        assert_eq!(with_country.altered, 2);

        let kept = filter_countries(with_country.records.clone(), &ctx);
        assert_eq!(kept.records.len(), 1);
        assert_eq!(kept.records[0].country.as_deref(), Some("Bangladesh"));

        let open = StageContext { config: &config, restrict_countries: false };
        assert_eq!(filter_countries(with_country.records, &open).records.len(), 3);
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let first = raw("R1");
        let mut second = raw("R1");
        second.name = "Dr. Someone Else".into();
        let out = run(deduplicate, vec![first, second, raw("R2")], false);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].raw.name, "Dr. Rahim Uddin");
    }

    #[test]
    fn missing_hospital_dropped() {
        let mut no_hospital = raw("R1");
        no_hospital.hospital = String::new();
        let out = run(drop_missing_critical, vec![no_hospital, raw("R2")], false);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].reference(), "R2");
    }

    #[test]
    fn required_set_is_configuration() {
        let mut config = NormalizerConfig::default();
        config.required_fields = vec![RequiredField::Name];
        let ctx = StageContext { config: &config, restrict_countries: false };
        let mut no_hospital = raw("R1");
        no_hospital.hospital = String::new();
        let out = drop_missing_critical(vec![CleanRecord::from(no_hospital)], &ctx);
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn pipeline_order_is_fixed() {
        let names: Vec<&str> = PIPELINE.iter().map(|s| s.name).collect();
        assert_eq!(names.first(), Some(&"reject placeholder profiles"));
        assert_eq!(names[1], "reject repeated values");
        assert_eq!(names.last(), Some(&"drop missing critical"));
    }
}
