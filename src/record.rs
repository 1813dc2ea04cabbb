//! Raw and clean profile records as they appear in the CSV stores.

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::is_blank;

/// Sentinel for a specialty that matched nothing in the vocabulary.
pub const UNCLASSIFIED: &str = "unclassified";

/// The six descriptive text fields of a profile (everything but the key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Qualifications,
    Specialty,
    ExperienceRaw,
    Hospital,
    Location,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Qualifications,
        Field::Specialty,
        Field::ExperienceRaw,
        Field::Hospital,
        Field::Location,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Qualifications => "qualifications",
            Field::Specialty => "specialty",
            Field::ExperienceRaw => "experience_raw",
            Field::Hospital => "hospital",
            Field::Location => "location",
        }
    }
}

/// One scraped profile. Appended once to the raw store, never edited there.
///
/// Reading accepts the column names of the older exports (`profile_url`,
/// `experience`) and turns their `N/A` placeholder into an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(alias = "profile_url")]
    pub profile_reference: String,
    #[serde(default, deserialize_with = "placeholder_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "placeholder_as_empty")]
    pub qualifications: String,
    #[serde(default, deserialize_with = "placeholder_as_empty")]
    pub specialty: String,
    #[serde(default, alias = "experience", deserialize_with = "placeholder_as_empty")]
    pub experience_raw: String,
    #[serde(default, deserialize_with = "placeholder_as_empty")]
    pub hospital: String,
    #[serde(default, deserialize_with = "placeholder_as_empty")]
    pub location: String,
}

impl RawRecord {
    pub const HEADER: [&'static str; 7] = [
        "profile_reference",
        "name",
        "qualifications",
        "specialty",
        "experience_raw",
        "hospital",
        "location",
    ];

    /// Empty record for `reference`; fields are filled by extraction.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            profile_reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Qualifications => &self.qualifications,
            Field::Specialty => &self.specialty,
            Field::ExperienceRaw => &self.experience_raw,
            Field::Hospital => &self.hospital,
            Field::Location => &self.location,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Qualifications => &mut self.qualifications,
            Field::Specialty => &mut self.specialty,
            Field::ExperienceRaw => &mut self.experience_raw,
            Field::Hospital => &mut self.hospital,
            Field::Location => &mut self.location,
        }
    }

    pub fn has(&self, field: Field) -> bool {
        !is_blank(self.field(field))
    }
}

fn placeholder_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if is_blank(&value) {
        Ok(String::new())
    } else {
        Ok(value)
    }
}

/// A raw record that passed every gate, with its standardized fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CleanRow", into = "CleanRow")]
pub struct CleanRecord {
    pub raw: RawRecord,
    pub experience_years: Option<u8>,
    pub specialty_normalized: String,
    pub country: Option<String>,
}

impl CleanRecord {
    pub const HEADER: [&'static str; 10] = [
        "profile_reference",
        "name",
        "qualifications",
        "specialty",
        "experience_raw",
        "hospital",
        "location",
        "experience_years",
        "specialty_normalized",
        "country",
    ];

    pub fn reference(&self) -> &str {
        &self.raw.profile_reference
    }
}

impl From<RawRecord> for CleanRecord {
    fn from(raw: RawRecord) -> Self {
        Self {
            raw,
            experience_years: None,
            specialty_normalized: UNCLASSIFIED.to_string(),
            country: None,
        }
    }
}

// CSV rows are flat; the csv crate cannot serialize nested/flattened structs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CleanRow {
    profile_reference: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    qualifications: String,
    #[serde(default)]
    specialty: String,
    #[serde(default)]
    experience_raw: String,
    #[serde(default)]
    hospital: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    experience_years: Option<u8>,
    #[serde(default)]
    specialty_normalized: String,
    #[serde(default)]
    country: Option<String>,
}

impl From<CleanRecord> for CleanRow {
    fn from(r: CleanRecord) -> Self {
        let RawRecord {
            profile_reference,
            name,
            qualifications,
            specialty,
            experience_raw,
            hospital,
            location,
        } = r.raw;
        Self {
            profile_reference,
            name,
            qualifications,
            specialty,
            experience_raw,
            hospital,
            location,
            experience_years: r.experience_years,
            specialty_normalized: r.specialty_normalized,
            country: r.country,
        }
    }
}

impl From<CleanRow> for CleanRecord {
    fn from(row: CleanRow) -> Self {
        Self {
            raw: RawRecord {
                profile_reference: row.profile_reference,
                name: row.name,
                qualifications: row.qualifications,
                specialty: row.specialty,
                experience_raw: row.experience_raw,
                hospital: row.hospital,
                location: row.location,
            },
            experience_years: row.experience_years,
            specialty_normalized: row.specialty_normalized,
            country: row.country.filter(|c| !c.is_empty()),
        }
    }
}
