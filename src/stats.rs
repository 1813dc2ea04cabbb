//! Column completeness and distribution summaries for raw and clean stores.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::record::{CleanRecord, Field, RawRecord, UNCLASSIFIED};

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetProfile {
    pub total: usize,
    /// (column, non-empty count), in column order.
    pub fill: Vec<(&'static str, usize)>,
    /// (country, records), most frequent first. Empty for raw data.
    pub countries: Vec<(String, usize)>,
    pub distinct_specialties: usize,
}

impl DatasetProfile {
    pub fn missing(&self, column: &str) -> Option<usize> {
        self.fill
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, n)| self.total - n)
    }

    pub fn render(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## {title}");
        let _ = writeln!(out, "- records: {}", self.total);
        if self.total == 0 {
            return out;
        }
        for (column, filled) in &self.fill {
            let _ = writeln!(
                out,
                "- {column}: {filled}/{} ({:.1}%), missing {}",
                self.total,
                percent(*filled, self.total),
                self.total - filled
            );
        }
        if !self.countries.is_empty() {
            let _ = writeln!(out, "- countries:");
            for (country, n) in &self.countries {
                let _ = writeln!(out, "  - {country}: {n} ({:.1}%)", percent(*n, self.total));
            }
        }
        let _ = writeln!(out, "- distinct specialties: {}", self.distinct_specialties);
        out
    }
}

pub fn profile_raw(records: &[RawRecord]) -> DatasetProfile {
    let fill = Field::ALL
        .iter()
        .map(|f| (f.column(), records.iter().filter(|r| r.has(*f)).count()))
        .collect();
    let distinct_specialties = records
        .iter()
        .filter(|r| r.has(Field::Specialty))
        .map(|r| r.specialty.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len();
    DatasetProfile {
        total: records.len(),
        fill,
        countries: Vec::new(),
        distinct_specialties,
    }
}

pub fn profile_clean(records: &[CleanRecord]) -> DatasetProfile {
    let raw: Vec<&RawRecord> = records.iter().map(|r| &r.raw).collect();
    let mut fill: Vec<(&'static str, usize)> = Field::ALL
        .iter()
        .map(|f| (f.column(), raw.iter().filter(|r| r.has(*f)).count()))
        .collect();
    fill.push((
        "experience_years",
        records.iter().filter(|r| r.experience_years.is_some()).count(),
    ));
    fill.push((
        "specialty_normalized",
        records
            .iter()
            .filter(|r| r.specialty_normalized != UNCLASSIFIED)
            .count(),
    ));
    fill.push(("country", records.iter().filter(|r| r.country.is_some()).count()));

    let mut by_country: HashMap<&str, usize> = HashMap::new();
    for country in records.iter().filter_map(|r| r.country.as_deref()) {
        *by_country.entry(country).or_default() += 1;
    }
    let mut countries: Vec<(String, usize)> = by_country
        .into_iter()
        .map(|(c, n)| (c.to_string(), n))
        .collect();
    countries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let distinct_specialties = records
        .iter()
        .map(|r| r.specialty_normalized.as_str())
        .filter(|s| *s != UNCLASSIFIED)
        .collect::<HashSet<_>>()
        .len();

    DatasetProfile {
        total: records.len(),
        fill,
        countries,
        distinct_specialties,
    }
}

pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}
