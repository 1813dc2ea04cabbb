//! Second pass over a raw store: re-visit profiles whose specialty, hospital
//! or location came back empty and fill in whatever the page now yields.

use std::thread;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::fetch::{Fetcher, HttpFetcher};
use super::profile::fetch_profile;
use super::Politeness;
use crate::error::{FetchError, StoreIoError};
use crate::record::{Field, RawRecord};
use crate::settings::CollectorSettings;
use crate::store::Checkpoint;

pub const REPAIR_CHECKPOINT_EVERY: usize = 50;

pub const REPAIRABLE: [Field; 3] = [Field::Specialty, Field::Hospital, Field::Location];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub total: usize,
    pub candidates: usize,
    /// Records that gained at least one field.
    pub repaired: usize,
    pub failed: usize,
    pub specialty_filled: usize,
    pub hospital_filled: usize,
    pub location_filled: usize,
}

impl RepairStats {
    fn count(&mut self, field: Field) {
        match field {
            Field::Specialty => self.specialty_filled += 1,
            Field::Hospital => self.hospital_filled += 1,
            Field::Location => self.location_filled += 1,
            _ => {}
        }
    }
}

pub struct Repairer<F> {
    fetcher: F,
    politeness: Politeness,
}

impl Repairer<HttpFetcher> {
    pub fn open(settings: &CollectorSettings) -> Result<Self, FetchError> {
        Ok(Self::new(HttpFetcher::new(settings)?))
    }
}

impl<F: Fetcher> Repairer<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            politeness: Politeness::COURTEOUS,
        }
    }

    #[cfg(test)]
    fn without_delays(mut self) -> Self {
        self.politeness = Politeness::NONE;
        self
    }

    pub fn needs_repair(record: &RawRecord) -> bool {
        !record.profile_reference.is_empty() && REPAIRABLE.iter().any(|f| !record.has(*f))
    }

    /// Re-extract `record` and copy over only the repairable fields it is
    /// missing. Returns the fields that were filled.
    pub fn repair_record(&self, record: &mut RawRecord) -> Result<Vec<Field>, FetchError> {
        let fresh = fetch_profile(&self.fetcher, &record.profile_reference)?;
        let mut filled = Vec::new();
        for field in REPAIRABLE {
            if !record.has(field) && fresh.has(field) {
                *record.field_mut(field) = fresh.field(field).to_string();
                filled.push(field);
            }
        }
        Ok(filled)
    }

    /// Repair every candidate of `source` into `target`. `source` is only
    /// read; `target` receives the full record set.
    pub fn run<S, T>(&self, source: &S, target: &mut T) -> Result<RepairStats, StoreIoError>
    where
        S: Checkpoint,
        T: Checkpoint,
    {
        let mut records = source.restore()?;
        let candidates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| Self::needs_repair(r))
            .map(|(i, _)| i)
            .collect();

        let mut stats = RepairStats {
            total: records.len(),
            candidates: candidates.len(),
            ..RepairStats::default()
        };
        info!(total = stats.total, candidates = stats.candidates, "repairing");

        let pb = ProgressBar::new(candidates.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({eta})") {
            pb.set_style(style.progress_chars("=> "));
        }

        for (processed, idx) in candidates.into_iter().enumerate() {
            if processed > 0 {
                thread::sleep(self.politeness.profile_delay);
            }
            let record = &mut records[idx];
            match self.repair_record(record) {
                Ok(filled) => {
                    if !filled.is_empty() {
                        stats.repaired += 1;
                    }
                    for field in filled {
                        stats.count(field);
                    }
                }
                Err(e) => {
                    warn!(profile = %record.profile_reference, "repair skipped: {}", e);
                    stats.failed += 1;
                }
            }
            pb.inc(1);

            if (processed + 1) % REPAIR_CHECKPOINT_EVERY == 0 {
                target.persist(&records)?;
                info!(processed = processed + 1, "repair checkpoint saved");
            }
        }
        pb.finish_and_clear();

        target.persist(&records)?;
        info!(
            repaired = stats.repaired,
            failed = stats.failed,
            specialty = stats.specialty_filled,
            hospital = stats.hospital_filled,
            location = stats.location_filled,
            "repair finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::testing::{profile_html, MemoryCheckpoint, MemoryFetcher};

    fn stored(reference: &str, specialty: &str, hospital: &str) -> RawRecord {
        RawRecord {
            name: "Dr. Stored Name".into(),
            specialty: specialty.into(),
            hospital: hospital.into(),
            location: "Dhaka, Bangladesh".into(),
            ..RawRecord::new(reference)
        }
    }

    #[test]
    fn fills_only_missing_fields() {
        let url = "https://sasthyaseba.com/doctors/a";
        let repairer = Repairer::new(MemoryFetcher::default().with(url, &profile_html("Dr. Fresh"))).without_delays();

        let mut record = stored(url, "", "Old Clinic");
        let filled = repairer.repair_record(&mut record).unwrap();
        assert_eq!(filled, [Field::Specialty]);
        assert_eq!(record.specialty, "Cardiologist");
        assert_eq!(record.hospital, "Old Clinic");
        assert_eq!(record.location, "Dhaka, Bangladesh");
        assert_eq!(record.name, "Dr. Stored Name");
    }

    #[test]
    fn source_untouched_target_written() {
        let a = "https://sasthyaseba.com/doctors/a";
        let b = "https://sasthyaseba.com/doctors/b";
        let c = "https://sasthyaseba.com/doctors/c";
        let fetcher = MemoryFetcher::default()
            .with(a, &profile_html("Dr. A"))
            .with(c, &profile_html("Dr. C"));
        let repairer = Repairer::new(fetcher).without_delays();

        let source = MemoryCheckpoint {
            records: vec![stored(a, "", ""), stored(b, "", "X Hospital"), stored(c, "Dentist", "Y Clinic")],
            persists: 0,
        };
        let mut target = MemoryCheckpoint::default();
        let stats = repairer.run(&source, &mut target).unwrap();

        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.repaired, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.hospital_filled, 1);
        assert_eq!(repairer.fetcher.requested(c), 0);

        assert_eq!(source.records[0].specialty, "");
        assert_eq!(target.records[0].hospital, "Popular Medical College Hospital");
        assert_eq!(target.records.len(), 3);
        assert_eq!(target.persists, 1);
    }

    #[test]
    fn checkpoints_every_fifty() {
        let mut fetcher = MemoryFetcher::default();
        let mut records = Vec::new();
        for i in 0..120 {
            let url = format!("https://sasthyaseba.com/doctors/d{i}");
            fetcher = fetcher.with(&url, &profile_html("Dr. D"));
            records.push(stored(&url, "", "Z Hospital"));
        }
        let source = MemoryCheckpoint { records, persists: 0 };
        let mut target = MemoryCheckpoint::default();
        let stats = Repairer::new(fetcher).without_delays().run(&source, &mut target).unwrap();
        assert_eq!(stats.specialty_filled, 120);
        assert_eq!(target.persists, 3);
    }
}
