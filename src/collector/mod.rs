//! Walks the directory listing for one population and appends every new
//! profile to a checkpointed raw store.

pub mod fetch;
pub mod listing;
pub mod profile;
pub mod repair;

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::error::{EtlError, FetchError, StoreIoError};
use crate::record::RawRecord;
use crate::settings::CollectorSettings;
use crate::stats::{self, DatasetProfile};
use crate::store::{reference_set, Checkpoint, CsvStore};
use fetch::{Fetcher, HttpFetcher};
use listing::{listing_url, profile_references};

/// New records between two full persists of the store.
pub const CHECKPOINT_EVERY: usize = 25;

/// Which slice of the directory to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    All,
    Bangladesh,
    India,
}

impl Population {
    /// The directory's own `country_id`.
    pub fn listing_id(self) -> Option<u32> {
        match self {
            Population::All => None,
            Population::Bangladesh => Some(18),
            Population::India => Some(103),
        }
    }

    /// Known number of listing pages.
    pub fn page_count(self) -> u32 {
        match self {
            Population::All => 355,
            Population::Bangladesh => 310,
            Population::India => 45,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Population::All => "all",
            Population::Bangladesh => "bangladesh",
            Population::India => "india",
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown population '{0}' (expected all, bangladesh or india)")]
pub struct UnknownPopulation(String);

impl FromStr for Population {
    type Err = UnknownPopulation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Population::All),
            "bangladesh" | "bd" => Ok(Population::Bangladesh),
            "india" | "in" => Ok(Population::India),
            _ => Err(UnknownPopulation(s.to_string())),
        }
    }
}

/// Fixed sleeps between requests.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Politeness {
    pub page_delay: Duration,
    pub profile_delay: Duration,
}

impl Politeness {
    pub const COURTEOUS: Self = Self {
        page_delay: Duration::from_secs(1),
        profile_delay: Duration::from_millis(500),
    };

    #[cfg(test)]
    pub const NONE: Self = Self {
        page_delay: Duration::ZERO,
        profile_delay: Duration::ZERO,
    };
}

#[derive(Debug, Clone, Default)]
pub struct CollectStats {
    pub pages_ok: usize,
    pub pages_failed: usize,
    pub appended: usize,
    pub profiles_failed: usize,
    /// References seen on listing pages that were already stored.
    pub skipped: usize,
    pub checkpoints: usize,
    pub limit_reached: bool,
    pub store: Option<DatasetProfile>,
}

impl CollectStats {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Pages: {} ok, {} failed | Profiles: {} new, {} failed, {} already stored",
            self.pages_ok, self.pages_failed, self.appended, self.profiles_failed, self.skipped
        );
        if self.limit_reached {
            let _ = writeln!(out, "Stopped early: record limit reached");
        }
        if let Some(store) = &self.store {
            let _ = writeln!(out, "Store: {} records", store.total);
            for (column, filled) in &store.fill {
                let _ = writeln!(
                    out,
                    "  {:<15} {}/{} ({:.1}%)",
                    column,
                    filled,
                    store.total,
                    stats::percent(*filled, store.total)
                );
            }
        }
        out
    }
}

pub struct Collector<F, C> {
    fetcher: F,
    checkpoint: C,
    population: Population,
    base: Url,
    politeness: Politeness,
    limit: Option<usize>,
    max_pages: Option<u32>,
}

impl Collector<HttpFetcher, CsvStore> {
    /// HTTP fetcher plus a CSV store at `output`.
    pub fn open(
        output: impl Into<PathBuf>,
        population: Population,
        settings: &CollectorSettings,
    ) -> Result<Self, EtlError> {
        let base = Url::parse(&settings.base_url).map_err(|source| FetchError::BadUrl {
            url: settings.base_url.clone(),
            source,
        })?;
        let fetcher = HttpFetcher::new(settings)?;
        Ok(Self::new(fetcher, CsvStore::new(output), population, base))
    }
}

impl<F: Fetcher, C: Checkpoint> Collector<F, C> {
    pub fn new(fetcher: F, checkpoint: C, population: Population, base: Url) -> Self {
        Self {
            fetcher,
            checkpoint,
            population,
            base,
            politeness: Politeness::COURTEOUS,
            limit: None,
            max_pages: None,
        }
    }

    /// Stop after this many new records.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Walk at most this many listing pages.
    pub fn with_max_pages(mut self, pages: Option<u32>) -> Self {
        self.max_pages = pages;
        self
    }

    #[cfg(test)]
    fn without_delays(mut self) -> Self {
        self.politeness = Politeness::NONE;
        self
    }

    pub fn into_checkpoint(self) -> C {
        self.checkpoint
    }

    fn page_count(&self) -> u32 {
        let known = self.population.page_count();
        self.max_pages.map_or(known, |m| m.min(known))
    }

    fn limit_reached(&self, appended: usize) -> bool {
        self.limit.is_some_and(|l| appended >= l)
    }

    /// Profile references on listing page `page` (1-based).
    pub fn list_page(&self, page: u32) -> Result<impl Iterator<Item = String>, FetchError> {
        let url = listing_url(&self.base, self.population, page);
        let html = self.fetcher.fetch(url.as_str())?;
        Ok(profile_references(&html, &self.base).into_iter())
    }

    pub fn extract_profile(&self, reference: &str) -> Result<RawRecord, FetchError> {
        profile::fetch_profile(&self.fetcher, reference)
    }

    /// Walk every page, append unseen profiles, checkpoint as it goes.
    /// Only a store failure aborts the walk.
    pub fn run(&mut self) -> Result<CollectStats, StoreIoError> {
        let mut records = self.checkpoint.restore()?;
        let restored = records.len();
        let mut seen = HashSet::new();
        records.retain(|r| r.profile_reference.is_empty() || seen.insert(r.profile_reference.clone()));
        if records.len() < restored {
            warn!(dropped = restored - records.len(), "duplicate references dropped from store");
        }
        let mut known = reference_set(&records);
        let pages = self.page_count();
        info!(
            population = %self.population,
            pages,
            known = known.len(),
            limit = ?self.limit,
            "collecting"
        );

        let pb = ProgressBar::new(u64::from(pages));
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} page {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        let mut stats = CollectStats::default();
        let mut since_checkpoint = 0;

        'pages: for page in 1..=pages {
            if self.limit_reached(stats.appended) {
                stats.limit_reached = true;
                break;
            }
            if page > 1 {
                thread::sleep(self.politeness.page_delay);
            }

            let references = match self.list_page(page) {
                Ok(refs) => {
                    stats.pages_ok += 1;
                    refs
                }
                Err(e) => {
                    warn!(page, "listing page skipped: {}", e);
                    stats.pages_failed += 1;
                    pb.inc(1);
                    continue;
                }
            };

            for reference in references {
                if known.contains(&reference) {
                    stats.skipped += 1;
                    continue;
                }
                thread::sleep(self.politeness.profile_delay);
                match self.extract_profile(&reference) {
                    Ok(record) => {
                        known.insert(reference);
                        records.push(record);
                        stats.appended += 1;
                        since_checkpoint += 1;
                        pb.set_message(format!("{} new", stats.appended));
                    }
                    Err(e) => {
                        warn!(profile = %reference, "profile skipped: {}", e);
                        stats.profiles_failed += 1;
                        continue;
                    }
                }

                if since_checkpoint >= CHECKPOINT_EVERY {
                    self.checkpoint.persist(&records)?;
                    stats.checkpoints += 1;
                    since_checkpoint = 0;
                    info!(records = records.len(), "checkpoint saved");
                }
                if self.limit_reached(stats.appended) {
                    stats.limit_reached = true;
                    break 'pages;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.checkpoint.persist(&records)?;
        info!(
            records = records.len(),
            appended = stats.appended,
            pages_failed = stats.pages_failed,
            profiles_failed = stats.profiles_failed,
            "collection finished"
        );
        stats.store = Some(stats::profile_raw(&records));
        Ok(stats)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::store::reference_set;

    const BASE: &str = "https://sasthyaseba.com";

    fn profile_url(slug: &str) -> String {
        format!("{BASE}/doctors/{slug}")
    }

    fn page_url(population: Population, page: u32) -> String {
        listing_url(&Url::parse(BASE).unwrap(), population, page).to_string()
    }

    /// `pages` listing pages of `per_page` profiles each, all fetchable.
    fn site(population: Population, pages: u32, per_page: usize) -> MemoryFetcher {
        let mut fetcher = MemoryFetcher::default();
        for page in 1..=pages {
            let slugs: Vec<String> = (0..per_page).map(|i| format!("dr-{page}-{i}")).collect();
            fetcher = fetcher.with(&page_url(population, page), &listing_html(&slugs));
            for slug in &slugs {
                fetcher = fetcher.with(&profile_url(slug), &profile_html(&format!("Dr. {slug}")));
            }
        }
        fetcher
    }

    fn collector(
        fetcher: MemoryFetcher,
        checkpoint: MemoryCheckpoint,
        population: Population,
        pages: u32,
    ) -> Collector<MemoryFetcher, MemoryCheckpoint> {
        Collector::new(fetcher, checkpoint, population, Url::parse(BASE).unwrap())
            .with_max_pages(Some(pages))
            .without_delays()
    }

    #[test]
    fn population_parsing() {
        assert_eq!("Bangladesh".parse::<Population>().unwrap(), Population::Bangladesh);
        assert_eq!("all".parse::<Population>().unwrap().page_count(), 355);
        assert_eq!(Population::India.listing_id(), Some(103));
        assert!("mars".parse::<Population>().is_err());
    }

    #[test]
    fn collects_every_profile_once() {
        let mut fetcher = site(Population::India, 2, 3);
        // page 2 repeats a page-1 doctor
        let dup = listing_html(&["dr-2-0".into(), "dr-1-0".into()]);
        fetcher = fetcher.with(&page_url(Population::India, 2), &dup);

        let mut c = collector(fetcher, MemoryCheckpoint::default(), Population::India, 2);
        let stats = c.run().unwrap();
        assert_eq!(stats.appended, 4);
        assert_eq!(stats.skipped, 1);

        let store = c.into_checkpoint();
        let refs = reference_set(&store.records);
        assert_eq!(refs.len(), store.records.len());
        assert_eq!(store.records[0].name, "Dr. dr-1-0");
        assert_eq!(store.records[0].specialty, "Cardiologist");
    }

    #[test]
    fn rerun_adds_nothing() {
        let mut c = collector(site(Population::All, 2, 2), MemoryCheckpoint::default(), Population::All, 2);
        assert_eq!(c.run().unwrap().appended, 4);
        let store = c.into_checkpoint();

        let fetcher = site(Population::All, 2, 2);
        let mut again = collector(fetcher, store, Population::All, 2);
        let stats = again.run().unwrap();
        assert_eq!(stats.appended, 0);
        assert_eq!(stats.skipped, 4);
        assert_eq!(again.fetcher.requested(&profile_url("dr-1-0")), 0);
        assert_eq!(again.into_checkpoint().records.len(), 4);
    }

    #[test]
    fn resume_skips_stored_references() {
        let mut prior = MemoryCheckpoint::default();
        prior.records.push(RawRecord::new(profile_url("dr-1-1")));

        let mut c = collector(site(Population::Bangladesh, 1, 3), prior, Population::Bangladesh, 1);
        let stats = c.run().unwrap();
        assert_eq!(stats.appended, 2);
        assert_eq!(c.fetcher.requested(&profile_url("dr-1-1")), 0);

        let records = c.into_checkpoint().records;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].profile_reference, profile_url("dr-1-1"));
    }

    #[test]
    fn resume_drops_duplicate_stored_references() {
        let mut prior = MemoryCheckpoint::default();
        prior.records.push(RawRecord::new(profile_url("dr-1-0")));
        prior.records.push(RawRecord::new(profile_url("dr-1-0")));

        let mut c = collector(site(Population::Bangladesh, 1, 1), prior, Population::Bangladesh, 1);
        let stats = c.run().unwrap();
        assert_eq!(stats.appended, 0);
        assert_eq!(c.fetcher.requested(&profile_url("dr-1-0")), 0);

        let records = c.into_checkpoint().records;
        let copies = records
            .iter()
            .filter(|r| r.profile_reference == profile_url("dr-1-0"))
            .count();
        assert_eq!(copies, 1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn checkpoints_every_batch() {
        let mut c = collector(site(Population::All, 2, 30), MemoryCheckpoint::default(), Population::All, 2);
        let stats = c.run().unwrap();
        assert_eq!(stats.appended, 60);
        assert_eq!(stats.checkpoints, 2);
        // two batch checkpoints plus the final persist
        assert_eq!(c.into_checkpoint().persists, 3);
    }

    #[test]
    fn failed_pages_and_profiles_are_skipped() {
        let mut fetcher = site(Population::All, 3, 2);
        fetcher.pages.remove(&page_url(Population::All, 2));
        fetcher.pages.remove(&profile_url("dr-3-1"));

        let mut c = collector(fetcher, MemoryCheckpoint::default(), Population::All, 3);
        let stats = c.run().unwrap();
        assert_eq!(stats.pages_ok, 2);
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.profiles_failed, 1);
        assert_eq!(stats.appended, 3);
    }

    #[test]
    fn limit_stops_early_and_persists() {
        let mut c = collector(site(Population::All, 3, 4), MemoryCheckpoint::default(), Population::All, 3)
            .with_limit(Some(5));
        let stats = c.run().unwrap();
        assert!(stats.limit_reached);
        assert_eq!(stats.appended, 5);
        assert_eq!(c.fetcher.requested(&page_url(Population::All, 3)), 0);

        let store = c.into_checkpoint();
        assert_eq!(store.records.len(), 5);
        assert_eq!(store.persists, 1);
    }

    #[test]
    fn summary_lists_fill_counts() {
        let mut c = collector(site(Population::India, 1, 2), MemoryCheckpoint::default(), Population::India, 1);
        let text = c.run().unwrap().render();
        assert!(text.contains("Profiles: 2 new"));
        assert!(text.contains("hospital        2/2 (100.0%)"));
    }
}
