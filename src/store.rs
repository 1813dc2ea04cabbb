//! CSV record stores and the checkpoint interface the collector resumes from.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools keep non-ASCII
//! names intact. Every write goes to `<path>.tmp` first and is renamed over the
//! target, so a crash mid-write never leaves a half-written row behind.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StoreIoError;
use crate::record::RawRecord;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Durable state the collector checkpoints into and resumes from.
pub trait Checkpoint {
    /// References already stored; the collector never fetches these again.
    fn load_known_keys(&self) -> Result<HashSet<String>, StoreIoError>;

    /// Every record stored so far, in store order.
    fn restore(&self) -> Result<Vec<RawRecord>, StoreIoError>;

    /// Replace the stored state with `records`.
    fn persist(&mut self, records: &[RawRecord]) -> Result<(), StoreIoError>;
}

/// Raw-record store backed by a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpoint for CsvStore {
    fn load_known_keys(&self) -> Result<HashSet<String>, StoreIoError> {
        Ok(reference_set(&self.restore()?))
    }

    fn restore(&self) -> Result<Vec<RawRecord>, StoreIoError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no existing store, starting fresh");
            return Ok(Vec::new());
        }
        let records: Vec<RawRecord> = read_records(&self.path)?;
        info!(path = %self.path.display(), records = records.len(), "loaded existing store");
        Ok(records)
    }

    fn persist(&mut self, records: &[RawRecord]) -> Result<(), StoreIoError> {
        write_records(&self.path, &RawRecord::HEADER, records)
    }
}

/// Non-empty profile references of `records`.
pub fn reference_set(records: &[RawRecord]) -> HashSet<String> {
    records
        .iter()
        .map(|r| r.profile_reference.clone())
        .filter(|r| !r.is_empty())
        .collect()
}

/// Read every row of `path` into `T`. Unknown columns are ignored.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreIoError> {
    let bytes = fs::read(path).map_err(|source| StoreIoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let body = bytes.strip_prefix(BOM).unwrap_or(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body);

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| StoreIoError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Atomically replace `path` with `header` followed by `records`.
pub fn write_records<T: Serialize>(
    path: &Path,
    header: &[&str],
    records: &[T],
) -> Result<(), StoreIoError> {
    let io_err = |source| StoreIoError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| StoreIoError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::with_capacity(BOM.len() + records.len() * 256);
    buf.write_all(BOM).map_err(io_err)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buf);
        writer.write_record(header).map_err(csv_err)?;
        for record in records {
            writer.serialize(record).map_err(csv_err)?;
        }
        writer.flush().map_err(io_err)?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, &buf).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    debug!(path = %path.display(), rows = records.len(), "store written");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
