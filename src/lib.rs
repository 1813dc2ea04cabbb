//! Doctor directory scraper and dataset cleaner.
//!
//! [`collector`] walks the sasthyaseba.com listing into a raw CSV store;
//! [`normalizer`] turns that store into a deduplicated, standardized one.

pub mod collector;
pub mod error;
pub mod normalizer;
pub mod record;
pub mod settings;
pub mod stats;
pub mod store;
pub mod text;
mod utils;

pub use collector::{Collector, Population};
pub use error::{EtlError, FetchError, ParseAmbiguityWarning, StoreIoError};
pub use normalizer::{Normalizer, NormalizerConfig};
pub use record::{CleanRecord, RawRecord};
