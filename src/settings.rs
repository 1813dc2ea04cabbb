//! Layered settings: built-in defaults, then `doctor_etl.toml` if present, then
//! `DOCTOR_ETL__SECTION__KEY` environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::EtlError;
use crate::normalizer::RequiredField;

pub const SETTINGS_FILE: &str = "doctor_etl.toml";
pub const DEFAULT_BASE_URL: &str = "https://sasthyaseba.com";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub collector: CollectorSettings,
    pub normalizer: NormalizerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerSettings {
    pub required_fields: Vec<RequiredField>,
    pub allowed_countries: Vec<String>,
}

impl Settings {
    pub fn load() -> Result<Self, EtlError> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    pub fn load_from(file: &Path) -> Result<Self, EtlError> {
        let settings: Settings = Config::builder()
            .set_default("collector.base_url", DEFAULT_BASE_URL)?
            .set_default("collector.user_agent", DEFAULT_USER_AGENT)?
            .set_default("collector.timeout_secs", 30_i64)?
            .set_default("normalizer.required_fields", vec!["hospital", "location", "specialty"])?
            .set_default("normalizer.allowed_countries", vec!["Bangladesh", "India"])?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix("DOCTOR_ETL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("normalizer.required_fields")
                    .with_list_parse_key("normalizer.allowed_countries"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
