use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_LANGUAGES, language_allowed};
use crate::error::CatalogError;
use crate::gutendex::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "gutenshelf.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub database_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Language codes a registered book may carry. Empty accepts anything.
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base_url: String,
    pub database_path: Utf8PathBuf,
    pub timeout: Duration,
    pub languages: Vec<String>,
}

impl ResolvedConfig {
    pub fn accepts_language(&self, code: &str) -> bool {
        language_allowed(&self.languages, code)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the default `gutenshelf.json` in the
    /// working directory is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CatalogError> {
        let database_path = match config.database_path {
            Some(path) => path,
            None => default_database_path()?,
        };
        let languages = config
            .languages
            .unwrap_or_else(|| DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect())
            .into_iter()
            .map(|code| code.trim().to_lowercase())
            .filter(|code| !code.is_empty())
            .collect();

        Ok(ResolvedConfig {
            api_base_url: config
                .api_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database_path,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            languages,
        })
    }
}

pub fn default_database_path() -> Result<Utf8PathBuf, CatalogError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.data_dir().join("gutenshelf").join("catalog.db")).ok()
        })
        .ok_or_else(|| CatalogError::Store("unable to resolve data directory".to_string()))
}
