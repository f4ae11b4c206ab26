use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SamplerError};
use crate::models::ProductCode;
use crate::request::CountLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Taxonomy JSON file; the built-in taxonomy is used when unset.
    #[serde(default)]
    pub taxonomy_path: Option<String>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_product_codes")]
    pub product_codes: Vec<ProductCode>,
    #[serde(default = "default_sample_count")]
    pub default_sample_count: usize,
    /// Largest data sample count a single request may ask for.
    #[serde(default = "default_max_sample_count")]
    pub max_sample_count: usize,
    #[serde(default = "default_download_filename")]
    pub download_filename: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_product_codes() -> Vec<ProductCode> {
    vec![ProductCode::Credit]
}

fn default_sample_count() -> usize {
    100
}

fn default_max_sample_count() -> usize {
    1_000_000
}

fn default_download_filename() -> String {
    "txnTrainingSample".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            taxonomy_path: None,
            bind_addr: default_bind_addr(),
            product_codes: default_product_codes(),
            default_sample_count: default_sample_count(),
            max_sample_count: default_max_sample_count(),
            download_filename: default_download_filename(),
        }
    }
}

impl Settings {
    pub fn count_limits(&self) -> CountLimits {
        CountLimits {
            default_count: self.default_sample_count,
            max_count: self.max_sample_count,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("txn-sampler")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing file means defaults; an unreadable or malformed one is logged and
/// also falls back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(SamplerError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(SamplerError::from));
    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SamplerError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
