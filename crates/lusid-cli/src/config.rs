//! CLI configuration — TOML file mapping onto the library option structs
//!
//! ```toml
//! [adm]
//! lfe_detection = "label"
//! default_sample_rate = 48000
//!
//! [transcode]
//! output_sample_rate = 48000
//!
//! [output]
//! pretty = true
//! write_sidecar = true
//! ```

use std::fs;
use std::path::Path;

use lusid_adm::BuildOptions;
use lusid_transcode::TranscodeOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indented JSON
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Write the metadata sidecar next to the render instructions
    #[serde(default = "default_true")]
    pub write_sidecar: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            write_sidecar: true,
        }
    }
}

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LusidConfig {
    /// Scene builder options
    #[serde(default)]
    pub adm: BuildOptions,

    /// Transcoder options
    #[serde(default)]
    pub transcode: TranscodeOptions,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl LusidConfig {
    /// Load from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::from_toml(&fs::read_to_string(path)?)?;
        config.validate()?;
        log::debug!("Loaded config: {}", path.display());
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adm.default_sample_rate == 0 {
            return Err(ConfigError::Invalid(
                "adm.default_sample_rate must be positive".to_string(),
            ));
        }
        if self.transcode.output_sample_rate == 0 {
            return Err(ConfigError::Invalid(
                "transcode.output_sample_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
