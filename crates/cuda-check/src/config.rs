//! # Configuration
//!
//! Figment-based loading with three layers, lowest priority first:
//! 1. Compiled defaults
//! 2. An optional TOML file passed with `--config`
//! 3. Command line overrides
//!
//! Environment variables are not consulted.

use crate::error::CheckError;
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Complete configuration for one diagnostic run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub cuda: CudaSettings,
    #[serde(default)]
    pub cudnn: CudnnSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CudaSettings {
    /// Shared objects tried in order when opening the driver
    pub library_candidates: Vec<String>,
    /// Device the probe multiplication runs on
    pub device: u32,
    /// Side length of the square probe matrices
    pub matrix_size: usize,
    pub seed: u64,
    /// Largest relative residual the probe accepts
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CudnnSettings {
    pub enabled: bool,
    pub library_candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Append a JSON report after the text report
    pub json: bool,
    pub log_level: String,
}

impl Default for CudaSettings {
    fn default() -> Self {
        Self {
            library_candidates: vec!["libcuda.so.1".to_string(), "libcuda.so".to_string()],
            device: 0,
            matrix_size: 1000,
            seed: 42,
            tolerance: 1e-3,
        }
    }
}

impl Default for CudnnSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            library_candidates: vec![
                "libcudnn.so.9".to_string(),
                "libcudnn.so.8".to_string(),
                "libcudnn.so".to_string(),
            ],
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            json: false,
            log_level: "warn".to_string(),
        }
    }
}

/// Values supplied on the command line; `None` leaves the lower layers alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigOverrides {
    pub cuda: CudaOverrides,
    pub output: OutputOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CudaOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

const MAX_MATRIX_SIZE: usize = 16_384;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl CheckConfig {
    /// Layer defaults, the optional file and `overrides`, then validate
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, CheckError> {
        let mut figment = Figment::new().merge(Serialized::defaults(CheckConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(CheckError::Config {
                    details: format!("configuration file not found: {}", path.display()),
                });
            }
            debug!("Loading configuration from file: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        let config: CheckConfig = figment
            .merge(Serialized::globals(overrides))
            .extract()
            .map_err(|err| CheckError::Config {
                details: format!("failed to parse configuration: {err}"),
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CheckError> {
        let fail = |details: &str| {
            Err(CheckError::Config {
                details: details.to_string(),
            })
        };

        if self.cuda.library_candidates.is_empty() {
            return fail("cuda.library_candidates must not be empty");
        }
        if self.cudnn.library_candidates.is_empty() {
            return fail("cudnn.library_candidates must not be empty");
        }
        if self.cuda.matrix_size == 0 {
            return fail("cuda.matrix_size must be greater than zero");
        }
        // Three n×n f32 matrices are held on the host at once
        if self.cuda.matrix_size > MAX_MATRIX_SIZE {
            return fail("cuda.matrix_size must not exceed 16384");
        }
        if !(self.cuda.tolerance.is_finite() && self.cuda.tolerance > 0.0) {
            return fail("cuda.tolerance must be a positive number");
        }
        if !LOG_LEVELS.contains(&self.output.log_level.as_str()) {
            return Err(CheckError::Config {
                details: format!(
                    "output.log_level must be one of {}, got {:?}",
                    LOG_LEVELS.join(", "),
                    self.output.log_level
                ),
            });
        }
        Ok(())
    }
}
