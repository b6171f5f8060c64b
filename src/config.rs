use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dates::{DEFAULT_DATE_ROWS, DEFAULT_REFERENCE_YEAR};
use crate::structure::ScanLimits;
use crate::value::Day7Policy;

/// Extraction settings, read from YAML. Every field has a default so an empty
/// file (or no file) gives the standard behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub day7_policy: Day7Policy,
    /// Year used when day-7/14/28 dates are computed from a start date.
    pub reference_year: i32,
    pub header_keyword_rows: usize,
    pub strain_candidate_rows: usize,
    pub date_rows: usize,
    pub spec_sample_rows: usize,
    pub spec_min_hits: usize,
    pub catalog: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let limits = ScanLimits::default();
        Self {
            day7_policy: Day7Policy::default(),
            reference_year: DEFAULT_REFERENCE_YEAR,
            header_keyword_rows: limits.header_keyword_rows,
            strain_candidate_rows: limits.strain_candidate_rows,
            date_rows: DEFAULT_DATE_ROWS,
            spec_sample_rows: limits.spec_sample_rows,
            spec_min_hits: limits.spec_min_hits,
            catalog: None,
        }
    }
}

impl ExtractionConfig {
    pub fn scan_limits(&self) -> ScanLimits {
        ScanLimits {
            header_keyword_rows: self.header_keyword_rows,
            strain_candidate_rows: self.strain_candidate_rows,
            spec_sample_rows: self.spec_sample_rows,
            spec_min_hits: self.spec_min_hits,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=9999).contains(&self.reference_year) {
            return Err(ConfigError::Invalid(format!("reference_year out of range: {}", self.reference_year)));
        }
        for (name, v) in [
            ("header_keyword_rows", self.header_keyword_rows),
            ("strain_candidate_rows", self.strain_candidate_rows),
            ("date_rows", self.date_rows),
            ("spec_sample_rows", self.spec_sample_rows),
            ("spec_min_hits", self.spec_min_hits),
        ] {
            if v == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }
        if self.spec_min_hits > self.spec_sample_rows {
            return Err(ConfigError::Invalid("spec_min_hits exceeds spec_sample_rows".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Read and validate a YAML config file.
pub fn load_config(path: &Path) -> Result<ExtractionConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<ExtractionConfig, ConfigError> {
    // an empty document deserializes to unit, not to a defaulted struct
    let cfg: ExtractionConfig = if raw.trim().is_empty() {
        ExtractionConfig::default()
    } else {
        serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?
    };
    cfg.validate()?;
    Ok(cfg)
}
