//! Analyzer configuration
//!
//! Defaults reproduce the fixed FedRAMP document set. A JSON file can
//! override any field; command line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::core::keywords::KeywordSet;

/// Directory holding the FedRAMP package
pub const DEFAULT_BASE_PATH: &str = "FedRAMP Docs";

/// Where the JSON summary is written
pub const DEFAULT_OUTPUT_FILE: &str = "fedramp_aws_findings.json";

/// The FedRAMP package documents analyzed by default, relative to the base path
pub const DEFAULT_DOCUMENTS: &[&str] = &[
    "ClearTriage for Government System Security Plan (SSP).docx",
    "Procedures/(AC) ClearTriage Access Control Procedures.docx",
    "Procedures/(AU) ClearTriage Audit And Accountability Procedures.docx",
    "Procedures/(CM) ClearTriage Configuration Management Procedures.docx",
    "Procedures/(SC) ClearTriage System And Communications Protection Procedures.docx",
    "Procedures/(SI) ClearTriage System And Information Integrity Procedures.docx",
    "Procedures/(IR) ClearTriage Incident Response Procedures.docx",
    "SSP - Appendix N - Continuous Monitoring Plan.xlsx",
    "SSP - Appendix I - Incident Response Plan.docx",
];

/// Settings for a single analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub base_path: PathBuf,
    pub documents: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub extra_aws_keywords: Vec<String>,
    pub extra_security_keywords: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            documents: DEFAULT_DOCUMENTS.iter().map(PathBuf::from).collect(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            extra_aws_keywords: Vec::new(),
            extra_security_keywords: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Keyword set with this configuration's extra keywords added
    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::with_extra(&self.extra_aws_keywords, &self.extra_security_keywords)
    }
}

/// Load configuration from a JSON file if one is given.
///
/// A missing file or invalid JSON is logged and the defaults are used; an
/// unreadable file is an error.
pub fn load_config(config_path: Option<&Path>) -> Result<AnalyzerConfig> {
    // No file means built-in defaults
    let path = match config_path {
        Some(path) => path,
        None => return Ok(AnalyzerConfig::default()),
    };

    if !path.exists() {
        error!("Configuration file not found: {}", path.display());
        return Ok(AnalyzerConfig::default());
    }

    // Read and parse the file
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    match serde_json::from_str(&config_str) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Err(e) => {
            error!("Invalid JSON in configuration file: {}", e);
            Ok(AnalyzerConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.documents.len(), 9);
        assert_eq!(config.output_file, PathBuf::from("fedramp_aws_findings.json"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_path": "/srv/fedramp", "extra_aws_keywords": ["Macie"]}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.base_path, PathBuf::from("/srv/fedramp"));
        assert_eq!(config.documents.len(), 9);
        assert_eq!(config.keyword_set().aws().len(), 36);
    }

    #[test]
    fn test_bad_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config(Some(&path)).unwrap(), AnalyzerConfig::default());
        assert_eq!(
            load_config(Some(&dir.path().join("absent.json"))).unwrap(),
            AnalyzerConfig::default()
        );
    }
}
