//! FedRAMP Analyzer - AWS and cloud security content from FedRAMP documents
//!
//! This library extracts text from Word and Excel documents, scans it for AWS
//! service names and cloud security terms, and builds a JSON-ready summary.

pub mod config;
pub mod core;
pub mod extract;
pub mod utils;

// Re-export main analyzer types for convenience
pub use crate::config::AnalyzerConfig;
pub use crate::core::analyzer::{DocumentAnalyzer, DocumentOutcome};
pub use crate::core::findings::{Finding, Summary};
pub use crate::extract::{extract_text, ExtractError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze the configured documents and return the summary
///
/// This is a convenience function for simple use cases. Console lines are
/// printed to stdout as each document is processed.
///
/// # Arguments
///
/// * `config` - Base path, document list and extra keywords
pub fn analyze_documents(config: &AnalyzerConfig) -> Summary {
    let mut analyzer = DocumentAnalyzer::with_keywords(&config.base_path, config.keyword_set());
    analyzer.analyze_all_documents(&config.documents, |line| println!("{}", line));
    analyzer.generate_summary()
}
