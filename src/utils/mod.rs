//! Utility modules for the document analyzer
//!
//! This module contains helpers for file handling and for formatting and
//! exporting the analysis summary.

pub mod file_utils;
pub mod output_formatter;
