//! Core module for document analysis
//!
//! This module contains the keyword lists, the result types, and the analyzer
//! that ties extraction and keyword scanning together.

pub mod analyzer;
pub mod findings;
pub mod keywords;
