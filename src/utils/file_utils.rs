//! File handling utilities
//!
//! This module provides helpers for recognising supported document types,
//! naming documents in reports, and discovering documents on disk.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

/// Office document formats the analyzer can extract text from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Word document (Office Open XML)
    Docx,
    /// Excel workbook (Office Open XML)
    Xlsx,
}

impl DocumentKind {
    /// Detect the document kind from the file extension.
    ///
    /// Only the exact lowercase extensions `docx` and `xlsx` are accepted.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the document
    ///
    /// # Returns
    ///
    /// The document kind, or `None` for anything else
    pub fn from_path(file_path: &Path) -> Option<Self> {
        match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("docx") => Some(DocumentKind::Docx),
            Some("xlsx") => Some(DocumentKind::Xlsx),
            _ => None,
        }
    }
}

/// The file name used to key a document in reports
pub fn display_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string_lossy().to_string())
}

/// Recursively collect supported documents under a directory.
///
/// Word lock files (`~$name.docx`) are skipped. Paths are returned relative to
/// `dir` and sorted so runs are reproducible.
pub fn discover_documents(dir: &Path) -> Vec<PathBuf> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).follow_links(false).into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || DocumentKind::from_path(path).is_none() {
            continue;
        }
        if display_name(path).starts_with("~$") {
            debug!("Skipping lock file {}", path.display());
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        documents.push(relative.to_path_buf());
    }

    documents.sort();
    documents
}
