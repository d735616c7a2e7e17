//! Core document analyzer implementation
//!
//! This file contains the `DocumentAnalyzer`, which extracts text from each
//! document, scans it for keywords, and aggregates the per-document findings
//! into a summary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::core::findings::{
    DocumentFindings, ExcerptRef, Finding, Summary, MAX_DOCUMENT_EXCERPTS, MAX_SUMMARY_EXCERPTS,
};
use crate::core::keywords::{sentence_splitter, KeywordSet};
use crate::extract::{self, ExtractError};
use crate::utils::file_utils::{display_name, DocumentKind};

/// Shortest excerpt kept, exclusive, in characters
const MIN_EXCERPT_CHARS: usize = 20;

/// Longest excerpt kept, exclusive, in characters
const MAX_EXCERPT_CHARS: usize = 500;

/// What happened to a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Text was extracted and scanned; findings are stored under the file name
    Analyzed,
    /// Extraction failed; the document is not counted
    Failed(String),
    /// Neither a `.docx` nor an `.xlsx` file
    Unsupported,
    /// Nothing exists at the resolved path
    NotFound,
}

/// Keyword analyzer over a set of documents
pub struct DocumentAnalyzer {
    /// Directory the document list is resolved against
    base_path: PathBuf,

    /// Keywords to scan for
    keywords: KeywordSet,

    /// Findings for every successfully analyzed document
    findings: DocumentFindings,
}

impl DocumentAnalyzer {
    /// Create a new analyzer with the built-in keyword lists
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory that relative document paths are joined onto
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self::with_keywords(base_path, KeywordSet::default())
    }

    /// Create a new analyzer with a custom keyword set
    pub fn with_keywords<P: Into<PathBuf>>(base_path: P, keywords: KeywordSet) -> Self {
        Self {
            base_path: base_path.into(),
            keywords,
            findings: DocumentFindings::new(),
        }
    }

    /// Findings recorded so far, in analysis order
    pub fn findings(&self) -> &DocumentFindings {
        &self.findings
    }

    /// Scan text for AWS services, cloud security measures and excerpts
    ///
    /// # Arguments
    ///
    /// * `content` - Plain text extracted from a document
    ///
    /// # Returns
    ///
    /// The keywords found and up to `MAX_DOCUMENT_EXCERPTS` relevant sentences
    pub fn search_content(&self, content: &str) -> Finding {
        let mut finding = Finding::default();

        for (keyword, matcher) in self.keywords.aws() {
            if matcher.is_match(content) {
                finding.aws_services.insert(keyword.clone());
            }
        }

        let lowered = content.to_lowercase();
        for (keyword, lowered_keyword) in self.keywords.security() {
            if lowered.contains(lowered_keyword.as_str()) {
                finding.cloud_security_measures.insert(keyword.clone());
            }
        }

        for sentence in sentence_splitter().split(content) {
            if finding.relevant_excerpts.len() >= MAX_DOCUMENT_EXCERPTS {
                break;
            }
            if !self.keywords.is_excerpt_candidate(&sentence.to_lowercase()) {
                continue;
            }

            let clean = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
            let length = clean.chars().count();
            if length > MIN_EXCERPT_CHARS && length < MAX_EXCERPT_CHARS {
                finding.relevant_excerpts.push(clean);
            }
        }

        finding
    }

    /// Analyze a single document and store its findings
    ///
    /// Extraction errors are caught here and reported in the outcome; they
    /// never propagate.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Full path to the document
    pub fn analyze_document(&mut self, file_path: &Path) -> DocumentOutcome {
        let file_name = display_name(file_path);

        if DocumentKind::from_path(file_path).is_none() {
            warn!("Skipping {}: not a .docx or .xlsx file", file_path.display());
            return DocumentOutcome::Unsupported;
        }

        let start_time = Instant::now();
        let content = match extract::extract_text(file_path) {
            Ok(content) => content,
            Err(ExtractError::Unsupported(_)) => return DocumentOutcome::Unsupported,
            Err(ExtractError::Empty) => {
                // The console line for an empty document carries no message
                error!("No text extracted from {}", file_path.display());
                return DocumentOutcome::Failed(String::new());
            }
            Err(e) => {
                error!("Error reading {}: {}", file_path.display(), e);
                return DocumentOutcome::Failed(format!("Error reading {}: {}", file_path.display(), e));
            }
        };

        let finding = self.search_content(&content);
        info!(
            "Analyzed {}: {} AWS services, {} security measures, {} excerpts in {:?}",
            file_name,
            finding.aws_services.len(),
            finding.cloud_security_measures.len(),
            finding.relevant_excerpts.len(),
            start_time.elapsed()
        );

        self.findings.insert(file_name, finding);
        DocumentOutcome::Analyzed
    }

    /// Resolve one entry of the document list and analyze it
    ///
    /// Console lines are passed to `report` rather than printed directly so
    /// callers can route them around a progress bar.
    pub fn analyze_entry<F: FnMut(&str)>(&mut self, document: &Path, report: &mut F) -> DocumentOutcome {
        let full_path = self.base_path.join(document);

        if !full_path.exists() {
            warn!("File not found: {}", full_path.display());
            report(&format!("File not found: {}", document.display()));
            return DocumentOutcome::NotFound;
        }

        report(&format!("\nAnalyzing: {}", display_name(&full_path)));
        let outcome = self.analyze_document(&full_path);
        if let DocumentOutcome::Failed(message) = &outcome {
            report(&format!("  Error: {}", message));
        }
        outcome
    }

    /// Analyze every document in the list, in order
    ///
    /// # Returns
    ///
    /// One outcome per document
    pub fn analyze_all_documents<F: FnMut(&str)>(
        &mut self,
        documents: &[PathBuf],
        mut report: F,
    ) -> Vec<DocumentOutcome> {
        documents
            .iter()
            .map(|document| self.analyze_entry(document, &mut report))
            .collect()
    }

    /// Aggregate the stored findings into a summary
    pub fn generate_summary(&self) -> Summary {
        let mut all_aws_services = BTreeSet::new();
        let mut all_security_measures = BTreeSet::new();
        let mut key_excerpts = Vec::new();

        for (file_name, finding) in self.findings.iter() {
            all_aws_services.extend(finding.aws_services.iter().cloned());
            all_security_measures.extend(finding.cloud_security_measures.iter().cloned());
            for excerpt in &finding.relevant_excerpts {
                if key_excerpts.len() < MAX_SUMMARY_EXCERPTS {
                    key_excerpts.push(ExcerptRef {
                        file: file_name.to_string(),
                        excerpt: excerpt.clone(),
                    });
                }
            }
        }

        debug!(
            "Summary over {} documents with {} excerpts",
            self.findings.len(),
            key_excerpts.len()
        );

        Summary {
            total_documents_analyzed: self.findings.len(),
            aws_services_found: all_aws_services.into_iter().collect(),
            cloud_security_measures: all_security_measures.into_iter().collect(),
            key_excerpts,
            document_findings: self.findings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> DocumentAnalyzer {
        DocumentAnalyzer::new("unused")
    }

    #[test]
    fn test_aws_lambda_and_ec2() {
        let finding = analyzer().search_content("The system runs on AWS Lambda and EC2 instances.");
        assert!(finding.aws_services.contains("AWS"));
        assert!(finding.aws_services.contains("Lambda"));
        assert!(finding.aws_services.contains("EC2"));
        assert!(!finding.aws_services.contains("S3"));
    }

    #[test]
    fn test_word_boundaries_and_case() {
        let finding = analyzer().search_content("Model S30 hardware; iam roles; Route 53 zones");
        assert!(!finding.aws_services.contains("S3"));
        assert!(finding.aws_services.contains("IAM"));
        assert!(finding.aws_services.contains("Route 53"));
    }

    #[test]
    fn test_security_terms_are_substrings() {
        let finding = analyzer().search_content("The vendor provides MULTI-FACTOR Authentication.");
        assert!(finding.cloud_security_measures.contains("multi-factor authentication"));
        // "provides" contains "ides"
        assert!(finding.cloud_security_measures.contains("IDS"));
        assert!(!finding.cloud_security_measures.contains("firewall"));
    }

    #[test]
    fn test_excerpt_length_window() {
        let content = "Security is key. \
                       All security events are forwarded to the SIEM for review! \
                       Nothing relevant appears in this long sentence at all";
        let finding = analyzer().search_content(content);
        assert_eq!(
            finding.relevant_excerpts,
            vec!["All security events are forwarded to the SIEM for review".to_string()]
        );
    }

    #[test]
    fn test_excerpt_length_bounds_are_exclusive() {
        let sentence = |chars: usize, fill: char| {
            let mut text = String::from("security ");
            text.extend(std::iter::repeat(fill).take(chars - text.len()));
            text
        };
        let content = [
            sentence(20, 'x'),
            sentence(20, 'é'),
            sentence(21, 'x'),
            sentence(21, 'é'),
            sentence(499, 'é'),
            sentence(500, 'x'),
            sentence(500, 'é'),
        ]
        .join(". ");

        let finding = analyzer().search_content(&content);
        // Lengths count characters, so 'é' weighs the same as 'x'
        assert_eq!(
            finding.relevant_excerpts,
            vec![sentence(21, 'x'), sentence(21, 'é'), sentence(499, 'é')]
        );
    }

    #[test]
    fn test_excerpt_whitespace_is_collapsed() {
        let finding = analyzer().search_content("Cloud\n  monitoring\tis performed   continuously by staff");
        assert_eq!(
            finding.relevant_excerpts,
            vec!["Cloud monitoring is performed continuously by staff".to_string()]
        );
    }

    #[test]
    fn test_excerpts_capped_per_document() {
        let content = "Encryption keys are rotated by the KMS service. ".repeat(30);
        let finding = analyzer().search_content(&content);
        assert_eq!(finding.relevant_excerpts.len(), MAX_DOCUMENT_EXCERPTS);
    }

    #[test]
    fn test_summary_caps_and_sorts() {
        let mut analyzer = analyzer();
        for index in 0..4 {
            let text = format!("Document {} stores backups in Amazon S3 with encryption. ", index).repeat(25);
            let finding = analyzer.search_content(&text);
            analyzer.findings.insert(format!("doc{}.docx", index), finding);
        }
        let mut extra = Finding::default();
        extra.aws_services.insert("CloudTrail".to_string());
        analyzer.findings.insert("extra.xlsx".to_string(), extra);

        let summary = analyzer.generate_summary();
        assert_eq!(summary.total_documents_analyzed, 5);
        assert_eq!(summary.key_excerpts.len(), MAX_SUMMARY_EXCERPTS);
        assert_eq!(summary.key_excerpts[0].file, "doc0.docx");
        assert_eq!(summary.key_excerpts[49].file, "doc2.docx");
        assert_eq!(summary.aws_services_found, vec!["CloudTrail", "S3"]);
    }

    #[test]
    fn test_missing_and_unsupported_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "AWS everywhere").unwrap();

        let mut analyzer = DocumentAnalyzer::new(dir.path());
        let mut lines = Vec::new();
        let outcomes = analyzer.analyze_all_documents(
            &[PathBuf::from("missing.docx"), PathBuf::from("notes.txt")],
            |line| lines.push(line.to_string()),
        );

        assert_eq!(outcomes, vec![DocumentOutcome::NotFound, DocumentOutcome::Unsupported]);
        assert_eq!(lines, vec!["File not found: missing.docx", "\nAnalyzing: notes.txt"]);
        assert_eq!(analyzer.generate_summary().total_documents_analyzed, 0);
    }

    #[test]
    fn test_corrupt_document_is_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.docx"), "not a zip archive").unwrap();

        let mut analyzer = DocumentAnalyzer::new(dir.path());
        let mut lines = Vec::new();
        let outcomes = analyzer.analyze_all_documents(&[PathBuf::from("broken.docx")], |line| {
            lines.push(line.to_string())
        });

        assert!(matches!(outcomes[0], DocumentOutcome::Failed(_)));
        assert!(lines[1].starts_with("  Error: Error reading"));
        assert!(analyzer.findings().is_empty());
    }

    #[test]
    fn test_document_without_text_reports_bare_error() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::create(dir.path().join("blank.docx")).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(br#"<w:document xmlns:w="w"><w:body><w:p/></w:body></w:document>"#)
            .unwrap();
        zip.finish().unwrap();

        let mut analyzer = DocumentAnalyzer::new(dir.path());
        let mut lines = Vec::new();
        let outcomes = analyzer.analyze_all_documents(&[PathBuf::from("blank.docx")], |line| {
            lines.push(line.to_string())
        });

        assert_eq!(outcomes, vec![DocumentOutcome::Failed(String::new())]);
        assert_eq!(lines, vec!["\nAnalyzing: blank.docx", "  Error: "]);
        assert_eq!(analyzer.generate_summary().total_documents_analyzed, 0);
    }
}
