//! Result types produced by the analyzer
//!
//! These are plain serde structures; their field names are the keys of the
//! JSON report.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of excerpts kept for a single document
pub const MAX_DOCUMENT_EXCERPTS: usize = 20;

/// Maximum number of excerpts carried into the summary
pub const MAX_SUMMARY_EXCERPTS: usize = 50;

/// Keyword findings for a single document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// AWS keywords matched on word boundaries
    pub aws_services: BTreeSet<String>,

    /// Cloud security phrases found anywhere in the text
    pub cloud_security_measures: BTreeSet<String>,

    /// Relevant sentences, in document order
    pub relevant_excerpts: Vec<String>,
}

/// An excerpt tagged with the file it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptRef {
    pub file: String,
    pub excerpt: String,
}

/// Per-document findings keyed by file name, kept in analysis order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFindings {
    entries: Vec<(String, Finding)>,
}

impl DocumentFindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store findings for a file, replacing an earlier entry for the same
    /// name without moving it
    pub fn insert(&mut self, file_name: String, finding: Finding) {
        match self.entries.iter_mut().find(|(name, _)| *name == file_name) {
            Some((_, existing)) => *existing = finding,
            None => self.entries.push((file_name, finding)),
        }
    }

    pub fn get(&self, file_name: &str) -> Option<&Finding> {
        self.entries
            .iter()
            .find(|(name, _)| name == file_name)
            .map(|(_, finding)| finding)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.entries.iter().map(|(name, finding)| (name.as_str(), finding))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for DocumentFindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, finding) in &self.entries {
            map.serialize_entry(name, finding)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocumentFindings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FindingsVisitor;

        impl<'de> Visitor<'de> for FindingsVisitor {
            type Value = DocumentFindings;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of file names to findings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut findings = DocumentFindings::new();
                while let Some((name, finding)) = access.next_entry::<String, Finding>()? {
                    findings.insert(name, finding);
                }
                Ok(findings)
            }
        }

        deserializer.deserialize_map(FindingsVisitor)
    }
}

/// Aggregate report over every successfully analyzed document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_documents_analyzed: usize,

    /// Sorted union of AWS keywords across documents
    pub aws_services_found: Vec<String>,

    /// Sorted union of cloud security phrases across documents
    pub cloud_security_measures: Vec<String>,

    /// First excerpts across all documents, capped at `MAX_SUMMARY_EXCERPTS`
    pub key_excerpts: Vec<ExcerptRef>,

    pub document_findings: DocumentFindings,
}
