//! Keyword definitions for the document analyzer
//!
//! This module holds the static keyword lists used to detect AWS services and
//! cloud security measures in extracted document text, together with the
//! compiled matchers built from them.

use lazy_static::lazy_static;
use log::error;
use regex::{Regex, RegexBuilder};

/// AWS service names and abbreviations, matched on word boundaries
pub const AWS_KEYWORDS: &[&str] = &[
    "AWS", "Amazon Web Services", "EC2", "S3", "CloudWatch", "IAM",
    "VPC", "Lambda", "RDS", "CloudTrail", "CloudFormation", "EBS",
    "ELB", "Auto Scaling", "Route 53", "CloudFront", "SQS", "SNS",
    "KMS", "Secrets Manager", "Systems Manager", "GuardDuty", "Shield",
    "WAF", "Config", "Inspector", "Security Hub", "SSM", "ECS", "EKS",
    "Fargate", "API Gateway", "Cognito", "DynamoDB", "Redshift",
];

/// Cloud security phrases, matched as case-insensitive substrings
pub const CLOUD_SECURITY_KEYWORDS: &[&str] = &[
    "cloud security", "cloud infrastructure", "cloud monitoring",
    "cloud access", "cloud configuration", "cloud compliance",
    "cloud encryption", "cloud backup", "cloud disaster recovery",
    "cloud authentication", "cloud authorization", "cloud logging",
    "cloud alerting", "cloud vulnerability", "cloud patch",
    "multi-factor authentication", "MFA", "encryption at rest",
    "encryption in transit", "security group", "network ACL",
    "bastion host", "jump box", "firewall", "IDS", "IPS",
    "SIEM", "SOC", "incident response", "access control",
    "privilege", "least privilege", "monitoring", "alerting",
    "audit", "compliance", "configuration management",
];

/// General terms that make a sentence worth keeping as an excerpt, in
/// addition to every AWS keyword
pub const EXCERPT_TERMS: &[&str] = &["cloud", "security", "monitoring", "access", "encryption"];

lazy_static! {
    static ref SENTENCE_SPLITTER: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// Regex used to break document text into sentence-like chunks
pub fn sentence_splitter() -> &'static Regex {
    &SENTENCE_SPLITTER
}

/// Build a case-insensitive, word-bounded matcher for a single keyword
///
/// # Arguments
///
/// * `keyword` - Literal keyword; regex metacharacters are escaped
///
/// # Returns
///
/// The compiled regex, or `None` if compilation failed
pub fn compile_keyword(keyword: &str) -> Option<Regex> {
    let pattern = format!(r"\b{}\b", regex::escape(keyword));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            error!("Error compiling matcher for {}: {}", keyword, e);
            None
        }
    }
}

/// The full set of keywords a `DocumentAnalyzer` scans for
#[derive(Debug, Clone)]
pub struct KeywordSet {
    /// AWS keywords paired with their word-boundary matchers
    aws: Vec<(String, Regex)>,

    /// Cloud security phrases, original casing plus lowercased form
    security: Vec<(String, String)>,

    /// Lowercased excerpt triggers (AWS keywords plus general terms)
    excerpt_terms: Vec<String>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::with_extra(&[], &[])
    }
}

impl KeywordSet {
    /// Build the default keyword lists extended with extra keywords
    ///
    /// Extra AWS keywords also become excerpt triggers. Duplicates of
    /// built-in keywords are ignored.
    pub fn with_extra(extra_aws: &[String], extra_security: &[String]) -> Self {
        let mut aws_names: Vec<String> = AWS_KEYWORDS.iter().map(|k| k.to_string()).collect();
        for keyword in extra_aws {
            if !keyword.trim().is_empty() && !aws_names.contains(keyword) {
                aws_names.push(keyword.clone());
            }
        }

        let mut security_names: Vec<String> =
            CLOUD_SECURITY_KEYWORDS.iter().map(|k| k.to_string()).collect();
        for keyword in extra_security {
            if !keyword.trim().is_empty() && !security_names.contains(keyword) {
                security_names.push(keyword.clone());
            }
        }

        let aws = aws_names
            .iter()
            .filter_map(|name| compile_keyword(name).map(|regex| (name.clone(), regex)))
            .collect();

        let security = security_names
            .into_iter()
            .map(|name| {
                let lower = name.to_lowercase();
                (name, lower)
            })
            .collect();

        let excerpt_terms = aws_names
            .iter()
            .map(|k| k.as_str())
            .chain(EXCERPT_TERMS.iter().copied())
            .map(str::to_lowercase)
            .collect();

        Self {
            aws,
            security,
            excerpt_terms,
        }
    }

    /// AWS keywords with their compiled matchers, in declaration order
    pub fn aws(&self) -> &[(String, Regex)] {
        &self.aws
    }

    /// Cloud security phrases as (display form, lowercased form)
    pub fn security(&self) -> &[(String, String)] {
        &self.security
    }

    /// Check whether a lowercased sentence mentions any excerpt trigger
    pub fn is_excerpt_candidate(&self, lowered: &str) -> bool {
        self.excerpt_terms.iter().any(|term| lowered.contains(term.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sizes() {
        assert_eq!(AWS_KEYWORDS.len(), 35);
        assert_eq!(CLOUD_SECURITY_KEYWORDS.len(), 37);
    }

    #[test]
    fn test_word_boundary_matcher() {
        let s3 = compile_keyword("S3").unwrap();
        assert!(s3.is_match("stored in s3 buckets"));
        assert!(!s3.is_match("model S30 appliance"));

        let route = compile_keyword("Route 53").unwrap();
        assert!(route.is_match("DNS is hosted in route 53."));
    }

    #[test]
    fn test_extra_keywords() {
        let set = KeywordSet::with_extra(&["Macie".to_string(), "AWS".to_string()], &[]);
        assert_eq!(set.aws().len(), 36);
        assert!(set.is_excerpt_candidate("macie scans buckets"));
    }

    #[test]
    fn test_sentence_splitter() {
        let parts: Vec<_> = sentence_splitter().split("One. Two! Three? Four.Five").collect();
        assert_eq!(parts, vec!["One", "Two", "Three", "Four.Five"]);
    }
}
