//! Output formatter for analysis summaries
//!
//! This module handles the console report and exports the summary as JSON,
//! HTML, or CSV.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use handlebars::Handlebars;
use serde_json::json;

use crate::core::findings::Summary;

/// Number of security measures listed in the console report
const CONSOLE_MEASURE_LIMIT: usize = 20;

/// Format the summary for console output
///
/// # Arguments
///
/// * `summary` - Aggregated findings
/// * `output_file` - Where the JSON summary was written
/// * `use_markdown` - Whether to wrap the report in markdown triple backticks
///
/// # Returns
///
/// Formatted string for console output
pub fn format_summary(summary: &Summary, output_file: &Path, use_markdown: bool) -> String {
    let mut output = String::new();

    if use_markdown {
        output.push_str("```\n");
    }

    let rule = "=".repeat(80);
    output.push_str(&format!("\n{}\n", rule.bold()));
    output.push_str(&format!("{}\n", "SUMMARY OF AWS AND CLOUD SECURITY FINDINGS".yellow().bold()));
    output.push_str(&format!("{}\n", rule.bold()));

    output.push_str(&format!(
        "\n{} {}\n",
        "Total documents analyzed:".green(),
        summary.total_documents_analyzed
    ));

    output.push_str(&format!(
        "\n{}\n",
        format!("AWS Services Found ({}):", summary.aws_services_found.len()).cyan().bold()
    ));
    for service in &summary.aws_services_found {
        output.push_str(&format!("  - {}\n", service));
    }

    output.push_str(&format!(
        "\n{}\n",
        format!("Cloud Security Measures ({}):", summary.cloud_security_measures.len())
            .cyan()
            .bold()
    ));
    for measure in summary.cloud_security_measures.iter().take(CONSOLE_MEASURE_LIMIT) {
        output.push_str(&format!("  - {}\n", measure));
    }

    output.push_str(&format!(
        "\n\n{} {}\n",
        "Full findings saved to:".green(),
        output_file.display()
    ));

    if use_markdown {
        output.push_str("```\n");
    }

    output
}

/// Export the summary to a pretty-printed JSON file
pub fn export_summary_json(summary: &Summary, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create JSON output file: {}", output_path.display()))?;

    serde_json::to_writer_pretty(file, summary).context("Failed to write JSON data")?;

    Ok(())
}

/// Create a CSV report with one row per finding
///
/// Columns are the source file, the kind of finding (`aws_service`,
/// `security_measure` or `excerpt`) and its value.
pub fn create_csv_report(summary: &Summary, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create CSV output file: {}", output_path.display()))?;

    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(["File", "Kind", "Value"])
        .context("Failed to write CSV header")?;

    for (file_name, finding) in summary.document_findings.iter() {
        let rows = finding
            .aws_services
            .iter()
            .map(|value| ("aws_service", value))
            .chain(finding.cloud_security_measures.iter().map(|value| ("security_measure", value)))
            .chain(finding.relevant_excerpts.iter().map(|value| ("excerpt", value)));

        for (kind, value) in rows {
            writer
                .write_record([file_name, kind, value.as_str()])
                .context("Failed to write CSV record")?;
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>AWS and Cloud Security Findings</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 1200px; margin: 0 auto; padding: 20px; }
        h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }
        h2 { color: #2980b9; margin-top: 30px; }
        .summary { background-color: #e8f4f8; padding: 15px; border-radius: 5px; margin-bottom: 30px; }
        .document { background-color: #f8f9fa; border-radius: 5px; padding: 15px; margin-bottom: 20px; }
        .timestamp { color: #7f8c8d; font-size: 0.9em; }
        .source { color: #7f8c8d; font-size: 0.85em; }
    </style>
</head>
<body>
    <h1>AWS and Cloud Security Findings</h1>
    <div class="timestamp">Generated on: {{timestamp}}</div>

    <div class="summary">
        <p>Total documents analyzed: {{total_documents_analyzed}}</p>
        <h2>AWS Services Found ({{aws_count}})</h2>
        <ul>{{#each aws_services_found}}<li>{{this}}</li>{{/each}}</ul>
        <h2>Cloud Security Measures ({{security_count}})</h2>
        <ul>{{#each cloud_security_measures}}<li>{{this}}</li>{{/each}}</ul>
    </div>

    <h2>Key Excerpts</h2>
    <ul>
    {{#each key_excerpts}}
        <li>{{excerpt}} <span class="source">({{file}})</span></li>
    {{/each}}
    </ul>

    <h2>Documents</h2>
    {{#each documents}}
    <div class="document">
        <h3>{{name}}</h3>
        <p>AWS services: {{#each aws_services}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}</p>
        <p>Security measures: {{#each cloud_security_measures}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}</p>
    </div>
    {{/each}}
</body>
</html>
"#;

/// Create an HTML report from the summary
pub fn create_html_report(summary: &Summary, output_path: &Path) -> Result<()> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("report", HTML_TEMPLATE)
        .context("Failed to register HTML template")?;

    let documents: Vec<_> = summary
        .document_findings
        .iter()
        .map(|(name, finding)| {
            json!({
                "name": name,
                "aws_services": finding.aws_services,
                "cloud_security_measures": finding.cloud_security_measures,
            })
        })
        .collect();

    let template_data = json!({
        "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "total_documents_analyzed": summary.total_documents_analyzed,
        "aws_services_found": summary.aws_services_found,
        "aws_count": summary.aws_services_found.len(),
        "security_count": summary.cloud_security_measures.len(),
        "cloud_security_measures": summary.cloud_security_measures,
        "key_excerpts": summary.key_excerpts,
        "documents": documents,
    });

    let html = handlebars
        .render("report", &template_data)
        .context("Failed to render HTML template")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create HTML output file: {}", output_path.display()))?;

    file.write_all(html.as_bytes()).context("Failed to write HTML data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::findings::{ExcerptRef, Finding};

    fn sample_summary() -> Summary {
        let mut finding = Finding::default();
        finding.aws_services.insert("EC2".to_string());
        finding.cloud_security_measures.insert("firewall".to_string());
        finding
            .relevant_excerpts
            .push("EC2 instances sit behind a firewall, naturally".to_string());

        let mut summary = Summary {
            total_documents_analyzed: 1,
            aws_services_found: vec!["EC2".to_string()],
            cloud_security_measures: (0..25).map(|i| format!("measure {:02}", i)).collect(),
            key_excerpts: vec![ExcerptRef {
                file: "ssp.docx".to_string(),
                excerpt: "EC2 instances sit behind a firewall, naturally".to_string(),
            }],
            ..Summary::default()
        };
        summary.document_findings.insert("ssp.docx".to_string(), finding);
        summary
    }

    #[test]
    fn test_format_summary() {
        colored::control::set_override(false);
        let text = format_summary(&sample_summary(), Path::new("out.json"), false);

        assert!(text.contains("SUMMARY OF AWS AND CLOUD SECURITY FINDINGS"));
        assert!(text.contains("Total documents analyzed: 1"));
        assert!(text.contains("AWS Services Found (1):\n  - EC2\n"));
        assert!(text.contains("Cloud Security Measures (25):"));
        assert!(text.contains("  - measure 19\n"));
        assert!(!text.contains("measure 20"));
        assert!(text.ends_with("Full findings saved to: out.json\n"));
    }

    #[test]
    fn test_markdown_wrapping() {
        colored::control::set_override(false);
        let text = format_summary(&sample_summary(), Path::new("out.json"), true);
        assert!(text.starts_with("```\n"));
        assert!(text.ends_with("```\n"));
    }

    #[test]
    fn test_exports() {
        let dir = tempfile::tempdir().unwrap();
        let summary = sample_summary();

        let json_path = dir.path().join("summary.json");
        export_summary_json(&summary, &json_path).unwrap();
        let back: Summary = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, summary);

        let csv_path = dir.path().join("summary.csv");
        create_csv_report(&summary, &csv_path).unwrap();
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<_> = csv_text.lines().collect();
        assert_eq!(lines[0], "File,Kind,Value");
        assert!(lines.contains(&"ssp.docx,aws_service,EC2"));
        assert!(lines.contains(&"ssp.docx,excerpt,\"EC2 instances sit behind a firewall, naturally\""));

        let html_path = dir.path().join("summary.html");
        create_html_report(&summary, &html_path).unwrap();
        let html = std::fs::read_to_string(&html_path).unwrap();
        assert!(html.contains("AWS Services Found (1)"));
        assert!(html.contains("<h3>ssp.docx</h3>"));
    }
}
