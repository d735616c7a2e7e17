//! Simple example demonstrating how to use the FedRAMP Analyzer library

use anyhow::Result;
use fedramp_analyzer::DocumentAnalyzer;

fn main() -> Result<()> {
    let analyzer = DocumentAnalyzer::new(".");

    let text = "The platform runs on AWS Fargate behind API Gateway. \
                All data uses encryption at rest with KMS keys! \
                Security events are sent to the SIEM and reviewed by the SOC.";

    println!("Scanning sample text...");
    let finding = analyzer.search_content(text);

    println!("\nAWS services ({} found):", finding.aws_services.len());
    for service in &finding.aws_services {
        println!("  - {}", service);
    }

    println!("\nCloud security measures ({} found):", finding.cloud_security_measures.len());
    for measure in &finding.cloud_security_measures {
        println!("  - {}", measure);
    }

    println!("\nExcerpts:");
    for excerpt in &finding.relevant_excerpts {
        println!("  > {}", excerpt);
    }

    println!("\n{}", serde_json::to_string_pretty(&finding)?);

    Ok(())
}
