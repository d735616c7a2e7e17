//! FedRAMP Analyzer - AWS and cloud security content from FedRAMP documents
//!
//! The main entry point for the analyzer. It resolves the document list from
//! defaults, a configuration file and command-line arguments, analyzes each
//! document in turn, and writes the summary.

use std::fs::File;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{ArgAction, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};

use fedramp_analyzer::config::{load_config, AnalyzerConfig};
use fedramp_analyzer::utils::{file_utils, output_formatter};
use fedramp_analyzer::{DocumentAnalyzer, DocumentOutcome};

/// Command line argument structure
#[derive(Parser, Debug)]
#[command(
    name = "fedramp_analyzer",
    author = "RUSTSEC Team",
    version,
    about = "Extract AWS and cloud security content from FedRAMP documents",
    long_about = "This tool reads FedRAMP package documents (.docx and .xlsx) and reports:
- AWS services mentioned (EC2, S3, IAM, CloudTrail, ...)
- Cloud security measures (MFA, encryption at rest, SIEM, ...)
- Relevant excerpts from each document

With no arguments it analyzes the standard System Security Plan package
under the default base path."
)]
struct Args {
    /// Documents to analyze, relative to the base path (default: built-in list)
    documents: Vec<PathBuf>,

    /// Directory the documents are resolved against
    #[arg(long = "base-path")]
    base_path: Option<PathBuf>,

    /// Analyze every .docx and .xlsx file under this directory (recursively)
    #[arg(long = "dir", conflicts_with = "documents")]
    dir: Option<PathBuf>,

    /// Path of the JSON summary
    #[arg(long = "output")]
    output: Option<PathBuf>,

    /// Also export findings to a CSV file
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Also export findings to an HTML report
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Suppress terminal output
    #[arg(long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Output the summary in markdown format (wrapped in triple backticks)
    #[arg(long = "md", action = ArgAction::SetTrue)]
    md: bool,

    /// Set logging level (default: INFO)
    #[arg(long = "log-level", default_value = "info")]
    log_level: LevelFilter,

    /// Log file path (default: fedramp_analyzer.log)
    #[arg(long = "log-file", default_value = "fedramp_analyzer.log")]
    log_file: PathBuf,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    setup_logging(&args);

    // Analyze and report
    if let Err(e) = run(&args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Set up logging with file output
fn setup_logging(args: &Args) {
    // Configure logging
    let mut builder = env_logger::Builder::new();

    // Set log level from arguments
    builder.filter_level(args.log_level);

    // Set format
    builder.format(|buf, record| {
        use chrono::Local;
        use std::io::Write;
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    // Add file output
    if let Ok(file) = File::create(&args.log_file) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // Initialize logger
    builder.init();
}

/// Merge command-line overrides into the loaded configuration
fn resolve_config(args: &Args) -> Result<AnalyzerConfig> {
    // Load configuration
    let mut config = load_config(args.config.as_deref())?;

    // Apply path overrides
    if let Some(base_path) = &args.base_path {
        config.base_path = base_path.clone();
    }
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }

    // Pick the document list
    if let Some(dir) = &args.dir {
        config.base_path = dir.clone();
        config.documents = file_utils::discover_documents(dir);
        info!("Discovered {} documents under {}", config.documents.len(), dir.display());
    } else if !args.documents.is_empty() {
        config.documents = args.documents.clone();
    }

    Ok(config)
}

/// Analyze the configured documents, write outputs, and print the report
fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;

    if config.documents.is_empty() {
        eprintln!("{}", "Error: No documents specified or found for analysis".red());
        eprintln!("Run with --help for usage information");
        process::exit(1);
    }

    info!(
        "Analyzing {} documents under {}",
        config.documents.len(),
        config.base_path.display()
    );

    let mut analyzer = DocumentAnalyzer::with_keywords(&config.base_path, config.keyword_set());

    // Set up progress bar if not in quiet mode
    let progress_bar = if !args.quiet {
        let pb = ProgressBar::new(config.documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Per-document lines are printed around the bar
    let mut report = |line: &str| {
        if let Some(pb) = &progress_bar {
            pb.suspend(|| println!("{}", line));
        }
    };

    // Analyze each document in order
    let mut failed = 0usize;
    for document in &config.documents {
        if let DocumentOutcome::Failed(_) = analyzer.analyze_entry(document, &mut report) {
            failed += 1;
        }
        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
    }

    // Finish progress bar
    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    let summary = analyzer.generate_summary();
    info!(
        "{} of {} documents analyzed, {} failed",
        summary.total_documents_analyzed,
        config.documents.len(),
        failed
    );

    // Write the JSON summary and any extra reports
    output_formatter::export_summary_json(&summary, &config.output_file)?;
    info!("Summary written to {}", config.output_file.display());

    if let Some(csv_path) = &args.csv {
        output_formatter::create_csv_report(&summary, csv_path)?;
        info!("CSV report written to {}", csv_path.display());
    }
    if let Some(html_path) = &args.html {
        output_formatter::create_html_report(&summary, html_path)?;
        info!("HTML report written to {}", html_path.display());
    }

    // Print summary to console if not in quiet mode
    if !args.quiet {
        print!(
            "{}",
            output_formatter::format_summary(&summary, &config.output_file, args.md)
        );
    }

    Ok(())
}
