//! Pact contract compiler CLI
//!
//! Compiles interaction descriptions written in the Pact integration JSON
//! format into contract documents, reporting every interaction that can not
//! be encoded.
//!
//! Usage:
//!   pact-compile <directory_or_file> [OPTIONS]

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pact_builder::PactConfig;
use pact_compile::{compile_directory, compile_file, CompileIssue, CompileOptions, CompileReport, Severity};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Pact contract compiler
#[derive(Parser, Debug)]
#[command(name = "pact-compile")]
#[command(
    author,
    version,
    about = "Compile Pact integration JSON interaction files into contracts"
)]
struct Args {
    /// Path to a contract description or a directory of them
    #[arg(required = true)]
    path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Directory finished contracts are written to
    #[arg(long, env = "PACT_OUTPUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Nesting limit for interaction bodies
    #[arg(long, env = "PACT_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compile and report without writing contracts
    #[arg(long)]
    dry_run: bool,

    /// Only show errors (hide warnings and info)
    #[arg(short = 'e', long)]
    errors_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PactConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => PactConfig::from_env().context("invalid PACT_* environment")?,
    };
    if let Some(out_dir) = &args.out_dir {
        config.output_dir = out_dir.clone();
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    config.validate().context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = CompileOptions {
        dry_run: args.dry_run,
        ..CompileOptions::from_config(&config)
    };

    let report = if args.path.is_dir() {
        compile_directory(&args.path, &options)
    } else {
        compile_file(&args.path, &options)
    };

    match args.output {
        OutputFormat::Json => print_report_json(&report)?,
        OutputFormat::Text => print_report(&report, &args),
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report_json(report: &CompileReport) -> Result<()> {
    let output = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{output}");
    Ok(())
}

fn print_report(report: &CompileReport, args: &Args) {
    println!("{BOLD}{CYAN}Pact Contract Compiler{RESET}");
    println!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
    println!("{DIM}Scanning:{RESET} {CYAN}{}{RESET}\n", args.path.display());

    if report.issues.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
    }

    let mut issues_by_file: BTreeMap<&PathBuf, Vec<&CompileIssue>> = BTreeMap::new();
    for issue in &report.issues {
        if args.errors_only && issue.severity != Severity::Error {
            continue;
        }
        issues_by_file.entry(&issue.file).or_default().push(issue);
    }

    for (file, issues) in issues_by_file {
        let file_errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let file_warnings = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();

        let file_name = file.file_name().unwrap_or_default().to_string_lossy();
        let status_indicator = if file_errors > 0 {
            format!("{RED}FAIL{RESET}")
        } else if file_warnings > 0 {
            format!("{YELLOW}WARN{RESET}")
        } else {
            format!("{GREEN}OK{RESET}  ")
        };
        println!("{status_indicator} {BOLD}{CYAN}{file_name}{RESET}");

        for issue in issues {
            let color = severity_color(&issue.severity);
            let location_str = issue
                .location
                .as_ref()
                .map(|l| format!("{DIM}[{RESET}{CYAN}{l}{RESET}{DIM}]{RESET}"))
                .unwrap_or_default();

            println!(
                "  {color}|{RESET} {location_str} {BOLD}{color}{}{RESET}: {} {DIM}({color}{}{DIM}){RESET}",
                issue.severity.label(),
                issue.message,
                issue.code
            );
            if let Some(suggestion) = &issue.suggestion {
                println!("  {color}|{RESET}   {GREEN}-> {suggestion}{RESET}");
            }
        }
        println!();
    }

    println!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
    println!("{BOLD}{CYAN}Summary{RESET}");
    println!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
    println!("  {DIM}Files checked:{RESET} {BOLD}{}{RESET}", report.files_checked);
    println!(
        "  {DIM}Interactions:{RESET}  {BOLD}{}{RESET}",
        report.interactions_compiled
    );
    println!("  {DIM}Contracts:{RESET}     {BOLD}{}{RESET}", report.contracts.len());

    if report.errors > 0 {
        println!("  {RED}Errors:{RESET}        {BOLD}{RED}{}{RESET}", report.errors);
    } else {
        println!("  {GREEN}Errors:{RESET}        {BOLD}{GREEN}0{RESET}");
    }
    if report.warnings > 0 {
        println!(
            "  {YELLOW}Warnings:{RESET}      {BOLD}{YELLOW}{}{RESET}",
            report.warnings
        );
    } else {
        println!("  {DIM}Warnings:{RESET}      {BOLD}0{RESET}");
    }
    println!();

    if report.errors > 0 {
        println!("{RED}{BOLD}Compilation failed with errors{RESET}");
    } else if args.dry_run {
        println!("{GREEN}{BOLD}Dry run passed{RESET}");
    } else {
        println!("{GREEN}{BOLD}All contracts compiled!{RESET}");
    }
}

fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    }
}
