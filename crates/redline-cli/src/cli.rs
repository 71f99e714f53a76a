use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Compare two revisions of a PDF and write a copy of the new revision with
/// word-level differences highlighted.
#[derive(Debug, Parser)]
#[command(name = "redline", about, version)]
pub struct Cli {
    /// Path to the new (revised) PDF
    #[arg(value_name = "NEW")]
    pub new: PathBuf,

    /// Path to the old (baseline) PDF
    #[arg(value_name = "OLD")]
    pub old: PathBuf,

    /// Where to write the highlighted PDF
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Format of the run summary printed to stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Highlight color as RRGGBB hex (default: yellow)
    #[arg(long, value_name = "RRGGBB")]
    pub color: Option<String>,

    /// Suppress per-page warnings on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

/// Summary output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}
