mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use redline::{CompareReport, Comparator, HighlightStyle, PageOutcome};

use cli::{Cli, ReportFormat};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(code) = run(&cli) {
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<(), i32> {
    for path in [&cli.new, &cli.old] {
        if !path.exists() {
            eprintln!("Error: file not found: {}", path.display());
            return Err(1);
        }
    }

    let style = match &cli.color {
        Some(hex) => HighlightStyle::from_hex(hex).ok_or_else(|| {
            eprintln!("Error: invalid color '{hex}' (expected RRGGBB)");
            1
        })?,
        None => HighlightStyle::default(),
    };

    let report = Comparator::new()
        .highlight_style(style)
        .compare(&cli.new, &cli.old, &cli.output)
        .map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;

    if !cli.quiet {
        for outcome in &report.pages {
            if let PageOutcome::Skipped {
                page,
                new_spans,
                old_spans,
            } = outcome
            {
                eprintln!(
                    "warning: page {}: span counts differ (new {new_spans}, old {old_spans}); \
                     copied without comparison",
                    page + 1
                );
            }
        }
    }

    match cli.format {
        ReportFormat::Text => print_text_summary(cli, &report),
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        }
    }

    Ok(())
}

fn print_text_summary(cli: &Cli, report: &CompareReport) {
    println!(
        "{} pages compared, {} skipped, {} highlights",
        report.output_pages - report.skipped_pages(),
        report.skipped_pages(),
        report.total_highlights()
    );
    println!(
        "Differences highlighted and saved to {}",
        cli.output.display()
    );
}
