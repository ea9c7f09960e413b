//! ByteSleuth — byte-level corruption detector.
//!
//! Thin binary entry point. All logic lives in the `bytesleuth-core`
//! crate; this file parses arguments, drives one run and prints the report.

mod cli;
mod report;

use bytesleuth_core::scanner::progress::ScanProgress;
use bytesleuth_core::{Analyzer, RunHandle, RunOutcome};
use clap::Parser;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialise structured logging. Logs go to stderr so stdout stays
    // clean for JSON/CSV output.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("ByteSleuth starting");

    let config = cli.analysis_config()?;
    let analyzer = Analyzer::new(config);
    analyzer.set_paths(&cli.reference, &cli.candidate);

    let handle = analyzer.start()?;
    let summary = wait_with_progress(handle).into_result()?;

    let report = report::collect(&analyzer);
    match cli.format {
        cli::OutputFormat::Json => {
            println!("{}", report::json(&report, &summary)?);
        }
        cli::OutputFormat::Csv => {
            bytesleuth_core::analysis::write_csv(&report.files, std::io::stdout().lock())?;
        }
        cli::OutputFormat::Text => {
            let mut out = std::io::stdout().lock();
            report::print_text(&mut out, &analyzer, &report, &summary, cli.details, cli.top)?;
        }
    }

    Ok(())
}

/// Drain progress messages into the log until the run reports an outcome.
fn wait_with_progress(handle: RunHandle) -> RunOutcome {
    loop {
        for msg in handle.progress_rx.try_iter() {
            match msg {
                ScanProgress::Update {
                    files_done,
                    current_path,
                } => tracing::info!("{files_done} files analysed, at {current_path}"),
                ScanProgress::Error { path, message } => {
                    tracing::debug!("error on {path}: {message}")
                }
                _ => {}
            }
        }
        if let Some(outcome) = handle.wait_timeout(Duration::from_millis(200)) {
            return outcome;
        }
    }
}
