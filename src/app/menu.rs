// Interactive console menu over one analysis session, mirroring the
// analyzer's classic numbered workflow.

use std::io;
use std::io::{BufRead, Write};

use chrono::Local;
use election_tally::*;
use log::warn;
use snafu::prelude::*;

use crate::app;
use crate::app::{charts, AppResult};

const DEFAULT_REPORT_PATH: &str = "election_report.txt";

pub fn run(session: &mut AnalysisSession, config: &ReportConfig) -> AppResult<()> {
    println!();
    println!("ELECTION DATA ANALYZER");
    println!("{}", "=".repeat(40));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_menu();
        let choice = match prompt(&mut lines, "Enter your choice (1-7): ")? {
            Some(line) => line,
            // End of input counts as an exit request.
            None => break,
        };
        let outcome = match choice.as_str() {
            "1" => load_data(session, &mut lines),
            "2" => show_analysis(session, AnalysisKind::TurnoutByRegion, config),
            "3" => show_analysis(session, AnalysisKind::PartyPerformance, config),
            "4" => show_analysis(session, AnalysisKind::CandidatePerformance, config),
            "5" => write_charts(session, config),
            "6" => write_report(session, config),
            "7" => {
                println!("Exiting Election Data Analyzer. Goodbye!");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter a number between 1 and 7.");
                Ok(())
            }
        };
        // Every failure is recoverable: print it and keep the menu alive.
        if let Err(e) = outcome {
            warn!("menu action failed: {}", e);
            println!("Error: {}", e);
        }
    }
    Ok(())
}

fn print_menu() {
    println!();
    println!("MENU:");
    println!("1. Load election data");
    println!("2. Analyze voter turnout");
    println!("3. Analyze party performance");
    println!("4. Analyze candidate performance");
    println!("5. Generate chart summaries");
    println!("6. Generate report");
    println!("7. Exit");
}

fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    text: &str,
) -> AppResult<Option<String>> {
    print!("{}", text);
    io::stdout()
        .flush()
        .whatever_context("Flushing the prompt")?;
    match lines.next() {
        Some(line) => {
            let line = line.whatever_context("Reading from the terminal")?;
            Ok(Some(line.trim().to_string()))
        }
        None => Ok(None),
    }
}

fn load_data(
    session: &mut AnalysisSession,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> AppResult<()> {
    let path = match prompt(lines, "Enter path to election data file (CSV/JSON): ")? {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(()),
    };
    let table = app::load_table(&path, None)?;
    session.load(&table).context(app::AnalysisSnafu)?;
    println!("Data loaded successfully!");
    Ok(())
}

fn show_analysis(
    session: &mut AnalysisSession,
    kind: AnalysisKind,
    config: &ReportConfig,
) -> AppResult<()> {
    let series = session.run_analysis(kind).context(app::AnalysisSnafu)?;
    let block = if kind == AnalysisKind::CandidatePerformance {
        render_block(&series.top_n(config.top_n))
    } else {
        render_block(series)
    };
    println!();
    print!("{}", block);
    Ok(())
}

fn write_charts(session: &AnalysisSession, config: &ReportConfig) -> AppResult<()> {
    if session.results().is_empty() {
        return Err(AnalysisError::NoAnalysisResults).context(app::AnalysisSnafu);
    }
    let specs = charts::chart_specs(session.results(), config.top_n);
    let path = charts::default_chart_path(&Local::now());
    charts::write_chart_file(&path, &specs)?;
    println!("Chart summaries saved to {}", path);
    Ok(())
}

fn write_report(session: &AnalysisSession, config: &ReportConfig) -> AppResult<()> {
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let report = session
        .report(&generated_at, config)
        .context(app::AnalysisSnafu)?;
    app::write_text(DEFAULT_REPORT_PATH, &report)?;
    println!("Report generated: {}", DEFAULT_REPORT_PATH);
    Ok(())
}
