use log::{debug, info, warn};

use election_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use text_diff::print_diff;

use crate::args::Args;

pub mod charts;
pub mod io_csv;
pub mod io_json;
pub mod menu;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening data file {path}"))]
    OpeningData {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading CSV data from {path}"))]
    ParsingCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading JSON data from {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Unsupported input format for {path} (expected csv or json)"))]
    UnsupportedFormat { path: String },
    #[snafu(display("{source}"))]
    Analysis { source: AnalysisError },
    #[snafu(display("Error writing output file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// Loads a table from a data file, dispatching on the explicit input type
/// or, when none is given, on the file extension.
pub fn load_table(path: &str, input_type: Option<&str>) -> AppResult<Table> {
    let format = match input_type {
        Some(t) => t.to_lowercase(),
        None => Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase(),
    };
    info!("Attempting to read data file {:?} as {}", path, format);
    match format.as_str() {
        "csv" => io_csv::load_csv_table(path),
        "json" => io_json::load_json_table(path),
        _ => UnsupportedFormatSnafu { path }.fail(),
    }
}

fn parse_kinds(names: &Option<Vec<String>>) -> AppResult<Vec<AnalysisKind>> {
    match names {
        None => Ok(AnalysisKind::ALL.to_vec()),
        Some(names) => {
            let mut kinds: Vec<AnalysisKind> = Vec::new();
            for name in names {
                let kind = AnalysisKind::parse(name).context(AnalysisSnafu)?;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            Ok(kinds)
        }
    }
}

fn report_config(args: &Args) -> AppResult<ReportConfig> {
    match args.top_n {
        None => Ok(ReportConfig::DEFAULT),
        Some(n) if n > 0 => Ok(ReportConfig { top_n: n }),
        Some(_) => {
            whatever!("--top-n must be a positive integer")
        }
    }
}

pub fn run(args: &Args) -> AppResult<()> {
    let config = report_config(args)?;

    if args.interactive {
        let mut session = AnalysisSession::new();
        return menu::run(&mut session, &config);
    }

    let input = match &args.input {
        Some(p) => p.clone(),
        None => {
            whatever!("No input file given. Pass --input, or --interactive for the menu.")
        }
    };

    let table = load_table(&input, args.input_type.as_deref())?;
    let mut session = AnalysisSession::new();
    session.load(&table).context(AnalysisSnafu)?;

    for kind in parse_kinds(&args.analysis)? {
        let series = session.run_analysis(kind).context(AnalysisSnafu)?;
        debug!("computed {}: {} groups", kind.name(), series.len());
    }

    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let report = session
        .report(&generated_at, &config)
        .context(AnalysisSnafu)?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", report),
        Some(path) => {
            write_text(path, &report)?;
            info!("Report generated: {}", path);
        }
    }

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &report)?;
    }

    if let Some(charts_path) = &args.charts {
        let specs = charts::chart_specs(session.results(), config.top_n);
        charts::write_chart_file(charts_path, &specs)?;
        info!("Chart summaries saved to {}", charts_path);
    }

    Ok(())
}

/// Writes a text artifact through a scoped, buffered handle. The handle is
/// flushed on success and released on every exit path.
pub fn write_text(path: &str, contents: &str) -> AppResult<()> {
    let file = File::create(path).context(WritingOutputSnafu { path })?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .context(WritingOutputSnafu { path })?;
    writer.flush().context(WritingOutputSnafu { path })?;
    Ok(())
}

/// Compares the composed report against a reference file. The generation
/// timestamp line is excluded from the comparison.
fn check_reference(path: &str, report: &str) -> AppResult<()> {
    let reference = fs::read_to_string(path).context(OpeningDataSnafu { path })?;
    let expected = strip_timestamp(&reference);
    let actual = strip_timestamp(report);
    if expected != actual {
        warn!("Found differences with the reference report");
        print_diff(expected.as_str(), actual.as_str(), "\n");
        whatever!("Difference detected between composed report and reference report")
    }
    Ok(())
}

fn strip_timestamp(report: &str) -> String {
    report
        .lines()
        .filter(|line| !line.starts_with("Generated on:"))
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::io_csv::read_csv_table;
    use crate::app::io_json::read_json_table;

    const SAMPLE_CSV: &str = "region,candidate,party,votes\n\
                              RegionA,Alice,PartyX,100\n\
                              RegionA,Bob,PartyY,50\n\
                              RegionB,Alice,PartyX,30\n";

    #[test]
    fn csv_cells_load_as_text_and_nulls() {
        let table =
            read_csv_table("region,candidate,party,votes\nNorth,Alice,,10\n".as_bytes()).unwrap();
        assert_eq!(table.columns, ["region", "candidate", "party", "votes"]);
        assert_eq!(table.rows[0][0], Cell::Text("North".to_string()));
        assert_eq!(table.rows[0][2], Cell::Null);
        assert_eq!(table.rows[0][3], Cell::Text("10".to_string()));
    }

    #[test]
    fn json_cells_load_typed() {
        let table = read_json_table(
            r#"[{"region": "North", "candidate": "Alice", "party": "Unity", "votes": 10},
                {"region": "South", "candidate": "Bob", "party": null, "votes": 7.0}]"#,
        )
        .unwrap();
        let votes = table.column_index("votes").unwrap();
        let party = table.column_index("party").unwrap();
        assert_eq!(table.rows[0][votes], Cell::Int(10));
        assert_eq!(table.rows[1][votes], Cell::Float(7.0));
        assert_eq!(table.rows[1][party], Cell::Null);
    }

    #[test]
    fn json_rejects_unsupported_cell_types() {
        assert!(read_json_table(r#"[{"region": ["North"]}]"#).is_err());
    }

    #[test]
    fn unknown_format_is_a_typed_error() {
        let err = load_table("results.xml", None).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat { .. }));
    }

    #[test]
    fn csv_pipeline_end_to_end() {
        let table = read_csv_table(SAMPLE_CSV.as_bytes()).unwrap();
        let mut session = AnalysisSession::new();
        session.load(&table).unwrap();
        session.run_all().unwrap();

        let report = session
            .report("2024-05-01 10:00:00", &ReportConfig::DEFAULT)
            .unwrap();
        let turnout_block = report
            .split("\n\n")
            .find(|b| b.starts_with("VOTER TURNOUT BY REGION:"))
            .unwrap();
        let (kind, entries) = parse_block(turnout_block).unwrap();
        assert_eq!(kind, AnalysisKind::TurnoutByRegion);
        assert_eq!(
            entries,
            vec![("RegionA".to_string(), 150), ("RegionB".to_string(), 30)]
        );
        assert!(report.contains("Alice (PartyX)"));
    }

    #[test]
    fn reference_comparison_ignores_the_timestamp_line() {
        let a = "ELECTION ANALYSIS REPORT\nGenerated on: 2024-01-01 00:00:00\nbody\n";
        let b = "ELECTION ANALYSIS REPORT\nGenerated on: 2025-12-31 23:59:59\nbody\n";
        assert_eq!(strip_timestamp(a), strip_timestamp(b));
    }
}
