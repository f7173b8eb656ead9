// Primitives for reading election tables from CSV files.

use std::fs::File;

use election_tally::{Cell, Table};
use log::debug;
use snafu::prelude::*;

use crate::app::{AppResult, OpeningDataSnafu, ParsingCsvSnafu};

/// Reads a CSV document: the first row is the header, every following row
/// is one election record. Cells load as trimmed text; empty cells load as
/// nulls so the validator can report them by row and column.
pub fn read_csv_table<R: std::io::Read>(input: R) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        debug!("read_csv_table: row {:?}", record);
        rows.push(
            record
                .iter()
                .map(|cell| {
                    let trimmed = cell.trim();
                    if trimmed.is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(trimmed.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(Table::new(columns, rows))
}

pub fn load_csv_table(path: &str) -> AppResult<Table> {
    let file = File::open(path).context(OpeningDataSnafu { path })?;
    read_csv_table(file).context(ParsingCsvSnafu { path })
}
