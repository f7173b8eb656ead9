// Reading election tables from JSON files: an array of row objects, the
// shape the original data exports use.

use std::fs;

use election_tally::{Cell, Table};
use log::debug;
use serde_json::{Map as JSMap, Value as JSValue};
use snafu::prelude::*;

use crate::app::{AppResult, OpeningDataSnafu, ParsingJsonSnafu};

/// Parses an array of JSON objects into a table. Keys become columns (the
/// union across all rows); absent keys and nulls load as null cells.
pub fn read_json_table(contents: &str) -> Result<Table, serde_json::Error> {
    let source_rows: Vec<JSMap<String, JSValue>> = serde_json::from_str(contents)?;

    let mut columns: Vec<String> = Vec::new();
    for row in source_rows.iter() {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(source_rows.len());
    for (idx, row) in source_rows.iter().enumerate() {
        let mut cells: Vec<Cell> = Vec::with_capacity(columns.len());
        for column in columns.iter() {
            cells.push(read_cell(row.get(column), idx, column)?);
        }
        rows.push(cells);
    }
    debug!(
        "read_json_table: {} columns, {} rows",
        columns.len(),
        rows.len()
    );
    Ok(Table::new(columns, rows))
}

fn read_cell(
    value: Option<&JSValue>,
    row: usize,
    column: &str,
) -> Result<Cell, serde_json::Error> {
    use serde::de::Error;
    match value {
        None | Some(JSValue::Null) => Ok(Cell::Null),
        Some(JSValue::String(s)) => Ok(Cell::Text(s.clone())),
        Some(JSValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Cell::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Cell::Float(f))
            } else {
                Err(serde_json::Error::custom(format!(
                    "row {}: number out of range in column '{}'",
                    row, column
                )))
            }
        }
        Some(other) => Err(serde_json::Error::custom(format!(
            "row {}: unsupported value {} in column '{}'",
            row, other, column
        ))),
    }
}

pub fn load_json_table(path: &str) -> AppResult<Table> {
    let contents = fs::read_to_string(path).context(OpeningDataSnafu { path })?;
    read_json_table(&contents).context(ParsingJsonSnafu { path })
}
