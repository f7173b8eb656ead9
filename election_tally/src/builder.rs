pub use crate::config::*;

/// A builder for assembling [`Table`] values in code.
///
/// Loaders produce tables from files; the builder covers the other callers
/// (tests, embedding programs) without going through a file format.
///
/// ```
/// use election_tally::builder::TableBuilder;
///
/// let table = TableBuilder::new()
///     .record("North", "Alice", "Unity", 120)
///     .record("South", "Bob", "Forward", 80)
///     .build();
///
/// assert_eq!(table.rows.len(), 2);
/// ```
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TableBuilder {
    /// Starts a table with the four required columns.
    pub fn new() -> TableBuilder {
        TableBuilder {
            columns: vec![
                "region".to_string(),
                "candidate".to_string(),
                "party".to_string(),
                "votes".to_string(),
            ],
            rows: Vec::new(),
        }
    }

    /// Appends one fully typed result row.
    pub fn record(mut self, region: &str, candidate: &str, party: &str, votes: u64) -> TableBuilder {
        self.rows.push(vec![
            Cell::Text(region.to_string()),
            Cell::Text(candidate.to_string()),
            Cell::Text(party.to_string()),
            Cell::Int(votes as i64),
        ]);
        self
    }

    /// Appends a raw row of cells, for inputs that should exercise the
    /// validator rather than bypass it.
    pub fn raw_row(mut self, cells: Vec<Cell>) -> TableBuilder {
        self.rows.push(cells);
        self
    }

    pub fn build(self) -> Table {
        Table::new(self.columns, self.rows)
    }
}

impl Default for TableBuilder {
    fn default() -> TableBuilder {
        TableBuilder::new()
    }
}
