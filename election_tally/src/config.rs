// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One cell of a loaded table.
///
/// Loaders map their source data into cells without interpreting them;
/// interpretation (and rejection) is the job of the validator.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    /// A missing or null value in the source file.
    Null,
}

/// A raw table as produced by the file loaders: column names plus rows of
/// cells, in source order. Row order carries no meaning but is preserved
/// until aggregation discards it.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Table {
        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// One validated row of election results.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Record {
    pub region: String,
    pub candidate: String,
    pub party: String,
    pub votes: u64,
}

/// A table that passed validation. Only constructible through
/// [`validate`](crate::validate): holding one is the proof that every record
/// has all four fields and a non-negative whole vote count.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ValidatedTable {
    pub(crate) records: Vec<Record>,
}

impl ValidatedTable {
    /// The validated records, in source order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ******** Output data structures *********

/// The field (or field pair) used to partition records before summation.
/// The set is closed: grouping strategies are not user-extensible.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum GroupKey {
    Region,
    Party,
    CandidateParty,
}

impl GroupKey {
    pub fn analysis_kind(&self) -> AnalysisKind {
        match self {
            GroupKey::Region => AnalysisKind::TurnoutByRegion,
            GroupKey::Party => AnalysisKind::PartyPerformance,
            GroupKey::CandidateParty => AnalysisKind::CandidatePerformance,
        }
    }
}

/// The analysis that produced a result. One-to-one with [`GroupKey`].
///
/// The `Ord` derivation follows the declaration order, which is also the
/// fixed section order of the composed report.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum AnalysisKind {
    TurnoutByRegion,
    PartyPerformance,
    CandidatePerformance,
}

impl AnalysisKind {
    /// All kinds, in report order.
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::TurnoutByRegion,
        AnalysisKind::PartyPerformance,
        AnalysisKind::CandidatePerformance,
    ];

    pub fn group_key(&self) -> GroupKey {
        match self {
            AnalysisKind::TurnoutByRegion => GroupKey::Region,
            AnalysisKind::PartyPerformance => GroupKey::Party,
            AnalysisKind::CandidatePerformance => GroupKey::CandidateParty,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::TurnoutByRegion => "turnout_by_region",
            AnalysisKind::PartyPerformance => "party_performance",
            AnalysisKind::CandidatePerformance => "candidate_performance",
        }
    }

    /// Parses an analysis name as given on a command line or in a menu.
    /// Accepts the canonical names and short aliases.
    pub fn parse(name: &str) -> Result<AnalysisKind, AnalysisError> {
        match name {
            "turnout" | "turnout_by_region" => Ok(AnalysisKind::TurnoutByRegion),
            "party" | "party_performance" => Ok(AnalysisKind::PartyPerformance),
            "candidate" | "candidate_performance" => Ok(AnalysisKind::CandidatePerformance),
            _ => Err(AnalysisError::UnsupportedGroupKey(name.to_string())),
        }
    }
}

/// The identity of one group: a single field value, or the
/// (candidate, party) pair. Two candidates with the same name in different
/// parties are distinct groups.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GroupValue {
    Single(String),
    Pair(String, String),
}

impl GroupValue {
    /// The label used in reports and chart summaries.
    pub fn label(&self) -> String {
        match self {
            GroupValue::Single(s) => s.clone(),
            GroupValue::Pair(candidate, party) => format!("{} ({})", candidate, party),
        }
    }
}

impl Display for GroupValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-group summed totals, in the order the groups were first observed
/// while scanning the validated table. Produced by
/// [`aggregate`](crate::aggregate), consumed by [`rank`](crate::rank).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregateResult {
    pub kind: AnalysisKind,
    /// First-encounter group order. Totals are exact integer sums.
    pub totals: Vec<(GroupValue, u64)>,
}

/// Grouped totals sorted by total descending. Ties keep the relative order
/// in which the groups were first observed in the table (stable sort by
/// value, not a secondary alphabetical sort). Immutable once produced.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedSeries {
    pub kind: AnalysisKind,
    pub(crate) entries: Vec<(GroupValue, u64)>,
}

impl RankedSeries {
    pub fn entries(&self) -> &[(GroupValue, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `n` entries, or all of them if the series is shorter.
    /// `n = 0` yields an empty series.
    pub fn top_n(&self, n: usize) -> RankedSeries {
        RankedSeries {
            kind: self.kind,
            entries: self.entries.iter().take(n).cloned().collect(),
        }
    }
}

/// Where a session stands in its `Empty -> Loaded -> Analyzed` lifecycle.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionState {
    Empty,
    Loaded,
    Analyzed,
}

/// Errors surfaced by the engine. All are recoverable at the caller
/// boundary; the engine never terminates the process.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnalysisError {
    /// Required columns absent from the table schema.
    MissingColumns(Vec<String>),
    /// A required field is null or empty in some row. `row` is the 0-based
    /// index into the table's data rows.
    MissingValue { row: usize, column: String },
    /// A votes cell that cannot be read as a non-negative whole number.
    InvalidVotesValue { row: usize, value: String },
    NoDataLoaded,
    NoAnalysisResults,
    /// An analysis name that does not map to a supported grouping.
    UnsupportedGroupKey(String),
}

impl Error for AnalysisError {}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::MissingColumns(names) => {
                write!(f, "missing required columns: {}", names.join(", "))
            }
            AnalysisError::MissingValue { row, column } => {
                write!(f, "row {}: missing value for column '{}'", row, column)
            }
            AnalysisError::InvalidVotesValue { row, value } => {
                write!(
                    f,
                    "row {}: votes value '{}' is not a non-negative whole number",
                    row, value
                )
            }
            AnalysisError::NoDataLoaded => write!(f, "no data loaded"),
            AnalysisError::NoAnalysisResults => write!(f, "no analysis results available"),
            AnalysisError::UnsupportedGroupKey(name) => {
                write!(f, "unsupported analysis '{}'", name)
            }
        }
    }
}

// ********* Configuration **********

/// Rendering configuration recognized by the engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportConfig {
    /// Caps the candidate-performance section of the report and the
    /// candidate chart summary.
    pub top_n: usize,
}

impl ReportConfig {
    pub const DEFAULT: ReportConfig = ReportConfig { top_n: 10 };
}

impl Default for ReportConfig {
    fn default() -> ReportConfig {
        ReportConfig::DEFAULT
    }
}
