mod config;
mod report;
pub mod builder;

use log::{debug, info};

use std::{
    collections::{BTreeMap, HashMap},
    ops::AddAssign,
};

pub use crate::config::*;
pub use crate::report::{compose_report, parse_block, render_block};

// **** Private structures ****

/// Exact integer accumulator for vote totals. No floating-point addition
/// anywhere in the engine, so large counts never drift.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

const REQUIRED_COLUMNS: [&str; 4] = ["region", "candidate", "party", "votes"];

// **** Validation ****

/// Checks that a loaded table has the required schema and that every row
/// carries the four fields with a non-negative whole vote count.
///
/// The data itself is not changed: on success the rows come back as typed
/// records in source order. The only side effect is the pass/fail signal.
pub fn validate(table: &Table) -> Result<ValidatedTable, AnalysisError> {
    debug!(
        "validate: {} rows, columns: {:?}",
        table.rows.len(),
        table.columns
    );
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::MissingColumns(missing));
    }

    // The lookups cannot fail past the schema check above.
    let region_idx = table.column_index("region").unwrap();
    let candidate_idx = table.column_index("candidate").unwrap();
    let party_idx = table.column_index("party").unwrap();
    let votes_idx = table.column_index("votes").unwrap();

    let mut records: Vec<Record> = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let region = text_value(row.get(region_idx), row_idx, "region")?;
        let candidate = text_value(row.get(candidate_idx), row_idx, "candidate")?;
        let party = text_value(row.get(party_idx), row_idx, "party")?;
        let votes = votes_value(row.get(votes_idx), row_idx)?;
        records.push(Record {
            region,
            candidate,
            party,
            votes,
        });
    }
    info!("validate: accepted {} records", records.len());
    Ok(ValidatedTable { records })
}

fn text_value(cell: Option<&Cell>, row: usize, column: &str) -> Result<String, AnalysisError> {
    match cell {
        Some(Cell::Text(s)) if !s.is_empty() => Ok(s.clone()),
        // Numeric labels happen in real files (district numbers, party codes).
        Some(Cell::Int(n)) => Ok(n.to_string()),
        Some(Cell::Float(f)) => Ok(f.to_string()),
        Some(Cell::Text(_)) | Some(Cell::Null) | None => Err(AnalysisError::MissingValue {
            row,
            column: column.to_string(),
        }),
    }
}

fn votes_value(cell: Option<&Cell>, row: usize) -> Result<u64, AnalysisError> {
    match cell {
        Some(Cell::Int(n)) if *n >= 0 => Ok(*n as u64),
        Some(Cell::Int(n)) => Err(invalid_votes(row, n.to_string())),
        Some(Cell::Float(f)) if f.is_finite() && *f >= 0.0 && f.fract() == 0.0 => Ok(*f as u64),
        Some(Cell::Float(f)) => Err(invalid_votes(row, f.to_string())),
        Some(Cell::Text(s)) => parse_votes_text(s).ok_or_else(|| invalid_votes(row, s.clone())),
        Some(Cell::Null) | None => Err(invalid_votes(row, "null".to_string())),
    }
}

fn invalid_votes(row: usize, value: String) -> AnalysisError {
    AnalysisError::InvalidVotesValue { row, value }
}

// Fractional or negative values are rejected, never coerced. Whole-valued
// text like "42" or "42.0" is accepted as its integral value.
fn parse_votes_text(s: &str) -> Option<u64> {
    let t = s.trim();
    if let Ok(n) = t.parse::<u64>() {
        return Some(n);
    }
    match t.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
        _ => None,
    }
}

// **** Aggregation and ranking ****

/// Sums votes per group for the given key. Groups appear in the order they
/// are first observed while scanning the table; a group with zero rows does
/// not appear at all.
pub fn aggregate(table: &ValidatedTable, key: GroupKey) -> AggregateResult {
    let mut totals: Vec<(GroupValue, VoteCount)> = Vec::new();
    let mut positions: HashMap<GroupValue, usize> = HashMap::new();
    for record in table.records() {
        let value = group_value(record, key);
        match positions.get(&value) {
            Some(&pos) => totals[pos].1 += VoteCount(record.votes),
            None => {
                positions.insert(value.clone(), totals.len());
                totals.push((value, VoteCount(record.votes)));
            }
        }
    }
    let grand_total: VoteCount = totals.iter().map(|(_, count)| *count).sum();
    debug!(
        "aggregate: {:?} over {} records -> {} groups, {} votes",
        key,
        table.len(),
        totals.len(),
        grand_total.0
    );
    AggregateResult {
        kind: key.analysis_kind(),
        totals: totals.into_iter().map(|(v, c)| (v, c.0)).collect(),
    }
}

fn group_value(record: &Record, key: GroupKey) -> GroupValue {
    match key {
        GroupKey::Region => GroupValue::Single(record.region.clone()),
        GroupKey::Party => GroupValue::Single(record.party.clone()),
        GroupKey::CandidateParty => {
            GroupValue::Pair(record.candidate.clone(), record.party.clone())
        }
    }
}

/// Orders grouped totals descending. The sort is stable, so groups with
/// equal totals keep the first-encounter order carried by the aggregate.
pub fn rank(aggregate: AggregateResult) -> RankedSeries {
    let mut entries = aggregate.totals;
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    RankedSeries {
        kind: aggregate.kind,
        entries,
    }
}

// **** Session ****

/// Owner of the currently loaded table and the computed analysis results.
///
/// The lifecycle is `Empty -> Loaded -> Analyzed`: loading installs a
/// validated table (and discards any previous results), each analysis run
/// stores or overwrites one kind's ranked series, and reporting formats
/// whatever is present without recomputing anything. One session serves one
/// caller; there is no shared state across sessions.
pub struct AnalysisSession {
    table: Option<ValidatedTable>,
    results: BTreeMap<AnalysisKind, RankedSeries>,
}

impl AnalysisSession {
    pub fn new() -> AnalysisSession {
        AnalysisSession {
            table: None,
            results: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.table, self.results.is_empty()) {
            (None, _) => SessionState::Empty,
            (Some(_), true) => SessionState::Loaded,
            (Some(_), false) => SessionState::Analyzed,
        }
    }

    /// Validates and installs a new table. On success every previously
    /// computed result is discarded (re-analysis is required after a
    /// reload). On failure the session keeps whatever table and results it
    /// already had, so a corrected input can be retried as-is.
    pub fn load(&mut self, table: &Table) -> Result<(), AnalysisError> {
        let validated = validate(table)?;
        info!("load: installing table with {} records", validated.len());
        self.table = Some(validated);
        self.results.clear();
        Ok(())
    }

    /// Runs one analysis over the loaded table and stores its ranked
    /// series, replacing any previous result for the same kind.
    pub fn run_analysis(&mut self, kind: AnalysisKind) -> Result<&RankedSeries, AnalysisError> {
        let table = self.table.as_ref().ok_or(AnalysisError::NoDataLoaded)?;
        let series = rank(aggregate(table, kind.group_key()));
        info!("run_analysis: {} -> {} groups", kind.name(), series.len());
        self.results.insert(kind, series);
        Ok(&self.results[&kind])
    }

    /// Runs all three analyses in report order.
    pub fn run_all(&mut self) -> Result<(), AnalysisError> {
        for kind in AnalysisKind::ALL {
            self.run_analysis(kind)?;
        }
        Ok(())
    }

    pub fn series(&self, kind: AnalysisKind) -> Option<&RankedSeries> {
        self.results.get(&kind)
    }

    pub fn results(&self) -> &BTreeMap<AnalysisKind, RankedSeries> {
        &self.results
    }

    /// Composes the text report for the current results snapshot. Pure with
    /// respect to the session: nothing is recomputed and no state changes.
    pub fn report(
        &self,
        generated_at: &str,
        config: &ReportConfig,
    ) -> Result<String, AnalysisError> {
        if self.results.is_empty() {
            return Err(AnalysisError::NoAnalysisResults);
        }
        Ok(report::compose_report(&self.results, generated_at, config))
    }
}

impl Default for AnalysisSession {
    fn default() -> AnalysisSession {
        AnalysisSession::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    fn sample_table() -> Table {
        TableBuilder::new()
            .record("RegionA", "Alice", "PartyX", 100)
            .record("RegionA", "Bob", "PartyY", 50)
            .record("RegionB", "Alice", "PartyX", 30)
            .build()
    }

    fn single(name: &str) -> GroupValue {
        GroupValue::Single(name.to_string())
    }

    fn pair(candidate: &str, party: &str) -> GroupValue {
        GroupValue::Pair(candidate.to_string(), party.to_string())
    }

    #[test]
    fn scenario_three_analyses() {
        let mut session = AnalysisSession::new();
        session.load(&sample_table()).unwrap();
        session.run_all().unwrap();

        let turnout = session.series(AnalysisKind::TurnoutByRegion).unwrap();
        assert_eq!(
            turnout.entries(),
            &[(single("RegionA"), 150), (single("RegionB"), 30)]
        );

        let party = session.series(AnalysisKind::PartyPerformance).unwrap();
        assert_eq!(
            party.entries(),
            &[(single("PartyX"), 130), (single("PartyY"), 50)]
        );

        let candidate = session.series(AnalysisKind::CandidatePerformance).unwrap();
        assert_eq!(
            candidate.entries(),
            &[(pair("Alice", "PartyX"), 130), (pair("Bob", "PartyY"), 50)]
        );
        assert_eq!(session.state(), SessionState::Analyzed);
    }

    #[test]
    fn totals_are_conserved_for_every_group_key() {
        let table = TableBuilder::new()
            .record("North", "Alice", "Unity", 12)
            .record("South", "Bob", "Unity", 7)
            .record("North", "Carol", "Forward", 9)
            .record("South", "Alice", "Unity", 4)
            .record("East", "Dan", "Forward", 0)
            .build();
        let validated = validate(&table).unwrap();
        let total: u64 = validated.records().iter().map(|r| r.votes).sum();
        for key in [GroupKey::Region, GroupKey::Party, GroupKey::CandidateParty] {
            let agg = aggregate(&validated, key);
            let grouped: u64 = agg.totals.iter().map(|(_, c)| *c).sum();
            assert_eq!(grouped, total, "conservation failed for {:?}", key);
        }
    }

    #[test]
    fn rank_is_complete_and_non_increasing() {
        let table = TableBuilder::new()
            .record("A", "c1", "p1", 5)
            .record("B", "c2", "p1", 40)
            .record("C", "c3", "p2", 40)
            .record("A", "c4", "p2", 11)
            .build();
        let validated = validate(&table).unwrap();
        let agg = aggregate(&validated, GroupKey::Region);
        let distinct = agg.totals.len();
        let series = rank(agg);
        assert_eq!(series.len(), distinct);
        for window in series.entries().windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn ties_keep_first_encounter_order() {
        // Alphabetical order would put Alpha first; the contract is the
        // order in which the groups appear in the table.
        let table = TableBuilder::new()
            .record("Zulu", "c1", "p1", 40)
            .record("Alpha", "c2", "p1", 40)
            .record("Mike", "c3", "p2", 75)
            .build();
        let validated = validate(&table).unwrap();
        for _ in 0..2 {
            let series = rank(aggregate(&validated, GroupKey::Region));
            let order: Vec<String> = series.entries().iter().map(|(v, _)| v.label()).collect();
            assert_eq!(order, ["Mike", "Zulu", "Alpha"]);
        }
    }

    #[test]
    fn top_n_bounds() {
        let mut session = AnalysisSession::new();
        session.load(&sample_table()).unwrap();
        session.run_analysis(AnalysisKind::TurnoutByRegion).unwrap();
        let series = session.series(AnalysisKind::TurnoutByRegion).unwrap();
        assert!(series.top_n(0).is_empty());
        assert_eq!(series.top_n(1).len(), 1);
        assert_eq!(series.top_n(100).entries(), series.entries());
    }

    #[test]
    fn same_name_candidates_in_different_parties_stay_distinct() {
        let table = TableBuilder::new()
            .record("North", "Alice", "Unity", 10)
            .record("South", "Alice", "Forward", 20)
            .build();
        let validated = validate(&table).unwrap();
        let series = rank(aggregate(&validated, GroupKey::CandidateParty));
        assert_eq!(
            series.entries(),
            &[(pair("Alice", "Forward"), 20), (pair("Alice", "Unity"), 10)]
        );
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let table = Table::new(
            vec!["region".to_string(), "candidate".to_string()],
            vec![],
        );
        let err = validate(&table).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingColumns(vec!["party".to_string(), "votes".to_string()])
        );
    }

    #[test]
    fn missing_party_column_leaves_session_untouched() {
        let table = Table::new(
            vec![
                "region".to_string(),
                "candidate".to_string(),
                "votes".to_string(),
            ],
            vec![vec![
                Cell::Text("North".to_string()),
                Cell::Text("Alice".to_string()),
                Cell::Int(10),
            ]],
        );
        let mut session = AnalysisSession::new();
        let err = session.load(&table).unwrap_err();
        assert_eq!(err, AnalysisError::MissingColumns(vec!["party".to_string()]));
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn invalid_votes_values_are_rejected() {
        let cases: Vec<(Cell, &str)> = vec![
            (Cell::Int(-3), "-3"),
            (Cell::Float(12.5), "12.5"),
            (Cell::Text("abc".to_string()), "abc"),
            (Cell::Text("-7".to_string()), "-7"),
            (Cell::Null, "null"),
        ];
        for (cell, raw) in cases {
            let table = TableBuilder::new()
                .record("North", "Alice", "Unity", 1)
                .raw_row(vec![
                    Cell::Text("South".to_string()),
                    Cell::Text("Bob".to_string()),
                    Cell::Text("Unity".to_string()),
                    cell,
                ])
                .build();
            let err = validate(&table).unwrap_err();
            assert_eq!(
                err,
                AnalysisError::InvalidVotesValue {
                    row: 1,
                    value: raw.to_string()
                }
            );
        }
    }

    #[test]
    fn whole_valued_votes_are_accepted() {
        let table = TableBuilder::new()
            .raw_row(vec![
                Cell::Text("North".to_string()),
                Cell::Text("Alice".to_string()),
                Cell::Text("Unity".to_string()),
                Cell::Float(3.0),
            ])
            .raw_row(vec![
                Cell::Text("South".to_string()),
                Cell::Text("Bob".to_string()),
                Cell::Text("Unity".to_string()),
                Cell::Text("42".to_string()),
            ])
            .build();
        let validated = validate(&table).unwrap();
        let votes: Vec<u64> = validated.records().iter().map(|r| r.votes).collect();
        assert_eq!(votes, [3, 42]);
    }

    #[test]
    fn null_region_is_a_missing_value() {
        let table = TableBuilder::new()
            .raw_row(vec![
                Cell::Null,
                Cell::Text("Alice".to_string()),
                Cell::Text("Unity".to_string()),
                Cell::Int(5),
            ])
            .build();
        let err = validate(&table).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingValue {
                row: 0,
                column: "region".to_string()
            }
        );
    }

    #[test]
    fn analysis_requires_loaded_data() {
        let mut session = AnalysisSession::new();
        let err = session.run_analysis(AnalysisKind::TurnoutByRegion).unwrap_err();
        assert_eq!(err, AnalysisError::NoDataLoaded);
    }

    #[test]
    fn report_requires_analysis_results() {
        let mut session = AnalysisSession::new();
        session.load(&sample_table()).unwrap();
        let err = session
            .report("2024-01-01 00:00:00", &ReportConfig::DEFAULT)
            .unwrap_err();
        assert_eq!(err, AnalysisError::NoAnalysisResults);
    }

    #[test]
    fn reload_discards_results() {
        let mut session = AnalysisSession::new();
        session.load(&sample_table()).unwrap();
        session.run_all().unwrap();
        assert_eq!(session.state(), SessionState::Analyzed);

        let other = TableBuilder::new()
            .record("West", "Eve", "Unity", 8)
            .build();
        session.load(&other).unwrap();
        assert_eq!(session.state(), SessionState::Loaded);
        assert!(session.results().is_empty());
        assert!(session.series(AnalysisKind::TurnoutByRegion).is_none());
        let err = session
            .report("2024-01-01 00:00:00", &ReportConfig::DEFAULT)
            .unwrap_err();
        assert_eq!(err, AnalysisError::NoAnalysisResults);
    }

    #[test]
    fn failed_reload_keeps_previous_state() {
        let mut session = AnalysisSession::new();
        session.load(&sample_table()).unwrap();
        session.run_all().unwrap();

        let bad = Table::new(vec!["region".to_string()], vec![]);
        assert!(session.load(&bad).is_err());
        assert_eq!(session.state(), SessionState::Analyzed);
        let turnout = session.series(AnalysisKind::TurnoutByRegion).unwrap();
        assert_eq!(turnout.entries()[0], (single("RegionA"), 150));
    }

    #[test]
    fn rerun_overwrites_single_kind() {
        let mut session = AnalysisSession::new();
        session.load(&sample_table()).unwrap();
        let first = session
            .run_analysis(AnalysisKind::PartyPerformance)
            .unwrap()
            .clone();
        let second = session
            .run_analysis(AnalysisKind::PartyPerformance)
            .unwrap()
            .clone();
        assert_eq!(first, second);
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn empty_table_yields_empty_series() {
        let table = TableBuilder::new().build();
        let mut session = AnalysisSession::new();
        session.load(&table).unwrap();
        assert_eq!(session.state(), SessionState::Loaded);
        let series = session.run_analysis(AnalysisKind::TurnoutByRegion).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn unsupported_analysis_names_are_rejected() {
        assert_eq!(
            AnalysisKind::parse("precinct"),
            Err(AnalysisError::UnsupportedGroupKey("precinct".to_string()))
        );
        assert_eq!(
            AnalysisKind::parse("turnout"),
            Ok(AnalysisKind::TurnoutByRegion)
        );
    }
}
