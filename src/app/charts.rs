// Drawable chart summaries for computed analyses. The engine hands over
// ranked series; turning a summary into pixels is the consumer's concern.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use election_tally::{AnalysisKind, RankedSeries};
use serde::Serialize;
use snafu::prelude::*;

use crate::app::AppResult;

/// One chart, described as data: the mark kind, a title, and the labelled
/// values in ranked order.
#[derive(Serialize, Debug, Clone)]
pub struct ChartSpec {
    pub chart: String,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

fn spec(chart: &str, title: String, series: &RankedSeries) -> ChartSpec {
    ChartSpec {
        chart: chart.to_string(),
        title,
        labels: series.entries().iter().map(|(v, _)| v.label()).collect(),
        values: series.entries().iter().map(|(_, total)| *total).collect(),
    }
}

/// One drawable summary per computed analysis: bars for regional turnout, a
/// pie for party vote share, horizontal bars for the top candidates.
/// Analyses that were never run produce no chart.
pub fn chart_specs(
    results: &BTreeMap<AnalysisKind, RankedSeries>,
    top_n: usize,
) -> Vec<ChartSpec> {
    let mut specs: Vec<ChartSpec> = Vec::new();
    if let Some(series) = results.get(&AnalysisKind::TurnoutByRegion) {
        specs.push(spec("bar", "Voter Turnout by Region".to_string(), series));
    }
    if let Some(series) = results.get(&AnalysisKind::PartyPerformance) {
        specs.push(spec("pie", "Vote Share by Party".to_string(), series));
    }
    if let Some(series) = results.get(&AnalysisKind::CandidatePerformance) {
        let capped = series.top_n(top_n);
        specs.push(spec(
            "barh",
            format!("Top {} Performing Candidates", top_n),
            &capped,
        ));
    }
    specs
}

pub fn write_chart_file(path: &str, specs: &[ChartSpec]) -> AppResult<()> {
    let js = serde_json::to_string_pretty(specs).whatever_context("Serializing chart summaries")?;
    crate::app::write_text(path, &js)
}

/// Timestamped default location used by the interactive menu, mirroring the
/// original analyzer's `election_analysis_<timestamp>` figure naming.
pub fn default_chart_path(now: &DateTime<Local>) -> String {
    format!("election_analysis_{}.json", now.format("%Y%m%d_%H%M%S"))
}
