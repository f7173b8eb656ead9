//! Rendering of ranked series into the fixed text report format, and the
//! parse-back used for golden-file comparisons.

use std::collections::BTreeMap;

use crate::config::*;

pub(crate) const REPORT_TITLE: &str = "ELECTION ANALYSIS REPORT";

fn block_header(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::TurnoutByRegion => "VOTER TURNOUT BY REGION:",
        AnalysisKind::PartyPerformance => "PARTY PERFORMANCE:",
        AnalysisKind::CandidatePerformance => "CANDIDATE PERFORMANCE:",
    }
}

/// Renders one analysis block: the fixed per-kind header, then one line per
/// (key, total) pair in ranked order. Labels are left-justified and padded
/// to the widest label of the block, totals right-justified, so the block
/// is stable for a given series.
pub fn render_block(series: &RankedSeries) -> String {
    let width = series
        .entries()
        .iter()
        .map(|(value, _)| value.label().chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    out.push_str(block_header(series.kind));
    out.push('\n');
    for (value, total) in series.entries() {
        out.push_str(&format!(
            "{:<width$}  {:>10}\n",
            value.label(),
            total,
            width = width
        ));
    }
    out
}

/// Composes the full report: title, separator rule, generation timestamp,
/// then each available analysis block in fixed order (turnout, party,
/// candidate), each followed by a blank line. Kinds that were never
/// computed are omitted entirely. The candidate block is capped at the
/// configured top-N.
///
/// This is a pure function of the results snapshot and the timestamp
/// string; nothing is recomputed here.
pub fn compose_report(
    results: &BTreeMap<AnalysisKind, RankedSeries>,
    generated_at: &str,
    config: &ReportConfig,
) -> String {
    let mut out = String::new();
    out.push_str(REPORT_TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(40));
    out.push_str("\n\n");
    out.push_str(&format!("Generated on: {}\n\n", generated_at));
    for kind in AnalysisKind::ALL {
        if let Some(series) = results.get(&kind) {
            let capped;
            let block = if kind == AnalysisKind::CandidatePerformance {
                capped = series.top_n(config.top_n);
                &capped
            } else {
                series
            };
            out.push_str(&render_block(block));
            out.push('\n');
        }
    }
    out
}

/// Recovers the (label, total) pairs from a rendered block. Returns `None`
/// if the text does not start with a known block header or a line does not
/// end in a whole number.
pub fn parse_block(block: &str) -> Option<(AnalysisKind, Vec<(String, u64)>)> {
    let mut lines = block.lines();
    let header = lines.next()?.trim_end();
    let kind = AnalysisKind::ALL
        .iter()
        .copied()
        .find(|k| block_header(*k) == header)?;
    let mut entries: Vec<(String, u64)> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_line(line)?);
    }
    Some((kind, entries))
}

fn parse_line(line: &str) -> Option<(String, u64)> {
    let trimmed = line.trim_end();
    let split = trimmed.rfind(|c: char| c.is_whitespace())?;
    let total = trimmed[split + 1..].parse::<u64>().ok()?;
    let label = trimmed[..split].trim_end().to_string();
    if label.is_empty() {
        return None;
    }
    Some((label, total))
}
