use clap::Parser;

/// Analyzer for tabular election results: turnout by region, party and
/// candidate totals, text reports and drawable chart summaries.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The election data file to analyze. CSV and JSON inputs are
    /// currently supported.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default inferred from the file extension) The type of the input: csv or json.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (repeatable) The analyses to run: turnout, party, candidate. All three run
    /// when not specified.
    #[clap(short, long, value_parser)]
    pub analysis: Option<Vec<String>>,

    /// (file path, 'stdout' or empty) Where the text report is written. Defaults to
    /// the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, drawable chart summaries for the computed
    /// analyses will be written in JSON format to the given location.
    #[clap(long, value_parser)]
    pub charts: Option<String>,

    /// (file path) A reference report. If provided, elda will check that the freshly
    /// composed report matches the reference (the generation timestamp is ignored).
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default 10) Caps the candidate-performance section of the report and of the
    /// chart summaries.
    #[clap(long, value_parser)]
    pub top_n: Option<usize>,

    /// Starts the interactive menu instead of the one-shot pipeline.
    #[clap(long, takes_value = false)]
    pub interactive: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
