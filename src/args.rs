use clap::Parser;

/// This is a ranked-choice vote tabulation program for Google Forms data.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The CSV file exported from the Google Form. The candidate
    /// columns are detected automatically: a column is a candidate iff all
    /// of its cells are empty or a choice label ('First choice' up to
    /// 'Fifth choice', case does not matter).
    #[clap(short, long, value_parser)]
    pub input: String,

    /// ('r' or a voter number) How to repair improper votes that give one
    /// choice level to several candidates: 'r' draws among the conflicting
    /// candidates, a 1-indexed voter number adopts that voter's own order.
    /// If not specified and improper votes are present, the program asks
    /// interactively.
    #[clap(short, long, value_parser)]
    pub tie_break: Option<String>,

    /// (default 0) The seed for the draws used when repairing improper
    /// votes. Runs with the same seed and inputs give the same results.
    #[clap(short, long, value_parser, default_value_t = 0)]
    pub seed: u32,

    /// (file path, 'stdout' or empty) If specified, a summary of the
    /// election will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, never prompts: improper votes are repaired
    /// with draws unless --tie-break says otherwise.
    #[clap(long, takes_value = false)]
    pub no_prompt: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
