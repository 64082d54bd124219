use clap::Parser;

/// This program computes the voter statistics of a music league.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the league: input files, output locations and rules.
    /// The command line options take precedence over the content of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default 'input') The directory containing competitors.csv, submissions.csv and votes.csv.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path or 'stdout', default 'index.html') Where to write the HTML report.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or 'stdout', optional) If specified, the computed statistics will also be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path, optional) A reference file containing the statistics in JSON format. If provided, mlstats will
    /// check that the computed statistics match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default 'Music League') The name of the league, shown in the report.
    #[clap(long, value_parser)]
    pub title: Option<String>,

    /// If passed as an argument, votes for one's own submission are ignored.
    #[clap(long, takes_value = false)]
    pub exclude_self_votes: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
