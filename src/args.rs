use clap::Parser;

/// This is a tabulation program for peer evaluations of group work.
///
/// It reads all the evaluation forms (.xlsx) found in a directory and computes the
/// Peer Evaluation Multiplier (PEM) of every group member.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (directory, optional) The directory where the xlsx files are found and the output csv
    /// files will be placed. Defaults to the current directory. Sub-directories are searched too.
    #[clap(short, long, value_parser)]
    pub dir: Option<String>,

    /// (file path, optional) A JSON file describing the layout of the form and the
    /// aggregation rules. The standard template is used if not provided.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A reference file containing the expected summary in CSV format.
    /// If provided, peereval will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default: first worksheet) The name of the worksheet to read in every form.
    /// Setting this option overrides what may be specified in the configuration file.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
