use log::{debug, info, warn};

use peer_evaluation::builder::{Corpus, CorpusBuilder};
use peer_evaluation::validate::validate_corpus;
use peer_evaluation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

use crate::args::Args;
use crate::pem::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

pub const RATINGS_FILE: &str = "peereval.csv";
pub const FEEDBACK_FILE: &str = "group_feedback.csv";
pub const SUMMARY_FILE: &str = "pem.csv";
pub const DIAGNOSTICS_FILE: &str = "diagnostics.csv";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PemError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid cell reference {reference:?} for {field}"))]
    InvalidCellReference { field: String, reference: String },
    #[snafu(display("Cannot find directory {path}"))]
    TargetDirectoryMissing { path: String },
    #[snafu(display("Could not find any xlsx files in {path}"))]
    NoInputFound { path: String },
    #[snafu(display("Error formatting {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading reference summary {path}"))]
    ReadingReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    InvalidCorpus { source: PeerEvalError },
    #[snafu(display("Difference detected between the computed summary and the reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PemResult<T> = Result<T, PemError>;

/// Everything computed during one run.
#[derive(Debug, Clone)]
pub struct Tabulation {
    pub corpus: Corpus,
    /// Skipped forms first, then the validation problems by group and respondent.
    pub diagnostics: Vec<Diagnostic>,
    pub summaries: Vec<MemberSummary>,
}

/// Reads all the given forms and computes the multipliers.
///
/// `read_form` decodes one file. A file that fails to decode is reported and skipped.
pub fn tabulate<F>(
    root: &Path,
    paths: &[PathBuf],
    config: &PemConfig,
    read_form: F,
) -> PemResult<Tabulation>
where
    F: Fn(&Path) -> PemResult<Grid>,
{
    let mut builder = CorpusBuilder::new(&config.layout);
    for p in paths.iter() {
        let name = io_common::relative_name(root, p);
        info!("Attempting to read form {:?}", name);
        match read_form(p) {
            Ok(grid) => builder.add_form(&name, &grid),
            Err(e) => builder.add_skipped(&name, &e.to_string()),
        }
    }
    let corpus = builder.build().map_err(|e| match e {
        PeerEvalError::NoInputFound => PemError::NoInputFound {
            path: root.display().to_string(),
        },
        source => PemError::InvalidCorpus { source },
    })?;

    let mut diagnostics = corpus.diagnostics.clone();
    diagnostics.extend(validate_corpus(
        &corpus.ratings,
        &corpus.feedback,
        &config.rules,
    ));
    let summaries = compute_pem(&corpus.ratings, &corpus.feedback, &config.rules);
    Ok(Tabulation {
        corpus,
        diagnostics,
        summaries,
    })
}

/// Runs the whole process on one directory: discovery, tabulation, output.
///
/// Nothing is written if the directory does not contain any form.
pub fn run_in_directory<F>(
    root: &Path,
    config: &PemConfig,
    check_summary_path: Option<&str>,
    read_form: F,
) -> PemResult<Tabulation>
where
    F: Fn(&Path) -> PemResult<Grid>,
{
    ensure!(
        root.is_dir(),
        TargetDirectoryMissingSnafu {
            path: root.display().to_string()
        }
    );
    let paths = io_common::find_forms(root);
    ensure!(
        !paths.is_empty(),
        NoInputFoundSnafu {
            path: root.display().to_string()
        }
    );
    debug!("run_in_directory: forms: {:?}", paths);

    let tab = tabulate(root, &paths, config, read_form)?;
    print_report(&tab);

    write_output(root, RATINGS_FILE, &io_csv::ratings_to_csv(&tab.corpus.ratings)?)?;
    write_output(
        root,
        FEEDBACK_FILE,
        &io_csv::feedback_to_csv(&tab.corpus.feedback)?,
    )?;
    let summary_csv = io_csv::summary_to_csv(&tab.summaries)?;
    write_output(root, SUMMARY_FILE, &summary_csv)?;
    write_output(
        root,
        DIAGNOSTICS_FILE,
        &io_csv::diagnostics_to_csv(&tab.diagnostics)?,
    )?;
    println!("Completed calculations and data export.");

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(summary_p, &summary_csv)?;
    }
    Ok(tab)
}

pub fn run_peer_eval(args: &Args) -> PemResult<()> {
    let dir = args.dir.clone().unwrap_or_else(|| ".".to_string());
    let root = Path::new(dir.as_str());
    ensure!(root.is_dir(), TargetDirectoryMissingSnafu { path: dir.clone() });

    let mut config = read_config(args.config.as_deref())?;
    if let Some(name) = args.excel_worksheet_name.clone() {
        config.worksheet = Some(name);
    }
    info!("config: {:?}", config);

    println!("Peer Evaluation Multiplier calculation in progress...");
    let worksheet = config.worksheet.clone();
    run_in_directory(root, &config, args.reference.as_deref(), |p| {
        io_xlsx::read_form(p, worksheet.as_deref())
    })?;
    Ok(())
}

fn write_output(root: &Path, file_name: &str, contents: &str) -> PemResult<()> {
    let p = root.join(file_name);
    info!("Writing {:?}", p);
    fs::write(&p, contents).context(WritingFileSnafu {
        path: p.display().to_string(),
    })
}

fn print_report(tab: &Tabulation) {
    let skipped = tab
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::MalformedForm)
        .count();
    println!(
        "Read {} forms ({} skipped), {} member evaluations",
        tab.corpus.forms_read,
        skipped,
        tab.corpus.ratings.len()
    );
    if tab.diagnostics.is_empty() {
        println!("Data checking complete: no problem found.");
    } else {
        println!("Data checking found {} problem(s):", tab.diagnostics.len());
        for d in tab.diagnostics.iter() {
            println!("  {}", d);
        }
        println!(
            "If there were issues, be sure to address them before finalizing the analysis (see {}).",
            DIAGNOSTICS_FILE
        );
    }
    let undefined = tab
        .summaries
        .iter()
        .filter(|s| s.pem == Pem::Undefined)
        .count();
    println!(
        "Computed the PEM of {} members ({} undefined)",
        tab.summaries.len(),
        undefined
    );
}

fn check_reference(summary_p: &str, computed: &str) -> PemResult<()> {
    let reference = fs::read_to_string(summary_p).context(ReadingReferenceSnafu { path: summary_p })?;
    // Line endings depend on the tool that produced the reference.
    let reference = reference.replace("\r\n", "\n");
    if reference != computed {
        warn!("Found differences with the reference summary");
        print_diff(reference.as_str(), computed, "\n");
        return ReferenceMismatchSnafu { path: summary_p }.fail();
    }
    info!("The summary matches the reference {}", summary_p);
    Ok(())
}
