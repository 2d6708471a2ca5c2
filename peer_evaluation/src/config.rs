// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The number of criteria rated for each member on a form.
pub const NUM_CRITERIA: usize = 7;

/// One respondent's rating of one team member on one form.
///
/// Identifiers are `None` when the corresponding cell was left blank.
#[derive(PartialEq, Debug, Clone)]
pub struct MemberRating {
    pub group: Option<String>,
    pub respondent: Option<String>,
    pub member: Option<String>,
    /// q1 to q7, in order.
    pub criteria: [Option<f64>; NUM_CRITERIA],
    pub comment: Option<String>,
}

impl MemberRating {
    /// The sum of all the criteria, or `None` as soon as one of them is missing.
    pub fn score(&self) -> Option<f64> {
        self.criteria
            .iter()
            .try_fold(0.0, |acc, &q| q.map(|x| acc + x))
    }

    pub fn is_complete(&self) -> bool {
        self.criteria.iter().all(|q| q.is_some())
    }
}

/// One respondent's free-text answer to the group-level question.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct GroupFeedback {
    pub group: Option<String>,
    pub respondent: Option<String>,
    pub feedback: Option<String>,
}

// ******** Output data structures *********

/// The Peer Evaluation Multiplier of a member.
///
/// `Undefined` is used when the group has no usable rating (or a zero mean), or when
/// the member did not receive any complete rating.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Pem {
    Value(f64),
    Undefined,
}

impl Pem {
    pub fn value(&self) -> Option<f64> {
        match self {
            Pem::Value(x) => Some(*x),
            Pem::Undefined => None,
        }
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pem::Value(x) => write!(f, "{}", x),
            Pem::Undefined => write!(f, "undefined"),
        }
    }
}

/// The final row for one member of one group.
#[derive(PartialEq, Debug, Clone)]
pub struct MemberSummary {
    pub group: Option<String>,
    pub member: Option<String>,
    /// Mean score received by this member, over the complete ratings only.
    pub mean_score: Option<f64>,
    pub pem: Pem,
    /// Mean of each criterion, over the same ratings as `mean_score`.
    pub criteria_means: [Option<f64>; NUM_CRITERIA],
    /// The feedback this member wrote as a respondent, if any.
    pub feedback: Option<String>,
    /// Number of complete ratings received.
    pub num_ratings: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Severity {
    /// The run continues and the results are produced, but they should be reviewed.
    Warning,
    /// Some input was discarded.
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum DiagnosticKind {
    MalformedForm,
    MissingIdentifier,
    RosterMismatch,
    MissingRows,
    MissingCriteria,
    ScoreOutOfRange,
    DuplicateSubmission,
    UndefinedGroupMean,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedForm => "MalformedForm",
            DiagnosticKind::MissingIdentifier => "MissingIdentifier",
            DiagnosticKind::RosterMismatch => "RosterMismatch",
            DiagnosticKind::MissingRows => "MissingRows",
            DiagnosticKind::MissingCriteria => "MissingCriteria",
            DiagnosticKind::ScoreOutOfRange => "ScoreOutOfRange",
            DiagnosticKind::DuplicateSubmission => "DuplicateSubmission",
            DiagnosticKind::UndefinedGroupMean => "UndefinedGroupMean",
        }
    }
}

/// A problem found in the input that should be corrected by hand.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub group: Option<String>,
    pub respondent: Option<String>,
    /// The source file, when the problem is tied to a file rather than to a group.
    pub file: Option<String>,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity.as_str(), self.kind.as_str())?;
        if let Some(file) = &self.file {
            write!(f, " {}", file)?;
        }
        if self.group.is_some() || self.respondent.is_some() {
            write!(
                f,
                " (group {}, respondent {})",
                display_id(&self.group),
                display_id(&self.respondent)
            )?;
        }
        write!(f, ": {}", self.message)
    }
}

/// How an identifier is displayed in messages.
pub fn display_id(id: &Option<String>) -> &str {
    id.as_deref().unwrap_or("<unset>")
}

/// Errors that prevent a form or a corpus from being processed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PeerEvalError {
    /// No form was provided at all.
    NoInputFound,
    /// A form does not follow the expected template.
    MalformedForm { reason: String },
}

impl Error for PeerEvalError {}

impl Display for PeerEvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerEvalError::NoInputFound => write!(f, "no evaluation form found"),
            PeerEvalError::MalformedForm { reason } => write!(f, "malformed form: {}", reason),
        }
    }
}

// ********* Configuration **********

/// A position in a spreadsheet, 0-based.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parses an Excel-style reference such as `C4` or `AB12`.
    pub fn from_a1(s: &str) -> Option<CellRef> {
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let col = column_index(letters)?;
        let row: usize = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(CellRef { row: row - 1, col })
    }
}

impl Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// Converts Excel column letters (`A`, `L`, `AA`) to a 0-based index.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut idx: usize = 0;
    for c in letters.to_ascii_uppercase().chars() {
        idx = idx * 26 + (c as usize - 'A' as usize + 1);
    }
    Some(idx - 1)
}

/// Converts a 0-based column index to Excel column letters.
pub fn column_name(col: usize) -> String {
    let mut n = col + 1;
    let mut letters: Vec<char> = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// The block of rows where each team member is rated.
///
/// The criteria occupy `NUM_CRITERIA` consecutive columns starting at `first_score_col`.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MemberBlock {
    pub first_row: usize,
    pub rows: usize,
    pub member_col: usize,
    pub first_score_col: usize,
    pub comment_col: usize,
}

/// Where each field is located on the evaluation form.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct FormLayout {
    pub respondent: CellRef,
    pub group: CellRef,
    pub feedback: CellRef,
    pub members: MemberBlock,
}

impl FormLayout {
    /// The layout of the evaluation template: respondent in C4, group in C6,
    /// feedback in L11, members in B19:B26, criteria in C19:I26 and comments in L19:L26.
    pub const DEFAULT: FormLayout = FormLayout {
        respondent: CellRef::new(3, 2),
        group: CellRef::new(5, 2),
        feedback: CellRef::new(10, 11),
        members: MemberBlock {
            first_row: 18,
            rows: 8,
            member_col: 1,
            first_score_col: 2,
            comment_col: 11,
        },
    };
}

/// The inclusive range of valid values for a criterion.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }
}

/// What to do with members who did not submit a form of their own.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum JoinMode {
    /// Keep them, with an empty feedback.
    Left,
    /// Drop them from the summary.
    Inner,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AggregationRules {
    /// Number of decimals kept for the means and the multipliers.
    pub decimal_places: u32,
    pub join_mode: JoinMode,
    pub score_range: ScoreRange,
    /// Below this number of rows, a form is reported as missing rows even if it
    /// matches the respondents seen for the group.
    pub min_group_size: usize,
}

impl AggregationRules {
    pub const DEFAULT_RULES: AggregationRules = AggregationRules {
        decimal_places: 4,
        join_mode: JoinMode::Left,
        score_range: ScoreRange { min: 1.0, max: 5.0 },
        min_group_size: 2,
    };
}
