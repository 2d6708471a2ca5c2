use log::{debug, info, warn};

use crate::config::*;
use crate::extract::extract_form;
use crate::grid::Grid;

/// All the records read from a collection of forms, in canonical order.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Corpus {
    /// Sorted by group, respondent and member.
    pub ratings: Vec<MemberRating>,
    /// Sorted by group and respondent.
    pub feedback: Vec<GroupFeedback>,
    /// Forms that could not be read.
    pub diagnostics: Vec<Diagnostic>,
    pub forms_read: usize,
}

/// A builder for accumulating forms.
///
/// The order in which the forms are added does not matter: the records are sorted when
/// the corpus is built.
///
/// ```
/// use peer_evaluation::builder::CorpusBuilder;
/// use peer_evaluation::{Cell, CellRef, FormLayout, Grid, PeerEvalError};
///
/// let mut builder = CorpusBuilder::new(&FormLayout::DEFAULT);
/// let mut grid = Grid::default();
/// grid.set(CellRef::new(3, 2), Cell::Text("Anna".to_string()));
/// builder.add_form("anna.xlsx", &grid);
/// let corpus = builder.build()?;
/// assert_eq!(corpus.forms_read, 1);
/// # Ok::<(), PeerEvalError>(())
/// ```
pub struct CorpusBuilder {
    pub(crate) _layout: FormLayout,
    pub(crate) _ratings: Vec<MemberRating>,
    pub(crate) _feedback: Vec<GroupFeedback>,
    pub(crate) _diagnostics: Vec<Diagnostic>,
    pub(crate) _num_sources: usize,
}

impl CorpusBuilder {
    pub fn new(layout: &FormLayout) -> CorpusBuilder {
        CorpusBuilder {
            _layout: *layout,
            _ratings: Vec::new(),
            _feedback: Vec::new(),
            _diagnostics: Vec::new(),
            _num_sources: 0,
        }
    }

    /// Adds a form.
    ///
    /// A form that does not follow the layout is skipped and reported as a diagnostic.
    pub fn add_form(&mut self, source: &str, grid: &Grid) {
        self._num_sources += 1;
        match extract_form(grid, &self._layout) {
            Ok(form) => {
                debug!("add_form: {}: {} ratings", source, form.ratings.len());
                self._ratings.extend(form.ratings);
                self._feedback.push(form.feedback);
            }
            Err(e) => {
                warn!("add_form: skipping {}: {}", source, e);
                self.record_skipped(source, &e.to_string());
            }
        }
    }

    /// Records a source that could not even be decoded into a grid.
    pub fn add_skipped(&mut self, source: &str, reason: &str) {
        warn!("add_skipped: skipping {}: {}", source, reason);
        self._num_sources += 1;
        self.record_skipped(source, reason);
    }

    fn record_skipped(&mut self, source: &str, reason: &str) {
        self._diagnostics.push(Diagnostic {
            severity: Severity::Error,
            kind: DiagnosticKind::MalformedForm,
            group: None,
            respondent: None,
            file: Some(source.to_string()),
            message: format!("form skipped: {}", reason),
        });
    }

    pub fn build(self) -> Result<Corpus, PeerEvalError> {
        if self._num_sources == 0 {
            return Err(PeerEvalError::NoInputFound);
        }
        let mut ratings = self._ratings;
        ratings.sort_by(|a, b| {
            (&a.group, &a.respondent, &a.member).cmp(&(&b.group, &b.respondent, &b.member))
        });
        let mut feedback = self._feedback;
        feedback.sort_by(|a, b| (&a.group, &a.respondent).cmp(&(&b.group, &b.respondent)));
        let mut diagnostics = self._diagnostics;
        diagnostics.sort_by(|a, b| a.file.cmp(&b.file));

        info!(
            "Read {} forms ({} skipped): {} ratings",
            feedback.len(),
            diagnostics.len(),
            ratings.len()
        );
        Ok(Corpus {
            forms_read: feedback.len(),
            ratings,
            feedback,
            diagnostics,
        })
    }
}

/// Builds a corpus out of a list of named forms.
pub fn build_corpus(forms: &[(String, Grid)], layout: &FormLayout) -> Result<Corpus, PeerEvalError> {
    let mut builder = CorpusBuilder::new(layout);
    for (source, grid) in forms.iter() {
        builder.add_form(source, grid);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{criteria_summing_to, make_form};

    fn forms() -> Vec<(String, Grid)> {
        let q = criteria_summing_to(21);
        vec![
            (
                "g2/zed.xlsx".to_string(),
                make_form("2", "Zed", None, &[("Zed", q), ("Yann", q)]),
            ),
            (
                "g1/bob.xlsx".to_string(),
                make_form("1", "Bob", Some("ok"), &[("Bob", q), ("Anna", q)]),
            ),
            (
                "g1/anna.xlsx".to_string(),
                make_form("1", "Anna", Some("fine"), &[("Bob", q), ("Anna", q)]),
            ),
        ]
    }

    fn keys(c: &Corpus) -> Vec<(String, String, String)> {
        c.ratings
            .iter()
            .map(|r| {
                (
                    display_id(&r.group).to_string(),
                    display_id(&r.respondent).to_string(),
                    display_id(&r.member).to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn canonical_order() {
        let corpus = build_corpus(&forms(), &FormLayout::DEFAULT).unwrap();
        let expected: Vec<(String, String, String)> = [
            ("1", "Anna", "Anna"),
            ("1", "Anna", "Bob"),
            ("1", "Bob", "Anna"),
            ("1", "Bob", "Bob"),
            ("2", "Zed", "Yann"),
            ("2", "Zed", "Zed"),
        ]
        .iter()
        .map(|(g, r, m)| (g.to_string(), r.to_string(), m.to_string()))
        .collect();
        assert_eq!(keys(&corpus), expected);
        let fb: Vec<&str> = corpus
            .feedback
            .iter()
            .map(|f| display_id(&f.respondent))
            .collect();
        assert_eq!(fb, vec!["Anna", "Bob", "Zed"]);
        assert_eq!(corpus.forms_read, 3);
        assert!(corpus.diagnostics.is_empty());
    }

    #[test]
    fn order_does_not_depend_on_input_order() {
        let mut reversed = forms();
        reversed.reverse();
        let c1 = build_corpus(&forms(), &FormLayout::DEFAULT).unwrap();
        let c2 = build_corpus(&reversed, &FormLayout::DEFAULT).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            build_corpus(&[], &FormLayout::DEFAULT),
            Err(PeerEvalError::NoInputFound)
        );
    }

    #[test]
    fn skipped_forms_are_reported() {
        let mut builder = CorpusBuilder::new(&FormLayout::DEFAULT);
        for (source, grid) in forms().iter() {
            builder.add_form(source, grid);
        }
        builder.add_form("blank.xlsx", &Grid::default());
        builder.add_skipped("corrupt.xlsx", "not a zip file");
        let corpus = builder.build().unwrap();
        assert_eq!(corpus.forms_read, 3);
        assert_eq!(corpus.ratings.len(), 6);
        let files: Vec<Option<&str>> = corpus.diagnostics.iter().map(|d| d.file.as_deref()).collect();
        assert_eq!(files, vec![Some("blank.xlsx"), Some("corrupt.xlsx")]);
        assert!(corpus
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::MalformedForm && d.severity == Severity::Error));
    }

    #[test]
    fn only_skipped_forms_still_build() {
        let mut builder = CorpusBuilder::new(&FormLayout::DEFAULT);
        builder.add_skipped("corrupt.xlsx", "not a zip file");
        let corpus = builder.build().unwrap();
        assert_eq!(corpus.forms_read, 0);
        assert!(corpus.ratings.is_empty());
        assert_eq!(corpus.diagnostics.len(), 1);
    }
}
