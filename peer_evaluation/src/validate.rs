use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::*;

type Id = Option<String>;

/// Checks that the forms of each group are consistent with each other.
///
/// The roster of a group is approximated by the set of respondents seen for that
/// group. For every respondent, in order, three independent checks are run:
/// - the members listed on the form are exactly the roster
/// - the form has one row per member of the roster (and at least `min_group_size` rows)
/// - all the criteria are filled in
///
/// Additionally, out-of-range criteria and groups without any usable rating are
/// reported. Nothing is modified and nothing fails: the diagnostics are advisory.
pub fn validate_ratings(ratings: &[MemberRating], rules: &AggregationRules) -> Vec<Diagnostic> {
    let mut by_group: BTreeMap<&Id, BTreeMap<&Id, Vec<&MemberRating>>> = BTreeMap::new();
    for r in ratings.iter() {
        by_group
            .entry(&r.group)
            .or_default()
            .entry(&r.respondent)
            .or_default()
            .push(r);
    }

    let mut res: Vec<Diagnostic> = Vec::new();
    for (group, forms) in by_group.iter() {
        debug!("validate_ratings: checking group {}", display_id(group));
        let roster: BTreeSet<&Id> = forms.keys().cloned().collect();
        let expected_rows = roster.len().max(rules.min_group_size);

        for (respondent, rows) in forms.iter() {
            let diag = |kind: DiagnosticKind, message: String| Diagnostic {
                severity: Severity::Warning,
                kind,
                group: (*group).clone(),
                respondent: (*respondent).clone(),
                file: None,
                message,
            };
            let rated: BTreeSet<&Id> = rows.iter().map(|r| &r.member).collect();
            if rated != roster {
                res.push(diag(
                    DiagnosticKind::RosterMismatch,
                    format!(
                        "form from {} does not list exactly the expected group roster (expected {}, found {})",
                        display_id(respondent),
                        list_ids(&roster),
                        list_ids(&rated)
                    ),
                ));
            }
            if rows.len() != roster.len() || rows.len() < expected_rows {
                res.push(diag(
                    DiagnosticKind::MissingRows,
                    format!(
                        "form from {} is missing or has extra member-evaluation rows ({} rows, {} expected)",
                        display_id(respondent),
                        rows.len(),
                        expected_rows
                    ),
                ));
            }
            if rows.iter().any(|r| !r.is_complete()) {
                res.push(diag(
                    DiagnosticKind::MissingCriteria,
                    format!(
                        "form from {} has missing criterion ratings",
                        display_id(respondent)
                    ),
                ));
            }
            let out_of_range: Vec<String> = rows
                .iter()
                .filter(|r| {
                    r.criteria
                        .iter()
                        .flatten()
                        .any(|x| !rules.score_range.contains(*x))
                })
                .map(|r| display_id(&r.member).to_string())
                .collect();
            if !out_of_range.is_empty() {
                res.push(diag(
                    DiagnosticKind::ScoreOutOfRange,
                    format!(
                        "form from {} has ratings outside of {}..{} for {}",
                        display_id(respondent),
                        rules.score_range.min,
                        rules.score_range.max,
                        out_of_range.join(", ")
                    ),
                ));
            }
        }

        let total: f64 = forms
            .values()
            .flatten()
            .filter_map(|r| r.score())
            .sum();
        let has_scores = forms.values().flatten().any(|r| r.is_complete());
        if !has_scores || total == 0.0 {
            res.push(Diagnostic {
                severity: Severity::Warning,
                kind: DiagnosticKind::UndefinedGroupMean,
                group: (*group).clone(),
                respondent: None,
                file: None,
                message: format!(
                    "group {} has no usable rating, its multipliers are undefined",
                    display_id(group)
                ),
            });
        }
    }
    res
}

/// Checks the group-level records: one per form.
///
/// Reports forms without a respondent or a group, and respondents who submitted more
/// than one form for the same group.
pub fn validate_feedback(feedback: &[GroupFeedback]) -> Vec<Diagnostic> {
    let mut counts: BTreeMap<(&Id, &Id), usize> = BTreeMap::new();
    for f in feedback.iter() {
        *counts.entry((&f.group, &f.respondent)).or_insert(0) += 1;
    }

    let mut res: Vec<Diagnostic> = Vec::new();
    for ((group, respondent), count) in counts.into_iter() {
        if group.is_none() || respondent.is_none() {
            let missing = match (group, respondent) {
                (None, None) => "group and respondent",
                (None, _) => "group",
                _ => "respondent",
            };
            res.push(Diagnostic {
                severity: Severity::Warning,
                kind: DiagnosticKind::MissingIdentifier,
                group: group.clone(),
                respondent: respondent.clone(),
                file: None,
                message: format!("{} form(s) without a {}", count, missing),
            });
        }
        if count > 1 {
            res.push(Diagnostic {
                severity: Severity::Warning,
                kind: DiagnosticKind::DuplicateSubmission,
                group: group.clone(),
                respondent: respondent.clone(),
                file: None,
                message: format!(
                    "{} forms submitted by {} for group {}",
                    count,
                    display_id(respondent),
                    display_id(group)
                ),
            });
        }
    }
    res
}

/// All the checks on a set of records, ordered by group then respondent.
pub fn validate_corpus(
    ratings: &[MemberRating],
    feedback: &[GroupFeedback],
    rules: &AggregationRules,
) -> Vec<Diagnostic> {
    let mut res = validate_feedback(feedback);
    res.extend(validate_ratings(ratings, rules));
    // Stable: within a respondent, the checks keep their order.
    res.sort_by(|a, b| (&a.group, &a.respondent).cmp(&(&b.group, &b.respondent)));
    for d in res.iter() {
        warn!("{}", d);
    }
    res
}

fn list_ids(ids: &BTreeSet<&Id>) -> String {
    let names: Vec<&str> = ids.iter().map(|id| display_id(id)).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(group: &str, respondent: &str, member: &str, q: f64) -> MemberRating {
        MemberRating {
            group: Some(group.to_string()),
            respondent: Some(respondent.to_string()),
            member: Some(member.to_string()),
            criteria: [Some(q); NUM_CRITERIA],
            comment: None,
        }
    }

    fn well_formed() -> Vec<MemberRating> {
        let mut res = Vec::new();
        for r in ["Anna", "Bob", "Clara"] {
            for m in ["Anna", "Bob", "Clara"] {
                res.push(rating("1", r, m, 4.0));
            }
        }
        res
    }

    fn kinds(ds: &[Diagnostic]) -> Vec<(DiagnosticKind, &str)> {
        ds.iter()
            .map(|d| (d.kind, display_id(&d.respondent)))
            .collect()
    }

    #[test]
    fn well_formed_group_is_clean() {
        let rules = AggregationRules::DEFAULT_RULES;
        assert!(validate_ratings(&well_formed(), &rules).is_empty());
    }

    #[test]
    fn roster_mismatch_names_the_respondent() {
        let mut ratings = well_formed();
        // Bob wrote a wrong name for Clara.
        ratings[5].member = Some("Klara".to_string());
        let ds = validate_ratings(&ratings, &AggregationRules::DEFAULT_RULES);
        assert_eq!(kinds(&ds), vec![(DiagnosticKind::RosterMismatch, "Bob")]);
        assert!(ds[0].message.contains("form from Bob"));
        assert!(ds[0].message.contains("Klara"));
    }

    #[test]
    fn missing_rows() {
        let mut ratings = well_formed();
        ratings.remove(8);
        let ds = validate_ratings(&ratings, &AggregationRules::DEFAULT_RULES);
        assert_eq!(
            kinds(&ds),
            vec![
                (DiagnosticKind::RosterMismatch, "Clara"),
                (DiagnosticKind::MissingRows, "Clara")
            ]
        );
    }

    #[test]
    fn duplicate_row_is_a_row_count_problem_only() {
        let mut ratings = well_formed();
        ratings.push(rating("1", "Anna", "Bob", 4.0));
        let ds = validate_ratings(&ratings, &AggregationRules::DEFAULT_RULES);
        assert_eq!(kinds(&ds), vec![(DiagnosticKind::MissingRows, "Anna")]);
    }

    #[test]
    fn all_checks_fire_independently() {
        let mut ratings = well_formed();
        ratings.truncate(7);
        ratings[6].criteria[2] = None;
        let ds = validate_ratings(&ratings, &AggregationRules::DEFAULT_RULES);
        assert_eq!(
            kinds(&ds),
            vec![
                (DiagnosticKind::RosterMismatch, "Clara"),
                (DiagnosticKind::MissingRows, "Clara"),
                (DiagnosticKind::MissingCriteria, "Clara"),
            ]
        );
    }

    #[test]
    fn sole_respondent_rating_only_themselves() {
        let ratings = vec![rating("5", "Dan", "Dan", 3.0)];
        let ds = validate_ratings(&ratings, &AggregationRules::DEFAULT_RULES);
        assert_eq!(kinds(&ds), vec![(DiagnosticKind::MissingRows, "Dan")]);
        assert!(ds[0].message.contains("Dan"));
    }

    #[test]
    fn out_of_range_and_undefined_mean() {
        let mut ratings = vec![rating("1", "Anna", "Anna", 4.0), rating("1", "Anna", "Bob", 9.0)];
        ratings.push(rating("1", "Bob", "Anna", 4.0));
        ratings.push(rating("1", "Bob", "Bob", 4.0));
        let mut empty = rating("2", "Eve", "Eve", 1.0);
        empty.criteria = [None; NUM_CRITERIA];
        ratings.push(empty.clone());
        let mut other = empty;
        other.respondent = Some("Finn".to_string());
        ratings.push(other);

        let ds = validate_ratings(&ratings, &AggregationRules::DEFAULT_RULES);
        let found: Vec<DiagnosticKind> = ds.iter().map(|d| d.kind).collect();
        assert_eq!(
            found,
            vec![
                DiagnosticKind::ScoreOutOfRange,
                DiagnosticKind::RosterMismatch,
                DiagnosticKind::MissingRows,
                DiagnosticKind::MissingCriteria,
                DiagnosticKind::RosterMismatch,
                DiagnosticKind::MissingRows,
                DiagnosticKind::MissingCriteria,
                DiagnosticKind::UndefinedGroupMean,
            ]
        );
        assert!(ds[0].message.contains("Bob"));
        assert_eq!(ds[7].group, Some("2".to_string()));
        assert_eq!(ds[7].respondent, None);
    }

    #[test]
    fn feedback_checks() {
        let fb = |g: Option<&str>, r: Option<&str>| GroupFeedback {
            group: g.map(|s| s.to_string()),
            respondent: r.map(|s| s.to_string()),
            feedback: None,
        };
        let ds = validate_feedback(&[
            fb(Some("1"), Some("Anna")),
            fb(Some("1"), Some("Anna")),
            fb(Some("1"), None),
            fb(None, Some("Bob")),
            fb(Some("2"), Some("Bob")),
        ]);
        let found: Vec<DiagnosticKind> = ds.iter().map(|d| d.kind).collect();
        assert_eq!(
            found,
            vec![
                DiagnosticKind::MissingIdentifier,
                DiagnosticKind::MissingIdentifier,
                DiagnosticKind::DuplicateSubmission,
            ]
        );
        assert!(ds[0].message.contains("without a group"));
        assert!(ds[1].message.contains("without a respondent"));
    }

    #[test]
    fn corpus_diagnostics_are_ordered() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut ratings = well_formed();
        ratings.remove(8);
        let fb = |r: &str| GroupFeedback {
            group: Some("1".to_string()),
            respondent: Some(r.to_string()),
            feedback: None,
        };
        let feedback = vec![fb("Clara"), fb("Anna"), fb("Anna"), fb("Bob")];
        let ds = validate_corpus(&ratings, &feedback, &AggregationRules::DEFAULT_RULES);
        assert_eq!(
            kinds(&ds),
            vec![
                (DiagnosticKind::DuplicateSubmission, "Anna"),
                (DiagnosticKind::RosterMismatch, "Clara"),
                (DiagnosticKind::MissingRows, "Clara"),
            ]
        );
    }
}
