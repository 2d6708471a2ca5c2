use log::debug;

use crate::config::*;
use crate::grid::{Cell, Grid};

/// The records read from one evaluation form.
#[derive(PartialEq, Debug, Clone)]
pub struct ExtractedForm {
    pub ratings: Vec<MemberRating>,
    pub feedback: GroupFeedback,
}

/// Reads one evaluation form.
///
/// The positions of all the fields are given by the layout. Unset identifiers are not
/// an error: they are carried as `None` and reported later by the validator. The only
/// failures are a form without any content and a criterion cell holding text that is
/// not a number.
pub fn extract_form(grid: &Grid, layout: &FormLayout) -> Result<ExtractedForm, PeerEvalError> {
    if grid.is_blank() {
        return Err(PeerEvalError::MalformedForm {
            reason: "the worksheet is empty".to_string(),
        });
    }

    let respondent = grid.get(layout.respondent).as_text();
    let group = grid.get(layout.group).as_text();
    let feedback = GroupFeedback {
        group: group.clone(),
        respondent: respondent.clone(),
        feedback: grid.get(layout.feedback).as_text(),
    };

    let block = &layout.members;
    let mut ratings: Vec<MemberRating> = Vec::new();
    for row in block.first_row..block.first_row + block.rows {
        let member = grid.get(CellRef::new(row, block.member_col)).as_text();
        let comment = grid.get(CellRef::new(row, block.comment_col)).as_text();
        let mut criteria: [Option<f64>; NUM_CRITERIA] = [None; NUM_CRITERIA];
        for (idx, q) in criteria.iter_mut().enumerate() {
            let pos = CellRef::new(row, block.first_score_col + idx);
            *q = read_criterion(grid.get(pos), pos)?;
        }

        // Unused roster slots of smaller groups.
        if member.is_none() && comment.is_none() && criteria.iter().all(|q| q.is_none()) {
            continue;
        }

        ratings.push(MemberRating {
            group: group.clone(),
            respondent: respondent.clone(),
            member,
            criteria,
            comment,
        });
    }

    debug!(
        "extract_form: group {:?} respondent {:?}: {} rows",
        group,
        respondent,
        ratings.len()
    );

    Ok(ExtractedForm { ratings, feedback })
}

fn read_criterion(cell: &Cell, pos: CellRef) -> Result<Option<f64>, PeerEvalError> {
    match cell {
        Cell::Number(x) => Ok(Some(*x)),
        c if c.is_blank() => Ok(None),
        Cell::Text(s) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Some(x)),
            _ => Err(PeerEvalError::MalformedForm {
                reason: format!("cell {} should hold a rating, found {:?}", pos, s),
            }),
        },
        Cell::Empty => Ok(None),
    }
}

/// Builds a form following the default layout.
#[cfg(test)]
pub(crate) fn make_form(
    group: &str,
    respondent: &str,
    feedback: Option<&str>,
    members: &[(&str, [Option<f64>; NUM_CRITERIA])],
) -> Grid {
    let layout = FormLayout::DEFAULT;
    let text = |s: &str| Cell::Text(s.to_string());
    let mut g = Grid::default();
    g.set(CellRef::new(0, 0), text("Peer evaluation form"));
    g.set(layout.respondent, text(respondent));
    g.set(layout.group, text(group));
    if let Some(f) = feedback {
        g.set(layout.feedback, text(f));
    }
    for (idx, (name, criteria)) in members.iter().enumerate() {
        let row = layout.members.first_row + idx;
        g.set(CellRef::new(row, layout.members.member_col), text(name));
        for (qidx, q) in criteria.iter().enumerate() {
            if let Some(x) = q {
                let col = layout.members.first_score_col + qidx;
                g.set(CellRef::new(row, col), Cell::Number(*x));
            }
        }
    }
    g
}

/// Seven criteria that sum to `total`, for totals between 7 and 35.
#[cfg(test)]
pub(crate) fn criteria_summing_to(total: u32) -> [Option<f64>; NUM_CRITERIA] {
    let mut res = [Some(1.0); NUM_CRITERIA];
    let mut rest = total - NUM_CRITERIA as u32;
    for q in res.iter_mut() {
        let extra = rest.min(4);
        *q = Some((1 + extra) as f64);
        rest -= extra;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(x: f64) -> [Option<f64>; NUM_CRITERIA] {
        [Some(x); NUM_CRITERIA]
    }

    #[test]
    fn reads_fixed_positions() {
        let g = make_form(
            "7",
            "Anna",
            Some("Great team"),
            &[("Anna", full(5.0)), ("Bob", full(4.0))],
        );
        let res = extract_form(&g, &FormLayout::DEFAULT).unwrap();
        assert_eq!(
            res.feedback,
            GroupFeedback {
                group: Some("7".to_string()),
                respondent: Some("Anna".to_string()),
                feedback: Some("Great team".to_string()),
            }
        );
        assert_eq!(res.ratings.len(), 2);
        assert_eq!(res.ratings[1].member, Some("Bob".to_string()));
        assert_eq!(res.ratings[1].respondent, Some("Anna".to_string()));
        assert_eq!(res.ratings[1].group, Some("7".to_string()));
        assert_eq!(res.ratings[1].score(), Some(28.0));
    }

    #[test]
    fn drops_empty_rows_keeps_partial_rows() {
        let mut partial = full(3.0);
        partial[6] = None;
        let mut g = make_form("1", "Anna", None, &[("Anna", full(5.0))]);
        // Third row of the block: a member with one missing criterion.
        let layout = FormLayout::DEFAULT;
        let row = layout.members.first_row + 2;
        g.set(
            CellRef::new(row, layout.members.member_col),
            Cell::Text("Clara".to_string()),
        );
        for (idx, q) in partial.iter().enumerate() {
            if let Some(x) = q {
                g.set(
                    CellRef::new(row, layout.members.first_score_col + idx),
                    Cell::Number(*x),
                );
            }
        }
        // Last row: a comment without a member name is kept too.
        g.set(
            CellRef::new(row + 5, layout.members.comment_col),
            Cell::Text("who is this?".to_string()),
        );

        let res = extract_form(&g, &layout).unwrap();
        let members: Vec<Option<String>> = res.ratings.iter().map(|r| r.member.clone()).collect();
        assert_eq!(
            members,
            vec![Some("Anna".to_string()), Some("Clara".to_string()), None]
        );
        assert_eq!(res.ratings[1].score(), None);
        assert_eq!(res.ratings[2].comment, Some("who is this?".to_string()));
        assert_eq!(res.feedback.feedback, None);
    }

    #[test]
    fn unset_identifiers_are_not_errors() {
        let mut g = Grid::default();
        let layout = FormLayout::DEFAULT;
        g.set(
            CellRef::new(layout.members.first_row, layout.members.member_col),
            Cell::Text("Bob".to_string()),
        );
        let res = extract_form(&g, &layout).unwrap();
        assert_eq!(res.feedback.respondent, None);
        assert_eq!(res.feedback.group, None);
        assert_eq!(res.ratings.len(), 1);
        assert_eq!(res.ratings[0].group, None);
    }

    #[test]
    fn numeric_text_is_accepted() {
        let layout = FormLayout::DEFAULT;
        let mut g = make_form("1", "Anna", None, &[("Anna", full(2.0))]);
        g.set(
            CellRef::new(layout.members.first_row, layout.members.first_score_col),
            Cell::Text(" 4 ".to_string()),
        );
        let res = extract_form(&g, &layout).unwrap();
        assert_eq!(res.ratings[0].score(), Some(16.0));
    }

    #[test]
    fn malformed_forms() {
        let layout = FormLayout::DEFAULT;
        assert!(matches!(
            extract_form(&Grid::default(), &layout),
            Err(PeerEvalError::MalformedForm { .. })
        ));

        let mut g = make_form("1", "Anna", None, &[("Anna", full(2.0))]);
        g.set(
            CellRef::new(layout.members.first_row, layout.members.first_score_col + 1),
            Cell::Text("excellent".to_string()),
        );
        match extract_form(&g, &layout) {
            Err(PeerEvalError::MalformedForm { reason }) => assert!(reason.contains("D19")),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn criteria_fixture() {
        let q = criteria_summing_to(10);
        let total: f64 = q.iter().map(|x| x.unwrap()).sum();
        assert_eq!(total, 10.0);
        assert!(q.iter().all(|x| (1.0..=5.0).contains(&x.unwrap())));
    }
}
