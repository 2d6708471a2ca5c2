mod config;
mod grid;

pub mod builder;
pub mod extract;
pub mod manual;
pub mod validate;

use log::{debug, info};

use std::collections::BTreeMap;

pub use crate::config::*;
pub use crate::grid::{Cell, Grid};

type GroupKey = Option<String>;
type MemberKey = (Option<String>, Option<String>);

// Running sums for the complete ratings of one member.
#[derive(Debug, Clone, Default)]
struct MemberTally {
    score_sum: f64,
    criteria_sums: [f64; NUM_CRITERIA],
    num_ratings: usize,
}

impl MemberTally {
    fn add(&mut self, rating: &MemberRating) {
        if let Some(score) = rating.score() {
            self.score_sum += score;
            for (acc, q) in self.criteria_sums.iter_mut().zip(rating.criteria.iter()) {
                *acc += q.unwrap_or(0.0);
            }
            self.num_ratings += 1;
        }
    }

    fn mean(&self, total: f64) -> Option<f64> {
        if self.num_ratings == 0 {
            None
        } else {
            Some(total / self.num_ratings as f64)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GroupTally {
    score_sum: f64,
    num_ratings: usize,
}

impl GroupTally {
    // A group without usable ratings, or whose ratings sum to zero, has no mean.
    fn mean(&self) -> Option<f64> {
        if self.num_ratings == 0 || self.score_sum == 0.0 {
            None
        } else {
            Some(self.score_sum / self.num_ratings as f64)
        }
    }
}

/// Rounds to the given number of decimal places, half away from zero.
pub fn round_to(x: f64, decimal_places: u32) -> f64 {
    let factor = 10f64.powi(decimal_places as i32);
    (x * factor).round() / factor
}

/// Computes the Peer Evaluation Multiplier of every member.
///
/// Arguments:
/// * `ratings` all the member ratings, in any order
/// * `feedback` the group-level answers, merged into the summary of the member who wrote them
/// * `rules` the rounding precision and the join policy for the feedback
///
/// Only the complete ratings (all criteria filled in) are used for the means. The mean
/// of a group counts every complete rating of the group once. The multiplier is the
/// rounded mean of the member divided by the mean of the group, rounded again.
///
/// The summaries are sorted by group and member.
pub fn compute_pem(
    ratings: &[MemberRating],
    feedback: &[GroupFeedback],
    rules: &AggregationRules,
) -> Vec<MemberSummary> {
    info!(
        "Processing {} ratings and {} feedback answers",
        ratings.len(),
        feedback.len()
    );

    let mut groups: BTreeMap<GroupKey, GroupTally> = BTreeMap::new();
    let mut members: BTreeMap<MemberKey, MemberTally> = BTreeMap::new();
    for r in ratings.iter() {
        let gt = groups.entry(r.group.clone()).or_default();
        if let Some(score) = r.score() {
            gt.score_sum += score;
            gt.num_ratings += 1;
        }
        // Members that only received incomplete ratings still get a row.
        members
            .entry((r.group.clone(), r.member.clone()))
            .or_default()
            .add(r);
    }

    // If a respondent submitted several forms, the first one in canonical order wins.
    let mut sorted_feedback: Vec<&GroupFeedback> = feedback.iter().collect();
    sorted_feedback.sort_by(|a, b| (&a.group, &a.respondent).cmp(&(&b.group, &b.respondent)));
    let mut answers: BTreeMap<MemberKey, Option<String>> = BTreeMap::new();
    for f in sorted_feedback {
        answers
            .entry((f.group.clone(), f.respondent.clone()))
            .or_insert_with(|| f.feedback.clone());
    }

    let places = rules.decimal_places;
    let mut res: Vec<MemberSummary> = Vec::new();
    for ((group, member), tally) in members.into_iter() {
        let key = (group.clone(), member.clone());
        let answer = match (answers.get(&key), rules.join_mode) {
            (Some(a), _) => a.clone(),
            (None, JoinMode::Left) => None,
            (None, JoinMode::Inner) => {
                debug!(
                    "compute_pem: dropping {} in group {}: no form of their own",
                    display_id(&member),
                    display_id(&group)
                );
                continue;
            }
        };

        let mean_score = tally.mean(tally.score_sum).map(|x| round_to(x, places));
        let group_mean = groups.get(&group).and_then(|gt| gt.mean());
        let pem = match (mean_score, group_mean) {
            (Some(ms), Some(gm)) => Pem::Value(round_to(ms / gm, places)),
            _ => Pem::Undefined,
        };
        let mut criteria_means: [Option<f64>; NUM_CRITERIA] = [None; NUM_CRITERIA];
        for (m, total) in criteria_means.iter_mut().zip(tally.criteria_sums.iter()) {
            *m = tally.mean(*total).map(|x| round_to(x, places));
        }

        debug!(
            "compute_pem: group {} member {}: mean {:?} group mean {:?} pem {}",
            display_id(&group),
            display_id(&member),
            mean_score,
            group_mean,
            pem
        );
        res.push(MemberSummary {
            group,
            member,
            mean_score,
            pem,
            criteria_means,
            feedback: answer,
            num_ratings: tally.num_ratings,
        });
    }
    res
}
