//! Vote counting and competition-style placing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::records::Vote;

/// Place given to a zero-score entry when zero-score submissions are
/// explicitly included in a tally.
pub const UNRANKED_PLACE: i32 = -1;

/// Final score and place of one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RankedResult {
    #[schema(example = 12)]
    pub submission_id: i32,
    /// Number of votes received.
    #[schema(example = 3)]
    pub score: u32,
    /// 1-based place; equal scores share a place. `-1` marks an unranked entry.
    #[schema(example = 1)]
    pub place: i32,
}

/// Rank every submission that received at least one vote.
pub fn compute_results(votes: &[Vote]) -> Vec<RankedResult> {
    rank(count_votes(votes))
}

/// Like [`compute_results`], but also ranks the given submissions even when
/// nobody voted for them. Those entries score zero and get [`UNRANKED_PLACE`].
pub fn compute_results_including(votes: &[Vote], submission_ids: &[i32]) -> Vec<RankedResult> {
    let mut scores = count_votes(votes);
    for &id in submission_ids {
        if !scores.iter().any(|&(submission_id, _)| submission_id == id) {
            scores.push((id, 0));
        }
    }
    rank(scores)
}

/// Vote count per submission, in order of first appearance.
fn count_votes(votes: &[Vote]) -> Vec<(i32, u32)> {
    let mut index: HashMap<i32, usize> = HashMap::with_capacity(votes.len());
    let mut scores: Vec<(i32, u32)> = Vec::new();
    for vote in votes {
        match index.get(&vote.submission_id) {
            Some(&i) => scores[i].1 += 1,
            None => {
                index.insert(vote.submission_id, scores.len());
                scores.push((vote.submission_id, 1));
            }
        }
    }
    scores
}

fn rank(mut scores: Vec<(i32, u32)>) -> Vec<RankedResult> {
    // `sort_by` is stable, so equal scores keep their tally order.
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let mut place = 0;
    let mut current_best: Option<u32> = None;
    scores
        .into_iter()
        .map(|(submission_id, score)| {
            if current_best.is_none_or(|best| score < best) {
                place += 1;
            }
            current_best = Some(score);
            RankedResult {
                submission_id,
                score,
                place: if score == 0 { UNRANKED_PLACE } else { place },
            }
        })
        .collect()
}
