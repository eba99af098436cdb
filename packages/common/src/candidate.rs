use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Track;
use crate::records::{Submission, Vote};

/// A submission paired with the viewing user's own vote on it.
///
/// `vote == None` means the viewer can still vote for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Candidate {
    pub submission: Submission,
    /// Catalog metadata, when it was looked up.
    pub track: Option<Track>,
    pub vote: Option<Vote>,
}

impl Candidate {
    pub fn is_voted(&self) -> bool {
        self.vote.is_some()
    }
}

/// Attach `viewer_id`'s votes to `submissions`.
///
/// Builds one index over `votes` keyed by `(user_id, submission_id)`, so the
/// cost is linear in submissions plus votes. Votes by other users are ignored.
pub fn build_candidates(
    viewer_id: i32,
    submissions: Vec<Submission>,
    votes: &[Vote],
) -> Vec<Candidate> {
    let index: HashMap<(i32, i32), &Vote> = votes
        .iter()
        .map(|v| ((v.user_id, v.submission_id), v))
        .collect();

    submissions
        .into_iter()
        .map(|submission| {
            let vote = index.get(&(viewer_id, submission.id)).map(|v| (*v).clone());
            Candidate {
                submission,
                track: None,
                vote,
            }
        })
        .collect()
}

/// Single-submission form of [`build_candidates`].
pub fn find_candidate(viewer_id: i32, submission: Submission, votes: &[Vote]) -> Candidate {
    let vote = votes
        .iter()
        .find(|v| v.user_id == viewer_id && v.submission_id == submission.id)
        .cloned();
    Candidate {
        submission,
        track: None,
        vote,
    }
}
