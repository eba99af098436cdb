//! Per-user submission and vote limits.

use thiserror::Error;

use crate::records::{Session, Submission, Vote};

/// Upper bound on votes per user, regardless of `max_submissions`.
pub const MAX_VOTES_CAP: i32 = 10;

/// A business-rule rejection. Checked before any write happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuotaViolation {
    #[error("no submissions left in this session")]
    NoSubmissionsLeft,
    #[error("track has already been submitted by this user")]
    DuplicateSubmission,
    #[error("no votes left in this session")]
    NoVotesLeft,
}

/// `min(10, floor(max_submissions / 2))`; negative limits count as zero.
pub fn max_votes(max_submissions: i32) -> i32 {
    (max_submissions.max(0) / 2).min(MAX_VOTES_CAP)
}

pub fn can_submit(session: &Session, existing_user_submissions: &[Submission]) -> bool {
    (existing_user_submissions.len() as i64) < i64::from(session.max_submissions)
}

pub fn can_vote(session: &Session, existing_user_votes: &[Vote]) -> bool {
    (existing_user_votes.len() as i64) < i64::from(session.max_votes())
}

pub fn is_duplicate_submission(existing_user_submissions: &[Submission], track_id: &str) -> bool {
    existing_user_submissions
        .iter()
        .any(|s| s.track_id == track_id)
}

/// Guard for a new nomination: the count limit first, then the duplicate rule.
pub fn check_submission(
    session: &Session,
    existing_user_submissions: &[Submission],
    track_id: &str,
) -> Result<(), QuotaViolation> {
    if !can_submit(session, existing_user_submissions) {
        return Err(QuotaViolation::NoSubmissionsLeft);
    }
    if is_duplicate_submission(existing_user_submissions, track_id) {
        return Err(QuotaViolation::DuplicateSubmission);
    }
    Ok(())
}

pub fn check_vote(session: &Session, existing_user_votes: &[Vote]) -> Result<(), QuotaViolation> {
    if can_vote(session, existing_user_votes) {
        Ok(())
    } else {
        Err(QuotaViolation::NoVotesLeft)
    }
}

/// Nominations the user may still make.
pub fn submissions_left(session: &Session, used: usize) -> i32 {
    remaining(session.max_submissions, used)
}

/// Votes the user may still cast.
pub fn votes_left(session: &Session, used: usize) -> i32 {
    remaining(session.max_votes(), used)
}

fn remaining(limit: i32, used: usize) -> i32 {
    let used = i32::try_from(used).unwrap_or(i32::MAX);
    limit.saturating_sub(used).max(0)
}
