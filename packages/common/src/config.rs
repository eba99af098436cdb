use serde::Deserialize;

/// Defaults applied to new sessions when the creator leaves a field out.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    /// Per-user nomination limit. Default: 5.
    #[serde(default = "default_max_submissions")]
    pub max_submissions: i32,
    /// Submission phase length in seconds. Default: 5 days.
    #[serde(default = "default_phase_secs")]
    pub submission_phase_secs: i64,
    /// Vote phase length in seconds. Default: 5 days.
    #[serde(default = "default_phase_secs")]
    pub vote_phase_secs: i64,
}

fn default_max_submissions() -> i32 {
    5
}
fn default_phase_secs() -> i64 {
    5 * 24 * 60 * 60
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            submission_phase_secs: default_phase_secs(),
            vote_phase_secs: default_phase_secs(),
        }
    }
}
