//! Call-retry backoff policy.
//!
//! Delay hours are monotonically non-decreasing: fast initial
//! re-engagement, then spacing out to avoid contact fatigue.

use chrono::{DateTime, Duration, Utc};

/// Hours to wait before the next attempt, indexed by completed attempt
/// count. An attempt count at or beyond the table length is exhausted.
const ATTEMPT_DELAY_HOURS: [i64; 7] = [0, 1, 3, 6, 12, 20, 28];

/// Call outcomes that permanently end the retry sequence.
const HARD_STOP_OUTCOMES: [&str; 2] = ["Interested", "Not Interested"];

/// When (if ever) the next call attempt may go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAttempt {
    At(DateTime<Utc>),
    Exhausted,
}

/// Pure mapping from attempt count and outcome to retry decisions.
pub struct RetryPolicy;

impl RetryPolicy {
    /// Next eligible time for a contact with `attempt_count` completed
    /// attempts, relative to `now`.
    pub fn next_eligible_time(attempt_count: u32, now: DateTime<Utc>) -> NextAttempt {
        match ATTEMPT_DELAY_HOURS.get(attempt_count as usize) {
            Some(hours) => NextAttempt::At(now + Duration::hours(*hours)),
            None => NextAttempt::Exhausted,
        }
    }

    /// True only for outcomes in the fixed terminal set. Anything else —
    /// including empty or unrecognized outcomes — stays eligible for retry.
    pub fn is_hard_stop(outcome: &str) -> bool {
        HARD_STOP_OUTCOMES.contains(&outcome)
    }

    pub fn max_attempts() -> u32 {
        ATTEMPT_DELAY_HOURS.len() as u32
    }
}
