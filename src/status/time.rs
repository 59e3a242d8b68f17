//! Deadline projection and countdown helpers.
//!
//! Deadlines are Unix timestamps in seconds, the same unit the status
//! engine branches on. Callers pass the clock value they gave the engine so
//! a countdown and a status never disagree about whether a deadline passed.

use std::fmt;

use chrono::TimeDelta;
use serde::Serialize;

/// Milliseconds from `now` until `deadline`; negative once it has passed.
pub fn remaining(deadline: u64, now: u64) -> i64 {
    let deadline = i64::try_from(deadline).unwrap_or(i64::MAX);
    let now = i64::try_from(now).unwrap_or(i64::MAX);
    deadline.saturating_sub(now).saturating_mul(1000)
}

/// End of the challenge period of a request submitted at `submission_time`.
pub fn challenge_period_end(submission_time: u64, challenge_period_duration: u64) -> u64 {
    submission_time.saturating_add(challenge_period_duration)
}

/// Midpoint of an appeal window. After it, only the ruling's winner may
/// still be funded if the loser has not paid.
pub fn appeal_half_time(appeal_period_start: u64, appeal_period_end: u64) -> u64 {
    appeal_period_start + appeal_period_end.saturating_sub(appeal_period_start) / 2
}

/// End of a withdrawal window started at `withdrawing_timestamp`.
pub fn withdrawal_deadline(withdrawing_timestamp: u64, withdrawing_period: u64) -> u64 {
    withdrawing_timestamp.saturating_add(withdrawing_period)
}

/// Signed time left until a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Countdown(i64);

impl Countdown {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn until(deadline: u64, now: u64) -> Self {
        Self(remaining(deadline, now))
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn has_elapsed(&self) -> bool {
        self.0 < 0
    }

    pub fn as_delta(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(self.0.max(-i64::MAX)).unwrap_or(TimeDelta::MAX)
    }
}

impl fmt::Display for Countdown {
    /// Renders the two most significant units: `in 2h 5m`, `3d 1h ago`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delta = self.as_delta().abs();
        if delta < TimeDelta::seconds(1) {
            return f.write_str("now");
        }

        let units = [
            (delta.num_days(), "d"),
            (delta.num_hours() % 24, "h"),
            (delta.num_minutes() % 60, "m"),
            (delta.num_seconds() % 60, "s"),
        ];
        let parts: Vec<String> = units
            .iter()
            .skip_while(|(value, _)| *value == 0)
            .take(2)
            .filter(|(value, _)| *value > 0)
            .map(|(value, unit)| format!("{value}{unit}"))
            .collect();
        let span = parts.join(" ");

        if self.has_elapsed() {
            write!(f, "{span} ago")
        } else {
            write!(f, "in {span}")
        }
    }
}
