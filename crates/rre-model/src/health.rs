//! Health signal snapshots and validation verdicts
//!
//! Snapshots are ephemeral: fetched fresh on every poll and never cached
//! across polls, so a monitor session's verdict is decided by the earliest
//! failing poll.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::attempt::duration_ms;

/// Current state of one named health signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    /// Signal is healthy
    Ok,
    /// Signal is firing
    Alarming,
    /// Insufficient data; never a failure by itself
    Unknown,
}

impl AlarmState {
    /// Whether this state fails a health check
    #[inline]
    #[must_use]
    pub const fn is_alarming(self) -> bool {
        matches!(self, Self::Alarming)
    }
}

/// Point-in-time observation of one health signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSnapshot {
    /// Signal name
    pub name: String,
    /// Observed state
    pub state: AlarmState,
    /// State reason reported by the source, if any
    pub reason: Option<String>,
}

impl AlarmSnapshot {
    /// Create new snapshot
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, state: AlarmState) -> Self {
        Self {
            name: name.into(),
            state,
            reason: None,
        }
    }

    /// With state reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Terminal value of one monitoring session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Whether the whole window passed
    pub success: bool,
    /// Signals observed alarming on the failing poll
    pub failed_signals: Vec<AlarmSnapshot>,
    /// Time spent in the session
    pub elapsed_ms: u64,
    /// Failure reason, present when `success` is false
    pub reason: Option<String>,
}

impl HealthCheckResult {
    /// Session completed with every poll healthy
    #[inline]
    #[must_use]
    pub fn healthy(elapsed: Duration) -> Self {
        Self {
            success: true,
            failed_signals: Vec::new(),
            elapsed_ms: duration_ms(elapsed),
            reason: None,
        }
    }

    /// Session stopped early on a failing poll
    #[inline]
    #[must_use]
    pub fn unhealthy(
        failed_signals: Vec<AlarmSnapshot>,
        elapsed: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            failed_signals,
            elapsed_ms: duration_ms(elapsed),
            reason: Some(reason.into()),
        }
    }
}

/// Terminal value of one validation pass
///
/// Aggregates the stabilization wait, alarm snapshot check, health
/// monitoring window, and optional version check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether every gate passed
    pub success: bool,
    /// Reason of the first failing gate
    pub reason: Option<String>,
    /// Total elapsed time across all gates
    pub elapsed_ms: Option<u64>,
}

impl ValidationResult {
    /// All gates passed
    #[inline]
    #[must_use]
    pub fn passed(elapsed: Duration) -> Self {
        Self {
            success: true,
            reason: None,
            elapsed_ms: Some(duration_ms(elapsed)),
        }
    }

    /// A gate failed
    #[inline]
    #[must_use]
    pub fn failed(reason: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            elapsed_ms: Some(duration_ms(elapsed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_state_alarming() {
        assert!(AlarmState::Alarming.is_alarming());
        assert!(!AlarmState::Ok.is_alarming());
        assert!(!AlarmState::Unknown.is_alarming());
    }

    #[test]
    fn snapshot_builder() {
        let snapshot =
            AlarmSnapshot::new("api-5xx", AlarmState::Alarming).with_reason("threshold crossed");
        assert_eq!(snapshot.name, "api-5xx");
        assert_eq!(snapshot.reason.as_deref(), Some("threshold crossed"));
    }

    #[test]
    fn healthy_result_has_no_failed_signals() {
        let result = HealthCheckResult::healthy(Duration::from_secs(300));
        assert!(result.success);
        assert!(result.failed_signals.is_empty());
        assert_eq!(result.elapsed_ms, 300_000);
    }

    #[test]
    fn unhealthy_result_carries_signals() {
        let result = HealthCheckResult::unhealthy(
            vec![AlarmSnapshot::new("api-5xx", AlarmState::Alarming)],
            Duration::from_secs(90),
            "1 signal(s) alarming",
        );
        assert!(!result.success);
        assert_eq!(result.failed_signals.len(), 1);
        assert_eq!(result.reason.as_deref(), Some("1 signal(s) alarming"));
    }

    #[test]
    fn validation_result_constructors() {
        assert!(ValidationResult::passed(Duration::ZERO).success);
        let failed = ValidationResult::failed("version mismatch", Duration::from_millis(5));
        assert!(!failed.success);
        assert_eq!(failed.elapsed_ms, Some(5));
    }
}
