//! Rollback attempt outcomes
//!
//! A [`RollbackAttempt`] is the terminal value of one orchestrator
//! invocation: which level ran last, whether it restored service, and why
//! it failed if it did not. Immutable once returned.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How far the orchestrator had to escalate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackLevel {
    /// Single-environment rollback
    Stage,
    /// All-environments rollback in descending criticality order
    Full,
    /// No rollback could be executed (no last known good deployment)
    None,
}

impl std::fmt::Display for RollbackLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stage => "stage",
            Self::Full => "full",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

/// Outcome of one `execute_rollback` invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackAttempt {
    /// Last rollback level executed
    pub level: RollbackLevel,
    /// Whether that level restored service
    pub success: bool,
    /// Failure reason, present when `success` is false
    pub reason: Option<String>,
    /// Wall-clock duration of the whole invocation
    pub duration_ms: Option<u64>,
}

impl RollbackAttempt {
    /// Successful attempt at the given level
    #[inline]
    #[must_use]
    pub fn succeeded(level: RollbackLevel, duration: Duration) -> Self {
        Self {
            level,
            success: true,
            reason: None,
            duration_ms: Some(duration_ms(duration)),
        }
    }

    /// Failed attempt at the given level
    #[inline]
    #[must_use]
    pub fn failed(level: RollbackLevel, reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            level,
            success: false,
            reason: Some(reason.into()),
            duration_ms: Some(duration_ms(duration)),
        }
    }
}

/// Convert a duration to whole milliseconds, saturating on overflow
#[inline]
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
