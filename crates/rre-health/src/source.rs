//! Health signal sources and extension points
//!
//! Trait seams consumed by the monitor and validator. Production
//! implementations wrap the alarm service and deployment APIs; tests use
//! scripted doubles or mocks.

use async_trait::async_trait;
use rre_model::{AlarmSnapshot, Environment, RollbackError};

/// Source of current alarm states for a named set of health signals
///
/// # Contract
/// - `fetch` returns one snapshot per known signal name, fresh on every
///   call; the monitor never caches snapshots across polls.
/// - Network/service failures surface as [`RollbackError::Transport`] and
///   are not retried inside the health subsystem.
/// - Callers short-circuit an empty `names` slice; implementations never
///   see it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlarmStateSource: Send + Sync {
    /// Fetch the current state of the named signals
    async fn fetch(&self, names: &[String]) -> Result<Vec<AlarmSnapshot>, RollbackError>;
}

/// Outcome of one custom health probe run
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Whether the probe passed
    pub passed: bool,
    /// Failure reason, present when `passed` is false
    pub reason: Option<String>,
}

impl ProbeOutcome {
    /// Passing outcome
    #[inline]
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    /// Failing outcome with reason
    #[inline]
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Custom health check run once per poll, after the alarm states pass
///
/// Extension point for checks the alarm source cannot express (smoke
/// requests, queue depth probes). The default [`NoopProbe`] always passes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Run the probe once
    async fn check(&self) -> Result<ProbeOutcome, RollbackError>;
}

/// Probe that always passes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

#[async_trait]
impl HealthProbe for NoopProbe {
    async fn check(&self) -> Result<ProbeOutcome, RollbackError> {
        Ok(ProbeOutcome::pass())
    }
}

/// Reports the version currently live in an environment
///
/// Used by the validator's optional version-equality gate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionVerifier: Send + Sync {
    /// Version currently deployed in `environment`
    async fn deployed_version(&self, environment: Environment) -> Result<String, RollbackError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_outcome_constructors() {
        assert!(ProbeOutcome::pass().passed);
        let failed = ProbeOutcome::fail("queue backed up");
        assert!(!failed.passed);
        assert_eq!(failed.reason.as_deref(), Some("queue backed up"));
    }

    #[tokio::test]
    async fn noop_probe_always_passes() {
        let outcome = NoopProbe.check().await.unwrap();
        assert!(outcome.passed);
    }
}
