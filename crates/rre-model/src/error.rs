//! Error taxonomy for the rollback engine
//!
//! Expected per-level failures (artifacts missing, alarms still firing)
//! travel as `reason` strings on result values so the orchestrator can
//! compare and escalate. `RollbackError` is reserved for failures of a
//! collaborator call itself: transport faults, state-store faults, and
//! best-effort delivery faults that are logged and swallowed.

/// Main rollback engine error type
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    /// Artifacts for the requested version are not in the store
    #[error("artifacts not found for version {version}")]
    ArtifactNotFound {
        /// Version whose artifacts were requested
        version: String,
    },

    /// Network/service failure talking to a collaborator
    #[error("transport error: {0}")]
    Transport(String),

    /// A validation gate failed
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// No environment has a recorded last known good deployment
    #[error("No last known good deployment found")]
    NoLastKnownGood,

    /// Deployment state store read or write failed
    #[error("state store error: {0}")]
    StateStore(String),

    /// Best-effort notification delivery failed (logged, never surfaced)
    #[error("notification delivery failed: {0}")]
    NotificationDelivery(String),

    /// Best-effort metric publication failed (logged, never surfaced)
    #[error("metrics delivery failed: {0}")]
    MetricsDelivery(String),

    /// Revert operation on a collaborator failed
    #[error("revert failed: {0}")]
    RevertFailed(String),
}

impl RollbackError {
    /// Whether this error is captured as a level failure reason and drives
    /// escalation rather than aborting the orchestrator
    #[inline]
    #[must_use]
    pub fn is_level_failure(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound { .. }
                | Self::ValidationFailed(_)
                | Self::RevertFailed(_)
                | Self::Transport(_)
        )
    }

    /// Whether this error is always recovered locally and only logged
    #[inline]
    #[must_use]
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::NotificationDelivery(_) | Self::MetricsDelivery(_))
    }
}
