//! Collaborator capability contracts
//!
//! The orchestrator is a pure orchestration layer over these interfaces.
//! Production implementations wrap the artifact registry, deployment
//! record store, deploy APIs, and alerting/metrics backends; tests supply
//! doubles. All are composed in, never inherited.

use async_trait::async_trait;
use rre_model::{Deployment, Environment, RollbackAttempt, RollbackError};
use serde::{Deserialize, Serialize};

/// Reference to located build artifacts for one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Version the artifacts belong to
    pub version: String,
    /// Location of the artifacts
    pub uri: String,
}

impl ArtifactRef {
    /// Create new artifact reference
    #[inline]
    #[must_use]
    pub fn new(version: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            uri: uri.into(),
        }
    }
}

/// Locates build artifacts by version
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Locate artifacts for `version`; `None` when the store has no
    /// artifacts for it
    async fn locate(&self, version: &str) -> Result<Option<ArtifactRef>, RollbackError>;
}

/// Durable record of deployments and rollback outcomes
///
/// The single source of truth for "last known good" per environment; the
/// orchestrator itself holds no persistent state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentStateStore: Send + Sync {
    /// Most recent deployment recorded as successful in `environment`
    async fn get_last_known_good(
        &self,
        environment: Environment,
    ) -> Result<Option<Deployment>, RollbackError>;

    /// Record that a rollback was initiated
    async fn record_rollback_start(
        &self,
        deployment: &Deployment,
        reason: &str,
    ) -> Result<(), RollbackError>;

    /// Record a terminal successful rollback
    async fn record_rollback_success(
        &self,
        deployment: &Deployment,
        attempt: &RollbackAttempt,
    ) -> Result<(), RollbackError>;

    /// Record a terminal failed rollback
    async fn record_rollback_failure(
        &self,
        deployment: &Deployment,
        attempt: &RollbackAttempt,
    ) -> Result<(), RollbackError>;
}

/// Reverts infrastructure templates to their previous state
///
/// Invoked only when the deployment being reverted changed infrastructure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InfraReverter: Send + Sync {
    /// Revert the infrastructure of `deployment`'s environment
    async fn revert(&self, deployment: &Deployment) -> Result<(), RollbackError>;
}

/// Redeploys application code at a target version
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationReverter: Send + Sync {
    /// Revert the application in `deployment`'s environment to
    /// `target_version`
    async fn revert(
        &self,
        deployment: &Deployment,
        target_version: &str,
    ) -> Result<(), RollbackError>;
}

/// Delivers rollback lifecycle events
///
/// Best-effort at every call site: a delivery failure is logged and
/// swallowed, never aborting the state machine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one event
    async fn send(&self, event: &RollbackEvent) -> Result<(), RollbackError>;
}

/// Publishes rollback metrics; same best-effort contract as notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Publish one metric point
    async fn publish(
        &self,
        name: &str,
        value: f64,
        dimensions: &[(String, String)],
    ) -> Result<(), RollbackError>;
}

/// Rollback lifecycle event handed to the notification sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RollbackEvent {
    /// A rollback was initiated
    Initiated {
        /// Identifier of the rollback invocation
        rollback_id: String,
        /// Deployment being reverted
        deployment_id: String,
        /// Environment of the triggering deployment
        environment: Environment,
        /// Trigger reason, free text for audit
        trigger_reason: String,
    },
    /// A rollback level restored service
    Succeeded {
        /// Identifier of the rollback invocation
        rollback_id: String,
        /// Deployment that was reverted
        deployment_id: String,
        /// Environment of the triggering deployment
        environment: Environment,
        /// Level that restored service
        level: rre_model::RollbackLevel,
        /// Wall-clock duration of the invocation
        duration_ms: u64,
    },
    /// Every attempted level failed
    Failed {
        /// Identifier of the rollback invocation
        rollback_id: String,
        /// Deployment that could not be reverted
        deployment_id: String,
        /// Environment of the triggering deployment
        environment: Environment,
        /// Last level executed
        level: rre_model::RollbackLevel,
        /// Concatenated failure reasons
        reason: String,
    },
}

impl RollbackEvent {
    /// Wire tag of this event
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Initiated { .. } => "initiated",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// Identifier correlating the events of one rollback invocation
    #[inline]
    #[must_use]
    pub fn rollback_id(&self) -> &str {
        match self {
            Self::Initiated { rollback_id, .. }
            | Self::Succeeded { rollback_id, .. }
            | Self::Failed { rollback_id, .. } => rollback_id,
        }
    }

    /// JSON payload handed to delivery transports
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rre_model::RollbackLevel;

    #[test]
    fn event_type_matches_serde_tag() {
        let event = RollbackEvent::Succeeded {
            rollback_id: "r1".to_string(),
            deployment_id: "d1".to_string(),
            environment: Environment::Staging,
            level: RollbackLevel::Stage,
            duration_ms: 1200,
        };
        assert_eq!(event.event_type(), "succeeded");
        assert_eq!(event.rollback_id(), "r1");
        assert_eq!(event.payload()["event"], "succeeded");
        assert_eq!(event.payload()["level"], "stage");
        assert_eq!(event.payload()["rollback_id"], "r1");
    }

    #[test]
    fn artifact_ref_builder() {
        let artifact = ArtifactRef::new("v1", "s3://artifacts/v1");
        assert_eq!(artifact.version, "v1");
        assert_eq!(artifact.uri, "s3://artifacts/v1");
    }
}
