//! Rollback orchestrator
//!
//! Drives the end-to-end rollback state machine: attempt a
//! single-environment ("stage") rollback, fall back to an
//! all-environments ("full") rollback if it fails, record the outcome,
//! and emit events. The caller always receives a [`RollbackAttempt`] with
//! a definite level and success flag; only collaborator contract
//! violations escape as errors.

use crate::collaborators::{
    ApplicationReverter, ArtifactStore, DeploymentStateStore, InfraReverter, MetricsSink,
    NotificationSink, RollbackEvent,
};
use rre_health::RollbackValidator;
use rre_model::{
    Deployment, Environment, RollbackAttempt, RollbackConfig, RollbackError, RollbackId,
    RollbackLevel,
};
use std::sync::Arc;
use tokio::time::Instant;

/// Metric emitted with the invocation duration on success
pub const METRIC_DURATION: &str = "rollback.duration_ms";

/// Metric emitted when a failed stage rollback escalates to full
pub const METRIC_ESCALATED: &str = "rollback.escalated";

/// External collaborators the orchestrator is composed from
#[derive(Clone)]
pub struct Collaborators {
    /// Build artifact registry
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Deployment record store
    pub state_store: Arc<dyn DeploymentStateStore>,
    /// Infrastructure reverter
    pub infra: Arc<dyn InfraReverter>,
    /// Application reverter
    pub application: Arc<dyn ApplicationReverter>,
    /// Event delivery, best-effort
    pub notifications: Arc<dyn NotificationSink>,
    /// Metric publication, best-effort
    pub metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Outcome of one rollback level, kept as data so the orchestrator can
/// compare reasons and escalate instead of unwinding
#[derive(Debug)]
enum LevelOutcome {
    /// The level restored service
    Restored,
    /// The level failed for an expected reason
    Failed(String),
}

/// Outcome of the full-rollback pass
#[derive(Debug)]
enum FullOutcome {
    /// Every environment was restored
    Restored,
    /// No environment has a last known good deployment
    NoLastKnownGood,
    /// An environment failed; later environments were not attempted
    Failed {
        environment: Environment,
        reason: String,
    },
}

/// Graduated rollback state machine
///
/// One invocation runs strictly sequentially: stage rollback is always
/// attempted before full, and a full pass walks environments in
/// descending criticality. The orchestrator holds no cross-invocation
/// state; everything durable lives in the state store.
#[derive(Debug)]
pub struct RollbackOrchestrator {
    /// External collaborators
    collaborators: Collaborators,
    /// Health validation subsystem
    validator: RollbackValidator,
    /// Health signals judged after each revert
    signal_names: Vec<String>,
    /// Timing configuration
    config: RollbackConfig,
}

impl RollbackOrchestrator {
    /// Create new orchestrator
    #[inline]
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        validator: RollbackValidator,
        config: RollbackConfig,
    ) -> Self {
        Self {
            collaborators,
            validator,
            signal_names: Vec::new(),
            config,
        }
    }

    /// With health signal names judged after each revert
    #[inline]
    #[must_use]
    pub fn with_signal_names(mut self, names: Vec<String>) -> Self {
        self.signal_names = names;
        self
    }

    /// Timing configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    /// Execute a rollback of `deployment`
    ///
    /// `reason` is free text used only for audit records and
    /// notifications.
    ///
    /// # Errors
    /// Expected failures (artifacts missing, alarms still firing, no last
    /// known good) are returned inside the [`RollbackAttempt`]; `Err` is
    /// reserved for collaborator behavior outside the defined contracts,
    /// re-raised after a best-effort failure record and notification.
    pub async fn execute_rollback(
        &self,
        deployment: &Deployment,
        reason: &str,
    ) -> Result<RollbackAttempt, RollbackError> {
        let start = Instant::now();
        let rollback_id = RollbackId::new();
        tracing::info!(
            rollback = %rollback_id,
            deployment = %deployment.id,
            environment = %deployment.environment,
            %reason,
            "rollback initiated"
        );

        match self.run(&rollback_id, deployment, reason, start).await {
            Ok(attempt) => Ok(attempt),
            Err(err) => {
                tracing::error!(%err, deployment = %deployment.id, "rollback aborted by unexpected collaborator error");
                let attempt = RollbackAttempt::failed(
                    RollbackLevel::None,
                    format!("unexpected error: {err}"),
                    start.elapsed(),
                );
                // Best effort only; the original error is what propagates.
                if let Err(record_err) = self
                    .collaborators
                    .state_store
                    .record_rollback_failure(deployment, &attempt)
                    .await
                {
                    tracing::warn!(%record_err, "failed to record aborted rollback");
                }
                self.notify(&RollbackEvent::Failed {
                    rollback_id: rollback_id.to_string(),
                    deployment_id: deployment.id.to_string(),
                    environment: deployment.environment,
                    level: RollbackLevel::None,
                    reason: format!("unexpected error: {err}"),
                })
                .await;
                Err(err)
            }
        }
    }

    /// The state machine proper: Start -> AttemptStage -> (terminal |
    /// AttemptFull -> terminal)
    async fn run(
        &self,
        rollback_id: &RollbackId,
        deployment: &Deployment,
        reason: &str,
        start: Instant,
    ) -> Result<RollbackAttempt, RollbackError> {
        self.collaborators
            .state_store
            .record_rollback_start(deployment, reason)
            .await?;
        self.notify(&RollbackEvent::Initiated {
            rollback_id: rollback_id.to_string(),
            deployment_id: deployment.id.to_string(),
            environment: deployment.environment,
            trigger_reason: reason.to_string(),
        })
        .await;

        let stage_reason = match self.attempt_stage(deployment).await? {
            LevelOutcome::Restored => {
                let attempt = RollbackAttempt::succeeded(RollbackLevel::Stage, start.elapsed());
                self.finish_success(rollback_id, deployment, &attempt).await?;
                return Ok(attempt);
            }
            LevelOutcome::Failed(reason) => reason,
        };

        tracing::warn!(
            deployment = %deployment.id,
            %stage_reason,
            "stage rollback failed, escalating to full rollback"
        );
        self.publish(
            METRIC_ESCALATED,
            1.0,
            &[("environment".to_string(), deployment.environment.to_string())],
        )
        .await;

        let attempt = match self.attempt_full(deployment).await? {
            FullOutcome::Restored => {
                let attempt = RollbackAttempt::succeeded(RollbackLevel::Full, start.elapsed());
                self.finish_success(rollback_id, deployment, &attempt).await?;
                return Ok(attempt);
            }
            FullOutcome::NoLastKnownGood => RollbackAttempt::failed(
                RollbackLevel::None,
                format!("stage: {stage_reason}; full: No last known good deployment found"),
                start.elapsed(),
            ),
            FullOutcome::Failed {
                environment,
                reason,
            } => RollbackAttempt::failed(
                RollbackLevel::Full,
                format!("stage: {stage_reason}; full: rollback of {environment} failed: {reason}"),
                start.elapsed(),
            ),
        };

        self.finish_failure(rollback_id, deployment, &attempt).await?;
        Ok(attempt)
    }

    /// Stage rollback: revert the triggering deployment's own environment
    /// to its previous version
    async fn attempt_stage(&self, deployment: &Deployment) -> Result<LevelOutcome, RollbackError> {
        let Some(previous) = deployment.previous_version.as_deref() else {
            return Ok(LevelOutcome::Failed(
                "no previous version recorded for deployment".to_string(),
            ));
        };

        tracing::info!(
            environment = %deployment.environment,
            version = %previous,
            "attempting stage rollback"
        );
        self.revert_one(deployment, deployment.environment, previous)
            .await
    }

    /// Full rollback: restore every environment to the last known good
    /// version, most critical first; the first failure aborts the pass
    async fn attempt_full(&self, deployment: &Deployment) -> Result<FullOutcome, RollbackError> {
        let mut last_known_good = None;
        for environment in Environment::lookup_order() {
            if let Some(good) = self
                .collaborators
                .state_store
                .get_last_known_good(environment)
                .await?
            {
                tracing::info!(
                    %environment,
                    version = %good.version,
                    "found last known good deployment"
                );
                last_known_good = Some(good);
                break;
            }
        }
        let Some(good) = last_known_good else {
            tracing::error!("no last known good deployment in any environment");
            return Ok(FullOutcome::NoLastKnownGood);
        };

        for environment in Environment::rollback_order() {
            tracing::info!(%environment, version = %good.version, "full rollback of environment");
            match self
                .revert_one(deployment, environment, &good.version)
                .await?
            {
                LevelOutcome::Restored => {}
                LevelOutcome::Failed(reason) => {
                    // Later environments are never attempted in this pass.
                    return Ok(FullOutcome::Failed {
                        environment,
                        reason,
                    });
                }
            }
        }

        Ok(FullOutcome::Restored)
    }

    /// The shared revert procedure: locate artifacts, revert infra when
    /// it changed, revert the application, then validate
    async fn revert_one(
        &self,
        deployment: &Deployment,
        environment: Environment,
        target_version: &str,
    ) -> Result<LevelOutcome, RollbackError> {
        match self.collaborators.artifacts.locate(target_version).await? {
            Some(artifact) => {
                tracing::debug!(version = %target_version, uri = %artifact.uri, "located rollback artifacts");
            }
            None => {
                // Not retried; escalation is the recovery path.
                return Ok(LevelOutcome::Failed(format!(
                    "artifacts not found for version {target_version}"
                )));
            }
        }

        let mut target = deployment.clone();
        target.environment = environment;

        if deployment.infrastructure_changed {
            if let Err(err) = self.collaborators.infra.revert(&target).await {
                return Ok(LevelOutcome::Failed(format!(
                    "infrastructure revert failed: {err}"
                )));
            }
        }

        if let Err(err) = self
            .collaborators
            .application
            .revert(&target, target_version)
            .await
        {
            return Ok(LevelOutcome::Failed(format!(
                "application revert failed: {err}"
            )));
        }

        match self
            .validator
            .validate(environment, &self.signal_names, Some(target_version))
            .await
        {
            Ok(validation) if validation.success => Ok(LevelOutcome::Restored),
            Ok(validation) => Ok(LevelOutcome::Failed(
                validation
                    .reason
                    .unwrap_or_else(|| "validation failed".to_string()),
            )),
            // Transport faults fail this level and drive escalation.
            Err(err) if err.is_level_failure() => Ok(LevelOutcome::Failed(err.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Terminal success: one state-store write, one notification, metrics
    // Rollback durations are minutes at most, far below f64's 2^53 ms
    // integer range, so the metric cast is exact.
    #[allow(clippy::cast_precision_loss)]
    async fn finish_success(
        &self,
        rollback_id: &RollbackId,
        deployment: &Deployment,
        attempt: &RollbackAttempt,
    ) -> Result<(), RollbackError> {
        self.collaborators
            .state_store
            .record_rollback_success(deployment, attempt)
            .await?;
        self.notify(&RollbackEvent::Succeeded {
            rollback_id: rollback_id.to_string(),
            deployment_id: deployment.id.to_string(),
            environment: deployment.environment,
            level: attempt.level,
            duration_ms: attempt.duration_ms.unwrap_or(0),
        })
        .await;
        self.publish(
            METRIC_DURATION,
            attempt.duration_ms.unwrap_or(0) as f64,
            &[
                ("level".to_string(), attempt.level.to_string()),
                (
                    "environment".to_string(),
                    deployment.environment.to_string(),
                ),
            ],
        )
        .await;
        tracing::info!(
            deployment = %deployment.id,
            level = %attempt.level,
            "rollback succeeded"
        );
        Ok(())
    }

    /// Terminal failure: one state-store write, one notification
    async fn finish_failure(
        &self,
        rollback_id: &RollbackId,
        deployment: &Deployment,
        attempt: &RollbackAttempt,
    ) -> Result<(), RollbackError> {
        self.collaborators
            .state_store
            .record_rollback_failure(deployment, attempt)
            .await?;
        self.notify(&RollbackEvent::Failed {
            rollback_id: rollback_id.to_string(),
            deployment_id: deployment.id.to_string(),
            environment: deployment.environment,
            level: attempt.level,
            reason: attempt.reason.clone().unwrap_or_default(),
        })
        .await;
        tracing::error!(
            deployment = %deployment.id,
            level = %attempt.level,
            reason = attempt.reason.as_deref().unwrap_or(""),
            "rollback failed"
        );
        Ok(())
    }

    /// Best-effort notification; delivery failures are logged only
    async fn notify(&self, event: &RollbackEvent) {
        if let Err(err) = self.collaborators.notifications.send(event).await {
            tracing::warn!(%err, event = event.event_type(), "notification delivery failed");
        }
    }

    /// Best-effort metric publication; delivery failures are logged only
    async fn publish(&self, name: &str, value: f64, dimensions: &[(String, String)]) {
        if let Err(err) = self
            .collaborators
            .metrics
            .publish(name, value, dimensions)
            .await
        {
            tracing::warn!(%err, metric = name, "metric publication failed");
        }
    }
}
