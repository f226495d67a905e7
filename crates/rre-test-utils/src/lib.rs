//! Testing utilities for the rollback engine workspace
//!
//! Scripted and recording collaborator doubles shared by unit and
//! integration tests. Scripted doubles answer from a queue and then fall
//! back to a benign default; recording doubles capture every interaction
//! so tests assert on emitted events instead of captured logs.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rre_core::{
    ApplicationReverter, ArtifactRef, ArtifactStore, DeploymentStateStore, InfraReverter,
    MetricsSink, NotificationSink, RollbackEvent,
};
use rre_health::VersionVerifier;
use rre_model::{Deployment, Environment, RollbackAttempt, RollbackError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

// The alarm-source doubles live with the health subsystem so this crate
// can depend on it without a cyclic dev-dependency.
pub use rre_health::testing::{FailingAlarmSource, ScriptedAlarmSource};

/// Artifact store backed by a fixed set of known versions
#[derive(Debug, Default)]
pub struct StaticArtifactStore {
    versions: Vec<String>,
}

impl StaticArtifactStore {
    /// Store that knows the given versions
    #[must_use]
    pub fn with_versions(versions: &[&str]) -> Self {
        Self {
            versions: versions.iter().map(ToString::to_string).collect(),
        }
    }

    /// Store that knows no versions at all
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for StaticArtifactStore {
    async fn locate(&self, version: &str) -> Result<Option<ArtifactRef>, RollbackError> {
        Ok(self
            .versions
            .iter()
            .find(|v| *v == version)
            .map(|v| ArtifactRef::new(v.clone(), format!("store://artifacts/{v}"))))
    }
}

/// One record call captured by [`InMemoryStateStore`]
#[derive(Debug, Clone)]
pub enum StateRecord {
    Start { reason: String },
    Success { attempt: RollbackAttempt },
    Failure { attempt: RollbackAttempt },
}

/// Deployment state store with an in-memory last-known-good map and a log
/// of every record call
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    last_known_good: Mutex<HashMap<Environment, Deployment>>,
    records: Mutex<Vec<StateRecord>>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a last known good deployment for `environment`
    #[must_use]
    pub fn with_last_known_good(self, environment: Environment, deployment: Deployment) -> Self {
        self.last_known_good.lock().insert(environment, deployment);
        self
    }

    /// All record calls in order
    #[must_use]
    pub fn records(&self) -> Vec<StateRecord> {
        self.records.lock().clone()
    }

    /// Number of terminal (success or failure) records
    #[must_use]
    pub fn terminal_record_count(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| !matches!(r, StateRecord::Start { .. }))
            .count()
    }
}

#[async_trait]
impl DeploymentStateStore for InMemoryStateStore {
    async fn get_last_known_good(
        &self,
        environment: Environment,
    ) -> Result<Option<Deployment>, RollbackError> {
        Ok(self.last_known_good.lock().get(&environment).cloned())
    }

    async fn record_rollback_start(
        &self,
        _deployment: &Deployment,
        reason: &str,
    ) -> Result<(), RollbackError> {
        self.records.lock().push(StateRecord::Start {
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn record_rollback_success(
        &self,
        _deployment: &Deployment,
        attempt: &RollbackAttempt,
    ) -> Result<(), RollbackError> {
        self.records.lock().push(StateRecord::Success {
            attempt: attempt.clone(),
        });
        Ok(())
    }

    async fn record_rollback_failure(
        &self,
        _deployment: &Deployment,
        attempt: &RollbackAttempt,
    ) -> Result<(), RollbackError> {
        self.records.lock().push(StateRecord::Failure {
            attempt: attempt.clone(),
        });
        Ok(())
    }
}

/// Infrastructure reverter that records how often it was invoked
#[derive(Debug, Default)]
pub struct RecordingInfraReverter {
    reverts: AtomicUsize,
}

impl RecordingInfraReverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of infrastructure reverts performed
    #[must_use]
    pub fn revert_count(&self) -> usize {
        self.reverts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InfraReverter for RecordingInfraReverter {
    async fn revert(&self, _deployment: &Deployment) -> Result<(), RollbackError> {
        self.reverts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Application reverter that records every `(environment, version)` pair
/// and can be scripted to fail for one environment
#[derive(Debug, Default)]
pub struct RecordingApplicationReverter {
    reverts: Mutex<Vec<(Environment, String)>>,
    fail_on: Mutex<Option<(Environment, String)>>,
}

impl RecordingApplicationReverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail reverts targeting `environment` with `message`
    #[must_use]
    pub fn with_failure(self, environment: Environment, message: &str) -> Self {
        *self.fail_on.lock() = Some((environment, message.to_string()));
        self
    }

    /// Reverts performed so far, in order
    #[must_use]
    pub fn reverts(&self) -> Vec<(Environment, String)> {
        self.reverts.lock().clone()
    }
}

#[async_trait]
impl ApplicationReverter for RecordingApplicationReverter {
    async fn revert(
        &self,
        deployment: &Deployment,
        target_version: &str,
    ) -> Result<(), RollbackError> {
        if let Some((environment, message)) = self.fail_on.lock().as_ref() {
            if *environment == deployment.environment {
                return Err(RollbackError::RevertFailed(message.clone()));
            }
        }
        self.reverts
            .lock()
            .push((deployment.environment, target_version.to_string()));
        Ok(())
    }
}

/// Notification sink that records every event; optionally fails delivery
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    events: Mutex<Vec<RollbackEvent>>,
    fail_delivery: bool,
}

impl RecordingNotificationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every delivery fails (events still recorded)
    #[must_use]
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_delivery: true,
        }
    }

    /// Events sent so far, in order
    #[must_use]
    pub fn events(&self) -> Vec<RollbackEvent> {
        self.events.lock().clone()
    }

    /// Events of one wire type
    #[must_use]
    pub fn events_of(&self, event_type: &str) -> Vec<RollbackEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn send(&self, event: &RollbackEvent) -> Result<(), RollbackError> {
        self.events.lock().push(event.clone());
        if self.fail_delivery {
            return Err(RollbackError::NotificationDelivery(
                "webhook returned 500".to_string(),
            ));
        }
        Ok(())
    }
}

/// One metric point captured by [`RecordingMetricsSink`]
#[derive(Debug, Clone)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    pub dimensions: Vec<(String, String)>,
}

/// Metrics sink that records every published point
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    points: Mutex<Vec<MetricPoint>>,
}

impl RecordingMetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points published so far, in order
    #[must_use]
    pub fn points(&self) -> Vec<MetricPoint> {
        self.points.lock().clone()
    }

    /// Points published under `name`
    #[must_use]
    pub fn points_named(&self, name: &str) -> Vec<MetricPoint> {
        self.points
            .lock()
            .iter()
            .filter(|p| p.name == name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MetricsSink for RecordingMetricsSink {
    async fn publish(
        &self,
        name: &str,
        value: f64,
        dimensions: &[(String, String)],
    ) -> Result<(), RollbackError> {
        self.points.lock().push(MetricPoint {
            name: name.to_string(),
            value,
            dimensions: dimensions.to_vec(),
        });
        Ok(())
    }
}

/// Version verifier that always reports one fixed live version
#[derive(Debug)]
pub struct FixedVersionVerifier {
    version: String,
}

impl FixedVersionVerifier {
    #[must_use]
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }
}

#[async_trait]
impl VersionVerifier for FixedVersionVerifier {
    async fn deployed_version(&self, _environment: Environment) -> Result<String, RollbackError> {
        Ok(self.version.clone())
    }
}
