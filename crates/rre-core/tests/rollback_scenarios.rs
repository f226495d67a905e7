//! End-to-end scenarios for the rollback orchestrator
//!
//! Drive the full state machine against scripted collaborators and assert
//! on recorded events, metric points, and revert order.

use pretty_assertions::assert_eq;
use rre_core::{
    Collaborators, RollbackEvent, RollbackOrchestrator, METRIC_DURATION, METRIC_ESCALATED,
};
use rre_health::RollbackValidator;
use rre_model::{Deployment, Environment, RollbackConfig, RollbackError, RollbackLevel};
use rre_test_utils::{
    InMemoryStateStore, RecordingApplicationReverter, RecordingInfraReverter,
    RecordingMetricsSink, RecordingNotificationSink, ScriptedAlarmSource, StateRecord,
    StaticArtifactStore,
};
use std::sync::Arc;
use std::time::Duration;

fn test_config() -> RollbackConfig {
    RollbackConfig::new()
        .with_stabilization_base(Duration::from_secs(1))
        .with_poll_interval(Duration::from_secs(30))
        .with_health_check_window(Duration::from_secs(60))
}

struct Harness {
    orchestrator: RollbackOrchestrator,
    state_store: Arc<InMemoryStateStore>,
    infra: Arc<RecordingInfraReverter>,
    application: Arc<RecordingApplicationReverter>,
    notifications: Arc<RecordingNotificationSink>,
    metrics: Arc<RecordingMetricsSink>,
}

fn harness(
    artifacts: StaticArtifactStore,
    state_store: InMemoryStateStore,
    application: RecordingApplicationReverter,
) -> Harness {
    let state_store = Arc::new(state_store);
    let infra = Arc::new(RecordingInfraReverter::new());
    let application = Arc::new(application);
    let notifications = Arc::new(RecordingNotificationSink::new());
    let metrics = Arc::new(RecordingMetricsSink::new());

    let alarms = Arc::new(ScriptedAlarmSource::all_ok());
    let validator = RollbackValidator::new(alarms, test_config());

    let collaborators = Collaborators {
        artifacts: Arc::new(artifacts),
        state_store: state_store.clone(),
        infra: infra.clone(),
        application: application.clone(),
        notifications: notifications.clone(),
        metrics: metrics.clone(),
    };
    let orchestrator = RollbackOrchestrator::new(collaborators, validator, test_config())
        .with_signal_names(vec!["api-5xx".to_string()]);

    Harness {
        orchestrator,
        state_store,
        infra,
        application,
        notifications,
        metrics,
    }
}

#[tokio::test(start_paused = true)]
async fn clean_stage_rollback() {
    let h = harness(
        StaticArtifactStore::with_versions(&["v1", "v2"]),
        InMemoryStateStore::new(),
        RecordingApplicationReverter::new(),
    );
    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");

    let attempt = h
        .orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap();

    assert_eq!(attempt.level, RollbackLevel::Stage);
    assert!(attempt.success);
    assert!(attempt.reason.is_none());

    // One success notification, one duration metric with level=stage.
    assert_eq!(h.notifications.events_of("succeeded").len(), 1);
    assert_eq!(h.notifications.events_of("failed").len(), 0);
    let duration_points = h.metrics.points_named(METRIC_DURATION);
    assert_eq!(duration_points.len(), 1);
    assert_eq!(
        duration_points[0].value,
        attempt.duration_ms.unwrap() as f64
    );
    assert!(duration_points[0]
        .dimensions
        .contains(&("level".to_string(), "stage".to_string())));
    assert!(h.metrics.points_named(METRIC_ESCALATED).is_empty());

    // All events of one invocation share the same rollback identifier.
    let events = h.notifications.events();
    assert_eq!(events.len(), 2);
    assert!(!events[0].rollback_id().is_empty());
    assert_eq!(events[0].rollback_id(), events[1].rollback_id());

    // Infra unchanged, so no infra revert; one app revert to v1.
    assert_eq!(h.infra.revert_count(), 0);
    assert_eq!(
        h.application.reverts(),
        vec![(Environment::Staging, "v1".to_string())]
    );

    // Exactly one terminal state-store write.
    assert_eq!(h.state_store.terminal_record_count(), 1);
    assert!(matches!(
        h.state_store.records().last(),
        Some(StateRecord::Success { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn infra_revert_runs_only_when_infrastructure_changed() {
    let h = harness(
        StaticArtifactStore::with_versions(&["v1"]),
        InMemoryStateStore::new(),
        RecordingApplicationReverter::new(),
    );
    let deployment = Deployment::new(Environment::Test, "v2", "exec-18")
        .with_previous_version("v1")
        .with_infrastructure_changed(true);

    let attempt = h
        .orchestrator
        .execute_rollback(&deployment, "build failure")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(h.infra.revert_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_artifacts_force_escalation_to_full() {
    let last_known_good =
        Deployment::new(Environment::Production, "v0", "exec-9").with_previous_version("v0");
    let h = harness(
        StaticArtifactStore::with_versions(&["v0"]),
        InMemoryStateStore::new().with_last_known_good(Environment::Production, last_known_good),
        RecordingApplicationReverter::new(),
    );
    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");

    let attempt = h
        .orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap();

    assert_eq!(attempt.level, RollbackLevel::Full);
    assert!(attempt.success);

    // Every environment restored to the last known good version, in
    // descending criticality order.
    assert_eq!(
        h.application.reverts(),
        vec![
            (Environment::Production, "v0".to_string()),
            (Environment::Staging, "v0".to_string()),
            (Environment::Test, "v0".to_string()),
        ]
    );

    assert_eq!(h.metrics.points_named(METRIC_ESCALATED).len(), 1);
    let duration_points = h.metrics.points_named(METRIC_DURATION);
    assert_eq!(duration_points.len(), 1);
    assert!(duration_points[0]
        .dimensions
        .contains(&("level".to_string(), "full".to_string())));
}

#[tokio::test(start_paused = true)]
async fn total_failure_reports_level_none_with_both_reasons() {
    let h = harness(
        StaticArtifactStore::empty(),
        InMemoryStateStore::new(),
        RecordingApplicationReverter::new(),
    );
    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");

    let attempt = h
        .orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap();

    assert_eq!(attempt.level, RollbackLevel::None);
    assert!(!attempt.success);
    let reason = attempt.reason.unwrap();
    assert!(reason.contains("No last known good deployment found"));
    assert!(reason.contains("artifacts not found for version v1"));

    assert_eq!(h.notifications.events_of("failed").len(), 1);
    assert!(matches!(
        h.state_store.records().last(),
        Some(StateRecord::Failure { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn full_rollback_aborts_at_first_failing_environment() {
    let last_known_good =
        Deployment::new(Environment::Production, "v0", "exec-9").with_previous_version("v0");
    let h = harness(
        StaticArtifactStore::with_versions(&["v0"]),
        InMemoryStateStore::new().with_last_known_good(Environment::Production, last_known_good),
        RecordingApplicationReverter::new()
            .with_failure(Environment::Staging, "deploy API rejected revert"),
    );
    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");

    let attempt = h
        .orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap();

    assert_eq!(attempt.level, RollbackLevel::Full);
    assert!(!attempt.success);
    let reason = attempt.reason.unwrap();
    // Both the stage reason and the full-rollback reason are reported.
    assert!(reason.contains("artifacts not found for version v1"));
    assert!(reason.contains("rollback of staging failed"));

    // Production was restored before the failure; test was never touched.
    assert_eq!(
        h.application.reverts(),
        vec![(Environment::Production, "v0".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn notification_count_is_deterministic() {
    async fn run_once() -> usize {
        let h = harness(
            StaticArtifactStore::with_versions(&["v1"]),
            InMemoryStateStore::new(),
            RecordingApplicationReverter::new(),
        );
        let deployment =
            Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");
        h.orchestrator
            .execute_rollback(&deployment, "alarm transition")
            .await
            .unwrap();
        h.notifications.events().len()
    }

    let first = run_once().await;
    let second = run_once().await;
    assert_eq!(first, second);
    // Initiated + succeeded.
    assert_eq!(first, 2);
}

#[tokio::test(start_paused = true)]
async fn notification_delivery_failure_never_aborts_the_rollback() {
    let state_store = Arc::new(InMemoryStateStore::new());
    let notifications = Arc::new(RecordingNotificationSink::failing());
    let alarms = Arc::new(ScriptedAlarmSource::all_ok());

    let collaborators = Collaborators {
        artifacts: Arc::new(StaticArtifactStore::with_versions(&["v1"])),
        state_store: state_store.clone(),
        infra: Arc::new(RecordingInfraReverter::new()),
        application: Arc::new(RecordingApplicationReverter::new()),
        notifications: notifications.clone(),
        metrics: Arc::new(RecordingMetricsSink::new()),
    };
    let orchestrator = RollbackOrchestrator::new(
        collaborators,
        RollbackValidator::new(alarms, test_config()),
        test_config(),
    )
    .with_signal_names(vec!["api-5xx".to_string()]);

    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");
    let attempt = orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(attempt.level, RollbackLevel::Stage);
    // Delivery failed but both events were still attempted, in order.
    assert_eq!(notifications.events().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn version_mismatch_surfaces_in_combined_reason() {
    use rre_test_utils::FixedVersionVerifier;

    let alarms = Arc::new(ScriptedAlarmSource::all_ok());
    let validator = RollbackValidator::new(alarms, test_config())
        .with_verifier(Arc::new(FixedVersionVerifier::new("v9")));

    let state_store = Arc::new(InMemoryStateStore::new());
    let collaborators = Collaborators {
        artifacts: Arc::new(StaticArtifactStore::with_versions(&["v1"])),
        state_store: state_store.clone(),
        infra: Arc::new(RecordingInfraReverter::new()),
        application: Arc::new(RecordingApplicationReverter::new()),
        notifications: Arc::new(RecordingNotificationSink::new()),
        metrics: Arc::new(RecordingMetricsSink::new()),
    };
    let orchestrator = RollbackOrchestrator::new(collaborators, validator, test_config())
        .with_signal_names(vec!["api-5xx".to_string()]);

    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");
    let attempt = orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap();

    assert!(!attempt.success);
    let reason = attempt.reason.unwrap();
    assert!(reason.contains("version mismatch"));
    assert!(reason.contains("No last known good deployment found"));
}

#[tokio::test(start_paused = true)]
async fn unexpected_state_store_error_is_reraised_after_failure_notification() {
    use async_trait::async_trait;
    use rre_core::DeploymentStateStore;
    use rre_model::RollbackAttempt;

    /// State store whose start record always fails, violating the
    /// contract the orchestrator expects
    #[derive(Debug)]
    struct BrokenStateStore;

    #[async_trait]
    impl DeploymentStateStore for BrokenStateStore {
        async fn get_last_known_good(
            &self,
            _environment: Environment,
        ) -> Result<Option<Deployment>, RollbackError> {
            Ok(None)
        }

        async fn record_rollback_start(
            &self,
            _deployment: &Deployment,
            _reason: &str,
        ) -> Result<(), RollbackError> {
            Err(RollbackError::StateStore("table offline".to_string()))
        }

        async fn record_rollback_success(
            &self,
            _deployment: &Deployment,
            _attempt: &RollbackAttempt,
        ) -> Result<(), RollbackError> {
            Err(RollbackError::StateStore("table offline".to_string()))
        }

        async fn record_rollback_failure(
            &self,
            _deployment: &Deployment,
            _attempt: &RollbackAttempt,
        ) -> Result<(), RollbackError> {
            Err(RollbackError::StateStore("table offline".to_string()))
        }
    }

    let notifications = Arc::new(RecordingNotificationSink::new());
    let alarms = Arc::new(ScriptedAlarmSource::all_ok());
    let collaborators = Collaborators {
        artifacts: Arc::new(StaticArtifactStore::with_versions(&["v1"])),
        state_store: Arc::new(BrokenStateStore),
        infra: Arc::new(RecordingInfraReverter::new()),
        application: Arc::new(RecordingApplicationReverter::new()),
        notifications: notifications.clone(),
        metrics: Arc::new(RecordingMetricsSink::new()),
    };
    let orchestrator = RollbackOrchestrator::new(
        collaborators,
        RollbackValidator::new(alarms, test_config()),
        test_config(),
    );

    let deployment =
        Deployment::new(Environment::Staging, "v2", "exec-17").with_previous_version("v1");
    let err = orchestrator
        .execute_rollback(&deployment, "alarm transition")
        .await
        .unwrap_err();

    assert!(matches!(err, RollbackError::StateStore(_)));
    // A best-effort failure notification went out before the error was
    // re-raised.
    let failed = notifications.events_of("failed");
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        &failed[0],
        RollbackEvent::Failed { level: RollbackLevel::None, .. }
    ));
}
