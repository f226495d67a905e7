//! Post-rollback validation
//!
//! [`RollbackValidator`] composes the stabilization wait, a one-shot alarm
//! snapshot check, a full monitoring window, and an optional
//! version-equality check into a single pass/fail verdict. Each step is a
//! hard gate; the first failure short-circuits the rest.

use crate::monitor::HealthCheckMonitor;
use crate::source::{AlarmStateSource, VersionVerifier};
use rre_model::{AlarmState, Environment, RollbackConfig, RollbackError, ValidationResult};
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// Composes the validation gates for one reverted environment
pub struct RollbackValidator {
    /// Alarm source for the one-shot snapshot pre-filter
    alarms: Arc<dyn AlarmStateSource>,
    /// Monitor for the bounded polling window
    monitor: HealthCheckMonitor,
    /// Optional live-version verifier
    verifier: Option<Arc<dyn VersionVerifier>>,
    /// Timing configuration
    config: RollbackConfig,
}

impl RollbackValidator {
    /// Create new validator sharing one alarm source between the snapshot
    /// check and the monitoring window
    #[inline]
    #[must_use]
    pub fn new(alarms: Arc<dyn AlarmStateSource>, config: RollbackConfig) -> Self {
        let monitor = HealthCheckMonitor::new(alarms.clone())
            .with_poll_interval(config.poll_interval);
        Self {
            alarms,
            monitor,
            verifier: None,
            config,
        }
    }

    /// With a pre-built monitor (custom probe or cadence)
    #[inline]
    #[must_use]
    pub fn with_monitor(mut self, monitor: HealthCheckMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// With a live-version verifier enabling the version-equality gate
    #[inline]
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn VersionVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Timing configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    /// Validate a reverted deployment in `environment`
    ///
    /// # Gates, in order
    /// 1. Stabilization wait, always taken in full.
    /// 2. One-shot alarm snapshot: fail on any `ALARMING` signal before
    ///    paying for the monitoring window; `UNKNOWN` logs a warning.
    /// 3. Health monitoring window via [`HealthCheckMonitor`].
    /// 4. If `target_version` is supplied and a verifier is configured,
    ///    assert the live version equals it.
    ///
    /// Elapsed time across every gate accumulates into the result.
    ///
    /// # Errors
    /// Transport errors from the alarm source or verifier abort the
    /// validation; the caller decides whether to retry the whole pass.
    pub async fn validate(
        &self,
        environment: Environment,
        signal_names: &[String],
        target_version: Option<&str>,
    ) -> Result<ValidationResult, RollbackError> {
        let start = Instant::now();

        let wait = self.config.stabilization_wait(environment);
        tracing::info!(
            %environment,
            wait_secs = wait.as_secs(),
            "waiting for reverted deployment to stabilize"
        );
        sleep(wait).await;

        if let Some(result) = self.snapshot_check(signal_names, start).await? {
            return Ok(result);
        }

        let health = self
            .monitor
            .monitor(signal_names, self.config.health_check_window)
            .await?;
        if !health.success {
            let reason = health
                .reason
                .unwrap_or_else(|| "health monitoring failed".to_string());
            return Ok(ValidationResult::failed(reason, start.elapsed()));
        }

        if let (Some(target), Some(verifier)) = (target_version, self.verifier.as_ref()) {
            let live = verifier.deployed_version(environment).await?;
            if live != target {
                tracing::warn!(%environment, %live, %target, "deployed version does not match rollback target");
                return Ok(ValidationResult::failed("version mismatch", start.elapsed()));
            }
        }

        tracing::info!(%environment, "rollback validation passed");
        Ok(ValidationResult::passed(start.elapsed()))
    }

    /// Cheap pre-filter before the monitoring window: a single snapshot
    /// fetch, failing on any signal already alarming
    async fn snapshot_check(
        &self,
        signal_names: &[String],
        start: Instant,
    ) -> Result<Option<ValidationResult>, RollbackError> {
        if signal_names.is_empty() {
            return Ok(None);
        }

        let snapshots = self.alarms.fetch(signal_names).await?;
        let alarming: Vec<_> = snapshots
            .iter()
            .filter(|s| s.state.is_alarming())
            .map(|s| s.name.clone())
            .collect();
        if !alarming.is_empty() {
            tracing::warn!(signals = ?alarming, "alarms still firing after stabilization wait");
            return Ok(Some(ValidationResult::failed(
                format!("{} signal(s) alarming after stabilization", alarming.len()),
                start.elapsed(),
            )));
        }

        for snapshot in snapshots
            .iter()
            .filter(|s| s.state == AlarmState::Unknown)
        {
            tracing::warn!(signal = %snapshot.name, "insufficient data for signal");
        }

        Ok(None)
    }
}

impl std::fmt::Debug for RollbackValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackValidator")
            .field("config", &self.config)
            .field("has_verifier", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}
