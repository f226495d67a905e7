//! Time-bounded health monitoring with fail-fast semantics
//!
//! [`HealthCheckMonitor`] polls an [`AlarmStateSource`] at a fixed cadence
//! for up to a configured window. The session fails the instant any signal
//! alarms or the custom probe reports failure; no later poll can flip a
//! failed session back to healthy.

use crate::source::{AlarmStateSource, HealthProbe, NoopProbe};
use rre_model::{AlarmState, HealthCheckResult, RollbackError, DEFAULT_POLL_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Bounded-duration polling loop over an alarm source plus a custom probe
pub struct HealthCheckMonitor {
    /// Alarm state source polled each cadence
    alarms: Arc<dyn AlarmStateSource>,
    /// Custom check run after the alarm states pass
    probe: Arc<dyn HealthProbe>,
    /// Cadence between polls
    poll_interval: Duration,
}

impl HealthCheckMonitor {
    /// Create new monitor with the default probe and poll cadence
    #[inline]
    #[must_use]
    pub fn new(alarms: Arc<dyn AlarmStateSource>) -> Self {
        Self {
            alarms,
            probe: Arc::new(NoopProbe),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// With custom health probe
    #[inline]
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// With poll cadence
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll cadence
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run one monitoring session over `signal_names` for up to `window`
    ///
    /// Polls start at time zero. Each poll fetches a fresh snapshot of
    /// every signal; any `ALARMING` state stops the session immediately
    /// with all alarming signals from that poll. `UNKNOWN` states log a
    /// warning only. When the remaining window is shorter than one
    /// cadence, the monitor sleeps out the remainder and reports success.
    ///
    /// # Errors
    /// Transport errors from the alarm source or probe are not retried
    /// here; they abort the session and propagate to the caller.
    pub async fn monitor(
        &self,
        signal_names: &[String],
        window: Duration,
    ) -> Result<HealthCheckResult, RollbackError> {
        if signal_names.is_empty() {
            tracing::debug!("no health signals configured, skipping monitoring window");
            return Ok(HealthCheckResult::healthy(Duration::ZERO));
        }

        tracing::info!(
            signals = signal_names.len(),
            window_secs = window.as_secs(),
            "starting health monitoring session"
        );

        let start = Instant::now();
        let mut remaining = window;

        loop {
            let snapshots = self.alarms.fetch(signal_names).await?;

            let alarming: Vec<_> = snapshots
                .iter()
                .filter(|s| s.state.is_alarming())
                .cloned()
                .collect();
            if !alarming.is_empty() {
                let reason = format!("{} signal(s) alarming", alarming.len());
                tracing::warn!(
                    failed = ?alarming.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
                    "health monitoring failed"
                );
                return Ok(HealthCheckResult::unhealthy(
                    alarming,
                    start.elapsed(),
                    reason,
                ));
            }

            for snapshot in snapshots
                .iter()
                .filter(|s| s.state == AlarmState::Unknown)
            {
                tracing::warn!(signal = %snapshot.name, "insufficient data for signal");
            }

            let outcome = self.probe.check().await?;
            if !outcome.passed {
                let reason = outcome
                    .reason
                    .unwrap_or_else(|| "custom health check failed".to_string());
                tracing::warn!(%reason, "custom health check failed");
                return Ok(HealthCheckResult::unhealthy(
                    Vec::new(),
                    start.elapsed(),
                    reason,
                ));
            }

            if remaining <= self.poll_interval {
                sleep(remaining).await;
                tracing::info!("health monitoring window completed with all signals healthy");
                return Ok(HealthCheckResult::healthy(window));
            }
            sleep(self.poll_interval).await;
            remaining -= self.poll_interval;
        }
    }
}

impl std::fmt::Debug for HealthCheckMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheckMonitor")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
