//! Rollback engine configuration
//!
//! Durations consumed by the health subsystem and orchestrator: poll
//! cadence, monitoring window, and the per-environment stabilization wait.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::deployment::Environment;

/// Default poll cadence inside a monitoring session
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default length of the health monitoring window
pub const DEFAULT_HEALTH_CHECK_WINDOW: Duration = Duration::from_secs(300);

/// Default base stabilization wait, scaled per environment criticality
pub const DEFAULT_STABILIZATION_BASE: Duration = Duration::from_secs(30);

/// Rollback engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackConfig {
    /// Cadence between polls inside a monitoring session
    pub poll_interval: Duration,
    /// Length of the health monitoring window after a revert
    pub health_check_window: Duration,
    /// Base stabilization wait, multiplied by environment criticality
    pub stabilization_base: Duration,
}

impl RollbackConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With poll interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// With health-check window
    #[inline]
    #[must_use]
    pub fn with_health_check_window(mut self, window: Duration) -> Self {
        self.health_check_window = window;
        self
    }

    /// With base stabilization wait
    #[inline]
    #[must_use]
    pub fn with_stabilization_base(mut self, base: Duration) -> Self {
        self.stabilization_base = base;
        self
    }

    /// Stabilization wait before judging a reverted deployment
    ///
    /// Proportional to environment criticality: test x1, staging x2,
    /// production x4. Always waited in full, even when alarms are already
    /// healthy before the wait.
    #[inline]
    #[must_use]
    pub fn stabilization_wait(&self, environment: Environment) -> Duration {
        let factor = match environment {
            Environment::Test => 1,
            Environment::Staging => 2,
            Environment::Production => 4,
        };
        self.stabilization_base * factor
    }
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            health_check_window: DEFAULT_HEALTH_CHECK_WINDOW,
            stabilization_base: DEFAULT_STABILIZATION_BASE,
        }
    }
}
