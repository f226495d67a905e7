//! RRE Model - Shared data model for the rollback engine
//!
//! Defines the types exchanged between the orchestrator, the health
//! subsystem, and their collaborators:
//! - Deployment descriptors and the environment ladder
//! - Rollback attempt outcomes
//! - Alarm snapshots and health/validation verdicts
//! - Engine configuration and the error taxonomy

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod attempt;
pub mod config;
pub mod deployment;
pub mod error;
pub mod health;

// Re-exports for convenience
pub use attempt::{duration_ms, RollbackAttempt, RollbackLevel};
pub use config::{
    RollbackConfig, DEFAULT_HEALTH_CHECK_WINDOW, DEFAULT_POLL_INTERVAL, DEFAULT_STABILIZATION_BASE,
};
pub use deployment::{Deployment, DeploymentId, Environment, RollbackId};
pub use error::RollbackError;
pub use health::{AlarmSnapshot, AlarmState, HealthCheckResult, ValidationResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn attempt_serializes_with_lowercase_level() {
        let attempt = RollbackAttempt::succeeded(RollbackLevel::Full, Duration::from_secs(1));
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["level"], "full");
        assert_eq!(json["success"], true);
    }

    #[test]
    fn snapshot_serializes_with_screaming_state() {
        let snapshot = AlarmSnapshot::new("api-5xx", AlarmState::Alarming);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "ALARMING");
    }

    #[test]
    fn environment_serializes_lowercase() {
        let json = serde_json::to_value(Environment::Production).unwrap();
        assert_eq!(json, "production");
    }
}
