//! RRE Core - Rollback orchestrator
//!
//! The decision engine that recovers from unhealthy deployments:
//! - Attempts the cheapest fix first (stage rollback)
//! - Escalates to a full, all-environments rollback on failure
//! - Validates every revert through the health subsystem
//! - Records outcomes and emits events, best-effort
//!
//! # Example
//!
//! ```rust,ignore
//! use rre_core::{Collaborators, RollbackOrchestrator};
//! use rre_health::RollbackValidator;
//! use rre_model::{Deployment, Environment, RollbackConfig};
//!
//! # async fn example(collaborators: Collaborators, validator: RollbackValidator) {
//! let orchestrator = RollbackOrchestrator::new(collaborators, validator, RollbackConfig::new())
//!     .with_signal_names(vec!["api-5xx".to_string()]);
//!
//! let deployment = Deployment::new(Environment::Staging, "v2", "exec-17")
//!     .with_previous_version("v1");
//! let attempt = orchestrator
//!     .execute_rollback(&deployment, "alarm transition")
//!     .await;
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod collaborators;
pub mod orchestrator;

// Re-exports for convenience
pub use collaborators::{
    ApplicationReverter, ArtifactRef, ArtifactStore, DeploymentStateStore, InfraReverter,
    MetricsSink, NotificationSink, RollbackEvent,
};
pub use orchestrator::{
    Collaborators, RollbackOrchestrator, METRIC_DURATION, METRIC_ESCALATED,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the rollback engine
    pub use crate::{Collaborators, RollbackEvent, RollbackOrchestrator};
    pub use rre_health::{HealthCheckMonitor, RollbackValidator};
    pub use rre_model::{
        Deployment, Environment, RollbackAttempt, RollbackConfig, RollbackLevel,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
