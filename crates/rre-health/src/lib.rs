//! RRE Health - Health-check monitor and rollback validator
//!
//! The health-validation subsystem of the rollback engine:
//! - Polls alarm states at a fixed cadence with fail-fast semantics
//! - Runs an extensible custom health probe each poll
//! - Composes stabilization, snapshot, monitoring, and version gates into
//!   a single validation verdict
//!
//! # Example
//!
//! ```rust,ignore
//! use rre_health::{HealthCheckMonitor, RollbackValidator};
//! use rre_model::{Environment, RollbackConfig};
//! use std::sync::Arc;
//!
//! # async fn example(alarms: Arc<dyn rre_health::AlarmStateSource>) {
//! let validator = RollbackValidator::new(alarms, RollbackConfig::new());
//! let verdict = validator
//!     .validate(Environment::Staging, &["api-5xx".to_string()], Some("v1"))
//!     .await;
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod monitor;
pub mod source;
pub mod testing;
pub mod validator;

// Re-exports for convenience
pub use monitor::HealthCheckMonitor;
pub use source::{AlarmStateSource, HealthProbe, NoopProbe, ProbeOutcome, VersionVerifier};
pub use validator::RollbackValidator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
