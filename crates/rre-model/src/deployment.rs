//! Deployment descriptors and the environment ladder
//!
//! A [`Deployment`] identifies what must be reverted. It is created by the
//! trigger that detects an unhealthy deployment and is read-only to the
//! rollback core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ulid::Ulid;

/// Unique deployment identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeploymentId(pub Ulid);

impl DeploymentId {
    /// Generate new deployment ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one rollback invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RollbackId(pub Ulid);

impl RollbackId {
    /// Generate new rollback ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RollbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RollbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deployment target with distinct criticality
///
/// Totally ordered: `Test < Staging < Production`. Full rollback walks the
/// ladder in descending order so the most customer-visible environment is
/// restored first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Pre-staging test environment
    Test,
    /// Staging environment
    Staging,
    /// Customer-facing production environment
    Production,
}

impl Environment {
    /// All environments in descending criticality, the order a full
    /// rollback processes them
    #[inline]
    #[must_use]
    pub const fn rollback_order() -> [Self; 3] {
        [Self::Production, Self::Staging, Self::Test]
    }

    /// Priority order for the last-known-good lookup (production first)
    #[inline]
    #[must_use]
    pub const fn lookup_order() -> [Self; 3] {
        Self::rollback_order()
    }

    /// Criticality rank (higher is more critical)
    #[inline]
    #[must_use]
    pub const fn criticality(self) -> u8 {
        match self {
            Self::Test => 0,
            Self::Staging => 1,
            Self::Production => 2,
        }
    }

    /// Environment name as used in records and event payloads
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Self::Test),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Descriptor of a deployment that may need to be reverted
///
/// Supplied by the trigger; never mutated by the rollback core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment identifier
    pub id: DeploymentId,
    /// Target environment
    pub environment: Environment,
    /// Version that was deployed
    pub version: String,
    /// Version deployed before this one, if known
    pub previous_version: Option<String>,
    /// Whether infrastructure templates changed in this deployment
    pub infrastructure_changed: bool,
    /// Pipeline execution that produced this deployment
    pub pipeline_execution_id: String,
    /// When the deployment started
    pub started_at: DateTime<Utc>,
}

impl Deployment {
    /// Create new deployment descriptor
    #[inline]
    #[must_use]
    pub fn new(
        environment: Environment,
        version: impl Into<String>,
        pipeline_execution_id: impl Into<String>,
    ) -> Self {
        Self {
            id: DeploymentId::new(),
            environment,
            version: version.into(),
            previous_version: None,
            infrastructure_changed: false,
            pipeline_execution_id: pipeline_execution_id.into(),
            started_at: Utc::now(),
        }
    }

    /// With previous version
    #[inline]
    #[must_use]
    pub fn with_previous_version(mut self, version: impl Into<String>) -> Self {
        self.previous_version = Some(version.into());
        self
    }

    /// With infrastructure-changed flag
    #[inline]
    #[must_use]
    pub fn with_infrastructure_changed(mut self, changed: bool) -> Self {
        self.infrastructure_changed = changed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_total_order() {
        assert!(Environment::Test < Environment::Staging);
        assert!(Environment::Staging < Environment::Production);
    }

    #[test]
    fn rollback_order_is_descending_criticality() {
        let order = Environment::rollback_order();
        assert_eq!(
            order,
            [
                Environment::Production,
                Environment::Staging,
                Environment::Test
            ]
        );
        assert!(order.windows(2).all(|w| w[0].criticality() > w[1].criticality()));
    }

    #[test]
    fn environment_round_trips_through_str() {
        for env in Environment::rollback_order() {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
        }
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn deployment_builder() {
        let deployment = Deployment::new(Environment::Staging, "v2", "exec-1")
            .with_previous_version("v1")
            .with_infrastructure_changed(true);

        assert_eq!(deployment.environment, Environment::Staging);
        assert_eq!(deployment.previous_version.as_deref(), Some("v1"));
        assert!(deployment.infrastructure_changed);
    }

    #[test]
    fn deployment_ids_are_unique() {
        assert_ne!(DeploymentId::new(), DeploymentId::new());
    }
}
