//! Test support: scripted alarm sources
//!
//! Doubles for [`AlarmStateSource`](crate::AlarmStateSource) used by this
//! crate's own tests and re-exported through the workspace test-utils
//! crate. They live here so the shared doubles crate can layer on top of
//! this one without a cyclic dev-dependency.

use crate::source::AlarmStateSource;
use async_trait::async_trait;
use parking_lot::Mutex;
use rre_model::{AlarmSnapshot, AlarmState, RollbackError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Alarm source that answers each poll from a scripted queue
///
/// When the script is exhausted it reports every requested signal as OK,
/// so a finite script can sit inside an arbitrarily long monitoring
/// window. The fetch count lets tests assert fail-fast behavior.
#[derive(Debug, Default)]
pub struct ScriptedAlarmSource {
    script: Mutex<Vec<Vec<AlarmSnapshot>>>,
    fetches: AtomicUsize,
}

impl ScriptedAlarmSource {
    /// Source with no script: every poll reports all signals OK
    #[must_use]
    pub fn all_ok() -> Self {
        Self::default()
    }

    /// Source scripted with one single-signal response per state
    #[must_use]
    pub fn states(name: &str, states: &[AlarmState]) -> Self {
        let source = Self::default();
        for state in states {
            source
                .script
                .lock()
                .push(vec![AlarmSnapshot::new(name, *state)]);
        }
        source
    }

    /// Append one scripted response
    #[must_use]
    pub fn with_response(self, snapshots: Vec<AlarmSnapshot>) -> Self {
        self.script.lock().push(snapshots);
        self
    }

    /// Number of fetches performed so far
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlarmStateSource for ScriptedAlarmSource {
    async fn fetch(&self, names: &[String]) -> Result<Vec<AlarmSnapshot>, RollbackError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        if script.is_empty() {
            return Ok(names
                .iter()
                .map(|name| AlarmSnapshot::new(name, AlarmState::Ok))
                .collect());
        }
        Ok(script.remove(0))
    }
}

/// Alarm source that fails every fetch with a transport error
#[derive(Debug, Default)]
pub struct FailingAlarmSource;

#[async_trait]
impl AlarmStateSource for FailingAlarmSource {
    async fn fetch(&self, _names: &[String]) -> Result<Vec<AlarmSnapshot>, RollbackError> {
        Err(RollbackError::Transport(
            "alarm service unavailable".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_source_plays_script_then_falls_back_to_ok() {
        let source = ScriptedAlarmSource::states("api-5xx", &[AlarmState::Alarming]);
        let names = vec!["api-5xx".to_string()];

        let first = source.fetch(&names).await.unwrap();
        assert_eq!(first[0].state, AlarmState::Alarming);

        let second = source.fetch(&names).await.unwrap();
        assert_eq!(second[0].state, AlarmState::Ok);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failing_source_always_reports_transport_error() {
        let err = FailingAlarmSource
            .fetch(&["api-5xx".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RollbackError::Transport(_)));
    }
}
