//! Property tests for the health-check monitor's fail-fast polling loop

use proptest::prelude::*;
use rre_health::testing::ScriptedAlarmSource;
use rre_health::HealthCheckMonitor;
use rre_model::AlarmState;
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_secs(30);

fn alarm_state() -> impl Strategy<Value = AlarmState> {
    prop_oneof![
        3 => Just(AlarmState::Ok),
        1 => Just(AlarmState::Alarming),
        1 => Just(AlarmState::Unknown),
    ]
}

fn run_monitor(states: &[AlarmState]) -> (bool, usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime");

    let source = Arc::new(ScriptedAlarmSource::states("signal", states));
    let monitor = HealthCheckMonitor::new(source.clone()).with_poll_interval(POLL);
    let window = POLL * u32::try_from(states.len()).expect("window");

    let result = runtime
        .block_on(monitor.monitor(&["signal".to_string()], window))
        .expect("monitoring session");
    (result.success, source.fetch_count())
}

proptest! {
    /// Once any poll observes an alarming signal the session fails, the
    /// number of polls performed never exceeds the failing index + 1, and
    /// no sequence of later improving states changes the verdict.
    #[test]
    fn failure_is_monotonic(states in prop::collection::vec(alarm_state(), 1..12)) {
        let (success, polls) = run_monitor(&states);

        match states.iter().position(|s| s.is_alarming()) {
            Some(first_alarming) => {
                prop_assert!(!success);
                prop_assert!(polls <= first_alarming + 1);
            }
            None => {
                // UNKNOWN states never fail a session by themselves.
                prop_assert!(success);
                prop_assert_eq!(polls, states.len());
            }
        }
    }

    /// Appending improving states after a failure never flips the verdict.
    #[test]
    fn improving_tail_cannot_recover_a_failed_session(
        prefix in prop::collection::vec(alarm_state(), 0..5),
        tail_len in 1usize..6,
    ) {
        let mut states = prefix;
        states.push(AlarmState::Alarming);
        let failing_index = states.len() - 1;
        states.extend(std::iter::repeat(AlarmState::Ok).take(tail_len));

        let (success, polls) = run_monitor(&states);

        prop_assert!(!success);
        prop_assert!(polls <= failing_index + 1);
    }
}
