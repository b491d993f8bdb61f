//! Readiness poll: a bounded loop over per-tick status outcomes.

use std::sync::Arc;

use tracing::{error, info, warn};

use rsinit_common::{dump, AdminError, AdminResult, MemberState, StatusSnapshot};
use rsinit_driver::AdminDriver;

use crate::clock::Clock;
use crate::policy::RetryPolicy;

/// What a single status query produced.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// The member answered with its current status.
    Reported(StatusSnapshot),
    /// The query reached the server but failed.
    Failed(AdminError),
    /// The server could not be reached.
    Unreachable(AdminError),
}

impl TickOutcome {
    /// Classify the result of a status query.
    pub fn from_query(result: AdminResult<StatusSnapshot>) -> Self {
        match result {
            Ok(snapshot) => TickOutcome::Reported(snapshot),
            Err(err) if err.is_transient() => TickOutcome::Unreachable(err),
            Err(err) => TickOutcome::Failed(err),
        }
    }

    /// Transition for this outcome.
    pub fn decision(&self) -> PollDecision {
        match self {
            TickOutcome::Reported(snapshot) if snapshot.is_stable() => {
                PollDecision::Ready(snapshot.my_state)
            }
            TickOutcome::Reported(snapshot) => PollDecision::Wait(snapshot.my_state),
            TickOutcome::Failed(_) | TickOutcome::Unreachable(_) => PollDecision::Retry,
        }
    }
}

/// Transition chosen after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Stable role reached; stop with success.
    Ready(MemberState),
    /// Member answered with a non-stable role; poll again.
    Wait(MemberState),
    /// Query failed; poll again.
    Retry,
}

/// Result of a successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// Stable role the member settled in.
    pub state: MemberState,
    /// Ticks used, including the successful one.
    pub attempts: u32,
    /// Ticks whose query failed.
    pub failed_queries: u32,
}

/// Polls member status until it is stable or the budget runs out.
pub struct ReadinessPoller {
    driver: Arc<dyn AdminDriver>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl ReadinessPoller {
    /// Create a new poller.
    pub fn new(driver: Arc<dyn AdminDriver>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            driver,
            clock,
            policy,
        }
    }

    /// Run the poll loop.
    ///
    /// Each tick sleeps one interval, then queries status. Returns
    /// [`AdminError::NotReady`] carrying the last successfully read snapshot
    /// once `max_attempts` ticks pass without a stable role.
    pub async fn wait_until_stable(&self) -> AdminResult<Readiness> {
        let mut last_status: Option<StatusSnapshot> = None;
        let mut failed_queries = 0;

        for attempt in 1..=self.policy.max_attempts {
            self.clock.sleep(self.policy.interval).await;

            let outcome = TickOutcome::from_query(self.driver.status().await);
            match outcome.decision() {
                PollDecision::Ready(state) => {
                    info!(attempt, state = %state, "Member reached a stable role");
                    return Ok(Readiness {
                        state,
                        attempts: attempt,
                        failed_queries,
                    });
                }
                PollDecision::Wait(state) => {
                    info!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        state = %state,
                        "Member not stable yet, waiting"
                    );
                }
                PollDecision::Retry => failed_queries += 1,
            }

            match outcome {
                TickOutcome::Reported(snapshot) => last_status = Some(snapshot),
                TickOutcome::Failed(err) => {
                    warn!(attempt, error = %err, code = err.error_code(), "Status query failed");
                }
                TickOutcome::Unreachable(err) => {
                    warn!(attempt, error = %err, "Deployment unreachable");
                }
            }
        }

        error!(
            attempts = self.policy.max_attempts,
            failed_queries,
            last_status = %dump(&last_status),
            "Member did not reach PRIMARY or SECONDARY"
        );

        Err(AdminError::NotReady {
            attempts: self.policy.max_attempts,
            last_status: last_status.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use rsinit_driver::ScriptedDriver;
    use std::time::Duration;

    fn poller(driver: Arc<ScriptedDriver>, clock: Arc<ManualClock>) -> ReadinessPoller {
        ReadinessPoller::new(driver, clock, RetryPolicy::default())
    }

    #[test]
    fn test_outcome_classification() {
        let outcome = TickOutcome::from_query(Err(AdminError::Connection("refused".into())));
        assert!(matches!(outcome, TickOutcome::Unreachable(_)));

        let outcome = TickOutcome::from_query(Err(AdminError::command(
            94,
            "NotYetInitialized",
            "no replset config has been received",
        )));
        assert!(matches!(outcome, TickOutcome::Failed(_)));
        assert_eq!(outcome.decision(), PollDecision::Retry);
    }

    #[test]
    fn test_decisions() {
        let reported = |code| TickOutcome::Reported(StatusSnapshot::new(MemberState::from_code(code)));

        assert_eq!(reported(1).decision(), PollDecision::Ready(MemberState::Primary));
        assert_eq!(reported(2).decision(), PollDecision::Ready(MemberState::Secondary));
        assert_eq!(reported(0).decision(), PollDecision::Wait(MemberState::Startup));
        assert_eq!(reported(5).decision(), PollDecision::Wait(MemberState::Startup2));
    }

    #[tokio::test]
    async fn test_startup_then_primary() {
        let driver = Arc::new(ScriptedDriver::new().with_states(&[0, 0, 1]));
        let clock = Arc::new(ManualClock::new());

        let readiness = poller(driver.clone(), clock.clone())
            .wait_until_stable()
            .await
            .unwrap();

        assert_eq!(readiness.state, MemberState::Primary);
        assert_eq!(readiness.attempts, 3);
        assert_eq!(readiness.failed_queries, 0);
        assert_eq!(driver.status_queries(), 3);
        assert!(clock.total_slept() >= Duration::from_secs(2) * 3);
    }

    #[tokio::test]
    async fn test_secondary_is_success() {
        let driver = Arc::new(ScriptedDriver::new().with_states(&[2]));
        let clock = Arc::new(ManualClock::new());

        let readiness = poller(driver, clock).wait_until_stable().await.unwrap();
        assert_eq!(readiness.state, MemberState::Secondary);
        assert_eq!(readiness.attempts, 1);
    }

    #[tokio::test]
    async fn test_thirty_startups_is_failure() {
        let driver = Arc::new(ScriptedDriver::new().with_states(&[0; 30]).with_states(&[1]));
        let clock = Arc::new(ManualClock::new());

        let err = poller(driver.clone(), clock.clone())
            .wait_until_stable()
            .await
            .unwrap_err();

        match err {
            AdminError::NotReady {
                attempts,
                last_status,
            } => {
                assert_eq!(attempts, 30);
                assert_eq!(last_status.unwrap().my_state, MemberState::Startup);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(driver.status_queries(), 30);
        assert_eq!(clock.sleeps().len(), 30);
    }

    #[tokio::test]
    async fn test_all_queries_failing_has_no_last_status() {
        let driver = Arc::new(ScriptedDriver::new());
        let clock = Arc::new(ManualClock::new());

        let err = poller(driver, clock).wait_until_stable().await.unwrap_err();
        assert!(matches!(
            err,
            AdminError::NotReady {
                attempts: 30,
                last_status: None
            }
        ));
    }

    #[tokio::test]
    async fn test_last_status_survives_later_failures() {
        let driver = Arc::new(
            ScriptedDriver::new()
                .with_states(&[5])
                .with_failures(29, AdminError::Timeout("server selection".into())),
        );
        let clock = Arc::new(ManualClock::new());

        let err = poller(driver, clock).wait_until_stable().await.unwrap_err();
        match err {
            AdminError::NotReady { last_status, .. } => {
                assert_eq!(last_status.unwrap().my_state, MemberState::Startup2);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    fn failure() -> impl Strategy<Value = AdminError> {
        prop_oneof![
            Just(AdminError::Connection("connection refused".into())),
            Just(AdminError::Timeout("server selection timeout".into())),
            Just(AdminError::command(94, "NotYetInitialized", "no config")),
        ]
    }

    fn unstable_tick() -> impl Strategy<Value = AdminResult<StatusSnapshot>> {
        prop_oneof![
            failure().prop_map(Err),
            prop_oneof![Just(0), Just(3), Just(5), Just(6), Just(8), Just(9)]
                .prop_map(|code| Ok(StatusSnapshot::new(MemberState::from_code(code)))),
        ]
    }

    #[tokio::test]
    async fn test_stable_role_on_last_tick() {
        let driver = Arc::new(
            ScriptedDriver::new()
                .with_failures(29, AdminError::Connection("refused".into()))
                .with_states(&[1]),
        );
        let clock = Arc::new(ManualClock::new());

        let readiness = poller(driver.clone(), clock).wait_until_stable().await.unwrap();
        assert_eq!(readiness.state, MemberState::Primary);
        assert_eq!(readiness.attempts, 30);
        assert_eq!(readiness.failed_queries, 29);
        assert_eq!(driver.status_queries(), 30);
    }

    proptest! {
        #[test]
        fn prop_stable_role_after_failures_succeeds(
            failures in prop::collection::vec(failure(), 0..30),
            role in prop_oneof![Just(1), Just(2)],
        ) {
            let driver = Arc::new(ScriptedDriver::new());
            for err in &failures {
                driver.push_status(Err(err.clone()));
            }
            driver.push_status(Ok(StatusSnapshot::new(MemberState::from_code(role))));

            let clock = Arc::new(ManualClock::new());
            let result = tokio_test::block_on(poller(driver.clone(), clock).wait_until_stable());

            let readiness = result.unwrap();
            prop_assert_eq!(readiness.state.code(), role);
            prop_assert_eq!(readiness.attempts as usize, failures.len() + 1);
            prop_assert_eq!(readiness.failed_queries as usize, failures.len());
            prop_assert_eq!(driver.status_queries(), failures.len() + 1);
        }

        #[test]
        fn prop_unstable_roles_exhaust_budget(
            codes in prop::collection::vec(
                prop_oneof![Just(0), Just(3), Just(5), Just(6), Just(8), Just(9)],
                30,
            ),
        ) {
            let driver = Arc::new(ScriptedDriver::new().with_states(&codes).with_states(&[1]));
            let clock = Arc::new(ManualClock::new());

            let result = tokio_test::block_on(poller(driver.clone(), clock).wait_until_stable());

            let is_not_ready = matches!(result, Err(AdminError::NotReady { attempts: 30, .. }));
            prop_assert!(is_not_ready);
            prop_assert_eq!(driver.status_queries(), 30);
        }

        #[test]
        fn prop_mixed_failures_and_unstable_roles_exhaust_budget(
            ticks in prop::collection::vec(unstable_tick(), 30),
        ) {
            let driver = Arc::new(ScriptedDriver::new());
            for tick in &ticks {
                driver.push_status(tick.clone());
            }
            driver.push_status(Ok(StatusSnapshot::new(MemberState::Primary)));
            let clock = Arc::new(ManualClock::new());

            let result = tokio_test::block_on(poller(driver.clone(), clock).wait_until_stable());

            let last_reported = ticks.iter().rev().find_map(|t| t.as_ref().ok()).map(|s| s.my_state);
            match result {
                Err(AdminError::NotReady { attempts, last_status }) => {
                    prop_assert_eq!(attempts, 30);
                    prop_assert_eq!(last_status.map(|s| s.my_state), last_reported);
                }
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
            prop_assert_eq!(driver.status_queries(), 30);
        }
    }
}
