//! Replica-set bootstrapper.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument};

use rsinit_common::{dump, AdminResult, ReplicaSetConfig};
use rsinit_driver::AdminDriver;

use crate::clock::{Clock, TokioClock};
use crate::policy::{millis, RetryPolicy};
use crate::poll::ReadinessPoller;
use crate::report::BootstrapReport;

/// Initiates a replica set once and waits for it to settle.
pub struct Initiator {
    /// Administrative driver.
    driver: Arc<dyn AdminDriver>,
    /// Source of delays.
    clock: Arc<dyn Clock>,
    /// Set to initiate.
    config: ReplicaSetConfig,
    /// Timing of the readiness poll.
    policy: RetryPolicy,
}

impl Initiator {
    /// Create a new initiator using the tokio clock.
    pub fn new(driver: Arc<dyn AdminDriver>, config: ReplicaSetConfig, policy: RetryPolicy) -> Self {
        Self {
            driver,
            clock: Arc::new(TokioClock),
            config,
            policy,
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the bootstrap.
    ///
    /// An initiation failure is returned immediately without polling. A poll
    /// that never sees a stable role returns `AdminError::NotReady`.
    #[instrument(skip(self), fields(set = %self.config.id))]
    pub async fn run(&self) -> AdminResult<BootstrapReport> {
        self.config.validate()?;
        self.policy.validate()?;

        let started_at = Utc::now();
        info!(
            config = %dump(&self.config),
            max_attempts = self.policy.max_attempts,
            interval_ms = millis(self.policy.interval),
            budget_ms = millis(self.policy.budget()),
            "Initializing replica set"
        );

        if !self.policy.initial_delay.is_zero() {
            info!(
                delay_ms = millis(self.policy.initial_delay),
                "Waiting for mongod to accept connections"
            );
            self.clock.sleep(self.policy.initial_delay).await;
        }

        let ack = match self.driver.initiate(&self.config).await {
            Ok(ack) => ack,
            Err(e) => {
                error!(
                    error = %e,
                    code = e.error_code(),
                    details = %e.to_json(),
                    "Replica set initiation failed"
                );
                return Err(e);
            }
        };
        info!(reply = %dump(&ack.reply), "Replica set initiation acknowledged");

        let poller =
            ReadinessPoller::new(self.driver.clone(), self.clock.clone(), self.policy.clone());
        let readiness = poller.wait_until_stable().await?;

        let report = BootstrapReport::new(
            self.config.id.clone(),
            &readiness,
            millis(self.policy.waited(readiness.attempts)),
            started_at,
        );

        info!(
            state = %report.final_state,
            attempts = report.attempts,
            elapsed_ms = report.elapsed_ms(),
            report = %dump(&report),
            "Replica set ready"
        );

        Ok(report)
    }
}
