//! Summary of a bootstrap run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rsinit_common::MemberState;

use crate::poll::Readiness;

/// Outcome of a successful bootstrap, logged at the end of the run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    /// Replica set that was initiated.
    pub set_name: String,
    /// Role the member settled in.
    pub final_state: MemberState,
    /// Status queries issued.
    pub attempts: u32,
    /// Status queries that failed along the way.
    pub failed_queries: u32,
    /// Total time spent sleeping (initial delay plus poll intervals), in ms.
    pub waited_ms: u64,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the member was seen stable.
    pub finished_at: DateTime<Utc>,
}

impl BootstrapReport {
    /// Build a report from the poll result.
    pub fn new(
        set_name: impl Into<String>,
        readiness: &Readiness,
        waited_ms: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            set_name: set_name.into(),
            final_state: readiness.state,
            attempts: readiness.attempts,
            failed_queries: readiness.failed_queries,
            waited_ms,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
