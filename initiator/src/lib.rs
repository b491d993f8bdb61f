//! rsinit Replica-Set Initiator
//!
//! Forms a single-member replica set and waits for the member to settle.
//!
//! # Flow
//!
//! 1. Sleep the policy's initial delay so `mongod` can come up.
//! 2. Issue `replSetInitiate` exactly once. Any failure is fatal.
//! 3. Poll `replSetGetStatus` at a fixed interval for a bounded number of
//!    attempts until the member reports PRIMARY or SECONDARY. Failed
//!    queries are logged and retried within the same budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use rsinit_initiator::{Initiator, RetryPolicy};
//!
//! let initiator = Initiator::new(driver, ReplicaSetConfig::default(), RetryPolicy::default());
//! let report = initiator.run().await?;
//! ```

pub mod clock;
pub mod initiator;
pub mod policy;
pub mod poll;
pub mod report;

pub use clock::{Clock, TokioClock};
#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
pub use initiator::Initiator;
pub use policy::RetryPolicy;
pub use poll::{PollDecision, Readiness, ReadinessPoller, TickOutcome};
pub use report::BootstrapReport;
