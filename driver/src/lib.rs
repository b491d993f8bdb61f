//! rsinit Administrative Driver
//!
//! The `AdminDriver` trait is the only way the bootstrap and provisioning
//! procedures talk to a deployment. `MongoAdminDriver` implements it with the
//! official MongoDB driver; `ScriptedDriver` (behind `test-utils`) replays
//! canned replies for tests.

pub mod driver;
pub mod mongo;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use driver::{Ack, AdminDriver, DatabaseContext};
pub use mongo::{MongoAdminDriver, MongoDriverConfig};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{DriverCall, ScriptedDriver, USER_ALREADY_EXISTS};
