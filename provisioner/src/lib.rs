//! rsinit Provisioner
//!
//! Creates the application user and its empty collections. Runs once, after
//! the replica set is ready. Any failure aborts the run; nothing is retried
//! or rolled back.

pub mod config;
pub mod provisioner;

pub use config::ProvisionConfig;
pub use provisioner::{ProvisionReport, Provisioner};
