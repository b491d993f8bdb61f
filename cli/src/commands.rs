//! Subcommand bodies.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use rsinit_common::{dump, ReplicaSetConfig};
use rsinit_driver::AdminDriver;
use rsinit_initiator::{Initiator, RetryPolicy};
use rsinit_provisioner::{ProvisionConfig, Provisioner};

/// Initiate the replica set and wait for a stable role.
pub async fn init_replica(
    driver: Arc<dyn AdminDriver>,
    config: ReplicaSetConfig,
    policy: RetryPolicy,
) -> anyhow::Result<()> {
    let set = config.id.clone();
    Initiator::new(driver, config, policy)
        .run()
        .await
        .with_context(|| format!("Bootstrapping replica set {}", set))?;
    Ok(())
}

/// Create the application user and collections.
pub async fn provision(
    driver: Arc<dyn AdminDriver>,
    config: ProvisionConfig,
) -> anyhow::Result<()> {
    let database = config.database.clone();
    Provisioner::new(driver, config)
        .run()
        .await
        .with_context(|| format!("Provisioning database {}", database))?;
    Ok(())
}

/// Ping the deployment and require a PRIMARY or SECONDARY member.
pub async fn check(driver: Arc<dyn AdminDriver>) -> anyhow::Result<()> {
    let ack = driver.ping().await.context("Deployment did not answer ping")?;
    info!(reply = %dump(&ack.reply), "Deployment reachable");

    let snapshot = driver
        .status()
        .await
        .context("Could not read replica set status")?;
    info!(status = %dump(&snapshot), "Replica set status");

    if !snapshot.is_stable() {
        bail!(
            "Member is {}, expected PRIMARY or SECONDARY",
            snapshot.my_state
        );
    }

    info!(state = %snapshot.my_state, "Replica set healthy");
    Ok(())
}
