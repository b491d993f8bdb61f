//! User and collection provisioner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

use rsinit_common::{dump, AdminResult};
use rsinit_driver::AdminDriver;

use crate::config::ProvisionConfig;

/// What a successful provisioning run created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    /// User that was created.
    pub user: String,
    /// Database holding the user's credentials.
    pub auth_database: String,
    /// Application database.
    pub database: String,
    /// Collections created, in order.
    pub collections: Vec<String>,
    /// When provisioning finished.
    pub finished_at: DateTime<Utc>,
}

/// Creates the application user and collections.
pub struct Provisioner {
    driver: Arc<dyn AdminDriver>,
    config: ProvisionConfig,
}

impl Provisioner {
    /// Create a new provisioner.
    pub fn new(driver: Arc<dyn AdminDriver>, config: ProvisionConfig) -> Self {
        Self { driver, config }
    }

    /// Run provisioning.
    ///
    /// Stops at the first failing call; later steps are not attempted and
    /// earlier ones are not undone.
    #[instrument(skip(self), fields(user = %self.config.username, db = %self.config.database))]
    pub async fn run(&self) -> AdminResult<ProvisionReport> {
        self.config.validate()?;

        let user = self.config.user();
        let ack = self
            .driver
            .create_user(&self.config.auth_database, &user)
            .await
            .map_err(|e| {
                error!(error = %e, details = %e.to_json(), "Failed to create user");
                e
            })?;
        info!(
            auth_db = %self.config.auth_database,
            roles = %dump(&user.roles),
            reply = %dump(&ack.reply),
            "User created"
        );

        let db = self.driver.select_database(&self.config.database);

        let mut created = Vec::with_capacity(self.config.collections.len());
        for name in &self.config.collections {
            let ack = self
                .driver
                .create_collection(&db, name)
                .await
                .map_err(|e| {
                    error!(collection = %name, error = %e, details = %e.to_json(), "Failed to create collection");
                    e
                })?;
            info!(collection = %name, reply = %dump(&ack.reply), "Collection created");
            created.push(name.clone());
        }

        let report = ProvisionReport {
            user: self.config.username.clone(),
            auth_database: self.config.auth_database.clone(),
            database: self.config.database.clone(),
            collections: created,
            finished_at: Utc::now(),
        };
        info!(report = %dump(&report), "Provisioning complete");

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsinit_common::AdminError;
    use rsinit_driver::{DriverCall, ScriptedDriver, USER_ALREADY_EXISTS};

    fn config() -> ProvisionConfig {
        ProvisionConfig::new("app", "s3cret", "appdb")
    }

    #[tokio::test]
    async fn test_creates_user_then_collections() {
        let driver = Arc::new(ScriptedDriver::new());

        let report = Provisioner::new(driver.clone(), config()).run().await.unwrap();

        assert_eq!(report.user, "app");
        assert_eq!(report.collections, vec!["images", "documents"]);
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::CreateUser {
                    auth_db: "admin".to_string(),
                    user: "app".to_string(),
                },
                DriverCall::SelectDatabase("appdb".to_string()),
                DriverCall::CreateCollection {
                    db: "appdb".to_string(),
                    name: "images".to_string(),
                },
                DriverCall::CreateCollection {
                    db: "appdb".to_string(),
                    name: "documents".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_user_aborts_before_collections() {
        let driver = Arc::new(ScriptedDriver::new().with_existing_user("app"));

        let err = Provisioner::new(driver.clone(), config()).run().await.unwrap_err();

        assert!(matches!(
            err,
            AdminError::Command {
                code: USER_ALREADY_EXISTS,
                ..
            }
        ));
        assert!(driver.created_collections().is_empty());
        assert_eq!(driver.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_collection_failure_keeps_earlier_work() {
        let driver = Arc::new(
            ScriptedDriver::new().fail_collection("images", AdminError::Timeout("slow".into())),
        );

        let err = Provisioner::new(driver.clone(), config()).run().await.unwrap_err();

        assert!(matches!(err, AdminError::Timeout(_)));
        assert!(driver.created_collections().is_empty());
        assert!(!driver.calls().contains(&DriverCall::CreateCollection {
            db: "appdb".to_string(),
            name: "documents".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_second_run_is_not_idempotent() {
        let driver = Arc::new(ScriptedDriver::new());

        Provisioner::new(driver.clone(), config()).run().await.unwrap();
        let err = Provisioner::new(driver.clone(), config()).run().await.unwrap_err();

        assert_eq!(err.error_code(), "COMMAND_FAILED");
        assert_eq!(driver.created_collections().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_makes_no_calls() {
        let driver = Arc::new(ScriptedDriver::new());

        let err = Provisioner::new(driver.clone(), ProvisionConfig::new("", "pw", "appdb"))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Configuration(_)));
        assert!(driver.calls().is_empty());
    }
}
