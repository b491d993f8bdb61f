//! Provisioning configuration.

use std::collections::HashSet;
use std::fmt;

use rsinit_common::{AdminError, AdminResult, UserDescriptor};

/// Collections created for the application by default.
pub const DEFAULT_COLLECTIONS: [&str; 2] = ["images", "documents"];

/// Database holding user credentials by default.
pub const DEFAULT_AUTH_DATABASE: &str = "admin";

/// What the provisioner creates.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Application user name (`MONGO_USER`).
    pub username: String,
    /// Application user password (`MONGO_PASSWORD`).
    pub password: String,
    /// Application database (`MONGO_DB_NAME`).
    pub database: String,
    /// Database the user is created in (`MONGO_AUTH_DB`).
    pub auth_database: String,
    /// Collections to create in the application database, in order.
    pub collections: Vec<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            database: String::new(),
            auth_database: DEFAULT_AUTH_DATABASE.to_string(),
            collections: DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ProvisionConfig {
    /// Create a configuration with default auth database and collections.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Missing variables are left empty; [`validate`](Self::validate)
    /// reports them.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(user) = lookup("MONGO_USER") {
            config.username = user;
        }

        if let Some(password) = lookup("MONGO_PASSWORD") {
            config.password = password;
        }

        if let Some(db) = lookup("MONGO_DB_NAME") {
            config.database = db;
        }

        if let Some(auth_db) = lookup("MONGO_AUTH_DB") {
            config.auth_database = auth_db;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> AdminResult<()> {
        let required = [
            ("MONGO_USER", &self.username),
            ("MONGO_PASSWORD", &self.password),
            ("MONGO_DB_NAME", &self.database),
            ("MONGO_AUTH_DB", &self.auth_database),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AdminError::Configuration(format!(
                "Missing or empty: {}",
                missing.join(", ")
            )));
        }

        let mut seen = HashSet::new();
        for name in &self.collections {
            if name.trim().is_empty() {
                return Err(AdminError::Configuration(
                    "Collection name cannot be empty".to_string(),
                ));
            }
            if name.contains('$') || name.starts_with("system.") {
                return Err(AdminError::Configuration(format!(
                    "Invalid collection name: {}",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(AdminError::Configuration(format!(
                    "Duplicate collection name: {}",
                    name
                )));
            }
        }

        Ok(())
    }

    /// The user to create: `readWrite` on the application database only.
    pub fn user(&self) -> UserDescriptor {
        UserDescriptor::read_write(&self.username, &self.password, &self.database)
    }
}

impl fmt::Debug for ProvisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("auth_database", &self.auth_database)
            .field("collections", &self.collections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = ProvisionConfig::from_lookup(lookup(&[
            ("MONGO_USER", "app"),
            ("MONGO_PASSWORD", "s3cret"),
            ("MONGO_DB_NAME", "appdb"),
        ]));

        assert!(config.validate().is_ok());
        assert_eq!(config.username, "app");
        assert_eq!(config.auth_database, "admin");
        assert_eq!(config.collections, vec!["images", "documents"]);
    }

    #[test]
    fn test_missing_variables_are_named() {
        let config = ProvisionConfig::from_lookup(lookup(&[("MONGO_USER", "app")]));
        let err = config.validate().unwrap_err();

        let message = err.to_string();
        assert!(message.contains("MONGO_PASSWORD"));
        assert!(message.contains("MONGO_DB_NAME"));
        assert!(!message.contains("MONGO_USER"));
    }

    #[test]
    fn test_blank_values_rejected() {
        let config = ProvisionConfig::new("app", "  ", "appdb");
        assert!(matches!(
            config.validate(),
            Err(AdminError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_collections() {
        let mut config = ProvisionConfig::new("app", "pw", "appdb");
        config.collections = vec!["images".into(), "images".into()];
        assert!(config.validate().is_err());

        config.collections = vec!["system.users".into()];
        assert!(config.validate().is_err());

        config.collections = vec![];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_user_scoped_to_app_database() {
        let user = ProvisionConfig::new("app", "pw", "appdb").user();
        assert_eq!(user.roles.len(), 1);
        assert_eq!(user.roles[0].role, "readWrite");
        assert_eq!(user.roles[0].db, "appdb");
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ProvisionConfig::new("app", "s3cret", "appdb");
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
