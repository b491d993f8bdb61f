//! Replica-set configuration handed to `replSetInitiate`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{AdminError, AdminResult};

/// Default replica set identifier.
pub const DEFAULT_SET_NAME: &str = "rs0";

/// Default host:port of the single member.
pub const DEFAULT_MEMBER_HOST: &str = "mongodb:27017";

/// A member entry in the replica-set configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    /// Numeric member id (`_id`).
    #[serde(rename = "_id")]
    pub id: u32,
    /// host:port the other members and clients use to reach this member.
    pub host: String,
}

impl MemberConfig {
    /// Create a new member entry.
    pub fn new(id: u32, host: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
        }
    }
}

/// Replica-set configuration: identifier plus ordered member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSetConfig {
    /// Set identifier (`_id`).
    #[serde(rename = "_id")]
    pub id: String,
    /// Members, in declaration order.
    pub members: Vec<MemberConfig>,
}

impl ReplicaSetConfig {
    /// Configuration for a set with exactly one member, id 0.
    pub fn single_node(set_name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: set_name.into(),
            members: vec![MemberConfig::new(0, host)],
        }
    }

    /// Load overrides from environment variables.
    pub fn from_env() -> Self {
        let set_name =
            std::env::var("RSINIT_REPLSET").unwrap_or_else(|_| DEFAULT_SET_NAME.to_string());
        let host =
            std::env::var("RSINIT_MEMBER_HOST").unwrap_or_else(|_| DEFAULT_MEMBER_HOST.to_string());
        Self::single_node(set_name, host)
    }

    /// Validate configuration.
    pub fn validate(&self) -> AdminResult<()> {
        if self.id.trim().is_empty() {
            return Err(AdminError::Configuration(
                "Replica set name cannot be empty".to_string(),
            ));
        }

        if self.members.is_empty() {
            return Err(AdminError::Configuration(
                "Replica set needs at least one member".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            if member.host.trim().is_empty() {
                return Err(AdminError::Configuration(format!(
                    "Member {} has an empty host",
                    member.id
                )));
            }
            if !seen.insert(member.id) {
                return Err(AdminError::Configuration(format!(
                    "Duplicate member id {}",
                    member.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for ReplicaSetConfig {
    fn default() -> Self {
        Self::single_node(DEFAULT_SET_NAME, DEFAULT_MEMBER_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReplicaSetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.id, "rs0");
        assert_eq!(config.members, vec![MemberConfig::new(0, "mongodb:27017")]);
    }

    #[test]
    fn test_serializes_with_underscore_ids() {
        let json = serde_json::to_value(ReplicaSetConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "_id": "rs0",
                "members": [{ "_id": 0, "host": "mongodb:27017" }]
            })
        );
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = ReplicaSetConfig::default();
        config.id = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = ReplicaSetConfig::default();
        config.members.clear();
        assert!(config.validate().is_err());

        let mut config = ReplicaSetConfig::default();
        config.members.push(MemberConfig::new(0, "other:27017"));
        assert!(matches!(
            config.validate(),
            Err(AdminError::Configuration(msg)) if msg.contains("Duplicate")
        ));

        let config = ReplicaSetConfig::single_node("rs0", "");
        assert!(config.validate().is_err());
    }
}
