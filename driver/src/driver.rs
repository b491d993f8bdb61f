//! The administrative driver trait.

use async_trait::async_trait;
use rsinit_common::{AdminResult, ReplicaSetConfig, StatusSnapshot, UserDescriptor};
use serde::Serialize;

/// Acknowledgement of an administrative command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    /// Command name, e.g. `replSetInitiate`.
    pub command: String,
    /// Server reply, rendered as relaxed extended JSON.
    pub reply: serde_json::Value,
}

impl Ack {
    /// Create a new acknowledgement.
    pub fn new(command: impl Into<String>, reply: serde_json::Value) -> Self {
        Self {
            command: command.into(),
            reply,
        }
    }

    /// Acknowledgement with a bare `{ "ok": 1 }` reply.
    pub fn ok(command: impl Into<String>) -> Self {
        Self::new(command, serde_json::json!({ "ok": 1 }))
    }
}

/// Handle naming the database subsequent calls operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseContext {
    name: String,
}

impl DatabaseContext {
    /// Create a new context.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Administrative operations against a deployment.
#[async_trait]
pub trait AdminDriver: Send + Sync {
    /// Form a replica set from `config`. Called at most once per run.
    async fn initiate(&self, config: &ReplicaSetConfig) -> AdminResult<Ack>;

    /// Read the current replica-set status.
    async fn status(&self) -> AdminResult<StatusSnapshot>;

    /// Create a user whose credentials live in `auth_db`.
    async fn create_user(&self, auth_db: &str, user: &UserDescriptor) -> AdminResult<Ack>;

    /// Switch to a logical database.
    fn select_database(&self, name: &str) -> DatabaseContext;

    /// Create an empty collection in the selected database.
    async fn create_collection(&self, db: &DatabaseContext, name: &str) -> AdminResult<Ack>;

    /// Round-trip a no-op command.
    async fn ping(&self) -> AdminResult<Ack>;
}
