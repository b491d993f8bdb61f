//! Scripted driver for tests.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use rsinit_common::{
    AdminError, AdminResult, MemberState, ReplicaSetConfig, StatusSnapshot, UserDescriptor,
};

use crate::driver::{Ack, AdminDriver, DatabaseContext};

/// Server error code for `createUser` on an existing name.
pub const USER_ALREADY_EXISTS: i32 = 51003;

/// A call observed by [`ScriptedDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Initiate(String),
    Status,
    CreateUser { auth_db: String, user: String },
    SelectDatabase(String),
    CreateCollection { db: String, name: String },
    Ping,
}

/// Driver that replays scripted replies and records every call.
///
/// Status replies are consumed in order; once the script runs out every
/// further query fails with a connection error.
#[derive(Default)]
pub struct ScriptedDriver {
    initiate_error: Mutex<Option<AdminError>>,
    ping_error: Mutex<Option<AdminError>>,
    statuses: Mutex<VecDeque<AdminResult<StatusSnapshot>>>,
    users: Mutex<HashSet<String>>,
    collections: Mutex<HashSet<(String, String)>>,
    created: Mutex<Vec<(String, String)>>,
    collection_errors: Mutex<HashMap<String, AdminError>>,
    calls: Mutex<Vec<DriverCall>>,
}

impl ScriptedDriver {
    /// Create a driver whose commands all succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initiate` fail with `err`.
    pub fn fail_initiate(self, err: AdminError) -> Self {
        *self.initiate_error.lock() = Some(err);
        self
    }

    /// Make `ping` fail with `err`.
    pub fn fail_ping(self, err: AdminError) -> Self {
        *self.ping_error.lock() = Some(err);
        self
    }

    /// Queue one status reply per state code.
    pub fn with_states(self, codes: &[i32]) -> Self {
        {
            let mut statuses = self.statuses.lock();
            for code in codes {
                statuses.push_back(Ok(StatusSnapshot::new(MemberState::from_code(*code))
                    .with_set_name("rs0")));
            }
        }
        self
    }

    /// Queue `count` failed status queries.
    pub fn with_failures(self, count: usize, err: AdminError) -> Self {
        {
            let mut statuses = self.statuses.lock();
            for _ in 0..count {
                statuses.push_back(Err(err.clone()));
            }
        }
        self
    }

    /// Queue a single status reply.
    pub fn push_status(&self, reply: AdminResult<StatusSnapshot>) {
        self.statuses.lock().push_back(reply);
    }

    /// Pretend `user` already exists.
    pub fn with_existing_user(self, user: impl Into<String>) -> Self {
        self.users.lock().insert(user.into());
        self
    }

    /// Make creating collection `name` fail with `err`.
    pub fn fail_collection(self, name: impl Into<String>, err: AdminError) -> Self {
        self.collection_errors.lock().insert(name.into(), err);
        self
    }

    /// All calls, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    /// Number of status queries issued.
    pub fn status_queries(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, DriverCall::Status))
            .count()
    }

    /// Collections created, as `(db, name)` in call order.
    pub fn created_collections(&self) -> Vec<(String, String)> {
        self.created.lock().clone()
    }

    fn record(&self, call: DriverCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl AdminDriver for ScriptedDriver {
    async fn initiate(&self, config: &ReplicaSetConfig) -> AdminResult<Ack> {
        self.record(DriverCall::Initiate(config.id.clone()));
        match self.initiate_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(Ack::ok("replSetInitiate")),
        }
    }

    async fn status(&self) -> AdminResult<StatusSnapshot> {
        self.record(DriverCall::Status);
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(AdminError::Connection("status script exhausted".into())))
    }

    async fn create_user(&self, auth_db: &str, user: &UserDescriptor) -> AdminResult<Ack> {
        self.record(DriverCall::CreateUser {
            auth_db: auth_db.to_string(),
            user: user.user.clone(),
        });
        if !self.users.lock().insert(user.user.clone()) {
            return Err(AdminError::command(
                USER_ALREADY_EXISTS,
                "Location51003",
                format!("User \"{}@{}\" already exists", user.user, auth_db),
            ));
        }
        Ok(Ack::ok("createUser"))
    }

    fn select_database(&self, name: &str) -> DatabaseContext {
        self.record(DriverCall::SelectDatabase(name.to_string()));
        DatabaseContext::new(name)
    }

    async fn create_collection(&self, db: &DatabaseContext, name: &str) -> AdminResult<Ack> {
        self.record(DriverCall::CreateCollection {
            db: db.name().to_string(),
            name: name.to_string(),
        });
        if let Some(err) = self.collection_errors.lock().get(name) {
            return Err(err.clone());
        }
        if !self
            .collections
            .lock()
            .insert((db.name().to_string(), name.to_string()))
        {
            return Err(AdminError::command(
                48,
                "NamespaceExists",
                format!("Collection {}.{} already exists.", db.name(), name),
            ));
        }
        self.created
            .lock()
            .push((db.name().to_string(), name.to_string()));
        Ok(Ack::ok("create"))
    }

    async fn ping(&self) -> AdminResult<Ack> {
        self.record(DriverCall::Ping);
        match self.ping_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(Ack::ok("ping")),
        }
    }
}
