//! `AdminDriver` backed by the official MongoDB driver.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::{debug, info, instrument};

use rsinit_common::{
    redact_uri, AdminError, AdminResult, MemberState, MemberStatus, ReplicaSetConfig,
    StatusSnapshot, UserDescriptor, DEFAULT_URI,
};

use crate::driver::{Ack, AdminDriver, DatabaseContext};

/// Database administrative commands are sent to.
const ADMIN_DB: &str = "admin";

/// Connection configuration for [`MongoAdminDriver`].
#[derive(Clone)]
pub struct MongoDriverConfig {
    /// Connection string.
    pub uri: String,
    /// Talk to the addressed host only, skipping replica-set discovery.
    /// Required before the set is initiated.
    pub direct_connection: bool,
    /// How long a single call waits for a usable server.
    pub server_selection_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Application name reported to the server.
    pub app_name: String,
}

impl Default for MongoDriverConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            direct_connection: true,
            server_selection_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            app_name: "rsinit".to_string(),
        }
    }
}

impl MongoDriverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(uri) = std::env::var("MONGO_URI") {
            config.uri = uri;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> AdminResult<()> {
        if self.uri.trim().is_empty() {
            return Err(AdminError::Configuration(
                "Connection string cannot be empty".to_string(),
            ));
        }

        if !self.uri.starts_with("mongodb://") && !self.uri.starts_with("mongodb+srv://") {
            return Err(AdminError::Configuration(format!(
                "Unsupported connection string scheme: {}",
                redact_uri(&self.uri)
            )));
        }

        if self.server_selection_timeout.is_zero() {
            return Err(AdminError::Configuration(
                "Server selection timeout cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for MongoDriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoDriverConfig")
            .field("uri", &redact_uri(&self.uri))
            .field("direct_connection", &self.direct_connection)
            .field("server_selection_timeout", &self.server_selection_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("app_name", &self.app_name)
            .finish()
    }
}

/// MongoDB-backed administrative driver.
pub struct MongoAdminDriver {
    client: Client,
}

impl MongoAdminDriver {
    /// Build a client from `config`.
    ///
    /// The driver connects lazily; an unreachable host surfaces on the first
    /// command, not here.
    pub async fn connect(config: &MongoDriverConfig) -> AdminResult<Self> {
        config.validate()?;

        let mut options = ClientOptions::parse(config.uri.as_str())
            .await
            .map_err(map_error)?;
        if config.direct_connection {
            options.direct_connection = Some(true);
        }
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.connect_timeout = Some(config.connect_timeout);
        options.app_name = Some(config.app_name.clone());

        let client = Client::with_options(options).map_err(map_error)?;

        info!(uri = %redact_uri(&config.uri), "MongoDB client configured");

        Ok(Self { client })
    }

    async fn run(&self, db: &str, name: &str, command: Document) -> AdminResult<Ack> {
        debug!(db = db, command = name, "Running command");
        let reply = self
            .client
            .database(db)
            .run_command(command)
            .await
            .map_err(map_error)?;
        Ok(Ack::new(name, document_to_json(reply)))
    }
}

#[async_trait]
impl AdminDriver for MongoAdminDriver {
    #[instrument(skip(self, config), fields(set = %config.id))]
    async fn initiate(&self, config: &ReplicaSetConfig) -> AdminResult<Ack> {
        self.run(ADMIN_DB, "replSetInitiate", initiate_command(config))
            .await
    }

    async fn status(&self) -> AdminResult<StatusSnapshot> {
        let reply = self
            .client
            .database(ADMIN_DB)
            .run_command(doc! { "replSetGetStatus": 1 })
            .await
            .map_err(map_error)?;
        parse_status(&reply)
    }

    #[instrument(skip(self, user), fields(user = %user.user))]
    async fn create_user(&self, auth_db: &str, user: &UserDescriptor) -> AdminResult<Ack> {
        self.run(auth_db, "createUser", create_user_command(user))
            .await
    }

    fn select_database(&self, name: &str) -> DatabaseContext {
        DatabaseContext::new(name)
    }

    async fn create_collection(&self, db: &DatabaseContext, name: &str) -> AdminResult<Ack> {
        self.client
            .database(db.name())
            .create_collection(name)
            .await
            .map_err(map_error)?;
        Ok(Ack::new(
            "create",
            serde_json::json!({ "ok": 1, "ns": format!("{}.{}", db.name(), name) }),
        ))
    }

    async fn ping(&self) -> AdminResult<Ack> {
        self.run(ADMIN_DB, "ping", doc! { "ping": 1 }).await
    }
}

/// `replSetInitiate` command document.
pub(crate) fn initiate_command(config: &ReplicaSetConfig) -> Document {
    let members: Vec<Document> = config
        .members
        .iter()
        .map(|m| doc! { "_id": i64::from(m.id), "host": m.host.as_str() })
        .collect();

    doc! {
        "replSetInitiate": {
            "_id": config.id.as_str(),
            "members": members,
        }
    }
}

/// `createUser` command document.
pub(crate) fn create_user_command(user: &UserDescriptor) -> Document {
    let roles: Vec<Document> = user
        .roles
        .iter()
        .map(|r| doc! { "role": r.role.as_str(), "db": r.db.as_str() })
        .collect();

    doc! {
        "createUser": user.user.as_str(),
        "pwd": user.password.as_str(),
        "roles": roles,
    }
}

/// Interpret a `replSetGetStatus` reply.
pub(crate) fn parse_status(reply: &Document) -> AdminResult<StatusSnapshot> {
    let my_state = reply
        .get("myState")
        .and_then(bson_code)
        .ok_or_else(|| AdminError::InvalidResponse("replSetGetStatus reply has no myState".into()))?;

    let mut snapshot = StatusSnapshot::new(MemberState::from_code(my_state));
    snapshot.set_name = reply.get_str("set").ok().map(str::to_string);

    if let Ok(members) = reply.get_array("members") {
        for member in members.iter().filter_map(Bson::as_document) {
            snapshot.members.push(MemberStatus {
                id: member.get("_id").and_then(bson_code).unwrap_or(-1),
                name: member.get_str("name").unwrap_or_default().to_string(),
                state: MemberState::from_code(
                    member.get("state").and_then(bson_code).unwrap_or(6),
                ),
                healthy: member.get("health").and_then(bson_code) == Some(1),
            });
        }
    }

    Ok(snapshot)
}

/// Integer value of a numeric BSON field, whatever width the server used.
fn bson_code(value: &Bson) -> Option<i32> {
    match value {
        Bson::Int32(v) => Some(*v),
        Bson::Int64(v) => i32::try_from(*v).ok(),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i32),
        _ => None,
    }
}

fn document_to_json(document: Document) -> serde_json::Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn map_error(err: mongodb::error::Error) -> AdminError {
    match err.kind.as_ref() {
        ErrorKind::Command(cmd) => {
            AdminError::command(cmd.code, cmd.code_name.clone(), cmd.message.clone())
        }
        ErrorKind::ServerSelection { message, .. } => AdminError::Timeout(message.clone()),
        ErrorKind::Io(io) => AdminError::Connection(io.to_string()),
        ErrorKind::DnsResolve { message, .. } => AdminError::Connection(message.clone()),
        ErrorKind::ConnectionPoolCleared { message, .. } => {
            AdminError::Connection(message.clone())
        }
        ErrorKind::InvalidArgument { message, .. } => {
            AdminError::Configuration(message.clone())
        }
        _ => AdminError::Internal(err.to_string()),
    }
}
