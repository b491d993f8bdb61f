//! rsinit CLI
//!
//! One-shot bootstrap of a single-node MongoDB replica set and provisioning
//! of the application user. Exit status 0 means success, 1 means failure.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, Instrument};

use rsinit_common::{redact_uri, ReplicaSetConfig};
use rsinit_driver::{AdminDriver, MongoAdminDriver, MongoDriverConfig};
use rsinit_initiator::RetryPolicy;
use rsinit_provisioner::ProvisionConfig;

mod commands;
mod logging;

use logging::LogFormat;

/// Replica-set bootstrap and provisioning CLI
#[derive(Parser, Debug)]
#[command(name = "rsinit")]
#[command(about = "Bootstrap a single-node MongoDB replica set and provision its application user")]
struct Args {
    /// Connection string (overrides MONGO_URI)
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initiate the replica set and wait for the member to settle
    InitReplica {
        /// Replica set name (overrides RSINIT_REPLSET)
        #[arg(long)]
        set_name: Option<String>,

        /// host:port of the single member (overrides RSINIT_MEMBER_HOST)
        #[arg(long)]
        member_host: Option<String>,

        /// Maximum status queries (overrides RSINIT_POLL_ATTEMPTS, default 30)
        #[arg(long)]
        attempts: Option<u32>,

        /// Delay before each status query, in milliseconds (overrides RSINIT_POLL_INTERVAL_MS, default 2000)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Delay before initiating, in milliseconds (overrides RSINIT_INITIAL_DELAY_MS, default 20000)
        #[arg(long)]
        initial_delay_ms: Option<u64>,
    },

    /// Create the application user and collections
    Provision {
        /// User name (overrides MONGO_USER)
        #[arg(long)]
        user: Option<String>,

        /// Password (overrides MONGO_PASSWORD)
        #[arg(long)]
        password: Option<String>,

        /// Application database (overrides MONGO_DB_NAME)
        #[arg(long)]
        database: Option<String>,

        /// Database holding the credentials (overrides MONGO_AUTH_DB)
        #[arg(long)]
        auth_database: Option<String>,

        /// Collection to create; repeat for several (default: images, documents)
        #[arg(long = "collection")]
        collections: Vec<String>,
    },

    /// Report whether the member is reachable and stable
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_format);

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("rsinit", run_id = %run_id);

    match run(args).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(run_id = %run_id, error = %format!("{:#}", e), "rsinit failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut driver_config = MongoDriverConfig::from_env();
    if let Some(uri) = args.uri {
        driver_config.uri = uri;
    }

    info!(uri = %redact_uri(&driver_config.uri), "Starting rsinit");

    let driver: Arc<dyn AdminDriver> = Arc::new(MongoAdminDriver::connect(&driver_config).await?);

    match args.command {
        Command::InitReplica {
            set_name,
            member_host,
            attempts,
            interval_ms,
            initial_delay_ms,
        } => {
            let mut config = ReplicaSetConfig::from_env();
            if let Some(name) = set_name {
                config.id = name;
            }
            if let Some(host) = member_host {
                config.members = ReplicaSetConfig::single_node(&config.id, host).members;
            }

            let mut policy = RetryPolicy::from_env();
            if let Some(attempts) = attempts {
                policy = policy.with_max_attempts(attempts);
            }
            if let Some(ms) = interval_ms {
                policy = policy.with_interval(Duration::from_millis(ms));
            }
            if let Some(ms) = initial_delay_ms {
                policy = policy.with_initial_delay(Duration::from_millis(ms));
            }

            commands::init_replica(driver, config, policy).await
        }
        Command::Provision {
            user,
            password,
            database,
            auth_database,
            collections,
        } => {
            let mut config = ProvisionConfig::from_env();
            if let Some(user) = user {
                config.username = user;
            }
            if let Some(password) = password {
                config.password = password;
            }
            if let Some(database) = database {
                config.database = database;
            }
            if let Some(auth_database) = auth_database {
                config.auth_database = auth_database;
            }
            if !collections.is_empty() {
                config.collections = collections;
            }

            commands::provision(driver, config).await
        }
        Command::Check => commands::check(driver).await,
    }
}
