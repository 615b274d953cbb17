//! # vndb-cli
//!
//! Command-line client for the VNDB TCP API: connects a session, runs one
//! command, prints the result as pretty JSON.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use vndb_client::{Client, EntityType, Filter, GetOptions, GetRequest};
use vndb_protocol::{Credentials, SessionConfig};

/// Command-line client for the VNDB TCP API.
#[derive(Parser, Debug)]
#[command(name = "vndb", about = "Query the VNDB database over its TCP API", version)]
struct Cli {
    /// Remote host.
    #[arg(long, default_value = "api.vndb.org")]
    host: String,

    /// Remote TLS port.
    #[arg(long, default_value_t = 19535)]
    port: u16,

    /// Account name; anonymous when omitted.
    #[arg(long)]
    username: Option<String>,

    /// Account password.
    #[arg(long, env = "VNDB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Minimum log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print database-wide statistics.
    Stats,
    /// Fetch records of one entity type.
    Get {
        /// Entity type: vn, release, producer, character, staff, user, ulist, ulist-labels.
        entity: EntityType,
        /// Filter expression, e.g. `(id = 17)`.
        filter: String,
        /// Comma-separated field groups to include.
        #[arg(long, default_value = "basic")]
        flags: String,
        /// 1-based page number.
        #[arg(long)]
        page: Option<u32>,
        /// Results per page.
        #[arg(long)]
        results: Option<u32>,
        /// Field to sort on.
        #[arg(long)]
        sort: Option<String>,
        /// Reverse the sort order.
        #[arg(long)]
        reverse: bool,
    },
    /// Update fields on one record of the authenticated user's list.
    SetUlist {
        /// Visual novel id.
        id: u64,
        /// Field updates as a JSON object, e.g. `{"vote": 85}`.
        fields: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(&cli.log_level);

    let credentials = match (cli.username.clone(), cli.password.clone()) {
        (Some(username), Some(password)) => Some(Credentials::new(username, password)),
        (None, None) => None,
        _ => anyhow::bail!("--username and --password must be given together"),
    };
    let config = SessionConfig {
        host: cli.host.clone(),
        port: cli.port,
        credentials,
        ..SessionConfig::default()
    };

    debug!(host = %config.host, port = config.port, "connecting");
    let client = Client::connect(config)
        .await
        .with_context(|| format!("failed to connect to {}:{}", cli.host, cli.port))?;

    let outcome = run(&client, cli.command).await;
    client.close().await;
    outcome
}

async fn run(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::Stats => {
            let stats = client.dbstats().await.context("dbstats failed")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Get {
            entity,
            filter,
            flags,
            page,
            results,
            sort,
            reverse,
        } => {
            let flags: Vec<&str> = flags.split(',').map(str::trim).collect();
            let options = GetOptions {
                page,
                results,
                sort,
                reverse: reverse.then_some(true),
            };
            let request =
                GetRequest::new(entity, &flags, Filter::raw(filter)).with_options(options);
            let fetched = client.get(&request).await.context("get failed")?;
            println!("{}", serde_json::to_string_pretty(&fetched)?);
        }
        Command::SetUlist { id, fields } => {
            let fields: serde_json::Value =
                serde_json::from_str(&fields).context("fields is not valid JSON")?;
            client
                .set_ulist(id, fields)
                .await
                .context("set ulist failed")?;
            println!("ok");
        }
    }
    Ok(())
}

/// Initialize the global tracing subscriber with stderr output only.
fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a subscriber is already set
    let _ = subscriber.try_init();
}
