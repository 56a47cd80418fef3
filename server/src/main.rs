use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use roster_backend_api::{build_router, AppState};
use roster_backend_runtime::{shutdown_signal, telemetry, BackendServices};
use roster_config::{load as load_config, ValidationConfig};
use roster_members::{EnumRegistry, MemberFilter, Mode, Validator};
use serde_json::Value;
use tokio::{
    fs,
    io::{self, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, error, info};

#[derive(Debug, Parser)]
#[command(name = "roster-backend", version, about = "Member management backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP API (the default)
    Serve,
    /// Print stored members as JSON
    ListMembers {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    /// Validate a JSON member document and print its normalized form
    Validate {
        /// File holding one JSON object
        path: PathBuf,
        /// Check the document as a partial update instead of a new member
        #[arg(long)]
        update: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = telemetry::init_tracing() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::ListMembers {
            status,
            position,
            group,
        } => {
            list_members(MemberFilter {
                status,
                position,
                group,
            })
            .await
        }
        Commands::Validate { path, update } => validate_document(path, update).await,
    };

    if let Err(error) = result {
        error!(error = ?error, "roster backend failed");
        std::process::exit(1);
    }
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Roster backend");

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config).await?;

    let app = build_router(AppState::new(Arc::clone(&services.members)));

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    services.db_pool.close().await;
    info!("backend shut down");
    Ok(())
}

async fn list_members(filter: MemberFilter) -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config).await?;

    let members = services.members.list_members(&filter).await?;
    debug!(count = members.len(), "listed members");

    write_json(&serde_json::to_value(&members)?).await
}

async fn validate_document(path: PathBuf, update: bool) -> anyhow::Result<()> {
    // Validation needs no database, so a missing connection string is not fatal here.
    let settings = match load_config() {
        Ok(config) => config.validation,
        Err(error) => {
            debug!(error = %error, "using default validation settings");
            ValidationConfig::default()
        }
    };
    let validator = Validator::from_config(&settings, Arc::new(EnumRegistry::standard()))
        .context("invalid validation configuration")?;

    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let mode = if update { Mode::Update } else { Mode::Create };
    match validator.validate(&raw, mode) {
        Ok(normalized) => write_json(&normalized.into_value()).await,
        Err(errors) => {
            let mut stderr = io::stderr();
            for message in errors.messages() {
                stderr.write_all(format!("{message}\n").as_bytes()).await?;
            }
            anyhow::bail!("{} validation error(s) in {}", errors.len(), path.display())
        }
    }
}

async fn write_json(value: &Value) -> anyhow::Result<()> {
    let mut output = serde_json::to_vec_pretty(value)?;
    output.push(b'\n');

    let mut stdout = io::stdout();
    stdout.write_all(&output).await?;
    stdout.flush().await?;
    Ok(())
}
