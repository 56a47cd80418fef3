use std::sync::Arc;

use anyhow::{Context, Result};
use roster_config::AppConfig;
use roster_database::{initialize_database, SqliteMemberStore};
use roster_members::{EnumRegistry, MemberService, Validator};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Install the global subscriber; `RUST_LOG` overrides the `info` default.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub registry: Arc<EnumRegistry>,
    pub members: Arc<MemberService<SqliteMemberStore>>,
}

impl BackendServices {
    /// Connect the store and build the member service. A store that cannot be
    /// reached is an error; the caller is expected to stop.
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise member database")?;

        let registry = Arc::new(EnumRegistry::standard());
        let validator = Validator::from_config(&config.validation, Arc::clone(&registry))
            .context("invalid validation configuration")?;
        info!(
            region = ?validator.region(),
            unknown_fields = ?config.validation.unknown_fields,
            "member validator ready"
        );

        let members = Arc::new(MemberService::new(
            SqliteMemberStore::new(db_pool.clone()),
            Arc::new(validator),
        ));

        Ok(Self {
            db_pool,
            registry,
            members,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
