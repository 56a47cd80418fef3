//! Roster Database Crate
//!
//! SQLite persistence for Roster: connection bootstrap, embedded migrations
//! and [`SqliteMemberStore`], the production implementation of
//! [`roster_members::MemberStore`].

use roster_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};
pub use repos::SqliteMemberStore;
pub use types::{DatabaseError, DatabaseResult};

/// Connect to the configured database and bring its schema up to date
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
