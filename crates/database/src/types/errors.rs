//! Error types for the database layer

use thiserror::Error;

/// Failures while bringing the database up. Fatal at startup.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}
