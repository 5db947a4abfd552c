//! SeaORM storage backend.
//!
//! One concrete store over SQLite, MySQL/MariaDB or PostgreSQL. The
//! connection is established explicitly at startup and the handle is passed
//! to every component that needs it; there is no lazy global state.

mod analytics;
mod connection;
mod converters;
mod ledger;
mod mutations;
mod query;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::errors::{Result, QrGenError};

pub use analytics::TrendRow;
pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use mutations::QrCodeUpdate;

/// Infer the database type from the connection URL.
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(QrGenError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend.
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(QrGenError::database_config("DATABASE_URL is not set"));
        }

        // An unset backend name is inferred from the URL scheme.
        let backend_name = if backend_name.is_empty() {
            infer_backend_from_url(database_url)?
        } else {
            backend_name.to_string()
        };
        let backend_name = backend_name.as_str();

        let db = if backend_name == "sqlite" {
            connection::connect_sqlite(database_url).await?
        } else {
            connection::connect_generic(database_url, backend_name).await?
        };

        connection::run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
        };

        warn!(
            "{} storage backend initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// Wrap an already-established connection (used by tests).
    pub fn from_connection(db: DatabaseConnection, backend_name: &str) -> Self {
        SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
        }
    }

    pub fn get_backend_name(&self) -> &str {
        &self.backend_name
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
