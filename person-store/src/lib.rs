//! # person-store
//!
//! A tiny person registry with reentrant connection management, backed by
//! SQLite or MySQL.
//!
//! ## Features
//!
//! - Deferred backend selection through [`DatabaseProxy`]
//! - Keyword-style backend configuration with sensible defaults
//! - [`with_database`]: open a connection for the outermost call only, close
//!   it when that call finishes, and let nested calls reuse it
//! - Idempotent schema bootstrap
//! - Support for SQLite (`embedded`) and MySQL (`networked`)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use person_store::{configure, create_tables_if_not_exist, with_database, DatabaseProxy, Person};
//!
//! # async fn example() -> person_store::Result<()> {
//! let proxy = DatabaseProxy::new();
//!
//! let mut options = serde_json::Map::new();
//! options.insert("path".into(), "persons.db".into());
//! configure(&proxy, "embedded", options)?;
//!
//! create_tables_if_not_exist(&proxy).await?;
//!
//! let people = with_database(&proxy, || async {
//!     Person::create(&proxy, "Alice", 25).await?;
//!     Person::list(&proxy).await
//! })
//! .await?;
//! assert_eq!(people.len(), 1);
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod config;
pub mod database;
pub mod guard;
pub mod person;
pub mod proxy;
pub mod schema;

#[cfg(all(test, feature = "embedded"))]
mod testing;

// Public exports
pub use config::{configure, configure_with, BackendConfig, BackendKind, EmbeddedOptions, NetworkedOptions, Options};
pub use guard::with_database;
pub use person::Person;
pub use proxy::DatabaseProxy;
pub use schema::{create_tables_if_not_exist, ColumnKind, ColumnSpec, TableSpec, PERSON_TABLE, TABLES};

// Re-export database backends
pub use database::traits::Backend;

#[cfg(feature = "embedded")]
pub use database::sqlite::SqliteBackend;

#[cfg(feature = "networked")]
pub use database::mysql::MySqlBackend;

// Error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The proxy was used before any backend was installed
    #[error("Database is not configured; call configure() first")]
    NotConfigured,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Opening, closing or talking to the connection failed
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Anything else reported by the storage layer
    #[error("Database error: {0}")]
    Backend(String),
}

/// SQLSTATE for "string data, right truncation" (MySQL strict mode, too-long VARCHAR)
const SQLSTATE_DATA_TOO_LONG: &str = "22001";

/// SQLSTATE class for integrity constraint violations
const SQLSTATE_INTEGRITY_CLASS: &str = "23";

/// MySQL reports SQLSTATE codes; other engines use their own numbering and
/// are classified by `kind()` alone.
#[cfg(feature = "networked")]
fn is_mysql_constraint(database_error: &dyn sqlx::error::DatabaseError) -> bool {
    database_error
        .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
        .and_then(|mysql_error| mysql_error.code())
        .is_some_and(|code| code == SQLSTATE_DATA_TOO_LONG || code.starts_with(SQLSTATE_INTEGRITY_CLASS))
}

#[cfg(not(feature = "networked"))]
fn is_mysql_constraint(_database_error: &dyn sqlx::error::DatabaseError) -> bool {
    false
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(database_error) => {
                let is_constraint = !matches!(database_error.kind(), sqlx::error::ErrorKind::Other)
                    || is_mysql_constraint(&**database_error);

                if is_constraint {
                    Error::ConstraintViolation(database_error.message().to_string())
                } else {
                    Error::Backend(error.to_string())
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Error::Connection(error.to_string()),
            _ => Error::Backend(error.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
