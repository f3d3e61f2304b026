//! Backend trait
//!
//! This trait defines the interface that every storage engine must provide.

use crate::config::BackendKind;
use crate::person::Person;
use crate::schema::TableSpec;
use crate::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Message carried by [`crate::Error::Connection`] when a data operation is
/// attempted without an open connection.
pub(crate) const CONNECTION_CLOSED: &str = "database connection is closed";

/// Storage backend with an explicit connection lifecycle
///
/// A backend holds at most one physical connection. It never opens that
/// connection on its own: every data operation fails with
/// [`crate::Error::Connection`] until [`Backend::connect`] has been called.
#[async_trait]
pub trait Backend: Debug + Send + Sync + 'static {
    /// The engine behind this backend
    fn kind(&self) -> BackendKind;

    /// Open the physical connection
    ///
    /// Fails if a connection is already open.
    async fn connect(&self) -> Result<()>;

    /// Close the physical connection
    ///
    /// Closing an already closed backend is a no-op.
    async fn close(&self) -> Result<()>;

    /// Whether no connection is currently open
    async fn is_closed(&self) -> bool;

    /// Create every table (and its indexes) that does not exist yet
    ///
    /// # Arguments
    ///
    /// * `tables` - Table definitions to create
    async fn create_tables(&self, tables: &[TableSpec]) -> Result<()>;

    /// Check whether a table exists in the connected database
    async fn table_exists(&self, table: &TableSpec) -> Result<bool>;

    /// Insert a person and return it with its assigned identifier
    ///
    /// Field constraints (e.g. name length) are enforced by the database.
    async fn insert_person(&self, name: &str, age: i32) -> Result<Person>;

    /// Fetch every person in the backend's natural order
    async fn select_people(&self) -> Result<Vec<Person>>;
}
