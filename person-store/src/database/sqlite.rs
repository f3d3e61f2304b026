//! SQLite backend implementation

use crate::config::BackendKind;
use crate::database::traits::{Backend, CONNECTION_CLOSED};
use crate::person::Person;
use crate::schema::{ColumnKind, ColumnSpec, TableSpec, PERSON_TABLE};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::str::FromStr;
use tokio::sync::Mutex;

/// Path that selects a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Embedded SQLite backend holding at most one connection
///
/// An in-memory database only lives as long as its connection: closing the
/// backend discards its contents.
pub struct SqliteBackend {
    path: String,
    connection: Mutex<Option<SqliteConnection>>,
}

impl SqliteBackend {
    /// Create a closed SQLite backend
    ///
    /// # Arguments
    ///
    /// * `path` - Database file, created on first connect, or `":memory:"`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            connection: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions> {
        if self.path == MEMORY_PATH {
            return Ok(SqliteConnectOptions::from_str("sqlite::memory:")?);
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true))
    }

    /// Quote an identifier (table or column name) to prevent SQL injection
    ///
    /// SQLite uses double quotes for identifiers. This function escapes any
    /// double quotes in the identifier by doubling them.
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn column_definition(column: &ColumnSpec) -> String {
        let name = Self::quote_identifier(column.name);
        match column.kind {
            ColumnKind::Text { max_length } => format!(
                "{} VARCHAR({}) NOT NULL CHECK (length({}) <= {})",
                name, max_length, name, max_length
            ),
            ColumnKind::Integer => format!("{} INTEGER NOT NULL", name),
        }
    }

    /// Build the `CREATE TABLE` statement for a table spec
    fn create_table_sql(table: &TableSpec) -> String {
        let mut definitions = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            Self::quote_identifier("id")
        )];
        definitions.extend(table.columns.iter().map(Self::column_definition));

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            Self::quote_identifier(table.name),
            definitions.join(", ")
        )
    }

    /// Build one `CREATE INDEX` statement per indexed column
    fn create_index_sql(table: &TableSpec) -> Vec<String> {
        table
            .indexed_columns()
            .map(|column| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    Self::quote_identifier(&table.index_name(column)),
                    Self::quote_identifier(table.name),
                    Self::quote_identifier(column.name)
                )
            })
            .collect()
    }

    fn row_to_person(row: &SqliteRow) -> Result<Person> {
        Ok(Person {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            age: row.try_get("age")?,
        })
    }
}

/// Borrow the open connection or fail with a connection error
fn open_connection(slot: &mut Option<SqliteConnection>) -> Result<&mut SqliteConnection> {
    slot.as_mut()
        .ok_or_else(|| Error::Connection(CONNECTION_CLOSED.to_string()))
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    async fn connect(&self) -> Result<()> {
        let mut slot = self.connection.lock().await;
        if slot.is_some() {
            return Err(Error::Connection("connection already open".to_string()));
        }

        let connection = self
            .connect_options()?
            .connect()
            .await
            .map_err(|error| Error::Connection(error.to_string()))?;

        tracing::debug!(path = %self.path, "sqlite connection opened");
        *slot = Some(connection);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let connection = self.connection.lock().await.take();

        if let Some(connection) = connection {
            connection
                .close()
                .await
                .map_err(|error| Error::Connection(error.to_string()))?;
            tracing::debug!(path = %self.path, "sqlite connection closed");
        }

        Ok(())
    }

    async fn is_closed(&self) -> bool {
        self.connection.lock().await.is_none()
    }

    async fn create_tables(&self, tables: &[TableSpec]) -> Result<()> {
        let mut slot = self.connection.lock().await;
        let connection = open_connection(&mut slot)?;

        for table in tables {
            sqlx::query(&Self::create_table_sql(table))
                .execute(&mut *connection)
                .await?;

            for statement in Self::create_index_sql(table) {
                sqlx::query(&statement).execute(&mut *connection).await?;
            }
        }

        Ok(())
    }

    async fn table_exists(&self, table: &TableSpec) -> Result<bool> {
        let mut slot = self.connection.lock().await;
        let connection = open_connection(&mut slot)?;

        let table_exists: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?",
        )
        .bind(table.name)
        .fetch_optional(&mut *connection)
        .await?;

        Ok(table_exists.is_some())
    }

    async fn insert_person(&self, name: &str, age: i32) -> Result<Person> {
        let mut slot = self.connection.lock().await;
        let connection = open_connection(&mut slot)?;

        let insert_query = format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            Self::quote_identifier(PERSON_TABLE.name),
            Self::quote_identifier("name"),
            Self::quote_identifier("age")
        );

        let result = sqlx::query(&insert_query)
            .bind(name)
            .bind(age)
            .execute(&mut *connection)
            .await?;

        Ok(Person {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            age,
        })
    }

    async fn select_people(&self) -> Result<Vec<Person>> {
        let mut slot = self.connection.lock().await;
        let connection = open_connection(&mut slot)?;

        let select_query = format!(
            "SELECT {}, {}, {} FROM {}",
            Self::quote_identifier("id"),
            Self::quote_identifier("name"),
            Self::quote_identifier("age"),
            Self::quote_identifier(PERSON_TABLE.name)
        );

        let rows = sqlx::query(&select_query)
            .fetch_all(&mut *connection)
            .await?;

        rows.iter().map(Self::row_to_person).collect()
    }
}
