//! MySQL backend implementation

use crate::config::{BackendKind, NetworkedOptions};
use crate::database::traits::{Backend, CONNECTION_CLOSED};
use crate::person::Person;
use crate::schema::{ColumnKind, ColumnSpec, TableSpec, PERSON_TABLE};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{ConnectOptions, Connection, Row};
use tokio::sync::Mutex;

/// Networked MySQL backend holding at most one connection
pub struct MySqlBackend {
    options: NetworkedOptions,
    connection: Mutex<Option<MySqlConnection>>,
}

impl MySqlBackend {
    /// Create a closed MySQL backend; nothing is sent over the network yet
    pub fn new(options: &NetworkedOptions) -> Self {
        Self {
            options: options.clone(),
            connection: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &NetworkedOptions {
        &self.options
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.options.host)
            .port(self.options.port)
            .username(&self.options.user)
            .password(&self.options.password)
            .database(&self.options.database)
    }

    /// Quote an identifier with backticks, doubling embedded backticks
    fn quote_identifier(identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    fn column_definition(column: &ColumnSpec) -> String {
        let name = Self::quote_identifier(column.name);
        match column.kind {
            ColumnKind::Text { max_length } => format!("{} VARCHAR({}) NOT NULL", name, max_length),
            ColumnKind::Integer => format!("{} INT NOT NULL", name),
        }
    }

    /// Build the `CREATE TABLE` statement, indexes inline
    ///
    /// MySQL has no `CREATE INDEX IF NOT EXISTS`, so indexes are declared as
    /// part of the table.
    fn create_table_sql(table: &TableSpec) -> String {
        let mut definitions = vec![format!(
            "{} INT NOT NULL AUTO_INCREMENT PRIMARY KEY",
            Self::quote_identifier("id")
        )];
        definitions.extend(table.columns.iter().map(Self::column_definition));
        definitions.extend(table.indexed_columns().map(|column| {
            format!(
                "INDEX {} ({})",
                Self::quote_identifier(&table.index_name(column)),
                Self::quote_identifier(column.name)
            )
        }));

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            Self::quote_identifier(table.name),
            definitions.join(", ")
        )
    }

    fn row_to_person(row: &MySqlRow) -> Result<Person> {
        Ok(Person {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            age: row.try_get("age")?,
        })
    }
}

fn open_connection(slot: &mut Option<MySqlConnection>) -> Result<&mut MySqlConnection> {
    slot.as_mut()
        .ok_or_else(|| Error::Connection(CONNECTION_CLOSED.to_string()))
}

impl std::fmt::Debug for MySqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlBackend")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Networked
    }

    async fn connect(&self) -> Result<()> {
        let mut slot = self.connection.lock().await;
        if slot.is_some() {
            return Err(Error::Connection("connection already open".to_string()));
        }

        let connection = self
            .connect_options()
            .connect()
            .await
            .map_err(|error| Error::Connection(error.to_string()))?;

        tracing::debug!(
            host = %self.options.host,
            port = self.options.port,
            database = %self.options.database,
            "mysql connection opened"
        );
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
            tracing::debug!(host = %self.options.host, "mysql connection closed");
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
        }

        Ok(())
    }

    async fn table_exists(&self, table: &TableSpec) -> Result<bool> {
        let mut slot = self.connection.lock().await;
        let connection = open_connection(&mut slot)?;

        let table_exists: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?",
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

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| Error::Backend("assigned id does not fit in i64".to_string()))?;

        Ok(Person {
            id,
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
