//! Table definitions and schema bootstrap
//!
//! Tables are declared once as static [`TableSpec`]s; each backend renders
//! them into its own DDL dialect.

use crate::guard::with_database;
use crate::proxy::DatabaseProxy;
use crate::Result;

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Bounded-length string
    Text { max_length: usize },

    /// 32-bit signed integer
    Integer,
}

/// A single user-declared column
///
/// The auto-assigned `id` primary key is implicit and not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub indexed: bool,
}

/// A table declared by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    /// Columns that get a secondary index
    pub fn indexed_columns(&self) -> impl Iterator<Item = &ColumnSpec> + '_ {
        self.columns.iter().filter(|column| column.indexed)
    }

    /// Name of the index created for `column`, e.g. `person_name`
    pub fn index_name(&self, column: &ColumnSpec) -> String {
        format!("{}_{}", self.name, column.name)
    }
}

/// Maximum length of a person's name, in characters
pub const NAME_MAX_LENGTH: usize = 100;

pub const PERSON_TABLE: TableSpec = TableSpec {
    name: "person",
    columns: &[
        ColumnSpec {
            name: "name",
            kind: ColumnKind::Text {
                max_length: NAME_MAX_LENGTH,
            },
            indexed: true,
        },
        ColumnSpec {
            name: "age",
            kind: ColumnKind::Integer,
            indexed: false,
        },
    ],
};

/// Every table the application needs, in creation order
pub const TABLES: &[TableSpec] = &[PERSON_TABLE];

/// Create all declared tables unless they already exist
///
/// Runs inside [`with_database`], so it can be called with the connection
/// open or closed. When every table is already present this is a single
/// existence check per table and no DDL is issued.
pub async fn create_tables_if_not_exist(proxy: &DatabaseProxy) -> Result<()> {
    with_database(proxy, || async {
        for table in TABLES {
            if !proxy.table_exists(table).await? {
                tracing::info!(table = table.name, "creating missing tables");
                return proxy.create_tables(TABLES).await;
            }
        }

        tracing::debug!("all tables present");
        Ok(())
    })
    .await
}
