//! Deferred database handle
//!
//! [`DatabaseProxy`] starts out empty and receives its concrete backend at
//! configuration time. Everything that touches the database goes through
//! whichever backend is installed at the moment of the call.

use crate::database::traits::Backend;
use crate::schema::TableSpec;
use crate::{Error, Result};
use std::sync::{Arc, PoisonError, RwLock};

/// Late-bound handle to the active backend
///
/// The proxy does not serialize callers: reconfiguring while operations are
/// in flight is unsupported, and the connection guard assumes one logical
/// caller at a time.
#[derive(Default)]
pub struct DatabaseProxy {
    backend: RwLock<Option<Arc<dyn Backend>>>,
}

impl DatabaseProxy {
    /// Create an empty proxy with no backend installed
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `backend`, replacing any previously installed one
    pub fn initialize(&self, backend: Arc<dyn Backend>) {
        let mut slot = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.as_ref() {
            tracing::debug!(previous = %previous.kind(), next = %backend.kind(), "replacing backend");
        }
        *slot = Some(backend);
    }

    /// Whether a backend has been installed
    pub fn is_initialized(&self) -> bool {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The currently installed backend
    ///
    /// # Errors
    ///
    /// [`Error::NotConfigured`] if nothing has been installed yet.
    pub fn backend(&self) -> Result<Arc<dyn Backend>> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotConfigured)
    }

    pub async fn is_closed(&self) -> Result<bool> {
        Ok(self.backend()?.is_closed().await)
    }

    pub async fn connect(&self) -> Result<()> {
        self.backend()?.connect().await
    }

    pub async fn close(&self) -> Result<()> {
        self.backend()?.close().await
    }

    pub async fn create_tables(&self, tables: &[TableSpec]) -> Result<()> {
        self.backend()?.create_tables(tables).await
    }

    pub async fn table_exists(&self, table: &TableSpec) -> Result<bool> {
        self.backend()?.table_exists(table).await
    }
}

impl std::fmt::Debug for DatabaseProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = self
            .backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|backend| backend.kind());
        f.debug_struct("DatabaseProxy").field("backend", &kind).finish()
    }
}
