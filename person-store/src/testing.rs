//! Test helpers shared by the unit tests

use crate::config::BackendKind;
use crate::database::sqlite::SqliteBackend;
use crate::database::traits::Backend;
use crate::person::Person;
use crate::proxy::DatabaseProxy;
use crate::schema::TableSpec;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Private in-memory SQLite backend, closed
pub(crate) fn memory_backend() -> Arc<dyn Backend> {
    Arc::new(SqliteBackend::new(":memory:"))
}

/// File-backed SQLite backend inside `directory`, closed
pub(crate) fn file_backend(directory: &tempfile::TempDir) -> Arc<dyn Backend> {
    let path = directory.path().join("persons.db");
    Arc::new(SqliteBackend::new(path.to_string_lossy()))
}

/// Wrap `inner` in a [`CountingBackend`] and install it into a fresh proxy
pub(crate) fn counting_backend(inner: Arc<dyn Backend>) -> (DatabaseProxy, Arc<CountingBackend>) {
    let backend = Arc::new(CountingBackend::new(inner));
    let proxy = DatabaseProxy::new();
    proxy.initialize(backend.clone());
    (proxy, backend)
}

/// Delegating backend that counts lifecycle and DDL calls
#[derive(Debug)]
pub(crate) struct CountingBackend {
    inner: Arc<dyn Backend>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    creates: AtomicUsize,
}

impl CountingBackend {
    pub(crate) fn new(inner: Arc<dyn Backend>) -> Self {
        Self {
            inner,
            connects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for CountingBackend {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.connect().await
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }

    async fn is_closed(&self) -> bool {
        self.inner.is_closed().await
    }

    async fn create_tables(&self, tables: &[TableSpec]) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_tables(tables).await
    }

    async fn table_exists(&self, table: &TableSpec) -> Result<bool> {
        self.inner.table_exists(table).await
    }

    async fn insert_person(&self, name: &str, age: i32) -> Result<Person> {
        self.inner.insert_person(name, age).await
    }

    async fn select_people(&self) -> Result<Vec<Person>> {
        self.inner.select_people().await
    }
}
