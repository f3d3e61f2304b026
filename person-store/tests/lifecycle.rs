//! End-to-end scenarios against the embedded backend

use async_trait::async_trait;
use person_store::{
    configure, create_tables_if_not_exist, with_database, Backend, BackendKind, DatabaseProxy,
    Error, Options, Person, Result, TableSpec,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts connects and closes on the way to the real backend
#[derive(Debug)]
struct Counted {
    inner: Arc<dyn Backend>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

#[async_trait]
impl Backend for Counted {
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

fn embedded(path: &str) -> Options {
    let mut options = Options::new();
    options.insert("path".to_string(), json!(path));
    options
}

/// Configure an in-memory database and wrap it in a counter
fn counted_memory_proxy() -> (DatabaseProxy, Arc<Counted>) {
    let proxy = DatabaseProxy::new();
    let inner = configure(&proxy, "embedded", embedded(":memory:")).unwrap();

    let counted = Arc::new(Counted {
        inner,
        connects: AtomicUsize::new(0),
        closes: AtomicUsize::new(0),
    });
    proxy.initialize(counted.clone());
    (proxy, counted)
}

fn pairs(people: &[Person]) -> Vec<(&str, i32)> {
    people.iter().map(|p| (p.name.as_str(), p.age)).collect()
}

#[tokio::test]
async fn create_and_list_in_memory() {
    let proxy = DatabaseProxy::new();
    configure(&proxy, "embedded", embedded(":memory:")).unwrap();

    // an in-memory database lives as long as its connection, so keep one
    // guarded call open around the whole scenario
    let (alice, bob, people) = with_database(&proxy, || async {
        create_tables_if_not_exist(&proxy).await?;
        let alice = Person::create(&proxy, "Alice", 25).await?;
        let bob = Person::create(&proxy, "Bob", 35).await?;
        let people = Person::list(&proxy).await?;
        Ok((alice, bob, people))
    })
    .await
    .unwrap();

    assert_eq!(pairs(&people), vec![("Alice", 25), ("Bob", 35)]);
    assert_ne!(alice.id, bob.id);
    assert_eq!(people, vec![alice, bob]);
    assert!(proxy.is_closed().await.unwrap());
}

#[tokio::test]
async fn nested_guards_share_one_connection() {
    let (proxy, counted) = counted_memory_proxy();

    let inner_function = || async {
        with_database(&proxy, || Person::create(&proxy, "Inner", 25)).await
    };

    let outer_function = || async {
        with_database(&proxy, || async {
            create_tables_if_not_exist(&proxy).await?;
            let outer = Person::create(&proxy, "Outer", 30).await?;
            let inner = inner_function().await?;
            let people = Person::list(&proxy).await?;
            Ok((outer, inner, people))
        })
        .await
    };

    assert!(proxy.is_closed().await.unwrap());
    let (outer, inner, people) = outer_function().await.unwrap();

    assert_eq!(counted.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counted.closes.load(Ordering::SeqCst), 1);
    assert_eq!(outer.name, "Outer");
    assert_eq!(inner.name, "Inner");
    assert_eq!(pairs(&people), vec![("Outer", 30), ("Inner", 25)]);
}

#[tokio::test]
async fn guarded_calls_on_open_connection_do_not_touch_it() {
    let (proxy, counted) = counted_memory_proxy();
    proxy.connect().await.unwrap();

    create_tables_if_not_exist(&proxy).await.unwrap();
    with_database(&proxy, || Person::create(&proxy, "Test Person", 40))
        .await
        .unwrap();
    let people = with_database(&proxy, || Person::list(&proxy)).await.unwrap();

    assert_eq!(pairs(&people), vec![("Test Person", 40)]);
    assert_eq!(counted.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counted.closes.load(Ordering::SeqCst), 0);
    assert!(!proxy.is_closed().await.unwrap());
}

#[tokio::test]
async fn file_backed_records_persist_across_guarded_calls() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("persons.db");

    let proxy = DatabaseProxy::new();
    configure(&proxy, "sqlite", embedded(&path.to_string_lossy())).unwrap();

    create_tables_if_not_exist(&proxy).await.unwrap();
    assert!(with_database(&proxy, || Person::list(&proxy)).await.unwrap().is_empty());

    for (name, age) in [("Ada", 36), ("Grace", 45), ("Linus", 28)] {
        with_database(&proxy, || Person::create(&proxy, name, age)).await.unwrap();
    }

    // bootstrap again against the populated file: no-op
    create_tables_if_not_exist(&proxy).await.unwrap();

    let people = with_database(&proxy, || Person::list(&proxy)).await.unwrap();
    assert_eq!(pairs(&people), vec![("Ada", 36), ("Grace", 45), ("Linus", 28)]);

    let ids: HashSet<i64> = people.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(proxy.is_closed().await.unwrap());
}

#[tokio::test]
async fn constraint_violation_surfaces_through_guard() {
    let proxy = DatabaseProxy::new();
    configure(&proxy, "embedded", embedded(":memory:")).unwrap();

    let result = with_database(&proxy, || async {
        create_tables_if_not_exist(&proxy).await?;
        Person::create(&proxy, &"x".repeat(101), 20).await
    })
    .await;

    assert!(matches!(result, Err(Error::ConstraintViolation(_))));
    assert!(proxy.is_closed().await.unwrap());
}

#[tokio::test]
async fn invalid_configuration_is_rejected() {
    let proxy = DatabaseProxy::new();

    let error = configure(&proxy, "invalid_type", Options::new()).unwrap_err();
    assert!(matches!(error, Error::InvalidConfiguration(_)));
    assert!(matches!(proxy.is_closed().await, Err(Error::NotConfigured)));
}
