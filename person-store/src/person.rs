//! The `Person` record
//!
//! Persistence goes through whichever backend the proxy holds. These
//! operations never open a connection themselves; wrap them in
//! [`crate::with_database`].

use crate::proxy::DatabaseProxy;
use crate::Result;
use serde::Serialize;

/// A stored person
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    /// Identifier assigned by the backend on insert
    pub id: i64,

    /// Name, at most [`crate::schema::NAME_MAX_LENGTH`] characters
    pub name: String,

    pub age: i32,
}

impl Person {
    /// Insert a new person and return it with its assigned id
    ///
    /// No validation happens here; the backend rejects names that are too
    /// long with [`crate::Error::ConstraintViolation`].
    pub async fn create(proxy: &DatabaseProxy, name: &str, age: i32) -> Result<Person> {
        let person = proxy.backend()?.insert_person(name, age).await?;
        tracing::debug!(id = person.id, "person created");
        Ok(person)
    }

    /// All stored people, in the backend's natural order
    ///
    /// Returns an empty vector when there are none.
    pub async fn list(proxy: &DatabaseProxy) -> Result<Vec<Person>> {
        proxy.backend()?.select_people().await
    }
}
