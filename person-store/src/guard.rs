//! Reentrant connection guard
//!
//! [`with_database`] wraps an operation so that a connection is open while it
//! runs. Whoever observes the connection as closed on entry opens it and is
//! the only one allowed to close it again, which lets guarded operations nest
//! freely: only the outermost call touches the physical connection.
//!
//! There is no depth counter. If code inside a guarded call closes the
//! connection explicitly, the next guarded sibling sees it closed, reopens it
//! and closes it on its own exit, so a single outer call can then account for
//! more than one open/close pair.
//!
//! The read of `is_closed` and the following `connect`/`close` are not atomic.
//! Concurrent callers sharing one proxy would race; the guard is meant for a
//! single logical caller per proxy.

use crate::proxy::DatabaseProxy;
use crate::Result;
use std::future::Future;

/// Run `operation` with an open connection
///
/// 1. Read whether the proxy's connection is closed.
/// 2. If it was closed, open it.
/// 3. Run the operation.
/// 4. If this call opened the connection and it is still open, close it. This
///    happens whether the operation succeeded or failed.
///
/// The operation's result is returned unchanged. When both the operation and
/// the close fail, the operation's error is returned and the close failure is
/// logged.
///
/// # Errors
///
/// [`crate::Error::NotConfigured`] if no backend is installed (the operation
/// is not run), connection errors from opening or closing, or whatever the
/// operation itself returns.
///
/// # Example
///
/// ```rust,no_run
/// use person_store::{with_database, DatabaseProxy, Person};
///
/// # async fn example(proxy: &DatabaseProxy) -> person_store::Result<()> {
/// let person = with_database(proxy, || Person::create(proxy, "Alice", 25)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_database<F, Fut, T>(proxy: &DatabaseProxy, operation: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let was_closed = proxy.is_closed().await?;

    if was_closed {
        tracing::debug!("opening database connection");
        proxy.connect().await?;
    }

    let outcome = operation().await;

    if !was_closed || proxy.is_closed().await? {
        return outcome;
    }

    tracing::debug!("closing database connection");
    match (outcome, proxy.close().await) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(close_error)) => Err(close_error),
        (Err(error), Err(close_error)) => {
            tracing::warn!(error = %close_error, "failed to close connection after failed operation");
            Err(error)
        }
    }
}
