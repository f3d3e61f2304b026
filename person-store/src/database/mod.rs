//! Database abstraction layer
//!
//! This module provides the backend interface the proxy dispatches through,
//! plus one implementation per supported engine.

pub mod traits;

#[cfg(feature = "embedded")]
pub mod sqlite;

#[cfg(feature = "networked")]
pub mod mysql;

// Re-export the main trait
pub use traits::Backend;
