//! Backend configuration
//!
//! Turns a backend kind tag plus keyword options into a concrete backend and
//! installs it into a [`DatabaseProxy`]. Backends are always built with the
//! connection closed; only explicit `connect` calls (usually made by
//! [`crate::with_database`]) open one.

use crate::database::traits::Backend;
use crate::proxy::DatabaseProxy;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Keyword options passed to [`configure`]
///
/// Keys a backend does not recognize are ignored.
pub type Options = serde_json::Map<String, Value>;

/// Supported storage engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// File-backed SQLite
    Embedded,

    /// MySQL server reached over the network
    Networked,
}

impl BackendKind {
    /// Every valid kind, in the order they are listed in error messages
    pub const ALL: [BackendKind; 2] = [BackendKind::Embedded, BackendKind::Networked];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Embedded => "embedded",
            BackendKind::Networked => "networked",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(kind: &str) -> Result<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "embedded" | "sqlite" => Ok(BackendKind::Embedded),
            "networked" | "mysql" => Ok(BackendKind::Networked),
            _ => {
                let valid: Vec<&str> = BackendKind::ALL.iter().map(BackendKind::as_str).collect();
                Err(Error::InvalidConfiguration(format!(
                    "unknown backend kind '{}'; expected one of: {}",
                    kind,
                    valid.join(", ")
                )))
            }
        }
    }
}

/// Options recognized by the embedded backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmbeddedOptions {
    /// Database file; `":memory:"` selects a private in-memory database
    #[serde(alias = "database")]
    pub path: String,
}

impl Default for EmbeddedOptions {
    fn default() -> Self {
        Self {
            path: "app.db".to_string(),
        }
    }
}

/// Options recognized by the networked backend
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkedOptions {
    pub database: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl Default for NetworkedOptions {
    fn default() -> Self {
        Self {
            database: "test_db".to_string(),
            user: "root".to_string(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 3306,
        }
    }
}

impl fmt::Debug for NetworkedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkedOptions")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Fully resolved backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Embedded(EmbeddedOptions),
    Networked(NetworkedOptions),
}

impl BackendConfig {
    /// Resolve a kind tag and keyword options, applying defaults
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] for an unknown kind or an option of
    /// the wrong type.
    pub fn from_options(kind: &str, options: Options) -> Result<Self> {
        let kind: BackendKind = kind.parse()?;
        let options = Value::Object(options);

        let invalid = |error: serde_json::Error| {
            Error::InvalidConfiguration(format!("invalid {} options: {}", kind, error))
        };

        match kind {
            BackendKind::Embedded => serde_json::from_value(options)
                .map(BackendConfig::Embedded)
                .map_err(invalid),
            BackendKind::Networked => serde_json::from_value(options)
                .map(BackendConfig::Networked)
                .map_err(invalid),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Embedded(_) => BackendKind::Embedded,
            BackendConfig::Networked(_) => BackendKind::Networked,
        }
    }

    /// Build the backend without connecting it
    pub fn build(&self) -> Result<Arc<dyn Backend>> {
        match self {
            #[cfg(feature = "embedded")]
            BackendConfig::Embedded(options) => Ok(Arc::new(
                crate::database::sqlite::SqliteBackend::new(options.path.as_str()),
            )),
            #[cfg(feature = "networked")]
            BackendConfig::Networked(options) => {
                Ok(Arc::new(crate::database::mysql::MySqlBackend::new(options)))
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::InvalidConfiguration(format!(
                "backend kind '{}' is not enabled in this build",
                other.kind()
            ))),
        }
    }
}

/// Configure the database behind `proxy`
///
/// # Arguments
///
/// * `proxy` - Proxy that receives the new backend
/// * `kind` - `"embedded"` (alias `"sqlite"`) or `"networked"` (alias `"mysql"`)
/// * `options` - Keyword options; see [`EmbeddedOptions`] and [`NetworkedOptions`]
///
/// # Returns
///
/// The installed backend, for diagnostics. On error the proxy is left
/// untouched.
pub fn configure(proxy: &DatabaseProxy, kind: &str, options: Options) -> Result<Arc<dyn Backend>> {
    let config = BackendConfig::from_options(kind, options)?;
    configure_with(proxy, config)
}

/// Typed counterpart of [`configure`]
pub fn configure_with(proxy: &DatabaseProxy, config: BackendConfig) -> Result<Arc<dyn Backend>> {
    let backend = config.build()?;
    proxy.initialize(backend.clone());

    match &config {
        BackendConfig::Embedded(options) => {
            tracing::info!(kind = %config.kind(), path = %options.path, "database configured");
        }
        BackendConfig::Networked(options) => {
            tracing::info!(
                kind = %config.kind(),
                host = %options.host,
                port = options.port,
                database = %options.database,
                "database configured"
            );
        }
    }

    Ok(backend)
}
