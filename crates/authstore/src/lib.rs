//! Credential storage for web authentication.
//!
//! Ties the storage contract and its backends together: loads
//! [`StoreConfig`], installs logging and opens the configured backend as a
//! [`DynUserStorer`].
//!
//! # Example
//!
//! ```ignore
//! use authstore::UserStorer;
//!
//! let (config, storer) = authstore::bootstrap(None).await?;
//! storer.add_token("a@b.com", &cookie_token).await?;
//! ```

pub mod config;
pub mod factory;
pub mod observability;

use std::path::Path;

pub use authstore_memory::{LookupStrategy, MemoryOptions, MemoryUserStorer};
pub use authstore_postgres::{PostgresOptions, PostgresUserStorer};
pub use authstore_storage::*;

pub use crate::config::{BackendKind, ConfigError, StoreConfig, load_config};
pub use factory::open_storer;

/// Errors raised by [`bootstrap`].
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(".env error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads `.env` and configuration, installs tracing at the configured level,
/// and opens the configured backend.
pub async fn bootstrap(
    path: Option<&Path>,
) -> Result<(StoreConfig, DynUserStorer), BootstrapError> {
    crate::config::load_dotenv()?;
    let cfg = load_config(path)?;
    observability::init_tracing_with_level(&cfg.logging.level);
    let storer = open_storer(&cfg).await?;
    Ok((cfg, storer))
}
