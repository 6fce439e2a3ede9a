//! In-memory credential storage backend for authstore.
//!
//! This crate provides an in-memory implementation of the `UserStorer`
//! trait from `authstore-storage`, for tests and local development.
//!
//! # Example
//!
//! ```ignore
//! use authstore_memory::MemoryUserStorer;
//! use authstore_storage::{Attributes, UserStorer};
//!
//! let storer = MemoryUserStorer::new();
//!
//! let attributes = Attributes::new()
//!     .with("email", "a@b.com")
//!     .with("confirm_token", "XYZ");
//! storer.create("a@b.com", &attributes).await?;
//! let user = storer.confirm_user("XYZ").await?;
//! ```

mod index;
mod options;
mod storage;

// Re-export the storer trait for convenience
pub use authstore_storage::{StoreError, User, UserStorer};

pub use options::{LookupStrategy, MemoryOptions};
pub use storage::{DEMO_ACCOUNT_KEY, MemoryUserStorer};

/// Creates a new in-memory storer behind the shared trait object type.
pub fn create_memory_storer(options: MemoryOptions) -> authstore_storage::DynUserStorer {
    std::sync::Arc::new(MemoryUserStorer::with_options(options))
}
