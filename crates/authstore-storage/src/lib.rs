//! # authstore-storage
//!
//! Credential storage contract for the authstore workspace.
//!
//! This crate defines the identity record, the attribute bag used to build
//! it, the remember-me token set and the [`UserStorer`] trait. It contains
//! no backend; see `authstore-memory` and `authstore-postgres`.
//!
//! ## Example
//!
//! ```ignore
//! use authstore_storage::{Attributes, StoreError, UserStorer};
//!
//! async fn login_with_cookie(storer: &dyn UserStorer, key: &str, token: &str) -> bool {
//!     match storer.use_token(key, token).await {
//!         Ok(()) => true,
//!         Err(StoreError::TokenNotFound) => false,
//!         Err(e) => {
//!             tracing::warn!(category = %e.category(), "remember-me lookup failed");
//!             false
//!         }
//!     }
//! }
//! ```

mod attributes;
mod error;
mod token;
mod traits;
mod user;

pub use attributes::{AttributeValue, Attributes, BindMode};
pub use error::{ErrorCategory, FieldError, StoreError};
pub use token::TokenSet;
pub use traits::{UserStorer, oauth_key};
pub use user::{User, UserField};

/// Type alias for a storage result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shareable storer trait object.
pub type DynUserStorer = std::sync::Arc<dyn UserStorer>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use authstore_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::attributes::{AttributeValue, Attributes, BindMode};
    pub use crate::error::{ErrorCategory, FieldError, StoreError};
    pub use crate::traits::{UserStorer, oauth_key};
    pub use crate::user::{User, UserField};
    pub use crate::{DynUserStorer, StoreResult};
}
