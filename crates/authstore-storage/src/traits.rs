//! The storage contract every backend implements.

use async_trait::async_trait;

use crate::StoreResult;
use crate::attributes::Attributes;
use crate::user::User;

/// Builds the key of an OAuth2-originated account.
///
/// The uid and provider are concatenated without a delimiter, so
/// (`"ab"`, `"c"`) and (`"a"`, `"bc"`) address the same record.
#[must_use]
pub fn oauth_key(uid: &str, provider: &str) -> String {
    let mut key = String::with_capacity(uid.len() + provider.len());
    key.push_str(uid);
    key.push_str(provider);
    key
}

/// Storage operations for identity records and remember-me tokens.
///
/// Lookup misses are always `StoreError::UserNotFound` or
/// `StoreError::TokenNotFound`, whatever the backend.
///
/// # Example
///
/// ```ignore
/// use authstore_storage::{Attributes, UserStorer};
///
/// async fn register(storer: &dyn UserStorer) -> StoreResult<()> {
///     let attributes = Attributes::new()
///         .with("email", "a@b.com")
///         .with("password", hash);
///     storer.create("a@b.com", &attributes).await
/// }
/// ```
#[async_trait]
pub trait UserStorer: Send + Sync {
    /// Creates a new record under `key` from `attributes`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The attributes do not fit the record (`Validation`)
    /// - A record with `key` already exists (`UserAlreadyExists`)
    /// - The storage operation fails
    async fn create(&self, key: &str, attributes: &Attributes) -> StoreResult<()>;

    /// Creates or fully replaces the record under `key`.
    ///
    /// An existing record keeps its `id`; every other field is taken from
    /// `attributes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes do not fit the record or the
    /// storage operation fails.
    async fn put(&self, key: &str, attributes: &Attributes) -> StoreResult<()>;

    /// Finds the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no record has that key.
    async fn get(&self, key: &str) -> StoreResult<User>;

    /// Creates or replaces the record for an OAuth2 account.
    ///
    /// # Errors
    ///
    /// Same as [`put`](Self::put).
    async fn put_oauth(&self, uid: &str, provider: &str, attributes: &Attributes) -> StoreResult<()> {
        self.put(&oauth_key(uid, provider), attributes).await
    }

    /// Finds the record for an OAuth2 account.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no record has that key.
    async fn get_oauth(&self, uid: &str, provider: &str) -> StoreResult<User> {
        self.get(&oauth_key(uid, provider)).await
    }

    /// Adds a remember-me token for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add_token(&self, key: &str, token: &str) -> StoreResult<()>;

    /// Revokes every remember-me token for `key`. Succeeds when there are none.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn del_tokens(&self, key: &str) -> StoreResult<()>;

    /// Consumes one remember-me token for `key`.
    ///
    /// # Errors
    ///
    /// Returns `TokenNotFound` if the token was never issued for `key` or
    /// has already been used.
    async fn use_token(&self, key: &str, token: &str) -> StoreResult<()>;

    /// Finds the record whose confirmation token equals `confirm_token`.
    ///
    /// When several records share the token, the one with the lowest `id`
    /// is returned. The confirmation state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no record carries the token.
    async fn confirm_user(&self, confirm_token: &str) -> StoreResult<User>;

    /// Finds the record whose recovery token equals `recover_token`.
    ///
    /// Same resolution rules as [`confirm_user`](Self::confirm_user).
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no record carries the token.
    async fn recover_user(&self, recover_token: &str) -> StoreResult<User>;
}
