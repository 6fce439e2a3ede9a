//! `UserStorer` over a users table.
//!
//! Records are durable; remember-me tokens are held in a process-local
//! [`TokenSet`] and do not survive a restart.

use async_trait::async_trait;
use authstore_storage::{
    Attributes, BindMode, StoreError, StoreResult, TokenSet, User, UserStorer,
};
use tracing::debug;

use crate::options::PostgresOptions;
use crate::table::{LookupColumn, PgUserTable, UserTable};

/// Relational credential storage backend.
#[derive(Debug)]
pub struct PostgresUserStorer<T = PgUserTable> {
    table: T,
    tokens: TokenSet,
}

impl PostgresUserStorer<PgUserTable> {
    /// Connects to PostgreSQL and builds a storer on the configured table.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the connection or schema setup fails.
    pub async fn connect(options: &PostgresOptions) -> StoreResult<Self> {
        Ok(Self::new(PgUserTable::connect(options).await?))
    }
}

impl<T: UserTable> PostgresUserStorer<T> {
    /// Creates a storer on an existing table handle.
    #[must_use]
    pub fn new(table: T) -> Self {
        Self {
            table,
            tokens: TokenSet::new(),
        }
    }

    /// Get a reference to the underlying table.
    #[must_use]
    pub fn table(&self) -> &T {
        &self.table
    }

    fn bind(key: &str, attributes: &Attributes) -> StoreResult<User> {
        let mut user = attributes.bind(BindMode::IgnoreUnknown)?;
        user.key = key.to_string();
        Ok(user)
    }

    async fn fetch(&self, column: LookupColumn, value: &str) -> StoreResult<User> {
        self.table
            .fetch_one(column, value)
            .await?
            .ok_or(StoreError::UserNotFound)
    }

    async fn fetch_by_token(&self, column: LookupColumn, token: &str) -> StoreResult<User> {
        // An unset token column must not be addressable.
        if token.is_empty() {
            return Err(StoreError::UserNotFound);
        }
        self.fetch(column, token).await
    }
}

#[async_trait]
impl<T: UserTable> UserStorer for PostgresUserStorer<T> {
    async fn create(&self, key: &str, attributes: &Attributes) -> StoreResult<()> {
        let user = Self::bind(key, attributes)?;
        self.table.insert(&user).await?;
        debug!(key, "created user");
        Ok(())
    }

    async fn put(&self, key: &str, attributes: &Attributes) -> StoreResult<()> {
        let user = Self::bind(key, attributes)?;
        self.table.upsert(&user).await?;
        debug!(key, "stored user");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<User> {
        self.fetch(LookupColumn::Key, key).await
    }

    async fn add_token(&self, key: &str, token: &str) -> StoreResult<()> {
        self.tokens.add(key, token);
        debug!(key, "added remember token");
        Ok(())
    }

    async fn del_tokens(&self, key: &str) -> StoreResult<()> {
        let removed = self.tokens.remove_all(key);
        debug!(key, removed, "revoked remember tokens");
        Ok(())
    }

    async fn use_token(&self, key: &str, token: &str) -> StoreResult<()> {
        let result = self.tokens.consume(key, token);
        if result.is_err() {
            debug!(key, "remember token rejected");
        }
        result
    }

    async fn confirm_user(&self, confirm_token: &str) -> StoreResult<User> {
        self.fetch_by_token(LookupColumn::ConfirmToken, confirm_token)
            .await
    }

    async fn recover_user(&self, recover_token: &str) -> StoreResult<User> {
        self.fetch_by_token(LookupColumn::RecoverToken, recover_token)
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================
