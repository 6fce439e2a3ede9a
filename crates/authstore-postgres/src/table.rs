//! Users table access.
//!
//! [`UserTable`] is the narrow capability the storer needs from the
//! database: write a full row, and read one row by exact match on a column.
//! [`PgUserTable`] implements it on a `sqlx` PostgreSQL pool.

use std::sync::Arc;

use async_trait::async_trait;
use authstore_storage::{StoreError, StoreResult, User, UserField};
use sqlx_core::pool::PoolOptions;
use sqlx_core::query::{Query, query};
use sqlx_core::row::Row;
use sqlx_postgres::{PgArguments, PgRow, Postgres};
use tracing::{debug, warn};

use crate::PgPool;
use crate::options::{PostgresOptions, redact_url};
use crate::schema::{Statements, create_table_statements, is_valid_table_name};

// =============================================================================
// Types
// =============================================================================

/// Columns a record can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupColumn {
    Key,
    ConfirmToken,
    RecoverToken,
}

impl LookupColumn {
    /// The record field behind this column.
    #[must_use]
    pub fn field(self) -> UserField {
        match self {
            Self::Key => UserField::Key,
            Self::ConfirmToken => UserField::ConfirmToken,
            Self::RecoverToken => UserField::RecoverToken,
        }
    }

    /// The value `user` holds in this column.
    #[must_use]
    pub fn value_of(self, user: &User) -> Option<&str> {
        match self {
            Self::Key => Some(user.key.as_str()),
            Self::ConfirmToken => user.confirm_token.as_deref(),
            Self::RecoverToken => user.recover_token.as_deref(),
        }
    }
}

/// Row-level access to the users table.
#[async_trait]
pub trait UserTable: Send + Sync {
    /// Inserts `user` as a new row. The table assigns `ID`.
    ///
    /// # Errors
    ///
    /// Returns `UserAlreadyExists` if the key is taken, `StorageFailure` on
    /// any other database error.
    async fn insert(&self, user: &User) -> StoreResult<()>;

    /// Inserts `user`, or replaces every column but `ID` of the row with the
    /// same key.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the database operation fails.
    async fn upsert(&self, user: &User) -> StoreResult<()>;

    /// Fetches the lowest-id row whose `column` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the database query fails. A missing row is
    /// `Ok(None)`.
    async fn fetch_one(&self, column: LookupColumn, value: &str) -> StoreResult<Option<User>>;
}

// =============================================================================
// PostgreSQL Table
// =============================================================================

/// Users table in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgUserTable {
    pool: Arc<PgPool>,
    table: String,
    statements: Arc<Statements>,
}

impl PgUserTable {
    /// Wraps an existing pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if `table` is not a plain SQL identifier.
    pub fn new(pool: Arc<PgPool>, table: &str) -> StoreResult<Self> {
        if !is_valid_table_name(table) {
            return Err(StoreError::storage(format!("invalid table name '{table}'")));
        }

        Ok(Self {
            pool,
            table: table.to_string(),
            statements: Arc::new(Statements::new(table)),
        })
    }

    /// Connects a new pool according to `options`.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the table name is invalid, the connection
    /// fails, or schema creation fails.
    pub async fn connect(options: &PostgresOptions) -> StoreResult<Self> {
        if !is_valid_table_name(&options.table) {
            return Err(StoreError::storage(format!(
                "invalid table name '{}'",
                options.table
            )));
        }

        let pool = PoolOptions::<Postgres>::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(&options.url)
            .await
            .map_err(storage_failure)?;
        debug!(url = %redact_url(&options.url), table = %options.table, "connected to postgres");

        let table = Self::new(Arc::new(pool), &options.table)?;
        if options.ensure_schema {
            table.ensure_schema().await?;
        }
        Ok(table)
    }

    /// Creates the users table and its token indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if a statement fails.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in create_table_statements(&self.table) {
            query(&statement)
                .execute(&*self.pool)
                .await
                .map_err(storage_failure)?;
        }
        debug!(table = %self.table, "users table ready");
        Ok(())
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Name of the users table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn select_statement(&self, column: LookupColumn) -> &str {
        match column {
            LookupColumn::Key => &self.statements.select_by_key,
            LookupColumn::ConfirmToken => &self.statements.select_by_confirm_token,
            LookupColumn::RecoverToken => &self.statements.select_by_recover_token,
        }
    }
}

#[async_trait]
impl UserTable for PgUserTable {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        bind_user(&self.statements.insert, user)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if let sqlx_core::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::already_exists(&user.key);
                }
                storage_failure(e)
            })?;
        Ok(())
    }

    async fn upsert(&self, user: &User) -> StoreResult<()> {
        bind_user(&self.statements.upsert, user)
            .execute(&*self.pool)
            .await
            .map_err(storage_failure)?;
        Ok(())
    }

    async fn fetch_one(&self, column: LookupColumn, value: &str) -> StoreResult<Option<User>> {
        let row: Option<PgRow> = query(self.select_statement(column))
            .bind(value)
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage_failure)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(storage_failure)
    }
}

/// Binds every writable column of `user`, in [`crate::schema`] column order.
fn bind_user<'q>(sql: &'q str, user: &'q User) -> Query<'q, Postgres, PgArguments> {
    query(sql)
        .bind(&user.key)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.oauth2_uid)
        .bind(&user.oauth2_provider)
        .bind(&user.oauth2_token)
        .bind(&user.oauth2_refresh)
        .bind(user.oauth2_expiry)
        .bind(&user.confirm_token)
        .bind(user.confirmed)
        .bind(user.attempt_number)
        .bind(user.attempt_time)
        .bind(user.locked)
        .bind(&user.recover_token)
        .bind(user.recover_token_expiry)
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx_core::Error> {
    Ok(User {
        id: row.try_get(UserField::Id.column())?,
        key: row.try_get(UserField::Key.column())?,
        name: row.try_get(UserField::Name.column())?,
        email: row.try_get(UserField::Email.column())?,
        password: row.try_get(UserField::Password.column())?,
        oauth2_uid: row.try_get(UserField::Oauth2Uid.column())?,
        oauth2_provider: row.try_get(UserField::Oauth2Provider.column())?,
        oauth2_token: row.try_get(UserField::Oauth2Token.column())?,
        oauth2_refresh: row.try_get(UserField::Oauth2Refresh.column())?,
        oauth2_expiry: row.try_get(UserField::Oauth2Expiry.column())?,
        confirm_token: row.try_get(UserField::ConfirmToken.column())?,
        confirmed: row.try_get(UserField::Confirmed.column())?,
        attempt_number: row.try_get(UserField::AttemptNumber.column())?,
        attempt_time: row.try_get(UserField::AttemptTime.column())?,
        locked: row.try_get(UserField::Locked.column())?,
        recover_token: row.try_get(UserField::RecoverToken.column())?,
        recover_token_expiry: row.try_get(UserField::RecoverTokenExpiry.column())?,
    })
}

/// Maps a driver error onto the storage taxonomy.
pub(crate) fn storage_failure(error: sqlx_core::Error) -> StoreError {
    warn!(error = %error, "postgres operation failed");
    StoreError::storage(error.to_string())
}
