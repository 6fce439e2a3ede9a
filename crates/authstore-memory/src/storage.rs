use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use authstore_storage::{
    Attributes, BindMode, StoreError, StoreResult, TokenSet, User, UserStorer,
};
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::index::ReverseIndex;
use crate::options::{LookupStrategy, MemoryOptions};

/// Key of the seeded demo account.
pub const DEMO_ACCOUNT_KEY: &str = "zeratul@heroes.com";

// bcrypt, cost 10, password "1234"
const DEMO_PASSWORD_HASH: &str = "$2a$10$XtW/BrS5HeYIuOCXYe8DFuInetDMdaarMUJEOg/VA/JAIDgw3l4aG";

fn demo_account() -> User {
    User {
        name: Some("Zeratul".to_string()),
        email: Some(DEMO_ACCOUNT_KEY.to_string()),
        password: Some(DEMO_PASSWORD_HASH.to_string()),
        confirmed: true,
        ..User::new(DEMO_ACCOUNT_KEY)
    }
}

#[derive(Debug, Clone, Copy)]
enum TokenField {
    Confirm,
    Recover,
}

impl TokenField {
    fn of(self, user: &User) -> Option<&str> {
        match self {
            Self::Confirm => user.confirm_token.as_deref(),
            Self::Recover => user.recover_token.as_deref(),
        }
    }
}

/// Records in insertion order. Ids are handed out on insertion and kept on
/// replacement, so iteration order is also id order.
#[derive(Default)]
struct Records {
    users: IndexMap<String, User>,
    by_confirm_token: ReverseIndex,
    by_recover_token: ReverseIndex,
}

// Reports sizes only; the indexes are keyed by live tokens.
impl fmt::Debug for Records {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Records")
            .field("users", &self.users.len())
            .field("by_confirm_token", &self.by_confirm_token)
            .field("by_recover_token", &self.by_recover_token)
            .finish()
    }
}

impl Records {
    fn index(&self, field: TokenField) -> &ReverseIndex {
        match field {
            TokenField::Confirm => &self.by_confirm_token,
            TokenField::Recover => &self.by_recover_token,
        }
    }

    fn store(&mut self, user: User, lookup: LookupStrategy) {
        if lookup == LookupStrategy::Indexed {
            if let Some(old) = self.users.get(&user.key) {
                self.by_confirm_token
                    .remove(old.confirm_token.as_deref(), old.id);
                self.by_recover_token
                    .remove(old.recover_token.as_deref(), old.id);
            }
            self.by_confirm_token
                .insert(user.confirm_token.as_deref(), user.id, &user.key);
            self.by_recover_token
                .insert(user.recover_token.as_deref(), user.id, &user.key);
        }
        self.users.insert(user.key.clone(), user);
    }

    fn find_by_token(&self, field: TokenField, token: &str, lookup: LookupStrategy) -> Option<&User> {
        match lookup {
            LookupStrategy::Scan => self
                .users
                .values()
                .find(|user| field.of(user) == Some(token)),
            LookupStrategy::Indexed => self
                .index(field)
                .first(token)
                .and_then(|key| self.users.get(key)),
        }
    }
}

/// In-memory credential storage backend.
///
/// Intended for tests and local development: nothing survives the process.
/// Records and reverse indexes sit behind one `RwLock`, tokens in a
/// [`TokenSet`], and ids come from a counter owned by this instance.
#[derive(Debug)]
pub struct MemoryUserStorer {
    records: RwLock<Records>,
    tokens: TokenSet,
    next_id: AtomicI64,
    lookup: LookupStrategy,
}

impl MemoryUserStorer {
    /// Creates a storer seeded with the demo account.
    pub fn new() -> Self {
        Self::with_options(MemoryOptions::default())
    }

    /// Creates a storer with no records.
    pub fn empty() -> Self {
        Self::with_options(MemoryOptions {
            seed_demo_account: false,
            ..MemoryOptions::default()
        })
    }

    /// Creates a storer with the given options.
    pub fn with_options(options: MemoryOptions) -> Self {
        let mut storer = Self {
            records: RwLock::new(Records::default()),
            tokens: TokenSet::new(),
            next_id: AtomicI64::new(1),
            lookup: options.lookup,
        };

        if options.seed_demo_account {
            let mut demo = demo_account();
            demo.id = storer.next_id();
            let lookup = storer.lookup;
            storer.records.get_mut().store(demo, lookup);
        }

        storer
    }

    /// The reverse-lookup strategy in use.
    pub fn lookup_strategy(&self) -> LookupStrategy {
        self.lookup
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.users.is_empty()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn find_by_token(&self, field: TokenField, token: &str) -> StoreResult<User> {
        // An unset token field must not be addressable.
        if token.is_empty() {
            return Err(StoreError::UserNotFound);
        }

        let records = self.records.read().await;
        records
            .find_by_token(field, token, self.lookup)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }
}

impl Default for MemoryUserStorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStorer for MemoryUserStorer {
    async fn create(&self, key: &str, attributes: &Attributes) -> StoreResult<()> {
        let mut user = attributes.bind(BindMode::IgnoreUnknown)?;
        user.key = key.to_string();

        let mut records = self.records.write().await;
        if records.users.contains_key(key) {
            debug!(key, "create rejected, key already taken");
            return Err(StoreError::already_exists(key));
        }

        user.id = self.next_id();
        let id = user.id;
        records.store(user, self.lookup);
        debug!(key, id, "created user");
        Ok(())
    }

    async fn put(&self, key: &str, attributes: &Attributes) -> StoreResult<()> {
        let mut user = attributes.bind(BindMode::IgnoreUnknown)?;
        user.key = key.to_string();

        let mut records = self.records.write().await;
        let (id, created) = match records.users.get(key) {
            Some(existing) => (existing.id, false),
            None => (self.next_id(), true),
        };

        user.id = id;
        records.store(user, self.lookup);
        debug!(key, id, created, "stored user");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<User> {
        self.records
            .read()
            .await
            .users
            .get(key)
            .cloned()
            .ok_or(StoreError::UserNotFound)
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
        self.find_by_token(TokenField::Confirm, confirm_token).await
    }

    async fn recover_user(&self, recover_token: &str) -> StoreResult<User> {
        self.find_by_token(TokenField::Recover, recover_token).await
    }
}

// =============================================================================
// Tests
// =============================================================================
