//! Remember-me token sets.
//!
//! Tokens are single-use: a successful [`TokenSet::consume`] removes exactly
//! one matching entry. Only SHA-256 digests are held, never the tokens
//! themselves.

use std::fmt;

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::StoreResult;
use crate::error::StoreError;

/// Per-key collections of single-use tokens.
///
/// A key's collection is created on the first [`add`](Self::add) and
/// dropped by [`remove_all`](Self::remove_all) or when its last token is
/// consumed. Every operation on a key runs under that key's shard lock, so
/// concurrent consumers of one token cannot both succeed.
#[derive(Default)]
pub struct TokenSet {
    tokens: DashMap<String, Vec<String>>,
}

impl TokenSet {
    /// Creates an empty token set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `token` to the collection for `key`.
    ///
    /// Adding the same token twice stores two independently consumable copies.
    pub fn add(&self, key: &str, token: &str) {
        self.tokens
            .entry(key.to_string())
            .or_default()
            .push(hash_token(token));
    }

    /// Drops every token for `key`, returning how many were removed.
    pub fn remove_all(&self, key: &str) -> usize {
        self.tokens
            .remove(key)
            .map_or(0, |(_, tokens)| tokens.len())
    }

    /// Consumes one copy of `token` for `key`.
    ///
    /// The matched entry is swap-removed, so the order of the remaining
    /// tokens is not preserved.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TokenNotFound` if `key` has no tokens or none
    /// of them matches.
    pub fn consume(&self, key: &str, token: &str) -> StoreResult<()> {
        let digest = hash_token(token);

        let emptied = {
            let mut tokens = self.tokens.get_mut(key).ok_or(StoreError::TokenNotFound)?;
            let position = tokens
                .iter()
                .position(|stored| *stored == digest)
                .ok_or(StoreError::TokenNotFound)?;
            tokens.swap_remove(position);
            tokens.is_empty()
        };

        if emptied {
            self.tokens.remove_if(key, |_, tokens| tokens.is_empty());
        }

        Ok(())
    }

    /// Number of live tokens for `key`.
    #[must_use]
    pub fn count(&self, key: &str) -> usize {
        self.tokens.get(key).map_or(0, |tokens| tokens.len())
    }

    /// Number of keys holding at least one token.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.tokens.len()
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("keys", &self.tokens.len())
            .finish_non_exhaustive()
    }
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
