use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Token -> records carrying it, ordered by id.
#[derive(Default)]
pub(crate) struct ReverseIndex {
    entries: HashMap<String, BTreeMap<i64, String>>,
}

impl ReverseIndex {
    pub(crate) fn insert(&mut self, token: Option<&str>, id: i64, key: &str) {
        if let Some(token) = token {
            self.entries
                .entry(token.to_string())
                .or_default()
                .insert(id, key.to_string());
        }
    }

    pub(crate) fn remove(&mut self, token: Option<&str>, id: i64) {
        let Some(token) = token else {
            return;
        };
        if let Some(holders) = self.entries.get_mut(token) {
            holders.remove(&id);
            if holders.is_empty() {
                self.entries.remove(token);
            }
        }
    }

    /// Key of the lowest-id record carrying `token`.
    pub(crate) fn first(&self, token: &str) -> Option<&str> {
        self.entries
            .get(token)
            .and_then(|holders| holders.first_key_value())
            .map(|(_, key)| key.as_str())
    }

    /// Number of distinct tokens indexed.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

// Keys are live tokens.
impl fmt::Debug for ReverseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseIndex")
            .field("tokens", &self.entries.len())
            .finish()
    }
}
