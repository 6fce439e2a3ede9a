use serde::{Deserialize, Serialize};

/// How confirm and recover tokens are resolved back to a record.
///
/// Both strategies return the same record: the lowest-id match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStrategy {
    /// Linear pass over every record, O(n) per lookup. Fine at test/demo scale.
    #[default]
    Scan,
    /// Hash indexes on both token fields, maintained on every write.
    Indexed,
}

/// Options for the in-memory backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryOptions {
    /// Seed the demo account (`zeratul@heroes.com`) on construction.
    pub seed_demo_account: bool,
    /// Reverse-lookup strategy for `confirm_user`/`recover_user`.
    pub lookup: LookupStrategy,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            seed_demo_account: true,
            lookup: LookupStrategy::Scan,
        }
    }
}
