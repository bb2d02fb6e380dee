//! Store and tree configuration.

use serde::Deserialize;

/// Whether a node may hang under more than one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentPolicy {
    /// A node may be attached under any number of parents; only cycles are
    /// rejected.
    #[default]
    Shared,
    /// Attaching a node that already has a parent is an error.
    Exclusive,
}

/// When scheduled flushes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Flushes wait for the host to run the next turn.
    #[default]
    Deferred,
    /// Every top-level write settles the store before returning. Batching is
    /// lost; meant for tests and synchronous hosts.
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub parent_policy: ParentPolicy,
    pub flush_policy: FlushPolicy,
    /// Upper bound on turns run by [`Store::run_until_idle`](crate::Store::run_until_idle).
    pub max_settle_turns: usize,
    /// Number of diagnostics retained; older ones are dropped first.
    pub diagnostics_capacity: usize,
    /// Largest run of `null` padding a sequence write past the end may add.
    pub max_index_gap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            parent_policy: ParentPolicy::Shared,
            flush_policy: FlushPolicy::Deferred,
            max_settle_turns: 64,
            diagnostics_capacity: 256,
            max_index_gap: 1024,
        }
    }
}

impl StoreConfig {
    /// Loads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Per-tree options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Name used to tag diagnostics raised inside this tree.
    pub name: Option<String>,
}

impl TreeOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}
