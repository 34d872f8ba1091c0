// crates/strata-core/src/checkpoint.rs
//
// Durable run state: the set of fully committed item ids plus aggregate
// counters. The checkpoint owns no items directly; it records exactly what
// is needed to decide which items to skip on resume.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{CompletedItem, OnChain};

/// Per-layer aggregate totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCounters {
    #[serde(default)]
    pub derivable: u64,
    #[serde(default)]
    pub on_chain_true: u64,
    #[serde(default)]
    pub on_chain_false: u64,
    #[serde(default)]
    pub on_chain_unknown: u64,
}

/// Run-level aggregate totals. `processed` counts items; the remaining
/// top-level fields count layer results across all layers, with `per_layer`
/// carrying the per-hop breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub derivable: u64,
    #[serde(default)]
    pub on_chain_true: u64,
    #[serde(default)]
    pub on_chain_false: u64,
    #[serde(default)]
    pub on_chain_unknown: u64,
    #[serde(default)]
    pub per_layer: BTreeMap<u32, LayerCounters>,
}

impl RunCounters {
    /// Fold one completed item into the totals.
    pub fn record(&mut self, item: &CompletedItem) {
        self.processed += 1;
        for result in &item.history {
            let layer = self.per_layer.entry(result.layer).or_default();
            if result.derivable {
                self.derivable += 1;
                layer.derivable += 1;
            }
            match result.on_chain {
                OnChain::True => {
                    self.on_chain_true += 1;
                    layer.on_chain_true += 1;
                }
                OnChain::False => {
                    self.on_chain_false += 1;
                    layer.on_chain_false += 1;
                }
                OnChain::Unknown => {
                    self.on_chain_unknown += 1;
                    layer.on_chain_unknown += 1;
                }
            }
        }
    }
}

/// Durable run state, saved atomically by the checkpoint store.
///
/// Forward-compatible: unrecognized fields are ignored on load and missing
/// fields are defaulted, so the format can evolve without breaking resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Ids of items whose full layer history has been durably written.
    #[serde(default)]
    pub processed_ids: BTreeSet<String>,
    #[serde(default)]
    pub counters: RunCounters,
    /// Timestamp of the last successful save.
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            processed_ids: BTreeSet::new(),
            counters: RunCounters::default(),
            saved_at: Utc::now(),
        }
    }
}

impl Checkpoint {
    /// Whether an item id is already fully committed.
    pub fn is_processed(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }
}
