// crates/strata-core/src/item.rs
//
// Work item model: one input seed carried through the layer chain, the
// per-layer results recorded along the way, and the archived form persisted
// once the item finishes.

use serde::{Deserialize, Serialize};

/// Tri-state on-chain status reported by the ledger.
///
/// `Unknown` means verification coverage is incomplete (rate-limited,
/// network failure, or RPC disabled) and must never be treated as `False`
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnChain {
    True,
    False,
    Unknown,
}

/// Error taxonomy tag recorded on a layer result.
///
/// An explicit ledger "not found" is not an error; it is a definitive
/// answer recorded as `OnChain::False` with no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTag {
    /// The derivation oracle failed for this layer's seed. Terminal.
    DerivationFailed,
    /// The ledger kept signalling "too many requests" past the retry budget.
    RateLimited,
    /// Network failure or per-call timeout past the retry budget.
    TransientNetwork,
}

/// Per-item lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Deriving,
    Derived,
    Verifying,
    LayerComplete,
    Done,
    PermanentlyFailed,
}

/// Outcome of one hop of the seed -> identity -> seed chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    /// 1-based layer number.
    pub layer: u32,
    /// The seed fed to the derivation oracle for this layer.
    pub seed: String,
    /// The derived identity, absent when derivation failed.
    pub identity: Option<String>,
    /// Whether the oracle produced an identity for this layer.
    pub derivable: bool,
    /// Ledger verdict for the derived identity.
    pub on_chain: OnChain,
    /// Reported balance when the ledger confirmed the identity.
    pub balance: Option<u64>,
    /// Taxonomy tag when this layer ended in a failure mode.
    pub error: Option<ErrorTag>,
}

/// One input seed being carried through the chain.
///
/// Mutated exclusively by the pipeline engine; archived as a
/// [`CompletedItem`] once it reaches `Done` or `PermanentlyFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Stable unique key: the original input seed string.
    pub id: String,
    /// Highest fully recorded layer. 0 = not yet started. Monotonically
    /// non-decreasing across the lifetime of a run and across restarts.
    pub current_layer: u32,
    pub state: ItemState,
    pub history: Vec<LayerResult>,
    /// Retry counter for the layer currently in flight, reset each layer.
    pub attempts: u32,
}

impl WorkItem {
    /// Create a fresh item at layer 0, ready for processing.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_layer: 0,
            state: ItemState::Pending,
            history: Vec::new(),
            attempts: 0,
        }
    }

    /// Whether the item has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ItemState::Done | ItemState::PermanentlyFailed)
    }

    /// Archive the item into its immutable completed form.
    pub fn into_completed(self) -> CompletedItem {
        CompletedItem {
            id: self.id,
            state: self.state,
            history: self.history,
        }
    }
}

/// Immutable archived form of a finished work item. This is what the result
/// log persists and the aggregator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedItem {
    pub id: String,
    pub state: ItemState,
    pub history: Vec<LayerResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_chain_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OnChain::True).unwrap(), "\"true\"");
        assert_eq!(serde_json::to_string(&OnChain::False).unwrap(), "\"false\"");
        assert_eq!(
            serde_json::to_string(&OnChain::Unknown).unwrap(),
            "\"unknown\""
        );
    }

    #[test]
    fn test_work_item_lifecycle() {
        let mut item = WorkItem::new("seedseedseed");
        assert_eq!(item.current_layer, 0);
        assert!(!item.is_finished());

        item.state = ItemState::Done;
        assert!(item.is_finished());

        let completed = item.into_completed();
        assert_eq!(completed.id, "seedseedseed");
        assert_eq!(completed.state, ItemState::Done);
    }

    #[test]
    fn test_layer_result_round_trip() {
        let result = LayerResult {
            layer: 2,
            seed: "abc".to_string(),
            identity: None,
            derivable: false,
            on_chain: OnChain::Unknown,
            balance: None,
            error: Some(ErrorTag::DerivationFailed),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: LayerResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(json.contains("derivation_failed"));
    }
}
