// File: src/core/continuation.rs
use crate::core::belief::{compute_signature, remove_none_slots};
use crate::core::labels::fix_general_label_error;
use crate::core::types::{BeliefMapping, Dialogue};
use crate::ontology::Ontology;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// The turns of a source dialogue after its first belief-bearing turn,
/// together with the belief that turn established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    pub dialogue: Dialogue,
    pub belief: BeliefMapping,
}

/// Continuations grouped by the signature of the belief they start from.
/// Built once per corpus and read-only afterwards; callers clone the
/// continuation they pick before rewriting it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContinuationIndex {
    entries: HashMap<String, Vec<Continuation>>,
}

impl ContinuationIndex {
    pub fn build(corpus: &[Dialogue], ontology: &Ontology) -> Self {
        let mut index = Self::default();
        for source in corpus {
            let mut dialogue = source.clone();
            dialogue.sort_turns();

            let first = dialogue.dialogue.iter().enumerate().find_map(|(idx, turn)| {
                let belief = remove_none_slots(&fix_general_label_error(
                    &turn.belief_state,
                    ontology.slots(),
                ));
                (!belief.is_empty()).then_some((idx, belief))
            });
            let Some((idx, belief)) = first else {
                debug!(dialogue = %source.dialogue_idx, "no belief-bearing turn");
                continue;
            };

            dialogue.dialogue.drain(..=idx);
            index
                .entries
                .entry(compute_signature(&belief))
                .or_default()
                .push(Continuation { dialogue, belief });
        }
        info!(
            signatures = index.len(),
            continuations = index.total(),
            "built continuation index"
        );
        index
    }

    /// Continuations whose first belief has this signature, in corpus order.
    pub fn candidates(&self, signature: &str) -> &[Continuation] {
        self.entries.get(signature).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct signatures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of continuations across all signatures.
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
