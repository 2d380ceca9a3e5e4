// File: src/ontology.rs
use crate::core::belief::normalize_slot_name;
use crate::core::types::SlotKey;
use crate::error::{AugmentError, Result};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// Domains whose slots the engine tracks. `none` is accepted in ontology keys.
pub const ONTOLOGY_DOMAINS: [&str; 6] = ["none", "hotel", "train", "restaurant", "attraction", "taxi"];

/// The slot table every component is constructed with. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    slots: Vec<SlotKey>,
    values: IndexMap<SlotKey, Vec<Vec<String>>>,
}

impl Ontology {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Builds the table from a `{slot_key: [candidate, ...]}` object, keeping
    /// only the tracked domains and normalizing keys to the belief format.
    /// Slots come out in sorted raw-key order.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AugmentError::Ontology("expected a JSON object".to_string()))?;

        let mut ontology = Self::default();
        for (raw_key, candidates) in object {
            let domain = raw_key.split('-').next().unwrap_or_default();
            if !ONTOLOGY_DOMAINS.contains(&domain) {
                debug!(slot = %raw_key, "skipping slot outside tracked domains");
                continue;
            }
            let candidates = candidates.as_array().ok_or_else(|| {
                AugmentError::Ontology(format!("values of '{}' must be a list", raw_key))
            })?;

            let mut values = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let text = candidate.as_str().ok_or_else(|| {
                    AugmentError::Ontology(format!("non-string value under '{}'", raw_key))
                })?;
                let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
                if !tokens.is_empty() {
                    values.push(tokens);
                }
            }

            let key = normalize_slot_name(raw_key);
            if !ontology.values.contains_key(&key) {
                ontology.slots.push(key.clone());
            }
            ontology.values.insert(key, values);
        }
        Ok(ontology)
    }

    pub fn slots(&self) -> &[SlotKey] {
        &self.slots
    }

    /// Candidate values for a slot as token sequences.
    pub fn values(&self, slot: &str) -> Option<&[Vec<String>]> {
        self.values.get(slot).map(Vec::as_slice)
    }

    pub fn contains_slot(&self, slot: &str) -> bool {
        self.values.contains_key(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
