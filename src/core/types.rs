// src/core/types.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `"<domain>-<slot_name>"` identifier for one belief dimension.
pub type SlotKey = String;

/// What has been established about the user goal at one point in a dialogue.
/// Iteration order is the insertion order of the source annotation, and
/// signatures depend on it.
pub type BeliefMapping = IndexMap<SlotKey, String>;

/// Values that are never rewritten by substitution.
pub const CATEGORICAL_VALUES: [&str; 3] = ["yes", "no", "dontcare"];

pub const NONE_VALUE: &str = "none";

pub fn is_categorical(value: &str) -> bool {
    CATEGORICAL_VALUES.contains(&value)
}

/// One `{ "slots": [[key, value]], "act": "inform" }` annotation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefRecord {
    pub slots: Vec<(SlotKey, String)>,
    pub act: String,
}

impl BeliefRecord {
    pub fn inform(key: &str, value: &str) -> Self {
        Self {
            slots: vec![(key.to_string(), value.to_string())],
            act: "inform".to_string(),
        }
    }
}

/// One system/user exchange in the raw corpus schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub system_transcript: String,
    pub transcript: String,
    pub turn_idx: usize,
    pub belief_state: Vec<BeliefRecord>,
    pub turn_label: Vec<(SlotKey, String)>,
    #[serde(default)]
    pub system_acts: Vec<Value>,
    #[serde(default)]
    pub domain: String,
    /// Pre-rewrite text. Set at most once per turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_system_transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_transcript: Option<String>,
    /// Fields the engine does not interpret, carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Turn {
    /// A fresh user turn with no system prompt, as used for synthetic turn 0.
    pub fn synthetic(sentence: &str, belief: &BeliefMapping, domain: &str) -> Self {
        Self {
            system_transcript: String::new(),
            transcript: sentence.to_string(),
            turn_idx: 0,
            belief_state: crate::core::belief::belief_to_json(belief),
            turn_label: crate::core::belief::belief_to_turn_label(belief),
            system_acts: Vec::new(),
            domain: domain.to_string(),
            original_system_transcript: None,
            original_transcript: None,
            extra: Map::new(),
        }
    }

    /// Records the current transcripts as the originals unless already recorded.
    pub fn preserve_originals(&mut self) {
        if self.original_system_transcript.is_none() {
            self.original_system_transcript = Some(self.system_transcript.clone());
        }
        if self.original_transcript.is_none() {
            self.original_transcript = Some(self.transcript.clone());
        }
    }

    pub fn set_belief(&mut self, belief: &BeliefMapping) {
        self.belief_state = crate::core::belief::belief_to_json(belief);
        self.turn_label = crate::core::belief::belief_to_turn_label(belief);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialogue {
    pub dialogue_idx: String,
    pub domains: Vec<String>,
    pub dialogue: Vec<Turn>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dialogue {
    pub fn sort_turns(&mut self) {
        self.dialogue.sort_by_key(|turn| turn.turn_idx);
    }

    /// Renumbers `turn_idx` contiguously from 0 in current order.
    pub fn renumber_turns(&mut self) {
        for (idx, turn) in self.dialogue.iter_mut().enumerate() {
            turn.turn_idx = idx;
        }
    }
}

/// Splits text the way every transcript and slot value is tokenized.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
