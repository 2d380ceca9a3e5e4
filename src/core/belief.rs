// File: src/core/belief.rs
//! The textual belief grammar and the conversions between belief mappings,
//! corpus annotation records and continuation signatures.
//!
//! A belief code is a space-tokenized sequence of clauses:
//!
//! ```text
//! hotel name is " the cambridge belfry " hotel parking is yes
//! ```
//!
//! or the single word `none` for an empty belief.
use crate::core::types::{is_categorical, BeliefMapping, BeliefRecord, SlotKey, NONE_VALUE};
use crate::error::ParseError;

const QUOTE: &str = "\"";
const IS: &str = "is";

/// Normalizes a slot name to the ontology key format.
///
/// Names containing `book` keep their spaces ("book people"); every other
/// name is squashed ("price range" -> "pricerange").
pub fn normalize_slot_name(name: &str) -> String {
    if name.contains("book") {
        name.to_lowercase()
    } else {
        name.replace(' ', "").to_lowercase()
    }
}

/// Parses a belief code into its mapping and the domains it mentions, in
/// order of first appearance.
pub fn parse_belief(belief_str: &str) -> Result<(BeliefMapping, Vec<String>), ParseError> {
    let mut belief = BeliefMapping::new();
    let mut domains: Vec<String> = Vec::new();
    if belief_str.trim() == NONE_VALUE {
        return Ok((belief, domains));
    }

    // Quotes delimit values whether or not they are glued to the words.
    let spaced = belief_str.replace(QUOTE, " \" ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let domain = tokens[i];
        if !domains.iter().any(|d| d == domain) {
            domains.push(domain.to_string());
        }
        i += 1;

        let name_begin = i;
        while i < tokens.len() && tokens[i] != IS {
            i += 1;
        }
        if i == tokens.len() {
            return Err(ParseError::MissingIs(name_begin));
        }
        let slot_name = normalize_slot_name(&tokens[name_begin..i].join(" "));
        let slot_key: SlotKey = format!("{}-{}", domain, slot_name);
        i += 1;

        let Some(&first) = tokens.get(i) else {
            return Err(ParseError::MissingValue(i));
        };
        if is_categorical(first) {
            belief.insert(slot_key, first.to_string());
            i += 1;
            continue;
        }
        if first != QUOTE {
            return Err(ParseError::ExpectedQuote {
                position: i,
                found: first.to_string(),
            });
        }
        let open = i;
        i += 1;
        let value_begin = i;
        while i < tokens.len() && tokens[i] != QUOTE {
            i += 1;
        }
        if i == tokens.len() {
            return Err(ParseError::UnterminatedValue(open));
        }
        if i == value_begin {
            return Err(ParseError::EmptyValue(open));
        }
        belief.insert(slot_key, tokens[value_begin..i].join(" "));
        i += 1;
    }
    Ok((belief, domains))
}

/// Serializes a mapping as one single-slot `inform` record per slot.
pub fn belief_to_json(belief: &BeliefMapping) -> Vec<BeliefRecord> {
    belief
        .iter()
        .map(|(key, value)| BeliefRecord::inform(key, value))
        .collect()
}

pub fn belief_to_turn_label(belief: &BeliefMapping) -> Vec<(SlotKey, String)> {
    belief
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Coarse fingerprint used to pair synthetic beliefs with continuations.
/// Free-text values collapse to the placeholder `value`, so only the slot
/// keys and the categorical values distinguish two signatures.
pub fn compute_signature(belief: &BeliefMapping) -> String {
    belief
        .iter()
        .filter(|(_, value)| value.as_str() != NONE_VALUE)
        .map(|(key, value)| {
            if is_categorical(value) {
                format!("{}={}", key, value)
            } else {
                format!("{}=value", key)
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

pub fn remove_none_slots(belief: &BeliefMapping) -> BeliefMapping {
    belief
        .iter()
        .filter(|(_, value)| value.as_str() != NONE_VALUE)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
