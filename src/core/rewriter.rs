// File: src/core/rewriter.rs
use crate::core::labels::fix_general_label_error;
use crate::core::replace_bag::ReplaceBag;
use crate::core::types::{is_categorical, tokenize, BeliefMapping, Dialogue, NONE_VALUE};
use crate::error::{ConsistencyError, Result};
use crate::ontology::Ontology;

/// Builds the substitutions that turn `old` free-text values into `new` ones.
/// Categorical values must be identical in both beliefs and are never
/// registered.
pub fn make_replacement_bag(
    old: &BeliefMapping,
    new: &BeliefMapping,
) -> Result<ReplaceBag<Vec<String>>> {
    let mut bag = ReplaceBag::new();
    for (slot, old_value) in old {
        if old_value == NONE_VALUE {
            continue;
        }
        let new_value = new
            .get(slot)
            .ok_or_else(|| ConsistencyError::MissingSlot(slot.clone()))?;
        if is_categorical(old_value) {
            if new_value != old_value {
                return Err(ConsistencyError::CategoricalChanged {
                    slot: slot.clone(),
                    old: old_value.clone(),
                    new: new_value.clone(),
                }
                .into());
            }
            continue;
        }
        bag.add(&tokenize(old_value), tokenize(new_value))?;
    }
    Ok(bag)
}

/// Rewrites a sentence token by token. At each offset the bag's match is
/// substituted; unmatched tokens pass through.
pub fn apply_replacement(sentence: &str, bag: &mut ReplaceBag<Vec<String>>) -> Vec<String> {
    let tokens = tokenize(sentence);
    let mut result = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Some((length, replacement)) = bag.get_replacement(&tokens, i) {
            result.extend(replacement.iter().cloned());
            i += length;
        } else {
            result.push(tokens[i].clone());
            i += 1;
        }
    }
    result
}

/// Rewrites every turn of `dialogue` from `old` to `new` values, both in the
/// transcripts and in the belief annotations.
///
/// Returns `Ok(false)` when some substitution never matched any transcript:
/// the new value would then be labelled without ever being said, and the
/// caller must discard the dialogue.
pub fn apply_new_belief(
    dialogue: &mut Dialogue,
    old: &BeliefMapping,
    new: &BeliefMapping,
    ontology: &Ontology,
) -> Result<bool> {
    let mut bag = make_replacement_bag(old, new)?;

    for turn in &mut dialogue.dialogue {
        turn.preserve_originals();
        turn.system_transcript = apply_replacement(&turn.system_transcript, &mut bag).join(" ");
        turn.transcript = apply_replacement(&turn.transcript, &mut bag).join(" ");

        let mut labels = fix_general_label_error(&turn.belief_state, ontology.slots());
        labels.retain(|slot, value| match old.get(slot) {
            Some(old_value) if old_value == value => {
                if old_value == NONE_VALUE {
                    return false;
                }
                if let Some(new_value) = new.get(slot) {
                    *value = new_value.clone();
                }
                true
            }
            _ => true,
        });
        turn.set_belief(&labels);
    }

    Ok(bag.all_used())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BeliefRecord, Turn};
    use crate::error::AugmentError;
    use serde_json::Map;

    fn mapping(pairs: &[(&str, &str)]) -> BeliefMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ontology() -> Ontology {
        Ontology::from_json_str(
            r#"{"hotel-name": ["a"], "hotel-area": ["west"], "hotel-parking": ["yes"], "hotel-stars": ["4"]}"#,
        )
        .unwrap()
    }

    fn turn(idx: usize, system: &str, user: &str, belief: &[(&str, &str)]) -> Turn {
        Turn {
            system_transcript: system.to_string(),
            transcript: user.to_string(),
            turn_idx: idx,
            belief_state: belief.iter().map(|(k, v)| BeliefRecord::inform(k, v)).collect(),
            turn_label: Vec::new(),
            system_acts: Vec::new(),
            domain: "hotel".to_string(),
            original_system_transcript: None,
            original_transcript: None,
            extra: Map::new(),
        }
    }

    fn dialogue(turns: Vec<Turn>) -> Dialogue {
        Dialogue {
            dialogue_idx: "MUL0001.json".to_string(),
            domains: vec!["hotel".to_string()],
            dialogue: turns,
            extra: Map::new(),
        }
    }

    #[test]
    fn rewrites_transcripts_and_beliefs() {
        let old = mapping(&[("hotel-name", "the cambridge belfry"), ("hotel-parking", "yes")]);
        let new = mapping(&[("hotel-name", "acorn guest house"), ("hotel-parking", "yes")]);
        let mut dialogue = dialogue(vec![
            turn(
                1,
                "the cambridge belfry has free parking .",
                "great , book the cambridge belfry",
                &[("hotel-name", "the cambridge belfry"), ("hotel-parking", "yes"), ("hotel-area", "west")],
            ),
            turn(2, "done .", "thanks", &[("hotel-name", "cambridge belfry")]),
        ]);

        assert!(apply_new_belief(&mut dialogue, &old, &new, &ontology()).unwrap());

        let first = &dialogue.dialogue[0];
        assert_eq!(first.system_transcript, "acorn guest house has free parking .");
        assert_eq!(first.transcript, "great , book acorn guest house");
        assert_eq!(
            first.original_transcript.as_deref(),
            Some("great , book the cambridge belfry")
        );
        assert_eq!(
            first.turn_label,
            vec![
                ("hotel-name".to_string(), "acorn guest house".to_string()),
                ("hotel-parking".to_string(), "yes".to_string()),
                ("hotel-area".to_string(), "west".to_string()),
            ]
        );
        assert_eq!(first.belief_state[0], BeliefRecord::inform("hotel-name", "acorn guest house"));
        // Values that differ from the old belief are left alone.
        assert_eq!(dialogue.dialogue[1].turn_label[0].1, "cambridge belfry");
        assert!(!dialogue.dialogue[1].transcript.contains("cambridge belfry"));
    }

    #[test]
    fn unused_substitution_is_reported() {
        let old = mapping(&[("hotel-name", "the cambridge belfry")]);
        let new = mapping(&[("hotel-name", "acorn guest house")]);
        let mut dialogue = dialogue(vec![turn(
            1,
            "what area would you like ?",
            "somewhere in the west",
            &[("hotel-name", "the cambridge belfry")],
        )]);

        assert!(!apply_new_belief(&mut dialogue, &old, &new, &ontology()).unwrap());
        // The annotation is still rewritten; discarding is up to the caller.
        assert_eq!(dialogue.dialogue[0].turn_label[0].1, "acorn guest house");
    }

    #[test]
    fn categorical_values_cannot_change() {
        let old = mapping(&[("hotel-parking", "yes")]);
        let new = mapping(&[("hotel-parking", "no")]);
        let err = make_replacement_bag(&old, &new).unwrap_err();
        assert!(matches!(
            err,
            AugmentError::Consistency(ConsistencyError::CategoricalChanged { .. })
        ));

        let mut dialogue = dialogue(vec![turn(1, "", "with parking", &[("hotel-parking", "yes")])]);
        assert!(apply_new_belief(&mut dialogue, &old, &new, &ontology()).is_err());
        assert_eq!(dialogue.dialogue[0].transcript, "with parking");
    }

    #[test]
    fn missing_new_slot_is_an_error() {
        let old = mapping(&[("hotel-area", "west"), ("hotel-stars", "none")]);
        let err = make_replacement_bag(&old, &mapping(&[])).unwrap_err();
        assert!(matches!(
            err,
            AugmentError::Consistency(ConsistencyError::MissingSlot(slot)) if slot == "hotel-area"
        ));
        let bag = make_replacement_bag(&mapping(&[("hotel-stars", "none")]), &mapping(&[])).unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn none_slots_matching_the_old_belief_are_dropped() {
        let old = mapping(&[("hotel-stars", "none"), ("hotel-area", "west")]);
        let new = mapping(&[("hotel-area", "east")]);
        let mut dialogue = dialogue(vec![turn(
            1,
            "",
            "in the west please",
            &[("hotel-stars", "none"), ("hotel-area", "west")],
        )]);
        assert!(apply_new_belief(&mut dialogue, &old, &new, &ontology()).unwrap());
        assert_eq!(
            dialogue.dialogue[0].turn_label,
            vec![("hotel-area".to_string(), "east".to_string())]
        );
        assert_eq!(dialogue.dialogue[0].transcript, "in the east please");
    }

    #[test]
    fn originals_are_preserved_once() {
        let old = mapping(&[("hotel-area", "west")]);
        let new = mapping(&[("hotel-area", "north")]);
        let mut dialogue = dialogue(vec![turn(1, "west ?", "west", &[("hotel-area", "west")])]);
        apply_new_belief(&mut dialogue, &old, &new, &ontology()).unwrap();
        let back = mapping(&[("hotel-area", "south")]);
        apply_new_belief(&mut dialogue, &new, &back, &ontology()).unwrap();

        let turn = &dialogue.dialogue[0];
        assert_eq!(turn.transcript, "south");
        assert_eq!(turn.original_transcript.as_deref(), Some("west"));
        assert_eq!(turn.original_system_transcript.as_deref(), Some("west ?"));
    }
}
