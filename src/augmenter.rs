// File: src/augmenter.rs
use crate::config::AugmentProbabilities;
use crate::core::labels::fix_general_label_error;
use crate::core::replace_bag::ReplaceBag;
use crate::core::types::{tokenize, BeliefMapping, Dialogue, SlotKey};
use crate::error::Result;
use crate::ontology::Ontology;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

pub const PUNCTUATION: [&str; 4] = [".", "?", ",", "!"];

/// Values that are never looked for in transcripts.
const UNREPLACEABLE: [&str; 5] = ["yes", "no", "none", "dontcare", "do n't care"];

enum Noise {
    Replace(&'static str),
    Drop,
}

/// Lexical augmentation for one dialogue.
///
/// The augmenter remembers every substitution it made, so a value replaced
/// in one turn is replaced identically in all later turns. Use a fresh
/// instance per dialogue.
pub struct Augmenter<'a> {
    ontology: &'a Ontology,
    only_domain: Option<String>,
    probabilities: AugmentProbabilities,
    replacements: ReplaceBag<Vec<String>>,
    new_slot_values: BeliefMapping,
}

impl<'a> Augmenter<'a> {
    /// Fails with [`crate::error::AugmentError::Config`] unless every probability is
    /// within `[0, 1]`.
    pub fn new(
        ontology: &'a Ontology,
        only_domain: Option<String>,
        probabilities: AugmentProbabilities,
    ) -> Result<Self> {
        probabilities.validate()?;
        Ok(Self {
            ontology,
            only_domain,
            probabilities,
            replacements: ReplaceBag::new(),
            new_slot_values: BeliefMapping::new(),
        })
    }

    /// Slot values changed so far in this session.
    pub fn new_slot_values(&self) -> &BeliefMapping {
        &self.new_slot_values
    }

    /// Maps every live free-text value of `labels` to its slot. Values this
    /// session already replaced are rewritten in `labels` instead.
    pub fn label_dict_to_replace_bag(&self, labels: &mut BeliefMapping) -> Result<ReplaceBag<SlotKey>> {
        let mut bag = ReplaceBag::new();
        for (slot, value) in labels.iter_mut() {
            if UNREPLACEABLE.contains(&value.as_str()) {
                continue;
            }
            let domain = slot.split('-').next().unwrap_or_default();
            if self.only_domain.as_deref().is_some_and(|only| only != domain) {
                continue;
            }
            let tokens = tokenize(value);
            if tokens.is_empty() {
                continue;
            }
            if let Some(replacement) = self.replacements.lookup(&tokens) {
                *value = replacement.join(" ");
                continue;
            }
            bag.add(&tokens, slot.clone())?;
        }
        Ok(bag)
    }

    /// System turns never introduce new values: live slot values are copied
    /// through, earlier substitutions are repeated.
    pub fn augment_system<R: Rng>(
        &mut self,
        sentence: &str,
        turn_bag: &mut ReplaceBag<SlotKey>,
        rng: &mut R,
    ) -> Vec<String> {
        let tokens = tokenize(sentence);
        let mut result = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            if let Some((length, _)) = turn_bag.get_replacement(&tokens, i) {
                result.extend_from_slice(&tokens[i..i + length]);
                i += length;
                continue;
            }
            if let Some((length, replacement)) = self.replacements.get_replacement(&tokens, i) {
                result.extend(replacement.iter().cloned());
                i += length;
                continue;
            }
            match self.punctuation_noise(&tokens[i], rng) {
                Some(Noise::Replace(mark)) => result.push(mark.to_string()),
                Some(Noise::Drop) => {}
                None => result.push(tokens[i].clone()),
            }
            i += 1;
        }
        result
    }

    /// User turns may introduce values: a live slot value is, with
    /// `value_replace` probability, swapped for another ontology candidate
    /// and the swap is remembered for the rest of the session.
    pub fn augment_user<R: Rng>(
        &mut self,
        sentence: &str,
        turn_bag: &mut ReplaceBag<SlotKey>,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let tokens = tokenize(sentence);
        let mut result = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            if let Some((length, replacement)) = self.replacements.get_replacement(&tokens, i) {
                result.extend(replacement.iter().cloned());
                i += length;
                continue;
            }
            if let Some(noise) = self.punctuation_noise(&tokens[i], rng) {
                if let Noise::Replace(mark) = noise {
                    result.push(mark.to_string());
                }
                i += 1;
                continue;
            }

            let live = turn_bag
                .get_replacement(&tokens, i)
                .map(|(length, slot)| (length, slot.clone()));
            if let Some((length, slot)) = live {
                if rng.gen_bool(self.probabilities.value_replace) {
                    if let Some(replacement) = self.draw_value(&slot, rng) {
                        self.replacements.add(&tokens[i..i + length], replacement.clone())?;
                        self.new_slot_values.insert(slot, replacement.join(" "));
                        result.extend(replacement);
                        i += length;
                        continue;
                    }
                }
            }

            result.push(tokens[i].clone());
            i += 1;
        }
        Ok(result)
    }

    /// Rewrites every turn in place and re-annotates it with the values
    /// this session substituted.
    pub fn augment<R: Rng>(&mut self, dialogue: &mut Dialogue, rng: &mut R) -> Result<()> {
        for turn in &mut dialogue.dialogue {
            let mut labels = fix_general_label_error(&turn.belief_state, self.ontology.slots());
            self.overlay_new_values(&mut labels);

            let mut turn_bag = self.label_dict_to_replace_bag(&mut labels)?;

            turn.preserve_originals();
            turn.system_transcript = self
                .augment_system(&turn.system_transcript, &mut turn_bag, rng)
                .join(" ");
            turn.transcript = self.augment_user(&turn.transcript, &mut turn_bag, rng)?.join(" ");

            self.overlay_new_values(&mut labels);
            turn.set_belief(&labels);
        }
        debug!(
            dialogue = %dialogue.dialogue_idx,
            substitutions = self.replacements.len(),
            "augmented dialogue"
        );
        Ok(())
    }

    fn overlay_new_values(&self, labels: &mut BeliefMapping) {
        for (slot, value) in &self.new_slot_values {
            labels.insert(slot.clone(), value.clone());
        }
    }

    fn punctuation_noise<R: Rng>(&self, token: &str, rng: &mut R) -> Option<Noise> {
        if !PUNCTUATION.contains(&token) {
            return None;
        }
        if rng.gen_bool(self.probabilities.punctuation_replace) {
            Some(Noise::Replace(PUNCTUATION[rng.gen_range(0..PUNCTUATION.len())]))
        } else if rng.gen_bool(self.probabilities.punctuation_drop) {
            Some(Noise::Drop)
        } else {
            None
        }
    }

    fn draw_value<R: Rng>(&self, slot: &str, rng: &mut R) -> Option<Vec<String>> {
        let candidate = self.ontology.values(slot)?.choose(rng).cloned();
        if candidate.is_none() {
            debug!(slot, "no ontology candidates; keeping value");
        }
        candidate
    }
}
