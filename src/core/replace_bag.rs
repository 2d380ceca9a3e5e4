// --- File: src/core/replace_bag.rs
use crate::error::{AugmentError, Result};
use std::collections::{HashMap, HashSet};

/// A phrase substitution table keyed by space-joined token sequences.
///
/// Lookups are bounded by the longest registered phrase and scan phrase
/// lengths in ascending order, so at a given offset the shortest registered
/// phrase wins. Every successful lookup marks its phrase as used; after a
/// rewrite pass `all_used()` tells whether every registered substitution
/// actually surfaced in the text.
#[derive(Debug, Clone)]
pub struct ReplaceBag<V> {
    store: HashMap<String, V>,
    max_replace_len: usize,
    used: HashSet<String>,
}

impl<V> Default for ReplaceBag<V> {
    fn default() -> Self {
        Self {
            store: HashMap::new(),
            max_replace_len: 0,
            used: HashSet::new(),
        }
    }
}

impl<V> ReplaceBag<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `phrase -> replacement`, overwriting any previous entry.
    pub fn add<S: AsRef<str>>(&mut self, phrase: &[S], replacement: V) -> Result<()> {
        if phrase.is_empty() {
            return Err(AugmentError::EmptyPhrase);
        }
        self.store.insert(join(phrase), replacement);
        self.max_replace_len = self.max_replace_len.max(phrase.len());
        Ok(())
    }

    /// Finds the shortest registered phrase starting at `offset`.
    /// O(L * k) where L is the max phrase length and k the joined key size.
    pub fn get_replacement<S: AsRef<str>>(
        &mut self,
        sentence: &[S],
        offset: usize,
    ) -> Option<(usize, &V)> {
        let remaining = sentence.len().saturating_sub(offset);
        let limit = self.max_replace_len.min(remaining);
        let (length, key) = (1..=limit)
            .map(|length| (length, join(&sentence[offset..offset + length])))
            .find(|(_, key)| self.store.contains_key(key))?;
        let value = self.store.get(&key)?;
        self.used.insert(key);
        Some((length, value))
    }

    pub fn contains<S: AsRef<str>>(&self, phrase: &[S]) -> bool {
        self.store.contains_key(&join(phrase))
    }

    pub fn lookup<S: AsRef<str>>(&self, phrase: &[S]) -> Option<&V> {
        self.store.get(&join(phrase))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn max_replace_len(&self) -> usize {
        self.max_replace_len
    }

    /// Number of distinct phrases matched since the last reset.
    pub fn used(&self) -> usize {
        self.used.len()
    }

    pub fn all_used(&self) -> bool {
        self.used() == self.len()
    }

    pub fn reset_used(&mut self) {
        self.used.clear();
    }
}

fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(text: &str) -> Vec<&str> {
        text.split(' ').collect()
    }

    #[test]
    fn matches_multi_token_phrases() {
        let mut bag = ReplaceBag::new();
        bag.add(&words("the cambridge belfry"), "hotel-name").unwrap();
        let sentence = words("i want the cambridge belfry please");

        assert_eq!(bag.get_replacement(&sentence, 0), None);
        assert_eq!(bag.get_replacement(&sentence, 2), Some((3, &"hotel-name")));
        assert_eq!(bag.used(), 1);
        assert!(bag.all_used());
    }

    #[test]
    fn shortest_phrase_wins_at_an_offset() {
        let mut bag = ReplaceBag::new();
        bag.add(&words("cambridge"), 1).unwrap();
        bag.add(&words("cambridge belfry"), 2).unwrap();
        let sentence = words("cambridge belfry");

        assert_eq!(bag.get_replacement(&sentence, 0), Some((1, &1)));
        assert_eq!(bag.used(), 1);
        assert!(!bag.all_used());
    }

    #[test]
    fn lookahead_stops_at_sentence_end() {
        let mut bag = ReplaceBag::new();
        bag.add(&words("north side"), ()).unwrap();
        assert_eq!(bag.get_replacement(&words("the north"), 1), None);
        assert_eq!(bag.get_replacement(&words("the north"), 2), None);
        assert_eq!(bag.get_replacement(&words("the north"), 9), None);
    }

    #[test]
    fn direct_access_does_not_mark_used() {
        let mut bag = ReplaceBag::new();
        bag.add(&words("west"), vec!["east".to_string()]).unwrap();
        assert!(bag.contains(&words("west")));
        assert!(!bag.contains(&words("east")));
        assert_eq!(bag.lookup(&["west"]), Some(&vec!["east".to_string()]));
        assert_eq!(bag.used(), 0);

        bag.get_replacement(&words("go west"), 1);
        bag.get_replacement(&words("west again"), 0);
        assert_eq!(bag.used(), 1);
        bag.reset_used();
        assert_eq!(bag.used(), 0);
    }

    #[test]
    fn empty_phrases_are_rejected() {
        let mut bag: ReplaceBag<()> = ReplaceBag::new();
        let empty: [&str; 0] = [];
        assert!(matches!(bag.add(&empty, ()), Err(AugmentError::EmptyPhrase)));
        assert!(bag.is_empty());
        assert_eq!(bag.max_replace_len(), 0);
    }

    proptest! {
        #[test]
        fn never_matches_beyond_longest_phrase(
            phrases in prop::collection::vec(prop::collection::vec("[abc]", 1..4), 1..6),
            sentence in prop::collection::vec("[abc]", 0..12),
        ) {
            let mut bag = ReplaceBag::new();
            for phrase in &phrases {
                bag.add(phrase, phrase.len()).unwrap();
            }
            let max_len = phrases.iter().map(Vec::len).max().unwrap_or(0);
            for offset in 0..sentence.len() {
                let hit = bag.get_replacement(&sentence, offset).map(|(length, &r)| (length, r));
                if let Some((length, registered)) = hit {
                    prop_assert!(length <= max_len);
                    prop_assert_eq!(length, registered);
                    // No shorter registered phrase starts here.
                    for shorter in 1..length {
                        prop_assert!(!bag.contains(&sentence[offset..offset + shorter]));
                    }
                }
            }
        }
    }
}
