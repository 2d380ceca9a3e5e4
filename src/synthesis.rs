// File: src/synthesis.rs
use crate::core::belief::{compute_signature, parse_belief};
use crate::core::continuation::ContinuationIndex;
use crate::core::rewriter::apply_new_belief;
use crate::config::check_probability;
use crate::core::types::{Dialogue, Turn, NONE_VALUE};
use crate::error::{AugmentError, Result};
use crate::ontology::Ontology;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Map;
use tracing::{debug, warn};

/// One `id<TAB>sentence<TAB>belief code` line of the synthetic utterance file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticLine {
    pub id: String,
    pub sentence: String,
    pub belief_code: String,
}

impl SyntheticLine {
    pub fn parse(line: &str, line_number: usize) -> Result<Self> {
        let mut fields = line.trim().split('\t');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(sentence), Some(belief_code), None) => Ok(Self {
                id: id.to_string(),
                sentence: sentence.to_string(),
                belief_code: belief_code.to_string(),
            }),
            _ => Err(AugmentError::MalformedLine { line: line_number }),
        }
    }
}

/// Counters for one synthesis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    pub lines: usize,
    pub malformed: usize,
    pub empty_belief: usize,
    pub subsampled: usize,
    pub spliced: usize,
    pub single_turn: usize,
    pub unused_substitution: usize,
    pub inconsistent: usize,
}

impl SynthesisStats {
    pub fn yielded(&self) -> usize {
        self.spliced + self.single_turn
    }
}

/// Splices synthetic first turns onto continuations of real dialogues.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    index: &'a ContinuationIndex,
    ontology: &'a Ontology,
    skip_probability: f64,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        index: &'a ContinuationIndex,
        ontology: &'a Ontology,
        skip_probability: f64,
    ) -> Result<Self> {
        check_probability("skip_probability", skip_probability)?;
        Ok(Self {
            index,
            ontology,
            skip_probability,
        })
    }

    /// Shuffles `lines` and returns a lazy stream of synthesized dialogues.
    /// `lines` are the file's lines in order; blank ones are ignored and
    /// errors name the 1-based line number.
    pub fn process<'r, R: Rng>(&self, lines: Vec<String>, rng: &'r mut R) -> Synthesis<'a, 'r, R> {
        let mut numbered: Vec<(usize, String)> = lines
            .into_iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| (idx + 1, line))
            .collect();
        numbered.shuffle(rng);
        Synthesis {
            synthesizer: *self,
            lines: numbered.into_iter(),
            rng,
            stats: SynthesisStats::default(),
            malformed_lines: Vec::new(),
        }
    }
}

pub struct Synthesis<'a, 'r, R> {
    synthesizer: Synthesizer<'a>,
    lines: std::vec::IntoIter<(usize, String)>,
    rng: &'r mut R,
    stats: SynthesisStats,
    malformed_lines: Vec<usize>,
}

impl<R: Rng> Synthesis<'_, '_, R> {
    pub fn stats(&self) -> SynthesisStats {
        self.stats
    }

    /// File line numbers of the lines skipped as malformed, in processing order.
    pub fn malformed_lines(&self) -> &[usize] {
        &self.malformed_lines
    }

    fn synthesize(&mut self, line: &str, line_number: usize) -> Option<Dialogue> {
        self.stats.lines += 1;
        let line = match SyntheticLine::parse(line, line_number) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "skipping synthetic line");
                self.stats.malformed += 1;
                self.malformed_lines.push(line_number);
                return None;
            }
        };
        if line.belief_code == NONE_VALUE {
            self.stats.empty_belief += 1;
            return None;
        }
        if self.rng.gen_bool(self.synthesizer.skip_probability) {
            self.stats.subsampled += 1;
            return None;
        }

        let (target, domains) = match parse_belief(&line.belief_code) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(id = %line.id, line = line_number, %err, "skipping unparsable belief code");
                self.stats.malformed += 1;
                self.malformed_lines.push(line_number);
                return None;
            }
        };
        let domain = domains.first().cloned().unwrap_or_default();
        let first_turn = Turn::synthetic(&line.sentence, &target, &domain);

        let index = self.synthesizer.index;
        let signature = compute_signature(&target);
        let Some(chosen) = index.candidates(&signature).choose(self.rng) else {
            debug!(id = %line.id, %signature, "no continuation; emitting single turn");
            self.stats.single_turn += 1;
            return Some(Dialogue {
                dialogue_idx: line.id,
                domains,
                dialogue: vec![first_turn],
                extra: Map::new(),
            });
        };

        let mut dialogue = chosen.dialogue.clone();
        dialogue.dialogue_idx = format!("{}+{}", line.id, dialogue.dialogue_idx);
        match apply_new_belief(&mut dialogue, &chosen.belief, &target, self.synthesizer.ontology) {
            Ok(true) => {}
            Ok(false) => {
                debug!(id = %dialogue.dialogue_idx, "discarding: substitution never surfaced");
                self.stats.unused_substitution += 1;
                return None;
            }
            Err(err) => {
                warn!(id = %dialogue.dialogue_idx, %err, "discarding inconsistent rewrite");
                self.stats.inconsistent += 1;
                return None;
            }
        }

        dialogue.dialogue.insert(0, first_turn);
        dialogue.renumber_turns();
        self.stats.spliced += 1;
        Some(dialogue)
    }
}

impl<R: Rng> Iterator for Synthesis<'_, '_, R> {
    type Item = Dialogue;

    fn next(&mut self) -> Option<Dialogue> {
        while let Some((line_number, line)) = self.lines.next() {
            if let Some(dialogue) = self.synthesize(&line, line_number) {
                return Some(dialogue);
            }
        }
        None
    }
}
