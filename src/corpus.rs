// File: src/corpus.rs
use crate::core::labels::fix_general_label_error;
use crate::core::types::{Dialogue, NONE_VALUE};
use crate::error::AugmentError;
use crate::ontology::Ontology;
use indexmap::IndexMap;
use rand_mt::Mt;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Domains a dialogue may mention and still be used.
pub const EXPERIMENT_DOMAINS: [&str; 5] = ["hotel", "train", "restaurant", "attraction", "taxi"];

/// Fixed so that the subsampled training split is the same on every run.
pub const SUBSAMPLE_SEED: u32 = 10;

/// Which split a corpus file is; the unseen-domain filters depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatasetKind {
    #[default]
    Train,
    Dev,
    Test,
}

impl FromStr for DatasetKind {
    type Err = AugmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            other => Err(AugmentError::Config(format!(
                "unknown dataset '{}', expected train, dev or test",
                other
            ))),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Train => "train",
            Self::Dev => "dev",
            Self::Test => "test",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    pub dataset: DatasetKind,
    /// Percentage of training dialogues kept, 100 keeps everything.
    pub data_ratio: u32,
    pub only_domain: Option<String>,
    /// Held out of train and dev; the only domain evaluated in test.
    pub except_domain: Option<String>,
    /// Held out of dev only.
    pub except_domain_dev: Option<String>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::Train,
            data_ratio: 100,
            only_domain: None,
            except_domain: None,
            except_domain_dev: None,
        }
    }
}

impl CorpusOptions {
    fn keeps(&self, domains: &[String]) -> bool {
        let mentions = |domain: &String| domains.contains(domain);
        if let Some(only) = &self.only_domain {
            if !mentions(only) {
                return false;
            }
        }
        if let Some(except) = &self.except_domain_dev {
            if self.dataset == DatasetKind::Dev && mentions(except) {
                return false;
            }
        }
        if let Some(except) = &self.except_domain {
            let held_out = mentions(except);
            if (self.dataset == DatasetKind::Test) != held_out {
                return false;
            }
        }
        true
    }
}

/// Mersenne Twister draws in the exact order CPython's `random.Random`
/// makes them, so seeded splits match the ones published with the data.
struct SplitRng(Mt);

impl SplitRng {
    fn new(seed: u32) -> Self {
        Self(Mt::new_with_key([seed]))
    }

    /// `getrandbits(k)` for `1 <= k <= 64`.
    fn bits(&mut self, k: u32) -> u64 {
        if k <= 32 {
            return u64::from(self.0.next_u32() >> (32 - k));
        }
        let low = u64::from(self.0.next_u32());
        let high = u64::from(self.0.next_u32() >> (64 - k));
        low | (high << 32)
    }

    /// Uniform in `0..n` by rejection, `n >= 1`.
    fn below(&mut self, n: usize) -> usize {
        let n = n as u64;
        let k = u64::BITS - n.leading_zeros();
        loop {
            let r = self.bits(k);
            if r < n {
                return r as usize;
            }
        }
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}

/// Keeps `data_ratio` percent of the dialogues, at least one, after a
/// shuffle seeded with [`SUBSAMPLE_SEED`].
pub fn subsample(dialogues: &mut Vec<Dialogue>, data_ratio: u32) {
    if data_ratio == 100 {
        return;
    }
    SplitRng::new(SUBSAMPLE_SEED).shuffle(dialogues);
    let keep = ((dialogues.len() as f64 * 0.01 * f64::from(data_ratio)) as usize).max(1);
    dialogues.truncate(keep);
}

/// Counts `domains` until the first one outside [`EXPERIMENT_DOMAINS`].
/// Returns whether every domain was an experiment domain.
fn count_experiment_domains(domains: &[String], counter: &mut IndexMap<String, usize>) -> bool {
    for domain in domains {
        if !EXPERIMENT_DOMAINS.contains(&domain.as_str()) {
            return false;
        }
        *counter.entry(domain.clone()).or_insert(0) += 1;
    }
    true
}

/// Filters a raw corpus down to the experiment domains and fills in domains
/// that annotations mention but the dialogue header omits.
pub fn prepare_corpus(
    mut dialogues: Vec<Dialogue>,
    ontology: &Ontology,
    options: &CorpusOptions,
) -> Vec<Dialogue> {
    if options.dataset == DatasetKind::Train {
        subsample(&mut dialogues, options.data_ratio);
    }

    let mut domain_counter: IndexMap<String, usize> = IndexMap::new();
    let mut prepared = Vec::with_capacity(dialogues.len());
    for mut dialogue in dialogues {
        if !count_experiment_domains(&dialogue.domains, &mut domain_counter) {
            continue;
        }

        let mut domains = dialogue.domains.clone();
        for turn in &dialogue.dialogue {
            let labels = fix_general_label_error(&turn.belief_state, ontology.slots());
            for (slot, value) in &labels {
                if value == NONE_VALUE {
                    continue;
                }
                let domain = slot.split('-').next().unwrap_or_default();
                domains.push(domain.to_string());
            }
        }
        domains.sort();
        domains.dedup();
        dialogue.domains = domains;

        if options.keeps(&dialogue.domains) {
            prepared.push(dialogue);
        }
    }

    info!(
        dataset = %options.dataset,
        ?domain_counter,
        kept = prepared.len(),
        "prepared corpus"
    );
    prepared
}
