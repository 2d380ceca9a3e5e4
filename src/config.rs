// File: src/config.rs
use crate::error::{AugmentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_ONTOLOGY_PATH: &str = "data/clean-ontology.json";

/// Coin weights for the lexical augmentation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentProbabilities {
    /// Chance of swapping a punctuation token for a random one.
    pub punctuation_replace: f64,
    /// Chance of dropping a punctuation token that was not swapped.
    pub punctuation_drop: f64,
    /// Chance of replacing a user-mentioned slot value with another candidate.
    pub value_replace: f64,
}

impl AugmentProbabilities {
    pub fn validate(&self) -> Result<()> {
        check_probability("augment.punctuation_replace", self.punctuation_replace)?;
        check_probability("augment.punctuation_drop", self.punctuation_drop)?;
        check_probability("augment.value_replace", self.value_replace)
    }
}

/// Rejects NaN as well as values outside `[0, 1]`.
pub fn check_probability(name: &str, p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(AugmentError::Config(format!(
            "{} must be within [0, 1], got {}",
            name, p
        )))
    }
}

impl Default for AugmentProbabilities {
    fn default() -> Self {
        Self {
            punctuation_replace: 0.05,
            punctuation_drop: 0.05,
            value_replace: 0.8,
        }
    }
}

/// Runtime settings, read from a JSON file and overridden from the command line.
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub ontology_path: PathBuf,
    /// Seed for every random draw except corpus subsampling.
    pub seed: u64,
    /// Chance of skipping a synthetic line before it is looked up.
    pub skip_probability: f64,
    pub augment: AugmentProbabilities,
    pub only_domain: Option<String>,
    /// Unseen-domain setting; see [`crate::corpus::CorpusOptions`].
    pub except_domain: Option<String>,
    pub except_domain_dev: Option<String>,
    /// Percentage of the corpus kept after the seeded shuffle.
    pub data_ratio: u32,
    /// Augmented copies generated per source dialogue.
    pub copies: usize,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            ontology_path: PathBuf::from(DEFAULT_ONTOLOGY_PATH),
            seed: 0,
            skip_probability: 0.5,
            augment: AugmentProbabilities::default(),
            only_domain: None,
            except_domain: None,
            except_domain_dev: None,
            data_ratio: 100,
            copies: 1,
        }
    }
}

impl AugmentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| AugmentError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_probability("skip_probability", self.skip_probability)?;
        self.augment.validate()?;
        if self.data_ratio == 0 || self.data_ratio > 100 {
            return Err(AugmentError::Config(format!(
                "data_ratio must be within 1..=100, got {}",
                self.data_ratio
            )));
        }
        Ok(())
    }
}
