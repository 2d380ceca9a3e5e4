// src/lib.rs

pub mod core {
    pub mod belief;
    pub mod continuation;
    pub mod labels;
    pub mod replace_bag;
    pub mod rewriter;
    pub mod types;
}
pub mod augmenter;
pub mod config;
pub mod corpus;
pub mod error;
pub mod ontology;
pub mod persistence;
pub mod synthesis;

pub use crate::augmenter::Augmenter;
pub use crate::core::continuation::ContinuationIndex;
pub use crate::core::replace_bag::ReplaceBag;
pub use crate::error::{AugmentError, Result};
pub use crate::ontology::Ontology;
pub use crate::synthesis::Synthesizer;
