// File: src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Malformed textual belief code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("belief code ended inside a slot name starting at token {0}; expected 'is'")]
    MissingIs(usize),
    #[error("belief code ended after 'is' at token {0}; expected a value")]
    MissingValue(usize),
    #[error("expected yes, no, dontcare or '\"' at token {position}, found '{found}'")]
    ExpectedQuote { position: usize, found: String },
    #[error("unterminated quoted value starting at token {0}")]
    UnterminatedValue(usize),
    #[error("empty quoted value at token {0}")]
    EmptyValue(usize),
}

/// A substitution that would corrupt the belief annotation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("slot '{0}' has a value in the old belief but not in the new one")]
    MissingSlot(String),
    #[error("categorical slot '{slot}' cannot change from '{old}' to '{new}'")]
    CategoricalChanged {
        slot: String,
        old: String,
        new: String,
    },
}

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid ontology: {0}")]
    Ontology(String),

    #[error("cannot register an empty phrase in a replace bag")]
    EmptyPhrase,

    #[error("malformed synthetic line {line}: expected 'id<TAB>sentence<TAB>belief'")]
    MalformedLine { line: usize },
}

impl AugmentError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = AugmentError> = std::result::Result<T, E>;
