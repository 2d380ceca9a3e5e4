// File: src/persistence.rs
use crate::core::continuation::ContinuationIndex;
use crate::core::types::Dialogue;
use crate::error::{AugmentError, Result};
use crate::ontology::Ontology;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| AugmentError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Writes `value` as JSON next to `path` and renames it into place, so a
/// crash never leaves a half-written corpus behind.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| AugmentError::io(parent_dir, e))?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| AugmentError::io(parent_dir, e))?;
    {
        let mut writer = BufWriter::new(&temp_file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush().map_err(|e| AugmentError::io(path, e))?;
    }
    temp_file
        .persist(path)
        .map_err(|e| AugmentError::io(path, e.error))?;
    Ok(())
}

/// Any dialogue missing a required field fails the whole load.
pub fn load_corpus(path: &Path) -> Result<Vec<Dialogue>> {
    let corpus: Vec<Dialogue> = read_json(path)?;
    info!(path = %path.display(), dialogues = corpus.len(), "loaded corpus");
    Ok(corpus)
}

pub fn load_ontology(path: &Path) -> Result<Ontology> {
    let value: serde_json::Value = read_json(path)?;
    let ontology = Ontology::from_value(&value)?;
    info!(path = %path.display(), slots = ontology.len(), "loaded ontology");
    Ok(ontology)
}

/// Reads every line of a synthetic utterance file, blanks included, so
/// positions map back to file line numbers.
pub fn read_synthetic_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| AugmentError::io(path, e))?;
    BufReader::new(file)
        .lines()
        .map(|line| line.map_err(|e| AugmentError::io(path, e)))
        .collect()
}

pub fn save_index(index: &ContinuationIndex, path: &Path) -> Result<()> {
    save_json(index, path)?;
    info!(path = %path.display(), signatures = index.len(), "saved continuation index");
    Ok(())
}

pub fn load_index(path: &Path) -> Result<ContinuationIndex> {
    read_json(path)
}
