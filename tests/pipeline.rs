use augment_core::config::AugmentProbabilities;
use augment_core::core::types::{BeliefRecord, Dialogue};
use augment_core::corpus::{prepare_corpus, CorpusOptions};
use augment_core::persistence;
use augment_core::{Augmenter, ContinuationIndex, Synthesizer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::fs;
use std::path::Path;

fn write_fixtures(dir: &Path) {
    let ontology = json!({
        "hotel-name": ["acorn guest house"],
        "hotel-area": ["west", "east"],
        "hotel-parking": ["yes", "no"],
        "police-name": ["parkside police station"]
    });
    let corpus = json!([
        {
            "dialogue_idx": "PMUL0001.json",
            "domains": ["hotel"],
            "dialogue": [
                {
                    "system_transcript": "",
                    "transcript": "i want the cambridge belfry",
                    "turn_idx": 0,
                    "belief_state": [{"slots": [["hotel-name", "the cambridge belfry"]], "act": "inform"}],
                    "turn_label": [["hotel-name", "the cambridge belfry"]],
                    "system_acts": [],
                    "domain": "hotel"
                },
                {
                    "system_transcript": "the cambridge belfry is in the west .",
                    "transcript": "great , thanks",
                    "turn_idx": 1,
                    "belief_state": [{"slots": [["hotel-name", "the cambridge belfry"]], "act": "inform"}],
                    "turn_label": [],
                    "system_acts": [],
                    "domain": "hotel"
                },
                {
                    "system_transcript": "anything else ?",
                    "transcript": "no",
                    "turn_idx": 2,
                    "belief_state": [{"slots": [["hotel-name", "the cambridge belfry"]], "act": "inform"}],
                    "turn_label": [],
                    "system_acts": [],
                    "domain": "hotel"
                }
            ]
        },
        {
            "dialogue_idx": "SNG0002.json",
            "domains": ["police"],
            "dialogue": [{
                "system_transcript": "",
                "transcript": "where is the police station",
                "turn_idx": 0,
                "belief_state": [],
                "turn_label": [],
                "domain": "police"
            }]
        }
    ]);
    fs::write(dir.join("ontology.json"), ontology.to_string()).unwrap();
    fs::write(dir.join("train_dials.json"), corpus.to_string()).unwrap();
    fs::write(
        dir.join("synthetic.tsv"),
        "s1\tbook acorn guest house\thotel name is \"acorn guest house\"\n\
         s2\tfree parking please\thotel parking is yes\n\
         s3\thello\tnone\n",
    )
    .unwrap();
}

#[test]
fn synthesis_survives_an_index_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let ontology = persistence::load_ontology(&dir.path().join("ontology.json")).unwrap();
    assert!(!ontology.contains_slot("police-name"));

    let corpus = persistence::load_corpus(&dir.path().join("train_dials.json")).unwrap();
    let corpus = prepare_corpus(corpus, &ontology, &CorpusOptions::default());
    assert_eq!(corpus.len(), 1);

    let cache = dir.path().join("cache").join("continuations.json");
    persistence::save_index(&ContinuationIndex::build(&corpus, &ontology), &cache).unwrap();
    let index = persistence::load_index(&cache).unwrap();
    assert_eq!(index.total(), 1);

    let lines = persistence::read_synthetic_lines(&dir.path().join("synthetic.tsv")).unwrap();
    let synthesizer = Synthesizer::new(&index, &ontology, 0.0).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let mut synthesis = synthesizer.process(lines, &mut rng);
    let mut out: Vec<Dialogue> = synthesis.by_ref().collect();
    assert_eq!(synthesis.stats().empty_belief, 1);
    assert_eq!(synthesis.stats().yielded(), 2);

    let output = dir.path().join("train_synth.json");
    persistence::save_json(&out, &output).unwrap();
    let reloaded = persistence::load_corpus(&output).unwrap();
    assert_eq!(reloaded, out);

    out.sort_by(|a, b| a.dialogue_idx.cmp(&b.dialogue_idx));
    let spliced = &out[0];
    assert_eq!(spliced.dialogue_idx, "s1+PMUL0001.json");
    assert_eq!(spliced.dialogue.len(), 3);
    assert_eq!(spliced.dialogue[1].system_transcript, "acorn guest house is in the west .");
    assert_eq!(
        spliced.dialogue[1].original_system_transcript.as_deref(),
        Some("the cambridge belfry is in the west .")
    );
    assert_eq!(
        spliced.dialogue[2].belief_state,
        vec![BeliefRecord::inform("hotel-name", "acorn guest house")]
    );

    let single = &out[1];
    assert_eq!(single.dialogue_idx, "s2");
    assert_eq!(single.dialogue.len(), 1);
    assert_eq!(single.dialogue[0].turn_label, vec![("hotel-parking".to_string(), "yes".to_string())]);
}

#[test]
fn augmentation_keeps_one_substitution_per_dialogue() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let ontology = persistence::load_ontology(&dir.path().join("ontology.json")).unwrap();
    let corpus = persistence::load_corpus(&dir.path().join("train_dials.json")).unwrap();
    let corpus = prepare_corpus(corpus, &ontology, &CorpusOptions::default());

    let probabilities = AugmentProbabilities {
        punctuation_replace: 0.0,
        punctuation_drop: 0.0,
        value_replace: 1.0,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut dialogue = corpus[0].clone();
    let mut augmenter = Augmenter::new(&ontology, None, probabilities).unwrap();
    augmenter.augment(&mut dialogue, &mut rng).unwrap();

    let transcripts: Vec<(&str, &str)> = dialogue
        .dialogue
        .iter()
        .map(|t| (t.system_transcript.as_str(), t.transcript.as_str()))
        .collect();
    assert_eq!(
        transcripts,
        vec![
            ("", "i want acorn guest house"),
            ("acorn guest house is in the west .", "great , thanks"),
            ("anything else ?", "no"),
        ]
    );
    for turn in &dialogue.dialogue {
        assert_eq!(turn.belief_state, vec![BeliefRecord::inform("hotel-name", "acorn guest house")]);
    }
    assert_eq!(dialogue.dialogue[0].original_transcript.as_deref(), Some("i want the cambridge belfry"));
    assert_eq!(
        augmenter.new_slot_values().get("hotel-name").map(String::as_str),
        Some("acorn guest house")
    );
}
