//! woz-augment: builds continuation indexes, splices synthetic first turns
//! onto real dialogues, and writes lexically augmented corpus copies.
//!
//! Usage:
//!   woz-augment --ontology data/clean-ontology.json index \
//!     --corpus data/train_dials.json --output data/continuations.json
//!
//!   woz-augment --seed 3 synthesize --corpus data/train_dials.json \
//!     --synthetic data/synthetic.tsv --output data/train_synth.json \
//!     --index-cache data/continuations.json --include-original
//!
//!   woz-augment --only-domain hotel augment --corpus data/train_dials.json \
//!     --output data/train_aug.json --copies 2

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use crossterm::style::Stylize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use augment_core::augmenter::Augmenter;
use augment_core::config::AugmentConfig;
use augment_core::core::continuation::ContinuationIndex;
use augment_core::core::types::Dialogue;
use augment_core::corpus::{prepare_corpus, CorpusOptions, DatasetKind};
use augment_core::ontology::Ontology;
use augment_core::persistence;
use augment_core::synthesis::Synthesizer;

#[derive(Parser, Debug)]
#[command(name = "woz-augment")]
#[command(about = "Data augmentation for multi-domain dialogue state tracking")]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Ontology JSON (slot key -> candidate values)
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Percentage of the corpus to keep (1-100)
    #[arg(long, global = true)]
    data_ratio: Option<u32>,

    /// Keep only dialogues touching this domain
    #[arg(long, global = true)]
    only_domain: Option<String>,

    /// Hold this domain out of train/dev; keep only it in test
    #[arg(long, global = true)]
    except_domain: Option<String>,

    /// Hold this domain out of dev only
    #[arg(long, global = true)]
    except_domain_dev: Option<String>,

    /// Which split the corpus is (train, dev or test)
    #[arg(long, global = true, default_value_t = DatasetKind::Train)]
    dataset: DatasetKind,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the continuation index and cache it as JSON
    Index {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
    /// Splice synthetic first turns onto continuations of real dialogues
    Synthesize {
        #[arg(long)]
        corpus: PathBuf,
        /// Tab separated `id, sentence, belief code` lines
        #[arg(long)]
        synthetic: PathBuf,
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Reuse this index if it exists, otherwise build and write it
        #[arg(long)]
        index_cache: Option<PathBuf>,
        /// Write the prepared corpus ahead of the synthesized dialogues
        #[arg(long)]
        include_original: bool,
    },
    /// Write the corpus followed by lexically augmented copies
    Augment {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Augmented copies per dialogue
        #[arg(long)]
        copies: Option<usize>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<AugmentConfig> {
    let mut config = match &cli.config {
        Some(path) => AugmentConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AugmentConfig::default(),
    };
    if let Some(path) = &cli.ontology {
        config.ontology_path = path.clone();
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(ratio) = cli.data_ratio {
        config.data_ratio = ratio;
    }
    if let Some(domain) = &cli.only_domain {
        config.only_domain = Some(domain.clone());
    }
    if let Some(domain) = &cli.except_domain {
        config.except_domain = Some(domain.clone());
    }
    if let Some(domain) = &cli.except_domain_dev {
        config.except_domain_dev = Some(domain.clone());
    }
    if let Command::Augment { copies: Some(copies), .. } = &cli.command {
        config.copies = *copies;
    }
    config.validate().context("invalid settings")?;
    Ok(config)
}

fn load_prepared(
    path: &Path,
    ontology: &Ontology,
    config: &AugmentConfig,
    dataset: DatasetKind,
) -> Result<Vec<Dialogue>> {
    let corpus = persistence::load_corpus(path)
        .with_context(|| format!("loading corpus {}", path.display()))?;
    let options = CorpusOptions {
        dataset,
        data_ratio: config.data_ratio,
        only_domain: config.only_domain.clone(),
        except_domain: config.except_domain.clone(),
        except_domain_dev: config.except_domain_dev.clone(),
    };
    Ok(prepare_corpus(corpus, ontology, &options))
}

fn load_or_build_index(
    cache: Option<&Path>,
    corpus: &[Dialogue],
    ontology: &Ontology,
) -> Result<ContinuationIndex> {
    match cache {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "reusing cached continuation index");
            persistence::load_index(path)
                .with_context(|| format!("loading index cache {}", path.display()))
        }
        Some(path) => {
            let index = ContinuationIndex::build(corpus, ontology);
            persistence::save_index(&index, path)
                .with_context(|| format!("writing index cache {}", path.display()))?;
            Ok(index)
        }
        None => Ok(ContinuationIndex::build(corpus, ontology)),
    }
}

fn write_output(dialogues: &[Dialogue], output: &Path) -> Result<()> {
    persistence::save_json(dialogues, output)
        .with_context(|| format!("writing {}", output.display()))
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let ontology = persistence::load_ontology(&config.ontology_path)
        .with_context(|| format!("loading ontology {}", config.ontology_path.display()))?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let start = Instant::now();

    match cli.command {
        Command::Index { corpus, output } => {
            let corpus = load_prepared(&corpus, &ontology, &config, cli.dataset)?;
            let index = ContinuationIndex::build(&corpus, &ontology);
            persistence::save_index(&index, &output)
                .with_context(|| format!("writing index {}", output.display()))?;

            println!("\n{}", "Continuation index".bold());
            println!("  Dialogues:   {}", corpus.len());
            println!("  Signatures:  {}", index.len());
            println!("  Suffixes:    {}", index.total().to_string().green());
            println!("  Written to:  {}", output.display());
        }
        Command::Synthesize {
            corpus,
            synthetic,
            output,
            index_cache,
            include_original,
        } => {
            let corpus = load_prepared(&corpus, &ontology, &config, cli.dataset)?;
            let index = load_or_build_index(index_cache.as_deref(), &corpus, &ontology)?;
            let lines = persistence::read_synthetic_lines(&synthetic)
                .with_context(|| format!("reading synthetic lines {}", synthetic.display()))?;

            let synthesizer = Synthesizer::new(&index, &ontology, config.skip_probability)?;
            let mut synthesis = synthesizer.process(lines, &mut rng);
            let synthesized: Vec<Dialogue> = synthesis.by_ref().collect();
            let stats = synthesis.stats();
            if stats.malformed > 0 {
                let mut skipped = synthesis.malformed_lines().to_vec();
                skipped.sort_unstable();
                warn!(?skipped, "some synthetic lines were skipped");
            }

            let mut dialogues = if include_original { corpus } else { Vec::new() };
            let originals = dialogues.len();
            dialogues.extend(synthesized);
            write_output(&dialogues, &output)?;

            println!("\n{}", "Synthesis".bold());
            println!("  Lines read:           {}", stats.lines);
            println!("  Spliced:              {}", stats.spliced.to_string().green());
            println!("  Single turn:          {}", stats.single_turn.to_string().green());
            println!("  Empty belief:         {}", stats.empty_belief);
            println!("  Subsampled away:      {}", stats.subsampled);
            println!("  Unused substitution:  {}", stats.unused_substitution.to_string().yellow());
            println!("  Inconsistent:         {}", stats.inconsistent.to_string().yellow());
            println!("  Malformed:            {}", stats.malformed.to_string().red());
            println!("  Written:              {} ({} original)", dialogues.len(), originals);
        }
        Command::Augment { corpus, output, .. } => {
            let corpus = load_prepared(&corpus, &ontology, &config, cli.dataset)?;
            let mut augmented = Vec::with_capacity(corpus.len() * config.copies);
            let mut failed = 0;
            for source in &corpus {
                for copy in 1..=config.copies {
                    let mut dialogue = source.clone();
                    let mut augmenter =
                        Augmenter::new(&ontology, config.only_domain.clone(), config.augment)?;
                    if let Err(err) = augmenter.augment(&mut dialogue, &mut rng) {
                        warn!(id = %source.dialogue_idx, %err, "skipping augmented copy");
                        failed += 1;
                        continue;
                    }
                    dialogue.dialogue_idx = format!("{}+aug{}", source.dialogue_idx, copy);
                    augmented.push(dialogue);
                }
            }

            let copies = augmented.len();
            let mut dialogues = corpus;
            dialogues.extend(augmented);
            write_output(&dialogues, &output)?;

            println!("\n{}", "Augmentation".bold());
            println!("  Source dialogues:  {}", dialogues.len() - copies);
            println!("  Augmented copies:  {}", copies.to_string().green());
            println!("  Failed:            {}", failed.to_string().red());
            println!("  Written to:        {}", output.display());
        }
    }

    println!("  Duration:          {:?}", start.elapsed());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
