use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, ValueEnum};
use crfname_core::corpus::{CorpusParserOptions, TrainingCorpus};
use crfname_core::train::TrainingConfig;
use crfname_trainer::{load_corpus, write_model, TrainingOrchestrator};
use tracing::{info, warn, Level};

/// Which kind of names the model is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelType {
    Person,
    Company,
    /// Union of a person and a company corpus
    Generic,
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train a CRF name parsing model from a labeled corpus")]
#[command(version)]
struct Cli {
    /// Labeled corpus file (not used with --type generic)
    input: Option<PathBuf>,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Model type
    #[arg(short = 't', long = "type", value_enum, default_value_t = ModelType::Person)]
    model_type: ModelType,

    /// Person corpus (generic models)
    #[arg(short, long)]
    person: Option<PathBuf>,

    /// Company corpus (generic models)
    #[arg(short, long)]
    company: Option<PathBuf>,

    /// L2 regularization coefficient
    #[arg(long, default_value_t = 1.0)]
    c2: f64,

    /// Maximum number of training iterations
    #[arg(long = "max-iter", default_value_t = 100)]
    max_iter: usize,

    /// Convergence threshold
    #[arg(long, default_value_t = 0.0001)]
    epsilon: f64,

    /// Skip malformed <Name> elements instead of failing
    #[arg(long)]
    lenient: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Training failed: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TrainingConfig::default()
        .with_c2(cli.c2)
        .with_max_iterations(cli.max_iter)
        .with_epsilon(cli.epsilon);
    config.validate()?;

    let options = CorpusParserOptions {
        strict: !cli.lenient,
    };
    let orchestrator = TrainingOrchestrator::new(config);

    let model = match cli.model_type {
        ModelType::Generic => {
            let (Some(person), Some(company)) = (&cli.person, &cli.company) else {
                bail!("--type generic requires both --person and --company");
            };
            info!("Training generic model");
            let person = load_or_empty(person, options);
            let company = load_or_empty(company, options);
            if cli.verbose {
                println!("{}", person.summary());
                println!("{}", company.summary());
            }
            orchestrator.train_generic(person, company)?
        }
        kind => {
            let Some(input) = &cli.input else {
                bail!("an input corpus file is required for --type {kind:?}");
            };
            info!("Training {kind:?} model from {}", input.display());
            let corpus = load_corpus(input, options)?;
            if cli.verbose {
                println!("{}", corpus.summary());
            }
            orchestrator.train(&corpus)?
        }
    };

    write_model(&model, &cli.output)?;
    info!(
        "Training complete: {} instances, {} labels, {} attributes",
        model.instance_count, model.label_count, model.attribute_count
    );
    Ok(())
}

/// A generic model still trains when one of its two corpora fails to load.
fn load_or_empty(path: &Path, options: CorpusParserOptions) -> TrainingCorpus {
    match load_corpus(path, options) {
        Ok(corpus) => corpus,
        Err(e) => {
            warn!("skipping corpus {}: {e:#}", path.display());
            TrainingCorpus::default()
        }
    }
}
