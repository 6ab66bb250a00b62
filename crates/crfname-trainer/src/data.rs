//! Loading labeled corpus files.

use std::fs;
use std::path::Path;

use anyhow::Context;
use crfname_core::corpus::{CorpusParser, CorpusParserOptions, TrainingCorpus};
use tracing::info;

/// Read and parse one corpus file.
pub fn load_corpus<P: AsRef<Path>>(
    path: P,
    options: CorpusParserOptions,
) -> anyhow::Result<TrainingCorpus> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus file {}", path.display()))?;

    let corpus = CorpusParser::with_options(options)?
        .parse(&text)
        .with_context(|| format!("failed to parse corpus file {}", path.display()))?;

    info!(
        "loaded {} sequences ({} tokens) from {}",
        corpus.len(),
        corpus.token_count(),
        path.display()
    );
    Ok(corpus)
}
