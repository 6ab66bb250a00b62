//! # crfname Core
//!
//! Sequence labeling of person and company names. Tokenizes free text,
//! extracts a fixed feature vocabulary per token, and decodes component
//! labels (given name, surname, corporation type, ...) with a linear-chain
//! CRF held in a [`ModelRegistry`].
//!
//! ## Quick Start
//!
//! ```rust
//! use crfname_core::parser::{FeatureExtractor, Tokenizer};
//!
//! let tokens = Tokenizer::new().tokenize("Mr. John Kennedy Jr.");
//! let features = FeatureExtractor::default().extract(&tokens, 0);
//!
//! assert!(features.contains("token:Mr."));
//! assert_eq!(features.iter().last().map(|f| f.name.as_str()), Some("bias"));
//! ```
pub mod corpus;
pub mod crf;
pub mod dictionary;
pub mod error;
pub mod model;
pub mod parser;
pub mod registry;
pub mod train;
pub mod types;

// Re-export primary API
pub use corpus::{
    CorpusParser, CorpusParserOptions, CorpusSummary, LabeledSequence, LabeledToken,
    TrainingCorpus,
};
pub use crf::{CrfBackend, CrfModel, CrfParameters, CrfTagger};
pub use dictionary::Dictionary;
pub use error::{CrfNameError, ErrorCategory, Result};
pub use model::{Model, ModelBackend, OpenedModel, Tagger, Tagging, UNKNOWN_VERSION};
pub use parser::{
    decode, Decoder, FeatureConfig, FeatureExtractor, FeatureSet, Instance, InstanceBuilder,
    NameColumn, Token, Tokenizer,
};
pub use registry::{ModelRegistry, ModelSource};
pub use train::{Trainer, TrainingConfig, TrainingData};
pub use types::{LabeledComponent, ParseResult, ParsedNameColumns};
