//! Built-in linear-chain CRF backend: model blob format, Viterbi tagger and
//! the lattice recursions trainers need for gradients.

pub mod lattice;
pub mod model;
pub mod tagger;
pub mod viterbi;

pub use lattice::{log_sum_exp, path_score, Lattice};
pub use model::{CrfBackend, CrfModel, CrfParameters, MODEL_FORMAT, MODEL_FORMAT_VERSION};
pub use tagger::CrfTagger;
pub use viterbi::ViterbiDecoder;
