//! # crfname Trainer
//!
//! Offline model building: loads labeled corpus files, converts them into
//! training instances and fits a linear-chain CRF with L2-regularized SGD.
//! The `train` binary wraps this for the command line.

pub mod data;
pub mod l2sgd;
pub mod trainer;

pub use data::load_corpus;
pub use l2sgd::L2SgdTrainer;
pub use trainer::{write_model, TrainedModel, TrainingOrchestrator};
