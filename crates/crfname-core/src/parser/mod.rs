pub mod decoder;
pub mod features;
pub mod instance;
pub mod labels;
pub mod tokenizer;

pub use decoder::{decode, Decoder};
pub use features::{Feature, FeatureConfig, FeatureExtractor, FeatureSet};
pub use instance::{Attribute, Instance, InstanceBuilder, Item, PLACEHOLDER_LABEL};
pub use labels::{public_label, NameColumn, LABEL_RENAMES};
pub use tokenizer::{Token, Tokenizer};
