//! # Instance Construction
//!
//! Turns a token sequence into the id-based representation consumed by the
//! tagger and the trainer. Feature names are resolved through the model's
//! attribute dictionary: training grows the dictionary, inference never does
//! and silently drops features the model has not seen.

use serde::{Deserialize, Serialize};

use crate::corpus::LabeledSequence;
use crate::dictionary::Dictionary;
use crate::parser::features::{FeatureConfig, FeatureExtractor, FeatureSet};

/// Label id assigned to every item of an inference instance. Carries no
/// meaning and must never be decoded.
pub const PLACEHOLDER_LABEL: u32 = 0;

/// A weighted attribute resolved to its dictionary id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: u32,
    pub weight: f64,
}

/// All attributes of one token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub attributes: Vec<Attribute>,
}

/// One sequence in model-ready form: one item and one label id per token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub items: Vec<Item>,
    pub labels: Vec<u32>,
}

impl Instance {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builds instances with a fixed feature extractor.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    extractor: FeatureExtractor,
}

impl InstanceBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(config),
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Build a training instance, inserting unseen labels and feature names.
    pub fn build_training(
        &self,
        sequence: &LabeledSequence,
        labels: &mut Dictionary,
        attributes: &mut Dictionary,
    ) -> Instance {
        let tokens = &sequence.tokens;
        let mut instance = Instance {
            items: Vec::with_capacity(tokens.len()),
            labels: Vec::with_capacity(tokens.len()),
        };

        for (position, token) in tokens.iter().enumerate() {
            let features = self.extractor.extract(tokens, position);
            let item = Item {
                attributes: features
                    .iter()
                    .map(|f| Attribute {
                        id: attributes.get_or_insert(&f.name),
                        weight: f.weight,
                    })
                    .collect(),
            };
            instance.items.push(item);
            instance.labels.push(labels.get_or_insert(&token.label));
        }

        instance
    }

    /// Build an inference instance against a read-only attribute dictionary.
    pub fn build_inference<T: AsRef<str>>(&self, tokens: &[T], attributes: &Dictionary) -> Instance {
        let items: Vec<Item> = self
            .extractor
            .extract_all(tokens)
            .iter()
            .map(|features| resolve_known(features, attributes))
            .collect();

        Instance {
            labels: vec![PLACEHOLDER_LABEL; items.len()],
            items,
        }
    }
}

fn resolve_known(features: &FeatureSet, attributes: &Dictionary) -> Item {
    Item {
        attributes: features
            .iter()
            .filter_map(|f| {
                attributes.to_id(&f.name).map(|id| Attribute {
                    id,
                    weight: f.weight,
                })
            })
            .collect(),
    }
}
