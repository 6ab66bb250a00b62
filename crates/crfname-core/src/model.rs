//! # Loaded Models
//!
//! A [`Model`] bundles the label dictionary, the attribute dictionary, the
//! feature settings used at training time and a [`Tagger`] over the learned
//! parameters. Models are immutable once built; concurrent decodes only read.

use std::fmt;

use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::parser::features::FeatureConfig;
use crate::parser::instance::Instance;

/// Version recorded when the source of a model does not carry one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Best label sequence for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagging {
    /// One label id per item
    pub labels: Vec<u32>,
    /// Sequence-level confidence in `[0.0, 1.0]`
    pub score: f64,
}

/// Decodes instances against learned parameters.
pub trait Tagger: Send + Sync {
    /// Most likely label-id sequence for `instance`. Instance label ids are
    /// ignored.
    fn viterbi(&self, instance: &Instance) -> Result<Tagging>;
}

/// What a backend hands back after opening a model blob.
pub struct OpenedModel {
    pub labels: Dictionary,
    pub attributes: Dictionary,
    pub feature_config: FeatureConfig,
    pub tagger: Box<dyn Tagger>,
}

/// Turns serialized model bytes into dictionaries plus a tagger.
pub trait ModelBackend: Send + Sync {
    /// # Errors
    ///
    /// `ModelLoadFailed` when the blob is malformed.
    fn open(&self, bytes: &[u8]) -> Result<OpenedModel>;
}

/// A fully loaded, named model.
pub struct Model {
    name: String,
    version: String,
    labels: Dictionary,
    attributes: Dictionary,
    feature_config: FeatureConfig,
    tagger: Box<dyn Tagger>,
}

impl Model {
    pub fn new(name: impl Into<String>, version: impl Into<String>, opened: OpenedModel) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            labels: opened.labels,
            attributes: opened.attributes,
            feature_config: opened.feature_config,
            tagger: opened.tagger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn labels(&self) -> &Dictionary {
        &self.labels
    }

    pub fn attributes(&self) -> &Dictionary {
        &self.attributes
    }

    pub fn feature_config(&self) -> &FeatureConfig {
        &self.feature_config
    }

    pub fn tagger(&self) -> &dyn Tagger {
        self.tagger.as_ref()
    }

    /// A model can decode only if it knows at least one label.
    pub fn is_loaded(&self) -> bool {
        !self.labels.is_empty()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("labels", &self.labels.len())
            .field("attributes", &self.attributes.len())
            .field("feature_config", &self.feature_config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTagger;

    impl Tagger for FixedTagger {
        fn viterbi(&self, instance: &Instance) -> Result<Tagging> {
            Ok(Tagging {
                labels: vec![0; instance.len()],
                score: 1.0,
            })
        }
    }

    fn opened(labels: &[&str]) -> OpenedModel {
        OpenedModel {
            labels: labels.iter().collect(),
            attributes: Dictionary::new(),
            feature_config: FeatureConfig::default(),
            tagger: Box::new(FixedTagger),
        }
    }

    #[test]
    fn test_model_accessors() {
        let model = Model::new("person", "2024-01", opened(&["GIVEN", "SURNAME"]));

        assert_eq!(model.name(), "person");
        assert_eq!(model.version(), "2024-01");
        assert_eq!(model.labels().len(), 2);
        assert!(model.is_loaded());
    }

    #[test]
    fn test_model_without_labels_is_not_loaded() {
        let model = Model::new("empty", UNKNOWN_VERSION, opened(&[]));
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_debug_omits_tagger() {
        let model = Model::new("person", "v1", opened(&["GIVEN"]));
        let debug = format!("{model:?}");
        assert!(debug.contains("person"));
        assert!(debug.contains(".."));
    }
}
