//! # Linear-Chain CRF Model Format
//!
//! Learned parameters plus everything needed to rebuild the exact inference
//! pipeline: both dictionaries and the feature settings. Serialized as one
//! JSON document.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crf::tagger::CrfTagger;
use crate::dictionary::Dictionary;
use crate::error::{CrfNameError, Result};
use crate::model::{ModelBackend, OpenedModel};
use crate::parser::features::FeatureConfig;
use crate::parser::instance::Instance;

/// Format tag written into every model blob.
pub const MODEL_FORMAT: &str = "crfname-crf1d";

/// Current version of the blob layout.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// State and transition weights of a linear-chain CRF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrfParameters {
    /// Indexed by attribute id: the non-zero `(label id, weight)` pairs.
    pub state: Vec<Vec<(u32, f64)>>,
    /// `transitions[prev][curr]`, dense `num_labels x num_labels`.
    pub transitions: Vec<Vec<f64>>,
}

impl CrfParameters {
    /// All-zero parameters.
    pub fn zeros(num_attributes: usize, num_labels: usize) -> Self {
        Self {
            state: vec![Vec::new(); num_attributes],
            transitions: vec![vec![0.0; num_labels]; num_labels],
        }
    }

    /// Sparsify dense weights. `state` is laid out `attribute * num_labels + label`,
    /// `transitions` is `prev * num_labels + curr`.
    pub fn from_dense(num_labels: usize, state: &[f64], transitions: &[f64]) -> Self {
        let state = if num_labels == 0 {
            Vec::new()
        } else {
            state
                .chunks(num_labels)
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .filter(|(_, w)| **w != 0.0)
                        .map(|(label, w)| (label as u32, *w))
                        .collect()
                })
                .collect()
        };

        let transitions = (0..num_labels)
            .map(|prev| transitions[prev * num_labels..(prev + 1) * num_labels].to_vec())
            .collect();

        Self { state, transitions }
    }

    pub fn num_labels(&self) -> usize {
        self.transitions.len()
    }

    pub fn num_attributes(&self) -> usize {
        self.state.len()
    }

    /// Per-position label scores of `instance`: the weighted sum of the
    /// state weights of its attributes.
    pub fn state_scores(&self, instance: &Instance) -> Vec<Vec<f64>> {
        let num_labels = self.num_labels();
        instance
            .items
            .iter()
            .map(|item| {
                let mut scores = vec![0.0; num_labels];
                for attr in &item.attributes {
                    let Some(weights) = self.state.get(attr.id as usize) else {
                        continue;
                    };
                    for &(label, weight) in weights {
                        scores[label as usize] += weight * attr.weight;
                    }
                }
                scores
            })
            .collect()
    }
}

/// A trained model as stored on disk or in the datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrfModel {
    pub format: String,
    pub format_version: u32,
    pub labels: Dictionary,
    pub attributes: Dictionary,
    pub feature_config: FeatureConfig,
    pub parameters: CrfParameters,
}

impl CrfModel {
    pub fn new(
        labels: Dictionary,
        attributes: Dictionary,
        feature_config: FeatureConfig,
        parameters: CrfParameters,
    ) -> Self {
        Self {
            format: MODEL_FORMAT.to_string(),
            format_version: MODEL_FORMAT_VERSION,
            labels,
            attributes,
            feature_config,
            parameters,
        }
    }

    /// Serialize to the blob format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse and validate a blob.
    ///
    /// # Errors
    ///
    /// `ModelLoadFailed` when the bytes are not a well-formed model.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: CrfModel = serde_json::from_slice(bytes)
            .map_err(|e| CrfNameError::ModelLoadFailed(format!("malformed model blob: {e}")))?;
        model.validate()?;
        debug!(
            "opened CRF model: {} labels, {} attributes",
            model.labels.len(),
            model.attributes.len()
        );
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(CrfNameError::ModelLoadFailed(msg));

        if self.format != MODEL_FORMAT {
            return fail(format!("unsupported model format {:?}", self.format));
        }
        if self.format_version != MODEL_FORMAT_VERSION {
            return fail(format!(
                "unsupported model format version {}",
                self.format_version
            ));
        }

        let num_labels = self.labels.len();
        if num_labels == 0 {
            return fail("model has no labels".into());
        }
        let params = &self.parameters;
        if params.num_labels() != num_labels
            || params.transitions.iter().any(|row| row.len() != num_labels)
        {
            return fail(format!(
                "transition matrix does not match {num_labels} labels"
            ));
        }
        if params.num_attributes() != self.attributes.len() {
            return fail(format!(
                "{} state rows for {} attributes",
                params.num_attributes(),
                self.attributes.len()
            ));
        }

        let bad_state = params
            .state
            .iter()
            .flatten()
            .any(|&(label, weight)| label as usize >= num_labels || !weight.is_finite());
        let bad_transition = params.transitions.iter().flatten().any(|w| !w.is_finite());
        if bad_state || bad_transition {
            return fail("weights out of range".into());
        }

        Ok(())
    }
}

/// [`ModelBackend`] for [`CrfModel`] blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrfBackend;

impl ModelBackend for CrfBackend {
    fn open(&self, bytes: &[u8]) -> Result<OpenedModel> {
        let CrfModel {
            labels,
            attributes,
            feature_config,
            parameters,
            ..
        } = CrfModel::from_bytes(bytes)?;

        Ok(OpenedModel {
            labels,
            attributes,
            feature_config,
            tagger: Box::new(CrfTagger::new(parameters)),
        })
    }
}
