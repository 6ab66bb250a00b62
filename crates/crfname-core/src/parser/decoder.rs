//! # Decoder
//!
//! The inference path: tokenize, extract features with the model's own
//! settings, resolve them against the model's attribute dictionary, run the
//! tagger and map the predicted label ids back to public component names.

use std::time::Instant;

use tracing::debug;

use crate::error::{CrfNameError, Result};
use crate::model::Model;
use crate::parser::instance::InstanceBuilder;
use crate::parser::labels::public_label;
use crate::parser::tokenizer::Tokenizer;
use crate::types::{LabeledComponent, ParseResult};

/// Runs the tagger of a [`Model`] over free text.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    tokenizer: Tokenizer,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label every token of `text` with `model`.
    ///
    /// # Errors
    ///
    /// * `ModelNotLoaded` if `model` is `None` or cannot decode
    /// * `EmptyInput` if tokenization yields no tokens
    /// * `Prediction` if the tagger fails or returns label ids the model
    ///   does not know
    ///
    /// # Examples
    /// ```
    /// use crfname_core::parser::Decoder;
    /// use crfname_core::CrfNameError;
    ///
    /// let err = Decoder::new().decode("Jane Doe", None).unwrap_err();
    /// assert!(matches!(err, CrfNameError::ModelNotLoaded(_)));
    /// ```
    pub fn decode(&self, text: &str, model: Option<&Model>) -> Result<ParseResult> {
        let start = Instant::now();

        let model = match model {
            Some(model) if model.is_loaded() => model,
            Some(model) => return Err(CrfNameError::ModelNotLoaded(model.name().to_string())),
            None => return Err(CrfNameError::ModelNotLoaded("no model supplied".into())),
        };

        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return Err(CrfNameError::EmptyInput);
        }

        let builder = InstanceBuilder::new(*model.feature_config());
        let instance = builder.build_inference(&tokens, model.attributes());
        let tagging = model.tagger().viterbi(&instance)?;

        if tagging.labels.len() != tokens.len() {
            return Err(CrfNameError::Prediction(format!(
                "tagger returned {} labels for {} tokens",
                tagging.labels.len(),
                tokens.len()
            )));
        }
        if !tagging.score.is_finite() {
            return Err(CrfNameError::Prediction(format!(
                "tagger returned non-finite score {}",
                tagging.score
            )));
        }

        let mut components = Vec::with_capacity(tokens.len());
        for (token, &id) in tokens.iter().zip(&tagging.labels) {
            let label = model.labels().to_str(id).ok_or_else(|| {
                CrfNameError::Prediction(format!(
                    "label id {id} outside the {} labels of model '{}'",
                    model.labels().len(),
                    model.name()
                ))
            })?;

            components.push(LabeledComponent {
                text: token.text.clone(),
                label: public_label(label).to_string(),
                confidence: tagging.score,
                start_char: token.start_char,
                end_char: token.end_char,
            });
        }

        let mut result = ParseResult::new(text, model.version());
        result.tokens = components;
        result.overall_confidence = tagging.score;
        result.processing_time = start.elapsed();

        debug!(
            "decoded {} tokens with model '{}' (conf={:.3})",
            result.len(),
            model.name(),
            result.overall_confidence
        );
        Ok(result)
    }
}

/// Decode `text` with a default [`Decoder`].
pub fn decode(text: &str, model: Option<&Model>) -> Result<ParseResult> {
    Decoder::new().decode(text, model)
}
