use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::columns::ParsedNameColumns;
use crate::error::Result;

/// One labeled token of a parsed name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledComponent {
    /// Normalized token text.
    pub text: String,

    /// Public component label (e.g. `GivenName`, `CorporationLegalType`).
    pub label: String,

    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,

    /// Start offset in chars within the input.
    pub start_char: usize,

    /// End offset in chars (exclusive).
    pub end_char: usize,
}

/// The output of one decode call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Original input string.
    pub input: String,

    /// Labeled tokens in input order.
    pub tokens: Vec<LabeledComponent>,

    /// Sequence-level confidence reported by the tagger.
    pub overall_confidence: f64,

    /// Version of the model that produced the labels.
    pub model_version: String,

    /// Wall time spent decoding.
    #[serde(rename = "processing_time_ms", with = "duration_ms")]
    pub processing_time: Duration,
}

impl ParseResult {
    /// Creates an empty result for `input`.
    #[must_use]
    pub fn new(input: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            tokens: Vec::new(),
            overall_confidence: 0.0,
            model_version: model_version.into(),
            processing_time: Duration::ZERO,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(text, label)` rows in token order.
    pub fn rows(&self) -> Vec<(&str, &str)> {
        self.tokens
            .iter()
            .map(|t| (t.text.as_str(), t.label.as_str()))
            .collect()
    }

    /// The result as a single JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a document produced by [`ParseResult::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Bucket the tokens into fixed name-part columns.
    pub fn to_columns(&self) -> ParsedNameColumns {
        ParsedNameColumns::from_result(self)
    }
}

impl std::fmt::Display for ParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParseResult(")?;
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}/{}", token.text, token.label)?;
        }
        write!(f, ", conf={:.2}", self.overall_confidence)?;
        write!(f, ", model={}", self.model_version)?;
        write!(f, ")")
    }
}

mod duration_ms {
    use super::*;

    pub fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_nanos() as f64 / 1e6)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Duration, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "invalid processing time {millis}"
            )));
        }
        Ok(Duration::from_nanos((millis * 1e6).round() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(text: &str, label: &str, start: usize) -> LabeledComponent {
        LabeledComponent {
            text: text.into(),
            label: label.into(),
            confidence: 0.9,
            start_char: start,
            end_char: start + text.chars().count(),
        }
    }

    fn sample() -> ParseResult {
        let mut result = ParseResult::new("Jane Doe", "v1");
        result.tokens = vec![component("Jane", "GivenName", 0), component("Doe", "Surname", 5)];
        result.overall_confidence = 0.9;
        result.processing_time = Duration::from_millis(3);
        result
    }

    #[test]
    fn new_parse_result_is_empty() {
        let result = ParseResult::new("test input", "unknown");
        assert_eq!(result.input, "test input");
        assert!(result.is_empty());
        assert_eq!(result.overall_confidence, 0.0);
        assert_eq!(result.processing_time, Duration::ZERO);
    }

    #[test]
    fn parse_result_rows() {
        assert_eq!(
            sample().rows(),
            vec![("Jane", "GivenName"), ("Doe", "Surname")]
        );
    }

    #[test]
    fn parse_result_display() {
        let display = sample().to_string();
        assert!(display.contains("Jane/GivenName Doe/Surname"));
        assert!(display.contains("0.90"));
        assert!(display.contains("model=v1"));
    }

    #[test]
    fn parse_result_json_document() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tokens"][1]["label"], "Surname");
        assert_eq!(value["model_version"], "v1");
        assert_eq!(value["processing_time_ms"], 3.0);
    }

    #[test]
    fn parse_result_from_json() {
        let original = sample();
        let back = ParseResult::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(back.tokens, original.tokens);
        assert_eq!(back.processing_time.as_millis(), 3);
    }

    #[test]
    fn negative_processing_time_rejected() {
        let json = r#"{"input":"x","tokens":[],"overall_confidence":0.0,"model_version":"v","processing_time_ms":-1.0}"#;
        assert!(ParseResult::from_json(json).is_err());
    }
}
