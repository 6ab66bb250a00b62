//! # Feature Extraction
//!
//! Turns a token and its sequence context into named, weighted features for
//! the CRF. Extraction is a pure function of the token texts and the
//! position, so the features computed while training a model are exactly the
//! ones computed when the model is later used for decoding.
//!
//! ## Vocabulary
//!
//! Feature names follow a `group:value` convention (a single `:`); boolean
//! features carry no value part. Groups are emitted in this fixed order:
//!
//! | group | features |
//! |---|---|
//! | identity | `token:<raw>`, `lower:<lower>`, `nopunc:<lower without punctuation>` |
//! | shape | `shape:<X/x/d/punct>` |
//! | affix | `prefix_1..4:<p>`, then `suffix_1..4:<s>` of the nopunc text |
//! | case | `is_capitalized`, `is_all_caps`, `is_all_lower` |
//! | length | `length` (weight = char count), `length:single/two/short/long` |
//! | character | `has_digit`, `has_punct`, `has_hyphen`, `has_dot`, `ends_with_dot`, `is_numeric` |
//! | context | `prev_k:<text>` / `next_k:<text>` (0.8), `prev_k:BOS` / `next_k:EOS` (0.5) |
//! | position | `is_first`, `is_last`, `pos:early/middle/late`, `position:<n>` (0.5) |
//! | bias | `bias`, always last |
//!
//! Length buckets: 1 char is `single`, 2 is `two`, 3-4 is `short`, 10 or
//! more is `long`; 5-9 chars emit no bucket.

use serde::{Deserialize, Serialize};

/// Maximum feature-name length in bytes, including a reserved terminator byte.
pub const MAX_FEATURE_NAME_LEN: usize = 128;

/// Number of neighbouring tokens inspected on each side.
pub const CONTEXT_WINDOW: usize = 2;

/// Longest prefix/suffix emitted by the affix group.
pub const MAX_AFFIX_LEN: usize = 4;

/// Weight of identity, shape, flag and bias features.
pub const FEATURE_WEIGHT: f64 = 1.0;

/// Weight of `prev_k` / `next_k` features naming a real neighbour.
pub const CONTEXT_WEIGHT: f64 = 0.8;

/// Weight of the `BOS` / `EOS` context sentinels.
pub const SENTINEL_WEIGHT: f64 = 0.5;

/// Weight of the exact `position:<n>` feature.
pub const POSITION_WEIGHT: f64 = 0.5;

/// Name of the constant feature present on every token.
pub const BIAS_FEATURE: &str = "bias";

/// A named, weighted signal for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub weight: f64,
}

/// Insertion-ordered features for one token. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            features: Vec::with_capacity(capacity),
        }
    }

    /// Append a feature, truncating over-long names on a char boundary.
    pub fn add(&mut self, name: impl Into<String>, weight: f64) {
        let mut name = name.into();
        truncate_name(&mut name);
        self.features.push(Feature { name, weight });
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn as_slice(&self) -> &[Feature] {
        &self.features
    }

    /// Feature names in emission order.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Weight of the first feature with the given name.
    pub fn weight_of(&self, name: &str) -> Option<f64> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.weight)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl IntoIterator for FeatureSet {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

fn truncate_name(name: &mut String) {
    let limit = MAX_FEATURE_NAME_LEN - 1;
    if name.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    name.truncate(cut);
}

/// Switches for the feature groups. Bias is always emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub identity: bool,
    pub shape: bool,
    pub affix: bool,
    pub case: bool,
    pub length: bool,
    pub character: bool,
    pub context: bool,
    pub position: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            identity: true,
            shape: true,
            affix: true,
            case: true,
            length: true,
            character: true,
            context: true,
            position: true,
        }
    }
}

impl FeatureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, enabled: bool) -> Self {
        self.identity = enabled;
        self
    }

    pub fn with_shape(mut self, enabled: bool) -> Self {
        self.shape = enabled;
        self
    }

    pub fn with_affix(mut self, enabled: bool) -> Self {
        self.affix = enabled;
        self
    }

    pub fn with_case(mut self, enabled: bool) -> Self {
        self.case = enabled;
        self
    }

    pub fn with_length(mut self, enabled: bool) -> Self {
        self.length = enabled;
        self
    }

    pub fn with_character(mut self, enabled: bool) -> Self {
        self.character = enabled;
        self
    }

    pub fn with_context(mut self, enabled: bool) -> Self {
        self.context = enabled;
        self
    }

    pub fn with_position(mut self, enabled: bool) -> Self {
        self.position = enabled;
        self
    }
}

/// Per-token feature extractor.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extract the features of the token at `position` within `tokens`.
    ///
    /// Never fails: a position outside the sequence yields an empty set, and
    /// features that do not apply to a token are simply not added.
    pub fn extract<T: AsRef<str>>(&self, tokens: &[T], position: usize) -> FeatureSet {
        let Some(token) = tokens.get(position) else {
            return FeatureSet::new();
        };
        let text = token.as_ref();
        let lower = text.to_lowercase();
        let nopunc = strip_punctuation(&lower);

        let mut features = FeatureSet::with_capacity(48);

        if self.config.identity {
            extract_identity(text, &lower, &nopunc, &mut features);
        }
        if self.config.shape {
            features.add(format!("shape:{}", token_shape(text)), FEATURE_WEIGHT);
        }
        if self.config.affix {
            extract_affixes(&nopunc, &mut features);
        }
        if self.config.case {
            extract_case(text, &mut features);
        }
        if self.config.length {
            extract_length(text, &mut features);
        }
        if self.config.character {
            extract_character(text, &mut features);
        }
        if self.config.context {
            extract_context(tokens, position, &mut features);
        }
        if self.config.position {
            extract_position(position, tokens.len(), &mut features);
        }

        features.add(BIAS_FEATURE, FEATURE_WEIGHT);
        features
    }

    /// Extract features for every token of a sequence, in order.
    pub fn extract_all<T: AsRef<str>>(&self, tokens: &[T]) -> Vec<FeatureSet> {
        (0..tokens.len())
            .map(|position| self.extract(tokens, position))
            .collect()
    }
}

fn extract_identity(text: &str, lower: &str, nopunc: &str, features: &mut FeatureSet) {
    features.add(format!("token:{text}"), FEATURE_WEIGHT);
    features.add(format!("lower:{lower}"), FEATURE_WEIGHT);
    if !nopunc.is_empty() {
        features.add(format!("nopunc:{nopunc}"), FEATURE_WEIGHT);
    }
}

fn extract_affixes(nopunc: &str, features: &mut FeatureSet) {
    let len = nopunc.chars().count();
    for n in 1..=MAX_AFFIX_LEN.min(len) {
        features.add(format!("prefix_{n}:{}", prefix(nopunc, n)), FEATURE_WEIGHT);
    }
    for n in 1..=MAX_AFFIX_LEN.min(len) {
        features.add(format!("suffix_{n}:{}", suffix(nopunc, n)), FEATURE_WEIGHT);
    }
}

fn extract_case(text: &str, features: &mut FeatureSet) {
    if is_capitalized(text) {
        features.add("is_capitalized", FEATURE_WEIGHT);
    }
    if is_all_caps(text) {
        features.add("is_all_caps", FEATURE_WEIGHT);
    }
    if is_all_lower(text) {
        features.add("is_all_lower", FEATURE_WEIGHT);
    }
}

fn extract_length(text: &str, features: &mut FeatureSet) {
    let len = text.chars().count();
    features.add("length", len as f64);

    if let Some(bucket) = length_bucket(len) {
        features.add(format!("length:{bucket}"), FEATURE_WEIGHT);
    }
}

/// Coarse length bucket of a token with `len` chars.
pub fn length_bucket(len: usize) -> Option<&'static str> {
    match len {
        1 => Some("single"),
        2 => Some("two"),
        3..=4 => Some("short"),
        n if n >= 10 => Some("long"),
        _ => None,
    }
}

fn extract_character(text: &str, features: &mut FeatureSet) {
    if has_digit(text) {
        features.add("has_digit", FEATURE_WEIGHT);
    }
    if has_punctuation(text) {
        features.add("has_punct", FEATURE_WEIGHT);
    }
    if text.contains('-') {
        features.add("has_hyphen", FEATURE_WEIGHT);
    }
    if text.contains('.') {
        features.add("has_dot", FEATURE_WEIGHT);
    }
    if text.chars().count() > 1 && text.ends_with('.') {
        features.add("ends_with_dot", FEATURE_WEIGHT);
    }
    if is_numeric(text) {
        features.add("is_numeric", FEATURE_WEIGHT);
    }
}

fn extract_context<T: AsRef<str>>(tokens: &[T], position: usize, features: &mut FeatureSet) {
    for k in 1..=CONTEXT_WINDOW {
        match position.checked_sub(k) {
            Some(prev) => features.add(
                format!("prev_{k}:{}", tokens[prev].as_ref()),
                CONTEXT_WEIGHT,
            ),
            None => features.add(format!("prev_{k}:BOS"), SENTINEL_WEIGHT),
        }
    }

    for k in 1..=CONTEXT_WINDOW {
        match tokens.get(position + k) {
            Some(next) => features.add(format!("next_{k}:{}", next.as_ref()), CONTEXT_WEIGHT),
            None => features.add(format!("next_{k}:EOS"), SENTINEL_WEIGHT),
        }
    }
}

fn extract_position(position: usize, total: usize, features: &mut FeatureSet) {
    if position == 0 {
        features.add("is_first", FEATURE_WEIGHT);
    }
    if position + 1 == total {
        features.add("is_last", FEATURE_WEIGHT);
    }

    features.add(
        format!("pos:{}", relative_position_bucket(position, total)),
        FEATURE_WEIGHT,
    );
    features.add(format!("position:{position}"), POSITION_WEIGHT);
}

/// Which third of the sequence a position falls in.
pub fn relative_position_bucket(position: usize, total: usize) -> &'static str {
    let relative = if total > 1 {
        position as f64 / (total - 1) as f64
    } else {
        0.0
    };

    if relative < 0.33 {
        "early"
    } else if relative < 0.67 {
        "middle"
    } else {
        "late"
    }
}

fn is_punct(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Word shape: uppercase `X`, lowercase `x`, ASCII digit `d`, anything else kept.
pub fn token_shape(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            if c.is_uppercase() {
                'X'
            } else if c.is_lowercase() {
                'x'
            } else if c.is_ascii_digit() {
                'd'
            } else {
                c
            }
        })
        .collect()
}

pub fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

/// All letters uppercase, with at least one letter.
pub fn is_all_caps(token: &str) -> bool {
    let mut letters = token.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

/// All letters lowercase, with at least one letter.
pub fn is_all_lower(token: &str) -> bool {
    let mut letters = token.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_lowercase)
}

pub fn has_digit(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

pub fn has_punctuation(token: &str) -> bool {
    token.chars().any(is_punct)
}

/// Non-empty and made only of ASCII digits, `.` and `,`.
pub fn is_numeric(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

pub fn strip_punctuation(token: &str) -> String {
    token.chars().filter(|&c| !is_punct(c)).collect()
}

/// First `n` chars of `token` (the whole token if shorter).
pub fn prefix(token: &str, n: usize) -> String {
    token.chars().take(n).collect()
}

/// Last `n` chars of `token` (the whole token if shorter).
pub fn suffix(token: &str, n: usize) -> String {
    let len = token.chars().count();
    token.chars().skip(len.saturating_sub(n)).collect()
}
