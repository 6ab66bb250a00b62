//! # Labeled Training Corpus
//!
//! Parses the markup used for labeled name data:
//!
//! ```text
//! <NameCollection>
//!   <Name><GivenName>Jane</GivenName> <Surname>Doe</Surname></Name>
//!   <Name><CorporationName>Acme</CorporationName> <CorporationLegalType>Inc.</CorporationLegalType></Name>
//! </NameCollection>
//! ```
//!
//! Each `<Name>` element becomes one [`LabeledSequence`]; each child element
//! contributes one token whose label is the element name and whose text is
//! the trimmed element content. A `<Name>` without any non-empty child is
//! dropped silently. Broken markup (unterminated tags, mismatched or nested
//! elements) is a [`CrfNameError::CorpusFormat`] error in strict mode.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CrfNameError, Result};

/// Element that delimits one training example.
pub const NAME_ELEMENT: &str = "Name";

/// A token with its gold label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledToken {
    pub text: String,
    pub label: String,
}

impl LabeledToken {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

impl AsRef<str> for LabeledToken {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// One training example: a full name or company string, token by token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSequence {
    pub tokens: Vec<LabeledToken>,
}

impl LabeledSequence {
    pub fn new(tokens: Vec<LabeledToken>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for LabeledSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}/{}", token.text, token.label)?;
        }
        Ok(())
    }
}

/// Ordered collection of training examples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingCorpus {
    sequences: Vec<LabeledSequence>,
}

impl TrainingCorpus {
    pub fn new(sequences: Vec<LabeledSequence>) -> Self {
        Self { sequences }
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn sequences(&self) -> &[LabeledSequence] {
        &self.sequences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledSequence> {
        self.sequences.iter()
    }

    pub fn push(&mut self, sequence: LabeledSequence) {
        self.sequences.push(sequence);
    }

    /// Append all sequences of `other`, keeping duplicates.
    pub fn extend(&mut self, other: TrainingCorpus) {
        self.sequences.extend(other.sequences);
    }

    /// Union of two corpora in order: `first` then `second`.
    pub fn concat(first: TrainingCorpus, second: TrainingCorpus) -> TrainingCorpus {
        let mut combined = first;
        combined.extend(second);
        combined
    }

    pub fn token_count(&self) -> usize {
        self.sequences.iter().map(LabeledSequence::len).sum()
    }

    /// Counts and a few rendered examples, for verbose training output.
    pub fn summary(&self) -> CorpusSummary {
        let mut label_counts = BTreeMap::new();
        for token in self.sequences.iter().flat_map(|s| &s.tokens) {
            *label_counts.entry(token.label.clone()).or_insert(0) += 1;
        }

        CorpusSummary {
            sequences: self.len(),
            tokens: self.token_count(),
            label_counts,
            examples: self.sequences.iter().take(5).map(ToString::to_string).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TrainingCorpus {
    type Item = &'a LabeledSequence;
    type IntoIter = std::slice::Iter<'a, LabeledSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

/// Statistics about a parsed corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub sequences: usize,
    pub tokens: usize,
    pub label_counts: BTreeMap<String, usize>,
    pub examples: Vec<String>,
}

impl fmt::Display for CorpusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training data summary:")?;
        writeln!(f, "  Total sequences: {}", self.sequences)?;
        writeln!(f, "  Total tokens: {}", self.tokens)?;
        writeln!(f, "  Labels:")?;
        for (label, count) in &self.label_counts {
            writeln!(f, "    {label}: {count}")?;
        }
        writeln!(f, "  First {} examples:", self.examples.len())?;
        for (i, example) in self.examples.iter().enumerate() {
            writeln!(f, "    [{}] {example}", i + 1)?;
        }
        Ok(())
    }
}

/// Options for [`CorpusParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusParserOptions {
    /// Fail on the first markup error. When false, a broken `<Name>` element
    /// is skipped and parsing resumes after the next `</Name>`.
    pub strict: bool,
}

impl Default for CorpusParserOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Parser for the labeled name markup.
pub struct CorpusParser {
    re_tag: Regex,
    re_skip: Regex,
    options: CorpusParserOptions,
}

impl CorpusParser {
    /// Constructs a strict parser with pre-compiled markup patterns.
    ///
    /// # Errors
    ///
    /// Returns `CrfNameError::RegexError` if a pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Self::with_options(CorpusParserOptions::default())
    }

    pub fn with_options(options: CorpusParserOptions) -> Result<Self> {
        Ok(Self {
            re_tag: Regex::new(r"\A<(/?)([A-Za-z_][^\s<>/]*)[^<>]*?(/?)>")?,
            re_skip: Regex::new(r"(?s)\A(?:<!--.*?-->|<\?.*?\?>|<![A-Z][^<>]*>)")?,
            options,
        })
    }

    pub fn options(&self) -> &CorpusParserOptions {
        &self.options
    }

    /// Parses corpus markup into labeled sequences, in source order.
    ///
    /// # Errors
    ///
    /// Returns `CrfNameError::CorpusFormat` on broken markup. In lenient
    /// mode only when nothing could be recovered from an erroneous input.
    pub fn parse(&self, input: &str) -> Result<TrainingCorpus> {
        let mut lexer = Lexer {
            input,
            pos: 0,
            line: 1,
            re_tag: &self.re_tag,
            re_skip: &self.re_skip,
        };
        let mut scan = Scan::default();
        let mut first_error = None;
        let mut error_count = 0usize;

        while let Some(next) = lexer.next_event() {
            let outcome = next.and_then(|(event, line)| scan.handle(event, line));
            if let Err(err) = outcome {
                if self.options.strict {
                    return Err(err);
                }
                warn!("skipping malformed corpus element: {err}");
                scan.recover();
                error_count += 1;
                first_error.get_or_insert(err);
            }
        }

        if let Err(err) = scan.finish(lexer.line) {
            if self.options.strict {
                return Err(err);
            }
            warn!("skipping malformed corpus element: {err}");
            error_count += 1;
            first_error.get_or_insert(err);
        }

        if let Some(err) = first_error {
            if scan.corpus.is_empty() {
                return Err(err);
            }
            warn!(
                "recovered from {error_count} corpus errors, kept {} sequences",
                scan.corpus.len()
            );
        }

        debug!(
            "parsed corpus: {} sequences ({} dropped as empty)",
            scan.corpus.len(),
            scan.dropped
        );
        Ok(scan.corpus)
    }
}

enum Event<'a> {
    Text(&'a str),
    Open(&'a str),
    Close(&'a str),
    Empty(&'a str),
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    re_tag: &'a Regex,
    re_skip: &'a Regex,
}

impl<'a> Lexer<'a> {
    fn next_event(&mut self) -> Option<Result<(Event<'a>, usize)>> {
        loop {
            let input = self.input;
            let rest = &input[self.pos..];
            if rest.is_empty() {
                return None;
            }
            let line = self.line;

            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                self.advance(end);
                return Some(Ok((Event::Text(&rest[..end]), line)));
            }

            if let Some(m) = self.re_skip.find(rest) {
                self.advance(m.end());
                continue;
            }

            if let Some(caps) = self.re_tag.captures(rest) {
                let end = caps.get(0).map_or(1, |m| m.end());
                let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
                let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
                let name = caps.get(2).map_or("", |m| m.as_str());
                self.advance(end);

                let event = if closing {
                    Event::Close(name)
                } else if self_closing {
                    Event::Empty(name)
                } else {
                    Event::Open(name)
                };
                return Some(Ok((event, line)));
            }

            // step over the '<' so a lenient caller can continue
            self.advance(1);
            let snippet: String = rest.chars().take(24).collect();
            return Some(Err(CrfNameError::CorpusFormat {
                line,
                message: format!("unterminated or malformed tag {snippet:?}"),
            }));
        }
    }

    fn advance(&mut self, len: usize) {
        let consumed = &self.input[self.pos..self.pos + len];
        self.line += consumed.matches('\n').count();
        self.pos += len;
    }
}

#[derive(Default)]
struct Scan<'a> {
    corpus: TrainingCorpus,
    dropped: usize,
    wrappers: Vec<(&'a str, usize)>,
    name_line: Option<usize>,
    label: Option<(&'a str, usize)>,
    text: String,
    tokens: Vec<LabeledToken>,
    recovering: bool,
}

impl<'a> Scan<'a> {
    fn handle(&mut self, event: Event<'a>, line: usize) -> Result<()> {
        if self.recovering {
            match event {
                Event::Close(NAME_ELEMENT) => self.recovering = false,
                Event::Open(NAME_ELEMENT) => {
                    self.recovering = false;
                    self.name_line = Some(line);
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some((label, label_line)) = self.label {
            return match event {
                Event::Text(text) => {
                    self.text.push_str(&decode_entities(text));
                    Ok(())
                }
                Event::Close(name) if name == label => {
                    let text = self.text.trim();
                    if !text.is_empty() {
                        self.tokens.push(LabeledToken::new(text, label));
                    }
                    self.text.clear();
                    self.label = None;
                    Ok(())
                }
                Event::Close(name) => Err(format_error(
                    line,
                    format!("mismatched </{name}>, expected </{label}> (opened at line {label_line})"),
                )),
                Event::Open(name) | Event::Empty(name) => Err(format_error(
                    line,
                    format!("element <{name}> nested inside <{label}>"),
                )),
            };
        }

        if let Some(name_line) = self.name_line {
            return match event {
                Event::Text(_) | Event::Empty(_) => Ok(()),
                Event::Open(NAME_ELEMENT) => Err(format_error(
                    line,
                    format!("<Name> nested inside <Name> opened at line {name_line}"),
                )),
                Event::Open(label) => {
                    self.label = Some((label, line));
                    Ok(())
                }
                Event::Close(NAME_ELEMENT) => {
                    self.name_line = None;
                    let tokens = std::mem::take(&mut self.tokens);
                    if tokens.is_empty() {
                        debug!("dropping <Name> at line {name_line} with no tokens");
                        self.dropped += 1;
                    } else {
                        self.corpus.push(LabeledSequence::new(tokens));
                    }
                    Ok(())
                }
                Event::Close(name) => Err(format_error(
                    line,
                    format!("unexpected </{name}> inside <Name> opened at line {name_line}"),
                )),
            };
        }

        match event {
            Event::Text(_) | Event::Empty(_) => Ok(()),
            Event::Open(NAME_ELEMENT) => {
                self.name_line = Some(line);
                Ok(())
            }
            Event::Open(wrapper) => {
                self.wrappers.push((wrapper, line));
                Ok(())
            }
            Event::Close(name) => match self.wrappers.last() {
                Some((open, _)) if *open == name => {
                    self.wrappers.pop();
                    Ok(())
                }
                Some((open, open_line)) => Err(format_error(
                    line,
                    format!("mismatched </{name}>, expected </{open}> (opened at line {open_line})"),
                )),
                None => Err(format_error(line, format!("unexpected </{name}>"))),
            },
        }
    }

    /// Abandon the element being built and skip ahead to the next `</Name>`.
    fn recover(&mut self) {
        if self.name_line.is_some() {
            self.recovering = true;
        }
        self.name_line = None;
        self.label = None;
        self.text.clear();
        self.tokens.clear();
    }

    fn finish(&mut self, line: usize) -> Result<()> {
        if let Some((label, label_line)) = self.label {
            return Err(format_error(
                line,
                format!("unterminated element <{label}> opened at line {label_line}"),
            ));
        }
        if let Some(name_line) = self.name_line {
            return Err(format_error(
                line,
                format!("unterminated element <Name> opened at line {name_line}"),
            ));
        }
        if let Some((wrapper, wrapper_line)) = self.wrappers.last() {
            return Err(format_error(
                line,
                format!("unterminated element <{wrapper}> opened at line {wrapper_line}"),
            ));
        }
        Ok(())
    }
}

fn format_error(line: usize, message: String) -> CrfNameError {
    CrfNameError::CorpusFormat { line, message }
}

/// Decode the predefined markup entities and numeric character references.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi + 1))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
