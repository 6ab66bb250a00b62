//! # Name Tokenizer
//!
//! Splits a free-text name or company string into tokens for sequence
//! labeling. Trailing commas and dots are stripped, except that the dot of
//! a known abbreviation (`Jr.`, `Mrs.`, `Inc.`, ...) is kept.

use serde::{Deserialize, Serialize};

/// A token extracted from an input string with positional information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The normalized token text
    pub text: String,
    /// Index among the emitted tokens
    pub position: usize,
    /// Start offset (in chars) in the original string
    pub start_char: usize,
    /// End offset (in chars, exclusive) of the normalized text
    pub end_char: usize,
    /// Whether this is the first emitted token
    pub is_first: bool,
    /// Whether this is the last emitted token
    pub is_last: bool,
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Abbreviations whose trailing dot carries meaning and is never stripped.
pub const ABBREVIATIONS: &[&str] = &[
    "Jr.", "Sr.", "Dr.", "Mr.", "Ms.", "Mrs.", "Inc.", "Corp.", "Co.", "Ltd.", "Esq.",
];

/// Whitespace tokenizer for name strings.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Create a new tokenizer instance.
    pub fn new() -> Self {
        Self
    }

    /// Tokenize a name string into a sequence of tokens.
    ///
    /// Tokens that are empty after normalization are discarded and do not
    /// consume a position. Empty input yields an empty vector.
    ///
    /// # Examples
    /// ```
    /// use crfname_core::parser::tokenizer::Tokenizer;
    ///
    /// let tokens = Tokenizer::new().tokenize("Mr. John Kennedy Jr.");
    /// let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
    /// assert_eq!(texts, ["Mr.", "John", "Kennedy", "Jr."]);
    /// assert!(tokens[3].is_last);
    /// ```
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        // (byte offset, char offset) of the raw token being scanned
        let mut current: Option<(usize, usize)> = None;

        for (char_idx, (byte_idx, c)) in input.char_indices().enumerate() {
            if c.is_whitespace() {
                if let Some((start_byte, start_char)) = current.take() {
                    self.emit(&mut tokens, &input[start_byte..byte_idx], start_char);
                }
            } else if current.is_none() {
                current = Some((byte_idx, char_idx));
            }
        }

        if let Some((start_byte, start_char)) = current {
            self.emit(&mut tokens, &input[start_byte..], start_char);
        }

        if let Some(last) = tokens.last_mut() {
            last.is_last = true;
        }

        tokens
    }

    fn emit(&self, tokens: &mut Vec<Token>, raw: &str, start_char: usize) {
        let text = strip_trailing_punctuation(raw);
        if text.is_empty() {
            return;
        }

        let position = tokens.len();
        tokens.push(Token {
            text: text.to_string(),
            position,
            start_char,
            end_char: start_char + text.chars().count(),
            is_first: position == 0,
            is_last: false,
        });
    }
}

/// Strip trailing `,` and `.` repeatedly, stopping at a known abbreviation.
pub fn strip_trailing_punctuation(raw: &str) -> &str {
    let mut text = raw;
    while let Some(last) = text.chars().next_back() {
        if last != ',' && last != '.' {
            break;
        }
        if last == '.' && ABBREVIATIONS.contains(&text) {
            break;
        }
        text = &text[..text.len() - 1];
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_abbreviations() {
        let tokens = Tokenizer::new().tokenize("Mr. John Kennedy Jr.");

        assert_eq!(texts(&tokens), ["Mr.", "John", "Kennedy", "Jr."]);
        assert!(tokens[0].is_first);
        assert!(!tokens[1].is_first);
        assert!(tokens[3].is_last);
        assert!(!tokens[2].is_last);
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let tokenizer = Tokenizer::new();
        let input = "Dr. Jane  Q. Public, Esq.";
        assert_eq!(tokenizer.tokenize(input), tokenizer.tokenize(input));
    }

    #[test]
    fn test_strip_trailing_commas_and_dots() {
        let tokens = Tokenizer::new().tokenize("Doe, Jane Q.");
        assert_eq!(texts(&tokens), ["Doe", "Jane", "Q"]);
    }

    #[test]
    fn test_abbreviation_followed_by_comma() {
        let tokens = Tokenizer::new().tokenize("Kennedy Jr., John");
        assert_eq!(texts(&tokens), ["Kennedy", "Jr.", "John"]);
    }

    #[test]
    fn test_company_abbreviations() {
        let tokens = Tokenizer::new().tokenize("Acme Co. Ltd. Inc.,");
        assert_eq!(texts(&tokens), ["Acme", "Co.", "Ltd.", "Inc."]);
    }

    #[test]
    fn test_abbreviation_match_is_exact() {
        // lowercase variant is not in the set, so its dot is stripped
        let tokens = Tokenizer::new().tokenize("jr.");
        assert_eq!(texts(&tokens), ["jr"]);
    }

    #[test]
    fn test_discarded_tokens_do_not_consume_positions() {
        let tokens = Tokenizer::new().tokenize("Jane ... , Doe .");

        assert_eq!(texts(&tokens), ["Jane", "Doe"]);
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 1);
        assert!(tokens[1].is_last);
    }

    #[test]
    fn test_char_offsets() {
        let tokens = Tokenizer::new().tokenize("  José Doe,");

        assert_eq!(tokens[0].start_char, 2);
        assert_eq!(tokens[0].end_char, 6);
        assert_eq!(tokens[1].start_char, 7);
        assert_eq!(tokens[1].end_char, 10);
    }

    #[test]
    fn test_single_token_is_first_and_last() {
        let tokens = Tokenizer::new().tokenize("Cher");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_first);
        assert!(tokens[0].is_last);
    }

    #[test]
    fn test_tokenize_empty() {
        let tokenizer = Tokenizer::new();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize(" \t\n").is_empty());
        assert!(tokenizer.tokenize(". , ..").is_empty());
    }
}
