use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::ParseResult;
use crate::parser::labels::NameColumn;

/// A parse result bucketed into fixed name-part columns.
///
/// Tokens that map to the same column are joined with single spaces in
/// input order. A column no token maps to is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedNameColumns {
    pub prefix: Option<String>,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub surname: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub corporation_name: Option<String>,
    pub corporation_type: Option<String>,
    pub organization: Option<String>,
    pub other: Option<String>,
}

impl ParsedNameColumns {
    /// Project `result` onto the columns.
    pub fn from_result(result: &ParseResult) -> Self {
        let mut columns = Self::default();
        for token in &result.tokens {
            let slot = columns.slot_mut(NameColumn::for_label(&token.label));
            if let Some(existing) = slot.as_mut() {
                existing.push(' ');
                existing.push_str(&token.text);
            } else {
                *slot = Some(token.text.clone());
            }
        }
        columns
    }

    /// Value of one column.
    pub fn get(&self, column: NameColumn) -> Option<&str> {
        let value = match column {
            NameColumn::Prefix => &self.prefix,
            NameColumn::GivenName => &self.given_name,
            NameColumn::MiddleName => &self.middle_name,
            NameColumn::Surname => &self.surname,
            NameColumn::Suffix => &self.suffix,
            NameColumn::Nickname => &self.nickname,
            NameColumn::CorporationName => &self.corporation_name,
            NameColumn::CorporationType => &self.corporation_type,
            NameColumn::Organization => &self.organization,
            NameColumn::Other => &self.other,
        };
        value.as_deref()
    }

    /// Populated columns in column order.
    pub fn iter(&self) -> impl Iterator<Item = (NameColumn, &str)> {
        NameColumn::all()
            .iter()
            .filter_map(|&column| self.get(column).map(|value| (column, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    fn slot_mut(&mut self, column: NameColumn) -> &mut Option<String> {
        match column {
            NameColumn::Prefix => &mut self.prefix,
            NameColumn::GivenName => &mut self.given_name,
            NameColumn::MiddleName => &mut self.middle_name,
            NameColumn::Surname => &mut self.surname,
            NameColumn::Suffix => &mut self.suffix,
            NameColumn::Nickname => &mut self.nickname,
            NameColumn::CorporationName => &mut self.corporation_name,
            NameColumn::CorporationType => &mut self.corporation_type,
            NameColumn::Organization => &mut self.organization,
            NameColumn::Other => &mut self.other,
        }
    }
}

impl fmt::Display for ParsedNameColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}={value:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabeledComponent;

    fn result(tokens: &[(&str, &str)]) -> ParseResult {
        let mut result = ParseResult::new(
            tokens.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(" "),
            "v1",
        );
        result.tokens = tokens
            .iter()
            .map(|(text, label)| LabeledComponent {
                text: (*text).into(),
                label: (*label).into(),
                confidence: 1.0,
                start_char: 0,
                end_char: 0,
            })
            .collect();
        result
    }

    #[test]
    fn test_person_columns() {
        let columns = result(&[
            ("Mr.", "PrefixMarital"),
            ("John", "GivenName"),
            ("F.", "MiddleInitial"),
            ("Kennedy", "Surname"),
            ("Jr.", "SuffixGenerational"),
        ])
        .to_columns();

        assert_eq!(columns.prefix.as_deref(), Some("Mr."));
        assert_eq!(columns.given_name.as_deref(), Some("John"));
        assert_eq!(columns.middle_name.as_deref(), Some("F."));
        assert_eq!(columns.surname.as_deref(), Some("Kennedy"));
        assert_eq!(columns.suffix.as_deref(), Some("Jr."));
        assert_eq!(columns.corporation_name, None);
    }

    #[test]
    fn test_same_column_tokens_are_joined_in_order() {
        let columns = result(&[
            ("Acme", "CorporationName"),
            ("Widget", "CorporationName"),
            ("Inc.", "CorporationLegalType"),
            ("and", "CorporationNameAndCompany"),
        ])
        .to_columns();

        assert_eq!(columns.corporation_name.as_deref(), Some("Acme Widget"));
        assert_eq!(columns.corporation_type.as_deref(), Some("Inc."));
        assert_eq!(columns.organization.as_deref(), Some("and"));
    }

    #[test]
    fn test_unknown_labels_go_to_other() {
        let columns = result(&[("&", "And"), ("x", "Mystery")]).to_columns();
        assert_eq!(columns.other.as_deref(), Some("& x"));
    }

    #[test]
    fn test_empty_result_has_no_columns() {
        let columns = result(&[]).to_columns();
        assert!(columns.is_empty());
        assert_eq!(columns, ParsedNameColumns::default());
    }

    #[test]
    fn test_projection_is_idempotent() {
        let parsed = result(&[("Jane", "GivenName"), ("Doe", "Surname")]);
        assert_eq!(parsed.to_columns(), parsed.to_columns());
    }

    #[test]
    fn test_iter_and_display() {
        let columns = result(&[("Doe", "Surname"), ("Jane", "GivenName")]).to_columns();
        let populated: Vec<_> = columns.iter().collect();

        assert_eq!(
            populated,
            vec![(NameColumn::GivenName, "Jane"), (NameColumn::Surname, "Doe")]
        );
        assert_eq!(columns.to_string(), r#"given_name="Jane", surname="Doe""#);
    }
}
