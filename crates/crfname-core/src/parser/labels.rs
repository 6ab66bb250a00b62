//! # Name Component Labels
//!
//! Maps the labels a model predicts to the public component names, and
//! public component names to the fixed output columns of a parsed name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Internal label to public component name. Labels not listed here pass
/// through unchanged.
pub const LABEL_RENAMES: &[(&str, &str)] = &[
    ("GIVEN", "GivenName"),
    ("SURNAME", "Surname"),
    ("MIDDLE", "MiddleName"),
    ("PREFIX", "PrefixMarital"),
    ("SUFFIX", "SuffixGenerational"),
    ("NICKNAME", "Nickname"),
    ("TITLE", "PrefixOther"),
];

/// Rename an internal label to its public component name.
pub fn public_label(label: &str) -> &str {
    LABEL_RENAMES
        .iter()
        .find(|(internal, _)| *internal == label)
        .map_or(label, |(_, public)| *public)
}

/// Output column a labeled token contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameColumn {
    Prefix,
    GivenName,
    MiddleName,
    Surname,
    Suffix,
    Nickname,
    CorporationName,
    CorporationType,
    Organization,
    Other,
}

impl NameColumn {
    /// Total number of distinct columns.
    pub const COUNT: usize = 10;

    /// All columns in output order.
    pub fn all() -> &'static [NameColumn] {
        &[
            NameColumn::Prefix,
            NameColumn::GivenName,
            NameColumn::MiddleName,
            NameColumn::Surname,
            NameColumn::Suffix,
            NameColumn::Nickname,
            NameColumn::CorporationName,
            NameColumn::CorporationType,
            NameColumn::Organization,
            NameColumn::Other,
        ]
    }

    /// Column for a public component label.
    pub fn for_label(label: &str) -> Self {
        match label {
            "PrefixMarital" | "PrefixOther" => NameColumn::Prefix,
            "GivenName" | "FirstInitial" => NameColumn::GivenName,
            "MiddleName" | "MiddleInitial" => NameColumn::MiddleName,
            "Surname" | "LastInitial" => NameColumn::Surname,
            "SuffixGenerational" | "SuffixOther" => NameColumn::Suffix,
            "Nickname" => NameColumn::Nickname,
            "CorporationName" | "ShortForm" => NameColumn::CorporationName,
            "CorporationLegalType" => NameColumn::CorporationType,
            "CorporationNameOrganization"
            | "CorporationNameAndCompany"
            | "CorporationCommitteeType"
            | "CorporationNameBranchType"
            | "CorporationNameBranchIdentifier" => NameColumn::Organization,
            _ => NameColumn::Other,
        }
    }

    /// Index into [`NameColumn::all`].
    pub fn index(&self) -> usize {
        match self {
            NameColumn::Prefix => 0,
            NameColumn::GivenName => 1,
            NameColumn::MiddleName => 2,
            NameColumn::Surname => 3,
            NameColumn::Suffix => 4,
            NameColumn::Nickname => 5,
            NameColumn::CorporationName => 6,
            NameColumn::CorporationType => 7,
            NameColumn::Organization => 8,
            NameColumn::Other => 9,
        }
    }
}

impl fmt::Display for NameColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameColumn::Prefix => write!(f, "prefix"),
            NameColumn::GivenName => write!(f, "given_name"),
            NameColumn::MiddleName => write!(f, "middle_name"),
            NameColumn::Surname => write!(f, "surname"),
            NameColumn::Suffix => write!(f, "suffix"),
            NameColumn::Nickname => write!(f, "nickname"),
            NameColumn::CorporationName => write!(f, "corporation_name"),
            NameColumn::CorporationType => write!(f, "corporation_type"),
            NameColumn::Organization => write!(f, "organization"),
            NameColumn::Other => write!(f, "other"),
        }
    }
}
