use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Publication status of a CPT post.
///
/// Two states, explicit transitions. `FromStr` fails loudly on anything
/// outside the enum; callers must not coerce unknown strings.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Visible only in the back office.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Publicly visible.
    #[sea_orm(string_value = "published")]
    Published,
}

impl PostStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// All possible status values.
    pub const ALL: &'static [PostStatus] = &[Self::Draft, Self::Published];

    /// Returns the string representation (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            PostStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for PostStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
