//! Typed rows for the back-office entity tables.
//!
//! Every entity implements [`EntityRecord`], which names its backing table,
//! its default page size and the text searched by list filters. Joined columns
//! are optional on every entity; they are filled only when a row comes from a
//! refetch or a joined batch select.

mod entities;

use std::fmt;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use entities::{
    Candidate, Client, Job, JobClient, Referrer, StaffMember, StaffName, StaffRole, Visitor,
};

/// Validation errors for [`RecordId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIdError {
    #[error("record id must not be empty")]
    Empty,
}

/// Stable identifier of a row.
///
/// Rows keyed by UUID arrive as JSON strings and serial rows as integers;
/// both normalise to the same textual form so `7` and `"7"` name one row.
///
/// # Examples
/// ```
/// use backoffice::domain::RecordId;
///
/// let from_number: RecordId = serde_json::from_str("7").expect("integer id");
/// let from_text: RecordId = serde_json::from_str("\"7\"").expect("string id");
/// assert_eq!(from_number, from_text);
/// assert!(RecordId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRecordId", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Validate and construct an identifier.
    ///
    /// Surrounding whitespace is trimmed.
    pub fn new(value: impl AsRef<str>) -> Result<Self, RecordIdError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RecordIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Text(String),
    Number(i64),
}

impl TryFrom<RawRecordId> for RecordId {
    type Error = RecordIdError;

    fn try_from(value: RawRecordId) -> Result<Self, Self::Error> {
        match value {
            RawRecordId::Text(text) => Self::new(text),
            RawRecordId::Number(number) => Ok(Self::from(number)),
        }
    }
}

/// A row type held in an entity collection.
pub trait EntityRecord:
    Clone + Debug + PartialEq + Send + Sync + DeserializeOwned + 'static
{
    /// Backing table the change feed and page queries address.
    const TABLE: &'static str;

    /// Rows per page when settings do not override it.
    const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Identifier of this row.
    fn id(&self) -> &RecordId;

    /// Text fragments matched by list search filters.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match across [`Self::search_fields`].
    ///
    /// An empty or blank needle matches every row.
    fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
