//! Change-feed events and their validation.
//!
//! The feed delivers untyped JSON rows. [`RawChangeEvent::parse`] checks the
//! shape and extracts the row identifier; decoding the payload into a typed
//! record happens only when the reconciler merges it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::records::{EntityRecord, RecordId};

/// Kind of row change announced by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Event exactly as received from the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChangeEvent {
    #[serde(rename = "eventType")]
    pub kind: ChangeKind,
    /// Row after the change; present for inserts and updates.
    #[serde(rename = "new", default, skip_serializing_if = "Option::is_none")]
    pub new_record: Option<Value>,
    /// Row before the change; deletes carry at least the identifier.
    #[serde(rename = "old", default, skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_timestamp: Option<DateTime<Utc>>,
}

/// Reasons a raw event cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    #[error("{kind:?} event carries no row payload")]
    MissingPayload { kind: ChangeKind },
    #[error("row payload has no id")]
    MissingId,
    #[error("row id is not a non-empty string or integer")]
    InvalidId,
    #[error("row payload does not decode: {message}")]
    Undecodable { message: String },
}

/// A validated event, ready for refetch or merge.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedChange {
    /// Insert or update of the row `id`.
    Upsert {
        kind: ChangeKind,
        id: RecordId,
        payload: Value,
    },
    /// Removal of the row `id`.
    Delete { id: RecordId },
}

impl ParsedChange {
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Upsert { id, .. } | Self::Delete { id } => id,
        }
    }
}

impl RawChangeEvent {
    /// Build an insert event for `row`.
    pub fn insert(row: Value) -> Self {
        Self::with(ChangeKind::Insert, Some(row), None)
    }

    /// Build an update event for `row`.
    pub fn update(row: Value) -> Self {
        Self::with(ChangeKind::Update, Some(row), None)
    }

    /// Build a delete event for the previous `row` (or just its id).
    pub fn delete(row: Value) -> Self {
        Self::with(ChangeKind::Delete, None, Some(row))
    }

    fn with(kind: ChangeKind, new_record: Option<Value>, old_record: Option<Value>) -> Self {
        Self {
            kind,
            new_record,
            old_record,
            commit_timestamp: None,
        }
    }

    /// Validate shape and extract the row identifier.
    ///
    /// # Examples
    /// ```
    /// use backoffice::domain::{ParsedChange, RawChangeEvent, RecordId};
    /// use serde_json::json;
    ///
    /// let parsed = RawChangeEvent::delete(json!({ "id": 4 })).parse().expect("valid delete");
    /// assert_eq!(parsed, ParsedChange::Delete { id: RecordId::from(4) });
    ///
    /// assert!(RawChangeEvent::insert(json!({ "name": "no id" })).parse().is_err());
    /// ```
    pub fn parse(self) -> Result<ParsedChange, MalformedEvent> {
        match self.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                let payload = self
                    .new_record
                    .ok_or(MalformedEvent::MissingPayload { kind: self.kind })?;
                let id = extract_id(&payload)?;
                Ok(ParsedChange::Upsert {
                    kind: self.kind,
                    id,
                    payload,
                })
            }
            ChangeKind::Delete => {
                let previous = self
                    .old_record
                    .ok_or(MalformedEvent::MissingPayload { kind: self.kind })?;
                let id = extract_id(&previous)?;
                Ok(ParsedChange::Delete { id })
            }
        }
    }
}

fn extract_id(row: &Value) -> Result<RecordId, MalformedEvent> {
    let raw = row.get("id").ok_or(MalformedEvent::MissingId)?;
    if raw.is_null() {
        return Err(MalformedEvent::MissingId);
    }
    RecordId::deserialize(raw).map_err(|_| MalformedEvent::InvalidId)
}

/// Decode a feed payload into a typed record.
pub fn decode_payload<R: EntityRecord>(payload: Value) -> Result<R, MalformedEvent> {
    serde_json::from_value(payload).map_err(|error| MalformedEvent::Undecodable {
        message: error.to_string(),
    })
}
