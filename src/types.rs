use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one logical entity, independent of its revisions.
pub type EternalId = u64;
/// Row identity of one immutable revision.
pub type VersionId = u64;
/// Row identity of one set-pointer indirection object.
pub type PointerId = u64;
/// Identity of one node in the commit DAG.
pub type CommitId = u64;
/// Index of a tracked kind, assigned in registration order.
pub type KindId = u16;

/// A sealed record's fingerprint: lowercase hex, no prefix.
pub type Checksum = String;

/// Names one logical entity of one tracked kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EternalRef {
    pub kind: KindId,
    pub id: EternalId,
}

impl EternalRef {
    pub fn new(kind: KindId, id: EternalId) -> Self {
        EternalRef { kind, id }
    }
}

/// A scalar field value of a version record.
///
/// Set-valued state never appears here; it lives behind a slot's
/// [`PointerId`] so it can version independently of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    /// Scalar link to the eternal identity of another tracked kind.
    EternalRef(EternalId),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// The value's canonical JSON form, used for checksum computation.
    /// Timestamps are coerced to a fixed textual representation so the
    /// digest does not depend on in-memory precision.
    pub(crate) fn canonical_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Text(s) => serde_json::Value::from(s.as_str()),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Boolean(b) => serde_json::Value::from(*b),
            FieldValue::Timestamp(ts) => serde_json::Value::from(canonical_timestamp(ts)),
            FieldValue::EternalRef(id) => serde_json::Value::from(*id),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// RFC 3339 in UTC with microsecond precision, the one textual timestamp
/// form that ever enters a digest.
pub(crate) fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
