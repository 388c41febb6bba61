//! Table handles and row encodings of the record store.
//!
//! Row values go through bincode; `u64` keys keep their big-endian
//! encoding so table iteration follows id order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backends::{TableName, TableSchema};
use crate::bincode_codec;
use crate::types::{Checksum, CommitId, EternalId, FieldValue, KindId, PointerId};

#[derive(Clone, Copy)]
pub(crate) struct VersionsTable(pub KindId);

impl TableSchema for VersionsTable {
    type Key = u64;
    type Value = VersionRow;

    fn name(&self) -> TableName {
        TableName::Versions(self.0)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct EternalsTable(pub KindId);

impl TableSchema for EternalsTable {
    type Key = u64;
    type Value = ();

    fn name(&self) -> TableName {
        TableName::Eternals(self.0)
    }
}

/// Keyed by the *target* kind of a slot, shared by every version kind whose
/// slots point at that target.
#[derive(Clone, Copy)]
pub(crate) struct PointersTable(pub KindId);

impl TableSchema for PointersTable {
    type Key = u64;
    type Value = PointerRow;

    fn name(&self) -> TableName {
        TableName::Pointers(self.0)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct PointerTargetsTable(pub KindId);

impl TableSchema for PointerTargetsTable {
    type Key = u64;
    type Value = Vec<u64>;

    fn name(&self) -> TableName {
        TableName::PointerTargets(self.0)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct CommitsTable;

impl TableSchema for CommitsTable {
    type Key = u64;
    type Value = CommitRow;

    fn name(&self) -> TableName {
        TableName::Commits
    }
}

#[derive(Clone, Copy)]
pub(crate) struct CommitAddsTable(pub KindId);

impl TableSchema for CommitAddsTable {
    type Key = u64;
    type Value = Vec<u64>;

    fn name(&self) -> TableName {
        TableName::CommitAdds(self.0)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct CommitRemovesTable(pub KindId);

impl TableSchema for CommitRemovesTable {
    type Key = u64;
    type Value = Vec<u64>;

    fn name(&self) -> TableName {
        TableName::CommitRemoves(self.0)
    }
}

#[derive(Clone, Copy)]
pub(crate) struct SequencesTable;

impl TableSchema for SequencesTable {
    type Key = u64;
    type Value = u64;

    fn name(&self) -> TableName {
        TableName::Sequences
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct VersionRow {
    pub eternal: EternalId,
    pub checksum: Option<Checksum>,
    pub scalars: BTreeMap<String, FieldValue>,
    pub slots: BTreeMap<String, Option<PointerId>>,
}

impl VersionRow {
    /// Canonical text of the revision: a sorted-key JSON object holding the
    /// eternal id and every scalar field. Slots, the checksum, and the row
    /// key are excluded so set-valued state versions independently.
    pub fn canonical_text(&self) -> String {
        let mut doc = serde_json::Map::new();
        doc.insert("eternal".to_owned(), serde_json::Value::from(self.eternal));
        for (name, value) in &self.scalars {
            doc.insert(name.clone(), value.canonical_json());
        }
        serde_json::Value::Object(doc).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PointerRow {
    pub checksum: Option<Checksum>,
}

/// Canonical text of a set pointer: the target ids, sorted numerically.
pub(crate) fn pointer_canonical_text(target_ids: &[EternalId]) -> String {
    let mut sorted = target_ids.to_vec();
    sorted.sort_unstable();
    serde_json::Value::from(sorted).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CommitRow {
    pub parent: Option<CommitId>,
    pub checksum: Option<Checksum>,
    pub committed_at: Option<DateTime<Utc>>,
    pub time: DateTime<Utc>,
    pub message: String,
}

bincode_codec!(VersionRow, PointerRow, CommitRow);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::serde::{Decode, Encode};
    use chrono::TimeZone;

    fn sample_version_row() -> VersionRow {
        let mut scalars = BTreeMap::new();
        scalars.insert("name".to_owned(), FieldValue::text("division1"));
        scalars.insert("active".to_owned(), FieldValue::Boolean(true));
        let mut slots = BTreeMap::new();
        slots.insert("tags".to_owned(), None);
        VersionRow {
            eternal: 12,
            checksum: None,
            scalars,
            slots,
        }
    }

    #[test]
    fn canonical_text_is_sorted_and_excludes_slots() {
        let row = sample_version_row();
        assert_eq!(
            row.canonical_text(),
            r#"{"active":true,"eternal":12,"name":"division1"}"#
        );

        // changing a slot or the checksum leaves the canonical text alone
        let mut sealed = row.clone();
        sealed.checksum = Some("abc".into());
        sealed.slots.insert("tags".to_owned(), Some(99));
        assert_eq!(sealed.canonical_text(), row.canonical_text());
    }

    #[test]
    fn canonical_text_renders_timestamps_fixed() {
        let mut row = sample_version_row();
        row.scalars.insert(
            "since".to_owned(),
            FieldValue::Timestamp(Utc.with_ymd_and_hms(2023, 7, 1, 8, 0, 0).unwrap()),
        );
        assert_eq!(
            row.canonical_text(),
            r#"{"active":true,"eternal":12,"name":"division1","since":"2023-07-01T08:00:00.000000Z"}"#
        );
    }

    #[test]
    fn pointer_canonical_sorts_numerically() {
        assert_eq!(pointer_canonical_text(&[5, 2, 19]), "[2,5,19]");
        assert_eq!(pointer_canonical_text(&[]), "[]");
    }

    #[test]
    fn rows_roundtrip_through_bincode() {
        let row = sample_version_row();
        let bytes = row.encode().into_owned();
        assert_eq!(VersionRow::decode(&bytes).unwrap().into_owned(), row);

        let commit = CommitRow {
            parent: Some(3),
            checksum: None,
            committed_at: None,
            time: Utc.with_ymd_and_hms(2023, 7, 1, 8, 0, 0).unwrap(),
            message: "initial".to_owned(),
        };
        let bytes = commit.encode().into_owned();
        assert_eq!(CommitRow::decode(&bytes).unwrap().into_owned(), commit);
        assert!(CommitRow::decode(&bytes[..3]).is_err());
    }
}
