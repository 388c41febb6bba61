//! Data-level comparison of two revisions. Rendering belongs to the
//! presentation layer; this module only extracts what changed.

use std::collections::{BTreeMap, BTreeSet};

use crate::backends::DatabaseTrait;
use crate::errors::{Result, StoreError};
use crate::types::{EternalId, FieldValue, KindId, PointerId};

use super::{RecordStore, VersionRecord};

/// Per-slot set change between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotDelta {
    pub added: Vec<EternalId>,
    pub removed: Vec<EternalId>,
}

/// Changes from one revision to another of the same kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VersionDiff {
    /// Changed scalars: name → (old, new). Absent fields read as `Null`.
    pub scalars: BTreeMap<String, (FieldValue, FieldValue)>,
    /// Slots whose target set changed.
    pub slots: BTreeMap<String, SlotDelta>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.slots.is_empty()
    }
}

impl<D: DatabaseTrait> RecordStore<D> {
    /// Compares two revisions field by field and slot by slot. Typically
    /// called with consecutive versions of one eternal, but any two records
    /// of the same kind compare.
    pub fn diff_versions(&self, old: &VersionRecord, new: &VersionRecord) -> Result<VersionDiff> {
        if old.kind() != new.kind() {
            return Err(StoreError::KindMismatch);
        }

        let mut scalars = BTreeMap::new();
        let names: BTreeSet<&str> = old
            .scalars()
            .map(|(name, _)| name)
            .chain(new.scalars().map(|(name, _)| name))
            .collect();
        for name in names {
            let before = old.scalar(name).cloned().unwrap_or(FieldValue::Null);
            let after = new.scalar(name).cloned().unwrap_or(FieldValue::Null);
            if before != after {
                scalars.insert(name.to_owned(), (before, after));
            }
        }

        let tracked = self.registry.require_kind(old.kind())?;
        let mut slots = BTreeMap::new();
        for slot in tracked.slots() {
            let before = self.slot_target_set(slot.target, old.slot(&slot.name))?;
            let after = self.slot_target_set(slot.target, new.slot(&slot.name))?;
            if before == after {
                continue;
            }
            slots.insert(
                slot.name.clone(),
                SlotDelta {
                    added: after.difference(&before).copied().collect(),
                    removed: before.difference(&after).copied().collect(),
                },
            );
        }

        Ok(VersionDiff { scalars, slots })
    }

    fn slot_target_set(
        &self,
        target_kind: KindId,
        pointer: Option<PointerId>,
    ) -> Result<BTreeSet<EternalId>> {
        match pointer {
            Some(id) => Ok(self.pointer_targets(target_kind, id)?.into_iter().collect()),
            None => Ok(BTreeSet::new()),
        }
    }
}
