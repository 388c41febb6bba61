//! Version records and the edit/save protocol.
//!
//! A [`VersionRecord`] is a snapshot of one revision row. Drafts are edited
//! in memory and written back through the store; sealing stamps the
//! checksum, after which every write path fails with
//! [`StoreError::LockedInformation`]. Clones share the parent's set
//! pointers until a slot is reassigned, which forks sealed pointers
//! (copy-on-write) and mutates draft pointers in place.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::backends::{DatabaseTrait, WriteSchemaTrait};
use crate::errors::{Result, SchemaError, StoreError};
use crate::types::{Checksum, EternalId, EternalRef, FieldValue, KindId, PointerId, VersionId};
use crate::utils::hash::digest_str;

use super::table_schema::{EternalsTable, VersionRow, VersionsTable};
use super::{RecordStore, SequenceFamily};

/// One revision of a tracked entity.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    kind: KindId,
    /// `None` until first saved; clones start unsaved.
    id: Option<VersionId>,
    eternal: EternalId,
    checksum: Option<Checksum>,
    scalars: BTreeMap<String, FieldValue>,
    slots: BTreeMap<String, Option<PointerId>>,
}

impl VersionRecord {
    pub(crate) fn from_row(kind: KindId, id: Option<VersionId>, row: VersionRow) -> Self {
        VersionRecord {
            kind,
            id,
            eternal: row.eternal,
            checksum: row.checksum,
            scalars: row.scalars,
            slots: row.slots,
        }
    }

    pub(crate) fn to_row(&self) -> VersionRow {
        VersionRow {
            eternal: self.eternal,
            checksum: self.checksum.clone(),
            scalars: self.scalars.clone(),
            slots: self.slots.clone(),
        }
    }

    pub fn kind(&self) -> KindId {
        self.kind
    }

    pub fn id(&self) -> Option<VersionId> {
        self.id
    }

    pub fn eternal_id(&self) -> EternalId {
        self.eternal
    }

    pub fn eternal_ref(&self) -> EternalRef {
        EternalRef::new(self.kind, self.eternal)
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.checksum.is_some()
    }

    pub fn scalar(&self, name: &str) -> Option<&FieldValue> {
        self.scalars.get(name)
    }

    /// Sets a scalar in memory; validation happens on save.
    pub fn set_scalar(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.scalars.insert(name.into(), value.into());
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.scalars.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The pointer currently referenced by a slot, if the slot is non-null.
    pub fn slot(&self, name: &str) -> Option<PointerId> {
        self.slots.get(name).copied().flatten()
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, Option<PointerId>)> {
        self.slots.iter().map(|(name, ptr)| (name.as_str(), *ptr))
    }

    pub(crate) fn set_slot(&mut self, name: &str, pointer: Option<PointerId>) {
        self.slots.insert(name.to_owned(), pointer);
    }

    pub(crate) fn clear_identity(&mut self) {
        self.id = None;
        self.checksum = None;
    }

    pub(crate) fn assign_id(&mut self, id: VersionId) {
        self.id = Some(id);
    }

    pub(crate) fn set_checksum(&mut self, checksum: Checksum) {
        self.checksum = Some(checksum);
    }
}

impl From<&VersionRecord> for EternalRef {
    fn from(version: &VersionRecord) -> Self {
        version.eternal_ref()
    }
}

/// Mass assignment for one record, in the shape a bound edit form submits:
/// scalar values plus full target-id sets per slot. An empty id set stands
/// for "no relation" and yields a null slot, not an empty pointer.
#[derive(Debug, Clone, Default)]
pub struct RecordEdit {
    pub scalars: BTreeMap<String, FieldValue>,
    pub slots: BTreeMap<String, Vec<EternalId>>,
}

impl<D: DatabaseTrait> RecordStore<D> {
    /// Creates the first version of a new entity: allocates a fresh eternal
    /// and a draft version linked to it, in one atomic batch.
    ///
    /// Declared fields missing from `attrs` start as `Null`.
    pub fn create_initial(
        &mut self,
        kind_name: &str,
        attrs: BTreeMap<String, FieldValue>,
    ) -> Result<VersionRecord> {
        let registry = self.registry.clone();
        let kind_id = registry.kind_id(kind_name)?;
        let tracked = registry.require_kind(kind_id)?;

        let mut scalars: BTreeMap<String, FieldValue> = tracked
            .fields()
            .iter()
            .map(|field| (field.name.clone(), FieldValue::Null))
            .collect();
        for (name, value) in attrs {
            tracked.check_scalar(&name, &value)?;
            scalars.insert(name, value);
        }
        let slots = tracked
            .slots()
            .iter()
            .map(|slot| (slot.name.clone(), None))
            .collect();

        let changes = D::write_schema();
        let eternal = self.alloc(SequenceFamily::Eternal, &changes);
        changes.write(
            EternalsTable(kind_id),
            (Cow::Owned(eternal), Some(Cow::Owned(()))),
        );
        let id = self.alloc(SequenceFamily::Version, &changes);
        let row = VersionRow {
            eternal,
            checksum: None,
            scalars,
            slots,
        };
        changes.write(
            VersionsTable(kind_id),
            (Cow::Owned(id), Some(Cow::Owned(row.clone()))),
        );
        self.apply(changes)?;

        trace!(kind = kind_id, version = id, eternal, "created initial version");
        Ok(VersionRecord::from_row(kind_id, Some(id), row))
    }

    /// An unsaved copy of `version`: same eternal and scalars, cleared
    /// checksum, no identity until saved. Slot pointers are shared with the
    /// source until a slot is reassigned.
    pub fn clone_version(&self, version: &VersionRecord) -> VersionRecord {
        let mut clone = version.clone();
        clone.clear_identity();
        clone
    }

    /// Reads a version back from the store.
    pub fn version_record(&self, kind: KindId, id: VersionId) -> Result<VersionRecord> {
        let row = self.require_version_row(kind, id)?;
        Ok(VersionRecord::from_row(kind, Some(id), row))
    }

    /// Inserts or updates the draft row, allocating an id on first save.
    pub fn save_version(&mut self, version: &mut VersionRecord) -> Result<()> {
        let changes = D::write_schema();
        self.write_version(version, &changes)?;
        self.apply(changes)
    }

    /// Seals `version`: computes the checksum over the canonical record and
    /// writes it back. Sealing twice fails with `LockedInformation`.
    pub fn finalize_version(&mut self, version: &mut VersionRecord) -> Result<()> {
        let id = version.id.ok_or(StoreError::UnsavedVersion)?;
        if version.checksum.is_some()
            || self.require_version_row(version.kind, id)?.checksum.is_some()
        {
            return Err(StoreError::LockedInformation);
        }
        self.validate_record(version)?;

        let mut row = version.to_row();
        let checksum = digest_str(&row.canonical_text());
        row.checksum = Some(checksum.clone());

        let changes = D::write_schema();
        changes.write(
            VersionsTable(version.kind),
            (Cow::Owned(id), Some(Cow::Owned(row))),
        );
        self.apply(changes)?;

        trace!(kind = version.kind, version = id, %checksum, "sealed version");
        version.set_checksum(checksum);
        Ok(())
    }

    /// Copy-on-write save: a draft saves in place, a sealed record (or
    /// `force_new`) saves as a fresh clone. Returns the record that now
    /// holds the requested state.
    pub fn save_or_create(
        &mut self,
        version: &VersionRecord,
        force_new: bool,
    ) -> Result<VersionRecord> {
        let changes = D::write_schema();
        let result = self.save_or_create_in(version, force_new, &changes)?;
        self.apply(changes)?;
        Ok(result)
    }

    /// Assigns a slot's full target-id set.
    ///
    /// Delegates to the slot's current pointer: an unchanged set keeps the
    /// pointer, a draft pointer mutates in place, a sealed pointer forks.
    /// The version row itself is only written when the pointer identity
    /// changed, so assigning the current set to a sealed version is a no-op
    /// rather than an error.
    pub fn set_m2m(
        &mut self,
        version: &mut VersionRecord,
        slot_name: &str,
        target_ids: &[EternalId],
    ) -> Result<()> {
        let registry = self.registry.clone();
        let tracked = registry.require_kind(version.kind)?;
        let slot = tracked
            .slot(slot_name)
            .ok_or_else(|| SchemaError::UnknownSlot {
                kind: tracked.name().to_owned(),
                slot: slot_name.to_owned(),
            })?;
        self.check_targets(slot.target, target_ids)?;

        let changes = D::write_schema();
        let previous = version.slot(slot_name);
        let pointer = match previous {
            Some(pointer_id) => {
                self.pointer_save_or_create_in(slot.target, pointer_id, target_ids, false, &changes)?
            }
            None => self.create_pointer_in(slot.target, target_ids, &changes)?,
        };
        if previous != Some(pointer) {
            version.set_slot(slot_name, Some(pointer));
            self.write_version(version, &changes)?;
        }
        self.apply(changes)
    }

    /// Applies a mass edit: scalars are assigned, slots are re-pointed with
    /// `save_or_create` pointer semantics, and the record itself goes
    /// through a copy-on-write save — editing a sealed version yields a new
    /// draft revision of the same eternal. One atomic batch.
    pub fn apply_edit(&mut self, version: &VersionRecord, edit: RecordEdit) -> Result<VersionRecord> {
        let registry = self.registry.clone();
        let tracked = registry.require_kind(version.kind)?;

        let mut working = version.clone();
        for (name, value) in edit.scalars {
            tracked.check_scalar(&name, &value)?;
            working.scalars.insert(name, value);
        }

        let changes = D::write_schema();
        for (slot_name, target_ids) in &edit.slots {
            let slot = tracked
                .slot(slot_name)
                .ok_or_else(|| SchemaError::UnknownSlot {
                    kind: tracked.name().to_owned(),
                    slot: slot_name.clone(),
                })?;
            let pointer = if target_ids.is_empty() {
                None
            } else {
                self.check_targets(slot.target, target_ids)?;
                Some(match working.slot(slot_name) {
                    Some(pointer_id) => self.pointer_save_or_create_in(
                        slot.target,
                        pointer_id,
                        target_ids,
                        false,
                        &changes,
                    )?,
                    None => self.create_pointer_in(slot.target, target_ids, &changes)?,
                })
            };
            working.set_slot(slot_name, pointer);
        }

        let result = self.save_or_create_in(&working, false, &changes)?;
        self.apply(changes)?;
        Ok(result)
    }

    /// Whether the record must fork on save: its own checksum is set, or
    /// its stored row has been sealed since this snapshot was taken.
    fn effectively_sealed(&self, version: &VersionRecord) -> Result<bool> {
        if version.checksum.is_some() {
            return Ok(true);
        }
        match version.id {
            Some(id) => Ok(self.require_version_row(version.kind, id)?.checksum.is_some()),
            None => Ok(false),
        }
    }

    fn save_or_create_in(
        &mut self,
        version: &VersionRecord,
        force_new: bool,
        changes: &D::WriteSchema,
    ) -> Result<VersionRecord> {
        let mut result = if self.effectively_sealed(version)? || force_new {
            self.clone_version(version)
        } else {
            version.clone()
        };
        self.write_version(&mut result, changes)?;
        Ok(result)
    }

    /// Validates and stages one version row write. Fails before staging
    /// anything if the record or its stored row is sealed.
    fn write_version(&mut self, version: &mut VersionRecord, changes: &D::WriteSchema) -> Result<()> {
        if version.checksum.is_some() {
            return Err(StoreError::LockedInformation);
        }
        self.validate_record(version)?;

        let id = match version.id {
            Some(id) => {
                if self.require_version_row(version.kind, id)?.checksum.is_some() {
                    return Err(StoreError::LockedInformation);
                }
                id
            }
            None => {
                let id = self.alloc(SequenceFamily::Version, changes);
                version.assign_id(id);
                id
            }
        };
        changes.write(
            VersionsTable(version.kind),
            (Cow::Owned(id), Some(Cow::Owned(version.to_row()))),
        );
        Ok(())
    }

    fn validate_record(&self, version: &VersionRecord) -> Result<()> {
        let tracked = self.registry.require_kind(version.kind)?;
        for (name, value) in &version.scalars {
            tracked.check_scalar(name, value)?;
        }
        for name in version.slots.keys() {
            if tracked.slot(name).is_none() {
                return Err(SchemaError::UnknownSlot {
                    kind: tracked.name().to_owned(),
                    slot: name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_targets(&self, target_kind: KindId, target_ids: &[EternalId]) -> Result<()> {
        for id in target_ids {
            if !self.has_eternal(target_kind, *id)? {
                return Err(StoreError::EternalNotFound(*id));
            }
        }
        Ok(())
    }
}
