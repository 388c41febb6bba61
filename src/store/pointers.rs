//! Set-pointer indirection objects.
//!
//! A pointer interns one state of a set-valued field. Pointers live in one
//! table per *target* kind, so slots of different version kinds that point
//! at the same target share states. `save_or_create` keeps the identity of
//! a pointer whose set did not change; that is what makes unchanged sealed
//! pointers referenceable from any number of revisions without copying.

use std::borrow::Cow;

use crate::backends::{DatabaseTrait, WriteSchemaTrait};
use crate::errors::{Result, StoreError};
use crate::types::{Checksum, EternalId, KindId, PointerId};
use crate::utils::hash::digest_str;

use super::table_schema::{pointer_canonical_text, PointerRow, PointerTargetsTable, PointersTable};
use super::{RecordStore, SequenceFamily};

/// Snapshot of one set-pointer row and its target association.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerRecord {
    target_kind: KindId,
    id: PointerId,
    checksum: Option<Checksum>,
    related: Vec<EternalId>,
}

impl PointerRecord {
    pub fn id(&self) -> PointerId {
        self.id
    }

    pub fn target_kind(&self) -> KindId {
        self.target_kind
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.checksum.is_some()
    }

    /// Target eternal ids, ascending.
    pub fn related(&self) -> &[EternalId] {
        &self.related
    }
}

impl<D: DatabaseTrait> RecordStore<D> {
    pub fn pointer_record(&self, target_kind: KindId, id: PointerId) -> Result<PointerRecord> {
        let row = self.require_pointer_row(target_kind, id)?;
        let related = self.pointer_targets(target_kind, id)?;
        Ok(PointerRecord {
            target_kind,
            id,
            checksum: row.checksum,
            related,
        })
    }

    /// Seals a pointer; sealing twice fails with `LockedInformation`.
    pub fn finalize_pointer(&mut self, target_kind: KindId, id: PointerId) -> Result<()> {
        let changes = D::write_schema();
        self.finalize_pointer_in(target_kind, id, &changes)?;
        self.apply(changes)
    }

    /// Stages a fresh draft pointer holding `target_ids` (deduplicated,
    /// stored ascending).
    pub(crate) fn create_pointer_in(
        &mut self,
        target_kind: KindId,
        target_ids: &[EternalId],
        changes: &D::WriteSchema,
    ) -> Result<PointerId> {
        let mut related = target_ids.to_vec();
        related.sort_unstable();
        related.dedup();

        let id = self.alloc(SequenceFamily::Pointer, changes);
        changes.write(
            PointersTable(target_kind),
            (Cow::Owned(id), Some(Cow::Owned(PointerRow { checksum: None }))),
        );
        changes.write(
            PointerTargetsTable(target_kind),
            (Cow::Owned(id), Some(Cow::Owned(related))),
        );
        Ok(id)
    }

    /// Re-points a pointer at `new_ids`.
    ///
    /// - unchanged set: the pointer is returned as-is, nothing is staged;
    /// - sealed pointer or `force_new`: a fresh draft pointer is staged;
    /// - otherwise: the draft pointer's association mutates in place.
    pub(crate) fn pointer_save_or_create_in(
        &mut self,
        target_kind: KindId,
        id: PointerId,
        new_ids: &[EternalId],
        force_new: bool,
        changes: &D::WriteSchema,
    ) -> Result<PointerId> {
        let row = self.require_pointer_row(target_kind, id)?;
        let current = self.pointer_targets(target_kind, id)?;

        let mut related = new_ids.to_vec();
        related.sort_unstable();
        related.dedup();
        if related == current {
            return Ok(id);
        }

        if row.checksum.is_some() || force_new {
            self.create_pointer_in(target_kind, &related, changes)
        } else {
            changes.write(
                PointerTargetsTable(target_kind),
                (Cow::Owned(id), Some(Cow::Owned(related))),
            );
            Ok(id)
        }
    }

    pub(crate) fn finalize_pointer_in(
        &self,
        target_kind: KindId,
        id: PointerId,
        changes: &D::WriteSchema,
    ) -> Result<Checksum> {
        if self.require_pointer_row(target_kind, id)?.checksum.is_some() {
            return Err(StoreError::LockedInformation);
        }
        let related = self.pointer_targets(target_kind, id)?;
        let checksum = digest_str(&pointer_canonical_text(&related));
        changes.write(
            PointersTable(target_kind),
            (
                Cow::Owned(id),
                Some(Cow::Owned(PointerRow {
                    checksum: Some(checksum.clone()),
                })),
            ),
        );
        Ok(checksum)
    }
}
