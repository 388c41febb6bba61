//! The commit/version/pointer engine.
//!
//! [`RecordStore`] owns the backing database and a resolved
//! [`Registry`]. Records move through the store as plain snapshots
//! ([`VersionRecord`], [`CommitRecord`], [`PointerRecord`]); every mutating
//! operation collects its table writes into one batch and applies it
//! atomically, so the database never shows partial sealing.

mod commits;
mod diff;
mod pointers;
mod queries;
mod table_schema;
mod versions;

pub use commits::CommitRecord;
pub use diff::{SlotDelta, VersionDiff};
pub use pointers::PointerRecord;
pub use queries::VersionSets;
pub use versions::{RecordEdit, VersionRecord};

use std::borrow::Cow;
use std::sync::Arc;

use crate::backends::{DatabaseTrait, TableRead, WriteSchemaTrait};
use crate::errors::{Result, StoreError};
use crate::schema::Registry;
use crate::types::{CommitId, EternalId, EternalRef, KindId, PointerId, VersionId};

use self::table_schema::{
    CommitAddsTable, CommitRemovesTable, CommitRow, CommitsTable, EternalsTable, PointerRow,
    PointerTargetsTable, PointersTable, SequencesTable, VersionRow, VersionsTable,
};

/// Row families whose ids the engine allocates itself.
#[derive(Clone, Copy)]
enum SequenceFamily {
    Eternal = 0,
    Version = 1,
    Pointer = 2,
    Commit = 3,
}

const SEQUENCE_FAMILIES: usize = 4;

pub struct RecordStore<D: DatabaseTrait> {
    db: D,
    registry: Arc<Registry>,
    next_ids: [u64; SEQUENCE_FAMILIES],
}

impl<D: DatabaseTrait> RecordStore<D> {
    /// Opens a store over `db`. Sequence counters are restored from the
    /// database so row ids stay unique across processes.
    pub fn open(db: D, registry: Arc<Registry>) -> Result<Self> {
        let mut next_ids = [1u64; SEQUENCE_FAMILIES];
        {
            let view = db.view(SequencesTable)?;
            for (family, next) in next_ids.iter_mut().enumerate() {
                if let Some(stored) = view.get(&(family as u64))? {
                    *next = stored.into_owned();
                }
            }
        }
        debug!(kinds = registry.len(), "opened record store");

        Ok(RecordStore {
            db,
            registry,
            next_ids,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Hands the backing database back, e.g. to reopen the store later.
    pub fn into_inner(self) -> D {
        self.db
    }

    /// Allocates the next id of a family. The bumped counter rides in the
    /// same batch as the row that uses the id.
    fn alloc(&mut self, family: SequenceFamily, changes: &D::WriteSchema) -> u64 {
        let next = &mut self.next_ids[family as usize];
        let id = *next;
        *next = id + 1;
        changes.write(
            SequencesTable,
            (Cow::Owned(family as u64), Some(Cow::Owned(id + 1))),
        );
        id
    }

    fn apply(&mut self, changes: D::WriteSchema) -> Result<()> {
        self.db.commit(changes)
    }

    // Row access. Helpers return owned rows so no table view outlives the
    // call that produced it.

    pub(crate) fn version_row(&self, kind: KindId, id: VersionId) -> Result<Option<VersionRow>> {
        Ok(self
            .db
            .view(VersionsTable(kind))?
            .get(&id)?
            .map(Cow::into_owned))
    }

    pub(crate) fn require_version_row(&self, kind: KindId, id: VersionId) -> Result<VersionRow> {
        self.version_row(kind, id)?
            .ok_or(StoreError::VersionNotFound(id))
    }

    pub(crate) fn pointer_row(&self, kind: KindId, id: PointerId) -> Result<Option<PointerRow>> {
        Ok(self
            .db
            .view(PointersTable(kind))?
            .get(&id)?
            .map(Cow::into_owned))
    }

    pub(crate) fn require_pointer_row(&self, kind: KindId, id: PointerId) -> Result<PointerRow> {
        self.pointer_row(kind, id)?
            .ok_or(StoreError::PointerNotFound(id))
    }

    pub(crate) fn pointer_targets(&self, kind: KindId, id: PointerId) -> Result<Vec<EternalId>> {
        Ok(self
            .db
            .view(PointerTargetsTable(kind))?
            .get(&id)?
            .map(Cow::into_owned)
            .unwrap_or_default())
    }

    pub(crate) fn commit_row(&self, id: CommitId) -> Result<Option<CommitRow>> {
        Ok(self.db.view(CommitsTable)?.get(&id)?.map(Cow::into_owned))
    }

    pub(crate) fn require_commit_row(&self, id: CommitId) -> Result<CommitRow> {
        self.commit_row(id)?.ok_or(StoreError::CommitNotFound(id))
    }

    /// The version ids a commit adds for one kind, ascending.
    pub(crate) fn commit_adds(&self, kind: KindId, commit: CommitId) -> Result<Vec<VersionId>> {
        Ok(self
            .db
            .view(CommitAddsTable(kind))?
            .get(&commit)?
            .map(Cow::into_owned)
            .unwrap_or_default())
    }

    /// The eternal ids a commit removes for one kind, ascending.
    pub(crate) fn commit_removes(&self, kind: KindId, commit: CommitId) -> Result<Vec<EternalId>> {
        Ok(self
            .db
            .view(CommitRemovesTable(kind))?
            .get(&commit)?
            .map(Cow::into_owned)
            .unwrap_or_default())
    }

    pub(crate) fn has_eternal(&self, kind: KindId, id: EternalId) -> Result<bool> {
        Ok(self.db.view(EternalsTable(kind))?.get(&id)?.is_some())
    }

    pub fn eternal_exists(&self, eternal: EternalRef) -> Result<bool> {
        self.has_eternal(eternal.kind, eternal.id)
    }
}
