//! Draft commits and the seal protocol.
//!
//! A commit references the versions it adds and the eternals it removes
//! through per-kind association rows with set semantics. `commit()` runs
//! the whole seal inside one write batch: draft added versions are sealed
//! first, then their draft pointers, then the commit checksum is computed
//! and stamped — the database never shows a partially sealed commit.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::backends::{DatabaseTrait, WriteSchemaTrait};
use crate::errors::{Result, SchemaError, StoreError};
use crate::schema::TrackedKind;
use crate::types::{Checksum, CommitId, EternalId, EternalRef, KindId, PointerId, VersionId};
use crate::utils::hash::digest_str;

use super::table_schema::{
    CommitAddsTable, CommitRemovesTable, CommitRow, CommitsTable, VersionRow, VersionsTable,
};
use super::{RecordStore, SequenceFamily, VersionRecord};

/// One node of the commit DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    id: CommitId,
    parent: Option<CommitId>,
    checksum: Option<Checksum>,
    committed_at: Option<DateTime<Utc>>,
    time: DateTime<Utc>,
    message: String,
}

impl CommitRecord {
    pub(crate) fn from_row(id: CommitId, row: CommitRow) -> Self {
        CommitRecord {
            id,
            parent: row.parent,
            checksum: row.checksum,
            committed_at: row.committed_at,
            time: row.time,
            message: row.message,
        }
    }

    pub fn id(&self) -> CommitId {
        self.id
    }

    pub fn parent(&self) -> Option<CommitId> {
        self.parent
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.checksum.is_some()
    }

    /// Wall-clock seal stamp; informational only, never used for ordering.
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    /// Creation stamp of the draft.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn seal(&mut self, checksum: Checksum, committed_at: DateTime<Utc>) {
        self.checksum = Some(checksum);
        self.committed_at = Some(committed_at);
    }
}

impl<D: DatabaseTrait> RecordStore<D> {
    /// Opens a draft commit. `parent` may be any existing commit or `None`
    /// for a root; a draft parent only fails later, at seal time.
    pub fn new_commit(
        &mut self,
        parent: Option<CommitId>,
        message: impl Into<String>,
    ) -> Result<CommitRecord> {
        if let Some(parent_id) = parent {
            self.require_commit_row(parent_id)?;
        }

        let changes = D::write_schema();
        let id = self.alloc(SequenceFamily::Commit, &changes);
        let row = CommitRow {
            parent,
            checksum: None,
            committed_at: None,
            time: Utc::now(),
            message: message.into(),
        };
        changes.write(CommitsTable, (Cow::Owned(id), Some(Cow::Owned(row.clone()))));
        self.apply(changes)?;

        trace!(commit = id, parent = ?parent, "opened draft commit");
        Ok(CommitRecord::from_row(id, row))
    }

    pub fn commit_record(&self, id: CommitId) -> Result<CommitRecord> {
        let row = self.require_commit_row(id)?;
        Ok(CommitRecord::from_row(id, row))
    }

    /// Declares the versions this commit adds. Versions are grouped by
    /// kind; for every kind present in `versions` the previous add set is
    /// *replaced* (set semantics, not append). All versions must be saved.
    pub fn add_versions<'a, I>(&mut self, commit: &mut CommitRecord, versions: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a VersionRecord>,
    {
        self.require_draft_commit(commit.id)?;

        let mut pairs: Vec<(KindId, VersionId)> = Vec::new();
        for version in versions {
            self.registry.require_kind(version.kind())?;
            let id = version.id().ok_or(StoreError::UnsavedVersion)?;
            self.require_version_row(version.kind(), id)?;
            pairs.push((version.kind(), id));
        }
        let grouped: HashMap<KindId, Vec<VersionId>> = pairs.into_iter().into_group_map();

        let changes = D::write_schema();
        for (kind, mut ids) in grouped {
            ids.sort_unstable();
            ids.dedup();
            changes.write(
                CommitAddsTable(kind),
                (Cow::Owned(commit.id), Some(Cow::Owned(ids))),
            );
        }
        self.apply(changes)
    }

    /// Declares the eternals this commit removes. Accepts anything naming
    /// an eternal — versions coerce to the eternal they revise. Per-kind
    /// replace semantics, like `add_versions`.
    pub fn remove_objects<I>(&mut self, commit: &mut CommitRecord, objects: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<EternalRef>,
    {
        self.require_draft_commit(commit.id)?;

        let mut pairs: Vec<(KindId, EternalId)> = Vec::new();
        for object in objects {
            let eternal: EternalRef = object.into();
            self.registry.require_kind(eternal.kind)?;
            if !self.has_eternal(eternal.kind, eternal.id)? {
                return Err(StoreError::EternalNotFound(eternal.id));
            }
            pairs.push((eternal.kind, eternal.id));
        }
        let grouped: HashMap<KindId, Vec<EternalId>> = pairs.into_iter().into_group_map();

        let changes = D::write_schema();
        for (kind, mut ids) in grouped {
            ids.sort_unstable();
            ids.dedup();
            changes.write(
                CommitRemovesTable(kind),
                (Cow::Owned(commit.id), Some(Cow::Owned(ids))),
            );
        }
        self.apply(changes)
    }

    /// Seals the commit.
    ///
    /// Every draft added version is sealed, then each of its still-draft
    /// pointers; already-sealed versions keep their checksum (a later
    /// commit may re-add a sealed version). The commit checksum digests the
    /// added checksums — kinds in registration order, versions ascending by
    /// id within a kind — followed by the parent checksum, or the empty
    /// string for a root. The batch is applied atomically; any failure
    /// leaves the commit a draft.
    pub fn commit(&mut self, commit: &mut CommitRecord) -> Result<()> {
        let row = self.require_commit_row(commit.id)?;
        if row.checksum.is_some() {
            return Err(StoreError::LockedInformation);
        }
        let parent_checksum = match row.parent {
            Some(parent_id) => self
                .require_commit_row(parent_id)?
                .checksum
                .ok_or(StoreError::ParentNotCommitted)?,
            None => String::new(),
        };

        let registry = self.registry.clone();
        let changes = D::write_schema();
        let mut sealed_pointers: HashSet<(KindId, PointerId)> = HashSet::new();
        let mut preimage = String::new();
        for kind in registry.kinds() {
            for version_id in self.commit_adds(kind.id(), commit.id)? {
                let version_row = self.require_version_row(kind.id(), version_id)?;
                let checksum = match &version_row.checksum {
                    Some(existing) => existing.clone(),
                    None => self.seal_added_version(
                        kind,
                        version_id,
                        &version_row,
                        &mut sealed_pointers,
                        &changes,
                    )?,
                };
                preimage.push_str(&checksum);
            }
        }
        preimage.push_str(&parent_checksum);

        let checksum = digest_str(&preimage);
        let committed_at = Utc::now();
        let sealed = CommitRow {
            checksum: Some(checksum.clone()),
            committed_at: Some(committed_at),
            ..row
        };
        changes.write(CommitsTable, (Cow::Owned(commit.id), Some(Cow::Owned(sealed))));
        self.apply(changes)?;

        debug!(commit = commit.id, %checksum, "sealed commit");
        commit.seal(checksum, committed_at);
        Ok(())
    }

    /// Stages the seal of one draft added version and of its draft
    /// pointers. `sealed_pointers` keeps pointers shared between added
    /// versions from being staged twice within one batch.
    fn seal_added_version(
        &self,
        kind: &TrackedKind,
        version_id: VersionId,
        row: &VersionRow,
        sealed_pointers: &mut HashSet<(KindId, PointerId)>,
        changes: &D::WriteSchema,
    ) -> Result<Checksum> {
        let checksum = digest_str(&row.canonical_text());
        let mut sealed_row = row.clone();
        sealed_row.checksum = Some(checksum.clone());
        changes.write(
            VersionsTable(kind.id()),
            (Cow::Owned(version_id), Some(Cow::Owned(sealed_row))),
        );

        for (slot_name, pointer) in &row.slots {
            let Some(pointer_id) = pointer else { continue };
            let slot = kind
                .slot(slot_name)
                .ok_or_else(|| SchemaError::UnknownSlot {
                    kind: kind.name().to_owned(),
                    slot: slot_name.clone(),
                })?;
            if !sealed_pointers.insert((slot.target, *pointer_id)) {
                continue;
            }
            if self.require_pointer_row(slot.target, *pointer_id)?.checksum.is_none() {
                self.finalize_pointer_in(slot.target, *pointer_id, changes)?;
            }
        }

        Ok(checksum)
    }

    fn require_draft_commit(&self, id: CommitId) -> Result<CommitRow> {
        let row = self.require_commit_row(id)?;
        if row.checksum.is_some() {
            return Err(StoreError::LockedInformation);
        }
        Ok(row)
    }
}
