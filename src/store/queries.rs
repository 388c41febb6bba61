//! Read-only queries over the commit DAG.
//!
//! Queries walk parent links iteratively and work on drafts and sealed
//! commits alike. A missing eternal never raises; it yields `None` or an
//! empty result. Only an unknown starting commit id is an error.

use std::collections::BTreeMap;

use crate::backends::{DatabaseTrait, TableRead};
use crate::errors::Result;
use crate::types::{CommitId, EternalId, EternalRef, KindId};

use super::table_schema::CommitsTable;
use super::{RecordStore, VersionRecord};

/// The live versions at a commit: per kind, one entry per live eternal.
pub type VersionSets = BTreeMap<KindId, BTreeMap<EternalId, VersionRecord>>;

impl<D: DatabaseTrait> RecordStore<D> {
    /// Ancestor commits in reverse-generational order: nearest parent
    /// first, root last. A root's ancestor list is empty.
    pub fn ancestors(&self, commit: CommitId) -> Result<Vec<CommitId>> {
        let mut chain = Vec::new();
        let mut parent = self.require_commit_row(commit)?.parent;
        while let Some(id) = parent {
            chain.push(id);
            parent = self.require_commit_row(id)?.parent;
        }
        Ok(chain)
    }

    /// All commits whose parent chain includes `commit`, depth-first, each
    /// node before its own descendants, siblings in ascending id order.
    pub fn descendants(&self, commit: CommitId) -> Result<Vec<CommitId>> {
        self.require_commit_row(commit)?;

        let mut children: BTreeMap<CommitId, Vec<CommitId>> = BTreeMap::new();
        {
            let view = self.db.view(CommitsTable)?;
            for item in view.iter_from_start()? {
                let (id, row) = item?;
                if let Some(parent) = row.parent {
                    // table iteration is ascending, so child lists are too
                    children.entry(parent).or_default().push(id.into_owned());
                }
            }
        }

        let mut result = Vec::new();
        let mut stack: Vec<CommitId> = children
            .get(&commit)
            .map(|kids| kids.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            result.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        Ok(result)
    }

    /// The version of `eternal` visible at `commit`.
    ///
    /// A commit that removes the eternal hides it; a commit that adds a
    /// version of it makes that version visible; otherwise the parent
    /// decides. `None` for unknown eternals and for kinds this registry
    /// does not track.
    pub fn version_for(&self, commit: CommitId, eternal: EternalRef) -> Result<Option<VersionRecord>> {
        if self.registry.kind(eternal.kind).is_none() {
            return Ok(None);
        }

        let mut current = Some(commit);
        while let Some(commit_id) = current {
            let row = self.require_commit_row(commit_id)?;
            if self
                .commit_removes(eternal.kind, commit_id)?
                .contains(&eternal.id)
            {
                return Ok(None);
            }
            for version_id in self.commit_adds(eternal.kind, commit_id)? {
                let version_row = self.require_version_row(eternal.kind, version_id)?;
                if version_row.eternal == eternal.id {
                    return Ok(Some(VersionRecord::from_row(
                        eternal.kind,
                        Some(version_id),
                        version_row,
                    )));
                }
            }
            current = row.parent;
        }
        Ok(None)
    }

    /// The live record set at `commit`, for every registered kind.
    ///
    /// Built root-down: a commit's adds replace the parent's version of the
    /// same eternal, then its removes drop entries by eternal id.
    pub fn version_sets(&self, commit: CommitId) -> Result<VersionSets> {
        let mut chain = vec![commit];
        chain.extend(self.ancestors(commit)?);
        chain.reverse();

        let mut live: VersionSets = self
            .registry
            .kinds()
            .map(|kind| (kind.id(), BTreeMap::new()))
            .collect();
        for commit_id in chain {
            for kind in self.registry.kinds() {
                let entries = live.entry(kind.id()).or_default();
                for version_id in self.commit_adds(kind.id(), commit_id)? {
                    let version_row = self.require_version_row(kind.id(), version_id)?;
                    entries.insert(
                        version_row.eternal,
                        VersionRecord::from_row(kind.id(), Some(version_id), version_row),
                    );
                }
                for removed in self.commit_removes(kind.id(), commit_id)? {
                    entries.remove(&removed);
                }
            }
        }
        Ok(live)
    }

    /// The commits among `[commit, ancestors…]`, nearest first, that added
    /// a version of `eternal` or removed it.
    pub fn relevant_history_with_respect_to(
        &self,
        commit: CommitId,
        eternal: EternalRef,
    ) -> Result<Vec<CommitId>> {
        if self.registry.kind(eternal.kind).is_none() {
            return Ok(Vec::new());
        }

        let mut chain = vec![commit];
        chain.extend(self.ancestors(commit)?);

        let mut relevant = Vec::new();
        for commit_id in chain {
            if self
                .commit_removes(eternal.kind, commit_id)?
                .contains(&eternal.id)
            {
                relevant.push(commit_id);
                continue;
            }
            for version_id in self.commit_adds(eternal.kind, commit_id)? {
                if self.require_version_row(eternal.kind, version_id)?.eternal == eternal.id {
                    relevant.push(commit_id);
                    break;
                }
            }
        }
        Ok(relevant)
    }
}
