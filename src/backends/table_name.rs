use std::fmt;

use crate::types::KindId;

/// Identifies one table of the backing database.
///
/// The fixed tables come first; every tracked kind contributes one block of
/// per-kind tables, laid out by kind id so that column indices are stable
/// for a given registry. `Pointers`/`PointerTargets` are keyed by the
/// *target* kind of a slot: slots of different version kinds that point at
/// the same target kind share one pointer table.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TableName {
    Commits,
    Sequences,
    Versions(KindId),
    Eternals(KindId),
    Pointers(KindId),
    PointerTargets(KindId),
    CommitAdds(KindId),
    CommitRemoves(KindId),
    #[cfg(test)]
    MockTable,
}

const FIXED_TABLES: u32 = 2;
const TABLES_PER_KIND: u32 = 6;

/// Number of tables a database must provide for `num_kinds` tracked kinds.
pub const fn table_count(num_kinds: u16) -> u32 {
    FIXED_TABLES + num_kinds as u32 * TABLES_PER_KIND
}

impl From<TableName> for u32 {
    fn from(t: TableName) -> Self {
        use TableName::*;
        let kind_table = |kind: KindId, offset: u32| FIXED_TABLES + kind as u32 * TABLES_PER_KIND + offset;
        match t {
            Commits => 0,
            Sequences => 1,
            Versions(k) => kind_table(k, 0),
            Eternals(k) => kind_table(k, 1),
            Pointers(k) => kind_table(k, 2),
            PointerTargets(k) => kind_table(k, 3),
            CommitAdds(k) => kind_table(k, 4),
            CommitRemoves(k) => kind_table(k, 5),
            #[cfg(test)]
            MockTable => u32::MAX,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TableName::*;
        match self {
            Commits => write!(f, "commits"),
            Sequences => write!(f, "sequences"),
            Versions(k) => write!(f, "versions_{k}"),
            Eternals(k) => write!(f, "eternals_{k}"),
            Pointers(k) => write!(f, "pointers_{k}"),
            PointerTargets(k) => write!(f, "pointer_targets_{k}"),
            CommitAdds(k) => write!(f, "commit_adds_{k}"),
            CommitRemoves(k) => write!(f, "commit_removes_{k}"),
            #[cfg(test)]
            MockTable => write!(f, "mock_table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_do_not_collide() {
        let names = [
            TableName::Commits,
            TableName::Sequences,
            TableName::Versions(0),
            TableName::Eternals(0),
            TableName::Pointers(0),
            TableName::PointerTargets(0),
            TableName::CommitAdds(0),
            TableName::CommitRemoves(0),
            TableName::Versions(1),
            TableName::CommitRemoves(1),
        ];
        let mut cols: Vec<u32> = names.iter().map(|n| u32::from(*n)).collect();
        cols.sort_unstable();
        cols.dedup();
        assert_eq!(cols.len(), names.len());
        assert!(cols.iter().all(|c| *c < table_count(2)));
    }
}
