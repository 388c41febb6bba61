pub mod impls;
pub mod serde;
mod table;
mod table_name;
mod write_schema;

pub use impls::in_memory_db::InMemoryDatabase;
pub use table::{TableIter, TableKey, TableRead, TableSchema, TableValue};
pub use table_name::{table_count, TableName};
pub use write_schema::{TableWriteOp, WriteSchemaTrait};

use crate::errors::Result;

/// A backend database: multiple named tables, each a key-value store, with
/// atomic multi-table write batches. This is the whole substrate contract
/// the engine relies on; relational features are not required.
pub trait DatabaseTrait: Sized + Send + Sync {
    /// Type for identifying tables. Different databases may specify different types.
    type TableID: From<TableName> + Send + Sync;

    /// Type for collecting write operations before an atomic commit.
    type WriteSchema: WriteSchemaTrait;

    /// Returns a read-only view of a table.
    fn view<T: TableSchema>(&self, table: T) -> Result<impl '_ + TableRead<T>>;

    /// Creates a new WriteSchema instance.
    fn write_schema() -> Self::WriteSchema;

    /// Atomically applies the collected modifications. Either every
    /// operation in `changes` becomes visible or none does.
    fn commit(&mut self, changes: Self::WriteSchema) -> Result<()>;
}
