mod no_sub_key;

pub use no_sub_key::WriteSchemaNoSubkey;

use super::TableSchema;
use auto_impl::auto_impl;
use std::borrow::Cow;

pub type TableWriteOp<'a, T> = (
    Cow<'a, <T as TableSchema>::Key>,
    Option<Cow<'a, <T as TableSchema>::Value>>,
);

/// Collects write operations across tables; the whole collection is applied
/// in one atomic database commit.
#[auto_impl(&)]
pub trait WriteSchemaTrait: Send + Sync {
    fn write<T: TableSchema>(&self, table: T, op: TableWriteOp<'_, T>);
}
