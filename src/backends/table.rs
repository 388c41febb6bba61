use std::borrow::Cow;
use std::fmt::Debug;

use super::serde::{Decode, Encode};
use super::table_name::TableName;
use crate::combine_traits;

use crate::errors::{DbResult, Result};
use auto_impl::auto_impl;

pub type TableItem<'a, T> = (
    Cow<'a, <T as TableSchema>::Key>,
    Cow<'a, <T as TableSchema>::Value>,
);
pub type TableIter<'a, 'b, T> = Box<dyn 'a + Iterator<Item = DbResult<TableItem<'b, T>>>>;

#[auto_impl(&)]
pub trait TableRead<T: TableSchema> {
    fn get(&self, key: &T::Key) -> Result<Option<Cow<T::Value>>>;

    fn iter_from_start(&self) -> Result<TableIter<T>>;
}

combine_traits!(TableKey: 'static + Encode + Decode + ToOwned + Ord + Eq + Send + Sync + Debug);
combine_traits!(TableValue: 'static + Encode + Decode + ToOwned + Send + Sync + Debug);

/// A handle naming one table together with its key/value types.
///
/// Tracked kinds are registered at runtime, so handles carry their kind id
/// and resolve the [`TableName`] through an instance method.
pub trait TableSchema: 'static + Copy + Send + Sync {
    type Key: TableKey + ?Sized;
    type Value: TableValue + ?Sized;

    fn name(&self) -> TableName;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{TableName, TableSchema};

    #[derive(Clone, Copy)]
    pub struct MockTable;

    impl TableSchema for MockTable {
        type Key = u64;
        type Value = Vec<u64>;

        fn name(&self) -> TableName {
            TableName::MockTable
        }
    }
}
