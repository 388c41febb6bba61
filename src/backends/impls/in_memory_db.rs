use super::super::{
    serde::{Decode, Encode},
    table::TableSchema,
    write_schema::WriteSchemaNoSubkey,
    DatabaseTrait, TableIter, TableRead,
};
use crate::errors::Result;
use std::{borrow::Cow, collections::BTreeMap};

/// BTreeMap-backed database, used by tests and in-process embeddings that
/// do not need persistence.
pub struct InMemoryDatabase(BTreeMap<(u32, Vec<u8>), Vec<u8>>);

pub struct InMemoryTable<'a> {
    inner: &'a InMemoryDatabase,
    col: u32,
}

impl InMemoryDatabase {
    pub fn empty() -> Self {
        Self(Default::default())
    }
}

impl<'b, T: TableSchema> TableRead<T> for InMemoryTable<'b> {
    fn get(&self, key: &T::Key) -> Result<Option<Cow<T::Value>>> {
        let key = (self.col, key.encode().into_owned());
        if let Some(v) = self.inner.0.get(&key) {
            Ok(Some(<T::Value>::decode(v)?))
        } else {
            Ok(None)
        }
    }

    fn iter_from_start(&self) -> Result<TableIter<T>> {
        let range = self.inner.0.range((self.col, Vec::new())..);
        let iter = range
            .take_while(move |((col, _), _)| *col == self.col)
            .map(|((_, k), v)| Ok((<T::Key>::decode(k)?, <T::Value>::decode(v)?)));
        Ok(Box::new(iter))
    }
}

impl DatabaseTrait for InMemoryDatabase {
    type TableID = u32;
    type WriteSchema = WriteSchemaNoSubkey<Self::TableID>;

    fn view<T: TableSchema>(&self, table: T) -> Result<impl '_ + TableRead<T>> {
        Ok(InMemoryTable {
            inner: self,
            col: table.name().into(),
        })
    }

    fn write_schema() -> Self::WriteSchema {
        Self::WriteSchema::new()
    }

    fn commit(&mut self, changes: Self::WriteSchema) -> Result<()> {
        for (col, key, value) in changes.drain() {
            let k = (col, key);
            if let Some(v) = value {
                self.0.insert(k, v)
            } else {
                self.0.remove(&k)
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::table::mock::MockTable;
    use crate::backends::WriteSchemaTrait;

    #[test]
    fn write_batch_then_read_back() {
        let mut db = InMemoryDatabase::empty();

        let changes = InMemoryDatabase::write_schema();
        changes.write(MockTable, (Cow::Owned(2), Some(Cow::Owned(vec![20, 21]))));
        changes.write(MockTable, (Cow::Owned(1), Some(Cow::Owned(vec![10]))));
        db.commit(changes).unwrap();

        let view = db.view(MockTable).unwrap();
        assert_eq!(view.get(&1).unwrap().unwrap().into_owned(), vec![10]);
        assert_eq!(view.get(&3).unwrap(), None);

        // iteration follows key order, not insertion order
        let keys: Vec<u64> = view
            .iter_from_start()
            .unwrap()
            .map(|item| item.unwrap().0.into_owned())
            .collect();
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn deletes_and_overwrites_apply_in_order() {
        let mut db = InMemoryDatabase::empty();

        let changes = InMemoryDatabase::write_schema();
        changes.write(MockTable, (Cow::Owned(1), Some(Cow::Owned(vec![1]))));
        changes.write(MockTable, (Cow::Owned(1), Some(Cow::Owned(vec![2]))));
        changes.write(MockTable, (Cow::Owned(2), Some(Cow::Owned(vec![3]))));
        changes.write(MockTable, (Cow::Owned(2), None));
        db.commit(changes).unwrap();

        let view = db.view(MockTable).unwrap();
        assert_eq!(view.get(&1).unwrap().unwrap().into_owned(), vec![2]);
        assert_eq!(view.get(&2).unwrap(), None);
    }
}
