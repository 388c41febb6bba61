use std::borrow::{Borrow, Cow};

use super::super::{
    serde::{Decode, Encode},
    table::TableSchema,
    write_schema::WriteSchemaNoSubkey,
    DatabaseTrait, TableIter, TableRead,
};
use crate::errors::{DatabaseError, Result};

use kvdb::KeyValueDB;

pub struct RocksDBColumn<'a> {
    col: u32,
    inner: &'a kvdb_rocksdb::Database,
}

impl<'b, T: TableSchema> TableRead<T> for RocksDBColumn<'b> {
    fn get(&self, key: &T::Key) -> Result<Option<Cow<T::Value>>> {
        if let Some(v) = KeyValueDB::get(self.inner, self.col, key.encode().borrow())? {
            let owned = <T::Value>::decode(&v)?.into_owned();
            Ok(Some(Cow::Owned(owned)))
        } else {
            Ok(None)
        }
    }

    fn iter_from_start(&self) -> Result<TableIter<T>> {
        let iter = KeyValueDB::iter(self.inner, self.col).map(|item| {
            let (key, value) = item.map_err(DatabaseError::IoError)?;
            let key = Cow::Owned(<T::Key>::decode(&key)?.into_owned());
            let value = Cow::Owned(<T::Value>::decode(&value)?.into_owned());
            Ok((key, value))
        });
        Ok(Box::new(iter))
    }
}

impl DatabaseTrait for kvdb_rocksdb::Database {
    type TableID = u32;
    type WriteSchema = WriteSchemaNoSubkey<Self::TableID>;

    fn view<T: TableSchema>(&self, table: T) -> Result<impl '_ + TableRead<T>> {
        Ok(RocksDBColumn {
            col: table.name().into(),
            inner: self,
        })
    }

    fn write_schema() -> Self::WriteSchema {
        Self::WriteSchema::new()
    }

    fn commit(&mut self, changes: Self::WriteSchema) -> Result<()> {
        let mut tx = kvdb::DBTransaction::new();
        for (col, key, value) in changes.drain() {
            if let Some(v) = value {
                tx.put_vec(col, &key, v);
            } else {
                tx.delete(col, key.borrow())
            }
        }

        Ok(KeyValueDB::write(self, tx)?)
    }
}

pub fn open_database(num_columns: u32, db_path: &str) -> Result<kvdb_rocksdb::Database> {
    let config = kvdb_rocksdb::DatabaseConfig::with_columns(num_columns);
    let db = kvdb_rocksdb::Database::open(&config, db_path)?;
    Ok(db)
}
