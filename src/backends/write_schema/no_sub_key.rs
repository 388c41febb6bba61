use super::super::{serde::Encode, TableName, TableSchema};
use super::{TableWriteOp, WriteSchemaTrait};
use parking_lot::Mutex;

pub struct WriteSchemaNoSubkey<Name> {
    inner: Mutex<Vec<(Name, Vec<u8>, Option<Vec<u8>>)>>,
}

impl<Name> WriteSchemaNoSubkey<Name> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(vec![]),
        }
    }

    pub fn drain(self) -> Vec<(Name, Vec<u8>, Option<Vec<u8>>)> {
        let mut inner = self.inner.lock();
        std::mem::take(&mut *inner)
    }
}

impl<Name> Default for WriteSchemaNoSubkey<Name> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Name: From<TableName> + Send + Sync> WriteSchemaTrait for WriteSchemaNoSubkey<Name> {
    fn write<T: TableSchema>(&self, table: T, op: TableWriteOp<'_, T>) {
        let (key, value) = op;
        let raw_key = <T::Key as Encode>::encode_cow(key).into_owned();
        let raw_value = value.map(|v| <T::Value as Encode>::encode_cow(v).into_owned());

        let mut inner = self.inner.lock();
        inner.push((table.name().into(), raw_key, raw_value));
    }
}
