pub mod in_memory_db;
pub mod kvdb_rocksdb;
