//! Git-like, content-addressed version control for typed records.
//!
//! Consumers register record kinds (scalar fields plus set-valued "slot"
//! fields) in a [`schema::Registry`], then drive a [`store::RecordStore`]:
//! draft versions are created and edited freely, gathered into draft
//! commits, and sealed by the commit protocol, which fingerprints every
//! reachable row and links the commit into an append-only DAG. Read-only
//! queries reconstruct the live record set and per-record history at any
//! commit.
//!
//! The backing database is opaque to the engine: anything implementing
//! [`backends::DatabaseTrait`] (named tables plus atomic write batches)
//! works. An in-memory backend and a rocksdb backend are provided.

#[macro_use]
extern crate tracing;

pub mod backends;
pub mod errors;
pub mod schema;
pub mod store;
pub mod types;
mod utils;

pub use errors::{Result, StoreError};
pub use schema::{FieldSchema, FieldType, KindSchema, Registry, SlotSchema};
pub use store::{
    CommitRecord, PointerRecord, RecordEdit, RecordStore, SlotDelta, VersionDiff, VersionRecord,
    VersionSets,
};
pub use types::{
    Checksum, CommitId, EternalId, EternalRef, FieldValue, KindId, PointerId, VersionId,
};
