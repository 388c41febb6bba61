use thiserror::Error;

use crate::types::{CommitId, EternalId, KindId, PointerId, VersionId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record is sealed and can no longer be modified")]
    LockedInformation,

    #[error("parent commit has not been committed")]
    ParentNotCommitted,

    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    #[error("set pointer not found: {0}")]
    PointerNotFound(PointerId),

    #[error("eternal not found: {0}")]
    EternalNotFound(EternalId),

    #[error("version must be saved before it can be used here")]
    UnsavedVersion,

    #[error("kind is not registered: {0}")]
    KindNotRegistered(String),

    #[error("unknown kind id: {0}")]
    UnknownKindId(KindId),

    #[error("cannot diff versions of different kinds")]
    KindMismatch,

    #[error("schema error {0:?}")]
    SchemaError(#[from] SchemaError),

    #[error("database error {0:?}")]
    DatabaseError(#[from] DatabaseError),
}

impl From<DecodeError> for StoreError {
    fn from(value: DecodeError) -> Self {
        Self::DatabaseError(DatabaseError::DecodeError(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::DatabaseError(DatabaseError::IoError(value))
    }
}

pub type Result<T> = ::std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("decode error {0:?}")]
    DecodeError(#[from] DecodeError),

    #[error("io error {0:?}")]
    IoError(std::io::Error),
}

pub type DbResult<T> = ::std::result::Result<T, DatabaseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("incorrect input length")]
    IncorrectLength,
    #[error("malformed row encoding: {0}")]
    Corrupted(String),
}

pub type DecResult<T> = ::std::result::Result<T, DecodeError>;

/// Raised while building a [`crate::schema::Registry`] or when a record
/// does not match its declared kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate kind name `{0}`")]
    DuplicateKind(String),

    #[error("duplicate field or slot name `{field}` in kind `{kind}`")]
    DuplicateField { kind: String, field: String },

    #[error("field name `{field}` in kind `{kind}` is reserved")]
    ReservedField { kind: String, field: String },

    #[error("slot `{slot}` of kind `{kind}` targets unknown kind `{target}`")]
    UnknownTargetKind {
        kind: String,
        slot: String,
        target: String,
    },

    #[error("field `{field}` of kind `{kind}` references unknown kind `{target}`")]
    UnknownRefKind {
        kind: String,
        field: String,
        target: String,
    },

    #[error("kind `{kind}` has no field `{field}`")]
    UnknownField { kind: String, field: String },

    #[error("kind `{kind}` has no slot `{slot}`")]
    UnknownSlot { kind: String, slot: String },

    #[error("value for field `{field}` of kind `{kind}` has the wrong type")]
    FieldTypeMismatch { kind: String, field: String },

    #[error("too many kinds registered")]
    TooManyKinds,
}

#[cfg(test)]
impl PartialEq for StoreError {
    fn eq(&self, other: &Self) -> bool {
        use StoreError::*;
        match (self, other) {
            (LockedInformation, LockedInformation) => true,
            (ParentNotCommitted, ParentNotCommitted) => true,
            (CommitNotFound(a), CommitNotFound(b)) => a == b,
            (VersionNotFound(a), VersionNotFound(b)) => a == b,
            (PointerNotFound(a), PointerNotFound(b)) => a == b,
            (EternalNotFound(a), EternalNotFound(b)) => a == b,
            (UnsavedVersion, UnsavedVersion) => true,
            (KindNotRegistered(a), KindNotRegistered(b)) => a == b,
            (UnknownKindId(a), UnknownKindId(b)) => a == b,
            (KindMismatch, KindMismatch) => true,
            (SchemaError(a), SchemaError(b)) => a == b,
            (DatabaseError(a), DatabaseError(b)) => a == b,

            (LockedInformation, _) => false,
            (ParentNotCommitted, _) => false,
            (CommitNotFound(_), _) => false,
            (VersionNotFound(_), _) => false,
            (PointerNotFound(_), _) => false,
            (EternalNotFound(_), _) => false,
            (UnsavedVersion, _) => false,
            (KindNotRegistered(_), _) => false,
            (UnknownKindId(_), _) => false,
            (KindMismatch, _) => false,
            (SchemaError(_), _) => false,
            (DatabaseError(_), _) => false,
        }
    }
}

#[cfg(test)]
impl PartialEq for DatabaseError {
    fn eq(&self, other: &Self) -> bool {
        use DatabaseError::*;
        match (self, other) {
            (DecodeError(a), DecodeError(b)) => a == b,
            (IoError(_), IoError(_)) => true,
            _ => false,
        }
    }
}
