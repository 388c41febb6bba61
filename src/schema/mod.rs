//! The tracked-kind registry.
//!
//! Kinds are declared as plain data ([`KindSchema`]) and resolved once at
//! startup into a [`Registry`]. The registry is immutable afterwards; it
//! fixes the kind iteration order used by commit checksums (registration
//! order) and sizes the table set of the backing database.

use std::collections::HashMap;

use crate::backends::table_count;
use crate::errors::{Result, SchemaError, StoreError};
use crate::types::{FieldValue, KindId};

/// Field names the engine claims for itself on every kind.
const RESERVED_FIELDS: &[&str] = &["eternal", "checksum"];

/// Declared type of one scalar field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Boolean,
    Timestamp,
    /// Scalar link to the eternal identity of another tracked kind,
    /// named at declaration time and resolved when the registry is built.
    EternalRef { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
}

/// Declaration of one set-valued slot. `target` names the tracked kind the
/// slot's pointer collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSchema {
    pub name: String,
    pub target: String,
}

/// Declaration of one tracked kind, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
    pub slots: Vec<SlotSchema>,
}

impl KindSchema {
    pub fn new(name: impl Into<String>) -> Self {
        KindSchema {
            name: name.into(),
            fields: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            field_type,
        });
        self
    }

    pub fn slot(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.slots.push(SlotSchema {
            name: name.into(),
            target: target.into(),
        });
        self
    }
}

/// A slot with its target kind resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlot {
    pub name: String,
    pub target: KindId,
}

/// One registered kind. Produced by [`Registry::build`], never constructed
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedKind {
    id: KindId,
    name: String,
    fields: Vec<FieldSchema>,
    slots: Vec<ResolvedSlot>,
}

impl TrackedKind {
    pub fn id(&self) -> KindId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn slots(&self) -> &[ResolvedSlot] {
        &self.slots
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn slot(&self, name: &str) -> Option<&ResolvedSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Checks one scalar value against the declared field type. `Null` is
    /// accepted for every field type; nullability constraints belong to the
    /// embedding layer.
    pub fn check_scalar(&self, field: &str, value: &FieldValue) -> Result<()> {
        let schema = self
            .field(field)
            .ok_or_else(|| SchemaError::UnknownField {
                kind: self.name.clone(),
                field: field.to_owned(),
            })?;

        let ok = matches!(
            (&schema.field_type, value),
            (_, FieldValue::Null)
                | (FieldType::Text, FieldValue::Text(_))
                | (FieldType::Integer, FieldValue::Integer(_))
                | (FieldType::Boolean, FieldValue::Boolean(_))
                | (FieldType::Timestamp, FieldValue::Timestamp(_))
                | (FieldType::EternalRef { .. }, FieldValue::EternalRef(_))
        );
        if ok {
            Ok(())
        } else {
            Err(SchemaError::FieldTypeMismatch {
                kind: self.name.clone(),
                field: field.to_owned(),
            }
            .into())
        }
    }
}

/// The process-wide set of tracked kinds, keyed by [`KindId`] in
/// registration order. Built once at startup, read-only afterwards.
#[derive(Debug)]
pub struct Registry {
    kinds: Vec<TrackedKind>,
    by_name: HashMap<String, KindId>,
}

impl Registry {
    /// Resolves and validates a set of kind declarations.
    ///
    /// Registration order is significant: it determines kind ids, the
    /// backing table layout, and the kind iteration order of the commit
    /// checksum.
    pub fn build(declared: Vec<KindSchema>) -> Result<Self> {
        if declared.len() > usize::from(KindId::MAX) {
            return Err(SchemaError::TooManyKinds.into());
        }

        let mut by_name = HashMap::new();
        for (index, kind) in declared.iter().enumerate() {
            if by_name.insert(kind.name.clone(), index as KindId).is_some() {
                return Err(SchemaError::DuplicateKind(kind.name.clone()).into());
            }
        }

        let mut kinds = Vec::with_capacity(declared.len());
        for (index, kind) in declared.into_iter().enumerate() {
            let mut seen = Vec::new();
            for name in kind
                .fields
                .iter()
                .map(|f| &f.name)
                .chain(kind.slots.iter().map(|s| &s.name))
            {
                if RESERVED_FIELDS.contains(&name.as_str()) {
                    return Err(SchemaError::ReservedField {
                        kind: kind.name.clone(),
                        field: name.clone(),
                    }
                    .into());
                }
                if seen.contains(&name) {
                    return Err(SchemaError::DuplicateField {
                        kind: kind.name.clone(),
                        field: name.clone(),
                    }
                    .into());
                }
                seen.push(name);
            }

            for field in &kind.fields {
                if let FieldType::EternalRef { target } = &field.field_type {
                    if !by_name.contains_key(target) {
                        return Err(SchemaError::UnknownRefKind {
                            kind: kind.name.clone(),
                            field: field.name.clone(),
                            target: target.clone(),
                        }
                        .into());
                    }
                }
            }

            let mut slots = Vec::with_capacity(kind.slots.len());
            for slot in &kind.slots {
                let target =
                    *by_name
                        .get(&slot.target)
                        .ok_or_else(|| SchemaError::UnknownTargetKind {
                            kind: kind.name.clone(),
                            slot: slot.name.clone(),
                            target: slot.target.clone(),
                        })?;
                slots.push(ResolvedSlot {
                    name: slot.name.clone(),
                    target,
                });
            }

            kinds.push(TrackedKind {
                id: index as KindId,
                name: kind.name,
                fields: kind.fields,
                slots,
            });
        }

        Ok(Registry { kinds, by_name })
    }

    pub fn kind(&self, id: KindId) -> Option<&TrackedKind> {
        self.kinds.get(usize::from(id))
    }

    pub fn kind_id(&self, name: &str) -> Result<KindId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::KindNotRegistered(name.to_owned()))
    }

    pub fn require_kind(&self, id: KindId) -> Result<&TrackedKind> {
        self.kind(id).ok_or(StoreError::UnknownKindId(id))
    }

    /// Kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &TrackedKind> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Number of backend tables this registry requires.
    pub fn table_count(&self) -> u32 {
        table_count(self.kinds.len() as KindId)
    }
}
