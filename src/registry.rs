//! Schema Registry
//!
//! The artifact a compilation produces: primitive types, field groups,
//! ancestor records and record types keyed by id, plus the set of
//! unconditional type ids.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::schema::{Block, BlockKind, PrimitiveType};

/// A validated description of a binary format
///
/// Mappings keep declaration order, so iteration and error reporting are
/// reproducible from run to run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaRegistry {
    /// Every declaration under an id, in declaration order
    primitive_types: IndexMap<String, Vec<PrimitiveType>>,
    field_groups: IndexMap<String, Block>,
    ancestors: IndexMap<String, Block>,
    record_types: IndexMap<String, Block>,
    unconditional: IndexSet<String>,
    /// Lowercased field-group id to declared id
    #[serde(skip)]
    group_index: HashMap<String, String>,
}

/// What a field type reference resolved to
#[derive(Debug, Clone, Copy)]
pub enum TypeTarget<'a> {
    Primitive(&'a PrimitiveType),
    FieldGroup(&'a Block),
}

/// Entry counts of a registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub primitive_types: usize,
    pub field_groups: usize,
    pub ancestors: usize,
    pub record_types: usize,
    pub unconditional_types: usize,
    pub fields: usize,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every entry
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.primitive_types.is_empty()
            && self.field_groups.is_empty()
            && self.ancestors.is_empty()
            && self.record_types.is_empty()
    }

    /// The primitive type registered under `id`
    ///
    /// When an id was declared more than once, the last declaration wins.
    pub fn primitive_type(&self, id: &str) -> Option<&PrimitiveType> {
        self.primitive_types.get(id).and_then(|decls| decls.last())
    }

    /// Every declaration registered under `id`, oldest first
    pub fn primitive_type_overloads(&self, id: &str) -> &[PrimitiveType] {
        self.primitive_types.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The field group registered under `id`
    ///
    /// Field type references are lowercase, so a miss on the exact id falls
    /// back to the id lowercased the same way the parser lowercases them.
    pub fn field_group(&self, id: &str) -> Option<&Block> {
        self.field_groups.get(id).or_else(|| {
            self.group_index
                .get(&id.to_lowercase())
                .and_then(|declared| self.field_groups.get(declared))
        })
    }

    pub fn ancestor(&self, id: &str) -> Option<&Block> {
        self.ancestors.get(id)
    }

    pub fn record_type(&self, id: &str) -> Option<&Block> {
        self.record_types.get(id)
    }

    /// Block of the given kind registered under `id`
    pub fn block(&self, kind: BlockKind, id: &str) -> Option<&Block> {
        match kind {
            BlockKind::FieldGroup => self.field_group(id),
            BlockKind::Ancestor => self.ancestor(id),
            BlockKind::RecordType => self.record_type(id),
        }
    }

    /// Resolve a field type reference to a primitive type or a field group
    pub fn resolve_type(&self, type_ref: &str) -> Option<TypeTarget<'_>> {
        self.primitive_type(type_ref)
            .map(TypeTarget::Primitive)
            .or_else(|| self.field_group(type_ref).map(TypeTarget::FieldGroup))
    }

    /// Whether the type is present regardless of version or condition
    pub fn is_unconditional(&self, id: &str) -> bool {
        self.unconditional.contains(id)
            || self
                .field_group(id)
                .is_some_and(|group| self.unconditional.contains(&group.id))
    }

    pub fn primitive_types(&self) -> impl Iterator<Item = &PrimitiveType> {
        self.primitive_types.values().flatten()
    }

    pub fn field_groups(&self) -> impl Iterator<Item = &Block> {
        self.field_groups.values()
    }

    pub fn ancestors(&self) -> impl Iterator<Item = &Block> {
        self.ancestors.values()
    }

    pub fn record_types(&self) -> impl Iterator<Item = &Block> {
        self.record_types.values()
    }

    pub fn unconditional_types(&self) -> impl Iterator<Item = &str> {
        self.unconditional.iter().map(String::as_str)
    }

    pub fn stats(&self) -> RegistryStats {
        let blocks = || {
            self.field_groups
                .values()
                .chain(self.ancestors.values())
                .chain(self.record_types.values())
        };
        RegistryStats {
            primitive_types: self.primitive_types.len(),
            field_groups: self.field_groups.len(),
            ancestors: self.ancestors.len(),
            record_types: self.record_types.len(),
            unconditional_types: self.unconditional.len(),
            fields: blocks().map(|b| b.fields.len()).sum(),
        }
    }

    /// Register a primitive type; earlier declarations under the same id are kept
    pub fn insert_primitive(&mut self, primitive: PrimitiveType) {
        let decls = self.primitive_types.entry(primitive.id.clone()).or_default();
        if !decls.is_empty() {
            tracing::warn!(id = %primitive.id, "primitive type declared more than once");
        }
        decls.push(primitive);
    }

    /// Register a block; an earlier block of the same kind and id is replaced
    pub fn insert_block(&mut self, kind: BlockKind, block: Block) {
        let map = match kind {
            BlockKind::FieldGroup => {
                self.group_index
                    .insert(block.id.to_lowercase(), block.id.clone());
                &mut self.field_groups
            }
            BlockKind::Ancestor => &mut self.ancestors,
            BlockKind::RecordType => &mut self.record_types,
        };
        if let Some(previous) = map.insert(block.id.clone(), block) {
            tracing::warn!(kind = %kind, id = %previous.id, "declaration replaced");
        }
    }

    pub(crate) fn blocks_mut(&mut self, kind: BlockKind) -> &mut IndexMap<String, Block> {
        match kind {
            BlockKind::FieldGroup => &mut self.field_groups,
            BlockKind::Ancestor => &mut self.ancestors,
            BlockKind::RecordType => &mut self.record_types,
        }
    }

    pub(crate) fn blocks_of(&self, kind: BlockKind) -> &IndexMap<String, Block> {
        match kind {
            BlockKind::FieldGroup => &self.field_groups,
            BlockKind::Ancestor => &self.ancestors,
            BlockKind::RecordType => &self.record_types,
        }
    }

    pub(crate) fn set_unconditional(&mut self, ids: IndexSet<String>) {
        self.unconditional = ids;
    }
}
