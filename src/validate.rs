//! Whole-document validation
//!
//! Runs once over a fully parsed registry: every reference must resolve,
//! direct self-references are rejected, field groups without version bounds
//! or conditions are classified as unconditional, and fields inherit the
//! default value of the primitive type they use.
//!
//! Only length-1 cycles are rejected by default. A field group embedding
//! itself through another group (`A` -> `B` -> `A`) is caught only with
//! [`Validator::strict_cycles`] enabled.

use indexmap::IndexSet;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::registry::{SchemaRegistry, TypeTarget};
use crate::schema::{Block, BlockKind, Field};
use crate::value::{convert_value, ColorParser, Value};

/// Validates a parsed registry in place
pub struct Validator<'a> {
    colors: &'a dyn ColorParser,
    strict_cycles: bool,
}

impl<'a> Validator<'a> {
    pub fn new(colors: &'a dyn ColorParser) -> Self {
        Self {
            colors,
            strict_cycles: false,
        }
    }

    /// Also reject field-group and ancestor cycles longer than one
    pub fn strict_cycles(mut self, enabled: bool) -> Self {
        self.strict_cycles = enabled;
        self
    }

    /// Check the registry and fill in derived data
    ///
    /// On error the registry may hold partially propagated defaults and must
    /// be discarded.
    pub fn validate(&self, registry: &mut SchemaRegistry) -> Result<()> {
        for kind in [BlockKind::FieldGroup, BlockKind::Ancestor, BlockKind::RecordType] {
            self.check_blocks(registry, kind)?;
            self.propagate_defaults(registry, kind)?;
        }

        if self.strict_cycles {
            check_strongly_connected(registry, BlockKind::FieldGroup)?;
            check_strongly_connected(registry, BlockKind::Ancestor)?;
        }

        let unconditional: IndexSet<String> = registry
            .primitive_types()
            .map(|p| p.id.clone())
            .chain(
                registry
                    .field_groups()
                    .filter(|group| group.is_unconditional())
                    .map(|group| group.id.clone()),
            )
            .collect();
        registry.set_unconditional(unconditional);
        Ok(())
    }

    fn check_blocks(&self, registry: &SchemaRegistry, kind: BlockKind) -> Result<()> {
        for block in registry.blocks_of(kind).values() {
            if kind.accepts_inherit() {
                check_ancestors(registry, kind, block)?;
            }
            for field in &block.fields {
                if registry.resolve_type(&field.type_ref).is_none() {
                    return Err(SchemaError::UnknownType {
                        kind,
                        owner: block.id.clone(),
                        type_ref: field.type_ref.clone(),
                    });
                }
                if kind == BlockKind::FieldGroup && field.type_ref == block.id.to_lowercase() {
                    return Err(SchemaError::Cycle {
                        kind,
                        members: vec![block.id.clone(), block.id.clone()],
                    });
                }
            }
        }
        Ok(())
    }

    fn propagate_defaults(&self, registry: &mut SchemaRegistry, kind: BlockKind) -> Result<()> {
        let mut resolved = Vec::new();
        for (block_index, block) in registry.blocks_of(kind).values().enumerate() {
            for (field_index, field) in block.fields.iter().enumerate() {
                if let Some(value) = self.default_for(registry, field)? {
                    resolved.push((block_index, field_index, value));
                }
            }
        }

        tracing::debug!(kind = %kind, fields = resolved.len(), "defaults propagated");
        let blocks = registry.blocks_mut(kind);
        for (block_index, field_index, value) in resolved {
            if let Some((_, block)) = blocks.get_index_mut(block_index) {
                block.fields[field_index].default = Some(value);
            }
        }
        Ok(())
    }

    /// Default to store on `field`, `None` to leave it untouched
    fn default_for(&self, registry: &SchemaRegistry, field: &Field) -> Result<Option<Value>> {
        if field.default.is_some() {
            return Ok(None);
        }
        match (registry.resolve_type(&field.type_ref), &field.default_literal) {
            (Some(TypeTarget::Primitive(primitive)), Some(literal)) => {
                convert_value(literal, primitive.kind, self.colors).map_err(|err| {
                    SchemaError::declaration(format!("default of field {}: {err}", field.name))
                })
            }
            (Some(TypeTarget::Primitive(primitive)), None) => Ok(primitive.default.clone()),
            (Some(TypeTarget::FieldGroup(_)), Some(literal)) => Ok(Some(Value::String(literal.clone()))),
            _ => Ok(None),
        }
    }
}

fn check_ancestors(registry: &SchemaRegistry, kind: BlockKind, block: &Block) -> Result<()> {
    for ancestor in &block.ancestors {
        if registry.ancestor(ancestor).is_none() {
            return Err(SchemaError::UnknownAncestor {
                kind,
                owner: block.id.clone(),
                ancestor: ancestor.clone(),
            });
        }
        // Record types and ancestors live in separate namespaces.
        if kind == BlockKind::Ancestor && *ancestor == block.id {
            return Err(SchemaError::Cycle {
                kind,
                members: vec![block.id.clone(), block.id.clone()],
            });
        }
    }
    Ok(())
}

/// Reject strongly connected components with more than one member
fn check_strongly_connected(registry: &SchemaRegistry, kind: BlockKind) -> Result<()> {
    let blocks = registry.blocks_of(kind);
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(blocks.len(), blocks.len());
    let nodes: HashMap<&str, NodeIndex> = blocks
        .values()
        .map(|block| (block.id.as_str(), graph.add_node(block.id.as_str())))
        .collect();

    for block in blocks.values() {
        let targets: Vec<&str> = match kind {
            BlockKind::FieldGroup => block
                .fields
                .iter()
                .filter_map(|field| match registry.resolve_type(&field.type_ref) {
                    Some(TypeTarget::FieldGroup(group)) => Some(group.id.as_str()),
                    _ => None,
                })
                .collect(),
            _ => block.ancestors.iter().map(String::as_str).collect(),
        };
        for target in targets {
            if let (Some(&from), Some(&to)) = (nodes.get(block.id.as_str()), nodes.get(target)) {
                graph.update_edge(from, to, ());
            }
        }
    }

    for component in kosaraju_scc(&graph) {
        if component.len() < 2 {
            continue;
        }
        let mut members: Vec<String> = blocks
            .keys()
            .filter(|id| component.iter().any(|&node| graph[node] == id.as_str()))
            .cloned()
            .collect();
        if let Some(first) = members.first().cloned() {
            members.push(first);
        }
        return Err(SchemaError::Cycle { kind, members });
    }
    Ok(())
}
