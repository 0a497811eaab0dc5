//! Parse state machine
//!
//! Consumes "element opened" / "element closed" events and builds registry
//! entries as declarations close. The first error is terminal: the caller
//! stops feeding events and drops the parser together with any half-built
//! declaration and the uncommitted registry.

use indexmap::IndexMap;

use crate::error::{Result, SchemaError};
use crate::grammar::{self, Element, ROOT_ELEMENT};
use crate::registry::SchemaRegistry;
use crate::schema::{Block, BlockKind, Field, PrimitiveType};
use crate::value::{convert_value, ColorParser, InternalKind};
use crate::version::{VersionRange, VersionScheme};

/// Attributes of one element, in document order
#[derive(Debug, Clone, Default)]
pub struct Attributes(IndexMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value of `name`, empty when the attribute is missing
    pub fn value(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    fn lowercase(&self, name: &str) -> String {
        self.value(name).to_lowercase()
    }

    fn optional_lowercase(&self, name: &str) -> Option<String> {
        Some(self.lowercase(name)).filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Builds a registry from element events
pub struct SchemaParser<'a> {
    versions: &'a dyn VersionScheme,
    colors: &'a dyn ColorParser,
    stack: Vec<Element>,
    seen_root: bool,
    pending_type: Option<PrimitiveType>,
    pending_block: Option<(BlockKind, Block)>,
    registry: SchemaRegistry,
}

impl<'a> SchemaParser<'a> {
    pub fn new(versions: &'a dyn VersionScheme, colors: &'a dyn ColorParser) -> Self {
        Self {
            versions,
            colors,
            stack: Vec::with_capacity(grammar::MAX_DEPTH),
            seen_root: false,
            pending_type: None,
            pending_block: None,
            registry: SchemaRegistry::new(),
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<()> {
        let element = grammar::check_open(name, self.stack.last().copied(), self.stack.len())?;
        match element {
            Element::Root => {
                if self.seen_root {
                    return Err(SchemaError::grammar(format!(
                        "only one {ROOT_ELEMENT} element allowed"
                    )));
                }
                self.seen_root = true;
            }
            Element::Type => self.begin_type(attrs)?,
            Element::Compound | Element::Ancestor | Element::NiBlock => {
                if let Some(kind) = element.block_kind() {
                    self.pending_block = Some((kind, Block::new(attrs.value("name"))));
                }
            }
            Element::Add => {
                let field = self.field(attrs)?;
                self.active_block()?.fields.push(field);
            }
            Element::Inherit => {
                let ancestor = attrs.value("name");
                if ancestor.is_empty() {
                    return Err(SchemaError::declaration("inherit needs name attribute"));
                }
                let ancestor = ancestor.to_string();
                self.active_block()?.ancestors.push(ancestor);
            }
        }
        self.stack.push(element);
        Ok(())
    }

    pub fn end_element(&mut self, name: &str) -> Result<()> {
        let Some(open) = self.stack.pop() else {
            return Err(SchemaError::grammar(format!(
                "mismatching end element tag for element {name}"
            )));
        };
        if open.name() != name {
            return Err(SchemaError::grammar(format!(
                "mismatching end element tag for element {open}, got {name}"
            )));
        }

        match open {
            Element::Type => {
                if let Some(primitive) = self.pending_type.take() {
                    if primitive.id.is_empty() {
                        return Err(SchemaError::declaration(
                            "invalid type declaration: specify at least name and type",
                        ));
                    }
                    tracing::debug!(id = %primitive.id, kind = %primitive.kind, "primitive type declared");
                    self.registry.insert_primitive(primitive);
                }
            }
            Element::Compound | Element::Ancestor | Element::NiBlock => {
                if let Some((kind, block)) = self.pending_block.take() {
                    if block.id.is_empty() {
                        return Err(SchemaError::declaration(format!(
                            "invalid {kind} declaration: name is empty"
                        )));
                    }
                    tracing::debug!(kind = %kind, id = %block.id, fields = block.fields.len(), "block declared");
                    self.registry.insert_block(kind, block);
                }
            }
            Element::Root | Element::Add | Element::Inherit => {}
        }
        Ok(())
    }

    /// Hand over the parsed, not yet validated registry once the stream ended
    pub fn finish(self) -> Result<SchemaRegistry> {
        if let Some(open) = self.stack.last() {
            return Err(SchemaError::Syntax(format!(
                "unexpected end of document, element {open} is not closed"
            )));
        }
        if !self.seen_root {
            return Err(SchemaError::Syntax(format!("no {ROOT_ELEMENT} element found")));
        }
        Ok(self.registry)
    }

    fn begin_type(&mut self, attrs: &Attributes) -> Result<()> {
        let kind: InternalKind = attrs.value("type").parse()?;
        let mut primitive = PrimitiveType::new(attrs.lowercase("name"), kind);
        primitive.display = attrs.optional_lowercase("display");
        primitive.versions = self.version_range(attrs)?;
        primitive.default = convert_value(attrs.value("value"), kind, self.colors)?;
        self.pending_type = Some(primitive);
        Ok(())
    }

    fn field(&self, attrs: &Attributes) -> Result<Field> {
        let mut field = Field::new(attrs.lowercase("name"), attrs.lowercase("type"));
        if field.name.is_empty() || field.type_ref.is_empty() {
            return Err(SchemaError::declaration("add needs at least name and type attributes"));
        }
        field.arg = attrs.optional_lowercase("arg");
        field.arr1 = attrs.optional_lowercase("arr1");
        field.arr2 = attrs.optional_lowercase("arr2");
        field.cond = attrs.optional_lowercase("cond");
        field.versions = self.version_range(attrs)?;
        field.default_literal = Some(attrs.value("default").to_string()).filter(|v| !v.is_empty());
        Ok(field)
    }

    fn version_range(&self, attrs: &Attributes) -> Result<VersionRange> {
        Ok(VersionRange::new(
            self.ordinal(attrs.value("ver1"))?,
            self.ordinal(attrs.value("ver2"))?,
        ))
    }

    fn ordinal(&self, version: &str) -> Result<Option<u32>> {
        if version.is_empty() {
            return Ok(None);
        }
        self.versions
            .ordinal(version)
            .map(Some)
            .ok_or_else(|| SchemaError::declaration(format!("invalid version '{version}'")))
    }

    fn active_block(&mut self) -> Result<&mut Block> {
        self.pending_block
            .as_mut()
            .map(|(_, block)| block)
            .ok_or_else(|| SchemaError::grammar("field declared outside of a block"))
    }
}
