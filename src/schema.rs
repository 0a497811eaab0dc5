//! Schema entities: primitive types, fields and blocks

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::{InternalKind, Value};
use crate::version::VersionRange;

/// A named basic type with a fixed internal representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveType {
    /// Lowercase identifier
    pub id: String,
    pub kind: InternalKind,
    /// Human-readable alias, lowercase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Declared default, converted to `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub versions: VersionRange,
}

impl PrimitiveType {
    pub fn new(id: impl Into<String>, kind: InternalKind) -> Self {
        Self {
            id: id.into(),
            kind,
            display: None,
            default: None,
            versions: VersionRange::UNBOUNDED,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// One named, typed slot of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Lowercase reference to a primitive type or field group
    pub type_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arr1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arr2: Option<String>,
    /// Condition expression, evaluated by the consumer only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(default)]
    pub versions: VersionRange,
    /// Raw `default` attribute, if the declaration carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_literal: Option<String>,
    /// Default after validation: the explicit one, else the primitive type's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            arg: None,
            arr1: None,
            arr2: None,
            cond: None,
            versions: VersionRange::UNBOUNDED,
            default_literal: None,
            default: None,
        }
    }

    pub fn with_cond(mut self, cond: impl Into<String>) -> Self {
        self.cond = Some(cond.into());
        self
    }

    pub fn with_versions(mut self, versions: VersionRange) -> Self {
        self.versions = versions;
        self
    }

    /// Present in every version and under every condition
    pub fn is_unconditional(&self) -> bool {
        !self.versions.is_bounded() && self.cond.is_none()
    }
}

/// Which registry mapping a block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// `compound`: reusable group of fields, no inheritance
    FieldGroup,
    /// `ancestor`: abstract record that may inherit other ancestors
    Ancestor,
    /// `niblock`: concrete record type
    RecordType,
}

impl BlockKind {
    /// The element name declaring this kind
    pub fn element_name(&self) -> &'static str {
        match self {
            BlockKind::FieldGroup => "compound",
            BlockKind::Ancestor => "ancestor",
            BlockKind::RecordType => "niblock",
        }
    }

    pub fn accepts_inherit(&self) -> bool {
        !matches!(self, BlockKind::FieldGroup)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// A field group, ancestor record or record type
///
/// Field order is layout order for the consumer and is kept as declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Identifier with its original case
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Block {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ancestors: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_ancestor(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// No field carries a version bound or a condition
    pub fn is_unconditional(&self) -> bool {
        self.fields.iter().all(Field::is_unconditional)
    }
}
