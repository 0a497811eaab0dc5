//! Element vocabulary and nesting rules of a niflotoxml document

use std::fmt;

use crate::error::{Result, SchemaError};
use crate::schema::BlockKind;

/// Name of the document element
pub const ROOT_ELEMENT: &str = "niflotoxml";

/// Deepest nesting accepted before the document is rejected
pub const MAX_DEPTH: usize = 8;

/// The elements a schema document may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Root,
    Type,
    Compound,
    Ancestor,
    NiBlock,
    Add,
    Inherit,
}

impl Element {
    pub const ALL: [Element; 7] = [
        Element::Root,
        Element::Type,
        Element::Compound,
        Element::Ancestor,
        Element::NiBlock,
        Element::Add,
        Element::Inherit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Element::Root => ROOT_ELEMENT,
            Element::Type => "type",
            Element::Compound => "compound",
            Element::Ancestor => "ancestor",
            Element::NiBlock => "niblock",
            Element::Add => "add",
            Element::Inherit => "inherit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Element::ALL.into_iter().find(|e| e.name() == name)
    }

    /// The block kind this element declares, if any
    pub fn block_kind(&self) -> Option<BlockKind> {
        match self {
            Element::Compound => Some(BlockKind::FieldGroup),
            Element::Ancestor => Some(BlockKind::Ancestor),
            Element::NiBlock => Some(BlockKind::RecordType),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check that an element named `name` may open under `parent` at `depth`
///
/// `parent` is `None` at the document level.
pub fn check_open(name: &str, parent: Option<Element>, depth: usize) -> Result<Element> {
    if depth >= MAX_DEPTH {
        return Err(SchemaError::grammar("maximum nesting level exceeded"));
    }
    let element = Element::from_name(name)
        .ok_or_else(|| SchemaError::grammar(format!("unknown element '{name}'")))?;

    let Some(parent) = parent else {
        return match element {
            Element::Root => Ok(element),
            _ => Err(SchemaError::grammar(format!("this is not a {ROOT_ELEMENT} file"))),
        };
    };

    match (parent, element) {
        (Element::Root, Element::Type | Element::Compound | Element::Ancestor | Element::NiBlock) => {
            Ok(element)
        }
        (Element::Root, _) => Err(SchemaError::grammar(format!(
            "expected type, compound, ancestor or niblock, got {name} instead"
        ))),
        (Element::Type, _) => Err(SchemaError::grammar("types only contain a description")),
        (Element::Compound, Element::Add) => Ok(element),
        (Element::Compound, _) => Err(SchemaError::grammar(
            "only add tags allowed in compound declaration",
        )),
        (Element::Ancestor | Element::NiBlock, Element::Add | Element::Inherit) => Ok(element),
        (Element::Ancestor | Element::NiBlock, _) => Err(SchemaError::grammar(format!(
            "only add and inherit tags allowed in {parent} declaration"
        ))),
        (Element::Add | Element::Inherit, _) => Err(SchemaError::grammar(format!(
            "unhandled tag {name} in {parent}"
        ))),
    }
}
