//! Error types for the schema compiler

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::BlockKind;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema compilation errors
///
/// Every error is fatal to the compilation that raised it.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Grammar violation: {0}")]
    Grammar(String),

    #[error("Invalid declaration: {0}")]
    Declaration(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("{kind} {owner} refers to unknown type {type_ref}")]
    UnknownType {
        kind: BlockKind,
        owner: String,
        type_ref: String,
    },

    #[error("{kind} {owner} inherits unknown ancestor {ancestor}")]
    UnknownAncestor {
        kind: BlockKind,
        owner: String,
        ancestor: String,
    },

    #[error("Cyclic {kind} declaration: {}", .members.join(" -> "))]
    Cycle { kind: BlockKind, members: Vec<String> },

    /// Wraps anything raised while the event stream was being consumed.
    #[error("XML parse error (line {line}): {source}")]
    Parse {
        line: usize,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("Couldn't open xml description file {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`SchemaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown element, illegal nesting, nesting too deep, mismatched close tag
    Grammar,
    /// Missing required attribute, unknown internal kind, bad default value
    Declaration,
    /// Unknown type or ancestor reference
    Reference,
    /// Self-embedding field group, self-inheriting ancestor
    Cycle,
    /// Malformed markup
    Syntax,
    /// The source could not be read
    Io,
}

impl SchemaError {
    pub(crate) fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar(message.into())
    }

    pub(crate) fn declaration(message: impl Into<String>) -> Self {
        Self::Declaration(message.into())
    }

    /// Attach a source line to an error raised during stream parsing
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            located @ Self::Parse { .. } => located,
            other => Self::Parse {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Classify this error, looking through the line wrapper
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Grammar(_) => ErrorKind::Grammar,
            Self::Declaration(_) => ErrorKind::Declaration,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::UnknownType { .. } | Self::UnknownAncestor { .. } => ErrorKind::Reference,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::Parse { source, .. } => source.kind(),
            Self::SourceUnavailable { .. } | Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Source line for errors raised while parsing the stream
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
