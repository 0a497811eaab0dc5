//! niflotoxml Schema Compiler
//!
//! Reads a declarative XML description of a binary file format and compiles
//! it into a cross-referenced, validated [`SchemaRegistry`]. Readers and
//! editors of the described format use the registry to interpret files
//! without hard-coding any record layout.
//!
//! ## Features
//!
//! - **Strict Grammar**: A fixed element vocabulary with bounded nesting
//! - **Typed Defaults**: Declared defaults are converted to the primitive's kind
//! - **Referential Checks**: Every field type and inherited ancestor must exist
//! - **Unconditional Types**: Types present in every version are classified up front
//! - **Fail Fast**: The first violation aborts the compilation, with line context
//!
//! ## Document shape
//!
//! ```text
//! <niflotoxml>
//! ├── <type name=".." type="uint16" value=".." ver1=".." ver2=".."/>
//! ├── <compound name="..">
//! │   └── <add name=".." type=".." arg=".." arr1=".." arr2=".." cond=".."/>
//! ├── <ancestor name="..">
//! │   ├── <inherit name=".."/>
//! │   └── <add .../>
//! └── <niblock name="..">
//!     ├── <inherit name=".."/>
//!     └── <add .../>
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod source;
pub mod validate;
pub mod value;
pub mod version;

pub use compiler::SchemaCompiler;
pub use config::SchemaConfig;
pub use error::{ErrorKind, Result, SchemaError};
pub use registry::{RegistryStats, SchemaRegistry, TypeTarget};
pub use schema::{Block, BlockKind, Field, PrimitiveType};
pub use source::SchemaOrigin;
pub use value::{Color, ColorParser, HexColorParser, InternalKind, Value};
pub use version::{DottedVersion, VersionRange, VersionScheme};
