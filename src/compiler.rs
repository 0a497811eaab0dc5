//! Compilation entry point
//!
//! Ties the pieces together: load the source, run the parse state machine
//! over its events, then validate the completed registry. A registry is only
//! ever handed out after validation succeeded.

use std::io::Read;
use std::path::Path;

use crate::config::SchemaConfig;
use crate::error::{Result, SchemaError};
use crate::parser::SchemaParser;
use crate::registry::SchemaRegistry;
use crate::source::{self, SchemaOrigin};
use crate::validate::Validator;
use crate::value::{ColorParser, HexColorParser};
use crate::version::{DottedVersion, VersionScheme};

/// Compiles niflotoxml descriptions into [`SchemaRegistry`] values
///
/// The compiler holds no per-compilation state; each call builds a fresh
/// registry.
pub struct SchemaCompiler {
    versions: Box<dyn VersionScheme>,
    colors: Box<dyn ColorParser>,
    fallback_to_bundled: bool,
    strict_cycles: bool,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCompiler {
    pub fn new() -> Self {
        Self {
            versions: Box::new(DottedVersion),
            colors: Box::new(HexColorParser),
            fallback_to_bundled: true,
            strict_cycles: false,
        }
    }

    /// Apply the source and validation settings of a configuration
    pub fn from_config(config: &SchemaConfig) -> Self {
        Self::new()
            .fallback_to_bundled(config.source.fallback_to_bundled)
            .strict_cycles(config.validation.strict_cycles)
    }

    pub fn with_version_scheme(mut self, versions: impl VersionScheme + 'static) -> Self {
        self.versions = Box::new(versions);
        self
    }

    pub fn with_color_parser(mut self, colors: impl ColorParser + 'static) -> Self {
        self.colors = Box::new(colors);
        self
    }

    /// Use the bundled description when the requested file can't be read
    pub fn fallback_to_bundled(mut self, enabled: bool) -> Self {
        self.fallback_to_bundled = enabled;
        self
    }

    /// Reject field-group and ancestor cycles of any length
    pub fn strict_cycles(mut self, enabled: bool) -> Self {
        self.strict_cycles = enabled;
        self
    }

    /// Compile the description at `path`
    pub fn compile_path(&self, path: impl AsRef<Path>) -> Result<SchemaRegistry> {
        self.compile_path_with_origin(path).map(|(registry, _)| registry)
    }

    /// Compile the description at `path`, reporting where the text came from
    pub fn compile_path_with_origin(&self, path: impl AsRef<Path>) -> Result<(SchemaRegistry, SchemaOrigin)> {
        let (text, origin) = source::load(path.as_ref(), self.fallback_to_bundled)?;
        tracing::info!(origin = ?origin, "compiling schema");
        let registry = self.compile_str(&text)?;
        Ok((registry, origin))
    }

    /// Compile the bundled default description
    pub fn compile_bundled(&self) -> Result<SchemaRegistry> {
        let text = source::bundled_schema().ok_or_else(|| {
            SchemaError::declaration(format!("bundled {} is missing", source::BUNDLED_SCHEMA))
        })?;
        self.compile_str(text)
    }

    /// Compile a description read from `reader`
    pub fn compile_reader(&self, mut reader: impl Read) -> Result<SchemaRegistry> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.compile_str(&text)
    }

    /// Compile a description held in memory
    pub fn compile_str(&self, text: &str) -> Result<SchemaRegistry> {
        let mut parser = SchemaParser::new(self.versions.as_ref(), self.colors.as_ref());
        source::drive(text, &mut parser)?;
        let mut registry = parser
            .finish()
            .map_err(|err| err.at_line(source::end_line(text)))?;

        Validator::new(self.colors.as_ref())
            .strict_cycles(self.strict_cycles)
            .validate(&mut registry)?;

        let stats = registry.stats();
        tracing::info!(
            primitive_types = stats.primitive_types,
            field_groups = stats.field_groups,
            ancestors = stats.ancestors,
            record_types = stats.record_types,
            "schema compiled"
        );
        Ok(registry)
    }

    /// Recompile `registry` in place from `path`
    ///
    /// The registry is reset first. It receives the new entries only if the
    /// whole compilation succeeds and stays empty otherwise.
    pub fn compile_into(&self, registry: &mut SchemaRegistry, path: impl AsRef<Path>) -> Result<()> {
        registry.reset();
        *registry = self.compile_path(path)?;
        Ok(())
    }
}
