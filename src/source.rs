//! Schema sources and the XML event pump
//!
//! Reads markup with `quick-xml` and feeds element events to a
//! [`SchemaParser`], tagging every error with the line it occurred on.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, SchemaError};
use crate::parser::{Attributes, SchemaParser};

static BUNDLED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/res");

/// File name of the bundled default description
pub const BUNDLED_SCHEMA: &str = "niflotoxml.xml";

/// Where the text of a compilation came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    File(PathBuf),
    Bundled,
}

/// The default description shipped with the crate
pub fn bundled_schema() -> Option<&'static str> {
    BUNDLED.get_file(BUNDLED_SCHEMA).and_then(|f| f.contents_utf8())
}

/// Read the description at `path`, falling back to the bundled one if allowed
pub fn load(path: &Path, fallback_to_bundled: bool) -> Result<(Cow<'static, str>, SchemaOrigin)> {
    match fs::read_to_string(path) {
        Ok(text) => Ok((Cow::Owned(text), SchemaOrigin::File(path.to_path_buf()))),
        Err(source) => match bundled_schema().filter(|_| fallback_to_bundled) {
            Some(text) => {
                tracing::warn!(path = %path.display(), error = %source, "using bundled schema");
                Ok((Cow::Borrowed(text), SchemaOrigin::Bundled))
            }
            None => Err(SchemaError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            }),
        },
    }
}

/// Feed every element of `text` to `parser`
///
/// Stops at the first error, which carries the line it was raised on.
pub fn drive(text: &str, parser: &mut SchemaParser<'_>) -> Result<()> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    reader.expand_empty_elements(true);
    // Close tags are matched by the state machine.
    reader.check_end_names(false);

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let line = line_at(text, reader.buffer_position());
                return Err(SchemaError::Syntax(err.to_string()).at_line(line));
            }
        };
        let step = match event {
            Event::Start(start) => attributes(&start)
                .and_then(|attrs| parser.start_element(&element_name(start.name().as_ref()), &attrs)),
            Event::End(end) => parser.end_element(&element_name(end.name().as_ref())),
            Event::Eof => break,
            _ => Ok(()),
        };
        step.map_err(|err| err.at_line(line_at(text, reader.buffer_position())))?;
    }

    Ok(())
}

fn element_name(raw: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(raw)
}

fn attributes(start: &BytesStart<'_>) -> Result<Attributes> {
    let mut attrs = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| SchemaError::Syntax(err.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|err| SchemaError::Syntax(err.to_string()))?;
        attrs.insert(String::from_utf8_lossy(attr.key.as_ref()), value);
    }
    Ok(attrs)
}

/// Line the stream ends on, for errors found once every event was read
pub(crate) fn end_line(text: &str) -> usize {
    line_at(text, text.len())
}

/// 1-based line of byte offset `position`
fn line_at(text: &str, position: usize) -> usize {
    let end = position.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
