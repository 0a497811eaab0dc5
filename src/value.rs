//! Internal kinds and default-value conversion

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

/// The fixed set of representation kinds a primitive type can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalKind {
    UInt8,
    UInt16,
    UInt32,
    Int8,
    Int16,
    Int32,
    Float,
    String,
    Color3f,
    Color4f,
}

impl InternalKind {
    /// Every kind, in declaration order
    pub const ALL: [InternalKind; 10] = [
        InternalKind::UInt8,
        InternalKind::UInt16,
        InternalKind::UInt32,
        InternalKind::Int8,
        InternalKind::Int16,
        InternalKind::Int32,
        InternalKind::Float,
        InternalKind::String,
        InternalKind::Color3f,
        InternalKind::Color4f,
    ];

    /// The tag used in the `type` attribute
    pub fn tag(&self) -> &'static str {
        match self {
            InternalKind::UInt8 => "uint8",
            InternalKind::UInt16 => "uint16",
            InternalKind::UInt32 => "uint32",
            InternalKind::Int8 => "int8",
            InternalKind::Int16 => "int16",
            InternalKind::Int32 => "int32",
            InternalKind::Float => "float",
            InternalKind::String => "string",
            InternalKind::Color3f => "color3f",
            InternalKind::Color4f => "color4f",
        }
    }

    /// Inclusive value range for the integer kinds
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            InternalKind::UInt8 => Some((0, u8::MAX.into())),
            InternalKind::UInt16 => Some((0, u16::MAX.into())),
            InternalKind::UInt32 => Some((0, u32::MAX.into())),
            InternalKind::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            InternalKind::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            InternalKind::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            _ => None,
        }
    }
}

impl fmt::Display for InternalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tag matching is case-sensitive
impl FromStr for InternalKind {
    type Err = SchemaError;

    fn from_str(tag: &str) -> Result<Self> {
        InternalKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| {
                SchemaError::declaration(format!(
                    "type declaration must name a valid internal type, got '{tag}'"
                ))
            })
    }
}

/// An RGBA color, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Parses color strings into RGBA values
pub trait ColorParser: Send + Sync {
    fn parse(&self, text: &str) -> Option<Color>;
}

/// Hex notation (`#rgb`, `#rrggbb`, `#aarrggbb`) plus a few named colors
#[derive(Debug, Clone, Copy, Default)]
pub struct HexColorParser;

const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("gray", Color::rgb(128, 128, 128)),
    ("transparent", Color { r: 0, g: 0, b: 0, a: 0 }),
];

impl ColorParser for HexColorParser {
    fn parse(&self, text: &str) -> Option<Color> {
        let text = text.trim();
        let Some(hex) = text.strip_prefix('#') else {
            return NAMED_COLORS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(text))
                .map(|(_, color)| *color);
        };
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let byte = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |at: usize| u8::from_str_radix(&hex[at..at + 1], 16).ok().map(|n| n * 17);
                Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }
}

/// A typed default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Color(Color),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Color(c) => write!(f, "#{:02x}{:02x}{:02x}{:02x}", c.a, c.r, c.g, c.b),
        }
    }
}

/// Convert a raw attribute string into a value of `kind`
///
/// An empty string declares no default and yields `Ok(None)`.
pub fn convert_value(raw: &str, kind: InternalKind, colors: &dyn ColorParser) -> Result<Option<Value>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let invalid = || SchemaError::declaration(format!("can't convert '{raw}' to {kind}"));
    let value = match kind {
        InternalKind::Float => Value::Float(raw.trim().parse().map_err(|_| invalid())?),
        InternalKind::String => Value::String(raw.to_string()),
        InternalKind::Color3f | InternalKind::Color4f => {
            Value::Color(colors.parse(raw).ok_or_else(invalid)?)
        }
        integer => {
            let parsed = parse_integer(raw.trim()).ok_or_else(invalid)?;
            let (low, high) = integer.integer_bounds().ok_or_else(invalid)?;
            if parsed < low || parsed > high {
                return Err(SchemaError::declaration(format!(
                    "value {raw} is out of range for {kind}"
                )));
            }
            Value::Int(parsed)
        }
    };
    Ok(Some(value))
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // The sign was consumed above.
    if digits.starts_with(['-', '+']) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(raw: &str, kind: InternalKind) -> Result<Option<Value>> {
        convert_value(raw, kind, &HexColorParser)
    }

    #[test]
    fn test_kind_tags_are_case_sensitive() {
        assert_eq!("uint16".parse::<InternalKind>().unwrap(), InternalKind::UInt16);
        assert_eq!("color4f".parse::<InternalKind>().unwrap(), InternalKind::Color4f);
        assert!("UInt16".parse::<InternalKind>().is_err());
        assert!("double".parse::<InternalKind>().is_err());
    }

    #[test]
    fn test_empty_declares_no_default() {
        for kind in InternalKind::ALL {
            assert_eq!(convert("", kind).unwrap(), None);
        }
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(convert("0", InternalKind::UInt16).unwrap(), Some(Value::Int(0)));
        assert_eq!(convert("0xFF", InternalKind::UInt8).unwrap(), Some(Value::Int(255)));
        assert_eq!(convert("-128", InternalKind::Int8).unwrap(), Some(Value::Int(-128)));
        assert!(convert("256", InternalKind::UInt8).is_err());
        assert!(convert("-1", InternalKind::UInt32).is_err());
        assert!(convert("ten", InternalKind::Int32).is_err());
    }

    #[test]
    fn test_float_and_string_conversion() {
        assert_eq!(convert("1.5", InternalKind::Float).unwrap(), Some(Value::Float(1.5)));
        assert!(convert("1,5", InternalKind::Float).is_err());
        assert_eq!(
            convert("Scene Root", InternalKind::String).unwrap(),
            Some(Value::String("Scene Root".into()))
        );
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(
            convert("#ff8000", InternalKind::Color3f).unwrap(),
            Some(Value::Color(Color::rgb(255, 128, 0)))
        );
        assert_eq!(
            convert("#80ff0000", InternalKind::Color4f).unwrap(),
            Some(Value::Color(Color { r: 255, g: 0, b: 0, a: 128 }))
        );
        assert_eq!(
            convert("#fff", InternalKind::Color3f).unwrap(),
            Some(Value::Color(Color::rgb(255, 255, 255)))
        );
        assert_eq!(
            convert("White", InternalKind::Color3f).unwrap(),
            Some(Value::Color(Color::rgb(255, 255, 255)))
        );
        assert!(convert("#12345", InternalKind::Color4f).is_err());
        assert!(convert("mauve-ish", InternalKind::Color4f).is_err());
    }

    #[test]
    fn test_repeated_sign_rejected() {
        assert!(convert("--5", InternalKind::Int32).is_err());
        assert!(convert("+-5", InternalKind::Int32).is_err());
        assert!(convert("-+5", InternalKind::Int16).is_err());
        assert_eq!(convert("+5", InternalKind::Int32).unwrap(), Some(Value::Int(5)));
        assert_eq!(convert("-0x10", InternalKind::Int32).unwrap(), Some(Value::Int(-16)));
        assert!(convert("0x-5", InternalKind::Int32).is_err());
    }
}
