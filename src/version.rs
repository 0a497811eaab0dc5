//! Version ordinals and version ranges
//!
//! The compiler never compares versions itself. It only turns the `ver1`/`ver2`
//! attributes into ordinals through a [`VersionScheme`] and stores the bounds
//! for the consumer of the registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maps a version string to a totally ordered ordinal
pub trait VersionScheme: Send + Sync {
    /// Ordinal for `version`, or `None` if the string is not a version
    fn ordinal(&self, version: &str) -> Option<u32>;
}

/// Dotted versions packed one byte per component, most significant first
///
/// `"20.0.0.4"` becomes `0x14000004`, `"4.2"` becomes `0x04020000`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedVersion;

impl VersionScheme for DottedVersion {
    fn ordinal(&self, version: &str) -> Option<u32> {
        let version = version.trim();
        if version.is_empty() {
            return None;
        }

        let mut ordinal = 0u32;
        let mut count = 0;
        for part in version.split('.') {
            if count == 4 {
                return None;
            }
            let component: u8 = part.trim().parse().ok()?;
            ordinal |= u32::from(component) << (24 - 8 * count);
            count += 1;
        }
        Some(ordinal)
    }
}

/// Inclusive `[since, until]` bound over version ordinals, unbounded when unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<u32>,
}

impl VersionRange {
    /// A range without any bound
    pub const UNBOUNDED: Self = Self {
        since: None,
        until: None,
    };

    pub fn new(since: Option<u32>, until: Option<u32>) -> Self {
        Self { since, until }
    }

    /// Whether either end carries a bound
    pub fn is_bounded(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }

    /// Whether `ordinal` lies within the range
    ///
    /// The compiler only stores ranges. Readers of the described format call
    /// this with the ordinal of the file being read to decide whether a type
    /// or field is present.
    pub fn contains(&self, ordinal: u32) -> bool {
        self.since.map_or(true, |low| ordinal >= low) && self.until.map_or(true, |high| ordinal <= high)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.since, self.until) {
            (None, None) => write!(f, "*"),
            (Some(low), None) => write!(f, "{:#010x}..", low),
            (None, Some(high)) => write!(f, "..={:#010x}", high),
            (Some(low), Some(high)) => write!(f, "{:#010x}..={:#010x}", low, high),
        }
    }
}
