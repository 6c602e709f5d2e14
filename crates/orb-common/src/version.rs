//! Schema versions stamped on catalog files.
//!
//! Versions travel as `"major.minor.patch"` strings so hand-written RON
//! catalogs stay readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Semantic version of a data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion {
    /// Breaking changes
    pub major: u16,
    /// Additive changes
    pub minor: u16,
    /// Fixes
    pub patch: u16,
}

impl SchemaVersion {
    /// Combat catalog format this build writes.
    pub const CATALOG: Self = Self::new(1, 0, 0);

    /// Create a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a reader at this version understands data written at
    /// `data_version`: same major, and no minor features it lacks.
    #[must_use]
    pub const fn can_read(&self, data_version: &Self) -> bool {
        self.major == data_version.major && data_version.minor <= self.minor
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A version string that is not `major.minor.patch`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema version '{0}', expected major.minor.patch")]
pub struct ParseVersionError(String);

impl FromStr for SchemaVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());
        let mut parts = s.trim().split('.').map(str::parse::<u16>);
        let mut next = || parts.next().and_then(Result::ok).ok_or_else(invalid);
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_read() {
        let reader = SchemaVersion::new(1, 2, 0);
        assert!(reader.can_read(&SchemaVersion::new(1, 0, 7)));
        assert!(reader.can_read(&SchemaVersion::new(1, 2, 3)));
        assert!(!reader.can_read(&SchemaVersion::new(1, 3, 0)));
        assert!(!reader.can_read(&SchemaVersion::new(2, 0, 0)));
    }

    #[test]
    fn test_parse() {
        assert_eq!("1.2.3".parse(), Ok(SchemaVersion::new(1, 2, 3)));
        assert!("1.2".parse::<SchemaVersion>().is_err());
        assert!("1.2.3.4".parse::<SchemaVersion>().is_err());
        assert!("one.two.three".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(SchemaVersion::new(1, 2, 3).to_string(), "1.2.3");
    }
}
