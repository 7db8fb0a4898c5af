//! StarChat version strings and major-version extraction

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Return the part of a dotted version string before the first `.`
///
/// No format validation happens here: a string without a separator is
/// returned whole.
pub fn major_version(version: &str) -> &str {
    version
        .split_once('.')
        .map_or(version, |(major, _)| major)
}

/// A StarChat version such as `"4.2"` or `"5.1"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Wrap a version string without validating it
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The full version string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The major-version identifier
    pub fn major(&self) -> &str {
        major_version(&self.0)
    }

    /// Resolve the schema dialect for this version
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_major(self.major())
            .ok_or_else(|| Error::unsupported_version(self.0.clone()))
    }

    /// Whether both versions share a major version
    pub fn same_major(&self, other: &VersionTag) -> bool {
        self.major() == other.major()
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VersionTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for VersionTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VersionTag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Default for VersionTag {
    fn default() -> Self {
        Self::new("4.2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("4.2"), "4");
        assert_eq!(major_version("5.1.3"), "5");
        assert_eq!(major_version("5"), "5");
        assert_eq!(major_version(""), "");
        assert_eq!(major_version(".1"), "");
    }

    #[test]
    fn test_dialect_resolution() {
        assert_eq!(VersionTag::new("4.2").dialect().unwrap(), Dialect::V4);
        assert_eq!(VersionTag::new("5.1").dialect().unwrap(), Dialect::V5);

        let err = VersionTag::new("6.0").dialect().unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { ref version } if version == "6.0"));
    }

    #[test]
    fn test_same_major() {
        assert!(VersionTag::new("5.1").same_major(&VersionTag::new("5")));
        assert!(!VersionTag::new("4.2").same_major(&VersionTag::new("5.1")));
    }

    #[test]
    fn test_serde_transparent() {
        let tag: VersionTag = serde_json::from_str("\"5.1\"").unwrap();
        assert_eq!(tag.as_str(), "5.1");
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"5.1\"");
    }
}
