//! Schema dialects and the v4/v5 field-name table
//!
//! StarChat 4.x exports use snake_case keys while 5.x uses camelCase for the
//! same fields. [`DialectField::keys`] is the one place this correspondence lives;
//! state parsing, re-serialization and document translation all read it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field-naming convention of a StarChat API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// StarChat 4.x, snake_case keys
    V4,
    /// StarChat 5.x, camelCase keys
    V5,
}

/// Fields whose key differs between dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectField {
    MaxScore,
    StateData,
    SuccessValue,
    FailureValue,
    ExecutionOrder,
    ActionInput,
    MaxStateCount,
}

impl Dialect {
    /// Supported major-version identifiers
    pub const SUPPORTED_MAJORS: [&'static str; 2] = ["4", "5"];

    /// Dialect for a major-version identifier, `None` if unsupported
    pub fn from_major(major: &str) -> Option<Self> {
        match major {
            "4" => Some(Dialect::V4),
            "5" => Some(Dialect::V5),
            _ => None,
        }
    }

    /// The major-version identifier of this dialect
    pub fn major(self) -> &'static str {
        match self {
            Dialect::V4 => "4",
            Dialect::V5 => "5",
        }
    }

    /// Document key used for `field` in this dialect
    pub fn key(self, field: DialectField) -> &'static str {
        let (v4, v5) = field.keys();
        match self {
            Dialect::V4 => v4,
            Dialect::V5 => v5,
        }
    }

    /// Counterpart of `key` when converting a document into this dialect
    ///
    /// Returns `None` for keys that are not part of the field table or that
    /// already use this dialect's spelling.
    pub fn rename_into(self, key: &str) -> Option<&'static str> {
        DialectField::ALL.iter().find_map(|field| {
            let (v4, v5) = field.keys();
            match self {
                Dialect::V5 if v4 == key => Some(v5),
                Dialect::V4 if v5 == key => Some(v4),
                _ => None,
            }
        })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::V4 => write!(f, "v4"),
            Dialect::V5 => write!(f, "v5"),
        }
    }
}

impl DialectField {
    /// Every field with a dialect-specific key
    pub const ALL: [DialectField; 7] = [
        DialectField::MaxScore,
        DialectField::StateData,
        DialectField::SuccessValue,
        DialectField::FailureValue,
        DialectField::ExecutionOrder,
        DialectField::ActionInput,
        DialectField::MaxStateCount,
    ];

    /// The five per-state fields every state document must carry
    pub const REQUIRED_STATE_FIELDS: [DialectField; 5] = [
        DialectField::SuccessValue,
        DialectField::FailureValue,
        DialectField::ExecutionOrder,
        DialectField::ActionInput,
        DialectField::MaxStateCount,
    ];

    /// `(v4 key, v5 key)`
    pub const fn keys(self) -> (&'static str, &'static str) {
        match self {
            DialectField::MaxScore => ("max_score", "maxScore"),
            DialectField::StateData => ("state_data", "stateData"),
            DialectField::SuccessValue => ("success_value", "successValue"),
            DialectField::FailureValue => ("failure_value", "failureValue"),
            DialectField::ExecutionOrder => ("execution_order", "executionOrder"),
            DialectField::ActionInput => ("action_input", "actionInput"),
            DialectField::MaxStateCount => ("max_state_count", "maxStateCount"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major() {
        assert_eq!(Dialect::from_major("4"), Some(Dialect::V4));
        assert_eq!(Dialect::from_major("5"), Some(Dialect::V5));
        assert_eq!(Dialect::from_major("6"), None);
        assert_eq!(Dialect::from_major("4.2"), None);
    }

    #[test]
    fn test_keys_per_dialect() {
        assert_eq!(Dialect::V4.key(DialectField::SuccessValue), "success_value");
        assert_eq!(Dialect::V5.key(DialectField::SuccessValue), "successValue");
        assert_eq!(Dialect::V4.key(DialectField::MaxScore), "max_score");
        assert_eq!(Dialect::V5.key(DialectField::MaxStateCount), "maxStateCount");
    }

    #[test]
    fn test_every_field_has_distinct_keys() {
        let mut seen = std::collections::HashSet::new();
        for field in DialectField::ALL {
            let (v4, v5) = field.keys();
            assert!(!v4.is_empty() && !v5.is_empty());
            assert_ne!(v4, v5);
            assert!(seen.insert(v4) && seen.insert(v5));
            assert_eq!(Dialect::V5.rename_into(v4), Some(v5));
            assert_eq!(Dialect::V4.rename_into(v5), Some(v4));
        }
        for field in DialectField::REQUIRED_STATE_FIELDS {
            assert!(DialectField::ALL.contains(&field));
        }
    }

    #[test]
    fn test_rename_into() {
        assert_eq!(Dialect::V5.rename_into("action_input"), Some("actionInput"));
        assert_eq!(Dialect::V4.rename_into("actionInput"), Some("action_input"));
        assert_eq!(Dialect::V5.rename_into("actionInput"), None);
        assert_eq!(Dialect::V4.rename_into("analyzer"), None);
    }
}
