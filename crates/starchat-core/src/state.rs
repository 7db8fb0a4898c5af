//! A single decision-table state
//!
//! States are built in one shot from the `document` mapping of a table hit.
//! Five fields are spelled differently by the v4 and v5 dialects; once parsed
//! they are stored under one canonical name, so only [`State::populate_from`]
//! and [`State::to_document`] care about the dialect.

use crate::dialect::{Dialect, DialectField};
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Literal whose presence marks an analyzer as keyword-based
pub const KEYWORD_MARKER: &str = "keyword(\"";

/// One entry of a decision table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct State {
    name: String,
    analyzer: String,
    queries: Vec<String>,
    bubble: Value,
    action: Value,
    version: Value,
    success_value: Value,
    failure_value: Value,
    execution_order: Value,
    action_input: Value,
    max_state_count: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_data: Option<Value>,
}

impl State {
    /// Populate a state from a raw per-state document
    ///
    /// `dialect_major` selects which spelling of the dialect-dependent keys is
    /// read. Anything other than `"4"` or `"5"` is rejected before any field
    /// is read.
    pub fn populate_from(document: &Value, dialect_major: &str) -> Result<Self> {
        let dialect = Dialect::from_major(dialect_major)
            .ok_or_else(|| Error::unsupported_version(dialect_major))?;
        Self::from_document(document, dialect)
    }

    /// Populate a state from a raw per-state document in a known dialect
    pub fn from_document(document: &Value, dialect: Dialect) -> Result<Self> {
        let name = required(document, "state")?
            .as_str()
            .ok_or_else(|| Error::invalid_field("state", "a string"))?
            .to_string();
        let analyzer = required(document, "analyzer")?
            .as_str()
            .ok_or_else(|| Error::invalid_field("analyzer", "a string"))?
            .to_string();
        let queries = parse_queries(required(document, "queries")?)?;

        let dialect_field = |field: DialectField| required(document, dialect.key(field)).cloned();

        Ok(Self {
            name,
            analyzer,
            queries,
            bubble: required(document, "bubble")?.clone(),
            action: required(document, "action")?.clone(),
            version: required(document, "version")?.clone(),
            success_value: dialect_field(DialectField::SuccessValue)?,
            failure_value: dialect_field(DialectField::FailureValue)?,
            execution_order: dialect_field(DialectField::ExecutionOrder)?,
            action_input: dialect_field(DialectField::ActionInput)?,
            max_state_count: dialect_field(DialectField::MaxStateCount)?,
            state_data: document.get(dialect.key(DialectField::StateData)).cloned(),
        })
    }

    /// Serialize back into a per-state document using `dialect` key names
    pub fn to_document(&self, dialect: Dialect) -> Value {
        let mut map = Map::new();
        map.insert("state".to_string(), Value::String(self.name.clone()));
        map.insert("analyzer".to_string(), Value::String(self.analyzer.clone()));
        map.insert(
            "queries".to_string(),
            Value::Array(self.queries.iter().cloned().map(Value::String).collect()),
        );
        map.insert("bubble".to_string(), self.bubble.clone());
        map.insert("action".to_string(), self.action.clone());
        map.insert("version".to_string(), self.version.clone());

        let dialect_fields = [
            (DialectField::SuccessValue, &self.success_value),
            (DialectField::FailureValue, &self.failure_value),
            (DialectField::ExecutionOrder, &self.execution_order),
            (DialectField::ActionInput, &self.action_input),
            (DialectField::MaxStateCount, &self.max_state_count),
        ];
        for (field, value) in dialect_fields {
            map.insert(dialect.key(field).to_string(), value.clone());
        }
        if let Some(state_data) = &self.state_data {
            map.insert(dialect.key(DialectField::StateData).to_string(), state_data.clone());
        }

        Value::Object(map)
    }

    /// Whether the analyzer contains the literal `keyword("`
    pub fn has_keywords(&self) -> bool {
        self.analyzer.contains(KEYWORD_MARKER)
    }

    /// Whether the state has at least one query
    pub fn has_queries(&self) -> bool {
        !self.queries.is_empty()
    }

    /// Names of states this one can hand the conversation over to
    ///
    /// Collected from `success_value`, `failure_value` and the string values
    /// of an `action_input` mapping. Empty strings are skipped.
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = [&self.success_value, &self.failure_value]
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        if let Some(inputs) = self.action_input.as_object() {
            targets.extend(inputs.values().filter_map(Value::as_str));
        }
        targets.retain(|target| !target.is_empty());
        targets
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn analyzer(&self) -> &str {
        &self.analyzer
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn bubble(&self) -> &Value {
        &self.bubble
    }

    pub fn action(&self) -> &Value {
        &self.action
    }

    pub fn version(&self) -> &Value {
        &self.version
    }

    pub fn success_value(&self) -> &Value {
        &self.success_value
    }

    pub fn failure_value(&self) -> &Value {
        &self.failure_value
    }

    pub fn execution_order(&self) -> &Value {
        &self.execution_order
    }

    pub fn action_input(&self) -> &Value {
        &self.action_input
    }

    pub fn max_state_count(&self) -> &Value {
        &self.max_state_count
    }

    pub fn state_data(&self) -> Option<&Value> {
        self.state_data.as_ref()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: analyzer={:?}, queries={}",
            self.name,
            self.analyzer,
            self.queries.len()
        )
    }
}

fn required<'a>(document: &'a Value, key: &str) -> Result<&'a Value> {
    document
        .get(key)
        .ok_or_else(|| Error::missing_field(key, document))
}

fn parse_queries(value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::invalid_field("queries", "a list of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_field("queries", "a list of strings"))
        })
        .collect()
}
