//! Decision tables exported from StarChat
//!
//! A table document looks like
//! `{"hits": [{"document": {...state...}}], "total": n, "max_score": x}`
//! (`maxScore` for 5.x). [`DecisionTable`] keeps the raw document untouched
//! and parses one [`State`] per hit, in hit order. Everything that produces a
//! different table returns a new value.

pub mod analyzer;

use crate::dialect::{Dialect, DialectField};
use crate::error::{Error, Result, StrictMode};
use crate::state::State;
use crate::translate::rename_keys;
use crate::version::VersionTag;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

/// A parsed StarChat decision table
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTable {
    raw_document: Value,
    states: Vec<State>,
    version: VersionTag,
    /// `None` only when built in [`StrictMode::Warn`] from an unsupported version
    dialect: Option<Dialect>,
}

impl DecisionTable {
    /// Build a table from a decision-table document
    ///
    /// Construction is all-or-nothing: a hit without `document`, or a state
    /// missing one of its required keys, fails the whole table.
    ///
    /// With an unsupported major version, [`StrictMode::Strict`] returns
    /// [`Error::UnsupportedVersion`]. [`StrictMode::Warn`] logs the problem and
    /// builds a table whose states are all empty, since no dialect can be used
    /// to read them.
    pub fn from_document(
        document: Value,
        version: impl Into<VersionTag>,
        mode: StrictMode,
    ) -> Result<Self> {
        let version = version.into();
        let dialect = match version.dialect() {
            Ok(dialect) => Some(dialect),
            Err(err) if mode == StrictMode::Warn => {
                log::error!("Unsupported version {}: {}", version, err);
                None
            }
            Err(err) => return Err(err),
        };

        let states = hits(&document)?
            .iter()
            .enumerate()
            .map(|(index, hit)| {
                let state_document = hit
                    .get("document")
                    .ok_or_else(|| Error::missing_field(format!("hits[{index}].document"), hit))?;
                match dialect {
                    Some(dialect) => State::from_document(state_document, dialect),
                    None => empty_state(state_document, version.major()),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Loaded decision table with {} states (version {})",
            states.len(),
            version
        );

        Ok(Self {
            raw_document: document,
            states,
            version,
            dialect,
        })
    }

    /// Parse a table from JSON text
    pub fn from_json_str(
        json: &str,
        version: impl Into<VersionTag>,
        mode: StrictMode,
    ) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_document(document, version, mode)
    }

    /// Load a table from a JSON file
    pub fn from_path(
        path: impl AsRef<Path>,
        version: impl Into<VersionTag>,
        mode: StrictMode,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, version, mode)
    }

    /// The document this table was built from
    pub fn raw_document(&self) -> &Value {
        &self.raw_document
    }

    /// Consume the table and return its document
    pub fn into_raw_document(self) -> Value {
        self.raw_document
    }

    /// States in hit order
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State names in hit order
    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().map(State::name).collect()
    }

    /// First state called `name`
    pub fn get_state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|state| state.name() == name)
    }

    /// Analyzer expression per state name
    ///
    /// With duplicate names the later state wins.
    pub fn analyzers(&self) -> BTreeMap<&str, &str> {
        self.states
            .iter()
            .map(|state| (state.name(), state.analyzer()))
            .collect()
    }

    /// Queries per state name
    ///
    /// With duplicate names the later state wins.
    pub fn queries(&self) -> BTreeMap<&str, &[String]> {
        self.states
            .iter()
            .map(|state| (state.name(), state.queries()))
            .collect()
    }

    /// [`State::has_keywords`] for every state, in table order
    pub fn states_with_keywords(&self) -> Vec<bool> {
        self.states.iter().map(State::has_keywords).collect()
    }

    /// [`State::has_queries`] for every state, in table order
    pub fn states_with_queries(&self) -> Vec<bool> {
        self.states.iter().map(State::has_queries).collect()
    }

    /// Names of states that can lead to `name`, in table order
    pub fn parents(&self, name: &str) -> Vec<&str> {
        self.states
            .iter()
            .filter(|state| state.targets().contains(&name))
            .map(State::name)
            .collect()
    }

    /// Analyzer of `state_name` with its own search clause removed
    ///
    /// Only states with both keywords and queries are rewritten; any other
    /// state gets its analyzer back unchanged. `None` means no such state.
    pub fn modified_analyzer(&self, state_name: &str) -> Option<String> {
        self.get_state(state_name).map(rewrite_analyzer)
    }

    /// Build the reduced table document
    ///
    /// States without keywords are dropped. Kept hits are deep copies whose
    /// `queries` are emptied and whose `analyzer` is rewritten by
    /// [`Self::modified_analyzer`]. The result carries `hits`, `total` and the
    /// dialect's max-score key copied from this table's document.
    pub fn modified_decision_table(&self) -> Result<Value> {
        log::info!("Building modified decision table...");
        let hits = hits(&self.raw_document)?;

        let mut kept = Vec::new();
        for (index, state) in self.states.iter().enumerate() {
            if !state.has_keywords() {
                log::debug!(
                    "Skipping state \"{}\" in decision table (no analyzer expression).",
                    state.name()
                );
                continue;
            }

            let mut hit = hits.get(index).cloned().unwrap_or(Value::Null);
            let found = hit
                .get("document")
                .and_then(|document| document.get("state"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if found != state.name() {
                return Err(Error::InternalConsistency {
                    index,
                    expected: state.name().to_string(),
                    found: found.to_string(),
                });
            }

            let analyzer = rewrite_analyzer(state);
            if let Some(document) = hit.get_mut("document").and_then(Value::as_object_mut) {
                document.insert("queries".to_string(), Value::Array(Vec::new()));
                document.insert("analyzer".to_string(), Value::String(analyzer));
            }
            kept.push(hit);
        }

        let mut table = Map::new();
        table.insert("total".to_string(), Value::from(kept.len()));
        table.insert("hits".to_string(), Value::Array(kept));
        if let Some(dialect) = self.dialect {
            let key = dialect.key(DialectField::MaxScore);
            let max_score = self
                .raw_document
                .get(key)
                .ok_or_else(|| Error::missing_field(key, &self.raw_document))?;
            table.insert(key.to_string(), max_score.clone());
        }

        Ok(Value::Object(table))
    }

    /// Translate the table for another StarChat version
    ///
    /// A target with this table's major version borrows `self` unchanged.
    /// Otherwise every key of the field table is renamed at every depth of a
    /// copy of the document, and the copy is loaded as a new table tagged with
    /// `target`.
    ///
    /// An unsupported target fails in [`StrictMode::Strict`]. In
    /// [`StrictMode::Warn`] it is logged and the document is converted towards
    /// the 4.x spelling.
    pub fn to_version(
        &self,
        target: impl Into<VersionTag>,
        mode: StrictMode,
    ) -> Result<Cow<'_, DecisionTable>> {
        let target = target.into();
        let target_dialect = match target.dialect() {
            Ok(dialect) => Some(dialect),
            Err(err) if mode == StrictMode::Warn => {
                log::error!(
                    "Version {} not supported. Accepted output versions are 4.x and 5.x: {}",
                    target,
                    err
                );
                None
            }
            Err(err) => return Err(err),
        };

        if self.version.same_major(&target) {
            return Ok(Cow::Borrowed(self));
        }

        let into = target_dialect.unwrap_or(Dialect::V4);
        log::info!(
            "Converting decision table from version {} to {} ({} keys)",
            self.version,
            target,
            into
        );
        let document = rename_keys(&self.raw_document, into);
        Self::from_document(document, target, mode).map(Cow::Owned)
    }
}

fn hits(document: &Value) -> Result<&Vec<Value>> {
    document
        .get("hits")
        .ok_or_else(|| Error::missing_field("hits", document))?
        .as_array()
        .ok_or_else(|| Error::invalid_field("hits", "a list"))
}

fn rewrite_analyzer(state: &State) -> String {
    if state.has_keywords() && state.has_queries() {
        analyzer::strip_search_clause(state.analyzer(), state.name())
    } else {
        log::debug!(
            "State \"{}\" needs both analyzer and queries to be modified. Returning original analyzer expression.",
            state.name()
        );
        state.analyzer().to_string()
    }
}

fn empty_state(document: &Value, major: &str) -> Result<State> {
    match State::populate_from(document, major) {
        Err(err @ Error::UnsupportedVersion { .. }) => {
            log::error!("Leaving state empty: {}", err);
            Ok(State::default())
        }
        other => other,
    }
}
