//! Shared utilities for command handlers

use crate::cli::TableArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use serde_json::Value;
use starchat_core::http::StarChatClient;
use starchat_core::{DecisionTable, StrictMode, VersionTag};
use std::fs;
use std::path::Path;

/// Load a decision table from a JSON file
pub fn load_table(path: &Path, version: VersionTag, mode: StrictMode) -> Result<DecisionTable> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: "a JSON decision table".to_string(),
    })?;

    tracing::debug!(path = %path.display(), version = %version, mode = %mode, "Loading decision table");
    Ok(DecisionTable::from_document(document, version, mode)?)
}

/// Load the table named by `args`, filling defaults from the configuration
pub fn load_table_args(args: &TableArgs, config: &Config, lenient: bool) -> Result<DecisionTable> {
    load_table(
        &args.table,
        config.table_version(args.table_version.as_deref()),
        config.strict_mode(lenient),
    )
}

/// Write a document to `path`, as YAML for `.yaml`/`.yml` and JSON otherwise
pub fn write_document(path: &Path, document: &Value) -> Result<()> {
    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);

    let content = if is_yaml {
        serde_yaml::to_string(document)?
    } else {
        serde_json::to_string_pretty(document)?
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}

/// Client for the configured server, authenticated when a username is set
pub fn connect(config: &Config) -> Result<StarChatClient> {
    let mut client = StarChatClient::new(config.client_config())?;
    if let Some(user) = &config.server.username {
        client.authenticate(user.clone(), config.server.password.clone().unwrap_or_default());
    }
    Ok(client)
}
