//! Decision-table command handlers

use super::utils::{load_table, load_table_args, write_document};
use crate::cli::{ConvertArgs, FilterArgs, InspectArgs, OutputFormat, StateArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, TableSummary};
use serde::Serialize;
use serde_json::Value;
use starchat_core::VersionTag;
use std::path::Path;
use tracing::{info, instrument};

/// Handle the inspect command
#[instrument(skip_all, fields(table = %args.table.table.display()))]
pub async fn handle_inspect(
    args: InspectArgs,
    config: &Config,
    lenient: bool,
    output: &mut OutputWriter,
) -> Result<()> {
    let table = load_table_args(&args.table, config, lenient)?;
    let summary = TableSummary::from_table(&table, args.analyzers);
    output.table_summary(&summary)
}

/// Handle the filter command
#[instrument(skip_all, fields(table = %args.table.table.display()))]
pub async fn handle_filter(
    args: FilterArgs,
    config: &Config,
    lenient: bool,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("filter", &args.table.table.display().to_string());
    let table = load_table_args(&args.table, config, lenient)?;
    let modified = table.modified_decision_table()?;

    let kept = modified["hits"].as_array().map_or(0, Vec::len);
    info!(kept, dropped = table.len() - kept, "Filtered decision table");

    emit_document(
        &modified,
        args.save_to.as_deref(),
        &format!("Kept {} of {} states", kept, table.len()),
        output,
    )
}

/// Handle the convert command
#[instrument(skip_all, fields(table = %args.table.display(), from = %args.from, to = %args.to))]
pub async fn handle_convert(
    args: ConvertArgs,
    config: &Config,
    lenient: bool,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("convert", &format!("{} -> {}", args.from, args.to));
    let mode = config.strict_mode(lenient);
    let table = load_table(&args.table, VersionTag::new(args.from.as_str()), mode)?;
    let converted = table.to_version(args.to.as_str(), mode)?;

    emit_document(
        converted.raw_document(),
        args.save_to.as_deref(),
        &format!("Converted {} states from {} to {}", converted.len(), args.from, args.to),
        output,
    )
}

#[derive(Debug, Serialize)]
struct AnalyzerReport<'a> {
    state: &'a str,
    rewritten: bool,
    original: &'a str,
    modified: String,
}

/// Handle the analyzer command
pub async fn handle_analyzer(
    args: StateArgs,
    config: &Config,
    lenient: bool,
    output: &mut OutputWriter,
) -> Result<()> {
    let table = load_table_args(&args.table, config, lenient)?;
    let state = table.get_state(&args.state).ok_or_else(|| Error::StateNotFound {
        name: args.state.clone(),
    })?;
    let modified = table
        .modified_analyzer(&args.state)
        .unwrap_or_else(|| state.analyzer().to_string());

    let report = AnalyzerReport {
        state: state.name(),
        rewritten: state.has_keywords() && state.has_queries(),
        original: state.analyzer(),
        modified,
    };

    if output.format() != OutputFormat::Human {
        return output.data(&report);
    }
    output.writeln(&format!("original: {}", report.original))?;
    output.writeln(&format!("modified: {}", report.modified))?;
    if !report.rewritten {
        output.info("State needs both keywords and queries to be rewritten")?;
    }
    Ok(())
}

/// Handle the parents command
pub async fn handle_parents(
    args: StateArgs,
    config: &Config,
    lenient: bool,
    output: &mut OutputWriter,
) -> Result<()> {
    let table = load_table_args(&args.table, config, lenient)?;
    if table.get_state(&args.state).is_none() {
        return Err(Error::StateNotFound { name: args.state });
    }

    let parents = table.parents(&args.state);
    if output.format() != OutputFormat::Human {
        return output.data(&parents);
    }
    if parents.is_empty() {
        output.info(&format!("No state leads to '{}'", args.state))?;
    }
    for parent in parents {
        output.writeln(parent)?;
    }
    Ok(())
}

fn emit_document(
    document: &Value,
    save_to: Option<&Path>,
    summary: &str,
    output: &mut OutputWriter,
) -> Result<()> {
    match save_to {
        Some(path) => {
            write_document(path, document)?;
            output.success(&format!("✓ {}, saved to {}", summary, path.display()))
        }
        None => output.data(document),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TableArgs;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_v4_table(dir: &TempDir) -> std::path::PathBuf {
        let hit = |name: &str, analyzer: &str, queries: Vec<&str>, failure: &str| {
            json!({"document": {
                "state": name,
                "analyzer": analyzer,
                "queries": queries,
                "bubble": "",
                "action": "",
                "version": 0,
                "success_value": "",
                "failure_value": failure,
                "execution_order": 1,
                "action_input": {},
                "max_state_count": 0
            }})
        };
        let document = json!({
            "hits": [
                hit("greeting", r#"reinforcementConjunction(search("greeting"), keyword("hi"))"#, vec!["hello"], "fallback"),
                hit("fallback", "", vec![], ""),
            ],
            "total": 2,
            "max_score": 0.0
        });
        let path = dir.path().join("table.json");
        fs::write(&path, document.to_string()).unwrap();
        path
    }

    fn silent_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    fn table_args(path: &Path) -> TableArgs {
        TableArgs {
            table: path.to_path_buf(),
            table_version: Some("4.2".to_string()),
        }
    }

    #[tokio::test]
    async fn test_filter_saves_modified_table() {
        let dir = TempDir::new().unwrap();
        let path = write_v4_table(&dir);
        let save_to = dir.path().join("filtered.json");

        let args = FilterArgs {
            table: table_args(&path),
            save_to: Some(save_to.clone()),
        };
        handle_filter(args, &Config::default(), false, &mut silent_output())
            .await
            .unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(save_to).unwrap()).unwrap();
        assert_eq!(saved["total"], json!(1));
        assert_eq!(saved["hits"][0]["document"]["analyzer"], json!(r#"keyword("hi")"#));
        assert_eq!(saved["max_score"], json!(0.0));
    }

    #[tokio::test]
    async fn test_convert_saves_v5_table() {
        let dir = TempDir::new().unwrap();
        let path = write_v4_table(&dir);
        let save_to = dir.path().join("v5.json");

        let args = ConvertArgs {
            table: path,
            from: "4.2".to_string(),
            to: "5.1".to_string(),
            save_to: Some(save_to.clone()),
        };
        handle_convert(args, &Config::default(), false, &mut silent_output())
            .await
            .unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(save_to).unwrap()).unwrap();
        assert_eq!(saved["maxScore"], json!(0.0));
        assert_eq!(saved["hits"][0]["document"]["failureValue"], json!("fallback"));
    }

    #[tokio::test]
    async fn test_convert_to_unsupported_version() {
        let dir = TempDir::new().unwrap();
        let path = write_v4_table(&dir);
        let args = || ConvertArgs {
            table: path.clone(),
            from: "4.2".to_string(),
            to: "6.0".to_string(),
            save_to: None,
        };

        let strict = handle_convert(args(), &Config::default(), false, &mut silent_output()).await;
        assert!(matches!(
            strict,
            Err(Error::Core(starchat_core::Error::UnsupportedVersion { .. }))
        ));

        let lenient = handle_convert(args(), &Config::default(), true, &mut silent_output()).await;
        assert!(lenient.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_state() {
        let dir = TempDir::new().unwrap();
        let path = write_v4_table(&dir);
        let args = StateArgs {
            table: table_args(&path),
            state: "missing".to_string(),
        };
        let result = handle_parents(args, &Config::default(), false, &mut silent_output()).await;
        assert!(matches!(result, Err(Error::StateNotFound { .. })));
    }
}
