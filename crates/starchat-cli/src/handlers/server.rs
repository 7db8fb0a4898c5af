//! Handlers for commands that talk to a StarChat server

use super::utils::{connect, write_document};
use crate::cli::{AskArgs, DumpArgs, IndexArgs, OutputFormat, UploadArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{render_table, OutputWriter};
use starchat_core::http::{StarChatClient, UploadOutcome};
use tracing::{info, instrument, warn};

async fn reachable_client(config: &Config, output: &OutputWriter) -> Result<StarChatClient> {
    let client = connect(config)?;
    let spinner = output.spinner(&format!("Contacting StarChat at {}...", client.address()));
    let alive = client.check_service().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if !alive {
        return Err(Error::ServiceUnavailable {
            address: client.address().to_string(),
        });
    }
    Ok(client)
}

/// Handle the upload command
#[instrument(skip_all, fields(index = %args.index.index, file = %args.table.display()))]
pub async fn handle_upload(
    args: UploadArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("upload", &args.index.index);
    if !args.table.exists() {
        return Err(Error::FileNotFound { path: args.table });
    }

    let client = reachable_client(config, output).await?;
    let index = args.index.index.as_str();

    let spinner = output.spinner(&format!("Uploading {} to {}...", args.table.display(), index));
    let outcome = client.load_decision_table_file(index, &args.table).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let outcome = outcome?;

    report_upload(&outcome, output)?;
    if !outcome.is_success() {
        let failed = match &outcome {
            UploadOutcome::PerState(states) => states
                .iter()
                .filter(|(_, loaded)| !**loaded)
                .map(|(name, _)| name.clone())
                .collect(),
            UploadOutcome::Bulk(_) => vec![args.table.display().to_string()],
        };
        output.error(&format!("✗ {} part(s) of the table were not loaded", failed.len()))?;
        return Err(Error::UploadFailed {
            index: index.to_string(),
            failed,
        });
    }
    output.success(&format!("✓ Decision table uploaded to {}", index))?;

    if args.count {
        report_count(&client, index, output).await?;
    }
    Ok(())
}

fn report_upload(outcome: &UploadOutcome, output: &mut OutputWriter) -> Result<()> {
    match outcome {
        UploadOutcome::PerState(states) => {
            if output.format() != OutputFormat::Human {
                return output.data(states);
            }
            let rows = states
                .iter()
                .map(|(name, loaded)| {
                    vec![name.clone(), if *loaded { "loaded" } else { "failed" }.to_string()]
                })
                .collect::<Vec<_>>();
            output.writeln(&render_table(&["STATE", "STATUS"], &rows))
        }
        UploadOutcome::Bulk(loaded) => {
            if output.format() != OutputFormat::Human {
                return output.data(&serde_json::json!({ "loaded": loaded }));
            }
            Ok(())
        }
    }
}

/// Handle the dump command
#[instrument(skip_all, fields(index = %args.index.index))]
pub async fn handle_dump(args: DumpArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let client = reachable_client(config, output).await?;
    let dump = client.decision_table_dump(&args.index.index).await?;

    match args.save_to {
        Some(path) => {
            write_document(&path, &dump)?;
            output.success(&format!("✓ Decision table saved to {}", path.display()))
        }
        None => output.data(&dump),
    }
}

/// Handle the count command
#[instrument(skip_all, fields(index = %args.index))]
pub async fn handle_count(args: IndexArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let client = reachable_client(config, output).await?;
    report_count(&client, &args.index, output).await
}

async fn report_count(client: &StarChatClient, index: &str, output: &mut OutputWriter) -> Result<()> {
    let spinner = output.spinner("Waiting for the analyzer...");
    let count = client.states_count(index).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match count? {
        Some(count) => {
            info!(count, "States loaded in the analyzer");
            if output.format() == OutputFormat::Human {
                output.writeln(&format!("{} states loaded in {}", count, index))
            } else {
                output.data(&serde_json::json!({ "index": index, "states": count }))
            }
        }
        None => {
            warn!("Analyzer did not answer in time");
            output.warning("StarChat did not report a state count; the analyzer may still be loading")
        }
    }
}

/// Handle the ask command
#[instrument(skip_all, fields(index = %args.index.index, conversation = %args.conversation_id))]
pub async fn handle_ask(args: AskArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    if args.text.trim().is_empty() {
        return Err(Error::invalid_args("the sentence to ask must not be empty"));
    }
    let client = reachable_client(config, output).await?;
    let answers = client
        .get_next_response(&args.index.index, &args.text, &args.conversation_id, args.threshold)
        .await?;

    let empty = answers.as_array().map_or(false, Vec::is_empty);
    if empty && output.format() == OutputFormat::Human {
        return output.info("No state matched");
    }
    output.data(&answers)
}
