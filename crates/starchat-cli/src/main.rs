//! StarChat CLI - command-line tooling for StarChat decision tables
//!
//! Inspects, reduces and converts decision-table exports, and uploads them to
//! (or dumps them from) a running StarChat server.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // Logging settings come from the config file, so it is read before the
    // subscriber exists and skipped files are reported on stderr directly.
    let loaded = Config::load_with_file(cli.config.as_deref());
    let settings = loaded
        .as_ref()
        .map(|loaded| loaded.config.logging.clone())
        .unwrap_or_default();
    if let Ok(loaded) = &loaded {
        for skipped in &loaded.skipped {
            eprintln!("{}", skipped);
        }
    }
    if let Err(e) = init_logging(&cli, &settings) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match loaded {
        Ok(loaded) => run(cli, loaded.config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let use_color = cli.use_color() && config.output.color;
    if !config.output.color {
        control::set_override(false);
    }
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);
    if !config.output.progress {
        output = output.without_progress();
    }

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        lenient = cli.lenient,
        "Executing command"
    );

    let lenient = cli.lenient;
    match cli.command {
        Commands::Inspect(args) => handlers::handle_inspect(args, &config, lenient, &mut output).await,
        Commands::Filter(args) => handlers::handle_filter(args, &config, lenient, &mut output).await,
        Commands::Convert(args) => handlers::handle_convert(args, &config, lenient, &mut output).await,
        Commands::Analyzer(args) => handlers::handle_analyzer(args, &config, lenient, &mut output).await,
        Commands::Parents(args) => handlers::handle_parents(args, &config, lenient, &mut output).await,
        Commands::Upload(args) => handlers::handle_upload(args, &config, &mut output).await,
        Commands::Dump(args) => handlers::handle_dump(args, &config, &mut output).await,
        Commands::Count(args) => handlers::handle_count(args, &config, &mut output).await,
        Commands::Ask(args) => handlers::handle_ask(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, settings: &config::LoggingSettings) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_settings(settings, cli.verbosity_level());
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
