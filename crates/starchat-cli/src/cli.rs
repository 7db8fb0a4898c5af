//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// StarChat CLI - inspect, reduce, convert and upload decision tables
///
/// Works on decision-table exports of StarChat 4.x and 5.x and talks to a
/// running StarChat server for uploads, dumps and state counts.
#[derive(Parser, Debug)]
#[command(
    name = "starchat",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "STARCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log unsupported versions instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the states of a decision table with their keyword/query flags
    Inspect(InspectArgs),

    /// Keep keyword states only, with queries emptied and analyzers rewritten
    Filter(FilterArgs),

    /// Translate a decision table to another StarChat version
    Convert(ConvertArgs),

    /// Show the original and rewritten analyzer of one state
    Analyzer(StateArgs),

    /// List the states that lead to a given state
    Parents(StateArgs),

    /// Upload a decision table to a StarChat index
    Upload(UploadArgs),

    /// Download the decision table of a StarChat index
    Dump(DumpArgs),

    /// Number of states StarChat has loaded into its analyzer
    Count(IndexArgs),

    /// Ask the bot for its answer to a sentence
    Ask(AskArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Decision-table file and the version it was exported from
#[derive(Parser, Debug, Clone)]
pub struct TableArgs {
    /// Path to the decision-table JSON file
    #[arg(value_name = "TABLE")]
    pub table: PathBuf,

    /// StarChat version of the table (defaults to `tables.default_version`)
    #[arg(long = "table-version", value_name = "VERSION")]
    pub table_version: Option<String>,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Also print every analyzer expression
    #[arg(long)]
    pub analyzers: bool,
}

/// Arguments for the filter command
#[derive(Parser, Debug)]
pub struct FilterArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the convert command
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Path to the decision-table JSON file
    #[arg(value_name = "TABLE")]
    pub table: PathBuf,

    /// Version the table was exported from
    #[arg(long)]
    pub from: String,

    /// Version to translate to
    #[arg(long)]
    pub to: String,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for commands about one state
#[derive(Parser, Debug)]
pub struct StateArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// State name
    #[arg(short, long)]
    pub state: String,
}

/// StarChat index to talk to
#[derive(Parser, Debug)]
pub struct IndexArgs {
    /// Index name, e.g. `index_getjenny_english_0`
    #[arg(short, long)]
    pub index: String,
}

/// Arguments for the upload command
#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// Path to the decision-table JSON file
    #[arg(value_name = "TABLE")]
    pub table: PathBuf,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Wait for the analyzer and report how many states it loaded
    #[arg(long)]
    pub count: bool,
}

/// Arguments for the dump command
#[derive(Parser, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the ask command
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Sentence sent to the bot
    pub text: String,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Conversation the sentence belongs to
    #[arg(long, default_value = "starchat-cli")]
    pub conversation_id: String,

    /// Minimum score of the answers
    #[arg(long, default_value = "0.0")]
    pub threshold: f64,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the configuration in use
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// File to create (format follows the extension)
    #[arg(long, default_value = ".starchat.toml")]
    pub path: PathBuf,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["starchat", "-vv", "inspect", "table.json"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["starchat", "--quiet", "inspect", "table.json"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_convert_arguments() {
        let cli = Cli::parse_from([
            "starchat", "convert", "table.json", "--from", "4.2", "--to", "5.1", "--save-to", "out.json",
        ]);
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.from, "4.2");
                assert_eq!(args.to, "5.1");
                assert_eq!(args.save_to, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_lenient_flag() {
        let cli = Cli::parse_from([
            "starchat", "analyzer", "table.json", "--state", "greeting", "--lenient",
            "--table-version", "3.0",
        ]);
        assert!(cli.lenient);
        match cli.command {
            Commands::Analyzer(args) => {
                assert_eq!(args.state, "greeting");
                assert_eq!(args.table.table_version.as_deref(), Some("3.0"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_upload_requires_index() {
        assert!(Cli::try_parse_from(["starchat", "upload", "table.json"]).is_err());
        let cli = Cli::parse_from(["starchat", "upload", "table.json", "-i", "index_0", "--count"]);
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.index.index, "index_0");
                assert!(args.count);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
