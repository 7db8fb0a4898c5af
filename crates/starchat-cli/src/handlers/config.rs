//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
    }
}

fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    if args.path.exists() && !args.force {
        return output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            args.path.display()
        ));
    }

    Config::default().save(&args.path)?;
    output.success(&format!("✓ Created config at {}", args.path.display()))?;
    output.info("Edit it to point the CLI at your StarChat server.")
}

fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let shown = config.redacted();
    let content = match args.format {
        ConfigFormat::Toml => toml::to_string_pretty(&shown)?,
        ConfigFormat::Json => serde_json::to_string_pretty(&shown)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&shown)?,
    };
    output.writeln(content.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tempfile::TempDir;

    fn silent_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(std::io::sink()))
    }

    #[tokio::test]
    async fn test_init_writes_default_config_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".starchat.toml");
        let init = |force| ConfigArgs {
            action: ConfigAction::Init(ConfigInitArgs {
                path: path.clone(),
                force,
            }),
        };

        handle_config(init(false), &Config::default(), &mut silent_output())
            .await
            .unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, "[server]\nport = 1\n").unwrap();
        handle_config(init(false), &Config::default(), &mut silent_output())
            .await
            .unwrap();
        assert_eq!(Config::from_file(&path).unwrap().server.port, 1);

        handle_config(init(true), &Config::default(), &mut silent_output())
            .await
            .unwrap();
        assert_eq!(Config::from_file(&path).unwrap().server.port, 8888);
    }
}
