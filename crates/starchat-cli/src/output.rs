//! Output formatting and writing utilities
//!
//! Results are written as JSON, YAML or human-readable text. Decision-table
//! summaries get a tabular human rendering.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use starchat_core::DecisionTable;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Serializable overview of a decision table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub version: String,
    pub dialect: Option<String>,
    pub total: usize,
    pub with_keywords: usize,
    pub states: Vec<StateSummary>,
}

/// One row of a [`TableSummary`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub name: String,
    pub keywords: bool,
    pub queries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

impl TableSummary {
    /// Summarize `table`, optionally carrying each analyzer expression
    pub fn from_table(table: &DecisionTable, with_analyzers: bool) -> Self {
        let states: Vec<StateSummary> = table
            .states()
            .iter()
            .map(|state| StateSummary {
                name: state.name().to_string(),
                keywords: state.has_keywords(),
                queries: state.queries().len(),
                analyzer: with_analyzers.then(|| state.analyzer().to_string()),
            })
            .collect();

        Self {
            version: table.version().to_string(),
            dialect: table.dialect().map(|dialect| dialect.to_string()),
            total: states.len(),
            with_keywords: states.iter().filter(|state| state.keywords).count(),
            states,
        }
    }
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a decision-table summary
    fn format_table_summary(&self, summary: &TableSummary) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_table_summary(&self, summary: &TableSummary) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_table_summary_human(summary)),
            _ => self.format(summary),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Disable progress spinners
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut value_json = serde_json::to_value(value)?;
            redaction::redact_json_value(&mut value_json);
            trace!("Outputting data: {}", value_json);
        }

        let formatted = self.format.format(value)?;
        self.writeln(&formatted)
    }

    /// Write a decision-table summary
    pub fn table_summary(&mut self, summary: &TableSummary) -> Result<()> {
        let formatted = self.format.format_table_summary(summary)?;
        self.writeln(&formatted)
    }

    /// Create a spinner for server calls
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Spinner style shared by server commands
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}

fn format_table_summary_human(summary: &TableSummary) -> String {
    let mut output = String::new();
    let dialect = summary.dialect.as_deref().unwrap_or("unsupported");
    output.push_str(&format!(
        "Decision table (version {}, {} keys): {} states, {} with keywords\n\n",
        summary.version, dialect, summary.total, summary.with_keywords
    ));

    let with_analyzers = summary.states.iter().any(|state| state.analyzer.is_some());
    let mut headers = vec!["STATE", "KEYWORDS", "QUERIES"];
    if with_analyzers {
        headers.push("ANALYZER");
    }

    let rows = summary
        .states
        .iter()
        .map(|state| {
            let mut row = vec![
                state.name.clone(),
                if state.keywords { "yes" } else { "no" }.to_string(),
                state.queries.to_string(),
            ];
            if let Some(analyzer) = &state.analyzer {
                row.push(analyzer.clone());
            }
            row
        })
        .collect::<Vec<_>>();

    output.push_str(&render_table(&headers, &rows));
    output
}

/// Render rows as left-aligned columns
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_row(headers.to_vec())];
    lines.extend(
        rows.iter()
            .map(|row| render_row(row.iter().map(String::as_str).collect())),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests;
