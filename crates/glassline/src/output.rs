//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Lists use `tabled`,
//! structured formats use serde, plain emits one identifier or raw device
//! output per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use glassline_core::{ExecutionResult, Outcome, Query};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Query reports ────────────────────────────────────────────────────

/// One query and its result, as emitted by structured formats.
#[derive(Debug, Serialize)]
pub struct QueryReport<'a> {
    pub location: &'a str,
    pub query_type: String,
    pub target: &'a str,
    #[serde(flatten)]
    pub result: &'a ExecutionResult,
}

impl<'a> QueryReport<'a> {
    pub fn new(query: &'a Query, result: &'a ExecutionResult) -> Self {
        Self {
            location: query.location(),
            query_type: query.query_type().to_string(),
            target: query.target(),
            result,
        }
    }
}

/// Header line shown above device output in table mode.
fn heading(report: &QueryReport<'_>, color: bool) -> String {
    let title = format!(
        "{} {} {}",
        report.location, report.query_type, report.target
    );
    let status = format!("[{} {}]", report.result.outcome, report.result.status_code);
    if !color {
        return format!("{title} {status}");
    }
    let status = match report.result.outcome {
        Outcome::Succeeded => status.green().to_string(),
        Outcome::Rejected => status.yellow().to_string(),
        Outcome::Failed => status.red().to_string(),
    };
    format!("{} {status}", title.bold())
}

/// Render query reports in the chosen format.
pub fn render_reports(
    format: OutputFormat,
    reports: &[QueryReport<'_>],
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(reports
            .iter()
            .map(|r| format!("{}\n{}", heading(r, color), r.result.output))
            .collect::<Vec<_>>()
            .join("\n\n")),
        OutputFormat::Plain => Ok(reports
            .iter()
            .map(|r| r.result.output.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")),
        OutputFormat::Json => render_json(reports, false),
        OutputFormat::JsonCompact => render_json(reports, true),
        OutputFormat::Yaml => render_yaml(reports),
    }
}

/// Render a single report; structured formats emit an object, not a list.
pub fn render_report(
    format: OutputFormat,
    report: &QueryReport<'_>,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => render_json(report, false),
        OutputFormat::JsonCompact => render_json(report, true),
        OutputFormat::Yaml => render_yaml(report),
        OutputFormat::Table | OutputFormat::Plain => {
            render_reports(format, std::slice::from_ref(report), color)
        }
    }
}

// ── Lists ────────────────────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) -> Result<(), CliError> {
    if quiet || output.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
