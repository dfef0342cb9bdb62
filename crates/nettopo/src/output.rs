//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use nettopo_core::model::NodeStatus;
use nettopo_core::{ConnectionStatus, GroupStatus, UplinkState};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Status word, colored by severity when `color` is set.
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            color: should_color(mode),
        }
    }

    fn paint(&self, text: String, severity: Severity) -> String {
        if !self.color {
            return text;
        }
        match severity {
            Severity::Good => text.green().to_string(),
            Severity::Warn => text.yellow().to_string(),
            Severity::Bad => text.red().to_string(),
            Severity::Info => text.cyan().to_string(),
            Severity::Muted => text.dimmed().to_string(),
        }
    }

    pub fn node_status(&self, status: NodeStatus) -> String {
        let severity = match status {
            NodeStatus::Online => Severity::Good,
            NodeStatus::Degraded => Severity::Warn,
            NodeStatus::Offline => Severity::Bad,
            NodeStatus::Unknown => Severity::Muted,
        };
        self.paint(status.to_string(), severity)
    }

    pub fn connection_status(&self, status: &ConnectionStatus) -> String {
        let severity = match status {
            ConnectionStatus::Uplink {
                state: UplinkState::Active,
            } => Severity::Info,
            ConnectionStatus::Uplink {
                state: UplinkState::Standby,
            } => Severity::Muted,
            ConnectionStatus::Uplink {
                state: UplinkState::Offline,
            }
            | ConnectionStatus::Offline => Severity::Bad,
            ConnectionStatus::Degraded => Severity::Warn,
            ConnectionStatus::Normal { .. } => Severity::Good,
        };
        self.paint(status.to_string(), severity)
    }

    pub fn group_status(&self, status: GroupStatus) -> String {
        let severity = match status {
            GroupStatus::Internet => Severity::Info,
            GroupStatus::Local => Severity::Good,
            GroupStatus::Offline => Severity::Bad,
            GroupStatus::Unknown => Severity::Muted,
        };
        self.paint(status.to_string(), severity)
    }
}

#[derive(Clone, Copy)]
enum Severity {
    Good,
    Warn,
    Bad,
    Info,
    Muted,
}

// ── Render dispatchers ───────────────────────────────────────────────

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
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are a
/// key/value listing rather than a table.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}

/// Render a float coordinate without trailing noise.
pub fn coord(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
