//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use nettopo_config::ConfigError;
use nettopo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const BACKEND: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Source ───────────────────────────────────────────────────────
    #[error("No topology source configured")]
    #[diagnostic(
        code(nettopo::no_source),
        help(
            "Pass --file <topology.json> to work offline, --server <url>,\n\
             or create a profile with: nettopo config init --server <url>\n\
             Config file: {path}"
        )
    )]
    NoSource { path: String },

    #[error("Could not read topology file {path}")]
    #[diagnostic(
        code(nettopo::topology_file),
        help("The file must be a JSON object with nodes, connections, groups and groupConnections arrays.")
    )]
    TopologyFile {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend request failed: {message}")]
    #[diagnostic(
        code(nettopo::backend),
        help("Local state was updated; re-run once the backend is reachable, or check -vv logs.")
    )]
    Backend { message: String },

    #[error("{failed} of {attempted} layout writes failed")]
    #[diagnostic(
        code(nettopo::layout_persist),
        help("The arrangement is committed locally; failed entities keep their old server position.")
    )]
    LayoutPersist { failed: usize, attempted: usize },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(nettopo::not_found),
        help("Run: nettopo {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nettopo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(nettopo::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: nettopo config init --name {name} --server <url>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(nettopo::config))]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    #[diagnostic(code(nettopo::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(nettopo::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(nettopo::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Backend { .. } | Self::LayoutPersist { .. } => exit_code::BACKEND,
            Self::NoSource { .. } | Self::Validation { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Persistence { message } => CliError::Backend { message },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::MalformedEvent { kind, message } => CliError::Validation {
                field: format!("{kind} event"),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

fn list_command(entity_type: &str) -> &'static str {
    match entity_type {
        "node" => "nodes list",
        "connection" => "connections list",
        _ => "groups list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_points_at_the_right_list() {
        let err = CliError::from(CoreError::not_found("connection", "c9"));
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "connections list"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn persistence_maps_to_backend_exit_code() {
        let err = CliError::from(CoreError::persistence("HTTP 500"));
        assert_eq!(err.exit_code(), exit_code::BACKEND);
    }
}
