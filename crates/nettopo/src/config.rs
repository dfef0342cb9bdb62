//! CLI configuration: thin wrapper around `nettopo_config`.
//!
//! Adds the resolution step that respects `GlobalOpts` flag overrides
//! (--file, --server, --token, --timeout) and decides whether a command
//! runs offline or against a backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use nettopo_core::model::TopologySnapshot;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use nettopo_config::{
    Config, Profile, ServerSettings, config_path, load_config_or_default, save_config,
    server_settings,
};

/// Where the topology lives for this invocation.
#[derive(Debug)]
pub enum Source {
    /// Offline: a topology JSON file, rewritten after edits.
    File(PathBuf),
    Server(ServerSettings),
}

/// Pick the topology source: `--file` wins, then `--server`, then the
/// selected profile.
pub fn resolve_source(global: &GlobalOpts, cfg: &Config) -> Result<Source, CliError> {
    if let Some(path) = &global.file {
        return Ok(Source::File(path.clone()));
    }

    let mut settings = if let Some(url) = &global.server {
        ServerSettings {
            server: url.parse().map_err(|_| CliError::Validation {
                field: "server".into(),
                reason: format!("invalid URL: {url}"),
            })?,
            token: None,
            timeout: Duration::from_secs(cfg.defaults.timeout),
            insecure: false,
        }
    } else {
        let Some((_, profile)) = active_profile(global, cfg)? else {
            return Err(CliError::NoSource {
                path: config_path().display().to_string(),
            });
        };
        server_settings(profile, &cfg.defaults)?
    };

    // Flag overrides
    if let Some(token) = &global.token {
        settings.token = Some(SecretString::from(token.clone()));
    }
    if let Some(secs) = global.timeout {
        settings.timeout = Duration::from_secs(secs);
    }
    settings.insecure |= global.insecure;

    Ok(Source::Server(settings))
}

/// Resolve the active profile from `--profile` or `default_profile`.
pub fn active_profile<'a>(
    global: &GlobalOpts,
    cfg: &'a Config,
) -> Result<Option<(&'a str, &'a Profile)>, CliError> {
    cfg.profile(global.profile.as_deref()).map_err(|e| match e {
        nettopo_config::ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
            name,
            available: available_profiles(cfg),
        },
        other => other.into(),
    })
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

// ── Topology files ──────────────────────────────────────────────────

/// Read a topology file. A missing file is an empty topology, so the
/// first `create` can start a new one.
pub fn read_topology(path: &Path) -> Result<TopologySnapshot, CliError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TopologySnapshot::default());
        }
        Err(e) => {
            return Err(CliError::TopologyFile {
                path: path.display().to_string(),
                source: Box::new(e),
            });
        }
    };
    serde_json::from_str(&text).map_err(|e| CliError::TopologyFile {
        path: path.display().to_string(),
        source: Box::new(e),
    })
}

pub fn write_topology(path: &Path, snapshot: &TopologySnapshot) -> Result<(), CliError> {
    let mut text = serde_json::to_string_pretty(snapshot)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["nettopo"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn with_profiles() -> Config {
        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), Profile::new("http://localhost:3000"));
        cfg.profiles
            .insert("lab".into(), Profile::new("http://lab.internal:8080"));
        cfg
    }

    #[test]
    fn file_flag_wins() {
        let source = resolve_source(&global(&["--file", "t.json"]), &with_profiles()).unwrap();
        assert!(matches!(source, Source::File(p) if p == Path::new("t.json")));
    }

    #[test]
    fn server_flag_overrides_profile() {
        let source = resolve_source(
            &global(&["--server", "http://other:1", "--timeout", "3"]),
            &with_profiles(),
        )
        .unwrap();
        let Source::Server(settings) = source else {
            panic!("expected server source");
        };
        assert_eq!(settings.server.as_str(), "http://other:1/");
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn named_profile_is_used() {
        let source = resolve_source(&global(&["--profile", "lab"]), &with_profiles()).unwrap();
        let Source::Server(settings) = source else {
            panic!("expected server source");
        };
        assert_eq!(settings.server.host_str(), Some("lab.internal"));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let err = resolve_source(&global(&["--profile", "nope"]), &with_profiles()).unwrap_err();
        match err {
            CliError::ProfileNotFound { available, .. } => assert_eq!(available, "default, lab"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn nothing_configured_is_no_source() {
        let err = resolve_source(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoSource { .. }));
    }

    #[test]
    fn missing_topology_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let snapshot = read_topology(&dir.path().join("absent.json")).unwrap();
        assert!(snapshot.is_empty());
    }
}
