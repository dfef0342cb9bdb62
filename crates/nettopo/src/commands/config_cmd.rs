//! Config subcommand handlers.

use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Token")]
    token: String,
}

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(REDACTED.into());
        }
    }
    cfg
}

fn token_source(profile: &Profile) -> String {
    match (&profile.token_env, &profile.token) {
        (Some(env), _) => format!("${env}"),
        (None, Some(_)) => "plaintext".into(),
        (None, None) => "-".into(),
    }
}

fn save(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            server,
            name,
            token_env,
            set_default,
        } => {
            url::Url::parse(&server).map_err(|e| CliError::Validation {
                field: "server".into(),
                reason: format!("{e}: {server}"),
            })?;

            let mut cfg = config::load_config_or_default();
            let first = cfg.profiles.is_empty();
            let mut profile = Profile::new(server);
            profile.token_env = token_env;
            let replaced = cfg.profiles.insert(name.clone(), profile).is_some();

            if set_default || first {
                cfg.default_profile = Some(name.clone());
            }
            save(&cfg)?;

            let verb = if replaced { "updated" } else { "added" };
            eprintln!("✓ Profile '{name}' {verb}");
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("# unrenderable: {e}")),
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: nettopo config init --server <url>");
                return Ok(());
            }
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let profiles: Vec<(&String, &Profile)> = cfg.profiles.iter().collect();
            let out = output::render_list(
                global.output,
                &profiles,
                |(name, p)| ProfileRow {
                    marker: if name.as_str() == default { "*" } else { "" },
                    name: (*name).clone(),
                    server: p.server.clone(),
                    token: token_source(p),
                },
                |(name, _)| (*name).clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_plaintext_tokens_only() {
        let mut cfg = Config::default();
        let mut with_token = Profile::new("http://a:1");
        with_token.token = Some("s3cret".into());
        let mut with_env = Profile::new("http://b:1");
        with_env.token_env = Some("B_TOKEN".into());
        cfg.profiles.insert("a".into(), with_token);
        cfg.profiles.insert("b".into(), with_env);

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["a"].token.as_deref(), Some(REDACTED));
        assert_eq!(shown.profiles["b"].token_env.as_deref(), Some("B_TOKEN"));
        assert_eq!(token_source(&shown.profiles["b"]), "$B_TOKEN");
    }
}
