mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nettopo_api::{RestClient, TransportConfig};
use nettopo_core::{Controller, ControllerConfig, MemoryPersistence};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::config::{ServerSettings, Source};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a topology source
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "nettopo", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let controller_config = cfg.controller_config();
            match config::resolve_source(&cli.global, &cfg)? {
                Source::File(path) => run_offline(cmd, &path, controller_config, &cli.global).await,
                Source::Server(settings) => {
                    run_online(cmd, &settings, controller_config, &cli.global).await
                }
            }
        }
    }
}

/// Run against a topology file, writing it back when the command changed it.
async fn run_offline(
    cmd: Command,
    path: &Path,
    controller_config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = config::read_topology(path)?;
    let controller = Controller::new(MemoryPersistence::with_snapshot(snapshot), controller_config);
    controller.load().await?;
    let before = controller.snapshot();

    // Replayed events describe someone else's edits; keep them unless asked.
    let keep = match &cmd {
        Command::Replay(args) => args.save,
        _ => true,
    };

    tracing::debug!(command = ?cmd, file = %path.display(), "dispatching offline");
    let result = commands::dispatch(cmd, &controller, global).await;

    let after = controller.snapshot();
    if keep && after != before {
        config::write_topology(path, &after)?;
        tracing::info!(file = %path.display(), "topology saved");
    }
    result
}

async fn run_online(
    cmd: Command,
    settings: &ServerSettings,
    controller_config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let transport = TransportConfig {
        timeout: settings.timeout,
        token: settings.token.clone(),
        accept_invalid_certs: settings.insecure,
    };
    let client = RestClient::new(settings.server.clone(), &transport).map_err(|e| {
        CliError::Backend {
            message: e.to_string(),
        }
    })?;
    let controller = Controller::new(client, controller_config);
    controller.load().await?;

    tracing::debug!(command = ?cmd, server = %settings.server, "dispatching");
    commands::dispatch(cmd, &controller, global).await
}
