//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod arrange;
pub mod config_cmd;
pub mod connections;
pub mod groups;
pub mod nodes;
pub mod replay;
pub mod status;
pub mod util;

use nettopo_core::{Controller, Persistence};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a topology-bound command to the appropriate handler.
pub async fn dispatch<P: Persistence>(
    cmd: Command,
    controller: &Controller<P>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Nodes(args) => nodes::handle(controller, args, global).await,
        Command::Connections(args) => connections::handle(controller, args, global).await,
        Command::Groups(args) => groups::handle(controller, args, global).await,
        Command::Arrange(args) => arrange::handle(controller, args, global).await,
        Command::Status => status::handle(controller, global),
        Command::Replay(args) => replay::handle(controller, args, global).await,
        // Handled before a source is resolved
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions do not take a topology source".into(),
        )),
    }
}
