//! Shared helpers for command handlers.

use std::collections::HashMap;

use nettopo_core::{Controller, EntityId, Persistence, TopologyStore};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Display name for a node, falling back to its id when it is unknown.
pub fn node_label(store: &TopologyStore, id: &EntityId) -> String {
    store
        .node(id)
        .map_or_else(|| format!("{id} (missing)"), |n| n.name.clone())
}

pub fn group_label(store: &TopologyStore, id: &EntityId) -> String {
    store
        .group(id)
        .map_or_else(|| format!("{id} (missing)"), |g| g.name.clone())
}

/// Id → display name for every node, for rendering outside the store lock.
pub fn node_names(store: &TopologyStore) -> HashMap<EntityId, String> {
    store.nodes().map(|n| (n.id.clone(), n.name.clone())).collect()
}

pub fn group_names(store: &TopologyStore) -> HashMap<EntityId, String> {
    store.groups().map(|g| (g.id.clone(), g.name.clone())).collect()
}

pub fn lookup(names: &HashMap<EntityId, String>, id: &EntityId) -> String {
    names
        .get(id)
        .cloned()
        .unwrap_or_else(|| format!("{id} (missing)"))
}

/// Run a command whose only interesting output is "it worked".
pub async fn run_quiet<P: Persistence>(
    controller: &Controller<P>,
    cmd: nettopo_core::Command,
    global: &GlobalOpts,
    message: &str,
) -> Result<(), CliError> {
    controller.execute(cmd).await?;
    done(global, message);
    Ok(())
}

/// Confirmation line for table/plain output; structured formats stay
/// machine-readable and print nothing.
pub fn done(global: &GlobalOpts, message: &str) {
    if matches!(global.output, OutputFormat::Table | OutputFormat::Plain) {
        output::print_output(message, global.quiet);
    }
}

pub fn nothing_to_update(entity: &str) -> CliError {
    CliError::Validation {
        field: entity.into(),
        reason: "no changes given; pass at least one field flag".into(),
    }
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}
