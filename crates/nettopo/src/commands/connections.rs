//! Connection command handlers.

use serde::Serialize;
use tabled::Tabled;

use nettopo_core::{
    Command as CoreCommand, CommandResult, Connection, ConnectionFilter, ConnectionPatch,
    ConnectionStatus, Controller, CoreError, CreateConnectionRequest, EntityId, Persistence,
};

use crate::cli::{ConnectionsArgs, ConnectionsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Bandwidth")]
    bandwidth: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Active")]
    active: String,
}

/// A connection plus the status derived for it at read time.
#[derive(Serialize)]
struct Listed {
    #[serde(flatten)]
    connection: Connection,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ConnectionStatus>,
}

fn detail(conn: &Connection, from: &str, to: &str, status: Option<&ConnectionStatus>) -> String {
    [
        format!("ID:        {}", conn.id),
        format!("From:      {from} ({})", conn.source_node_id),
        format!("To:        {to} ({})", conn.target_node_id),
        format!("Label:     {}", util::or_dash(conn.label.as_deref())),
        format!("Bandwidth: {}", util::or_dash(conn.bandwidth.as_deref())),
        format!("Color:     {}", util::or_dash(conn.color.as_deref())),
        format!("Animated:  {}", conn.animated),
        format!("Active:    {}", conn.is_active_source),
        format!(
            "Status:    {}",
            status.map_or_else(|| "-".into(), ToString::to_string)
        ),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<P: Persistence>(
    controller: &Controller<P>,
    args: ConnectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConnectionsCommand::List { from, to, active } => {
            let mut filters = Vec::new();
            if let Some(id) = from {
                filters.push(ConnectionFilter::From(EntityId::from(id)));
            }
            if let Some(id) = to {
                filters.push(ConnectionFilter::To(EntityId::from(id)));
            }

            let (listed, names) = controller.read(|store| {
                let listed: Vec<Listed> = store
                    .connections()
                    .filter(|c| filters.iter().all(|f| f.matches(c)))
                    .filter(|c| !active || store.is_active_uplink(c))
                    .map(|c| Listed {
                        connection: c.clone(),
                        status: store.connection_status(&c.id),
                    })
                    .collect();
                (listed, util::node_names(store))
            });

            let painter = Painter::new(global.color);
            let out = output::render_list(
                global.output,
                &listed,
                |l| {
                    let c = &l.connection;
                    ConnectionRow {
                        id: c.id.to_string(),
                        from: util::lookup(&names, &c.source_node_id),
                        to: util::lookup(&names, &c.target_node_id),
                        label: util::or_dash(c.label.as_deref()),
                        bandwidth: util::or_dash(c.bandwidth.as_deref()),
                        status: l
                            .status
                            .as_ref()
                            .map_or_else(|| "-".into(), |s| painter.connection_status(s)),
                        active: if c.is_active_source { "yes" } else { "" }.into(),
                    }
                },
                |l| l.connection.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Create {
            source,
            target,
            label,
            bandwidth,
            color,
            animated,
        } => {
            let mut req = CreateConnectionRequest::new(source, target);
            req.label = label;
            req.bandwidth = bandwidth;
            req.color = color;
            req.animated = animated;
            let result = controller.execute(CoreCommand::CreateConnection(req)).await?;
            print_connection(controller, global, &result)
        }

        ConnectionsCommand::Update {
            id,
            label,
            bandwidth,
            color,
            animated,
        } => {
            let patch = ConnectionPatch {
                label: label.map(Some),
                bandwidth: bandwidth.map(Some),
                color: color.map(Some),
                animated,
            };
            if patch == ConnectionPatch::default() {
                return Err(util::nothing_to_update("connection"));
            }
            let result = controller
                .execute(CoreCommand::UpdateConnection {
                    id: EntityId::from(id),
                    patch,
                })
                .await?;
            print_connection(controller, global, &result)
        }

        ConnectionsCommand::Delete { id } => {
            let message = format!("Deleted connection {id}");
            let cmd = CoreCommand::DeleteConnection {
                id: EntityId::from(id),
            };
            util::run_quiet(controller, cmd, global, &message).await
        }

        ConnectionsCommand::Activate { id } => {
            let connection_id = EntityId::from(id);
            let is_uplink = controller
                .read(|store| {
                    store
                        .connection(&connection_id)
                        .map(|c| store.node(&c.source_node_id).is_some_and(|n| n.is_internet()))
                })
                .ok_or_else(|| CoreError::not_found("connection", &connection_id))?;
            if !is_uplink {
                return Err(CliError::Validation {
                    field: "connection".into(),
                    reason: format!("{connection_id} is not sourced at an INTERNET node"),
                });
            }
            let message = format!("Connection {connection_id} is now the active uplink");
            let cmd = CoreCommand::SetActiveSource { connection_id };
            util::run_quiet(controller, cmd, global, &message).await
        }
    }
}

fn print_connection<P: Persistence>(
    controller: &Controller<P>,
    global: &GlobalOpts,
    result: &CommandResult,
) -> Result<(), CliError> {
    let CommandResult::Connection(conn) = result else {
        return Err(CliError::Internal(format!(
            "expected a connection, got {result:?}"
        )));
    };
    let (from, to, status) = controller.read(|store| {
        (
            util::node_label(store, &conn.source_node_id),
            util::node_label(store, &conn.target_node_id),
            store.connection_status(&conn.id),
        )
    });
    let out = output::render_single(
        global.output,
        conn,
        |c| detail(c, &from, &to, status.as_ref()),
        |c| c.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
