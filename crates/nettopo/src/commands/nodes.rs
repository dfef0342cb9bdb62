//! Node command handlers.

use tabled::Tabled;

use nettopo_core::{
    Command as CoreCommand, CommandResult, Controller, CreateNodeRequest, EntityId, Node,
    NodeFilter, NodePatch, Persistence,
};

use crate::cli::{GlobalOpts, NodesArgs, NodesCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    node_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Internet")]
    internet: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Position")]
    position: String,
}

fn detail(node: &Node, group: &str, links: usize, painter: &Painter) -> String {
    let mut lines = vec![
        format!("ID:        {}", node.id),
        format!("Name:      {}", node.name),
        format!("Type:      {}", node.node_type),
        format!("Status:    {}", painter.node_status(node.status)),
        format!("Internet:  {}", painter.node_status(node.internet_status)),
        format!("Group:     {group}"),
        format!(
            "Position:  {}, {}",
            output::coord(node.position_x),
            output::coord(node.position_y)
        ),
        format!("Links:     {links}"),
        format!("Monitor:   {}", node.monitoring.monitoring_method),
    ];
    if let Some(ip) = &node.monitoring.ip_address {
        lines.push(format!("IP:        {ip}"));
    }
    if let Some(latency) = node.latency {
        lines.push(format!("Latency:   {latency:.1} ms"));
    }
    if let Some(seen) = node.last_seen {
        lines.push(format!("Last seen: {}", seen.to_rfc3339()));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<P: Persistence>(
    controller: &Controller<P>,
    args: NodesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(global.color);

    match args.command {
        NodesCommand::List {
            node_type,
            status,
            group,
            ungrouped,
        } => {
            let mut filters = Vec::new();
            if let Some(t) = node_type {
                filters.push(NodeFilter::ByType(t));
            }
            if let Some(s) = status {
                filters.push(NodeFilter::ByStatus(s));
            }
            if let Some(g) = group {
                filters.push(NodeFilter::InGroup(EntityId::from(g)));
            }
            if ungrouped {
                filters.push(NodeFilter::Ungrouped);
            }

            let (nodes, groups) = controller.read(|store| {
                let nodes: Vec<Node> = store
                    .nodes()
                    .filter(|n| filters.iter().all(|f| f.matches(n)))
                    .cloned()
                    .collect();
                (nodes, util::group_names(store))
            });

            let out = output::render_list(
                global.output,
                &nodes,
                |n| NodeRow {
                    id: n.id.to_string(),
                    name: n.name.clone(),
                    node_type: n.node_type.to_string(),
                    status: painter.node_status(n.status),
                    internet: painter.node_status(n.internet_status),
                    group: n
                        .group_id
                        .as_ref()
                        .map_or_else(|| "-".into(), |g| util::lookup(&groups, g)),
                    position: format!(
                        "{}, {}",
                        output::coord(n.position_x),
                        output::coord(n.position_y)
                    ),
                },
                |n| n.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Get { id } => {
            let id = EntityId::from(id);
            let (node, group, links) = controller
                .read(|store| {
                    store.node(&id).map(|node| {
                        let group = node
                            .group_id
                            .as_ref()
                            .map_or_else(|| "-".into(), |g| util::group_label(store, g));
                        let links = store.connections().filter(|c| c.touches(&id)).count();
                        (node, group, links)
                    })
                })
                .ok_or_else(|| nettopo_core::CoreError::not_found("node", &id))?;

            let out = output::render_single(
                global.output,
                &*node,
                |n| detail(n, &group, links, &painter),
                |n| n.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Create {
            name,
            node_type,
            group,
            ip,
            x,
            y,
        } => {
            let mut req = CreateNodeRequest::new(name, node_type);
            req.group_id = group.map(EntityId::from);
            req.monitoring.ip_address = ip;
            req.position_x = x;
            req.position_y = y;
            let result = controller.execute(CoreCommand::CreateNode(req)).await?;
            print_node(global, &painter, &result)
        }

        NodesCommand::Update {
            id,
            name,
            node_type,
        } => {
            if name.is_none() && node_type.is_none() {
                return Err(util::nothing_to_update("node"));
            }
            let patch = NodePatch {
                name,
                node_type,
                ..NodePatch::default()
            };
            let result = controller
                .execute(CoreCommand::UpdateNode {
                    id: EntityId::from(id),
                    patch,
                })
                .await?;
            print_node(global, &painter, &result)
        }

        NodesCommand::Delete { id } => {
            let message = format!("Deleted node {id}");
            let cmd = CoreCommand::DeleteNode {
                id: EntityId::from(id),
            };
            util::run_quiet(controller, cmd, global, &message).await
        }

        NodesCommand::Move { id, x, y } => {
            let message = format!(
                "Moved node {id} to {}, {}",
                output::coord(x),
                output::coord(y)
            );
            let cmd = CoreCommand::MoveNode {
                id: EntityId::from(id),
                x,
                y,
            };
            util::run_quiet(controller, cmd, global, &message).await
        }

        NodesCommand::Assign { id, group, ungroup } => {
            let group_id = if ungroup {
                None
            } else {
                group.map(EntityId::from)
            };
            let result = controller
                .execute(CoreCommand::AssignNodeToGroup {
                    node_id: EntityId::from(id),
                    group_id,
                })
                .await?;
            print_node(global, &painter, &result)
        }
    }
}

fn print_node(global: &GlobalOpts, painter: &Painter, result: &CommandResult) -> Result<(), CliError> {
    let CommandResult::Node(node) = result else {
        return Err(CliError::Internal(format!("expected a node, got {result:?}")));
    };
    let group = node
        .group_id
        .as_ref()
        .map_or_else(|| "-".into(), ToString::to_string);
    let out = output::render_single(
        global.output,
        node,
        |n| detail(n, &group, 0, painter),
        |n| n.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
