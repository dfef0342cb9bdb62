//! Group and group-link command handlers.

use serde::Serialize;
use tabled::Tabled;

use nettopo_core::{
    Command as CoreCommand, CommandResult, Controller, CoreError, CreateGroupConnectionRequest,
    CreateGroupRequest, EntityId, Group, GroupGeometry, GroupPatch, GroupStatus, Persistence,
};

use crate::cli::{GlobalOpts, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Members")]
    members: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Size")]
    size: String,
}

/// A group with what is derived from its members.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupView {
    #[serde(flatten)]
    group: Group,
    members: Vec<EntityId>,
    status: GroupStatus,
}

fn view(store: &nettopo_core::TopologyStore, group: &Group) -> GroupView {
    GroupView {
        group: group.clone(),
        members: store.members_of(&group.id).map(|n| n.id.clone()).collect(),
        status: store.group_status(&group.id).unwrap_or(GroupStatus::Unknown),
    }
}

fn row(v: &GroupView, painter: &Painter) -> GroupRow {
    let g = &v.group;
    GroupRow {
        id: g.id.to_string(),
        name: g.name.clone(),
        members: v.members.len(),
        status: painter.group_status(v.status),
        position: format!(
            "{}, {}",
            output::coord(g.position_x),
            output::coord(g.position_y)
        ),
        size: format!("{} x {}", output::coord(g.width), output::coord(g.height)),
    }
}

fn detail(v: &GroupView, member_names: &[String], painter: &Painter) -> String {
    let g = &v.group;
    let mut lines = vec![
        format!("ID:          {}", g.id),
        format!("Name:        {}", g.name),
        format!("Description: {}", util::or_dash(g.description.as_deref())),
        format!("Status:      {}", painter.group_status(v.status)),
        format!(
            "Position:    {}, {}",
            output::coord(g.position_x),
            output::coord(g.position_y)
        ),
        format!(
            "Size:        {} x {}",
            output::coord(g.width),
            output::coord(g.height)
        ),
        format!("Color:       {}", util::or_dash(g.color.as_deref())),
        format!("Members:     {}", v.members.len()),
    ];
    lines.extend(member_names.iter().map(|name| format!("  - {name}")));
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle<P: Persistence>(
    controller: &Controller<P>,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(global.color);

    match args.command {
        GroupsCommand::List => {
            let views: Vec<GroupView> =
                controller.read(|store| store.groups().map(|g| view(store, g)).collect());
            let out = output::render_list(
                global.output,
                &views,
                |v| row(v, &painter),
                |v| v.group.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Get { id } => {
            let id = EntityId::from(id);
            let (v, names) = controller
                .read(|store| {
                    store.group(&id).map(|g| {
                        let v = view(store, &g);
                        let names = v
                            .members
                            .iter()
                            .map(|m| util::node_label(store, m))
                            .collect::<Vec<_>>();
                        (v, names)
                    })
                })
                .ok_or_else(|| CoreError::not_found("group", &id))?;
            let out = output::render_single(
                global.output,
                &v,
                |v| detail(v, &names, &painter),
                |v| v.group.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Create {
            name,
            description,
            color,
            x,
            y,
            width,
            height,
        } => {
            let mut req = CreateGroupRequest::new(name);
            req.description = description;
            req.color = color;
            req.position_x = x;
            req.position_y = y;
            req.width = width;
            req.height = height;
            let result = controller.execute(CoreCommand::CreateGroup(req)).await?;
            print_group(controller, global, &painter, &result)
        }

        GroupsCommand::Update {
            id,
            name,
            description,
            color,
            opacity,
        } => {
            let patch = GroupPatch {
                name,
                description: description.map(Some),
                color: color.map(Some),
                opacity,
                ..GroupPatch::default()
            };
            if patch == GroupPatch::default() {
                return Err(util::nothing_to_update("group"));
            }
            let result = controller
                .execute(CoreCommand::UpdateGroup {
                    id: EntityId::from(id),
                    patch,
                })
                .await?;
            print_group(controller, global, &painter, &result)
        }

        GroupsCommand::Delete { id } => {
            let message = format!("Deleted group {id}; its members are now ungrouped");
            let cmd = CoreCommand::DeleteGroup {
                id: EntityId::from(id),
            };
            util::run_quiet(controller, cmd, global, &message).await
        }

        GroupsCommand::Move {
            id,
            x,
            y,
            width,
            height,
        } => {
            let message = format!(
                "Moved group {id} to {}, {}",
                output::coord(x),
                output::coord(y)
            );
            let cmd = CoreCommand::MoveGroup {
                id: EntityId::from(id),
                geometry: GroupGeometry {
                    x,
                    y,
                    width,
                    height,
                },
            };
            util::run_quiet(controller, cmd, global, &message).await
        }

        GroupsCommand::Link {
            source,
            target,
            label,
        } => {
            let (source, target) = (EntityId::from(source), EntityId::from(target));
            for id in [&source, &target] {
                if controller.read(|s| s.group(id)).is_none() {
                    return Err(CoreError::not_found("group", id).into());
                }
            }
            let mut req = CreateGroupConnectionRequest::new(source, target);
            req.label = label;
            let result = controller
                .execute(CoreCommand::CreateGroupConnection(req))
                .await?;
            let CommandResult::GroupConnection(link) = result else {
                return Err(CliError::Internal(format!(
                    "expected a group connection, got {result:?}"
                )));
            };
            let out = output::render_single(
                global.output,
                &link,
                |l| {
                    controller.read(|store| {
                        format!(
                            "Linked {} -> {} ({})",
                            util::group_label(store, &l.source_group_id),
                            util::group_label(store, &l.target_group_id),
                            l.id
                        )
                    })
                },
                |l| l.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Unlink { id } => {
            let message = format!("Removed group link {id}");
            let cmd = CoreCommand::DeleteGroupConnection {
                id: EntityId::from(id),
            };
            util::run_quiet(controller, cmd, global, &message).await
        }
    }
}

fn print_group<P: Persistence>(
    controller: &Controller<P>,
    global: &GlobalOpts,
    painter: &Painter,
    result: &CommandResult,
) -> Result<(), CliError> {
    let CommandResult::Group(group) = result else {
        return Err(CliError::Internal(format!("expected a group, got {result:?}")));
    };
    let v = controller.read(|store| view(store, group));
    let out = output::render_single(
        global.output,
        &v,
        |v| detail(v, &[], painter),
        |v| v.group.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
