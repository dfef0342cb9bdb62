//! `status`: derived connection, group and uplink statuses.

use serde::Serialize;
use tabled::Tabled;

use nettopo_core::{Controller, Persistence, StatusOverview};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    node_count: usize,
    connection_count: usize,
    group_count: usize,
    group_connection_count: usize,
    revision: u64,
    #[serde(flatten)]
    overview: StatusOverview,
}

pub fn handle<P: Persistence>(
    controller: &Controller<P>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(global.color);

    let (report, rows) = controller.read(|store| {
        let overview = store.status_overview();
        let nodes = util::node_names(store);
        let groups = util::group_names(store);

        let mut rows = Vec::new();
        for (id, status) in &overview.connections {
            let name = store.connection(id).map_or_else(
                || id.to_string(),
                |c| {
                    format!(
                        "{} -> {}",
                        util::lookup(&nodes, &c.source_node_id),
                        util::lookup(&nodes, &c.target_node_id)
                    )
                },
            );
            rows.push(StatusRow {
                kind: "connection",
                name,
                status: painter.connection_status(status),
            });
        }
        for (id, status) in &overview.groups {
            rows.push(StatusRow {
                kind: "group",
                name: util::lookup(&groups, id),
                status: painter.group_status(*status),
            });
        }
        for (id, status) in &overview.group_connections {
            let name = store.group_connection(id).map_or_else(
                || id.to_string(),
                |gc| {
                    format!(
                        "{} -> {}",
                        util::lookup(&groups, &gc.source_group_id),
                        util::lookup(&groups, &gc.target_group_id)
                    )
                },
            );
            rows.push(StatusRow {
                kind: "group link",
                name,
                status: painter.group_status(*status),
            });
        }
        for (target, connection) in &overview.active_sources {
            let source = store.connection(connection).map_or_else(
                || connection.to_string(),
                |c| util::lookup(&nodes, &c.source_node_id),
            );
            rows.push(StatusRow {
                kind: "uplink",
                name: util::lookup(&nodes, target),
                status: format!("via {source}"),
            });
        }

        let report = StatusReport {
            node_count: store.node_count(),
            connection_count: store.connection_count(),
            group_count: store.group_count(),
            group_connection_count: store.group_connection_count(),
            revision: store.revision(),
            overview,
        };
        (report, rows)
    });

    let out = match global.output {
        OutputFormat::Table => format!(
            "{}\n{} nodes, {} connections, {} groups, {} group links",
            output::render_table(&rows),
            report.node_count,
            report.connection_count,
            report.group_count,
            report.group_connection_count
        ),
        OutputFormat::Plain => rows
            .iter()
            .map(|r| format!("{}\t{}\t{}", r.kind, r.name, r.status))
            .collect::<Vec<_>>()
            .join("\n"),
        format => output::render_single(format, &report, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
