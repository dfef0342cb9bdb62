//! `arrange`: hierarchical auto-layout.

use serde::Serialize;
use tabled::Tabled;

use nettopo_core::layout::arrange;
use nettopo_core::{Arrangement, Controller, Persistence};

use crate::cli::{ArrangeArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct PlacementRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Level")]
    level: usize,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "X")]
    x: String,
    #[tabled(rename = "Y")]
    y: String,
    #[tabled(rename = "Size")]
    size: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArrangeReport<'a> {
    arrangement: &'a Arrangement,
    dry_run: bool,
    moved: usize,
    persisted: usize,
    failed: usize,
}

fn rows<P: Persistence>(controller: &Controller<P>, arrangement: &Arrangement) -> Vec<PlacementRow> {
    controller.read(|store| {
        let groups = super::util::group_names(store);
        let nodes = super::util::node_names(store);
        let group_rows = arrangement.groups.iter().map(|(id, placement)| {
            let g = &placement.geometry;
            PlacementRow {
                kind: "group",
                name: super::util::lookup(&groups, id),
                level: placement.level,
                group: "-".into(),
                x: output::coord(g.x),
                y: output::coord(g.y),
                size: match (g.width, g.height) {
                    (Some(w), Some(h)) => format!("{} x {}", output::coord(w), output::coord(h)),
                    _ => "-".into(),
                },
            }
        });
        let node_rows = arrangement.nodes.iter().map(|(id, placement)| PlacementRow {
            kind: "node",
            name: super::util::lookup(&nodes, id),
            level: placement.level,
            group: placement
                .group_id
                .as_ref()
                .map_or_else(|| "(lane)".into(), |g| super::util::lookup(&groups, g)),
            x: output::coord(placement.x),
            y: output::coord(placement.y),
            size: "-".into(),
        });
        group_rows.chain(node_rows).collect()
    })
}

pub async fn handle<P: Persistence>(
    controller: &Controller<P>,
    args: ArrangeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (arrangement, moved, report) = if args.dry_run {
        let arrangement = controller.read(|store| arrange(store, &controller.config().layout));
        (arrangement, 0, None)
    } else {
        let outcome = controller.auto_arrange().await;
        (outcome.arrangement, outcome.moved, Some(outcome.report))
    };

    let (persisted, failed) = report
        .as_ref()
        .map_or((0, 0), |r| (r.succeeded(), r.failures.len()));

    let out = match global.output {
        OutputFormat::Table => output::render_table(&rows(controller, &arrangement)),
        OutputFormat::Plain => arrangement
            .nodes
            .iter()
            .map(|(id, p)| format!("{id}\t{}\t{}", output::coord(p.x), output::coord(p.y)))
            .collect::<Vec<_>>()
            .join("\n"),
        format => output::render_single(
            format,
            &ArrangeReport {
                arrangement: &arrangement,
                dry_run: args.dry_run,
                moved,
                persisted,
                failed,
            },
            |_| String::new(),
            |_| String::new(),
        )?,
    };
    output::print_output(&out, global.quiet);

    if let Some(report) = report {
        if !global.quiet {
            eprintln!(
                "{moved} moved, {persisted}/{} positions saved",
                report.attempted
            );
        }
        if !report.is_clean() {
            return Err(CliError::LayoutPersist {
                failed,
                attempted: report.attempted,
            });
        }
    }
    Ok(())
}
