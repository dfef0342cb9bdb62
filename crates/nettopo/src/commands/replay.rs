//! `replay`: feed recorded sync events through the event loop.

use std::path::Path;

use futures_util::stream;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use nettopo_core::{Controller, EventLoopStats, Persistence};

use crate::cli::{GlobalOpts, OutputFormat, ReplayArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    #[serde(flatten)]
    stats: EventLoopStats,
    revision: u64,
    nodes: usize,
    connections: usize,
    groups: usize,
}

async fn read_frames(path: &Path) -> Result<Vec<String>, CliError> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(path).await?
    };
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect())
}

pub async fn handle<P: Persistence>(
    controller: &Controller<P>,
    args: ReplayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let frames = read_frames(&args.events).await?;
    tracing::debug!(count = frames.len(), paced = args.paced, "replaying events");

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let stats = if args.paced {
        let paced = stream::unfold(
            (frames.into_iter(), controller.frames()),
            |(mut lines, mut ticks)| async move {
                let line = lines.next()?;
                ticks.tick().await?;
                Some((line, (lines, ticks)))
            },
        );
        controller.run_event_stream(paced, cancel).await
    } else {
        controller
            .run_event_stream(stream::iter(frames), cancel)
            .await
    };
    interrupt.abort();

    let report = controller.read(|store| ReplayReport {
        stats,
        revision: store.revision(),
        nodes: store.node_count(),
        connections: store.connection_count(),
        groups: store.group_count(),
    });

    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => format!(
            "{} events: {} changed, {} unchanged, {} ignored, {} malformed (revision {})",
            report.stats.received,
            report.stats.changed,
            report.stats.unchanged,
            report.stats.ignored,
            report.stats.malformed,
            report.revision
        ),
        format => output::render_single(format, &report, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
