// ── Controller facade ──
//
// Owns the store and the persistence collaborator. User commands are
// applied optimistically and then mirrored to the backend; inbound events
// are decoded and applied in arrival order.

use std::pin::pin;
use std::sync::{Arc, Mutex, PoisonError};

use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandResult};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::layout::{Arrangement, PersistReport, arrange, persist_arrangement};
use crate::model::{EntityId, NodePatch, TopologySnapshot};
use crate::persistence::Persistence;
use crate::scheduler::{FrameScheduler, FrameSubscription};
use crate::store::TopologyStore;
use crate::sync::{Applied, decode_event};

/// Counters from one run of the event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventLoopStats {
    pub received: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub ignored: usize,
    pub malformed: usize,
}

/// What `auto_arrange` did.
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub arrangement: Arrangement,
    /// Entities whose position or size actually changed.
    pub moved: usize,
    pub report: PersistReport,
}

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. The store sits behind a
/// synchronous mutex that is only ever held for a synchronous section,
/// never across an `.await`, so each mutation is atomic relative to every
/// other command or event.
pub struct Controller<P: Persistence> {
    inner: Arc<ControllerInner<P>>,
}

impl<P: Persistence> Clone for Controller<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<P> {
    config: ControllerConfig,
    store: Mutex<TopologyStore>,
    persistence: P,
    scheduler: FrameScheduler,
}

impl<P: Persistence> Controller<P> {
    pub fn new(persistence: P, config: ControllerConfig) -> Self {
        let scheduler = FrameScheduler::new(config.frame_interval);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Mutex::new(TopologyStore::new()),
                persistence,
                scheduler,
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn persistence(&self) -> &P {
        &self.inner.persistence
    }

    /// Run `f` against the store.
    pub fn read<R>(&self, f: impl FnOnce(&TopologyStore) -> R) -> R {
        let store = self.inner.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&store)
    }

    /// Run `f` as one synchronous mutation of the store.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut TopologyStore) -> R) -> R {
        let mut store = self.inner.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    pub fn snapshot(&self) -> TopologySnapshot {
        self.read(TopologyStore::snapshot)
    }

    /// Subscribe to the shared animation clock.
    pub fn frames(&self) -> FrameSubscription {
        self.inner.scheduler.subscribe()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the full topology and replace the store contents with it.
    pub async fn load(&self) -> Result<(), CoreError> {
        let snapshot = self.inner.persistence.fetch_topology().await?;
        let (nodes, connections, groups) = (
            snapshot.nodes.len(),
            snapshot.connections.len(),
            snapshot.groups.len(),
        );
        self.mutate(|store| store.replace_all(snapshot));
        info!(nodes, connections, groups, "topology loaded");
        Ok(())
    }

    /// Catch up after a reconnect: every entity the backend holds that
    /// the store lacks is added; nothing local is overwritten.
    pub async fn resync(&self) -> Result<usize, CoreError> {
        let snapshot = self.inner.persistence.fetch_topology().await?;
        Ok(self.mutate(|store| store.absorb_snapshot(snapshot)))
    }

    // ── Event loop ───────────────────────────────────────────────────

    /// Apply text frames from `frames` until the stream ends or `cancel`
    /// fires. Malformed frames are logged and skipped.
    pub async fn run_event_stream<S>(&self, frames: S, cancel: CancellationToken) -> EventLoopStats
    where
        S: Stream<Item = String>,
    {
        let mut frames = pin!(frames);
        let mut stats = EventLoopStats::default();

        loop {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("event stream cancelled");
                    break;
                }
                next = frames.next() => match next {
                    Some(frame) => frame,
                    None => break,
                },
            };
            stats.received += 1;

            match decode_event(&frame) {
                Ok(Some(envelope)) => match self.mutate(|store| store.apply_envelope(&envelope)) {
                    Applied::Changed => stats.changed += 1,
                    Applied::Unchanged => stats.unchanged += 1,
                    Applied::Ignored => stats.ignored += 1,
                },
                Ok(None) => stats.ignored += 1,
                Err(e) => {
                    warn!(error = %e, "skipping malformed event");
                    stats.malformed += 1;
                }
            }
        }

        info!(
            received = stats.received,
            changed = stats.changed,
            malformed = stats.malformed,
            "event stream finished"
        );
        stats
    }

    // ── Layout ───────────────────────────────────────────────────────

    /// Compute an arrangement, commit it locally in one batch, then
    /// persist every position concurrently.
    ///
    /// Backend failures are reported in the outcome; the local layout
    /// stands either way.
    pub async fn auto_arrange(&self) -> LayoutOutcome {
        let layout = self.inner.config.layout;
        let (arrangement, moved) = self.mutate(|store| {
            let arrangement = arrange(store, &layout);
            let moved = store.apply_arrangement(&arrangement);
            (arrangement, moved)
        });
        info!(
            nodes = arrangement.nodes.len(),
            groups = arrangement.groups.len(),
            moved,
            "layout committed"
        );
        let report = persist_arrangement(&self.inner.persistence, &arrangement).await;
        LayoutOutcome {
            arrangement,
            moved,
            report,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Execute a user command.
    ///
    /// The store is updated before the backend is called. If the backend
    /// fails, the error is returned but the local change stays.
    #[allow(clippy::too_many_lines)]
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let backend = &self.inner.persistence;

        match cmd {
            // ── Nodes ────────────────────────────────────────────────
            Command::CreateNode(req) => {
                let node = req.into_node();
                let provisional = node.id.clone();
                self.mutate(|s| s.add_node(node.clone()));
                let stored = persisted("create_node", backend.create_node(&node).await)?;
                self.mutate(|s| s.reconcile_node(&provisional, stored.clone()));
                Ok(CommandResult::Node(stored))
            }

            Command::UpdateNode { id, patch } => {
                self.require_node(&id)?;
                self.mutate(|s| s.update_node(&id, &patch));
                let stored = persisted("update_node", backend.update_node(&id, &patch).await)?;
                self.mutate(|s| s.reconcile_node(&id, stored.clone()));
                Ok(CommandResult::Node(stored))
            }

            Command::DeleteNode { id } => {
                self.require_node(&id)?;
                self.mutate(|s| s.remove_node(&id));
                persisted("delete_node", backend.delete_node(&id).await)?;
                Ok(CommandResult::Ok)
            }

            Command::MoveNode { id, x, y } => {
                self.require_node(&id)?;
                self.mutate(|s| s.set_node_position(&id, x, y));
                persisted(
                    "update_node_position",
                    backend.update_node_position(&id, x, y).await,
                )?;
                Ok(CommandResult::Ok)
            }

            Command::AssignNodeToGroup { node_id, group_id } => {
                self.require_node(&node_id)?;
                if let Some(gid) = &group_id {
                    self.require_group(gid)?;
                }
                self.mutate(|s| s.set_node_group(&node_id, group_id.clone()));
                let patch = NodePatch {
                    group_id: Some(group_id),
                    ..NodePatch::default()
                };
                let stored = persisted("update_node", backend.update_node(&node_id, &patch).await)?;
                self.mutate(|s| s.reconcile_node(&node_id, stored.clone()));
                Ok(CommandResult::Node(stored))
            }

            // ── Connections ──────────────────────────────────────────
            Command::CreateConnection(req) => {
                let conn = req.into_connection();
                let provisional = conn.id.clone();
                self.mutate(|s| s.add_connection(conn.clone()));
                let stored =
                    persisted("create_connection", backend.create_connection(&conn).await)?;
                self.mutate(|s| s.reconcile_connection(&provisional, stored.clone()));
                Ok(CommandResult::Connection(stored))
            }

            Command::UpdateConnection { id, patch } => {
                self.require_connection(&id)?;
                self.mutate(|s| s.update_connection(&id, &patch));
                let stored = persisted(
                    "update_connection",
                    backend.update_connection(&id, &patch).await,
                )?;
                self.mutate(|s| s.reconcile_connection(&id, stored.clone()));
                Ok(CommandResult::Connection(stored))
            }

            Command::DeleteConnection { id } => {
                self.require_connection(&id)?;
                self.mutate(|s| s.remove_connection(&id));
                persisted("delete_connection", backend.delete_connection(&id).await)?;
                Ok(CommandResult::Ok)
            }

            Command::SetActiveSource { connection_id } => {
                let target = self
                    .read(|s| s.connection(&connection_id))
                    .map(|c| c.target_node_id.clone())
                    .ok_or_else(|| CoreError::not_found("connection", &connection_id))?;
                self.mutate(|s| s.set_active_source(&connection_id, &target));
                persisted(
                    "set_active_source",
                    backend.set_active_source(&connection_id).await,
                )?;
                Ok(CommandResult::Ok)
            }

            // ── Groups ───────────────────────────────────────────────
            Command::CreateGroup(req) => {
                let group = req.into_group();
                let provisional = group.id.clone();
                self.mutate(|s| s.add_group(group.clone()));
                let stored = persisted("create_group", backend.create_group(&group).await)?;
                self.mutate(|s| s.reconcile_group(&provisional, stored.clone()));
                Ok(CommandResult::Group(stored))
            }

            Command::UpdateGroup { id, patch } => {
                self.require_group(&id)?;
                self.mutate(|s| s.update_group(&id, &patch));
                let stored = persisted("update_group", backend.update_group(&id, &patch).await)?;
                self.mutate(|s| s.reconcile_group(&id, stored.clone()));
                Ok(CommandResult::Group(stored))
            }

            Command::DeleteGroup { id } => {
                self.require_group(&id)?;
                self.mutate(|s| s.remove_group(&id));
                persisted("delete_group", backend.delete_group(&id).await)?;
                Ok(CommandResult::Ok)
            }

            Command::MoveGroup { id, geometry } => {
                self.require_group(&id)?;
                self.mutate(|s| s.set_group_geometry(&id, &geometry));
                persisted(
                    "update_group_position",
                    backend.update_group_position(&id, &geometry).await,
                )?;
                Ok(CommandResult::Ok)
            }

            // ── Group connections ────────────────────────────────────
            Command::CreateGroupConnection(req) => {
                let gc = req.into_group_connection();
                let provisional = gc.id.clone();
                self.mutate(|s| s.add_group_connection(gc.clone()));
                let stored = persisted(
                    "create_group_connection",
                    backend.create_group_connection(&gc).await,
                )?;
                self.mutate(|s| s.reconcile_group_connection(&provisional, stored.clone()));
                Ok(CommandResult::GroupConnection(stored))
            }

            Command::DeleteGroupConnection { id } => {
                if self.read(|s| s.group_connection(&id)).is_none() {
                    return Err(CoreError::not_found("group connection", &id));
                }
                self.mutate(|s| s.remove_group_connection(&id));
                persisted(
                    "delete_group_connection",
                    backend.delete_group_connection(&id).await,
                )?;
                Ok(CommandResult::Ok)
            }
        }
    }

    fn require_node(&self, id: &EntityId) -> Result<(), CoreError> {
        if self.read(|s| s.node(id)).is_none() {
            return Err(CoreError::not_found("node", id));
        }
        Ok(())
    }

    fn require_connection(&self, id: &EntityId) -> Result<(), CoreError> {
        if self.read(|s| s.connection(id)).is_none() {
            return Err(CoreError::not_found("connection", id));
        }
        Ok(())
    }

    fn require_group(&self, id: &EntityId) -> Result<(), CoreError> {
        if self.read(|s| s.group(id)).is_none() {
            return Err(CoreError::not_found("group", id));
        }
        Ok(())
    }
}

/// Log a backend failure. The optimistic local change is kept.
fn persisted<T>(op: &str, result: Result<T, CoreError>) -> Result<T, CoreError> {
    result.inspect_err(|e| warn!(op, error = %e, "persistence failed, keeping local state"))
}
