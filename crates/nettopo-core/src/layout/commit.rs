// ── Arrangement commit ──
//
// Writing an arrangement back happens in two steps: one synchronous store
// batch, then a concurrent fan-out of position updates to the backend.
// Backend failures are reported, never rolled back.

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::Arrangement;
use crate::model::EntityId;
use crate::persistence::Persistence;
use crate::store::TopologyStore;

impl TopologyStore {
    /// Apply every placement as a single mutation. Returns the number of
    /// entities that moved.
    pub fn apply_arrangement(&mut self, arrangement: &Arrangement) -> usize {
        let moved_nodes = self.nodes.modify_each(|node| {
            if let Some(p) = arrangement.nodes.get(&node.id) {
                node.position_x = p.x;
                node.position_y = p.y;
            }
        });
        let moved_groups = self.groups.modify_each(|group| {
            if let Some(p) = arrangement.groups.get(&group.id) {
                p.geometry.apply(group);
            }
        });
        self.publish();
        moved_nodes + moved_groups
    }
}

/// One position update the backend rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistFailure {
    pub entity_id: EntityId,
    pub message: String,
}

/// Outcome of persisting an arrangement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistReport {
    pub attempted: usize,
    pub failures: Vec<PersistFailure>,
}

impl PersistReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Send every placement to the backend concurrently and wait for all of
/// them.
pub async fn persist_arrangement<P: Persistence>(
    persistence: &P,
    arrangement: &Arrangement,
) -> PersistReport {
    let node_updates = arrangement.nodes.iter().map(|(id, p)| async move {
        (id, persistence.update_node_position(id, p.x, p.y).await)
    });
    let group_updates = arrangement.groups.iter().map(|(id, p)| async move {
        (id, persistence.update_group_position(id, &p.geometry).await)
    });

    let (node_results, group_results) =
        futures_util::join!(join_all(node_updates), join_all(group_updates));

    let mut report = PersistReport::default();
    for (id, result) in node_results.into_iter().chain(group_results) {
        report.attempted += 1;
        if let Err(e) = result {
            warn!(entity_id = %id, error = %e, "failed to persist layout position");
            report.failures.push(PersistFailure {
                entity_id: id.clone(),
                message: e.to_string(),
            });
        }
    }

    info!(
        attempted = report.attempted,
        failed = report.failures.len(),
        "layout persisted"
    );
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, arrange};
    use crate::model::{Group, Node, NodeType};
    use crate::persistence::{MemoryPersistence, Operation};

    fn topology() -> TopologyStore {
        let mut store = TopologyStore::new();
        store.add_group(Group::new("g", "core"));
        store.add_node(Node::new("a", "a", NodeType::Router).in_group("g"));
        store.add_node(Node::new("b", "b", NodeType::Server));
        store
    }

    #[test]
    fn apply_is_one_publication() {
        let mut store = topology();
        let arr = arrange(&store, &LayoutConfig::default());
        let before = store.revision();

        assert!(store.apply_arrangement(&arr) > 0);
        assert_eq!(store.revision(), before + 1);
        assert_eq!(store.apply_arrangement(&arr), 0, "second apply is a no-op");
    }

    #[tokio::test]
    async fn persist_reports_failures_without_undoing() {
        let mut store = topology();
        let backend = MemoryPersistence::with_snapshot(store.snapshot());
        backend.fail_on(Operation::UpdateGroupPosition);

        let arr = arrange(&store, &LayoutConfig::default());
        store.apply_arrangement(&arr);
        let report = persist_arrangement(&backend, &arr).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failures[0].entity_id, EntityId::from("g"));

        let placed = arr.group(&EntityId::from("g")).unwrap();
        assert_eq!(
            store.group(&EntityId::from("g")).unwrap().position_x,
            placed.geometry.x
        );
    }
}
