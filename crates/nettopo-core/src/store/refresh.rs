// ── Full refresh application logic ──
//
// Applies a complete topology fetch to the store.

use std::collections::HashSet;

use tracing::info;

use super::collection::EntityCollection;
use super::topology_store::TopologyStore;
use super::ui_state::UiState;
use crate::model::{EntityId, TopologySnapshot};

/// Upsert all incoming entities, then prune any ids not in the incoming
/// set. This avoids the brief empty state a clear-then-insert would cause.
/// Returns the number of entities inserted, replaced or removed.
fn upsert_and_prune<T: Clone + PartialEq + Send + Sync + 'static>(
    collection: &mut EntityCollection<T>,
    ui: &mut UiState,
    items: Vec<(EntityId, T)>,
) -> usize {
    let incoming: HashSet<EntityId> = items.iter().map(|(id, _)| id.clone()).collect();
    let mut touched = 0;
    for (id, entity) in items {
        if collection.upsert(id, entity) {
            touched += 1;
        }
    }
    for existing in collection.ids() {
        if !incoming.contains(&existing) {
            collection.remove(&existing);
            ui.forget(&existing);
            touched += 1;
        }
    }
    touched
}

impl TopologyStore {
    /// Replace the whole topology with a freshly fetched snapshot.
    ///
    /// Subscribers see one publication carrying the new state. Active
    /// sources are normalized afterwards since a bulk load bypasses the
    /// arbiter.
    pub fn replace_all(&mut self, snapshot: TopologySnapshot) -> bool {
        let TopologySnapshot {
            nodes,
            connections,
            groups,
            group_connections,
        } = snapshot;

        let mut touched = upsert_and_prune(
            &mut self.nodes,
            &mut self.ui,
            nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
        );
        touched += upsert_and_prune(
            &mut self.connections,
            &mut self.ui,
            connections.into_iter().map(|c| (c.id.clone(), c)).collect(),
        );
        touched += upsert_and_prune(
            &mut self.groups,
            &mut self.ui,
            groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        );
        touched += upsert_and_prune(
            &mut self.group_connections,
            &mut self.ui,
            group_connections
                .into_iter()
                .map(|gc| (gc.id.clone(), gc))
                .collect(),
        );
        touched += self.normalize_active_sources_inner();

        info!(
            nodes = self.nodes.len(),
            connections = self.connections.len(),
            groups = self.groups.len(),
            group_connections = self.group_connections.len(),
            touched,
            "topology replaced"
        );
        self.publish();
        touched > 0
    }
}
