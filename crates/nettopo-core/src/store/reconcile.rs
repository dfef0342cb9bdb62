// ── Optimistic creation reconciliation ──
//
// A locally created entity carries a provisional id until the backend
// answers with the stored version. These swap the provisional entity for
// the stored one in a single publication.

use super::collection::EntityCollection;
use super::topology_store::TopologyStore;
use super::ui_state::UiState;
use crate::model::{Connection, EntityId, Group, GroupConnection, Node};

fn swap<T: Clone + PartialEq + Send + Sync + 'static>(
    collection: &mut EntityCollection<T>,
    ui: &mut UiState,
    provisional: &EntityId,
    stored_id: EntityId,
    stored: T,
) -> bool {
    if *provisional == stored_id {
        return collection.upsert(stored_id, stored);
    }
    if collection.remove(provisional).is_some() {
        ui.forget(provisional);
    }
    collection.upsert(stored_id, stored);
    true
}

impl TopologyStore {
    pub(crate) fn reconcile_node(&mut self, provisional: &EntityId, stored: Node) -> bool {
        let stored_id = stored.id.clone();
        if *provisional != stored_id {
            // Re-point anything drawn against the provisional node.
            self.connections.modify_each(|c| {
                if c.source_node_id == *provisional {
                    c.source_node_id = stored_id.clone();
                }
                if c.target_node_id == *provisional {
                    c.target_node_id = stored_id.clone();
                }
            });
        }
        let changed = swap(&mut self.nodes, &mut self.ui, provisional, stored_id, stored);
        self.publish();
        changed
    }

    pub(crate) fn reconcile_connection(
        &mut self,
        provisional: &EntityId,
        stored: Connection,
    ) -> bool {
        let stored_id = stored.id.clone();
        let changed = swap(
            &mut self.connections,
            &mut self.ui,
            provisional,
            stored_id,
            stored,
        );
        self.normalize_active_sources_inner();
        self.publish();
        changed
    }

    pub(crate) fn reconcile_group(&mut self, provisional: &EntityId, stored: Group) -> bool {
        let stored_id = stored.id.clone();
        if *provisional != stored_id {
            self.nodes.modify_each(|n| {
                if n.group_id.as_ref() == Some(provisional) {
                    n.group_id = Some(stored_id.clone());
                }
            });
            self.group_connections.modify_each(|gc| {
                if gc.source_group_id == *provisional {
                    gc.source_group_id = stored_id.clone();
                }
                if gc.target_group_id == *provisional {
                    gc.target_group_id = stored_id.clone();
                }
            });
        }
        let changed = swap(&mut self.groups, &mut self.ui, provisional, stored_id, stored);
        self.publish();
        changed
    }

    pub(crate) fn reconcile_group_connection(
        &mut self,
        provisional: &EntityId,
        stored: GroupConnection,
    ) -> bool {
        let stored_id = stored.id.clone();
        let changed = swap(
            &mut self.group_connections,
            &mut self.ui,
            provisional,
            stored_id,
            stored,
        );
        self.publish();
        changed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::model::{Connection, EntityId, Group, Node, NodeType};
    use crate::store::TopologyStore;

    #[test]
    fn server_id_replaces_provisional_and_repoints_edges() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("tmp", "router", NodeType::Router));
        store.add_node(Node::new("b", "b", NodeType::Server));
        store.add_connection(Connection::new("c", "tmp", "b"));

        let stored = Node::new("srv-1", "router", NodeType::Router);
        assert!(store.reconcile_node(&EntityId::from("tmp"), stored));

        assert!(store.node(&EntityId::from("tmp")).is_none());
        assert!(store.node(&EntityId::from("srv-1")).is_some());
        let conn = store.connection(&EntityId::from("c")).unwrap();
        assert_eq!(conn.source_node_id, EntityId::from("srv-1"));
    }

    #[test]
    fn same_id_identical_entity_is_unchanged() {
        let mut store = TopologyStore::new();
        let group = Group::new("g", "core");
        store.add_group(group.clone());
        assert!(!store.reconcile_group(&EntityId::from("g"), group));
    }
}
