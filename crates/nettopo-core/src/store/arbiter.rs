// ── Active-source arbiter ──
//
// For every target node, at most one connection sourced at an internet
// uplink carries `is_active_source`. These are the only code paths that
// set the flag.

use std::collections::HashSet;

use tracing::debug;

use super::topology_store::TopologyStore;
use crate::model::{Connection, EntityId};

impl TopologyStore {
    /// Make `connection_id` the active uplink for `target_node_id`,
    /// clearing the flag on every competing uplink connection.
    ///
    /// No-op when the connection is unknown.
    pub fn set_active_source(&mut self, connection_id: &EntityId, target_node_id: &EntityId) -> bool {
        let changed = self.claim_active_source(connection_id, target_node_id);
        self.publish();
        changed
    }

    /// Keep the first flagged uplink connection per target (insertion
    /// order) and clear the rest. Used after bulk loads.
    pub fn normalize_active_sources(&mut self) -> usize {
        let cleared = self.normalize_active_sources_inner();
        self.publish();
        cleared
    }

    /// The connection currently holding the active slot for a target.
    pub fn active_source_for(&self, target_node_id: &EntityId) -> Option<&Connection> {
        self.connections
            .values()
            .find(|c| c.target_node_id == *target_node_id && self.is_active_uplink(c))
    }

    /// Flagged and sourced at a known internet uplink. A flag on any other
    /// connection carries no meaning.
    pub fn is_active_uplink(&self, connection: &Connection) -> bool {
        connection.is_active_source && self.is_internet(&connection.source_node_id)
    }

    pub(crate) fn claim_active_source(
        &mut self,
        connection_id: &EntityId,
        target_node_id: &EntityId,
    ) -> bool {
        if !self.connections.contains(connection_id) {
            debug!(connection_id = %connection_id, "active source for unknown connection ignored");
            return false;
        }

        let uplinks: HashSet<EntityId> = self
            .nodes
            .values()
            .filter(|n| n.is_internet())
            .map(|n| n.id.clone())
            .collect();

        let changed = self.connections.modify_each(|conn| {
            if conn.id == *connection_id {
                conn.is_active_source = true;
            } else if conn.is_active_source
                && conn.target_node_id == *target_node_id
                && uplinks.contains(&conn.source_node_id)
            {
                conn.is_active_source = false;
            }
        });
        changed > 0
    }

    pub(crate) fn normalize_active_sources_inner(&mut self) -> usize {
        let uplinks: HashSet<EntityId> = self
            .nodes
            .values()
            .filter(|n| n.is_internet())
            .map(|n| n.id.clone())
            .collect();

        let mut claimed: HashSet<EntityId> = HashSet::new();
        let cleared = self.connections.modify_each(|conn| {
            if !conn.is_active_source || !uplinks.contains(&conn.source_node_id) {
                return;
            }
            if !claimed.insert(conn.target_node_id.clone()) {
                conn.is_active_source = false;
            }
        });
        if cleared > 0 {
            debug!(cleared, "duplicate active sources cleared");
        }
        cleared
    }

    pub(crate) fn is_internet(&self, node_id: &EntityId) -> bool {
        self.nodes.get_ref(node_id).is_some_and(|n| n.is_internet())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::model::{Connection, EntityId, Node, NodeType};
    use crate::store::TopologyStore;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    /// Two uplinks feeding one main link, plus a LAN link into it.
    fn dual_uplink() -> TopologyStore {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("isp1", "isp1", NodeType::Internet));
        store.add_node(Node::new("isp2", "isp2", NodeType::Internet));
        store.add_node(Node::new("lan", "lan", NodeType::Router));
        store.add_node(Node::new("main", "main", NodeType::MainLink));
        store.add_connection(Connection::new("c1", "isp1", "main"));
        store.add_connection(Connection::new("c2", "isp2", "main"));
        store.add_connection(Connection::new("c3", "lan", "main"));
        store
    }

    fn flagged(store: &TopologyStore) -> Vec<EntityId> {
        store
            .connections()
            .filter(|c| c.is_active_source)
            .map(|c| c.id.clone())
            .collect()
    }

    #[test]
    fn set_active_source_is_exclusive_per_target() {
        let mut store = dual_uplink();
        assert!(store.set_active_source(&id("c1"), &id("main")));
        assert_eq!(flagged(&store), vec![id("c1")]);

        assert!(store.set_active_source(&id("c2"), &id("main")));
        assert_eq!(flagged(&store), vec![id("c2")]);
        assert_eq!(store.active_source_for(&id("main")).unwrap().id, id("c2"));
    }

    #[test]
    fn set_active_source_twice_is_unchanged() {
        let mut store = dual_uplink();
        store.set_active_source(&id("c1"), &id("main"));
        assert!(!store.set_active_source(&id("c1"), &id("main")));
    }

    #[test]
    fn set_active_source_for_unknown_connection_is_noop() {
        let mut store = dual_uplink();
        store.set_active_source(&id("c1"), &id("main"));
        assert!(!store.set_active_source(&id("nope"), &id("main")));
        assert_eq!(flagged(&store), vec![id("c1")]);
    }

    #[test]
    fn other_targets_are_untouched() {
        let mut store = dual_uplink();
        store.add_node(Node::new("edge", "edge", NodeType::Router));
        store.add_connection(Connection::new("c4", "isp1", "edge"));
        store.set_active_source(&id("c4"), &id("edge"));
        store.set_active_source(&id("c1"), &id("main"));
        store.set_active_source(&id("c2"), &id("main"));
        assert_eq!(flagged(&store), vec![id("c2"), id("c4")]);
    }

    #[test]
    fn flagged_connection_added_later_takes_the_slot() {
        let mut store = dual_uplink();
        store.set_active_source(&id("c1"), &id("main"));

        let mut late = Connection::new("c5", "isp2", "main");
        late.is_active_source = true;
        store.add_connection(late);

        assert_eq!(flagged(&store), vec![id("c5")]);
    }

    #[test]
    fn normalize_keeps_first_flagged_per_target() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("isp1", "isp1", NodeType::Internet));
        store.add_node(Node::new("isp2", "isp2", NodeType::Internet));
        store.add_node(Node::new("main", "main", NodeType::MainLink));
        store.add_connection(Connection::new("c1", "isp1", "main"));
        store.add_connection(Connection::new("c2", "isp2", "main"));
        // Simulate a bulk load that bypassed the arbiter.
        store.connections.modify_each(|c| c.is_active_source = true);

        assert_eq!(store.normalize_active_sources(), 1);
        assert_eq!(flagged(&store), vec![id("c1")]);
    }

    #[test]
    fn uplinks_arriving_after_their_connections_keep_one_active() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("main", "main", NodeType::MainLink));
        for (conn, source) in [("c1", "isp1"), ("c2", "isp2")] {
            let mut c = Connection::new(conn, source, "main");
            c.is_active_source = true;
            store.add_connection(c);
        }
        store.add_node(Node::new("isp1", "isp1", NodeType::Internet));
        store.add_node(Node::new("isp2", "isp2", NodeType::Internet));

        assert_eq!(flagged(&store), vec![id("c1")]);
        assert_eq!(store.status_overview().active_sources, vec![(id("main"), id("c1"))]);
    }

    #[test]
    fn flag_on_a_lan_link_is_not_an_active_uplink() {
        let mut store = dual_uplink();
        store.set_active_source(&id("c1"), &id("main"));
        store.connections.modify(&id("c3"), |c| c.is_active_source = true);

        let c1 = store.connection(&id("c1")).unwrap();
        let c3 = store.connection(&id("c3")).unwrap();
        assert!(store.is_active_uplink(&c1));
        assert!(!store.is_active_uplink(&c3));
        assert_eq!(store.active_source_for(&id("main")).unwrap().id, id("c1"));
    }

    #[test]
    fn promoting_a_node_to_uplink_renormalizes() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("isp", "isp", NodeType::Internet));
        store.add_node(Node::new("wan", "wan", NodeType::Router));
        store.add_node(Node::new("main", "main", NodeType::MainLink));
        let mut a = Connection::new("c1", "isp", "main");
        a.is_active_source = true;
        let mut b = Connection::new("c2", "wan", "main");
        b.is_active_source = true;
        store.add_connection(a);
        store.add_connection(b);
        assert_eq!(flagged(&store).len(), 2);

        let patch = crate::model::NodePatch {
            node_type: Some(NodeType::Internet),
            ..Default::default()
        };
        store.update_node(&id("wan"), &patch);
        assert_eq!(flagged(&store), vec![id("c1")]);
    }
}
