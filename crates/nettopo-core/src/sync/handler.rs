// ── Event application ──
//
// Applies decoded events to the store. Every transition is idempotent:
// creations for known ids, updates and deletes for unknown ids, and the
// echo of a local optimistic edit are all no-ops.

use chrono::Utc;
use tracing::{debug, trace};

use super::event::{SyncEnvelope, SyncEvent};
use crate::model::TopologySnapshot;
use crate::store::TopologyStore;

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// A duplicate, stale or gap event.
    Unchanged,
    /// An event with no effect on topology (keep-alive).
    Ignored,
}

impl Applied {
    fn from_changed(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::Unchanged }
    }
}

impl TopologyStore {
    /// Apply one event as a single mutation.
    pub fn apply_event(&mut self, event: &SyncEvent) -> Applied {
        let applied = match event {
            SyncEvent::NodeStatusUpdate(update) => {
                Applied::from_changed(self.update_node_status(update))
            }
            SyncEvent::BatchStatusUpdate(updates) => {
                Applied::from_changed(self.batch_update_node_status(updates) > 0)
            }
            SyncEvent::NodeCreated(node) => Applied::from_changed(self.add_node(node.clone())),
            SyncEvent::NodeUpdated { id, patch } => {
                Applied::from_changed(self.update_node(id, patch))
            }
            SyncEvent::NodeDeleted { id } => Applied::from_changed(self.remove_node(id)),
            SyncEvent::ConnectionCreated(conn) => {
                Applied::from_changed(self.add_connection(conn.clone()))
            }
            SyncEvent::ConnectionDeleted { id } => {
                Applied::from_changed(self.remove_connection(id))
            }
            SyncEvent::ConnectionActiveSourceChanged {
                connection_id,
                target_node_id,
            } => {
                let target = target_node_id.clone().or_else(|| {
                    self.connection(connection_id)
                        .map(|c| c.target_node_id.clone())
                });
                match target {
                    Some(target) => {
                        Applied::from_changed(self.set_active_source(connection_id, &target))
                    }
                    None => Applied::Unchanged,
                }
            }
            SyncEvent::GroupCreated(group) => Applied::from_changed(self.add_group(group.clone())),
            SyncEvent::GroupUpdated { id, patch } => {
                Applied::from_changed(self.update_group(id, patch))
            }
            SyncEvent::GroupDeleted { id } => Applied::from_changed(self.remove_group(id)),
            SyncEvent::GroupConnectionCreated(gc) => {
                Applied::from_changed(self.add_group_connection(gc.clone()))
            }
            SyncEvent::GroupConnectionDeleted { id } => {
                Applied::from_changed(self.remove_group_connection(id))
            }
            SyncEvent::NodeGroupChanged { node_id, group_id } => {
                Applied::from_changed(self.set_node_group(node_id, group_id.clone()))
            }
            SyncEvent::Ping => Applied::Ignored,
        };

        if applied == Applied::Unchanged {
            debug!(kind = %event.kind(), "event had no effect");
        } else {
            trace!(kind = %event.kind(), ?applied, "event applied");
        }
        applied
    }

    /// Apply an event and record when it was sent.
    pub fn apply_envelope(&mut self, envelope: &SyncEnvelope) -> Applied {
        let applied = self.apply_event(&envelope.event);
        self.record_event_time(envelope.timestamp.unwrap_or_else(Utc::now));
        applied
    }

    /// Replay a reconnect snapshot as idempotent creations.
    ///
    /// Entities already known are left as they are; only missing ones are
    /// added. Returns the number added. Groups go first so that members
    /// arrive with their group present, nodes before the edges between
    /// them.
    pub fn absorb_snapshot(&mut self, snapshot: TopologySnapshot) -> usize {
        let TopologySnapshot {
            nodes,
            connections,
            groups,
            group_connections,
        } = snapshot;

        let events = groups
            .into_iter()
            .map(SyncEvent::GroupCreated)
            .chain(nodes.into_iter().map(SyncEvent::NodeCreated))
            .chain(connections.into_iter().map(SyncEvent::ConnectionCreated))
            .chain(
                group_connections
                    .into_iter()
                    .map(SyncEvent::GroupConnectionCreated),
            );

        let added = events
            .filter(|event| self.apply_event(event) == Applied::Changed)
            .count();
        debug!(added, "reconnect snapshot absorbed");
        added
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        Connection, EntityId, Group, Node, NodePatch, NodeStatus, NodeStatusUpdate, NodeType,
    };
    use crate::sync::decode_event;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    #[test]
    fn creation_events_are_idempotent() {
        let mut store = TopologyStore::new();
        let event = SyncEvent::NodeCreated(Node::new("n1", "n1", NodeType::Router));
        assert_eq!(store.apply_event(&event), Applied::Changed);
        let snap = store.snapshot();
        assert_eq!(store.apply_event(&event), Applied::Unchanged);
        assert_eq!(store.snapshot(), snap);
    }

    #[test]
    fn update_and_delete_for_unknown_ids_are_noops() {
        let mut store = TopologyStore::new();
        let update = SyncEvent::NodeUpdated {
            id: id("ghost"),
            patch: NodePatch {
                name: Some("x".into()),
                ..NodePatch::default()
            },
        };
        assert_eq!(store.apply_event(&update), Applied::Unchanged);
        assert_eq!(
            store.apply_event(&SyncEvent::GroupDeleted { id: id("ghost") }),
            Applied::Unchanged
        );
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn ping_is_ignored() {
        let mut store = TopologyStore::new();
        assert_eq!(store.apply_event(&SyncEvent::Ping), Applied::Ignored);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn active_source_target_resolved_from_connection() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("isp1", "isp1", NodeType::Internet));
        store.add_node(Node::new("isp2", "isp2", NodeType::Internet));
        store.add_node(Node::new("main", "main", NodeType::MainLink));
        store.add_connection(Connection::new("c1", "isp1", "main"));
        store.add_connection(Connection::new("c2", "isp2", "main"));
        store.set_active_source(&id("c1"), &id("main"));

        let event = SyncEvent::ConnectionActiveSourceChanged {
            connection_id: id("c2"),
            target_node_id: None,
        };
        assert_eq!(store.apply_event(&event), Applied::Changed);
        assert_eq!(store.active_source_for(&id("main")).unwrap().id, id("c2"));

        let unknown = SyncEvent::ConnectionActiveSourceChanged {
            connection_id: id("c9"),
            target_node_id: None,
        };
        assert_eq!(store.apply_event(&unknown), Applied::Unchanged);
    }

    #[test]
    fn node_group_changed_moves_membership() {
        let mut store = TopologyStore::new();
        store.add_group(Group::new("g", "g"));
        store.add_node(Node::new("n", "n", NodeType::Server));
        let env = decode_event(r#"{"type":"NODE_GROUP_CHANGED","payload":{"nodeId":"n","groupId":"g"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(store.apply_envelope(&env), Applied::Changed);
        assert_eq!(store.members_of(&id("g")).count(), 1);
        assert!(store.last_event_at().is_some());
    }

    #[test]
    fn echo_of_optimistic_edit_is_noop() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("n", "n", NodeType::Server));
        let update = NodeStatusUpdate::new("n").status(NodeStatus::Online);
        store.update_node_status(&update);
        assert_eq!(
            store.apply_event(&SyncEvent::NodeStatusUpdate(update)),
            Applied::Unchanged
        );
    }

    #[test]
    fn absorb_snapshot_only_adds_missing() {
        let mut store = TopologyStore::new();
        store.add_node(Node::new("a", "local-name", NodeType::Server));

        let added = store.absorb_snapshot(TopologySnapshot {
            nodes: vec![
                Node::new("a", "server-name", NodeType::Server),
                Node::new("b", "b", NodeType::Server),
            ],
            connections: vec![Connection::new("ab", "a", "b")],
            groups: vec![Group::new("g", "g")],
            group_connections: vec![],
        });

        assert_eq!(added, 3);
        assert_eq!(store.node(&id("a")).unwrap().name, "local-name");
    }
}
