// ── Central topology store ──
//
// Authoritative client-side cache of nodes, connections, groups and group
// connections. Every public mutation is a complete logical operation:
// cascades run inside it and subscribers see a single publication at the
// end, never an intermediate state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::trace;

use super::collection::EntityCollection;
use super::ui_state::UiState;
use crate::model::{
    Connection, ConnectionPatch, EntityId, Group, GroupConnection, GroupConnectionPatch,
    GroupGeometry, GroupPatch, Node, NodePatch, NodeStatusUpdate, TopologySnapshot,
};
use crate::stream::EntityStream;

/// Central store for the synchronized topology plus local UI state.
///
/// Mutations take `&mut self`: there is exactly one writer at a time (a
/// user action or an inbound event), so consistency needs no locking of
/// its own. Every mutation returns whether the state changed.
pub struct TopologyStore {
    pub(crate) nodes: EntityCollection<Node>,
    pub(crate) connections: EntityCollection<Connection>,
    pub(crate) groups: EntityCollection<Group>,
    pub(crate) group_connections: EntityCollection<GroupConnection>,
    pub(crate) ui: UiState,
    pub(crate) revision: watch::Sender<u64>,
    pub(crate) last_event_at: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        let (last_event_at, _) = watch::channel(None);

        Self {
            nodes: EntityCollection::new(),
            connections: EntityCollection::new(),
            groups: EntityCollection::new(),
            group_connections: EntityCollection::new(),
            ui: UiState::default(),
            revision,
            last_event_at,
        }
    }

    /// Build a store pre-populated from a snapshot.
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Self {
        let mut store = Self::new();
        store.replace_all(snapshot);
        store
    }

    // ── Nodes ────────────────────────────────────────────────────────

    /// Add a node unless one with the same id exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        let uplink = node.is_internet();
        let changed = self.nodes.insert_new(node.id.clone(), node);
        // Flagged connections may have arrived while this source was
        // still dangling.
        if changed && uplink {
            self.normalize_active_sources_inner();
        }
        self.publish();
        changed
    }

    /// Merge a field-level edit into an existing node.
    pub fn update_node(&mut self, id: &EntityId, patch: &NodePatch) -> bool {
        let changed = self.nodes.modify(id, |node| patch.apply(node));
        // A node that just became an uplink may now source several
        // flagged connections.
        if changed && patch.node_type.is_some() {
            self.normalize_active_sources_inner();
        }
        self.publish();
        changed
    }

    /// Delete a node and every connection touching it. Groups are left
    /// alone.
    pub fn remove_node(&mut self, id: &EntityId) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        self.ui.forget(id);
        let dropped = self.connections.remove_where(|c| c.touches(id));
        for conn in &dropped {
            self.ui.forget(&conn.id);
        }
        trace!(node_id = %id, cascaded = dropped.len(), "node removed");
        self.publish();
        true
    }

    /// Move a node into a group, or out of any group with `None`.
    pub fn set_node_group(&mut self, node_id: &EntityId, group_id: Option<EntityId>) -> bool {
        let changed = self.nodes.modify(node_id, |node| node.group_id = group_id);
        self.publish();
        changed
    }

    pub fn set_node_position(&mut self, id: &EntityId, x: f64, y: f64) -> bool {
        let changed = self.nodes.modify(id, |node| {
            node.position_x = x;
            node.position_y = y;
        });
        self.publish();
        changed
    }

    /// Apply one live status report. Absent fields keep their value.
    pub fn update_node_status(&mut self, update: &NodeStatusUpdate) -> bool {
        let changed = self.nodes.modify(&update.node_id, |node| update.apply(node));
        self.publish();
        changed
    }

    /// Apply many status reports as one mutation.
    ///
    /// The updates are folded into an id-keyed map once, then the node
    /// collection is walked once, so the cost is O(nodes + updates).
    /// Several reports for the same node combine, later fields winning.
    /// Returns the number of nodes that changed.
    pub fn batch_update_node_status(&mut self, updates: &[NodeStatusUpdate]) -> usize {
        if updates.is_empty() {
            return 0;
        }
        let mut by_node: HashMap<&EntityId, NodeStatusUpdate> =
            HashMap::with_capacity(updates.len());
        for update in updates {
            by_node
                .entry(&update.node_id)
                .and_modify(|existing| existing.absorb(update))
                .or_insert_with(|| update.clone());
        }

        let changed = self.nodes.modify_each(|node| {
            if let Some(update) = by_node.get(&node.id) {
                update.apply(node);
            }
        });
        trace!(updates = updates.len(), changed, "batch status applied");
        self.publish();
        changed
    }

    // ── Connections ──────────────────────────────────────────────────

    /// Add a connection unless one with the same id exists.
    ///
    /// A connection from an uplink arriving already flagged as active
    /// source takes over the slot, as if `set_active_source` had been
    /// called for it.
    pub fn add_connection(&mut self, connection: Connection) -> bool {
        let id = connection.id.clone();
        let claims = connection.is_active_source && self.is_internet(&connection.source_node_id);
        let target = connection.target_node_id.clone();
        let changed = self.connections.insert_new(id.clone(), connection);
        if changed && claims {
            self.claim_active_source(&id, &target);
        }
        self.publish();
        changed
    }

    /// Merge a cosmetic edit. Never touches `is_active_source`.
    pub fn update_connection(&mut self, id: &EntityId, patch: &ConnectionPatch) -> bool {
        let changed = self.connections.modify(id, |conn| patch.apply(conn));
        self.publish();
        changed
    }

    pub fn remove_connection(&mut self, id: &EntityId) -> bool {
        if self.connections.remove(id).is_none() {
            return false;
        }
        self.ui.forget(id);
        self.publish();
        true
    }

    // ── Groups ───────────────────────────────────────────────────────

    pub fn add_group(&mut self, group: Group) -> bool {
        let changed = self.groups.insert_new(group.id.clone(), group);
        self.publish();
        changed
    }

    pub fn update_group(&mut self, id: &EntityId, patch: &GroupPatch) -> bool {
        let changed = self.groups.modify(id, |group| patch.apply(group));
        self.publish();
        changed
    }

    pub fn set_group_geometry(&mut self, id: &EntityId, geometry: &GroupGeometry) -> bool {
        let changed = self.groups.modify(id, |group| geometry.apply(group));
        self.publish();
        changed
    }

    /// Delete a group. Its group connections go with it; its members stay
    /// and become ungrouped.
    pub fn remove_group(&mut self, id: &EntityId) -> bool {
        if self.groups.remove(id).is_none() {
            return false;
        }
        self.ui.forget(id);
        let dropped = self.group_connections.remove_where(|gc| gc.touches(id));
        for gc in &dropped {
            self.ui.forget(&gc.id);
        }
        let released = self.nodes.modify_each(|node| {
            if node.group_id.as_ref() == Some(id) {
                node.group_id = None;
            }
        });
        trace!(group_id = %id, cascaded = dropped.len(), released, "group removed");
        self.publish();
        true
    }

    // ── Group connections ────────────────────────────────────────────

    pub fn add_group_connection(&mut self, connection: GroupConnection) -> bool {
        let changed = self
            .group_connections
            .insert_new(connection.id.clone(), connection);
        self.publish();
        changed
    }

    pub fn update_group_connection(
        &mut self,
        id: &EntityId,
        patch: &GroupConnectionPatch,
    ) -> bool {
        let changed = self.group_connections.modify(id, |gc| patch.apply(gc));
        self.publish();
        changed
    }

    pub fn remove_group_connection(&mut self, id: &EntityId) -> bool {
        if self.group_connections.remove(id).is_none() {
            return false;
        }
        self.ui.forget(id);
        self.publish();
        true
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn node(&self, id: &EntityId) -> Option<Arc<Node>> {
        self.nodes.get(id)
    }

    pub fn connection(&self, id: &EntityId) -> Option<Arc<Connection>> {
        self.connections.get(id)
    }

    pub fn group(&self, id: &EntityId) -> Option<Arc<Group>> {
        self.groups.get(id)
    }

    pub fn group_connection(&self, id: &EntityId) -> Option<Arc<GroupConnection>> {
        self.group_connections.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn group_connections(&self) -> impl Iterator<Item = &GroupConnection> {
        self.group_connections.values()
    }

    /// Members of a group, found by scanning node back-references.
    pub fn members_of<'a>(&'a self, group_id: &'a EntityId) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .values()
            .filter(move |node| node.group_id.as_ref() == Some(group_id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_connection_count(&self) -> usize {
        self.group_connections.len()
    }

    /// Owned copy of the whole topology.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            nodes: self.nodes.values().cloned().collect(),
            connections: self.connections.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            group_connections: self.group_connections.values().cloned().collect(),
        }
    }

    // ── UI state ─────────────────────────────────────────────────────

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_nodes(&self) -> EntityStream<Node> {
        EntityStream::new(self.nodes.subscribe())
    }

    pub fn subscribe_connections(&self) -> EntityStream<Connection> {
        EntityStream::new(self.connections.subscribe())
    }

    pub fn subscribe_groups(&self) -> EntityStream<Group> {
        EntityStream::new(self.groups.subscribe())
    }

    pub fn subscribe_group_connections(&self) -> EntityStream<GroupConnection> {
        EntityStream::new(self.group_connections.subscribe())
    }

    /// Receiver that ticks once per published mutation.
    pub fn subscribe_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn nodes_snapshot(&self) -> Arc<Vec<Arc<Node>>> {
        self.nodes.snapshot()
    }

    pub fn connections_snapshot(&self) -> Arc<Vec<Arc<Connection>>> {
        self.connections.snapshot()
    }

    pub fn groups_snapshot(&self) -> Arc<Vec<Arc<Group>>> {
        self.groups.snapshot()
    }

    pub fn group_connections_snapshot(&self) -> Arc<Vec<Arc<GroupConnection>>> {
        self.group_connections.snapshot()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// Monotonic counter of published mutations.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        *self.last_event_at.borrow()
    }

    pub(crate) fn record_event_time(&self, at: DateTime<Utc>) {
        self.last_event_at.send_replace(Some(at));
    }

    /// Publish every dirty collection; bump the revision if any was.
    pub(crate) fn publish(&mut self) {
        let mut any = self.nodes.publish();
        any |= self.connections.publish();
        any |= self.groups.publish();
        any |= self.group_connections.publish();
        if any {
            self.revision.send_modify(|r| *r += 1);
        }
    }
}

impl NodeStatusUpdate {
    /// Fold a later report for the same node into this one.
    fn absorb(&mut self, later: &Self) {
        if later.status.is_some() {
            self.status = later.status;
        }
        if later.internet_status.is_some() {
            self.internet_status = later.internet_status;
        }
        if later.latency.is_some() {
            self.latency = later.latency;
        }
        if later.last_seen.is_some() {
            self.last_seen = later.last_seen;
        }
        if later.internet_last_check.is_some() {
            self.internet_last_check = later.internet_last_check;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{NodeStatus, NodeType};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn server(key: &str) -> Node {
        Node::new(key, key, NodeType::Server)
    }

    #[test]
    fn add_node_twice_keeps_first() {
        let mut store = TopologyStore::new();
        assert!(store.add_node(server("n1").at(1.0, 1.0)));
        let before = store.snapshot();

        assert!(!store.add_node(server("n1").at(9.0, 9.0)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn update_absent_node_is_noop() {
        let mut store = TopologyStore::new();
        let patch = NodePatch {
            name: Some("ghost".into()),
            ..NodePatch::default()
        };
        assert!(!store.update_node(&id("missing"), &patch));
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn remove_node_cascades_to_its_connections_only() {
        let mut store = TopologyStore::new();
        for key in ["a", "b", "c"] {
            store.add_node(server(key));
        }
        store.add_connection(Connection::new("ab", "a", "b"));
        store.add_connection(Connection::new("bc", "b", "c"));
        store.add_connection(Connection::new("ca", "c", "a"));

        assert!(store.remove_node(&id("a")));

        let remaining: Vec<_> = store.connections().map(|c| c.id.clone()).collect();
        assert_eq!(remaining, vec![id("bc")]);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn remove_node_clears_selection() {
        let mut store = TopologyStore::new();
        store.add_node(server("a"));
        store.add_node(server("b"));
        store.add_connection(Connection::new("ab", "a", "b"));
        store.ui_mut().select_connection(id("ab"));

        store.remove_node(&id("b"));
        assert!(store.ui().selected_connection.is_none());
    }

    #[test]
    fn remove_node_leaves_group_intact() {
        let mut store = TopologyStore::new();
        store.add_group(Group::new("g1", "core"));
        store.add_node(server("a").in_group("g1"));
        store.add_node(server("b").in_group("g1"));

        store.remove_node(&id("a"));
        assert!(store.group(&id("g1")).is_some());
        assert_eq!(store.members_of(&id("g1")).count(), 1);
    }

    #[test]
    fn remove_group_releases_members_and_drops_links() {
        let mut store = TopologyStore::new();
        store.add_group(Group::new("g1", "core"));
        store.add_group(Group::new("g2", "edge"));
        store.add_group(Group::new("g3", "dmz"));
        store.add_node(server("a").in_group("g1"));
        store.add_node(server("b").in_group("g2"));
        store.add_node(server("c"));
        store.add_group_connection(GroupConnection::new("gc12", "g1", "g2"));
        store.add_group_connection(GroupConnection::new("gc23", "g2", "g3"));
        store.ui_mut().select_group(id("g1"));

        assert!(store.remove_group(&id("g1")));

        assert!(store.node(&id("a")).unwrap().group_id.is_none());
        assert_eq!(store.node(&id("b")).unwrap().group_id, Some(id("g2")));
        assert!(store.node(&id("c")).unwrap().group_id.is_none());
        let links: Vec<_> = store.group_connections().map(|g| g.id.clone()).collect();
        assert_eq!(links, vec![id("gc23")]);
        assert_eq!(store.node_count(), 3);
        assert!(store.ui().selected_group.is_none());
    }

    #[test]
    fn removing_absent_entities_is_noop() {
        let mut store = TopologyStore::new();
        assert!(!store.remove_node(&id("x")));
        assert!(!store.remove_group(&id("x")));
        assert!(!store.remove_connection(&id("x")));
        assert!(!store.remove_group_connection(&id("x")));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn batch_status_merges_field_by_field() {
        let mut store = TopologyStore::new();
        store.add_node(server("n1").with_status(NodeStatus::Online, NodeStatus::Online));
        store.add_node(server("n2").with_status(NodeStatus::Online, NodeStatus::Offline));
        let before = store.revision();

        let changed = store.batch_update_node_status(&[
            NodeStatusUpdate::new("n1").status(NodeStatus::Offline),
            NodeStatusUpdate::new("n2").internet_status(NodeStatus::Online),
        ]);

        assert_eq!(changed, 2);
        let n1 = store.node(&id("n1")).unwrap();
        assert_eq!((n1.status, n1.internet_status), (NodeStatus::Offline, NodeStatus::Online));
        let n2 = store.node(&id("n2")).unwrap();
        assert_eq!((n2.status, n2.internet_status), (NodeStatus::Online, NodeStatus::Online));
        assert_eq!(store.revision(), before + 1, "batch publishes once");
    }

    #[test]
    fn batch_status_combines_reports_for_one_node() {
        let mut store = TopologyStore::new();
        store.add_node(server("n1"));

        store.batch_update_node_status(&[
            NodeStatusUpdate::new("n1").status(NodeStatus::Degraded),
            NodeStatusUpdate::new("n1").internet_status(NodeStatus::Online),
            NodeStatusUpdate::new("ghost").status(NodeStatus::Offline),
        ]);

        let n1 = store.node(&id("n1")).unwrap();
        assert_eq!(n1.status, NodeStatus::Degraded);
        assert_eq!(n1.internet_status, NodeStatus::Online);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn subscribers_see_published_snapshots() {
        let mut store = TopologyStore::new();
        let stream = store.subscribe_nodes();
        store.add_node(server("a"));
        assert_eq!(stream.latest().len(), 1);
        assert!(stream.current().is_empty());
    }

    #[test]
    fn set_node_group_on_absent_node_is_noop() {
        let mut store = TopologyStore::new();
        assert!(!store.set_node_group(&id("n"), Some(id("g"))));
    }
}
