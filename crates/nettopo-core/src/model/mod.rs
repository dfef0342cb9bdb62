// ── Topology domain model ──
//
// Every type in this module is the canonical representation of a topology
// entity, shared by the store, the sync protocol, the persistence
// collaborator and the CLI's on-disk format.

pub mod common;
pub mod connection;
pub mod entity_id;
pub mod group;
pub mod node;

use serde::{Deserialize, Serialize};

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::{NodeStatus, double_option};
pub use connection::{Connection, ConnectionPatch, GroupConnection, GroupConnectionPatch};
pub use entity_id::EntityId;
pub use group::{Group, GroupGeometry, GroupPatch};
pub use node::{
    MonitoringConfig, MonitoringMethod, MonitoringPatch, Node, NodePatch, NodeStatusUpdate,
    NodeType,
};

/// The full topology, as returned by the persistence collaborator's
/// fetch and as stored on disk by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub group_connections: Vec<GroupConnection>,
}

impl TopologySnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.connections.is_empty()
            && self.groups.is_empty()
            && self.group_connections.is_empty()
    }
}
