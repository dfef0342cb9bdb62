// ── Command API ──
//
// Every user-initiated write flows through one `Command` enum. The
// controller applies it to the store first, then mirrors it to the
// persistence collaborator.

pub mod requests;

use crate::model::{
    Connection, ConnectionPatch, EntityId, Group, GroupConnection, GroupGeometry, GroupPatch, Node,
    NodePatch,
};

pub use requests::{
    CreateConnectionRequest, CreateGroupConnectionRequest, CreateGroupRequest, CreateNodeRequest,
};

/// All user actions against the topology.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Nodes ────────────────────────────────────────────────────────
    CreateNode(CreateNodeRequest),
    UpdateNode {
        id: EntityId,
        patch: NodePatch,
    },
    DeleteNode {
        id: EntityId,
    },
    MoveNode {
        id: EntityId,
        x: f64,
        y: f64,
    },
    AssignNodeToGroup {
        node_id: EntityId,
        group_id: Option<EntityId>,
    },

    // ── Connections ──────────────────────────────────────────────────
    CreateConnection(CreateConnectionRequest),
    UpdateConnection {
        id: EntityId,
        patch: ConnectionPatch,
    },
    DeleteConnection {
        id: EntityId,
    },
    SetActiveSource {
        connection_id: EntityId,
    },

    // ── Groups ───────────────────────────────────────────────────────
    CreateGroup(CreateGroupRequest),
    UpdateGroup {
        id: EntityId,
        patch: GroupPatch,
    },
    DeleteGroup {
        id: EntityId,
    },
    MoveGroup {
        id: EntityId,
        geometry: GroupGeometry,
    },

    // ── Group connections ────────────────────────────────────────────
    CreateGroupConnection(CreateGroupConnectionRequest),
    DeleteGroupConnection {
        id: EntityId,
    },
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    Node(Node),
    Connection(Connection),
    Group(Group),
    GroupConnection(GroupConnection),
}
