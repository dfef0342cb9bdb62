// ── Persistence collaborator ──
//
// The outbound half of the sync contract: every local mutation is mirrored
// to a backend through this trait. Failures are reported per call and
// never undo local state.

mod memory;

use std::future::Future;

use crate::error::CoreError;
use crate::model::{
    Connection, ConnectionPatch, EntityId, Group, GroupConnection, GroupGeometry, GroupPatch, Node,
    NodePatch, TopologySnapshot,
};

pub use memory::{MemoryPersistence, Operation};

/// Backend that stores the topology.
///
/// Creation methods return the entity as the backend stored it, which may
/// carry a server-assigned id. Non-success responses and transport
/// failures are both reported as [`CoreError::Persistence`].
pub trait Persistence: Send + Sync + 'static {
    fn fetch_topology(&self) -> impl Future<Output = Result<TopologySnapshot, CoreError>> + Send;

    // ── Nodes ────────────────────────────────────────────────────────

    fn create_node(&self, node: &Node) -> impl Future<Output = Result<Node, CoreError>> + Send;

    fn update_node(
        &self,
        id: &EntityId,
        patch: &NodePatch,
    ) -> impl Future<Output = Result<Node, CoreError>> + Send;

    fn delete_node(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn update_node_position(
        &self,
        id: &EntityId,
        x: f64,
        y: f64,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    // ── Connections ──────────────────────────────────────────────────

    fn create_connection(
        &self,
        connection: &Connection,
    ) -> impl Future<Output = Result<Connection, CoreError>> + Send;

    fn update_connection(
        &self,
        id: &EntityId,
        patch: &ConnectionPatch,
    ) -> impl Future<Output = Result<Connection, CoreError>> + Send;

    fn delete_connection(&self, id: &EntityId)
    -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Ask the backend to make `connection_id` the active uplink for its
    /// target. The backend broadcasts the resulting change.
    fn set_active_source(
        &self,
        connection_id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    // ── Groups ───────────────────────────────────────────────────────

    fn create_group(&self, group: &Group) -> impl Future<Output = Result<Group, CoreError>> + Send;

    fn update_group(
        &self,
        id: &EntityId,
        patch: &GroupPatch,
    ) -> impl Future<Output = Result<Group, CoreError>> + Send;

    fn delete_group(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn update_group_position(
        &self,
        id: &EntityId,
        geometry: &GroupGeometry,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    // ── Group connections ────────────────────────────────────────────

    fn create_group_connection(
        &self,
        connection: &GroupConnection,
    ) -> impl Future<Output = Result<GroupConnection, CoreError>> + Send;

    fn delete_group_connection(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}
