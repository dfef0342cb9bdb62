// ── In-process persistence ──
//
// A backend that keeps the topology in memory. Drives the CLI's offline
// mode and doubles as a test double with injectable failures.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use strum::Display;
use tracing::debug;

use super::Persistence;
use crate::error::CoreError;
use crate::model::{
    Connection, ConnectionPatch, EntityId, Group, GroupConnection, GroupGeometry, GroupPatch, Node,
    NodePatch, TopologySnapshot,
};
use crate::store::TopologyStore;

/// One persistence call, used to inject failures and inspect traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    FetchTopology,
    CreateNode,
    UpdateNode,
    DeleteNode,
    UpdateNodePosition,
    CreateConnection,
    UpdateConnection,
    DeleteConnection,
    SetActiveSource,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    UpdateGroupPosition,
    CreateGroupConnection,
    DeleteGroupConnection,
}

#[derive(Default)]
struct Faults {
    all: bool,
    ops: HashSet<Operation>,
    ids: HashSet<EntityId>,
}

/// In-memory [`Persistence`] implementation.
#[derive(Default)]
pub struct MemoryPersistence {
    state: Mutex<TopologyStore>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<Operation>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: TopologySnapshot) -> Self {
        Self {
            state: Mutex::new(TopologyStore::from_snapshot(snapshot)),
            ..Self::default()
        }
    }

    /// Make every call fail.
    pub fn fail_all(&self, enabled: bool) {
        locked(&self.faults).all = enabled;
    }

    /// Make every call of one kind fail.
    pub fn fail_on(&self, op: Operation) {
        locked(&self.faults).ops.insert(op);
    }

    /// Make every call addressing `id` fail.
    pub fn fail_for(&self, id: impl Into<EntityId>) {
        locked(&self.faults).ids.insert(id.into());
    }

    pub fn clear_failures(&self) {
        *locked(&self.faults) = Faults::default();
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        locked(&self.calls).clone()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        locked(&self.calls).iter().filter(|c| **c == op).count()
    }

    /// What the backend currently holds.
    pub fn snapshot(&self) -> TopologySnapshot {
        locked(&self.state).snapshot()
    }

    fn check(&self, op: Operation, id: Option<&EntityId>) -> Result<(), CoreError> {
        locked(&self.calls).push(op);
        let faults = locked(&self.faults);
        let injected =
            faults.all || faults.ops.contains(&op) || id.is_some_and(|id| faults.ids.contains(id));
        if injected {
            debug!(%op, "injected persistence failure");
            return Err(CoreError::persistence(format!("{op} failed")));
        }
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, TopologyStore> {
        locked(&self.state)
    }
}

fn duplicate(entity_type: &str, id: &EntityId) -> CoreError {
    CoreError::Validation {
        message: format!("{entity_type} {id} already exists"),
    }
}

impl Persistence for MemoryPersistence {
    async fn fetch_topology(&self) -> Result<TopologySnapshot, CoreError> {
        self.check(Operation::FetchTopology, None)?;
        Ok(self.state().snapshot())
    }

    async fn create_node(&self, node: &Node) -> Result<Node, CoreError> {
        self.check(Operation::CreateNode, Some(&node.id))?;
        if !self.state().add_node(node.clone()) {
            return Err(duplicate("node", &node.id));
        }
        Ok(node.clone())
    }

    async fn update_node(&self, id: &EntityId, patch: &NodePatch) -> Result<Node, CoreError> {
        self.check(Operation::UpdateNode, Some(id))?;
        let mut state = self.state();
        state.update_node(id, patch);
        state
            .node(id)
            .map(|n| (*n).clone())
            .ok_or_else(|| CoreError::not_found("node", id))
    }

    async fn delete_node(&self, id: &EntityId) -> Result<(), CoreError> {
        self.check(Operation::DeleteNode, Some(id))?;
        if !self.state().remove_node(id) {
            return Err(CoreError::not_found("node", id));
        }
        Ok(())
    }

    async fn update_node_position(&self, id: &EntityId, x: f64, y: f64) -> Result<(), CoreError> {
        self.check(Operation::UpdateNodePosition, Some(id))?;
        let mut state = self.state();
        if state.node(id).is_none() {
            return Err(CoreError::not_found("node", id));
        }
        state.set_node_position(id, x, y);
        Ok(())
    }

    async fn create_connection(&self, connection: &Connection) -> Result<Connection, CoreError> {
        self.check(Operation::CreateConnection, Some(&connection.id))?;
        if !self.state().add_connection(connection.clone()) {
            return Err(duplicate("connection", &connection.id));
        }
        Ok(connection.clone())
    }

    async fn update_connection(
        &self,
        id: &EntityId,
        patch: &ConnectionPatch,
    ) -> Result<Connection, CoreError> {
        self.check(Operation::UpdateConnection, Some(id))?;
        let mut state = self.state();
        state.update_connection(id, patch);
        state
            .connection(id)
            .map(|c| (*c).clone())
            .ok_or_else(|| CoreError::not_found("connection", id))
    }

    async fn delete_connection(&self, id: &EntityId) -> Result<(), CoreError> {
        self.check(Operation::DeleteConnection, Some(id))?;
        if !self.state().remove_connection(id) {
            return Err(CoreError::not_found("connection", id));
        }
        Ok(())
    }

    async fn set_active_source(&self, connection_id: &EntityId) -> Result<(), CoreError> {
        self.check(Operation::SetActiveSource, Some(connection_id))?;
        let mut state = self.state();
        let target = state
            .connection(connection_id)
            .map(|c| c.target_node_id.clone())
            .ok_or_else(|| CoreError::not_found("connection", connection_id))?;
        state.set_active_source(connection_id, &target);
        Ok(())
    }

    async fn create_group(&self, group: &Group) -> Result<Group, CoreError> {
        self.check(Operation::CreateGroup, Some(&group.id))?;
        if !self.state().add_group(group.clone()) {
            return Err(duplicate("group", &group.id));
        }
        Ok(group.clone())
    }

    async fn update_group(&self, id: &EntityId, patch: &GroupPatch) -> Result<Group, CoreError> {
        self.check(Operation::UpdateGroup, Some(id))?;
        let mut state = self.state();
        state.update_group(id, patch);
        state
            .group(id)
            .map(|g| (*g).clone())
            .ok_or_else(|| CoreError::not_found("group", id))
    }

    async fn delete_group(&self, id: &EntityId) -> Result<(), CoreError> {
        self.check(Operation::DeleteGroup, Some(id))?;
        if !self.state().remove_group(id) {
            return Err(CoreError::not_found("group", id));
        }
        Ok(())
    }

    async fn update_group_position(
        &self,
        id: &EntityId,
        geometry: &GroupGeometry,
    ) -> Result<(), CoreError> {
        self.check(Operation::UpdateGroupPosition, Some(id))?;
        let mut state = self.state();
        if state.group(id).is_none() {
            return Err(CoreError::not_found("group", id));
        }
        state.set_group_geometry(id, geometry);
        Ok(())
    }

    async fn create_group_connection(
        &self,
        connection: &GroupConnection,
    ) -> Result<GroupConnection, CoreError> {
        self.check(Operation::CreateGroupConnection, Some(&connection.id))?;
        if !self.state().add_group_connection(connection.clone()) {
            return Err(duplicate("group connection", &connection.id));
        }
        Ok(connection.clone())
    }

    async fn delete_group_connection(&self, id: &EntityId) -> Result<(), CoreError> {
        self.check(Operation::DeleteGroupConnection, Some(id))?;
        if !self.state().remove_group_connection(id) {
            return Err(CoreError::not_found("group connection", id));
        }
        Ok(())
    }
}
