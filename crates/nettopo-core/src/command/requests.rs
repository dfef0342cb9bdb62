// ── Typed request structs for creation commands ──
//
// A request carries everything the user chose; the provisional id is
// minted when the request becomes an entity.

use serde::{Deserialize, Serialize};

use crate::model::{
    Connection, EntityId, Group, GroupConnection, MonitoringConfig, Node, NodeType,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<EntityId>,
    #[serde(flatten)]
    pub monitoring: MonitoringConfig,
}

impl CreateNodeRequest {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            position_x: 0.0,
            position_y: 0.0,
            group_id: None,
            monitoring: MonitoringConfig::default(),
        }
    }

    pub fn into_node(self) -> Node {
        let mut node = Node::new(EntityId::generate(), self.name, self.node_type)
            .at(self.position_x, self.position_y);
        node.group_id = self.group_id;
        node.monitoring = self.monitoring;
        node
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    pub source_node_id: EntityId,
    pub target_node_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl CreateConnectionRequest {
    pub fn new(source: impl Into<EntityId>, target: impl Into<EntityId>) -> Self {
        Self {
            source_node_id: source.into(),
            target_node_id: target.into(),
            label: None,
            bandwidth: None,
            color: None,
            animated: false,
        }
    }

    /// New connections never start as active source; that goes through
    /// `SetActiveSource`.
    pub fn into_connection(self) -> Connection {
        let mut conn = Connection::new(
            EntityId::generate(),
            self.source_node_id,
            self.target_node_id,
        );
        conn.label = self.label;
        conn.bandwidth = self.bandwidth;
        conn.color = self.color;
        conn.animated = self.animated;
        conn
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CreateGroupRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            position_x: 0.0,
            position_y: 0.0,
            width: None,
            height: None,
            color: None,
        }
    }

    pub fn into_group(self) -> Group {
        let mut group = Group::new(EntityId::generate(), self.name);
        group.description = self.description;
        group.position_x = self.position_x;
        group.position_y = self.position_y;
        if let Some(w) = self.width {
            group.width = w;
        }
        if let Some(h) = self.height {
            group.height = h;
        }
        group.color = self.color;
        group
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupConnectionRequest {
    pub source_group_id: EntityId,
    pub target_group_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl CreateGroupConnectionRequest {
    pub fn new(source: impl Into<EntityId>, target: impl Into<EntityId>) -> Self {
        Self {
            source_group_id: source.into(),
            target_group_id: target.into(),
            label: None,
            color: None,
            animated: false,
        }
    }

    pub fn into_group_connection(self) -> GroupConnection {
        let mut gc = GroupConnection::new(
            EntityId::generate(),
            self.source_group_id,
            self.target_group_id,
        );
        gc.label = self.label;
        gc.color = self.color;
        gc.animated = self.animated;
        gc
    }
}
