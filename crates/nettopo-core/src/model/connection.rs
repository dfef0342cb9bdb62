// ── Connection domain types ──

use serde::{Deserialize, Serialize};

use super::common::{double_option, merge_field, merge_nullable};
use super::entity_id::EntityId;

/// A directed edge between two nodes.
///
/// Endpoints may dangle (the node was deleted or has not arrived yet);
/// derived views skip such connections instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: EntityId,
    pub source_node_id: EntityId,
    pub target_node_id: EntityId,
    /// Only meaningful when the source node is an internet uplink.
    #[serde(default)]
    pub is_active_source: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub bandwidth: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl Connection {
    pub fn new(
        id: impl Into<EntityId>,
        source: impl Into<EntityId>,
        target: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: source.into(),
            target_node_id: target.into(),
            is_active_source: false,
            label: None,
            bandwidth: None,
            color: None,
            animated: false,
        }
    }

    pub fn touches(&self, node_id: &EntityId) -> bool {
        self.source_node_id == *node_id || self.target_node_id == *node_id
    }
}

/// Cosmetic connection edit.
///
/// No `is_active_source` field: the arbiter is the only writer of that
/// flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPatch {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub bandwidth: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl ConnectionPatch {
    pub fn apply(&self, connection: &mut Connection) {
        merge_nullable(&mut connection.label, self.label.as_ref());
        merge_nullable(&mut connection.bandwidth, self.bandwidth.as_ref());
        merge_nullable(&mut connection.color, self.color.as_ref());
        merge_field(&mut connection.animated, self.animated.as_ref());
    }
}

/// A directed edge between two groups. No exclusivity rules apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConnection {
    pub id: EntityId,
    pub source_group_id: EntityId,
    pub target_group_id: EntityId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl GroupConnection {
    pub fn new(
        id: impl Into<EntityId>,
        source: impl Into<EntityId>,
        target: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            source_group_id: source.into(),
            target_group_id: target.into(),
            label: None,
            color: None,
            animated: false,
        }
    }

    pub fn touches(&self, group_id: &EntityId) -> bool {
        self.source_group_id == *group_id || self.target_group_id == *group_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConnectionPatch {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl GroupConnectionPatch {
    pub fn apply(&self, connection: &mut GroupConnection) {
        merge_nullable(&mut connection.label, self.label.as_ref());
        merge_nullable(&mut connection.color, self.color.as_ref());
        merge_field(&mut connection.animated, self.animated.as_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connection_wire_shape() {
        let conn: Connection = serde_json::from_value(json!({
            "id": "c1",
            "sourceNodeId": "isp",
            "targetNodeId": "router",
            "isActiveSource": true,
            "bandwidth": "1G"
        }))
        .unwrap();
        assert!(conn.is_active_source);
        assert_eq!(conn.bandwidth.as_deref(), Some("1G"));
        assert!(!conn.animated);
    }

    #[test]
    fn patch_ignores_active_source_field() {
        let mut conn = Connection::new("c1", "a", "b");
        let patch: ConnectionPatch =
            serde_json::from_value(json!({ "isActiveSource": true, "color": "#ff0000" })).unwrap();
        patch.apply(&mut conn);
        assert!(!conn.is_active_source);
        assert_eq!(conn.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn touches_either_endpoint() {
        let conn = Connection::new("c1", "a", "b");
        assert!(conn.touches(&EntityId::from("a")));
        assert!(conn.touches(&EntityId::from("b")));
        assert!(!conn.touches(&EntityId::from("c")));
    }
}
