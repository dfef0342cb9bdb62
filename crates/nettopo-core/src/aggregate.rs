// ── Status aggregation ──
//
// Derived display statuses, computed on read from the current store
// contents. Nothing here is ever stored.

use serde::Serialize;
use strum::Display;

use crate::model::{Connection, EntityId, Node, NodeStatus};
use crate::store::TopologyStore;

/// State of a connection sourced at an internet uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UplinkState {
    /// Up and currently carrying traffic.
    Active,
    /// Up but not the selected source.
    Standby,
    Offline,
}

/// Display status of a node-to-node connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Uplink { state: UplinkState },
    Offline,
    Degraded,
    /// Both endpoints healthy; drawn in the connection's own color.
    Normal { color: Option<String> },
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uplink { state } => write!(f, "UPLINK_{state}"),
            Self::Offline => f.write_str("OFFLINE"),
            Self::Degraded => f.write_str("DEGRADED"),
            Self::Normal { .. } => f.write_str("NORMAL"),
        }
    }
}

/// Aggregate status of a group, derived from its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    /// At least one member has internet connectivity.
    Internet,
    /// Some member is reachable, none has internet.
    Local,
    /// Every member is offline.
    Offline,
    Unknown,
}

fn uplink_is_up(source: &Node) -> bool {
    match source.internet_status {
        NodeStatus::Online | NodeStatus::Degraded => true,
        NodeStatus::Unknown => source.status.is_reachable(),
        NodeStatus::Offline => false,
    }
}

/// Status of `connection` given its resolved endpoints.
///
/// Returns `None` when either endpoint is missing, which excludes the
/// connection from derived views.
pub fn connection_status(
    connection: &Connection,
    source: Option<&Node>,
    target: Option<&Node>,
) -> Option<ConnectionStatus> {
    let (source, target) = (source?, target?);

    if source.is_internet() {
        let state = match (uplink_is_up(source), connection.is_active_source) {
            (false, _) => UplinkState::Offline,
            (true, true) => UplinkState::Active,
            (true, false) => UplinkState::Standby,
        };
        return Some(ConnectionStatus::Uplink { state });
    }

    let either = |s: NodeStatus| source.status == s || target.status == s;
    let status = if either(NodeStatus::Offline) {
        ConnectionStatus::Offline
    } else if either(NodeStatus::Degraded) {
        ConnectionStatus::Degraded
    } else {
        ConnectionStatus::Normal {
            color: connection.color.clone(),
        }
    };
    Some(status)
}

/// Status of a group from its members, with internet dominating.
pub fn group_status<'a>(members: impl IntoIterator<Item = &'a Node>) -> GroupStatus {
    let mut any = false;
    let mut any_reachable = false;
    let mut all_offline = true;

    for node in members {
        any = true;
        if node.has_internet() {
            return GroupStatus::Internet;
        }
        if node.status.is_reachable() {
            any_reachable = true;
        }
        if node.status != NodeStatus::Offline {
            all_offline = false;
        }
    }

    if !any {
        GroupStatus::Unknown
    } else if any_reachable {
        GroupStatus::Local
    } else if all_offline {
        GroupStatus::Offline
    } else {
        GroupStatus::Unknown
    }
}

/// Status of a group-to-group edge from its endpoint statuses.
pub fn group_connection_status(a: GroupStatus, b: GroupStatus) -> GroupStatus {
    use GroupStatus::{Internet, Local, Offline, Unknown};
    match (a, b) {
        (Offline, Offline) => Offline,
        (Internet, _) | (_, Internet) => Internet,
        (Local, _) | (_, Local) => Local,
        _ => Unknown,
    }
}

// ── Store views ─────────────────────────────────────────────────────

/// Every derivable status in one pass, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverview {
    pub connections: Vec<(EntityId, ConnectionStatus)>,
    pub groups: Vec<(EntityId, GroupStatus)>,
    pub group_connections: Vec<(EntityId, GroupStatus)>,
    /// Target node id → active uplink connection id.
    pub active_sources: Vec<(EntityId, EntityId)>,
}

impl TopologyStore {
    pub fn connection_status(&self, id: &EntityId) -> Option<ConnectionStatus> {
        let conn = self.connections.get_ref(id)?;
        connection_status(
            conn,
            self.nodes.get_ref(&conn.source_node_id),
            self.nodes.get_ref(&conn.target_node_id),
        )
    }

    /// `None` only when the group itself is unknown.
    pub fn group_status(&self, id: &EntityId) -> Option<GroupStatus> {
        self.groups.contains(id).then(|| group_status(self.members_of(id)))
    }

    /// `None` when either endpoint group is missing.
    pub fn group_connection_status(&self, id: &EntityId) -> Option<GroupStatus> {
        let gc = self.group_connections.get_ref(id)?;
        let a = self.group_status(&gc.source_group_id)?;
        let b = self.group_status(&gc.target_group_id)?;
        Some(group_connection_status(a, b))
    }

    pub fn status_overview(&self) -> StatusOverview {
        let connections = self
            .connections
            .values()
            .filter_map(|c| self.connection_status(&c.id).map(|s| (c.id.clone(), s)))
            .collect();
        let groups = self
            .groups
            .values()
            .map(|g| (g.id.clone(), group_status(self.members_of(&g.id))))
            .collect();
        let group_connections = self
            .group_connections
            .values()
            .filter_map(|gc| {
                self.group_connection_status(&gc.id)
                    .map(|s| (gc.id.clone(), s))
            })
            .collect();
        let active_sources = self
            .connections
            .values()
            .filter(|c| self.is_active_uplink(c))
            .map(|c| (c.target_node_id.clone(), c.id.clone()))
            .collect();

        StatusOverview {
            connections,
            groups,
            group_connections,
            active_sources,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Group, GroupConnection, NodeType};

    fn node(status: NodeStatus, internet: NodeStatus) -> Node {
        Node::new("n", "n", NodeType::Server).with_status(status, internet)
    }

    fn uplink(status: NodeStatus, internet: NodeStatus) -> Node {
        Node::new("isp", "isp", NodeType::Internet).with_status(status, internet)
    }

    #[test]
    fn missing_endpoint_yields_none() {
        let conn = Connection::new("c", "a", "b");
        let a = node(NodeStatus::Online, NodeStatus::Unknown);
        assert_eq!(connection_status(&conn, Some(&a), None), None);
        assert_eq!(connection_status(&conn, None, Some(&a)), None);
    }

    #[test]
    fn uplink_states() {
        let target = node(NodeStatus::Online, NodeStatus::Unknown);
        let mut conn = Connection::new("c", "isp", "n");

        let up = uplink(NodeStatus::Offline, NodeStatus::Online);
        assert_eq!(
            connection_status(&conn, Some(&up), Some(&target)),
            Some(ConnectionStatus::Uplink {
                state: UplinkState::Standby
            })
        );

        conn.is_active_source = true;
        assert_eq!(
            connection_status(&conn, Some(&up), Some(&target)),
            Some(ConnectionStatus::Uplink {
                state: UplinkState::Active
            })
        );

        let down = uplink(NodeStatus::Online, NodeStatus::Offline);
        assert_eq!(
            connection_status(&conn, Some(&down), Some(&target)),
            Some(ConnectionStatus::Uplink {
                state: UplinkState::Offline
            })
        );
    }

    #[test]
    fn uplink_falls_back_to_status_when_internet_unknown() {
        let target = node(NodeStatus::Online, NodeStatus::Unknown);
        let conn = Connection::new("c", "isp", "n");

        let degraded = uplink(NodeStatus::Degraded, NodeStatus::Unknown);
        assert_eq!(
            connection_status(&conn, Some(&degraded), Some(&target)),
            Some(ConnectionStatus::Uplink {
                state: UplinkState::Standby
            })
        );

        let dark = uplink(NodeStatus::Unknown, NodeStatus::Unknown);
        assert_eq!(
            connection_status(&conn, Some(&dark), Some(&target)),
            Some(ConnectionStatus::Uplink {
                state: UplinkState::Offline
            })
        );
    }

    #[test]
    fn plain_connection_precedence() {
        let mut conn = Connection::new("c", "a", "b");
        conn.color = Some("#00ff00".into());
        let online = node(NodeStatus::Online, NodeStatus::Unknown);
        let degraded = node(NodeStatus::Degraded, NodeStatus::Unknown);
        let offline = node(NodeStatus::Offline, NodeStatus::Unknown);

        assert_eq!(
            connection_status(&conn, Some(&degraded), Some(&offline)),
            Some(ConnectionStatus::Offline)
        );
        assert_eq!(
            connection_status(&conn, Some(&online), Some(&degraded)),
            Some(ConnectionStatus::Degraded)
        );
        assert_eq!(
            connection_status(&conn, Some(&online), Some(&online)),
            Some(ConnectionStatus::Normal {
                color: Some("#00ff00".into())
            })
        );
    }

    #[test]
    fn group_status_precedence() {
        assert_eq!(group_status(&Vec::<Node>::new()), GroupStatus::Unknown);

        let mut members = vec![node(NodeStatus::Offline, NodeStatus::Unknown); 5];
        assert_eq!(group_status(&members), GroupStatus::Offline);

        members.push(node(NodeStatus::Unknown, NodeStatus::Unknown));
        assert_eq!(group_status(&members), GroupStatus::Unknown);

        members.push(node(NodeStatus::Degraded, NodeStatus::Offline));
        assert_eq!(group_status(&members), GroupStatus::Local);

        members.push(node(NodeStatus::Offline, NodeStatus::Online));
        assert_eq!(group_status(&members), GroupStatus::Internet);
    }

    #[test]
    fn reachable_uplink_gives_internet() {
        let members = [
            node(NodeStatus::Offline, NodeStatus::Unknown),
            uplink(NodeStatus::Online, NodeStatus::Unknown),
        ];
        assert_eq!(group_status(&members), GroupStatus::Internet);
    }

    #[test]
    fn group_connection_precedence() {
        use GroupStatus::{Internet, Local, Offline, Unknown};
        assert_eq!(group_connection_status(Offline, Offline), Offline);
        assert_eq!(group_connection_status(Offline, Internet), Internet);
        assert_eq!(group_connection_status(Local, Unknown), Local);
        assert_eq!(group_connection_status(Offline, Unknown), Unknown);
    }

    #[test]
    fn store_views_skip_dangling_references() {
        let mut store = TopologyStore::new();
        store.add_group(Group::new("g1", "core"));
        store.add_node(
            Node::new("a", "a", NodeType::Server)
                .in_group("g1")
                .with_status(NodeStatus::Online, NodeStatus::Unknown),
        );
        store.add_connection(Connection::new("dangling", "a", "ghost"));
        store.add_group_connection(GroupConnection::new("gc", "g1", "g-missing"));

        let overview = store.status_overview();
        assert!(overview.connections.is_empty());
        assert!(overview.group_connections.is_empty());
        assert_eq!(
            overview.groups,
            vec![(EntityId::from("g1"), GroupStatus::Local)]
        );
        assert_eq!(store.group_status(&EntityId::from("nope")), None);
    }
}
