// ── Filter predicates for entity snapshots ──
//
// Lets consumers narrow a snapshot without going back to the store.

use crate::model::{Connection, EntityId, Node, NodeStatus, NodeType};

/// Filter predicate for node collections.
pub enum NodeFilter {
    All,
    ByType(NodeType),
    ByStatus(NodeStatus),
    InGroup(EntityId),
    Ungrouped,
    Reachable,
    Custom(Box<dyn Fn(&Node) -> bool + Send + Sync>),
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::All => true,
            Self::ByType(nt) => node.node_type == *nt,
            Self::ByStatus(st) => node.status == *st,
            Self::InGroup(gid) => node.group_id.as_ref() == Some(gid),
            Self::Ungrouped => node.group_id.is_none(),
            Self::Reachable => node.status.is_reachable(),
            Self::Custom(f) => f(node),
        }
    }
}

/// Filter predicate for connection collections.
pub enum ConnectionFilter {
    All,
    From(EntityId),
    To(EntityId),
    Touching(EntityId),
    /// Carries the `is_active_source` flag. Whether the source is an
    /// uplink needs the store; see `TopologyStore::is_active_uplink`.
    Flagged,
}

impl ConnectionFilter {
    pub fn matches(&self, connection: &Connection) -> bool {
        match self {
            Self::All => true,
            Self::From(id) => connection.source_node_id == *id,
            Self::To(id) => connection.target_node_id == *id,
            Self::Touching(id) => connection.touches(id),
            Self::Flagged => connection.is_active_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_filters() {
        let node = Node::new("n", "n", NodeType::Switch)
            .in_group("g")
            .with_status(NodeStatus::Degraded, NodeStatus::Unknown);

        assert!(NodeFilter::All.matches(&node));
        assert!(NodeFilter::ByType(NodeType::Switch).matches(&node));
        assert!(!NodeFilter::ByType(NodeType::Router).matches(&node));
        assert!(NodeFilter::InGroup(EntityId::from("g")).matches(&node));
        assert!(!NodeFilter::Ungrouped.matches(&node));
        assert!(NodeFilter::Reachable.matches(&node));
        assert!(NodeFilter::Custom(Box::new(|n| n.name == "n")).matches(&node));
    }

    #[test]
    fn connection_filters() {
        let conn = Connection::new("c", "a", "b");
        assert!(ConnectionFilter::From(EntityId::from("a")).matches(&conn));
        assert!(!ConnectionFilter::To(EntityId::from("a")).matches(&conn));
        assert!(ConnectionFilter::Touching(EntityId::from("b")).matches(&conn));
        assert!(!ConnectionFilter::Flagged.matches(&conn));
    }
}
