// ── Inbound sync events ──
//
// Decoding of the `{ type, payload, timestamp }` wire envelope into a
// closed set of typed events.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    Connection, EntityId, Group, GroupConnection, GroupPatch, Node, NodePatch, NodeStatusUpdate,
};

/// Every event type the backend broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    NodeStatusUpdate,
    BatchStatusUpdate,
    NodeCreated,
    NodeUpdated,
    NodeDeleted,
    ConnectionCreated,
    ConnectionDeleted,
    ConnectionActiveSourceChanged,
    GroupCreated,
    GroupUpdated,
    GroupDeleted,
    GroupConnectionCreated,
    GroupConnectionDeleted,
    NodeGroupChanged,
    Ping,
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    NodeStatusUpdate(NodeStatusUpdate),
    BatchStatusUpdate(Vec<NodeStatusUpdate>),
    NodeCreated(Node),
    NodeUpdated {
        id: EntityId,
        patch: NodePatch,
    },
    NodeDeleted {
        id: EntityId,
    },
    ConnectionCreated(Connection),
    ConnectionDeleted {
        id: EntityId,
    },
    /// `target_node_id` is resolved from the connection when absent.
    ConnectionActiveSourceChanged {
        connection_id: EntityId,
        target_node_id: Option<EntityId>,
    },
    GroupCreated(Group),
    GroupUpdated {
        id: EntityId,
        patch: GroupPatch,
    },
    GroupDeleted {
        id: EntityId,
    },
    GroupConnectionCreated(GroupConnection),
    GroupConnectionDeleted {
        id: EntityId,
    },
    NodeGroupChanged {
        node_id: EntityId,
        group_id: Option<EntityId>,
    },
    Ping,
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NodeStatusUpdate(_) => EventKind::NodeStatusUpdate,
            Self::BatchStatusUpdate(_) => EventKind::BatchStatusUpdate,
            Self::NodeCreated(_) => EventKind::NodeCreated,
            Self::NodeUpdated { .. } => EventKind::NodeUpdated,
            Self::NodeDeleted { .. } => EventKind::NodeDeleted,
            Self::ConnectionCreated(_) => EventKind::ConnectionCreated,
            Self::ConnectionDeleted { .. } => EventKind::ConnectionDeleted,
            Self::ConnectionActiveSourceChanged { .. } => EventKind::ConnectionActiveSourceChanged,
            Self::GroupCreated(_) => EventKind::GroupCreated,
            Self::GroupUpdated { .. } => EventKind::GroupUpdated,
            Self::GroupDeleted { .. } => EventKind::GroupDeleted,
            Self::GroupConnectionCreated(_) => EventKind::GroupConnectionCreated,
            Self::GroupConnectionDeleted { .. } => EventKind::GroupConnectionDeleted,
            Self::NodeGroupChanged { .. } => EventKind::NodeGroupChanged,
            Self::Ping => EventKind::Ping,
        }
    }
}

/// A decoded event plus the backend's timestamp, when it sent one.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEnvelope {
    pub event: SyncEvent,
    pub timestamp: Option<DateTime<Utc>>,
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct IdPayload {
    id: EntityId,
}

#[derive(Debug, Deserialize)]
struct NodePatchPayload {
    id: EntityId,
    #[serde(flatten)]
    patch: NodePatch,
}

#[derive(Debug, Deserialize)]
struct GroupPatchPayload {
    id: EntityId,
    #[serde(flatten)]
    patch: GroupPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveSourcePayload {
    connection_id: EntityId,
    #[serde(default)]
    target_node_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeGroupPayload {
    node_id: EntityId,
    #[serde(default)]
    group_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchPayload {
    List(Vec<NodeStatusUpdate>),
    Wrapped { updates: Vec<NodeStatusUpdate> },
}

fn payload<T: DeserializeOwned>(kind: EventKind, value: Value) -> Result<T, CoreError> {
    serde_json::from_value(value).map_err(|e| CoreError::MalformedEvent {
        kind: kind.to_string(),
        message: e.to_string(),
    })
}

/// Decode one text frame.
///
/// Returns `Ok(None)` for an event type this client does not know, and
/// [`CoreError::MalformedEvent`] when the frame or its payload does not
/// have the expected shape.
pub fn decode_event(text: &str) -> Result<Option<SyncEnvelope>, CoreError> {
    let raw: RawEnvelope =
        serde_json::from_str(text).map_err(|e| CoreError::MalformedEvent {
            kind: "envelope".into(),
            message: e.to_string(),
        })?;

    let Ok(kind) = raw.kind.parse::<EventKind>() else {
        debug!(event_type = %raw.kind, "ignoring unknown event type");
        return Ok(None);
    };

    let value = raw.payload;
    let event = match kind {
        EventKind::NodeStatusUpdate => SyncEvent::NodeStatusUpdate(payload(kind, value)?),
        EventKind::BatchStatusUpdate => {
            let updates = match payload(kind, value)? {
                BatchPayload::List(updates) | BatchPayload::Wrapped { updates } => updates,
            };
            SyncEvent::BatchStatusUpdate(updates)
        }
        EventKind::NodeCreated => SyncEvent::NodeCreated(payload(kind, value)?),
        EventKind::NodeUpdated => {
            let NodePatchPayload { id, patch } = payload(kind, value)?;
            SyncEvent::NodeUpdated { id, patch }
        }
        EventKind::NodeDeleted => SyncEvent::NodeDeleted {
            id: payload::<IdPayload>(kind, value)?.id,
        },
        EventKind::ConnectionCreated => SyncEvent::ConnectionCreated(payload(kind, value)?),
        EventKind::ConnectionDeleted => SyncEvent::ConnectionDeleted {
            id: payload::<IdPayload>(kind, value)?.id,
        },
        EventKind::ConnectionActiveSourceChanged => {
            let ActiveSourcePayload {
                connection_id,
                target_node_id,
            } = payload(kind, value)?;
            SyncEvent::ConnectionActiveSourceChanged {
                connection_id,
                target_node_id,
            }
        }
        EventKind::GroupCreated => SyncEvent::GroupCreated(payload(kind, value)?),
        EventKind::GroupUpdated => {
            let GroupPatchPayload { id, patch } = payload(kind, value)?;
            SyncEvent::GroupUpdated { id, patch }
        }
        EventKind::GroupDeleted => SyncEvent::GroupDeleted {
            id: payload::<IdPayload>(kind, value)?.id,
        },
        EventKind::GroupConnectionCreated => {
            SyncEvent::GroupConnectionCreated(payload(kind, value)?)
        }
        EventKind::GroupConnectionDeleted => SyncEvent::GroupConnectionDeleted {
            id: payload::<IdPayload>(kind, value)?.id,
        },
        EventKind::NodeGroupChanged => {
            let NodeGroupPayload { node_id, group_id } = payload(kind, value)?;
            SyncEvent::NodeGroupChanged { node_id, group_id }
        }
        EventKind::Ping => SyncEvent::Ping,
    };

    Ok(Some(SyncEnvelope {
        event,
        timestamp: raw.timestamp,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::NodeStatus;

    fn decode(text: &str) -> SyncEvent {
        decode_event(text).unwrap().unwrap().event
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert!(
            decode_event(r#"{"type":"FIRMWARE_UPGRADED","payload":{}}"#)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = decode_event(r#"{"type":"NODE_DELETED","payload":{"nope":1}}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedEvent { ref kind, .. } if kind == "NODE_DELETED"));
    }

    #[test]
    fn garbage_frame_is_an_error() {
        assert!(matches!(
            decode_event("not json"),
            Err(CoreError::MalformedEvent { .. })
        ));
    }

    #[test]
    fn status_update_with_timestamp() {
        let env = decode_event(
            r#"{"type":"NODE_STATUS_UPDATE","payload":{"nodeId":"n1","status":"OFFLINE"},"timestamp":"2024-03-01T12:00:00Z"}"#,
        )
        .unwrap()
        .unwrap();
        let SyncEvent::NodeStatusUpdate(update) = env.event else {
            panic!("wrong variant");
        };
        assert_eq!(update.status, Some(NodeStatus::Offline));
        assert!(update.internet_status.is_none());
        assert!(env.timestamp.is_some());
    }

    #[test]
    fn batch_accepts_both_shapes() {
        let bare = decode(r#"{"type":"BATCH_STATUS_UPDATE","payload":[{"nodeId":"a"}]}"#);
        let wrapped = decode(
            r#"{"type":"BATCH_STATUS_UPDATE","payload":{"updates":[{"nodeId":"a"}]}}"#,
        );
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn node_updated_carries_patch() {
        let SyncEvent::NodeUpdated { id, patch } =
            decode(r#"{"type":"NODE_UPDATED","payload":{"id":"n1","name":"edge","groupId":null}}"#)
        else {
            panic!("wrong variant");
        };
        assert_eq!(id, EntityId::from("n1"));
        assert_eq!(patch.name.as_deref(), Some("edge"));
        assert_eq!(patch.group_id, Some(None));
    }

    #[test]
    fn active_source_target_is_optional() {
        assert_eq!(
            decode(r#"{"type":"CONNECTION_ACTIVE_SOURCE_CHANGED","payload":{"connectionId":"c1"}}"#),
            SyncEvent::ConnectionActiveSourceChanged {
                connection_id: EntityId::from("c1"),
                target_node_id: None,
            }
        );
    }

    #[test]
    fn ping_needs_no_payload() {
        assert_eq!(decode(r#"{"type":"PING"}"#), SyncEvent::Ping);
    }
}
