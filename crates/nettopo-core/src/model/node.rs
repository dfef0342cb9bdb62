// ── Node domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::common::{NodeStatus, double_option, merge_field, merge_nullable};
use super::entity_id::EntityId;

/// What kind of thing a node represents on the canvas.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NodeType {
    Probe,
    Router,
    Switch,
    Server,
    AccessPoint,
    Firewall,
    Camera,
    Iot,
    VirtualMachine,
    Container,
    /// Upstream internet uplink. Connections sourced here compete for
    /// the active-source slot of their target.
    Internet,
    /// Aggregation point where several uplinks converge.
    MainLink,
    #[default]
    #[serde(other)]
    Other,
}

/// How the monitoring backend checks a node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum MonitoringMethod {
    Ping,
    Snmp,
    Http,
    Mqtt,
    #[default]
    #[serde(other)]
    None,
}

/// Monitoring configuration. Opaque to the core beyond storage; the
/// backend interprets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    #[serde(default)]
    pub monitoring_method: MonitoringMethod,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub snmp_community: Option<String>,
    #[serde(default)]
    pub mqtt_topic: Option<String>,
    #[serde(default)]
    pub check_interval_secs: Option<u32>,
}

/// A monitored or purely visual entity on the topology canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    /// Weak reference: the group may not exist (dangling ids are treated
    /// as ungrouped).
    #[serde(default)]
    pub group_id: Option<EntityId>,
    #[serde(flatten)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub internet_status: NodeStatus,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub internet_last_check: Option<DateTime<Utc>>,
}

impl Node {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            position_x: 0.0,
            position_y: 0.0,
            group_id: None,
            monitoring: MonitoringConfig::default(),
            status: NodeStatus::Unknown,
            internet_status: NodeStatus::Unknown,
            latency: None,
            last_seen: None,
            internet_last_check: None,
        }
    }

    pub fn in_group(mut self, group_id: impl Into<EntityId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position_x = x;
        self.position_y = y;
        self
    }

    pub fn with_status(mut self, status: NodeStatus, internet_status: NodeStatus) -> Self {
        self.status = status;
        self.internet_status = internet_status;
        self
    }

    pub fn is_internet(&self) -> bool {
        self.node_type == NodeType::Internet
    }

    /// Whether this node gives its group internet connectivity.
    pub fn has_internet(&self) -> bool {
        self.internet_status == NodeStatus::Online
            || (self.is_internet() && self.status.is_reachable())
    }
}

/// Partial monitoring update; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_method: Option<MonitoringMethod>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_address: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<Option<u16>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub snmp_community: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub mqtt_topic: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub check_interval_secs: Option<Option<u32>>,
}

impl MonitoringPatch {
    fn apply(&self, config: &mut MonitoringConfig) {
        merge_field(&mut config.monitoring_method, self.monitoring_method.as_ref());
        merge_nullable(&mut config.ip_address, self.ip_address.as_ref());
        merge_nullable(&mut config.port, self.port.as_ref());
        merge_nullable(&mut config.url, self.url.as_ref());
        merge_nullable(&mut config.snmp_community, self.snmp_community.as_ref());
        merge_nullable(&mut config.mqtt_topic, self.mqtt_topic.as_ref());
        merge_nullable(
            &mut config.check_interval_secs,
            self.check_interval_secs.as_ref(),
        );
    }
}

/// Field-level node edit. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_id: Option<Option<EntityId>>,
    #[serde(flatten)]
    pub monitoring: MonitoringPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_status: Option<NodeStatus>,
}

impl NodePatch {
    pub fn apply(&self, node: &mut Node) {
        merge_field(&mut node.name, self.name.as_ref());
        merge_field(&mut node.node_type, self.node_type.as_ref());
        merge_field(&mut node.position_x, self.position_x.as_ref());
        merge_field(&mut node.position_y, self.position_y.as_ref());
        merge_nullable(&mut node.group_id, self.group_id.as_ref());
        self.monitoring.apply(&mut node.monitoring);
        merge_field(&mut node.status, self.status.as_ref());
        merge_field(&mut node.internet_status, self.internet_status.as_ref());
    }
}

/// A live status report for one node.
///
/// Only fields present in the payload are applied; nothing is reset to a
/// default because it was omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusUpdate {
    pub node_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_status: Option<NodeStatus>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub latency: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub internet_last_check: Option<Option<DateTime<Utc>>>,
}

impl NodeStatusUpdate {
    pub fn new(node_id: impl Into<EntityId>) -> Self {
        Self {
            node_id: node_id.into(),
            status: None,
            internet_status: None,
            latency: None,
            last_seen: None,
            internet_last_check: None,
        }
    }

    pub fn status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn internet_status(mut self, status: NodeStatus) -> Self {
        self.internet_status = Some(status);
        self
    }

    pub fn apply(&self, node: &mut Node) {
        merge_field(&mut node.status, self.status.as_ref());
        merge_field(&mut node.internet_status, self.internet_status.as_ref());
        merge_nullable(&mut node.latency, self.latency.as_ref());
        merge_nullable(&mut node.last_seen, self.last_seen.as_ref());
        merge_nullable(
            &mut node.internet_last_check,
            self.internet_last_check.as_ref(),
        );
    }
}
