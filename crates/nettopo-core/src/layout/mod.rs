// ── Auto-layout ──
//
// Deterministic hierarchical arrangement of groups and nodes. Computing an
// arrangement only reads the store; committing it is a separate,
// synchronous step, and persisting it a separate asynchronous one.

mod commit;
mod geometry;
pub mod leveling;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, GroupGeometry};

pub use commit::{PersistFailure, PersistReport, persist_arrangement};
pub use geometry::arrange;
pub use leveling::{LevelGraph, bucket_levels};

/// Spacing constants for the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between nodes in the same row.
    pub node_gap: f64,
    /// Vertical gap between node rows.
    pub row_gap: f64,
    pub group_padding: f64,
    /// Space reserved at the top of a group for its title.
    pub group_header: f64,
    pub min_group_width: f64,
    pub min_group_height: f64,
    /// Gap between groups, both horizontally and between group rows.
    pub group_gap: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 120.0,
            node_height: 80.0,
            node_gap: 40.0,
            row_gap: 60.0,
            group_padding: 40.0,
            group_header: 50.0,
            min_group_width: 300.0,
            min_group_height: 200.0,
            group_gap: 100.0,
            origin_x: 100.0,
            origin_y: 100.0,
        }
    }
}

impl LayoutConfig {
    /// Distance between the tops of consecutive node rows.
    pub fn row_pitch(&self) -> f64 {
        self.node_height + self.row_gap
    }

    /// Width of a row holding `count` nodes.
    pub fn row_width(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let k = units(count);
        k * self.node_width + (k - 1.0) * self.node_gap
    }

    /// Horizontal distance between the left edges of row neighbours.
    pub fn column_pitch(&self) -> f64 {
        self.node_width + self.node_gap
    }
}

/// A count as a coordinate multiplier.
pub(crate) fn units(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Where the engine puts one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    pub x: f64,
    pub y: f64,
    pub level: usize,
    /// The group the node was laid out in; `None` for the ungrouped lane.
    pub group_id: Option<EntityId>,
}

/// Where the engine puts one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlacement {
    pub geometry: GroupGeometry,
    pub level: usize,
}

/// The computed output of the layout engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrangement {
    pub nodes: IndexMap<EntityId, NodePlacement>,
    pub groups: IndexMap<EntityId, GroupPlacement>,
}

impl Arrangement {
    pub fn node(&self, id: &EntityId) -> Option<&NodePlacement> {
        self.nodes.get(id)
    }

    pub fn group(&self, id: &EntityId) -> Option<&GroupPlacement> {
        self.groups.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty()
    }

    /// Right edge of the rightmost group, if any.
    pub fn groups_right_edge(&self) -> Option<f64> {
        self.groups
            .values()
            .filter_map(|g| g.geometry.width.map(|w| g.geometry.x + w))
            .reduce(f64::max)
    }
}
