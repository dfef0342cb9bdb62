// ── Group domain types ──

use serde::{Deserialize, Serialize};

use super::common::{double_option, merge_field, merge_nullable};
use super::entity_id::EntityId;

fn default_group_width() -> f64 {
    300.0
}

fn default_group_height() -> f64 {
    200.0
}

fn default_opacity() -> f64 {
    0.1
}

/// A rectangular visual container.
///
/// Membership is stored on the member nodes (`Node::group_id`); a group
/// never holds a list of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default = "default_group_width")]
    pub width: f64,
    #[serde(default = "default_group_height")]
    pub height: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Group {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            position_x: 0.0,
            position_y: 0.0,
            width: default_group_width(),
            height: default_group_height(),
            color: None,
            opacity: default_opacity(),
        }
    }

    pub fn right_edge(&self) -> f64 {
        self.position_x + self.width
    }

    pub fn bottom_edge(&self) -> f64 {
        self.position_y + self.height
    }

    /// Whether an axis-aligned box lies entirely inside this group.
    pub fn contains_box(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        x >= self.position_x
            && y >= self.position_y
            && x + width <= self.right_edge()
            && y + height <= self.bottom_edge()
    }

    pub fn geometry(&self) -> GroupGeometry {
        GroupGeometry {
            x: self.position_x,
            y: self.position_y,
            width: Some(self.width),
            height: Some(self.height),
        }
    }
}

/// Position (and optionally size) update for a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupGeometry {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl GroupGeometry {
    pub fn apply(&self, group: &mut Group) {
        group.position_x = self.x;
        group.position_y = self.y;
        merge_field(&mut group.width, self.width.as_ref());
        merge_field(&mut group.height, self.height.as_ref());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl GroupPatch {
    pub fn apply(&self, group: &mut Group) {
        merge_field(&mut group.name, self.name.as_ref());
        merge_nullable(&mut group.description, self.description.as_ref());
        merge_field(&mut group.position_x, self.position_x.as_ref());
        merge_field(&mut group.position_y, self.position_y.as_ref());
        merge_field(&mut group.width, self.width.as_ref());
        merge_field(&mut group.height, self.height.as_ref());
        merge_nullable(&mut group.color, self.color.as_ref());
        merge_field(&mut group.opacity, self.opacity.as_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn contains_box_respects_all_edges() {
        let mut group = Group::new("g1", "core");
        group.position_x = 100.0;
        group.position_y = 100.0;

        assert!(group.contains_box(120.0, 150.0, 100.0, 40.0));
        assert!(!group.contains_box(90.0, 150.0, 100.0, 40.0));
        assert!(!group.contains_box(350.0, 150.0, 100.0, 40.0));
        assert!(!group.contains_box(120.0, 280.0, 100.0, 40.0));
    }

    #[test]
    fn geometry_without_size_keeps_size() {
        let mut group = Group::new("g1", "core");
        GroupGeometry {
            x: 10.0,
            y: 20.0,
            width: None,
            height: Some(450.0),
        }
        .apply(&mut group);

        assert!((group.width - 300.0).abs() < f64::EPSILON);
        assert!((group.height - 450.0).abs() < f64::EPSILON);
        assert!((group.position_x - 10.0).abs() < f64::EPSILON);
    }
}
