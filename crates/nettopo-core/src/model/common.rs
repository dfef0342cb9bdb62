// ── Common types shared across the domain model ──

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Live status reported for a node (and for its upstream internet check).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum NodeStatus {
    Online,
    Offline,
    Degraded,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NodeStatus {
    /// Reachable at all: fully online or degraded.
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Online | Self::Degraded)
    }
}

/// Deserialize a field that distinguishes "absent" from "explicit null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`,
/// value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Apply a tri-state patch field onto a nullable target.
pub(crate) fn merge_nullable<T: Clone>(target: &mut Option<T>, patch: Option<&Option<T>>) {
    if let Some(value) = patch {
        target.clone_from(value);
    }
}

/// Apply an optional patch field onto a non-nullable target.
pub(crate) fn merge_field<T: Clone>(target: &mut T, patch: Option<&T>) {
    if let Some(value) = patch {
        target.clone_from(value);
    }
}
