// ── Local editor state ──
//
// Selection, interaction mode and viewport. Lives beside the topology in
// the store but is never synchronized or persisted.

use serde::{Deserialize, Serialize};

use crate::model::EntityId;

/// What a pointer interaction on the canvas currently means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorMode {
    #[default]
    Select,
    /// Drawing a node-to-node connection.
    Connect,
    /// Drawing a group-to-group connection.
    ConnectGroups,
    Pan,
}

/// Canvas transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub selected_node: Option<EntityId>,
    pub selected_connection: Option<EntityId>,
    pub selected_group: Option<EntityId>,
    pub selected_group_connection: Option<EntityId>,
    /// First endpoint picked while in a connect mode.
    pub pending_source: Option<EntityId>,
    pub mode: EditorMode,
    pub viewport: Viewport,
}

impl UiState {
    /// Select a single node, dropping any other selection.
    pub fn select_node(&mut self, id: EntityId) {
        self.clear_selection();
        self.selected_node = Some(id);
    }

    pub fn select_group(&mut self, id: EntityId) {
        self.clear_selection();
        self.selected_group = Some(id);
    }

    pub fn select_connection(&mut self, id: EntityId) {
        self.clear_selection();
        self.selected_connection = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_node = None;
        self.selected_connection = None;
        self.selected_group = None;
        self.selected_group_connection = None;
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
        self.pending_source = None;
    }

    pub(crate) fn forget(&mut self, id: &EntityId) {
        for slot in [
            &mut self.selected_node,
            &mut self.selected_connection,
            &mut self.selected_group,
            &mut self.selected_group_connection,
            &mut self.pending_source,
        ] {
            if slot.as_ref() == Some(id) {
                *slot = None;
            }
        }
    }
}
