// ── Entity store ──

mod arbiter;
mod reconcile;
pub(crate) mod collection;
mod refresh;
mod topology_store;
mod ui_state;

pub use topology_store::TopologyStore;
pub use ui_state::{EditorMode, UiState, Viewport};
