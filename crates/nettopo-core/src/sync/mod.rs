// ── Live sync protocol ──

mod event;
mod handler;

pub use event::{EventKind, SyncEnvelope, SyncEvent, decode_event};
pub use handler::Applied;
