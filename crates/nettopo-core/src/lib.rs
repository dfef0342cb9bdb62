//! Client-side state engine for a live network-topology editor.
//!
//! This crate owns the domain model, the reactive store and every piece of
//! logic that runs against it:
//!
//! - **[`TopologyStore`]**: Authoritative cache of nodes, connections,
//!   groups and group connections built on `EntityCollection<T>`
//!   (`IndexMap` + `tokio::sync::watch` channels). Every mutation is a
//!   complete logical operation with its cascades, published once.
//!
//! - **[`aggregate`]**: Derived connection and group statuses, computed on
//!   read.
//!
//! - **Active-source arbiter**: [`TopologyStore::set_active_source`] keeps
//!   at most one active uplink per target node.
//!
//! - **[`layout`]**: Deterministic hierarchical auto-arrangement, committed
//!   in one batch and persisted concurrently.
//!
//! - **[`sync`]**: Decoding and idempotent application of the backend's
//!   broadcast events.
//!
//! - **[`Controller`]**: Facade tying the store to a [`Persistence`]
//!   backend: optimistic [`Command`] execution, initial load, event loop and
//!   auto-arrange.
//!
//! - **[`FrameScheduler`]**: Shared animation clock that only runs while
//!   someone is subscribed.

pub mod aggregate;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod layout;
pub mod model;
pub mod persistence;
pub mod scheduler;
pub mod store;
pub mod stream;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{ConnectionStatus, GroupStatus, StatusOverview, UplinkState};
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::ControllerConfig;
pub use controller::{Controller, EventLoopStats, LayoutOutcome};
pub use error::CoreError;
pub use layout::{Arrangement, LayoutConfig, PersistReport};
pub use persistence::{MemoryPersistence, Persistence};
pub use scheduler::{FrameScheduler, FrameSubscription, FrameTick};
pub use store::{EditorMode, TopologyStore, UiState, Viewport};
pub use stream::{ConnectionFilter, EntityStream, NodeFilter};
pub use sync::{Applied, SyncEnvelope, SyncEvent, decode_event};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Connection, ConnectionPatch, EntityId, Group, GroupConnection, GroupConnectionPatch,
    GroupGeometry, GroupPatch, MonitoringConfig, MonitoringMethod, Node, NodePatch, NodeStatus,
    NodeStatusUpdate, NodeType, TopologySnapshot,
};
