// ── Core error types ──
//
// Errors that can surface from nettopo-core. Store mutations never fail
// (gaps and stale events are no-ops); errors come from decoding inbound
// events and from the persistence collaborator.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Sync errors ──────────────────────────────────────────────────
    #[error("Malformed {kind} event: {message}")]
    MalformedEvent { kind: String, message: String },

    // ── Persistence errors ───────────────────────────────────────────
    /// A non-success response or a transport failure; the two are
    /// treated identically.
    #[error("Persistence request failed: {message}")]
    Persistence { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}
