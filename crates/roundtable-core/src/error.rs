//! Domain error types.

use thiserror::Error;

/// Top-level error type for command processing.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The command envelope or payload is malformed. Rejected before any
    /// aggregate state is touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A business rule evaluated against the current aggregate was violated.
    /// The message names the specific rule and is reported to clients
    /// verbatim.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A command other than a room-creating one targeted an unknown room.
    #[error("room not found: {0}")]
    NotFound(String),

    /// The room store failed to load or save.
    #[error("store error: {0}")]
    Store(String),

    /// A fold-order or aggregate invariant was broken. Indicates a bug in
    /// the engine, never caller input.
    #[error("internal error: {0}")]
    Internal(String),
}
