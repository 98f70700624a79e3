//! Roundtable Core — shared domain types and contracts.
//!
//! This crate defines the room aggregate model, the command and event
//! envelopes, the error taxonomy and the store contract that the processing
//! engine depends on. It contains no business logic and no I/O.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod room;
pub mod store;
