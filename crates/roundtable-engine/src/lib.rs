//! Roundtable Engine — the command/event processing core.
//!
//! Every state change runs through the same pipeline: schema validation,
//! business-rule evaluation against the current aggregate, folding of the
//! produced events through pure reducers, and a single persist. See
//! [`processor::CommandProcessor`] for the orchestration.

pub mod command_handlers;
pub mod event_handlers;
pub mod processor;
pub mod validate;

pub use processor::{CommandProcessor, CommandResult};
