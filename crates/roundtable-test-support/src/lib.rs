//! Shared test mocks and utilities for the roundtable engine.

mod clock;
mod store;

pub use clock::FixedClock;
pub use store::{FailingRoomStore, FailingSaveRoomStore, RecordingRoomStore};
