//! Room store abstraction.
//!
//! The engine depends only on this contract; it may be backed by an
//! in-memory map or a durable document store interchangeably.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RoomError;
use crate::room::Room;

/// Application configuration values served by the store (consumed by layers
/// outside the processing core, e.g. auth).
pub type AppConfig = HashMap<String, String>;

/// Outcome of one retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
    /// Rooms newly marked for deletion in this sweep.
    pub marked_for_deletion: Vec<String>,
    /// Rooms deleted in this sweep (they were marked in an earlier one).
    pub deleted: Vec<String>,
}

/// Store contract for room aggregates.
///
/// `save_room` has replace-by-id (upsert) semantics. Implementations must
/// hand out detached values: a room returned by `get_room_by_id` is
/// exclusively owned by the caller.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Loads a room by its unique id, or `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Store` when the backend fails.
    async fn get_room_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError>;

    /// Saves the given room, replacing any existing room with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Store` when the backend fails.
    async fn save_room(&self, room: &Room) -> Result<(), RoomError>;

    /// Returns all rooms keyed by room id. For housekeeping and export, not
    /// used by the command-processing hot path.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Store` when the backend fails.
    async fn get_all_rooms(&self) -> Result<HashMap<String, Room>, RoomError>;

    /// Runs one retention sweep: deletes rooms already marked for deletion,
    /// then marks rooms whose `last_activity` is older than the retention
    /// threshold. Never invoked by the command processor.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Store` when the backend fails.
    async fn housekeeping(&self) -> Result<HousekeepingReport, RoomError>;

    /// Returns application configuration values.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Store` when the backend fails.
    async fn get_app_config(&self) -> Result<AppConfig, RoomError>;

    /// Human-readable label of the backing store (for logging).
    fn store_type(&self) -> &'static str;
}
