//! Test stores — mock `RoomStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use roundtable_core::error::RoomError;
use roundtable_core::room::Room;
use roundtable_core::store::{AppConfig, HousekeepingReport, RoomStore};

/// A store holding at most one room that records every save. The stored
/// room can be manipulated directly to prepare scenarios.
#[derive(Debug, Default)]
pub struct RecordingRoomStore {
    room: Mutex<Option<Room>>,
    saved: Mutex<Vec<Room>>,
}

impl RecordingRoomStore {
    /// Creates an empty store (no room exists yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one room.
    #[must_use]
    pub fn with_room(room: Room) -> Self {
        Self {
            room: Mutex::new(Some(room)),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Mutates the stored room in place to prepare a scenario.
    ///
    /// # Panics
    ///
    /// Panics if no room is stored or the internal mutex is poisoned.
    pub fn manipulate<F>(&self, f: F)
    where
        F: FnOnce(&mut Room),
    {
        let mut slot = self.room.lock().unwrap();
        let room = slot.as_mut().expect("no room stored to manipulate");
        f(room);
    }

    /// Returns a snapshot of the currently stored room.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn current_room(&self) -> Option<Room> {
        self.room.lock().unwrap().clone()
    }

    /// Returns every room that was passed to `save_room`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn saved_rooms(&self) -> Vec<Room> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomStore for RecordingRoomStore {
    async fn get_room_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let slot = self.room.lock().unwrap();
        Ok(slot.as_ref().filter(|r| r.id == room_id).cloned())
    }

    async fn save_room(&self, room: &Room) -> Result<(), RoomError> {
        *self.room.lock().unwrap() = Some(room.clone());
        self.saved.lock().unwrap().push(room.clone());
        Ok(())
    }

    async fn get_all_rooms(&self) -> Result<HashMap<String, Room>, RoomError> {
        let slot = self.room.lock().unwrap();
        Ok(slot
            .as_ref()
            .map(|r| HashMap::from([(r.id.clone(), r.clone())]))
            .unwrap_or_default())
    }

    async fn housekeeping(&self) -> Result<HousekeepingReport, RoomError> {
        Ok(HousekeepingReport::default())
    }

    async fn get_app_config(&self) -> Result<AppConfig, RoomError> {
        Ok(AppConfig::from([(
            "jwtSecret".to_owned(),
            "TEST_ONLY_VALUE".to_owned(),
        )]))
    }

    fn store_type(&self) -> &'static str {
        "RecordingRoomStore"
    }
}

/// A store that always fails. Useful for testing load-error paths.
#[derive(Debug, Default)]
pub struct FailingRoomStore;

#[async_trait]
impl RoomStore for FailingRoomStore {
    async fn get_room_by_id(&self, _room_id: &str) -> Result<Option<Room>, RoomError> {
        Err(RoomError::Store("connection refused".into()))
    }

    async fn save_room(&self, _room: &Room) -> Result<(), RoomError> {
        Err(RoomError::Store("connection refused".into()))
    }

    async fn get_all_rooms(&self) -> Result<HashMap<String, Room>, RoomError> {
        Err(RoomError::Store("connection refused".into()))
    }

    async fn housekeeping(&self) -> Result<HousekeepingReport, RoomError> {
        Err(RoomError::Store("connection refused".into()))
    }

    async fn get_app_config(&self) -> Result<AppConfig, RoomError> {
        Err(RoomError::Store("connection refused".into()))
    }

    fn store_type(&self) -> &'static str {
        "FailingRoomStore"
    }
}

/// A store that loads fine but fails every save. Useful for asserting that
/// a folded aggregate is discarded on persistence failure.
#[derive(Debug)]
pub struct FailingSaveRoomStore {
    room: Mutex<Option<Room>>,
}

impl FailingSaveRoomStore {
    /// Creates a store pre-seeded with one room.
    #[must_use]
    pub fn with_room(room: Room) -> Self {
        Self {
            room: Mutex::new(Some(room)),
        }
    }

    /// Returns a snapshot of the stored room (unchanged by failed saves).
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn current_room(&self) -> Option<Room> {
        self.room.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomStore for FailingSaveRoomStore {
    async fn get_room_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let slot = self.room.lock().unwrap();
        Ok(slot.as_ref().filter(|r| r.id == room_id).cloned())
    }

    async fn save_room(&self, _room: &Room) -> Result<(), RoomError> {
        Err(RoomError::Store("write timeout".into()))
    }

    async fn get_all_rooms(&self) -> Result<HashMap<String, Room>, RoomError> {
        let slot = self.room.lock().unwrap();
        Ok(slot
            .as_ref()
            .map(|r| HashMap::from([(r.id.clone(), r.clone())]))
            .unwrap_or_default())
    }

    async fn housekeeping(&self) -> Result<HousekeepingReport, RoomError> {
        Ok(HousekeepingReport::default())
    }

    async fn get_app_config(&self) -> Result<AppConfig, RoomError> {
        Ok(AppConfig::new())
    }

    fn store_type(&self) -> &'static str {
        "FailingSaveRoomStore"
    }
}
