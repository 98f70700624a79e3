//! Non-persistent (in-memory) store implementation.
//!
//! Rooms live in a map behind an async `RwLock`. Reads and writes hand out
//! detached clones, mimicking the value semantics of a real document store:
//! no aliasing of a stored room ever escapes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use roundtable_core::clock::Clock;
use roundtable_core::error::RoomError;
use roundtable_core::room::Room;
use roundtable_core::store::{AppConfig, HousekeepingReport, RoomStore};
use tokio::sync::RwLock;
use tracing::info;

use crate::ROOM_RETENTION_DAYS;

/// In-memory `RoomStore`.
pub struct InMemoryRoomStore {
    rooms: RwLock<HashMap<String, Room>>,
    app_config: AppConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomStore {
    /// Creates an empty store with an empty application configuration.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_app_config(clock, AppConfig::new())
    }

    /// Creates an empty store serving the given application configuration.
    #[must_use]
    pub fn with_app_config(clock: Arc<dyn Clock>, app_config: AppConfig) -> Self {
        info!("using in-memory room storage");
        Self {
            rooms: RwLock::new(HashMap::new()),
            app_config,
            clock,
        }
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn get_room_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(room_id).cloned())
    }

    async fn save_room(&self, room: &Room) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        rooms.insert(room.id.clone(), room.clone());
        Ok(())
    }

    async fn get_all_rooms(&self) -> Result<HashMap<String, Room>, RoomError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.clone())
    }

    async fn housekeeping(&self) -> Result<HousekeepingReport, RoomError> {
        let threshold = self.clock.now() - Duration::days(ROOM_RETENTION_DAYS);
        let mut rooms = self.rooms.write().await;

        let deleted: Vec<String> = rooms
            .iter()
            .filter(|(_, room)| room.marked_for_deletion)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &deleted {
            rooms.remove(id);
        }

        let mut marked_for_deletion = Vec::new();
        for (id, room) in rooms.iter_mut() {
            if room.last_activity < threshold && !room.marked_for_deletion {
                room.marked_for_deletion = true;
                marked_for_deletion.push(id.clone());
            }
        }

        info!(
            marked = marked_for_deletion.len(),
            deleted = deleted.len(),
            "in-memory housekeeping sweep done"
        );
        Ok(HousekeepingReport {
            marked_for_deletion,
            deleted,
        })
    }

    async fn get_app_config(&self) -> Result<AppConfig, RoomError> {
        Ok(self.app_config.clone())
    }

    fn store_type(&self) -> &'static str {
        "InMemoryRoomStore"
    }
}
