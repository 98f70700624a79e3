//! `PostgreSQL` implementation of the `RoomStore` trait.
//!
//! Each room is persisted as one JSONB document, keyed by its user-visible
//! room id. `last_activity` and `marked_for_deletion` are mirrored into
//! dedicated columns so the housekeeping sweep stays index-friendly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use roundtable_core::clock::Clock;
use roundtable_core::error::RoomError;
use roundtable_core::room::Room;
use roundtable_core::store::{AppConfig, HousekeepingReport, RoomStore};
use sqlx::{PgPool, Row};
use tracing::info;

use crate::ROOM_RETENTION_DAYS;

/// PostgreSQL-backed room store.
#[derive(Clone)]
pub struct PgRoomStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgRoomStore {
    /// Creates a new `PgRoomStore` over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn store_err(e: impl std::fmt::Display) -> RoomError {
    RoomError::Store(e.to_string())
}

fn room_from_row(row: &sqlx::postgres::PgRow) -> Result<Room, RoomError> {
    let data: serde_json::Value = row.try_get("data").map_err(store_err)?;
    serde_json::from_value(data).map_err(|e| store_err(format!("room deserialization: {e}")))
}

#[async_trait]
impl RoomStore for PgRoomStore {
    async fn get_room_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let row = sqlx::query("SELECT data FROM rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.as_ref().map(room_from_row).transpose()
    }

    async fn save_room(&self, room: &Room) -> Result<(), RoomError> {
        let data = serde_json::to_value(room)
            .map_err(|e| store_err(format!("room serialization: {e}")))?;
        sqlx::query(
            "INSERT INTO rooms (id, data, last_activity, marked_for_deletion) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 data = EXCLUDED.data, \
                 last_activity = EXCLUDED.last_activity, \
                 marked_for_deletion = EXCLUDED.marked_for_deletion",
        )
        .bind(&room.id)
        .bind(&data)
        .bind(room.last_activity)
        .bind(room.marked_for_deletion)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_all_rooms(&self) -> Result<HashMap<String, Room>, RoomError> {
        let rows = sqlx::query("SELECT data FROM rooms")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        let mut rooms = HashMap::with_capacity(rows.len());
        for row in &rows {
            let room = room_from_row(row)?;
            rooms.insert(room.id.clone(), room);
        }
        Ok(rooms)
    }

    async fn housekeeping(&self) -> Result<HousekeepingReport, RoomError> {
        let deleted_rows = sqlx::query("DELETE FROM rooms WHERE marked_for_deletion RETURNING id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        let deleted = deleted_rows
            .iter()
            .map(|row| row.try_get::<String, _>("id").map_err(store_err))
            .collect::<Result<Vec<_>, _>>()?;

        let threshold = self.clock.now() - Duration::days(ROOM_RETENTION_DAYS);
        let marked_rows = sqlx::query(
            "UPDATE rooms SET \
                 marked_for_deletion = TRUE, \
                 data = jsonb_set(data, '{markedForDeletion}', 'true'::jsonb) \
             WHERE last_activity < $1 AND NOT marked_for_deletion \
             RETURNING id",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        let marked_for_deletion = marked_rows
            .iter()
            .map(|row| row.try_get::<String, _>("id").map_err(store_err))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            marked = marked_for_deletion.len(),
            deleted = deleted.len(),
            "postgres housekeeping sweep done"
        );
        Ok(HousekeepingReport {
            marked_for_deletion,
            deleted,
        })
    }

    async fn get_app_config(&self) -> Result<AppConfig, RoomError> {
        let rows = sqlx::query("SELECT key, value FROM app_config")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        let mut config = AppConfig::with_capacity(rows.len());
        for row in &rows {
            let key: String = row.try_get("key").map_err(store_err)?;
            let value: String = row.try_get("value").map_err(store_err)?;
            config.insert(key, value);
        }
        Ok(config)
    }

    fn store_type(&self) -> &'static str {
        "PgRoomStore"
    }
}
