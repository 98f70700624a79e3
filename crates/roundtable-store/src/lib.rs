//! Room store implementations.
//!
//! Two interchangeable backends for the [`RoomStore`] contract: a
//! non-persistent in-memory map and a PostgreSQL store that keeps each room
//! as one JSONB document. Both implement the same two-phase retention sweep.
//!
//! [`RoomStore`]: roundtable_core::store::RoomStore

pub mod in_memory;
pub mod pg_room_store;

pub use in_memory::InMemoryRoomStore;
pub use pg_room_store::PgRoomStore;

/// Rooms untouched for this many days get marked for deletion; the next
/// sweep deletes the marked ones.
pub const ROOM_RETENTION_DAYS: i64 = 31;
