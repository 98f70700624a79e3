//! Integration tests for `PgRoomStore`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use roundtable_core::clock::Clock;
use roundtable_core::room::{Room, Story, User};
use roundtable_core::store::RoomStore;
use roundtable_store::{PgRoomStore, ROOM_RETENTION_DAYS};
use sqlx::PgPool;
use uuid::Uuid;

struct TestClock(DateTime<Utc>);

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Helper to build a room with one user and one estimated story.
fn make_room(id: &str, last_activity: DateTime<Utc>) -> Room {
    let mut room = Room::new(id.to_owned(), last_activity);
    let user_id = Uuid::new_v4();
    room.users.insert(
        user_id,
        User {
            id: user_id,
            username: "alice".to_owned(),
            email: Some("alice@example.com".to_owned()),
            avatar: 2,
            excluded: false,
            disconnected: false,
        },
    );
    let story_id = Uuid::new_v4();
    let mut story = Story::new(story_id, "a story".to_owned(), Some("details".to_owned()));
    story.estimations.insert(user_id, 5.0);
    room.stories.insert(story_id, story);
    room.selected_story_id = Some(story_id);
    room
}

fn store_with_now(pool: PgPool, now: DateTime<Utc>) -> PgRoomStore {
    PgRoomStore::new(pool, Arc::new(TestClock(now)))
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_room_by_id_returns_none_for_unknown_room(pool: PgPool) {
    let store = store_with_now(pool, Utc::now());

    let loaded = store.get_room_by_id("nope").await.unwrap();

    assert!(loaded.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_save_and_load_round_trip(pool: PgPool) {
    let store = store_with_now(pool, Utc::now());
    let room = make_room("round-trip", Utc::now());

    store.save_room(&room).await.unwrap();
    let loaded = store.get_room_by_id("round-trip").await.unwrap().unwrap();

    assert_eq!(loaded, room);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_save_room_upserts_by_id(pool: PgPool) {
    let store = store_with_now(pool, Utc::now());
    let room = make_room("upsert", Utc::now());
    store.save_room(&room).await.unwrap();

    let mut updated = room.clone();
    updated.users.clear();
    updated.selected_story_id = None;
    store.save_room(&updated).await.unwrap();

    let loaded = store.get_room_by_id("upsert").await.unwrap().unwrap();
    assert!(loaded.users.is_empty());
    assert!(loaded.selected_story_id.is_none());
    assert_eq!(store.get_all_rooms().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_all_rooms_is_keyed_by_room_id(pool: PgPool) {
    let store = store_with_now(pool, Utc::now());
    store
        .save_room(&make_room("one", Utc::now()))
        .await
        .unwrap();
    store
        .save_room(&make_room("two", Utc::now()))
        .await
        .unwrap();

    let rooms = store.get_all_rooms().await.unwrap();

    assert_eq!(rooms.len(), 2);
    assert!(rooms.contains_key("one"));
    assert!(rooms.contains_key("two"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_housekeeping_marks_then_deletes_stale_rooms(pool: PgPool) {
    let now = Utc::now();
    let store = store_with_now(pool, now);
    let stale = make_room("stale", now - Duration::days(ROOM_RETENTION_DAYS + 9));
    let fresh = make_room("fresh", now);
    store.save_room(&stale).await.unwrap();
    store.save_room(&fresh).await.unwrap();

    let first = store.housekeeping().await.unwrap();
    assert_eq!(first.marked_for_deletion, vec!["stale".to_owned()]);
    assert!(first.deleted.is_empty());

    // the mark must be visible on the stored document too
    let marked = store.get_room_by_id("stale").await.unwrap().unwrap();
    assert!(marked.marked_for_deletion);

    let second = store.housekeeping().await.unwrap();
    assert!(second.marked_for_deletion.is_empty());
    assert_eq!(second.deleted, vec!["stale".to_owned()]);

    let rooms = store.get_all_rooms().await.unwrap();
    assert!(rooms.contains_key("fresh"));
    assert!(!rooms.contains_key("stale"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_app_config_returns_key_value_rows(pool: PgPool) {
    sqlx::query("INSERT INTO app_config (key, value) VALUES ($1, $2), ($3, $4)")
        .bind("jwtSecret")
        .bind("s3cret")
        .bind("whitelistedUsers")
        .bind("alice,bob")
        .execute(&pool)
        .await
        .unwrap();
    let store = store_with_now(pool, Utc::now());

    let config = store.get_app_config().await.unwrap();

    assert_eq!(config.get("jwtSecret").map(String::as_str), Some("s3cret"));
    assert_eq!(
        config.get("whitelistedUsers").map(String::as_str),
        Some("alice,bob")
    );
}
