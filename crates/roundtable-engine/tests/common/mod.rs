//! Shared fixtures for processor tests: real validator, handlers and
//! reducers wired to a recording store and a fixed clock.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use roundtable_core::clock::Clock;
use roundtable_core::command::{
    AddStoryPayload, ClearStoryEstimatePayload, Command, CommandBody, GiveStoryEstimatePayload,
    JoinRoomPayload, RevealPayload,
};
use roundtable_core::event::EventKind;
use roundtable_core::store::RoomStore;
use roundtable_engine::CommandProcessor;
use roundtable_test_support::{FixedClock, RecordingRoomStore};
use uuid::Uuid;

/// The fixed "now" every fixture clock reports.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
}

/// A processor over an empty recording store.
pub fn prep_empty() -> (Arc<RecordingRoomStore>, Arc<CommandProcessor>) {
    let store = Arc::new(RecordingRoomStore::new());
    let processor = Arc::new(CommandProcessor::new(
        Arc::clone(&store) as Arc<dyn RoomStore>,
        Arc::new(FixedClock(fixed_now())) as Arc<dyn Clock>,
    ));
    (store, processor)
}

/// One room, two joined users, one story already added and selected.
pub struct TwoUsersOneStory {
    pub store: Arc<RecordingRoomStore>,
    pub processor: Arc<CommandProcessor>,
    pub room_id: String,
    pub user_one: Uuid,
    pub user_two: Uuid,
    pub story_id: Uuid,
}

pub async fn prep_two_users_in_one_room_with_one_story() -> TwoUsersOneStory {
    let (store, processor) = prep_empty();
    let room_id = format!("room-{}", Uuid::new_v4());
    let user_one = Uuid::new_v4();
    let user_two = Uuid::new_v4();

    processor
        .process(join_room_command(&room_id, "firstUser"), user_one)
        .await
        .expect("first join must succeed");
    processor
        .process(join_room_command(&room_id, "secondUser"), user_two)
        .await
        .expect("second join must succeed");

    let added = processor
        .process(add_story_command(&room_id, "new super story"), user_one)
        .await
        .expect("addStory must succeed");
    let story_id = match &added.events[0].kind {
        EventKind::StoryAdded(p) => p.story_id,
        other => panic!("expected storyAdded as first event, got {other:?}"),
    };

    TwoUsersOneStory {
        store,
        processor,
        room_id,
        user_one,
        user_two,
        story_id,
    }
}

pub fn join_room_command(room_id: &str, username: &str) -> Command {
    Command {
        id: Uuid::new_v4(),
        room_id: room_id.to_owned(),
        body: CommandBody::JoinRoom(JoinRoomPayload {
            username: username.to_owned(),
            email: None,
            avatar: None,
        }),
    }
}

pub fn add_story_command(room_id: &str, title: &str) -> Command {
    Command {
        id: Uuid::new_v4(),
        room_id: room_id.to_owned(),
        body: CommandBody::AddStory(AddStoryPayload {
            title: title.to_owned(),
            description: Some("This will be awesome".to_owned()),
        }),
    }
}

pub fn give_estimate_command(room_id: &str, story_id: Uuid, value: f64) -> Command {
    Command {
        id: Uuid::new_v4(),
        room_id: room_id.to_owned(),
        body: CommandBody::GiveStoryEstimate(GiveStoryEstimatePayload { story_id, value }),
    }
}

pub fn clear_estimate_command(room_id: &str, story_id: Uuid) -> Command {
    Command {
        id: Uuid::new_v4(),
        room_id: room_id.to_owned(),
        body: CommandBody::ClearStoryEstimate(ClearStoryEstimatePayload { story_id }),
    }
}

pub fn reveal_command(room_id: &str, story_id: Uuid) -> Command {
    Command {
        id: Uuid::new_v4(),
        room_id: room_id.to_owned(),
        body: CommandBody::Reveal(RevealPayload { story_id }),
    }
}

/// The wire names of the given events, in order — convenient for asserting
/// whole event sequences.
pub fn event_names(events: &[roundtable_core::event::Event]) -> Vec<&'static str> {
    events.iter().map(roundtable_core::event::Event::name).collect()
}
