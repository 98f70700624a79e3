//! Event handlers (reducers) — one pure state transition per event kind.
//!
//! `apply` takes the aggregate by value and returns the next aggregate.
//! Reducers perform no validation (that already happened in the command
//! handler) and no I/O; they must be applied in exactly the order the
//! command handler produced the drafts, because later events in the same
//! command depend on the intermediate aggregate.

use chrono::{DateTime, Utc};
use roundtable_core::error::RoomError;
use roundtable_core::event::{Event, EventKind};
use roundtable_core::room::{Room, Story, User};

/// Folds one event into the aggregate and stamps `last_activity`.
///
/// `roomCreated` constructs the aggregate; every other event requires one.
///
/// # Errors
///
/// Returns `RoomError::Internal` when a non-creating event arrives without
/// an aggregate or references a missing entity — both indicate a bug in the
/// handler/processor pipeline, not caller input.
pub fn apply(
    room: Option<Room>,
    event: &Event,
    now: DateTime<Utc>,
) -> Result<Room, RoomError> {
    let mut room = match (&event.kind, room) {
        (EventKind::RoomCreated(_), _) => Room::new(event.room_id.clone(), now),
        (_, Some(room)) => room,
        (kind, None) => {
            return Err(RoomError::Internal(format!(
                "event {} applied to missing room {}",
                kind.name(),
                event.room_id
            )));
        }
    };

    match &event.kind {
        EventKind::RoomCreated(_) => {}
        EventKind::UserJoined(p) => {
            let user = room.users.entry(event.user_id).or_insert_with(|| User {
                id: event.user_id,
                username: String::new(),
                email: None,
                avatar: 0,
                excluded: false,
                disconnected: false,
            });
            // re-join keeps the excluded flag, clears the disconnected one
            user.username.clone_from(&p.username);
            user.email.clone_from(&p.email);
            user.avatar = p.avatar;
            user.disconnected = false;
        }
        EventKind::LeftRoom(_) => {
            // estimations are kept; exports after departure still need them
            room.users.remove(&event.user_id);
        }
        EventKind::ConnectionLost(_) => {
            if let Some(user) = room.users.get_mut(&event.user_id) {
                user.disconnected = true;
            }
        }
        EventKind::UsernameSet(p) => {
            if let Some(user) = room.users.get_mut(&event.user_id) {
                user.username.clone_from(&p.username);
            }
        }
        EventKind::EmailSet(p) => {
            if let Some(user) = room.users.get_mut(&event.user_id) {
                user.email = Some(p.email.clone());
            }
        }
        EventKind::AvatarSet(p) => {
            if let Some(user) = room.users.get_mut(&event.user_id) {
                user.avatar = p.avatar;
            }
        }
        EventKind::ExcludedFromEstimations(_) => {
            if let Some(user) = room.users.get_mut(&event.user_id) {
                user.excluded = true;
            }
        }
        EventKind::IncludedInEstimations(_) => {
            if let Some(user) = room.users.get_mut(&event.user_id) {
                user.excluded = false;
            }
        }
        EventKind::CardConfigSet(p) => {
            room.card_config.clone_from(&p.card_config);
        }
        EventKind::StoryAdded(p) => {
            room.stories.insert(
                p.story_id,
                Story::new(p.story_id, p.title.clone(), p.description.clone()),
            );
        }
        EventKind::StorySelected(p) => {
            room.selected_story_id = Some(p.story_id);
        }
        EventKind::StoryEstimateGiven(p) => {
            story_mut(&mut room, p.story_id, "storyEstimateGiven")?
                .estimations
                .insert(event.user_id, p.value);
        }
        EventKind::StoryEstimateCleared(p) => {
            story_mut(&mut room, p.story_id, "storyEstimateCleared")?
                .estimations
                .remove(&event.user_id);
        }
        EventKind::NewEstimationRoundStarted(p) => {
            let story = story_mut(&mut room, p.story_id, "newEstimationRoundStarted")?;
            story.estimations.clear();
            story.revealed = false;
            story.consensus = None;
        }
        EventKind::Revealed(p) => {
            story_mut(&mut room, p.story_id, "revealed")?.revealed = true;
        }
        EventKind::ConsensusAchieved(p) => {
            story_mut(&mut room, p.story_id, "consensusAchieved")?.consensus = Some(p.value);
        }
        EventKind::Kicked(p) => {
            // the kicked user's estimations stay on every story; the
            // moderator may want to export them after participants left
            room.users.remove(&p.user_id);
        }
    }

    room.last_activity = now;
    Ok(room)
}

fn story_mut<'a>(
    room: &'a mut Room,
    story_id: uuid::Uuid,
    event_name: &str,
) -> Result<&'a mut Story, RoomError> {
    let room_id = room.id.clone();
    room.stories.get_mut(&story_id).ok_or_else(|| {
        RoomError::Internal(format!(
            "event {event_name} references missing story {story_id} in room {room_id}"
        ))
    })
}
