//! Command handlers — one per command kind.
//!
//! Handlers check business preconditions against the current aggregate and,
//! on success, produce an ordered list of event drafts. They never touch the
//! store and never mutate the aggregate; each violated rule fails fast with
//! a `Precondition` error naming that rule.

use roundtable_core::command::{
    AddStoryPayload, ClearStoryEstimatePayload, Command, CommandBody, GiveStoryEstimatePayload,
    JoinRoomPayload, KickUserPayload, NewEstimationRoundPayload, RevealPayload, SelectStoryPayload,
    SetCardConfigPayload,
};
use roundtable_core::error::RoomError;
use roundtable_core::event::{
    AvatarSetPayload, CardConfigSetPayload, ConnectionLostPayload, EmailSetPayload, EventKind,
    ExcludedFromEstimationsPayload, IncludedInEstimationsPayload, KickedPayload, LeftRoomPayload,
    NewEstimationRoundStartedPayload, RevealedPayload, RoomCreatedPayload, StoryAddedPayload,
    StoryEstimateClearedPayload, StoryEstimateGivenPayload, StorySelectedPayload,
    UserJoinedPayload, UsernameSetPayload,
};
use roundtable_core::room::{Room, Story};
use uuid::Uuid;

/// Dispatches the command to its handler and returns the ordered event
/// drafts.
///
/// `joinRoom` is the only command that may target a room that does not exist
/// yet; every other command requires the room to exist and the acting user
/// to be part of it.
///
/// # Errors
///
/// Returns `RoomError::NotFound` for a missing room and
/// `RoomError::Precondition` for any violated business rule.
pub fn handle_command(
    command: &Command,
    room: Option<&Room>,
    acting_user_id: Uuid,
) -> Result<Vec<EventKind>, RoomError> {
    match &command.body {
        CommandBody::JoinRoom(p) => Ok(join_room(p, room)),
        CommandBody::LeaveRoom(_) => {
            member_room(command, room, acting_user_id)?;
            Ok(vec![EventKind::LeftRoom(LeftRoomPayload {})])
        }
        CommandBody::ConnectionLost(_) => {
            member_room(command, room, acting_user_id)?;
            Ok(vec![EventKind::ConnectionLost(ConnectionLostPayload {})])
        }
        CommandBody::SetUsername(p) => {
            member_room(command, room, acting_user_id)?;
            Ok(vec![EventKind::UsernameSet(UsernameSetPayload {
                username: p.username.clone(),
            })])
        }
        CommandBody::SetEmail(p) => {
            member_room(command, room, acting_user_id)?;
            Ok(vec![EventKind::EmailSet(EmailSetPayload {
                email: p.email.clone(),
            })])
        }
        CommandBody::SetAvatar(p) => {
            member_room(command, room, acting_user_id)?;
            Ok(vec![EventKind::AvatarSet(AvatarSetPayload {
                avatar: p.avatar,
            })])
        }
        CommandBody::ToggleExclude(_) => Ok(toggle_exclude(
            member_room(command, room, acting_user_id)?,
            acting_user_id,
        )),
        CommandBody::SetCardConfig(p) => {
            member_room(command, room, acting_user_id)?;
            Ok(set_card_config(p))
        }
        CommandBody::AddStory(p) => Ok(add_story(p, member_room(command, room, acting_user_id)?)),
        CommandBody::SelectStory(p) => {
            select_story(p, member_room(command, room, acting_user_id)?)
        }
        CommandBody::GiveStoryEstimate(p) => give_story_estimate(
            p,
            member_room(command, room, acting_user_id)?,
            acting_user_id,
        ),
        CommandBody::ClearStoryEstimate(p) => clear_story_estimate(
            p,
            member_room(command, room, acting_user_id)?,
            acting_user_id,
        ),
        CommandBody::NewEstimationRound(p) => {
            new_estimation_round(p, member_room(command, room, acting_user_id)?)
        }
        CommandBody::Reveal(p) => reveal(p, member_room(command, room, acting_user_id)?),
        CommandBody::KickUser(p) => kick_user(
            p,
            member_room(command, room, acting_user_id)?,
            acting_user_id,
        ),
    }
}

/// Resolves the target room for a non-creating command: it must exist and
/// the acting user must be part of it.
fn member_room<'a>(
    command: &Command,
    room: Option<&'a Room>,
    acting_user_id: Uuid,
) -> Result<&'a Room, RoomError> {
    let room = room.ok_or_else(|| RoomError::NotFound(command.room_id.clone()))?;
    if !room.users.contains_key(&acting_user_id) {
        return Err(RoomError::Precondition(format!(
            "User {acting_user_id} is not part of room {}",
            room.id
        )));
    }
    Ok(room)
}

/// No precondition beyond schema validity. Emits an implicit room-creation
/// event first when the room does not exist yet.
fn join_room(payload: &JoinRoomPayload, room: Option<&Room>) -> Vec<EventKind> {
    let mut drafts = Vec::new();
    if room.is_none() {
        drafts.push(EventKind::RoomCreated(RoomCreatedPayload {}));
    }
    drafts.push(EventKind::UserJoined(UserJoinedPayload {
        username: payload.username.clone(),
        email: payload.email.clone(),
        avatar: payload.avatar.unwrap_or(0),
    }));
    drafts
}

fn toggle_exclude(room: &Room, acting_user_id: Uuid) -> Vec<EventKind> {
    let currently_excluded = room
        .users
        .get(&acting_user_id)
        .is_some_and(|u| u.excluded);
    if currently_excluded {
        vec![EventKind::IncludedInEstimations(
            IncludedInEstimationsPayload {},
        )]
    } else {
        vec![EventKind::ExcludedFromEstimations(
            ExcludedFromEstimationsPayload {},
        )]
    }
}

fn set_card_config(payload: &SetCardConfigPayload) -> Vec<EventKind> {
    vec![EventKind::CardConfigSet(CardConfigSetPayload {
        card_config: payload.card_config.clone(),
    })]
}

/// Emits `storyAdded` with a freshly generated story id; the room's first
/// story is additionally selected.
fn add_story(payload: &AddStoryPayload, room: &Room) -> Vec<EventKind> {
    let story_id = Uuid::new_v4();
    let mut drafts = vec![EventKind::StoryAdded(StoryAddedPayload {
        story_id,
        title: payload.title.clone(),
        description: payload.description.clone(),
    })];
    if room.stories.is_empty() {
        drafts.push(EventKind::StorySelected(StorySelectedPayload { story_id }));
    }
    drafts
}

fn select_story(payload: &SelectStoryPayload, room: &Room) -> Result<Vec<EventKind>, RoomError> {
    if !room.stories.contains_key(&payload.story_id) {
        return Err(RoomError::Precondition(format!(
            "Story {} is not part of room {}",
            payload.story_id, room.id
        )));
    }
    Ok(vec![EventKind::StorySelected(StorySelectedPayload {
        story_id: payload.story_id,
    })])
}

fn give_story_estimate(
    payload: &GiveStoryEstimatePayload,
    room: &Room,
    acting_user_id: Uuid,
) -> Result<Vec<EventKind>, RoomError> {
    let story = selected_story(room, payload.story_id, || {
        "Can only give estimation for currently selected story!".to_owned()
    })?;
    if story.revealed {
        return Err(RoomError::Precondition(
            "You cannot give an estimate for a story that was revealed!".into(),
        ));
    }
    ensure_not_excluded(room, acting_user_id, || {
        "Users that are excluded from estimations cannot give estimations!".to_owned()
    })?;

    Ok(vec![EventKind::StoryEstimateGiven(
        StoryEstimateGivenPayload {
            story_id: payload.story_id,
            value: payload.value,
        },
    )])
}

fn clear_story_estimate(
    payload: &ClearStoryEstimatePayload,
    room: &Room,
    acting_user_id: Uuid,
) -> Result<Vec<EventKind>, RoomError> {
    let story = selected_story(room, payload.story_id, || {
        "Can only clear estimation for currently selected story!".to_owned()
    })?;
    if story.revealed {
        return Err(RoomError::Precondition(
            "You cannot clear an estimate for a story that was revealed!".into(),
        ));
    }
    ensure_not_excluded(room, acting_user_id, || {
        "Users that are excluded from estimations cannot clear estimations!".to_owned()
    })?;

    Ok(vec![EventKind::StoryEstimateCleared(
        StoryEstimateClearedPayload {
            story_id: payload.story_id,
        },
    )])
}

fn new_estimation_round(
    payload: &NewEstimationRoundPayload,
    room: &Room,
) -> Result<Vec<EventKind>, RoomError> {
    selected_story(room, payload.story_id, || {
        "Can only start a new round for the currently selected story!".to_owned()
    })?;
    Ok(vec![EventKind::NewEstimationRoundStarted(
        NewEstimationRoundStartedPayload {
            story_id: payload.story_id,
        },
    )])
}

/// Excluded users are explicitly permitted to trigger a manual reveal.
fn reveal(payload: &RevealPayload, room: &Room) -> Result<Vec<EventKind>, RoomError> {
    let story = selected_story(room, payload.story_id, || {
        "Can only reveal currently selected story!".to_owned()
    })?;
    if story.revealed {
        return Err(RoomError::Precondition("Story is already revealed".into()));
    }
    Ok(vec![EventKind::Revealed(RevealedPayload {
        story_id: payload.story_id,
        manually: true,
    })])
}

fn kick_user(
    payload: &KickUserPayload,
    room: &Room,
    acting_user_id: Uuid,
) -> Result<Vec<EventKind>, RoomError> {
    if payload.user_id == acting_user_id {
        return Err(RoomError::Precondition(
            "You cannot kick yourself from the room!".into(),
        ));
    }
    if !room.users.contains_key(&payload.user_id) {
        return Err(RoomError::Precondition(format!(
            "User {} is not part of room {}",
            payload.user_id, room.id
        )));
    }
    Ok(vec![EventKind::Kicked(KickedPayload {
        user_id: payload.user_id,
    })])
}

fn selected_story<'a, F>(
    room: &'a Room,
    story_id: Uuid,
    message: F,
) -> Result<&'a Story, RoomError>
where
    F: FnOnce() -> String,
{
    if room.selected_story_id != Some(story_id) {
        return Err(RoomError::Precondition(message()));
    }
    room.stories.get(&story_id).ok_or_else(|| {
        RoomError::Internal(format!(
            "selected story {story_id} is missing from room {}",
            room.id
        ))
    })
}

fn ensure_not_excluded<F>(room: &Room, user_id: Uuid, message: F) -> Result<(), RoomError>
where
    F: FnOnce() -> String,
{
    if room.users.get(&user_id).is_some_and(|u| u.excluded) {
        return Err(RoomError::Precondition(message()));
    }
    Ok(())
}
