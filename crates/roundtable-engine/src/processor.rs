//! The command processor — one pass per inbound command.
//!
//! Pipeline: validate → load → handle → fold → persist → report. Failure in
//! any step before persist leaves the store untouched; a persist failure
//! discards the folded aggregate. Commands targeting the same room are
//! serialized through a per-room async mutex; commands for different rooms
//! proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use roundtable_core::clock::Clock;
use roundtable_core::command::{Command, CommandBody};
use roundtable_core::error::RoomError;
use roundtable_core::event::{ConsensusAchievedPayload, Event, EventKind, RevealedPayload};
use roundtable_core::room::Room;
use roundtable_core::store::RoomStore;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{command_handlers, event_handlers, validate};

/// Outcome of a successfully processed command. The caller owns broadcasting
/// the events; the processor has no knowledge of connected clients.
#[derive(Debug)]
pub struct CommandResult {
    /// The updated aggregate, as persisted.
    pub room: Room,
    /// All produced events, in fold order.
    pub events: Vec<Event>,
}

/// Orchestrates command validation, business rules, event folding and
/// persistence over an abstract [`RoomStore`].
pub struct CommandProcessor {
    store: Arc<dyn RoomStore>,
    clock: Arc<dyn Clock>,
    // entries are pruned after each pass once no other task holds them
    room_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CommandProcessor {
    /// Creates a processor over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn RoomStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Processes one command on behalf of `acting_user_id` and returns the
    /// updated aggregate together with all produced events.
    ///
    /// # Errors
    ///
    /// - `RoomError::Validation` — malformed envelope or payload; no store
    ///   access happened.
    /// - `RoomError::NotFound` — a non-creating command targeted an unknown
    ///   room.
    /// - `RoomError::Precondition` — a business rule was violated; no store
    ///   write happened.
    /// - `RoomError::Store` — the store failed; on save failure the folded
    ///   aggregate is discarded, never half-committed.
    pub async fn process(
        &self,
        command: Command,
        acting_user_id: Uuid,
    ) -> Result<CommandResult, RoomError> {
        let result = self.run(&command, acting_user_id).await;
        match &result {
            Ok(applied) => debug!(
                command = command.name(),
                room_id = %command.room_id,
                user_id = %acting_user_id,
                events = applied.events.len(),
                "command applied"
            ),
            Err(err) => warn!(
                command = command.name(),
                room_id = %command.room_id,
                user_id = %acting_user_id,
                %err,
                "command rejected"
            ),
        }
        result
    }

    async fn run(
        &self,
        command: &Command,
        acting_user_id: Uuid,
    ) -> Result<CommandResult, RoomError> {
        validate::validate(command)?;

        let lock = self.room_lock(&command.room_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(command, acting_user_id).await
        };
        self.prune_room_lock(&command.room_id, &lock).await;
        result
    }

    async fn run_locked(
        &self,
        command: &Command,
        acting_user_id: Uuid,
    ) -> Result<CommandResult, RoomError> {
        let loaded = self.store.get_room_by_id(&command.room_id).await?;
        let drafts = command_handlers::handle_command(command, loaded.as_ref(), acting_user_id)?;

        let now = self.clock.now();
        let mut events = Vec::with_capacity(drafts.len());
        let mut room = loaded;
        for kind in drafts {
            room = Some(fold(room, command, acting_user_id, kind, now, &mut events)?);
        }

        // Two-phase derivation: after folding an estimate, freshly re-check
        // whether everybody eligible has estimated, and on a match, whether
        // they agree. Never cached, never done by the command handler.
        if let CommandBody::GiveStoryEstimate(p) = &command.body {
            if let Some(current) = room.take() {
                room = Some(derive_reveal_and_consensus(
                    current,
                    p.story_id,
                    command,
                    acting_user_id,
                    now,
                    &mut events,
                )?);
            }
        }

        let room = room.ok_or_else(|| {
            RoomError::Internal(format!(
                "command {} produced no aggregate for room {}",
                command.name(),
                command.room_id
            ))
        })?;

        self.store.save_room(&room).await?;

        Ok(CommandResult { room, events })
    }

    /// Returns the mutex serializing all processing for one room id.
    async fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        Arc::clone(locks.entry(room_id.to_owned()).or_default())
    }

    /// Drops the registry entry for a room once nobody else holds its mutex.
    async fn prune_room_lock(&self, room_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.room_locks.lock().await;
        // two handles means the registry entry plus ours; any more and a
        // queued task still holds a clone
        if Arc::strong_count(lock) == 2 {
            locks.remove(room_id);
        }
    }
}

/// Enriches one draft into a full event, applies it and records it.
fn fold(
    room: Option<Room>,
    command: &Command,
    acting_user_id: Uuid,
    kind: EventKind,
    now: DateTime<Utc>,
    events: &mut Vec<Event>,
) -> Result<Room, RoomError> {
    let event = Event {
        id: Uuid::new_v4(),
        correlation_id: command.id,
        room_id: command.room_id.clone(),
        user_id: acting_user_id,
        kind,
    };
    let room = event_handlers::apply(room, &event, now)?;
    events.push(event);
    Ok(room)
}

fn derive_reveal_and_consensus(
    mut room: Room,
    story_id: Uuid,
    command: &Command,
    acting_user_id: Uuid,
    now: DateTime<Utc>,
    events: &mut Vec<Event>,
) -> Result<Room, RoomError> {
    if !all_eligible_estimated(&room, story_id) {
        return Ok(room);
    }
    room = fold(
        Some(room),
        command,
        acting_user_id,
        EventKind::Revealed(RevealedPayload {
            story_id,
            manually: false,
        }),
        now,
        events,
    )?;
    if let Some(value) = consensus_value(&room, story_id) {
        room = fold(
            Some(room),
            command,
            acting_user_id,
            EventKind::ConsensusAchieved(ConsensusAchievedPayload { story_id, value }),
            now,
            events,
        )?;
    }
    Ok(room)
}

/// Users who count toward the "everybody estimated" and consensus checks.
fn eligible_user_ids(room: &Room) -> Vec<Uuid> {
    room.users
        .values()
        .filter(|u| !u.excluded && !u.disconnected)
        .map(|u| u.id)
        .collect()
}

fn all_eligible_estimated(room: &Room, story_id: Uuid) -> bool {
    let Some(story) = room.stories.get(&story_id) else {
        return false;
    };
    let eligible = eligible_user_ids(room);
    !eligible.is_empty()
        && eligible
            .iter()
            .all(|id| story.estimations.contains_key(id))
}

/// The agreed value when all eligible estimations are numerically equal.
/// Estimate values are validated to be finite, so NaN cannot occur here and
/// plain comparison is exact (and treats `0.0` and `-0.0` as agreement).
#[allow(clippy::float_cmp)]
fn consensus_value(room: &Room, story_id: Uuid) -> Option<f64> {
    let story = room.stories.get(&story_id)?;
    let mut values = eligible_user_ids(room)
        .into_iter()
        .map(|id| story.estimations.get(&id).copied());
    let first = values.next()??;
    for value in values {
        if value? != first {
            return None;
        }
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use roundtable_core::room::{Story, User};

    use super::*;

    fn user(id: Uuid, excluded: bool, disconnected: bool) -> User {
        User {
            id,
            username: format!("user-{id}"),
            email: None,
            avatar: 0,
            excluded,
            disconnected,
        }
    }

    fn room_with(users: Vec<User>, estimations: &[(Uuid, f64)]) -> (Room, Uuid) {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut room = Room::new("r".to_owned(), created);
        for u in users {
            room.users.insert(u.id, u);
        }
        let story_id = Uuid::new_v4();
        let mut story = Story::new(story_id, "s".to_owned(), None);
        for (user_id, value) in estimations {
            story.estimations.insert(*user_id, *value);
        }
        room.stories.insert(story_id, story);
        room.selected_story_id = Some(story_id);
        (room, story_id)
    }

    #[test]
    fn test_all_eligible_estimated_ignores_excluded_and_disconnected() {
        let active = Uuid::new_v4();
        let excluded = Uuid::new_v4();
        let disconnected = Uuid::new_v4();
        let (room, story_id) = room_with(
            vec![
                user(active, false, false),
                user(excluded, true, false),
                user(disconnected, false, true),
            ],
            &[(active, 3.0)],
        );

        assert!(all_eligible_estimated(&room, story_id));
    }

    #[test]
    fn test_all_eligible_estimated_requires_at_least_one_eligible_user() {
        let excluded = Uuid::new_v4();
        let (room, story_id) = room_with(vec![user(excluded, true, false)], &[]);

        assert!(!all_eligible_estimated(&room, story_id));
    }

    #[test]
    fn test_consensus_value_only_considers_eligible_estimations() {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        let excluded = Uuid::new_v4();
        let (room, story_id) = room_with(
            vec![
                user(one, false, false),
                user(two, false, false),
                user(excluded, true, false),
            ],
            &[(one, 5.0), (two, 5.0), (excluded, 13.0)],
        );

        assert_eq!(consensus_value(&room, story_id), Some(5.0));
    }

    #[test]
    fn test_consensus_value_absent_on_mismatch() {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        let (room, story_id) = room_with(
            vec![user(one, false, false), user(two, false, false)],
            &[(one, 5.0), (two, 8.0)],
        );

        assert_eq!(consensus_value(&room, story_id), None);
    }

    #[test]
    fn test_consensus_value_treats_signed_zeros_as_equal() {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        let (room, story_id) = room_with(
            vec![user(one, false, false), user(two, false, false)],
            &[(one, 0.0), (two, -0.0)],
        );

        assert_eq!(consensus_value(&room, story_id), Some(0.0));
    }

    #[tokio::test]
    async fn test_room_lock_registry_empties_after_processing() {
        let processor = CommandProcessor::new(
            Arc::new(roundtable_test_support::RecordingRoomStore::new()),
            Arc::new(roundtable_test_support::FixedClock(
                Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            )),
        );
        let command = Command {
            id: Uuid::new_v4(),
            room_id: "r".to_owned(),
            body: CommandBody::JoinRoom(roundtable_core::command::JoinRoomPayload {
                username: "alice".to_owned(),
                email: None,
                avatar: None,
            }),
        };

        processor.process(command, Uuid::new_v4()).await.unwrap();

        assert!(processor.room_locks.lock().await.is_empty());
    }
}
