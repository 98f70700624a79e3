//! Event envelope and the closed set of event kinds.
//!
//! Events are immutable, already-authorized facts. They are produced by
//! command handlers (and, for derived reveal/consensus, by the processor)
//! and folded into the aggregate by the pure reducers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::CardConfig;

/// Payload of `roomCreated` — the implicit first event of a new room. The
/// room id travels in the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomCreatedPayload {}

/// Payload of `userJoined` — inserts or updates the acting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserJoinedPayload {
    /// Display name.
    pub username: String,
    /// Optional email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar index.
    pub avatar: usize,
}

/// Payload of `leftRoom` — the acting user left voluntarily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeftRoomPayload {}

/// Payload of `connectionLost` — the acting user's connection dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionLostPayload {}

/// Payload of `usernameSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UsernameSetPayload {
    /// The new display name.
    pub username: String,
}

/// Payload of `emailSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmailSetPayload {
    /// The new email address.
    pub email: String,
}

/// Payload of `avatarSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AvatarSetPayload {
    /// The new avatar index.
    pub avatar: usize,
}

/// Payload of `excludedFromEstimations` — the acting user no longer counts
/// toward reveal/consensus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludedFromEstimationsPayload {}

/// Payload of `includedInEstimations` — the acting user counts again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludedInEstimationsPayload {}

/// Payload of `cardConfigSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CardConfigSetPayload {
    /// The room's new deck.
    pub card_config: CardConfig,
}

/// Payload of `storyAdded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoryAddedPayload {
    /// Freshly generated story id.
    pub story_id: Uuid,
    /// Story title.
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload of `storySelected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StorySelectedPayload {
    /// The story now under estimation.
    pub story_id: Uuid,
}

/// Payload of `storyEstimateGiven`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoryEstimateGivenPayload {
    /// The estimated story.
    pub story_id: Uuid,
    /// The recorded value. Overwrites any prior value from the same user.
    pub value: f64,
}

/// Payload of `storyEstimateCleared`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoryEstimateClearedPayload {
    /// The story whose estimate was retracted.
    pub story_id: Uuid,
}

/// Payload of `newEstimationRoundStarted` — resets estimates, reveal and
/// consensus for the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEstimationRoundStartedPayload {
    /// The story being reset.
    pub story_id: Uuid,
}

/// Payload of `revealed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RevealedPayload {
    /// The disclosed story.
    pub story_id: Uuid,
    /// `true` for an explicit `reveal` command, `false` when derived because
    /// every eligible user estimated.
    pub manually: bool,
}

/// Payload of `consensusAchieved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConsensusAchievedPayload {
    /// The story with matching estimates.
    pub story_id: Uuid,
    /// The agreed value.
    pub value: f64,
}

/// Payload of `kicked` — a user was removed; their estimations are retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KickedPayload {
    /// The removed user.
    pub user_id: Uuid,
}

/// The closed set of event kinds with their payloads.
///
/// Serializes to the wire shape `{"name": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "camelCase")]
pub enum EventKind {
    /// A previously unknown room came into existence.
    RoomCreated(RoomCreatedPayload),
    /// A user joined (or re-joined) the room.
    UserJoined(UserJoinedPayload),
    /// A user left the room voluntarily.
    LeftRoom(LeftRoomPayload),
    /// A user's connection dropped.
    ConnectionLost(ConnectionLostPayload),
    /// A user renamed themselves.
    UsernameSet(UsernameSetPayload),
    /// A user changed their email address.
    EmailSet(EmailSetPayload),
    /// A user changed their avatar.
    AvatarSet(AvatarSetPayload),
    /// A user opted out of estimating.
    ExcludedFromEstimations(ExcludedFromEstimationsPayload),
    /// A user opted back into estimating.
    IncludedInEstimations(IncludedInEstimationsPayload),
    /// The room's deck was replaced.
    CardConfigSet(CardConfigSetPayload),
    /// A story was added to the backlog.
    StoryAdded(StoryAddedPayload),
    /// A story was put under estimation.
    StorySelected(StorySelectedPayload),
    /// An estimate was recorded.
    StoryEstimateGiven(StoryEstimateGivenPayload),
    /// An estimate was retracted.
    StoryEstimateCleared(StoryEstimateClearedPayload),
    /// A revealed story was reset for fresh estimates.
    NewEstimationRoundStarted(NewEstimationRoundStartedPayload),
    /// The story's estimates were disclosed.
    Revealed(RevealedPayload),
    /// All eligible estimates matched.
    ConsensusAchieved(ConsensusAchievedPayload),
    /// A user was removed from the room.
    Kicked(KickedPayload),
}

impl EventKind {
    /// Returns the wire name of this event kind (for logging/broadcast).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => "roomCreated",
            Self::UserJoined(_) => "userJoined",
            Self::LeftRoom(_) => "leftRoom",
            Self::ConnectionLost(_) => "connectionLost",
            Self::UsernameSet(_) => "usernameSet",
            Self::EmailSet(_) => "emailSet",
            Self::AvatarSet(_) => "avatarSet",
            Self::ExcludedFromEstimations(_) => "excludedFromEstimations",
            Self::IncludedInEstimations(_) => "includedInEstimations",
            Self::CardConfigSet(_) => "cardConfigSet",
            Self::StoryAdded(_) => "storyAdded",
            Self::StorySelected(_) => "storySelected",
            Self::StoryEstimateGiven(_) => "storyEstimateGiven",
            Self::StoryEstimateCleared(_) => "storyEstimateCleared",
            Self::NewEstimationRoundStarted(_) => "newEstimationRoundStarted",
            Self::Revealed(_) => "revealed",
            Self::ConsensusAchieved(_) => "consensusAchieved",
            Self::Kicked(_) => "kicked",
        }
    }
}

/// The event envelope reported to the caller (which owns broadcasting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Opaque unique event token.
    pub id: Uuid,
    /// The id of the command that produced this event.
    pub correlation_id: Uuid,
    /// The room this event belongs to.
    pub room_id: String,
    /// The acting user.
    pub user_id: Uuid,
    /// Event kind and payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Returns the wire name of this event's kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}
