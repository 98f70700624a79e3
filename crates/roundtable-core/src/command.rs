//! Command envelope and the closed set of command kinds.
//!
//! Commands are requests to change room state. They are routed through a
//! closed tagged enum rather than by free-form name strings, so an unknown
//! command name already fails at deserialization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::CardConfig;

/// Payload of `joinRoom`. Joining an unknown room creates it implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinRoomPayload {
    /// Display name of the joining user.
    pub username: String,
    /// Optional email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Optional avatar index; defaults to the first icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<usize>,
}

/// Payload of `leaveRoom` — the acting user leaves voluntarily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveRoomPayload {}

/// Payload of `connectionLost` — the transport layer reports the acting
/// user's connection as gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionLostPayload {}

/// Payload of `setUsername`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetUsernamePayload {
    /// The new display name.
    pub username: String,
}

/// Payload of `setEmail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetEmailPayload {
    /// The new email address.
    pub email: String,
}

/// Payload of `setAvatar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetAvatarPayload {
    /// Index into the fixed avatar icon set.
    pub avatar: usize,
}

/// Payload of `toggleExclude` — flips the acting user's excluded flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleExcludePayload {}

/// Payload of `setCardConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetCardConfigPayload {
    /// The new deck for this room.
    pub card_config: CardConfig,
}

/// Payload of `addStory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddStoryPayload {
    /// Story title.
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload of `selectStory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectStoryPayload {
    /// The story to put under estimation.
    pub story_id: Uuid,
}

/// Payload of `giveStoryEstimate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GiveStoryEstimatePayload {
    /// The story being estimated; must be the currently selected story.
    pub story_id: Uuid,
    /// The estimated value.
    pub value: f64,
}

/// Payload of `clearStoryEstimate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClearStoryEstimatePayload {
    /// The story whose estimate to retract.
    pub story_id: Uuid,
}

/// Payload of `newEstimationRound` — resets a revealed story for fresh
/// estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEstimationRoundPayload {
    /// The story to reset; must be the currently selected story.
    pub story_id: Uuid,
}

/// Payload of `reveal` — manually disclose estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RevealPayload {
    /// The story to reveal; must be the currently selected story.
    pub story_id: Uuid,
}

/// Payload of `kickUser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KickUserPayload {
    /// The user to remove from the room.
    pub user_id: Uuid,
}

/// The closed set of command kinds with their payloads.
///
/// Serializes to the wire shape `{"name": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "camelCase")]
pub enum CommandBody {
    /// Join a room, creating it when unknown.
    JoinRoom(JoinRoomPayload),
    /// Leave the room voluntarily.
    LeaveRoom(LeaveRoomPayload),
    /// Mark the acting user as disconnected.
    ConnectionLost(ConnectionLostPayload),
    /// Change the acting user's display name.
    SetUsername(SetUsernamePayload),
    /// Change the acting user's email address.
    SetEmail(SetEmailPayload),
    /// Change the acting user's avatar.
    SetAvatar(SetAvatarPayload),
    /// Flip the acting user's excluded flag.
    ToggleExclude(ToggleExcludePayload),
    /// Replace the room's deck.
    SetCardConfig(SetCardConfigPayload),
    /// Add a story to the backlog.
    AddStory(AddStoryPayload),
    /// Put a story under estimation.
    SelectStory(SelectStoryPayload),
    /// Record an estimate for the selected story.
    GiveStoryEstimate(GiveStoryEstimatePayload),
    /// Retract the acting user's estimate for the selected story.
    ClearStoryEstimate(ClearStoryEstimatePayload),
    /// Reset the selected story for a new round.
    NewEstimationRound(NewEstimationRoundPayload),
    /// Manually disclose the selected story's estimates.
    Reveal(RevealPayload),
    /// Remove another user from the room.
    KickUser(KickUserPayload),
}

impl CommandBody {
    /// Returns the wire name of this command kind (for logging/routing).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "joinRoom",
            Self::LeaveRoom(_) => "leaveRoom",
            Self::ConnectionLost(_) => "connectionLost",
            Self::SetUsername(_) => "setUsername",
            Self::SetEmail(_) => "setEmail",
            Self::SetAvatar(_) => "setAvatar",
            Self::ToggleExclude(_) => "toggleExclude",
            Self::SetCardConfig(_) => "setCardConfig",
            Self::AddStory(_) => "addStory",
            Self::SelectStory(_) => "selectStory",
            Self::GiveStoryEstimate(_) => "giveStoryEstimate",
            Self::ClearStoryEstimate(_) => "clearStoryEstimate",
            Self::NewEstimationRound(_) => "newEstimationRound",
            Self::Reveal(_) => "reveal",
            Self::KickUser(_) => "kickUser",
        }
    }

    /// Whether this command may legally target a room that does not exist
    /// yet.
    #[must_use]
    pub fn creates_room(&self) -> bool {
        matches!(self, Self::JoinRoom(_))
    }
}

/// The command envelope handed to the processor.
///
/// The acting user id is supplied out-of-band by the transport/auth layer
/// and is deliberately not part of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Opaque unique command token; becomes the correlation id of every
    /// produced event.
    pub id: Uuid,
    /// The targeted room.
    pub room_id: String,
    /// Command kind and payload.
    #[serde(flatten)]
    pub body: CommandBody,
}

impl Command {
    /// Returns the wire name of this command's kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.body.name()
    }
}
