//! The room aggregate — pure data, no behavior.
//!
//! A room is the consistency boundary for one estimation session: its users,
//! its stories and the story currently under estimation. It is mutated
//! exclusively by folding events; see the engine crate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One selectable estimation card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Label shown to users (e.g. `"1/2"`, `"13"`, `"?"`).
    pub label: String,
    /// Numeric value recorded when this card is played.
    pub value: f64,
}

/// Ordered sequence of permitted estimation values.
pub type CardConfig = Vec<Card>;

/// The default deck applied on room creation.
#[must_use]
pub fn default_card_config() -> CardConfig {
    [
        ("?", -2.0),
        ("1/2", 0.5),
        ("1", 1.0),
        ("2", 2.0),
        ("3", 3.0),
        ("5", 5.0),
        ("8", 8.0),
        ("13", 13.0),
        ("21", 21.0),
        ("34", 34.0),
        ("55", 55.0),
    ]
    .into_iter()
    .map(|(label, value)| Card {
        label: label.to_owned(),
        value,
    })
    .collect()
}

/// A participant of an estimation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Optional email address (used for gravatar-style icons downstream).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Index into the fixed avatar icon set.
    pub avatar: usize,
    /// Excluded users never count toward reveal/consensus and cannot
    /// estimate.
    pub excluded: bool,
    /// Disconnected users keep their prior estimate but do not count toward
    /// the "everybody estimated" check.
    pub disconnected: bool,
}

/// A story (work item) to be estimated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Unique story identifier.
    pub id: Uuid,
    /// Story title.
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Recorded estimates by user id. Entries may outlive their user; the
    /// numeric history is deliberately retained after kicks and departures.
    #[serde(default)]
    pub estimations: HashMap<Uuid, f64>,
    /// Whether the estimates for this round have been disclosed.
    pub revealed: bool,
    /// Set only when the story is revealed and every eligible estimate has
    /// the identical value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus: Option<f64>,
}

impl Story {
    /// Creates a fresh, unestimated story.
    #[must_use]
    pub fn new(id: Uuid, title: String, description: Option<String>) -> Self {
        Self {
            id,
            title,
            description,
            estimations: HashMap::new(),
            revealed: false,
            consensus: None,
        }
    }
}

/// The aggregate root: one estimation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique room identifier (user-visible, part of the room URL upstream).
    pub id: String,
    /// Participants by user id.
    #[serde(default)]
    pub users: HashMap<Uuid, User>,
    /// Stories by story id.
    #[serde(default)]
    pub stories: HashMap<Uuid, Story>,
    /// The story currently under estimation, if any. Must reference an
    /// existing entry in `stories`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_story_id: Option<Uuid>,
    /// Permitted estimation values for this room.
    pub card_config: CardConfig,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Stamped on every applied event; consulted by housekeeping.
    pub last_activity: DateTime<Utc>,
    /// Owned by the housekeeping sweep, never set by command or event
    /// handlers.
    #[serde(default)]
    pub marked_for_deletion: bool,
}

impl Room {
    /// Creates an empty room with the default deck.
    #[must_use]
    pub fn new(id: String, created: DateTime<Utc>) -> Self {
        Self {
            id,
            users: HashMap::new(),
            stories: HashMap::new(),
            selected_story_id: None,
            card_config: default_card_config(),
            created,
            last_activity: created,
            marked_for_deletion: false,
        }
    }
}
