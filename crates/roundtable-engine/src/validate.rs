//! Command schema validation.
//!
//! Runs once per command, synchronously, before the aggregate is loaded.
//! Shape validation (required fields, types, unknown command names) is done
//! by the serde deserialization of the closed [`CommandBody`] enum; this
//! module adds the value-level constraints on top. Zero side effects on
//! failure.

use roundtable_core::command::{Command, CommandBody};
use roundtable_core::error::RoomError;
use roundtable_core::room::CardConfig;

const MAX_ROOM_ID_LENGTH: usize = 60;
const MAX_USERNAME_LENGTH: usize = 80;
const MAX_STORY_TITLE_LENGTH: usize = 100;

/// Deserializes a wire-format command envelope.
///
/// An unknown command name or a malformed payload fails here, before any
/// business logic runs.
///
/// # Errors
///
/// Returns `RoomError::Validation` describing the deserialization failure.
pub fn parse_command(value: serde_json::Value) -> Result<Command, RoomError> {
    serde_json::from_value(value).map_err(|e| RoomError::Validation(e.to_string()))
}

/// Validates the envelope and the per-command payload constraints.
///
/// # Errors
///
/// Returns `RoomError::Validation` naming the offending field.
pub fn validate(command: &Command) -> Result<(), RoomError> {
    validate_room_id(&command.room_id)?;

    match &command.body {
        CommandBody::JoinRoom(p) => {
            validate_username(&p.username)?;
            if let Some(email) = &p.email {
                validate_email(email)?;
            }
        }
        CommandBody::SetUsername(p) => validate_username(&p.username)?,
        CommandBody::SetEmail(p) => validate_email(&p.email)?,
        CommandBody::SetCardConfig(p) => validate_card_config(&p.card_config)?,
        CommandBody::AddStory(p) => validate_story_title(&p.title)?,
        CommandBody::GiveStoryEstimate(p) => {
            if !p.value.is_finite() {
                return Err(RoomError::Validation(
                    "Estimation value must be a finite number".into(),
                ));
            }
        }
        CommandBody::LeaveRoom(_)
        | CommandBody::ConnectionLost(_)
        | CommandBody::SetAvatar(_)
        | CommandBody::ToggleExclude(_)
        | CommandBody::SelectStory(_)
        | CommandBody::ClearStoryEstimate(_)
        | CommandBody::NewEstimationRound(_)
        | CommandBody::Reveal(_)
        | CommandBody::KickUser(_) => {}
    }

    Ok(())
}

fn validate_room_id(room_id: &str) -> Result<(), RoomError> {
    if room_id.is_empty() {
        return Err(RoomError::Validation("Room id must not be empty".into()));
    }
    if room_id.len() > MAX_ROOM_ID_LENGTH {
        return Err(RoomError::Validation(format!(
            "Room id must not exceed {MAX_ROOM_ID_LENGTH} characters"
        )));
    }
    if !room_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RoomError::Validation(
            "Room id may only contain alphanumeric characters, '-' and '_'".into(),
        ));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), RoomError> {
    if username.trim().is_empty() {
        return Err(RoomError::Validation("Username must not be empty".into()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(RoomError::Validation(format!(
            "Username must not exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), RoomError> {
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(RoomError::Validation(format!(
            "\"{email}\" is not a well-formed email address"
        )))
    }
}

fn validate_story_title(title: &str) -> Result<(), RoomError> {
    if title.trim().is_empty() {
        return Err(RoomError::Validation(
            "Story title must not be empty".into(),
        ));
    }
    if title.len() > MAX_STORY_TITLE_LENGTH {
        return Err(RoomError::Validation(format!(
            "Story title must not exceed {MAX_STORY_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_card_config(card_config: &CardConfig) -> Result<(), RoomError> {
    if card_config.is_empty() {
        return Err(RoomError::Validation(
            "Card configuration must contain at least one card".into(),
        ));
    }
    for card in card_config {
        if card.label.trim().is_empty() {
            return Err(RoomError::Validation(
                "Card labels must not be empty".into(),
            ));
        }
        if !card.value.is_finite() {
            return Err(RoomError::Validation(
                "Card values must be finite numbers".into(),
            ));
        }
    }
    let mut seen: Vec<u64> = card_config.iter().map(|c| c.value.to_bits()).collect();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != card_config.len() {
        return Err(RoomError::Validation(
            "Card values must be unique".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use roundtable_core::command::{CommandBody, GiveStoryEstimatePayload, JoinRoomPayload};
    use roundtable_core::room::Card;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn join_command(room_id: &str, username: &str, email: Option<&str>) -> Command {
        Command {
            id: Uuid::new_v4(),
            room_id: room_id.to_owned(),
            body: CommandBody::JoinRoom(JoinRoomPayload {
                username: username.to_owned(),
                email: email.map(ToOwned::to_owned),
                avatar: None,
            }),
        }
    }

    #[test]
    fn test_parses_wire_format_command() {
        let command = parse_command(json!({
            "id": Uuid::new_v4(),
            "roomId": "custom-room",
            "name": "giveStoryEstimate",
            "payload": {"storyId": Uuid::new_v4(), "value": 2}
        }))
        .unwrap();

        assert_eq!(command.room_id, "custom-room");
        assert!(matches!(
            command.body,
            CommandBody::GiveStoryEstimate(GiveStoryEstimatePayload { value, .. }) if value == 2.0
        ));
    }

    #[test]
    fn test_rejects_unknown_command_name() {
        let result = parse_command(json!({
            "id": Uuid::new_v4(),
            "roomId": "custom-room",
            "name": "doTheHarlemShake",
            "payload": {}
        }));

        assert!(matches!(result, Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_malformed_payload() {
        // value is required for giveStoryEstimate
        let result = parse_command(json!({
            "id": Uuid::new_v4(),
            "roomId": "custom-room",
            "name": "giveStoryEstimate",
            "payload": {"storyId": Uuid::new_v4()}
        }));

        assert!(matches!(result, Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_unknown_payload_fields() {
        let result = parse_command(json!({
            "id": Uuid::new_v4(),
            "roomId": "custom-room",
            "name": "reveal",
            "payload": {"storyId": Uuid::new_v4(), "sneaky": true}
        }));

        assert!(matches!(result, Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_accepts_valid_join_command() {
        let command = join_command("room-1", "john.doe", Some("j.doe@example.com"));
        assert!(validate(&command).is_ok());
    }

    #[test]
    fn test_rejects_empty_room_id() {
        let command = join_command("", "john.doe", None);
        assert!(matches!(validate(&command), Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_room_id_with_illegal_characters() {
        let command = join_command("no spaces!", "john.doe", None);
        assert!(matches!(validate(&command), Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_blank_username() {
        let command = join_command("room-1", "   ", None);
        assert!(matches!(validate(&command), Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_malformed_email() {
        for email in ["not-an-email", "@example.com", "a@b", "a b@example.com"] {
            let command = join_command("room-1", "john.doe", Some(email));
            assert!(
                matches!(validate(&command), Err(RoomError::Validation(_))),
                "email {email:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_non_finite_estimate() {
        let command = Command {
            id: Uuid::new_v4(),
            room_id: "room-1".to_owned(),
            body: CommandBody::GiveStoryEstimate(GiveStoryEstimatePayload {
                story_id: Uuid::new_v4(),
                value: f64::NAN,
            }),
        };
        assert!(matches!(validate(&command), Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_card_config() {
        let command = Command {
            id: Uuid::new_v4(),
            room_id: "room-1".to_owned(),
            body: CommandBody::SetCardConfig(roundtable_core::command::SetCardConfigPayload {
                card_config: vec![],
            }),
        };
        assert!(matches!(validate(&command), Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_rejects_duplicate_card_values() {
        let card = |label: &str, value: f64| Card {
            label: label.to_owned(),
            value,
        };
        let command = Command {
            id: Uuid::new_v4(),
            room_id: "room-1".to_owned(),
            body: CommandBody::SetCardConfig(roundtable_core::command::SetCardConfigPayload {
                card_config: vec![card("S", 1.0), card("M", 1.0)],
            }),
        };
        assert!(matches!(validate(&command), Err(RoomError::Validation(_))));
    }
}
