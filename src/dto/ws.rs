use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::{validate_clue_text, validate_display_name, validate_room_code};

/// Messages accepted from participant WebSocket clients.
///
/// Every action carries the room code it targets; routing never depends on
/// connection-level state beyond the participant id.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter (or create) a room under a display name.
    Join {
        /// Raw room code; normalized to uppercase by the registry.
        room: String,
        /// Display name shown to the rest of the room.
        name: String,
    },
    /// Host-only: start a round from the lobby.
    Start {
        /// Target room code.
        room: String,
    },
    /// Submit the clue text for one of the sender's assigned prompts.
    SubmitClue {
        /// Target room code.
        room: String,
        /// Prompt the clue answers; must belong to the sender.
        prompt_id: Uuid,
        /// Free-text hint; must be non-empty after trimming.
        text: String,
    },
    /// Move the shared estimate for the prompt currently being guessed.
    UpdateGuess {
        /// Target room code.
        room: String,
        /// Prompt the update targets; must be the current one.
        prompt_id: Uuid,
        /// Proposed estimate; clamped into `[0, 100]`.
        value: f64,
    },
    /// Accept the current shared estimate.
    Ready {
        /// Target room code.
        room: String,
        /// Prompt the vote targets; must be the current one.
        prompt_id: Uuid,
    },
    /// Host-only: move to the next prompt after a reveal.
    Advance {
        /// Target room code.
        room: String,
    },
    /// Host-only: discard the round and return to the lobby.
    ToLobby {
        /// Target room code.
        room: String,
    },
    /// Host-only: start a fresh round from the final score screen.
    Restart {
        /// Target room code.
        room: String,
    },
    /// Unrecognized message type; always discarded.
    #[serde(other)]
    Unknown,
}

/// Error raised while turning a raw text frame into a usable action.
#[derive(Debug, Error)]
pub enum ParseMessageError {
    /// The frame was not valid JSON for any known message shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    /// The frame parsed but one of its fields failed validation.
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationErrors),
}

impl ClientMessage {
    /// Parse and validate a raw JSON text frame.
    pub fn from_json_str(raw: &str) -> Result<Self, ParseMessageError> {
        let message: Self = serde_json::from_str(raw)?;
        message.validate()?;
        Ok(message)
    }

    /// Room code the action targets, when it carries one.
    pub fn room(&self) -> Option<&str> {
        match self {
            Self::Join { room, .. }
            | Self::Start { room }
            | Self::SubmitClue { room, .. }
            | Self::UpdateGuess { room, .. }
            | Self::Ready { room, .. }
            | Self::Advance { room }
            | Self::ToLobby { room }
            | Self::Restart { room } => Some(room),
            Self::Unknown => None,
        }
    }
}

impl Validate for ClientMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(room) = self.room() {
            if let Err(e) = validate_room_code(room) {
                errors.add("room", e);
            }
        }

        match self {
            Self::Join { name, .. } => {
                if let Err(e) = validate_display_name(name) {
                    errors.add("name", e);
                }
            }
            Self::SubmitClue { text, .. } => {
                if let Err(e) = validate_clue_text(text) {
                    errors.add("text", e);
                }
            }
            _ => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
