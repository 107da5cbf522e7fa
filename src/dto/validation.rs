//! Validation helpers for inbound WebSocket messages.

use validator::ValidationError;

/// Longest accepted room code, after trimming.
const ROOM_CODE_MAX_CHARS: usize = 12;
/// Longest accepted display name, after trimming.
const NAME_MAX_CHARS: usize = 32;
/// Longest accepted clue text, after trimming.
const CLUE_MAX_CHARS: usize = 200;

/// Validates that a room code is non-empty alphanumeric ASCII of at most
/// twelve characters once surrounding whitespace is trimmed.
///
/// Case is not validated here; codes are normalized to uppercase by the
/// registry before lookup.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.chars().count() > ROOM_CODE_MAX_CHARS {
        let mut err = ValidationError::new("room_code_length");
        err.message =
            Some(format!("Room code must be 1 to {ROOM_CODE_MAX_CHARS} characters").into());
        return Err(err);
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code must contain only ASCII letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a display name is non-empty and reasonably short.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > NAME_MAX_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message =
            Some(format!("Display name must be 1 to {NAME_MAX_CHARS} characters").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that clue text is non-empty after trimming and fits the cap.
///
/// Content is deliberately not inspected; any free text is a valid clue.
pub fn validate_clue_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > CLUE_MAX_CHARS {
        let mut err = ValidationError::new("clue_text_length");
        err.message = Some(format!("Clue text must be 1 to {CLUE_MAX_CHARS} characters").into());
        return Err(err);
    }

    Ok(())
}
