use thiserror::Error;
use uuid::Uuid;

use crate::state::state_machine::InvalidTransition;

/// Reasons the engine rejects an inbound participant action.
///
/// Rejections never produce an error reply on the wire: the WebSocket layer
/// logs the reason and discards the action, and clients treat the absence of
/// a state change as the rejection signal.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Acting participant does not hold the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested room or prompt was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Action references a prompt that is no longer the current one.
    #[error("stale prompt `{0}`")]
    StalePrompt(Uuid),
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}
