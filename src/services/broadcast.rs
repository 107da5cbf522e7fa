use axum::extract::ws::Message;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::events::{
        GuessStatus, PhaseChangedEvent, PlayerSummary, PromptCurrentEvent, RoomSnapshot,
        ServerMessage, WriteStatus,
    },
    state::{SharedState, room::Room, state_machine::GamePhase},
};

/// Serialize a payload and push it onto the provided connection channel.
///
/// Serialization failures are permanent (a bug in the payload type), so they
/// are logged and swallowed; a closed writer just means the participant is
/// gone and the registry will catch up on disconnect.
pub fn send_message_to_websocket<T>(tx: &mpsc::UnboundedSender<Message>, value: &T, context: &str)
where
    T: ?Sized + Serialize,
{
    match serde_json::to_string(value) {
        Ok(payload) => {
            let _ = tx.send(Message::Text(payload.into()));
        }
        Err(err) => warn!(context, error = %err, "failed to serialize outbound payload"),
    }
}

/// Deliver a message to a single participant, if still connected.
pub fn send_to_participant(state: &SharedState, participant: Uuid, message: &ServerMessage) {
    let Some(connection) = state.connections().get(&participant) else {
        return;
    };

    let tx = connection.tx.clone();
    drop(connection);

    send_message_to_websocket(&tx, message, "addressed delivery");
}

/// Deliver a message to every participant of the room.
pub fn broadcast_to_room(state: &SharedState, room: &Room, message: &ServerMessage) {
    for participant in room.players.keys() {
        send_to_participant(state, *participant, message);
    }
}

/// Compose the full room snapshot as clients see it.
pub fn room_snapshot(room: &Room) -> RoomSnapshot {
    let game = room.game.as_ref();

    RoomSnapshot {
        code: room.code.clone(),
        phase: room.phase().into(),
        players: room
            .players
            .iter()
            .map(|(id, name)| PlayerSummary {
                id: *id,
                name: name.clone(),
            })
            .collect(),
        host_id: room.host_id,
        score: game.map(|game| game.score),
        max_score: game.and_then(|game| {
            matches!(game.phase, GamePhase::Guess | GamePhase::Over(_)).then_some(game.max_score)
        }),
        write: game.and_then(WriteStatus::from_game),
        guess: game.and_then(GuessStatus::from_game),
        reason: match room.phase() {
            GamePhase::Over(reason) => Some(reason.into()),
            _ => None,
        },
    }
}

/// Compose the phase-change notice for the room's current phase.
pub fn phase_changed_event(room: &Room) -> PhaseChangedEvent {
    let game = room.game.as_ref();

    PhaseChangedEvent {
        phase: room.phase().into(),
        write: game.and_then(WriteStatus::from_game),
        guess: game.and_then(GuessStatus::from_game),
        reason: match room.phase() {
            GamePhase::Over(reason) => Some(reason.into()),
            _ => None,
        },
    }
}

/// Compose the negotiation context for the prompt under the cursor.
pub fn prompt_current_event(room: &Room) -> Option<PromptCurrentEvent> {
    let game = room.game.as_ref()?;
    let prompt_id = game.current_prompt_id()?;
    let clue = game.clues.get(&prompt_id)?;

    Some(PromptCurrentEvent {
        prompt_id,
        clue: clue.text.clone(),
        scale: (&clue.scale).into(),
        author_name: clue.author_name.clone(),
        guess_value: game.guess_value,
        required_ready: room.required_ready_count(),
        index: game.current_index,
        total: game.guess_order.len(),
    })
}

/// Broadcast the room snapshot to the whole room.
pub fn broadcast_room_state(state: &SharedState, room: &Room) {
    broadcast_to_room(state, room, &ServerMessage::RoomState(room_snapshot(room)));
}

/// Broadcast a phase-change notice to the whole room.
pub fn broadcast_phase_changed(state: &SharedState, room: &Room) {
    broadcast_to_room(
        state,
        room,
        &ServerMessage::PhaseChanged(phase_changed_event(room)),
    );
}

/// Broadcast the current prompt to the whole room, target withheld.
pub fn broadcast_prompt_current(state: &SharedState, room: &Room) {
    if let Some(event) = prompt_current_event(room) {
        broadcast_to_room(state, room, &ServerMessage::PromptCurrent(event));
    }
}
