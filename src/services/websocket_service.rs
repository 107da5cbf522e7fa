use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{events::ServerMessage, ws::ClientMessage},
    error::ServiceError,
    services::{broadcast, room_service},
    state::{PlayerConnection, SharedState},
};

/// Handle the full lifecycle for an individual participant WebSocket connection.
///
/// A participant id is minted per connection and announced in a `welcome`
/// message; every subsequent inbound action acts under that identity. When
/// the socket closes for any reason the participant is removed from every
/// room containing them, which is the only disconnect handling the engine
/// needs.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let participant_id = Uuid::new_v4();
    state.connections().insert(
        participant_id,
        PlayerConnection {
            id: participant_id,
            tx: outbound_tx.clone(),
        },
    );
    broadcast::send_message_to_websocket(
        &outbound_tx,
        &ServerMessage::Welcome { participant_id },
        "welcome",
    );
    info!(id = %participant_id, "participant connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(action) => {
                    if let Err(err) = dispatch(&state, participant_id, action).await {
                        // Rejected actions are dropped without a reply; the
                        // absence of a state change is the signal clients get.
                        debug!(id = %participant_id, error = %err, "action discarded");
                    }
                }
                Err(err) => {
                    warn!(id = %participant_id, error = %err, "failed to parse or validate message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %participant_id, "participant closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %participant_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.connections().remove(&participant_id);
    room_service::leave(&state, participant_id).await;
    info!(id = %participant_id, "participant disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route a validated inbound action to the matching engine operation.
async fn dispatch(
    state: &SharedState,
    participant: Uuid,
    action: ClientMessage,
) -> Result<(), ServiceError> {
    match action {
        ClientMessage::Join { room, name } => {
            room_service::join(state, participant, &room, &name).await
        }
        ClientMessage::Start { room } => room_service::start(state, participant, &room).await,
        ClientMessage::SubmitClue {
            room,
            prompt_id,
            text,
        } => room_service::submit_clue(state, participant, &room, prompt_id, &text).await,
        ClientMessage::UpdateGuess {
            room,
            prompt_id,
            value,
        } => room_service::update_guess(state, participant, &room, prompt_id, value).await,
        ClientMessage::Ready { room, prompt_id } => {
            room_service::ready(state, participant, &room, prompt_id).await
        }
        ClientMessage::Advance { room } => room_service::advance(state, participant, &room).await,
        ClientMessage::ToLobby { room } => {
            room_service::to_lobby(state, participant, &room).await
        }
        ClientMessage::Restart { room } => room_service::restart(state, participant, &room).await,
        ClientMessage::Unknown => {
            Err(ServiceError::InvalidInput("unknown message type".into()))
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
