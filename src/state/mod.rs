pub mod game;
pub mod room;
pub mod state_machine;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::state::room::Room;

/// Shared handle to the central application state.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected participant.
pub struct PlayerConnection {
    /// Participant id minted for this connection.
    pub id: Uuid,
    /// Writer-task channel of the participant's WebSocket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the room registry, the connection table, and
/// the immutable runtime configuration.
///
/// Each room is wrapped in its own mutex; every handler (and the deadline
/// task) locks it for the full duration of the operation, which gives the
/// run-to-completion semantics the session engine relies on. Rooms are fully
/// independent and process concurrently.
pub struct AppState {
    config: AppConfig,
    rooms: DashMap<String, Arc<Mutex<Room>>>,
    connections: DashMap<Uuid, PlayerConnection>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            rooms: DashMap::new(),
            connections: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of active participant sockets keyed by participant id.
    pub fn connections(&self) -> &DashMap<Uuid, PlayerConnection> {
        &self.connections
    }

    /// Look up an existing room by its normalized code.
    pub fn room(&self, code: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(code).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a room, creating it on first reference.
    pub fn room_or_create(&self, code: &str) -> Arc<Mutex<Room>> {
        let entry = self
            .rooms
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Room::new(code.to_string()))));
        Arc::clone(entry.value())
    }

    /// Drop a room from the registry.
    pub fn remove_room(&self, code: &str) {
        self.rooms.remove(code);
    }

    /// Number of rooms currently alive.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Snapshot of every registered room.
    ///
    /// Collected up front so callers never hold a registry shard guard while
    /// awaiting a room lock.
    pub fn rooms_snapshot(&self) -> Vec<(String, Arc<Mutex<Room>>)> {
        self.rooms
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }
}
