use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::{game::Game, state_machine::GamePhase};

/// An independent game instance identified by a short code.
///
/// The roster keeps insertion order: when the host leaves, the next player in
/// join order inherits the role.
#[derive(Debug)]
pub struct Room {
    /// Normalized uppercase code, unique key in the registry.
    pub code: String,
    /// Participant id to display name, in join order.
    pub players: IndexMap<Uuid, String>,
    /// Participant with start/advance/restart/reset privileges.
    pub host_id: Option<Uuid>,
    /// The live round; `None` while the room sits in the lobby.
    pub game: Option<Game>,
}

impl Room {
    /// Create an empty room for the given normalized code.
    pub fn new(code: String) -> Self {
        Self {
            code,
            players: IndexMap::new(),
            host_id: None,
            game: None,
        }
    }

    /// Current phase of the room; the lobby is the absence of a game.
    pub fn phase(&self) -> GamePhase {
        self.game
            .as_ref()
            .map_or(GamePhase::Lobby, |game| game.phase)
    }

    /// Whether `participant` holds the host role.
    pub fn is_host(&self, participant: Uuid) -> bool {
        self.host_id == Some(participant)
    }

    /// Add `participant` to the roster or update their display name.
    ///
    /// The first participant to enter an empty room becomes host.
    pub fn insert_player(&mut self, participant: Uuid, name: String) {
        self.players.insert(participant, name);
        if self.host_id.is_none() {
            self.host_id = Some(participant);
        }
    }

    /// Remove `participant` from the roster, passing the host role to the
    /// next remaining player in join order when needed.
    ///
    /// Returns `false` when the participant was not a member.
    pub fn remove_player(&mut self, participant: Uuid) -> bool {
        if self.players.shift_remove(&participant).is_none() {
            return false;
        }

        if self.host_id == Some(participant) {
            self.host_id = self.players.keys().next().copied();
        }

        true
    }

    /// Number of ready votes needed to force a reveal: everyone but the
    /// author of the current prompt, floored at zero.
    ///
    /// The roster size is used as-is; each prompt has exactly one author, so
    /// subtracting one always excludes exactly the author slot.
    pub fn required_ready_count(&self) -> usize {
        self.players.len().saturating_sub(1)
    }
}
