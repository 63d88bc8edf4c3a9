//! Host Protocol
//!
//! Commands the hosting runtime sends into a match session, the replies
//! it gets back, and the notifications a session publishes. Everything
//! here is plain serde data; JSON is the text encoding.

use serde::{Serialize, Deserialize};

use crate::game::events::GameEvent;
use crate::game::player::PlayerId;
use crate::game::record::MatchRecord;
use crate::game::squad::{SquadError, SquadId};
use crate::game::state::{MatchError, MatchPhase, MatchState};

// =============================================================================
// HOST -> SESSION
// =============================================================================

/// Commands sent by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// Player joined the server.
    Join {
        /// Host player id.
        player_id: u32,
        /// Display name (may be empty).
        #[serde(default)]
        name: String,
        /// Squad index, `None` or -1 for unassigned.
        #[serde(default)]
        squad: Option<i32>,
    },

    /// Player left the server.
    Leave {
        /// Host player id.
        player_id: u32,
    },

    /// Player died.
    Death {
        /// Victim.
        player_id: u32,
        /// Killer, if the host knows one.
        #[serde(default)]
        killer_id: Option<u32>,
        /// Free-form cause (weapon, fall, ...).
        #[serde(default)]
        cause: Option<String>,
    },

    /// Player was revived.
    Revive {
        /// Target of the revive.
        player_id: u32,
    },

    /// Start the game and its first round.
    StartGame,

    /// Stop the round clock early.
    EndRound,

    /// Request a state snapshot.
    Snapshot,
}

impl HostCommand {
    /// Resolve the raw squad field of a join.
    pub fn parse_squad(raw: Option<i32>) -> Result<Option<SquadId>, SquadError> {
        match raw {
            None | Some(-1) => Ok(None),
            Some(n) => u8::try_from(n)
                .ok()
                .and_then(SquadId::new)
                .map(Some)
                .ok_or(SquadError::InvalidId(n)),
        }
    }
}

// =============================================================================
// SESSION -> HOST
// =============================================================================

/// Reply to a single command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostReply {
    /// Command applied.
    Accepted,

    /// Snapshot requested.
    Snapshot(MatchSnapshot),

    /// Command refused; state unchanged.
    Rejected {
        /// Machine-readable reason.
        code: ErrorCode,
        /// Human-readable message.
        message: String,
    },
}

impl HostReply {
    /// Build a rejection from a controller error.
    pub fn rejected(err: &MatchError) -> Self {
        HostReply::Rejected {
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }
}

/// Notifications published by a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Lifecycle event from the rules engine.
    Event(GameEvent),

    /// Game over; archive attached.
    Finished(MatchRecord),
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Round number out of range.
    InvalidRound,
    /// No game running.
    GameNotInProgress,
    /// Game already running.
    GameInProgress,
    /// Too few players to start.
    NotEnoughPlayers,
    /// No round running.
    RoundNotActive,
    /// Unknown player id.
    UnknownPlayer,
    /// Player id already joined.
    DuplicatePlayer,
    /// Squad roster full.
    SquadFull,
    /// Squad id out of range.
    InvalidSquad,
    /// Player has no squad.
    Unassigned,
    /// Player already dead.
    PlayerAlreadyDead,
    /// Revive refused.
    ReviveRejected,
    /// Death reported for an eliminated squad.
    SquadEliminated,
    /// Squad counters refused the change.
    SquadLimit,
}

impl From<&MatchError> for ErrorCode {
    fn from(err: &MatchError) -> Self {
        match err {
            MatchError::InvalidRound(_) => ErrorCode::InvalidRound,
            MatchError::GameNotInProgress => ErrorCode::GameNotInProgress,
            MatchError::GameInProgress => ErrorCode::GameInProgress,
            MatchError::NotEnoughPlayers { .. } => ErrorCode::NotEnoughPlayers,
            MatchError::RoundNotActive => ErrorCode::RoundNotActive,
            MatchError::UnknownPlayer(_) => ErrorCode::UnknownPlayer,
            MatchError::DuplicatePlayer(_) => ErrorCode::DuplicatePlayer,
            MatchError::SquadFull(_) => ErrorCode::SquadFull,
            MatchError::Unassigned(_) => ErrorCode::Unassigned,
            MatchError::PlayerAlreadyDead(_) => ErrorCode::PlayerAlreadyDead,
            MatchError::ReviveRejected { .. } => ErrorCode::ReviveRejected,
            MatchError::Squad(SquadError::InvalidId(_)) => ErrorCode::InvalidSquad,
            MatchError::Squad(SquadError::AlreadyEliminated(_)) => ErrorCode::SquadEliminated,
            MatchError::Squad(_) => ErrorCode::SquadLimit,
        }
    }
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// Squad state in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    /// Squad index.
    pub id: u8,
    /// Display name.
    pub name: String,
    /// Round wins.
    pub rounds_won: u8,
    /// Revives left this round.
    pub revives_remaining: u8,
    /// Members alive this round.
    pub players_alive: u8,
    /// Out of the round.
    pub eliminated: bool,
}

/// Player state in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Host player id.
    pub player_id: u32,
    /// Display name.
    pub name: String,
    /// Squad index, -1 if unassigned.
    pub squad: i32,
    /// Alive this round.
    pub alive: bool,
    /// Indicator shown.
    pub pinged: bool,
}

/// Full match snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match phase.
    pub phase: MatchPhase,
    /// Round index, `None` outside a running game.
    pub current_round: Option<u8>,
    /// Round clock running.
    pub round_started: bool,
    /// Round clock stopped.
    pub round_ended: bool,
    /// Seconds into the round.
    pub round_elapsed_secs: u32,
    /// Sudden death active.
    pub sudden_death: bool,
    /// Squads still standing.
    pub remaining_squads: Vec<u8>,
    /// All six squads.
    pub squads: Vec<SquadSnapshot>,
    /// Roster.
    pub players: Vec<PlayerSnapshot>,
    /// State hash (hex).
    pub state_hash: String,
}

impl MatchSnapshot {
    /// Capture the current state.
    pub fn from_state(state: &MatchState) -> Self {
        let squads = state
            .squads()
            .iter()
            .map(|s| SquadSnapshot {
                id: s.id.into(),
                name: s.name().to_string(),
                rounds_won: s.rounds_won(),
                revives_remaining: s.revives_remaining(),
                players_alive: s.players_alive(),
                eliminated: s.is_eliminated(),
            })
            .collect();

        let players = state
            .players()
            .map(|p| PlayerSnapshot {
                player_id: p.id.0,
                name: p.name.clone(),
                squad: p.squad.map(|s| u8::from(s) as i32).unwrap_or(-1),
                alive: p.is_alive(),
                pinged: p.is_pinged(),
            })
            .collect();

        Self {
            phase: state.phase(),
            current_round: state.current_round(),
            round_started: state.round_started(),
            round_ended: state.round_ended(),
            round_elapsed_secs: state.round_elapsed_secs(),
            sudden_death: state.sudden_death(),
            remaining_squads: state.remaining_squads().into_iter().map(u8::from).collect(),
            squads,
            players,
            state_hash: hex::encode(state.compute_hash()),
        }
    }

    /// Snapshot of one player, if present.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.player_id == id.0)
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl HostCommand {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl Notification {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
