//! Game Events
//!
//! Lifecycle notifications produced by the match controller. The host
//! forwards these to UI, logging and indicator plumbing.

use serde::{Serialize, Deserialize};

use crate::game::player::PlayerId;
use crate::game::squad::SquadId;

/// How a round was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Exactly one squad survived and took the point.
    Won {
        /// Surviving squad
        squad: SquadId,
    },
    /// Nobody, or more than one squad, was left standing.
    Contested {
        /// Squads still standing when the round closed (0 or 2+)
        survivors: u8,
    },
}

impl RoundOutcome {
    /// Decide the outcome from the squads left standing.
    pub fn from_survivors(survivors: &[SquadId]) -> Self {
        match survivors {
            [only] => RoundOutcome::Won { squad: *only },
            _ => RoundOutcome::Contested {
                survivors: survivors.len() as u8,
            },
        }
    }

    /// Winning squad, if any.
    pub fn winner(&self) -> Option<SquadId> {
        match self {
            RoundOutcome::Won { squad } => Some(*squad),
            RoundOutcome::Contested { .. } => None,
        }
    }
}

/// How the match was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// A squad reached the round-win threshold.
    Winner {
        /// Winning squad
        squad: SquadId,
    },
    /// Rounds ran out; every squad lost.
    NoWinner,
}

impl MatchOutcome {
    /// Winning squad, if any.
    pub fn winner(&self) -> Option<SquadId> {
        match self {
            MatchOutcome::Winner { squad } => Some(*squad),
            MatchOutcome::NoWinner => None,
        }
    }
}

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Deaths first
    PlayerDeath = 0,
    /// Then the eliminations they cause
    SquadElimination = 1,
    /// Then revives
    Revive = 2,
    /// Then phase changes inside a round
    Phase = 3,
    /// Then round boundaries
    Round = 4,
    /// Match boundaries last
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// Game started
    MatchStarted {
        /// Players on the roster at start
        players: u32,
    },

    /// Round started
    RoundStarted {
        /// 0-based round index
        round: u8,
    },

    /// Base timer expired
    SuddenDeathEntered {
        /// 0-based round index
        round: u8,
    },

    /// Indicators to show on the map
    PlayersPinged {
        /// Players whose indicator is now on
        players: Vec<PlayerId>,
    },

    /// Player died
    PlayerDied {
        /// Victim
        player: PlayerId,
        /// Victim's squad
        squad: SquadId,
        /// Killer as reported by the host
        killer: Option<PlayerId>,
        /// Cause as reported by the host
        cause: Option<String>,
    },

    /// Player revived
    PlayerRevived {
        /// Revived player
        player: PlayerId,
        /// Their squad
        squad: SquadId,
        /// Revives the squad has left
        revives_remaining: u8,
    },

    /// Squad is out of the round
    SquadEliminated {
        /// Eliminated squad
        squad: SquadId,
        /// Knocked out by the sudden-death rule
        sudden_death: bool,
    },

    /// Round finished
    RoundEnded {
        /// 0-based round index
        round: u8,
        /// Result
        outcome: RoundOutcome,
    },

    /// Game finished
    MatchEnded {
        /// Result
        outcome: MatchOutcome,
    },
}

/// A game event with timing and priority.
///
/// Events order by round, then tick, then priority; field order matters
/// for the derived `Ord`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameEvent {
    /// Round the event belongs to (`None` outside any round)
    pub round: Option<u8>,

    /// Round-elapsed seconds when the event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(round: Option<u8>, tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        Self {
            round,
            tick,
            priority,
            data,
        }
    }

    /// Create match started event.
    pub fn match_started(players: u32) -> Self {
        Self::new(None, 0, EventPriority::Other, GameEventData::MatchStarted { players })
    }

    /// Create round started event.
    pub fn round_started(round: u8) -> Self {
        Self::new(Some(round), 0, EventPriority::Round, GameEventData::RoundStarted { round })
    }

    /// Create sudden death event.
    pub fn sudden_death(round: u8, tick: u32) -> Self {
        Self::new(
            Some(round),
            tick,
            EventPriority::Phase,
            GameEventData::SuddenDeathEntered { round },
        )
    }

    /// Create players pinged event.
    pub fn players_pinged(round: u8, tick: u32, players: Vec<PlayerId>) -> Self {
        Self::new(
            Some(round),
            tick,
            EventPriority::Phase,
            GameEventData::PlayersPinged { players },
        )
    }

    /// Create player died event.
    pub fn player_died(
        round: u8,
        tick: u32,
        player: PlayerId,
        squad: SquadId,
        killer: Option<PlayerId>,
        cause: Option<String>,
    ) -> Self {
        Self::new(
            Some(round),
            tick,
            EventPriority::PlayerDeath,
            GameEventData::PlayerDied {
                player,
                squad,
                killer,
                cause,
            },
        )
    }

    /// Create player revived event.
    pub fn player_revived(
        round: u8,
        tick: u32,
        player: PlayerId,
        squad: SquadId,
        revives_remaining: u8,
    ) -> Self {
        Self::new(
            Some(round),
            tick,
            EventPriority::Revive,
            GameEventData::PlayerRevived {
                player,
                squad,
                revives_remaining,
            },
        )
    }

    /// Create squad eliminated event.
    pub fn squad_eliminated(round: u8, tick: u32, squad: SquadId, sudden_death: bool) -> Self {
        Self::new(
            Some(round),
            tick,
            EventPriority::SquadElimination,
            GameEventData::SquadEliminated { squad, sudden_death },
        )
    }

    /// Create round ended event.
    pub fn round_ended(round: u8, tick: u32, outcome: RoundOutcome) -> Self {
        Self::new(
            Some(round),
            tick,
            EventPriority::Round,
            GameEventData::RoundEnded { round, outcome },
        )
    }

    /// Create match ended event.
    pub fn match_ended(round: Option<u8>, tick: u32, outcome: MatchOutcome) -> Self {
        Self::new(round, tick, EventPriority::Other, GameEventData::MatchEnded { outcome })
    }
}
