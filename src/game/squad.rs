//! Squad State
//!
//! Per-squad counters and the elimination latch.
//! Every mutator keeps `eliminated == (players_alive == 0)`.

use std::fmt;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::{PLAYERS_PER_SQUAD, REVIVES_PER_ROUND, ROUND_WIN_THRESHOLD, SQUAD_COUNT};

/// Display names, indexed by squad id.
pub const SQUAD_NAMES: [&str; SQUAD_COUNT] = ["Alfa", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"];

/// Name reported for ids outside the table.
pub const UNKNOWN_SQUAD_NAME: &str = "Unknown";

/// Look up a squad display name by raw id.
pub fn squad_name(id: i32) -> &'static str {
    usize::try_from(id)
        .ok()
        .and_then(|i| SQUAD_NAMES.get(i).copied())
        .unwrap_or(UNKNOWN_SQUAD_NAME)
}

// =============================================================================
// SQUAD ID
// =============================================================================

/// Validated squad identifier in `0..SQUAD_COUNT`.
///
/// Holding a `SquadId` means indexing the squad array cannot miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SquadId(u8);

impl SquadId {
    /// Create from a raw index, if it names one of the six squads.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < SQUAD_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Iterate every squad id in order.
    pub fn all() -> impl Iterator<Item = SquadId> {
        (0..SQUAD_COUNT as u8).map(SquadId)
    }

    /// Raw index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        squad_name(self.0 as i32)
    }
}

impl TryFrom<u8> for SquadId {
    type Error = SquadError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SquadId::new(value).ok_or(SquadError::InvalidId(value.into()))
    }
}

impl From<SquadId> for u8 {
    fn from(id: SquadId) -> u8 {
        id.0
    }
}

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Squad counter misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SquadError {
    /// Raw id outside the squad table, as the host sent it.
    #[error("invalid squad id {0}")]
    InvalidId(i32),

    /// Death reported for a squad with nobody left alive.
    #[error("squad {0} is already eliminated")]
    AlreadyEliminated(SquadId),

    /// Revive attempted without an available revive.
    #[error("squad {0} has no revives left")]
    NoRevivesLeft(SquadId),

    /// Revive attempted on a squad with nobody alive.
    #[error("squad {0} has nobody alive to revive")]
    NobodyAlive(SquadId),

    /// Revive would push the squad above its size.
    #[error("squad {0} is already at full strength")]
    FullStrength(SquadId),
}

// =============================================================================
// SQUAD
// =============================================================================

/// State of one squad.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    /// Squad identifier
    pub id: SquadId,

    /// Rounds won this match
    rounds_won: u8,

    /// Revives left this round
    revives_remaining: u8,

    /// Members still alive this round
    players_alive: u8,

    /// Round elimination latch
    eliminated: bool,
}

impl Squad {
    /// Create a squad ready for a new game.
    pub fn new(id: SquadId) -> Self {
        Self {
            id,
            rounds_won: 0,
            revives_remaining: REVIVES_PER_ROUND,
            players_alive: PLAYERS_PER_SQUAD,
            eliminated: false,
        }
    }

    /// Restore round counters; `for_game` also clears round wins.
    pub fn reset(&mut self, for_game: bool) {
        if for_game {
            self.rounds_won = 0;
        }
        self.revives_remaining = REVIVES_PER_ROUND;
        self.players_alive = PLAYERS_PER_SQUAD;
        self.eliminated = false;
    }

    /// Record one member's death.
    ///
    /// Returns `Ok(true)` when this death eliminated the squad. On a squad
    /// that is already eliminated the counter stays at zero and the call
    /// fails, since the caller sent a death nobody could have suffered.
    pub fn record_death(&mut self) -> Result<bool, SquadError> {
        if self.players_alive == 0 {
            self.eliminated = true;
            return Err(SquadError::AlreadyEliminated(self.id));
        }

        self.players_alive -= 1;
        if self.players_alive == 0 {
            self.eliminated = true;
        }
        Ok(self.eliminated)
    }

    /// Spend a revive and bring one member back.
    pub fn record_revive(&mut self) -> Result<(), SquadError> {
        if self.revives_remaining == 0 {
            return Err(SquadError::NoRevivesLeft(self.id));
        }
        if self.players_alive == 0 {
            return Err(SquadError::NobodyAlive(self.id));
        }
        if self.players_alive >= PLAYERS_PER_SQUAD {
            return Err(SquadError::FullStrength(self.id));
        }

        self.revives_remaining -= 1;
        self.players_alive += 1;
        Ok(())
    }

    /// Eliminate the whole squad at once (sudden death).
    ///
    /// Returns `false` if the squad was already out.
    pub fn eliminate(&mut self) -> bool {
        let was_eliminated = self.eliminated;
        self.players_alive = 0;
        self.eliminated = true;
        !was_eliminated
    }

    /// Check if a revive is available.
    #[inline]
    pub fn can_revive(&self) -> bool {
        self.revives_remaining > 0 && self.players_alive > 0
    }

    /// Check if the squad is out of the round.
    #[inline]
    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    /// Check if the squad has enough round wins to take the match.
    #[inline]
    pub fn has_won_match(&self) -> bool {
        self.rounds_won >= ROUND_WIN_THRESHOLD
    }

    /// Credit a round win.
    pub fn record_round_win(&mut self) {
        self.rounds_won = self.rounds_won.saturating_add(1);
    }

    /// Rounds won this match.
    pub fn rounds_won(&self) -> u8 {
        self.rounds_won
    }

    /// Revives left this round.
    pub fn revives_remaining(&self) -> u8 {
        self.revives_remaining
    }

    /// Members alive this round.
    pub fn players_alive(&self) -> u8 {
        self.players_alive
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// Build the six squads for a fresh match.
pub fn new_squads() -> [Squad; SQUAD_COUNT] {
    std::array::from_fn(|i| Squad::new(SquadId(i as u8)))
}
