//! Player State
//!
//! Per-player flags. Squad counters are not touched here; the match
//! controller updates the player and its squad together.

use std::fmt;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::squad::{Squad, SquadId};

/// Host-assigned player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create from the host's raw id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a revive was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ReviveRejection {
    /// Target is not dead.
    #[error("player is already alive")]
    AlreadyAlive,

    /// Target belongs to no known squad.
    #[error("player has no squad")]
    NoSquad,

    /// Squad spent all its revives this round.
    #[error("squad has no revives left")]
    NoRevivesLeft,

    /// Squad has nobody alive (eliminated this round).
    #[error("squad has nobody alive")]
    SquadEliminated,
}

/// State of a single player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,

    /// Display name, empty until the host assigns one
    pub name: String,

    /// Owning squad, `None` while unassigned
    pub squad: Option<SquadId>,

    /// Alive this round
    alive: bool,

    /// On-map indicator shown
    pinged: bool,
}

impl Player {
    /// Create a freshly joined player.
    pub fn new(id: PlayerId, name: impl Into<String>, squad: Option<SquadId>) -> Self {
        Self {
            id,
            name: name.into(),
            squad,
            alive: true,
            pinged: false,
        }
    }

    /// Mark dead.
    pub fn record_death(&mut self) {
        self.alive = false;
    }

    /// Mark alive.
    pub fn record_revive(&mut self) {
        self.alive = true;
    }

    /// Check revive eligibility against the squad table.
    ///
    /// A dead player is revivable only while their squad can spend a
    /// revive; on success the owning squad id is returned.
    pub fn check_revive(&self, squads: &[Squad]) -> Result<SquadId, ReviveRejection> {
        if self.alive {
            return Err(ReviveRejection::AlreadyAlive);
        }

        let squad = self
            .squad
            .and_then(|id| squads.iter().find(|s| s.id == id))
            .ok_or(ReviveRejection::NoSquad)?;

        if squad.can_revive() {
            Ok(squad.id)
        } else if squad.revives_remaining() == 0 {
            Err(ReviveRejection::NoRevivesLeft)
        } else {
            Err(ReviveRejection::SquadEliminated)
        }
    }

    /// Boolean form of [`Player::check_revive`].
    pub fn can_be_revived(&self, squads: &[Squad]) -> bool {
        self.check_revive(squads).is_ok()
    }

    /// Set the on-map indicator flag.
    pub fn set_pinged(&mut self, pinged: bool) {
        self.pinged = pinged;
    }

    /// Alive this round.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Indicator shown.
    #[inline]
    pub fn is_pinged(&self) -> bool {
        self.pinged
    }
}
