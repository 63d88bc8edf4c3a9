//! Game Logic Module
//!
//! The rules engine. Deterministic: no clock, no tasks, no I/O.
//!
//! ## Module Structure
//!
//! - `squad`: Squad counters and elimination latch
//! - `player`: Player flags and revive eligibility
//! - `state`: Match controller, lifecycle and notification handling
//! - `tick`: Per-second round loop and scripted replay
//! - `events`: Lifecycle notifications
//! - `record`: Archive of a finished match

pub mod squad;
pub mod player;
pub mod state;
pub mod tick;
pub mod events;
pub mod record;

// Re-export key types
pub use squad::{Squad, SquadId, SquadError};
pub use player::{Player, PlayerId, ReviveRejection};
pub use state::{MatchState, MatchPhase, MatchError, RoundState, RoundStatus};
pub use tick::{tick, TickResult, ScriptedEvent, replay_match};
pub use events::{GameEvent, GameEventData, MatchOutcome, RoundOutcome};
pub use record::{MatchRecord, RoundRecord};
