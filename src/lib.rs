//! # Squad Royale Rules Engine
//!
//! Match and round state machine for the six-squad elimination mode.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SQUAD ROYALE                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Rules (deterministic)                     │
//! │  ├── squad.rs    - Squad counters and elimination latch      │
//! │  ├── player.rs   - Player flags and revive eligibility       │
//! │  ├── state.rs    - Match controller state and event handling │
//! │  ├── tick.rs     - Per-second round loop                     │
//! │  ├── events.rs   - Lifecycle notifications                   │
//! │  └── record.rs   - Finished match archive                    │
//! │                                                              │
//! │  host/           - Runtime plumbing (non-deterministic)      │
//! │  ├── protocol.rs - Host commands and snapshots               │
//! │  └── session.rs  - Single-writer match actor                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the clock or spawn tasks.
//! Given the same command script, the same ticks produce the same
//! events and the same state hash. Wall-clock time only enters through
//! the `host/` session, which turns a tokio interval into `tick()` calls.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod host;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::player::{Player, PlayerId};
pub use game::squad::{Squad, SquadId};
pub use game::state::{MatchError, MatchPhase, MatchState};
pub use game::events::{GameEvent, GameEventData, MatchOutcome, RoundOutcome};
pub use host::session::{MatchSession, SessionConfig, SessionHandle, SessionManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of squads in every match
pub const SQUAD_COUNT: usize = 6;

/// Players per squad
pub const PLAYERS_PER_SQUAD: u8 = 4;

/// Revives each squad may spend per round
pub const REVIVES_PER_ROUND: u8 = 4;

/// Round wins needed to take the match
pub const ROUND_WIN_THRESHOLD: u8 = 2;

/// Maximum rounds in a match
pub const MAX_ROUNDS: u8 = 7;

/// Seconds of normal play before sudden death
pub const BASE_TIMER_SECS: u32 = 600;

/// Seconds of sudden death before the round times out
pub const SUDDEN_DEATH_SECS: u32 = 120;

/// Total round length in seconds
pub const ROUND_DURATION_SECS: u32 = BASE_TIMER_SECS + SUDDEN_DEATH_SECS;

/// Joined players required before a game can start
pub const MIN_PLAYERS_TO_START: usize = 1;
