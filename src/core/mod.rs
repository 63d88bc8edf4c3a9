//! Core deterministic primitives.
//!
//! Nothing in here touches the clock or the OS; the rules engine and the
//! replay tooling build on these.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
