//! Host Module
//!
//! Async runtime around the rules engine: one task per match, fed by host
//! commands and ticked by a wall-clock interval.
//!
//! ## Module Structure
//!
//! - `protocol`: Host commands, replies, notifications and snapshots
//! - `session`: Session actor, handle and manager

pub mod protocol;
pub mod session;

pub use protocol::{ErrorCode, HostCommand, HostReply, MatchSnapshot, Notification};
pub use session::{MatchSession, SessionConfig, SessionError, SessionHandle, SessionId, SessionManager};
