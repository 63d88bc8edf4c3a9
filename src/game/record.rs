//! Match Record
//!
//! Compact archive of a finished match, handed to the host for storage.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{StateHash, StateHasher};
use crate::game::events::{MatchOutcome, RoundOutcome};
use crate::game::state::MatchState;

/// Current record version.
pub const RECORD_VERSION: u8 = 1;

/// One scored round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 0-based round index
    pub round: u8,
    /// Result
    pub outcome: RoundOutcome,
    /// Seconds played
    pub elapsed_secs: u32,
    /// Reached sudden death
    pub sudden_death: bool,
}

/// Archive of a finished match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Version for forward compatibility.
    pub version: u8,

    /// Match identifier (UUID bytes).
    pub match_id: [u8; 16],

    /// When the game started.
    pub started_at: DateTime<Utc>,

    /// When the game ended.
    pub ended_at: DateTime<Utc>,

    /// Every scored round, in order.
    pub rounds: Vec<RoundRecord>,

    /// Round wins per squad, indexed by squad id.
    pub rounds_won: Vec<u8>,

    /// Final result.
    pub outcome: MatchOutcome,

    /// State hash at the end of the match.
    pub final_state_hash: StateHash,
}

/// Record errors.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Match has not ended yet.
    #[error("match has not ended")]
    NotEnded,

    /// Serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization failed.
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Unsupported version.
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),
}

impl MatchRecord {
    /// Build the record of an ended match.
    pub fn from_state(
        match_id: [u8; 16],
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        state: &MatchState,
    ) -> Result<Self, RecordError> {
        let outcome = state.outcome().ok_or(RecordError::NotEnded)?;

        Ok(Self {
            version: RECORD_VERSION,
            match_id,
            started_at,
            ended_at,
            rounds: state.history().to_vec(),
            rounds_won: state.squads().iter().map(|s| s.rounds_won()).collect(),
            outcome,
            final_state_hash: state.compute_hash(),
        })
    }

    /// Digest over the match result, independent of wall-clock times.
    pub fn result_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_match_record();
        hasher.update_bytes(&self.match_id);
        for round in &self.rounds {
            hasher.update_u8(round.round);
            hasher.update_opt_u8(round.outcome.winner().map(u8::from));
            hasher.update_u32(round.elapsed_secs);
        }
        hasher.update_opt_u8(self.outcome.winner().map(u8::from));
        hasher.update_bytes(&self.final_state_hash);
        hasher.finalize()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        bincode::serialize(self).map_err(|e| RecordError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        let record: Self = bincode::deserialize(data)
            .map_err(|e| RecordError::DeserializationFailed(e.to_string()))?;
        if record.version != RECORD_VERSION {
            return Err(RecordError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }

    /// Number of rounds played.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerId;
    use crate::game::squad::SquadId;

    fn ended_state() -> MatchState {
        let mut state = MatchState::new();
        state.join(PlayerId::new(1), "a", SquadId::new(0)).unwrap();
        state.start_game().unwrap();
        state.start_round(0).unwrap();
        state.end_game(MatchOutcome::NoWinner);
        state
    }

    #[test]
    fn test_record_requires_ended_match() {
        let state = MatchState::new();
        let now = Utc::now();
        let result = MatchRecord::from_state([0; 16], now, now, &state);
        assert!(matches!(result, Err(RecordError::NotEnded)));
    }

    #[test]
    fn test_record_bytes_round_trip() {
        let state = ended_state();
        let now = Utc::now();
        let record = MatchRecord::from_state([7; 16], now, now, &state).unwrap();

        let bytes = record.to_bytes().unwrap();
        let decoded = MatchRecord::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(decoded.result_hash(), record.result_hash());
        assert_eq!(decoded.rounds_won.len(), crate::SQUAD_COUNT);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = MatchRecord::from_bytes(&[0xFF, 0x01]);
        assert!(matches!(result, Err(RecordError::DeserializationFailed(_))));
    }

    #[test]
    fn test_result_hash_ignores_timestamps() {
        let state = ended_state();
        let a = MatchRecord::from_state([7; 16], Utc::now(), Utc::now(), &state).unwrap();
        let mut b = a.clone();
        b.ended_at = b.ended_at + chrono::Duration::seconds(90);

        assert_eq!(a.result_hash(), b.result_hash());
    }
}
