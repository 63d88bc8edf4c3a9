//! Match State
//!
//! The match controller: owns the six squads and the roster, runs the
//! game and round lifecycle, and applies death/revive notifications.
//! The per-second loop lives in `tick.rs`.
//!
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::events::{GameEvent, MatchOutcome, RoundOutcome};
use crate::game::player::{Player, PlayerId, ReviveRejection};
use crate::game::record::RoundRecord;
use crate::game::squad::{Squad, SquadError, SquadId, new_squads, squad_name};
use crate::{MAX_ROUNDS, MIN_PLAYERS_TO_START, PLAYERS_PER_SQUAD, SQUAD_COUNT};

// =============================================================================
// PHASES
// =============================================================================

/// Match-level phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum MatchPhase {
    /// Roster open, no game yet
    #[default]
    NotStarted,
    /// Rounds are being played
    InProgress,
    /// Game decided
    Ended,
}

/// Round-level status while a round exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Clock running
    Active,
    /// Clock stopped; outcome pending or decided
    Ended,
}

/// State of the current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// 0-based round index
    pub index: u8,

    /// Seconds since the round started
    pub elapsed_secs: u32,

    /// Sudden-death latch
    pub sudden_death: bool,

    /// Running or stopped
    pub status: RoundStatus,

    /// Set once the round has been scored
    pub outcome: Option<RoundOutcome>,
}

impl RoundState {
    fn new(index: u8) -> Self {
        Self {
            index,
            elapsed_secs: 0,
            sudden_death: false,
            status: RoundStatus::Active,
            outcome: None,
        }
    }

    /// Check if the clock is running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RoundStatus::Active
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Match controller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Round index outside `0..MAX_ROUNDS`.
    #[error("invalid round number {0}")]
    InvalidRound(u8),

    /// Operation needs a running game.
    #[error("game is not in progress")]
    GameNotInProgress,

    /// Game already running.
    #[error("game is already in progress")]
    GameInProgress,

    /// Too few players joined.
    #[error("not enough players to start: {joined} joined, {required} required")]
    NotEnoughPlayers {
        /// Players on the roster
        joined: usize,
        /// Minimum needed
        required: usize,
    },

    /// Operation needs a running round clock.
    #[error("no round is active")]
    RoundNotActive,

    /// No such player on the roster.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// Player id already on the roster.
    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    /// Squad roster is full.
    #[error("squad {0} is full")]
    SquadFull(SquadId),

    /// Player has no squad.
    #[error("player {0} is not assigned to a squad")]
    Unassigned(PlayerId),

    /// Death reported for a dead player.
    #[error("player {0} is already dead")]
    PlayerAlreadyDead(PlayerId),

    /// Revive refused.
    #[error("revive of {player} rejected: {reason}")]
    ReviveRejected {
        /// Target of the revive
        player: PlayerId,
        /// Why it was refused
        reason: ReviveRejection,
    },

    /// Squad counter misuse.
    #[error(transparent)]
    Squad(#[from] SquadError),
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Current match phase
    pub(crate) phase: MatchPhase,

    /// The six squads, indexed by `SquadId`
    pub(crate) squads: [Squad; SQUAD_COUNT],

    /// Roster (BTreeMap for deterministic iteration)
    pub(crate) players: BTreeMap<PlayerId, Player>,

    /// Current round, if one has started this game
    pub(crate) round: Option<RoundState>,

    /// Round flags forced to ended while no round existed
    pub(crate) round_closed: bool,

    /// Scored rounds this game
    pub(crate) history: Vec<RoundRecord>,

    /// Final result once the game ends
    pub(crate) outcome: Option<MatchOutcome>,

    /// Events generated since the last take
    #[serde(skip)]
    pub(crate) pending_events: Vec<GameEvent>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    /// Create an empty match.
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::NotStarted,
            squads: new_squads(),
            players: BTreeMap::new(),
            round: None,
            round_closed: false,
            history: Vec::new(),
            outcome: None,
            pending_events: Vec::new(),
        }
    }

    // =========================================================================
    // Roster
    // =========================================================================

    /// Add a player to the roster.
    ///
    /// Joining never touches squad counters; the squad is assumed to be
    /// at full strength through backfill.
    pub fn join(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        squad: Option<SquadId>,
    ) -> Result<(), MatchError> {
        if self.players.contains_key(&id) {
            return Err(MatchError::DuplicatePlayer(id));
        }
        if let Some(squad_id) = squad {
            if self.squad_members(squad_id).count() >= PLAYERS_PER_SQUAD as usize {
                return Err(MatchError::SquadFull(squad_id));
            }
        }

        let player = Player::new(id, name, squad);
        info!(
            "Player {} '{}' joined squad {}",
            id,
            player.name,
            squad.map(|s| s.name()).unwrap_or(squad_name(-1))
        );
        self.players.insert(id, player);
        Ok(())
    }

    /// Remove a player from the roster.
    ///
    /// The squad's counters are left alone; the host backfills the slot.
    pub fn leave(&mut self, id: PlayerId) -> Result<Player, MatchError> {
        let player = self.players.remove(&id).ok_or(MatchError::UnknownPlayer(id))?;
        info!("Player {} '{}' left", id, player.name);
        Ok(player)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a game: every squad back to zero round wins.
    pub fn start_game(&mut self) -> Result<(), MatchError> {
        if self.phase == MatchPhase::InProgress {
            return Err(MatchError::GameInProgress);
        }
        if self.players.len() < MIN_PLAYERS_TO_START {
            return Err(MatchError::NotEnoughPlayers {
                joined: self.players.len(),
                required: MIN_PLAYERS_TO_START,
            });
        }

        for squad in &mut self.squads {
            squad.reset(true);
        }
        self.round = None;
        self.round_closed = false;
        self.history.clear();
        self.outcome = None;
        self.phase = MatchPhase::InProgress;

        info!("Match started with {} players", self.players.len());
        self.push_event(GameEvent::match_started(self.players.len() as u32));
        Ok(())
    }

    /// Start round `index` (0-based).
    pub fn start_round(&mut self, index: u8) -> Result<(), MatchError> {
        if index >= MAX_ROUNDS {
            return Err(MatchError::InvalidRound(index));
        }
        if self.phase != MatchPhase::InProgress {
            return Err(MatchError::GameNotInProgress);
        }

        for squad in &mut self.squads {
            squad.reset(false);
        }
        // Every squad is back at full strength, so every member is too
        for player in self.players.values_mut() {
            player.record_revive();
            player.set_pinged(false);
        }
        self.round = Some(RoundState::new(index));
        self.round_closed = false;

        info!("Round {} started", index + 1);
        self.push_event(GameEvent::round_started(index));
        Ok(())
    }

    /// Stop the round clock.
    ///
    /// With no active round this only logs, and the round flags still read
    /// as ended. Scoring happens on the next tick.
    pub fn end_round(&mut self) {
        match self.round.as_mut() {
            Some(round) if round.is_active() => {
                round.status = RoundStatus::Ended;
                info!("Round {} ended at {}s", round.index + 1, round.elapsed_secs);
            }
            Some(round) => {
                debug!("end_round: round {} already ended", round.index + 1);
            }
            None => {
                debug!("end_round: no round has started");
                self.round_closed = true;
            }
        }
    }

    /// Finish the game.
    pub fn end_game(&mut self, outcome: MatchOutcome) {
        self.phase = MatchPhase::Ended;
        self.outcome = Some(outcome);

        match outcome {
            MatchOutcome::Winner { squad } => info!("Match ended: squad {} wins", squad),
            MatchOutcome::NoWinner => info!("Match ended: no winner, all squads lose"),
        }

        let (round, tick) = self
            .round
            .as_ref()
            .map(|r| (Some(r.index), r.elapsed_secs))
            .unwrap_or((None, 0));
        self.push_event(GameEvent::match_ended(round, tick, outcome));
    }

    // =========================================================================
    // Host notifications
    // =========================================================================

    /// Apply a death notification.
    ///
    /// `killer` and `cause` are passed through to the emitted event only.
    /// In sudden death the first death takes the whole squad out.
    pub fn notify_death(
        &mut self,
        victim: PlayerId,
        killer: Option<PlayerId>,
        cause: Option<String>,
    ) -> Result<(), MatchError> {
        let (round_index, tick, sudden_death) = self.active_round()?;

        let player = self.players.get(&victim).ok_or(MatchError::UnknownPlayer(victim))?;
        let squad_id = player.squad.ok_or(MatchError::Unassigned(victim))?;
        let player_alive = player.is_alive();

        if self.squads[squad_id.index()].is_eliminated() {
            // Counter stays clamped at zero
            warn!("Death of {} reported for eliminated squad {}", victim, squad_id);
            return Err(SquadError::AlreadyEliminated(squad_id).into());
        }
        if !player_alive {
            return Err(MatchError::PlayerAlreadyDead(victim));
        }

        self.push_event(GameEvent::player_died(
            round_index, tick, victim, squad_id, killer, cause,
        ));

        if sudden_death {
            for member in self.players.values_mut().filter(|p| p.squad == Some(squad_id)) {
                member.record_death();
            }
            self.squads[squad_id.index()].eliminate();

            info!("Sudden death: {} died, squad {} eliminated", victim, squad_id);
            self.push_event(GameEvent::squad_eliminated(round_index, tick, squad_id, true));
            return Ok(());
        }

        if let Some(player) = self.players.get_mut(&victim) {
            player.record_death();
        }
        let eliminated = self.squads[squad_id.index()].record_death()?;
        debug!(
            "{} died, squad {} has {} alive",
            victim,
            squad_id,
            self.squads[squad_id.index()].players_alive()
        );

        if eliminated {
            info!("Squad {} eliminated", squad_id);
            self.push_event(GameEvent::squad_eliminated(round_index, tick, squad_id, false));
        }
        Ok(())
    }

    /// Apply a revive notification.
    pub fn notify_revive(&mut self, target: PlayerId) -> Result<(), MatchError> {
        let (round_index, tick, _) = self.active_round()?;

        let player = self.players.get(&target).ok_or(MatchError::UnknownPlayer(target))?;
        let squad_id = player.check_revive(&self.squads).map_err(|reason| {
            warn!("Revive of {} rejected: {}", target, reason);
            MatchError::ReviveRejected { player: target, reason }
        })?;

        let squad = &mut self.squads[squad_id.index()];
        squad.record_revive()?;
        let revives_remaining = squad.revives_remaining();

        if let Some(player) = self.players.get_mut(&target) {
            player.record_revive();
        }

        debug!("{} revived, squad {} has {} revives left", target, squad_id, revives_remaining);
        self.push_event(GameEvent::player_revived(
            round_index, tick, target, squad_id, revives_remaining,
        ));
        Ok(())
    }

    /// Round index, elapsed time and sudden-death flag of the running round.
    fn active_round(&self) -> Result<(u8, u32, bool), MatchError> {
        if self.phase != MatchPhase::InProgress {
            return Err(MatchError::GameNotInProgress);
        }
        match &self.round {
            Some(round) if round.is_active() => {
                Ok((round.index, round.elapsed_secs, round.sudden_death))
            }
            _ => Err(MatchError::RoundNotActive),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current match phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Check if a game is running.
    pub fn is_started(&self) -> bool {
        self.phase == MatchPhase::InProgress
    }

    /// Check if the game has been decided.
    pub fn is_ended(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    /// Index of the round being played, `None` outside a running game.
    pub fn current_round(&self) -> Option<u8> {
        if self.phase != MatchPhase::InProgress {
            return None;
        }
        self.round.as_ref().map(|r| r.index)
    }

    /// Current round details.
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// Check if the round clock is running.
    pub fn round_started(&self) -> bool {
        self.round.as_ref().is_some_and(|r| r.is_active())
    }

    /// Check if the current round has stopped.
    pub fn round_ended(&self) -> bool {
        self.round_closed || self.round.as_ref().is_some_and(|r| r.status == RoundStatus::Ended)
    }

    /// Seconds elapsed in the current round.
    pub fn round_elapsed_secs(&self) -> u32 {
        self.round.as_ref().map(|r| r.elapsed_secs).unwrap_or(0)
    }

    /// Check if the current round is in sudden death.
    pub fn sudden_death(&self) -> bool {
        self.round.as_ref().is_some_and(|r| r.sudden_death)
    }

    /// All six squads.
    pub fn squads(&self) -> &[Squad; SQUAD_COUNT] {
        &self.squads
    }

    /// Squad by id.
    pub fn squad(&self, id: SquadId) -> &Squad {
        &self.squads[id.index()]
    }

    /// Squad by raw host id, if it exists.
    pub fn squad_by_raw(&self, raw: i32) -> Option<&Squad> {
        u8::try_from(raw).ok().and_then(SquadId::new).map(|id| self.squad(id))
    }

    /// Squads still standing this round.
    pub fn remaining_squads(&self) -> Vec<SquadId> {
        self.squads
            .iter()
            .filter(|s| !s.is_eliminated())
            .map(|s| s.id)
            .collect()
    }

    /// All players, ordered by id.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Player by id.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Players assigned to a squad.
    pub fn squad_members(&self, squad: SquadId) -> impl Iterator<Item = &Player> {
        self.players.values().filter(move |p| p.squad == Some(squad))
    }

    /// Number of players on the roster.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Scored rounds this game.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Final result, once the game has ended.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    // =========================================================================
    // Events & hashing
    // =========================================================================

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Compute hash of current state for replay comparison.
    pub fn compute_hash(&self) -> StateHash {
        let round = self.round.as_ref().map(|r| r.index);
        compute_state_hash(round, self.round_elapsed_secs(), |hasher| {
            hasher.update_u8(self.phase as u8);
            hasher.update_bool(self.round_closed);
            if let Some(round) = &self.round {
                hasher.update_bool(round.is_active());
                hasher.update_bool(round.sudden_death);
            }

            for squad in &self.squads {
                hasher.update_u8(squad.id.into());
                hasher.update_u8(squad.rounds_won());
                hasher.update_u8(squad.revives_remaining());
                hasher.update_u8(squad.players_alive());
                hasher.update_bool(squad.is_eliminated());
            }

            // Players in sorted order (BTreeMap guarantees this)
            for player in self.players.values() {
                hasher.update_u32(player.id.0);
                hasher.update_opt_u8(player.squad.map(u8::from));
                hasher.update_bool(player.is_alive());
                hasher.update_bool(player.is_pinged());
            }

            hasher.update_u32(self.history.len() as u32);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;

    fn sid(i: u8) -> SquadId {
        SquadId::new(i).unwrap()
    }

    /// Full roster: player `squad * 4 + slot` in each squad.
    fn full_match() -> MatchState {
        let mut state = MatchState::new();
        for squad in 0..SQUAD_COUNT as u8 {
            for slot in 0..PLAYERS_PER_SQUAD {
                let id = PlayerId::new((squad * PLAYERS_PER_SQUAD + slot) as u32);
                state.join(id, format!("p{}", id.0), Some(sid(squad))).unwrap();
            }
        }
        state
    }

    fn running_match() -> MatchState {
        let mut state = full_match();
        state.start_game().unwrap();
        state.start_round(0).unwrap();
        state.take_events();
        state
    }

    fn member(squad: u8, slot: u8) -> PlayerId {
        PlayerId::new((squad * PLAYERS_PER_SQUAD + slot) as u32)
    }

    #[test]
    fn test_join_rules() {
        let mut state = full_match();
        assert_eq!(state.player_count(), 24);

        assert_eq!(
            state.join(PlayerId::new(99), "extra", Some(sid(0))),
            Err(MatchError::SquadFull(sid(0)))
        );
        assert_eq!(
            state.join(member(0, 0), "dupe", None),
            Err(MatchError::DuplicatePlayer(member(0, 0)))
        );
        assert!(state.join(PlayerId::new(99), "", None).is_ok());
    }

    #[test]
    fn test_start_game_requires_players() {
        let mut state = MatchState::new();
        assert_eq!(
            state.start_game(),
            Err(MatchError::NotEnoughPlayers { joined: 0, required: MIN_PLAYERS_TO_START })
        );

        state.join(PlayerId::new(1), "solo", Some(sid(0))).unwrap();
        assert!(state.start_game().is_ok());
        assert_eq!(state.start_game(), Err(MatchError::GameInProgress));
        assert_eq!(state.current_round(), None);
    }

    #[test]
    fn test_start_round_validates_index() {
        let mut state = full_match();
        assert_eq!(state.start_round(0), Err(MatchError::GameNotInProgress));

        state.start_game().unwrap();
        assert_eq!(state.start_round(MAX_ROUNDS), Err(MatchError::InvalidRound(MAX_ROUNDS)));
        assert_eq!(state.start_round(200), Err(MatchError::InvalidRound(200)));
        assert!(state.round().is_none());

        state.start_round(6).unwrap();
        assert_eq!(state.current_round(), Some(6));
    }

    #[test]
    fn test_round_reset_property() {
        let mut state = running_match();

        // Mess up the round
        state.notify_death(member(1, 0), None, None).unwrap();
        for slot in 0..4 {
            state.notify_death(member(2, slot), None, None).unwrap();
        }
        state.notify_revive(member(1, 0)).unwrap();
        for player in state.players.values_mut() {
            player.set_pinged(true);
        }

        state.start_round(1).unwrap();
        for squad in state.squads() {
            assert_eq!(squad.revives_remaining(), 4);
            assert_eq!(squad.players_alive(), 4);
            assert!(!squad.is_eliminated());
        }
        assert!(state.players().all(|p| !p.is_pinged() && p.is_alive()));
        assert_eq!(state.round_elapsed_secs(), 0);
        assert!(!state.sudden_death());
        assert!(state.round_started());
        assert!(!state.round_ended());
    }

    #[test]
    fn test_normal_deaths_cascade() {
        // Four deaths eliminate the squad, a fifth is clamped
        let mut state = running_match();
        for slot in 0..3 {
            state.notify_death(member(3, slot), None, None).unwrap();
            assert!(!state.squad(sid(3)).is_eliminated());
        }
        state.notify_death(member(3, 3), Some(member(0, 0)), Some("rifle".into())).unwrap();

        let squad = state.squad(sid(3));
        assert_eq!(squad.players_alive(), 0);
        assert!(squad.is_eliminated());

        let fifth = state.notify_death(member(3, 0), None, None);
        assert_eq!(fifth, Err(MatchError::Squad(SquadError::AlreadyEliminated(sid(3)))));
        assert_eq!(state.squad(sid(3)).players_alive(), 0);

        let events = state.take_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            GameEventData::SquadEliminated { squad, sudden_death: false } if squad == sid(3)
        )));
        assert!(events.iter().any(|e| matches!(
            &e.data,
            GameEventData::PlayerDied { killer: Some(k), cause: Some(c), .. }
                if *k == member(0, 0) && c == "rifle"
        )));
    }

    #[test]
    fn test_sudden_death_wipes_squad() {
        let mut state = running_match();
        if let Some(round) = state.round.as_mut() {
            round.sudden_death = true;
        }

        state.notify_death(member(2, 1), None, None).unwrap();

        let squad = state.squad(sid(2));
        assert!(squad.is_eliminated());
        assert_eq!(squad.players_alive(), 0);
        assert!(state.squad_members(sid(2)).all(|p| !p.is_alive()));
        // Other squads untouched
        assert_eq!(state.squad(sid(1)).players_alive(), 4);
        assert_eq!(state.remaining_squads().len(), 5);
    }

    #[test]
    fn test_dead_player_cannot_die_twice() {
        let mut state = running_match();
        state.notify_death(member(0, 0), None, None).unwrap();
        assert_eq!(
            state.notify_death(member(0, 0), None, None),
            Err(MatchError::PlayerAlreadyDead(member(0, 0)))
        );
        assert_eq!(state.squad(sid(0)).players_alive(), 3);
    }

    #[test]
    fn test_revive_flow() {
        let mut state = running_match();

        let alive = state.notify_revive(member(4, 0));
        assert_eq!(
            alive,
            Err(MatchError::ReviveRejected {
                player: member(4, 0),
                reason: ReviveRejection::AlreadyAlive
            })
        );

        state.notify_death(member(4, 0), None, None).unwrap();
        state.notify_revive(member(4, 0)).unwrap();
        assert!(state.player(member(4, 0)).unwrap().is_alive());
        assert_eq!(state.squad(sid(4)).revives_remaining(), 3);
        assert_eq!(state.squad(sid(4)).players_alive(), 4);
    }

    #[test]
    fn test_revive_cannot_undo_elimination() {
        let mut state = running_match();
        for slot in 0..4 {
            state.notify_death(member(5, slot), None, None).unwrap();
        }

        let before = state.compute_hash();
        let result = state.notify_revive(member(5, 2));
        assert_eq!(
            result,
            Err(MatchError::ReviveRejected {
                player: member(5, 2),
                reason: ReviveRejection::SquadEliminated
            })
        );
        assert_eq!(state.compute_hash(), before);
    }

    #[test]
    fn test_unassigned_and_unknown_players() {
        let mut state = running_match();
        state.join(PlayerId::new(500), "spectator", None).unwrap();

        assert_eq!(
            state.notify_death(PlayerId::new(500), None, None),
            Err(MatchError::Unassigned(PlayerId::new(500)))
        );
        assert_eq!(
            state.notify_death(PlayerId::new(404), None, None),
            Err(MatchError::UnknownPlayer(PlayerId::new(404)))
        );
    }

    #[test]
    fn test_events_need_active_round() {
        let mut state = full_match();
        assert_eq!(
            state.notify_death(member(0, 0), None, None),
            Err(MatchError::GameNotInProgress)
        );

        state.start_game().unwrap();
        assert_eq!(
            state.notify_death(member(0, 0), None, None),
            Err(MatchError::RoundNotActive)
        );
    }

    #[test]
    fn test_end_round_without_round_forces_ended() {
        let mut state = full_match();
        state.end_round();
        assert!(!state.round_started());
        assert!(state.round_ended());
        assert_eq!(state.current_round(), None);

        state.start_game().unwrap();
        assert!(!state.round_ended());
        state.end_round();
        assert!(!state.round_started());
        assert!(state.round_ended());

        // A fresh round clears the forced flag
        state.start_round(0).unwrap();
        assert!(state.round_started());
        assert!(!state.round_ended());

        let mut state = running_match();
        state.end_round();
        state.end_round();
        assert!(state.round_ended());
        assert!(!state.round_started());
        assert_eq!(state.notify_revive(member(0, 0)), Err(MatchError::RoundNotActive));
    }

    #[test]
    fn test_leave_keeps_squad_counters() {
        let mut state = running_match();
        let player = state.leave(member(1, 3)).unwrap();
        assert_eq!(player.id, member(1, 3));
        assert_eq!(state.squad(sid(1)).players_alive(), 4);
        assert_eq!(state.leave(member(1, 3)), Err(MatchError::UnknownPlayer(member(1, 3))));
    }

    #[test]
    fn test_end_game_clears_round_index() {
        let mut state = running_match();
        state.end_game(MatchOutcome::NoWinner);
        assert!(state.is_ended());
        assert_eq!(state.current_round(), None);
        assert_eq!(state.outcome(), Some(MatchOutcome::NoWinner));

        // A finished match can be started again
        assert!(state.start_game().is_ok());
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn test_squad_by_raw() {
        let state = MatchState::new();
        assert_eq!(state.squad_by_raw(2).map(|s| s.name()), Some("Charlie"));
        assert!(state.squad_by_raw(-1).is_none());
        assert!(state.squad_by_raw(6).is_none());
    }
}
