//! Round Loop
//!
//! One call to [`tick`] is one elapsed second of the running round. The
//! tick is the only suspension point of a match: host notifications are
//! applied between ticks, never during one.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::{info, warn};
#[cfg(feature = "debug-tracing")]
use tracing::debug;

use crate::game::events::{GameEvent, MatchOutcome, RoundOutcome};
use crate::game::player::PlayerId;
use crate::game::record::RoundRecord;
use crate::game::state::{MatchError, MatchPhase, MatchState, RoundStatus};
use crate::{BASE_TIMER_SECS, MAX_ROUNDS, ROUND_DURATION_SECS};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated since the last take
    pub events: Vec<GameEvent>,
    /// Set when a round was scored this tick
    pub round_ended: Option<RoundOutcome>,
    /// Set when the game ended this tick
    pub match_ended: Option<MatchOutcome>,
}

/// Advance the running round by one second.
///
/// Order within a tick:
/// 1. the clock advances,
/// 2. sudden death starts when the base timer runs out,
/// 3. the round closes if fewer than two squads stand or time is up,
/// 4. a closed round is scored, then the game ends or the next round starts.
pub fn tick(state: &mut MatchState) -> TickResult {
    let mut result = TickResult::default();

    if state.phase != MatchPhase::InProgress {
        result.events = state.take_events();
        return result;
    }

    let Some(round) = state.round.as_mut() else {
        result.events = state.take_events();
        return result;
    };

    if round.is_active() {
        round.elapsed_secs += 1;

        #[cfg(feature = "debug-tracing")]
        debug!("Round {} tick {}", round.index + 1, round.elapsed_secs);

        if round.elapsed_secs == BASE_TIMER_SECS && !round.sudden_death {
            enter_sudden_death(state);
        }

        if should_close_round(state) {
            state.end_round();
        }
    }

    // Also scores rounds stopped early through `end_round`
    if needs_scoring(state) {
        conclude_round(state, &mut result);
    }

    result.events = state.take_events();
    result
}

/// Flip the sudden-death latch and light up every indicator.
fn enter_sudden_death(state: &mut MatchState) {
    let Some(round) = state.round.as_mut() else {
        return;
    };
    round.sudden_death = true;
    let (index, tick) = (round.index, round.elapsed_secs);

    let mut pinged: Vec<PlayerId> = Vec::with_capacity(state.players.len());
    for player in state.players.values_mut() {
        player.set_pinged(true);
        pinged.push(player.id);
    }

    info!("Round {}: sudden death", index + 1);
    state.push_event(GameEvent::sudden_death(index, tick));
    state.push_event(GameEvent::players_pinged(index, tick, pinged));
}

/// Round loop exit condition.
fn should_close_round(state: &MatchState) -> bool {
    state.remaining_squads().len() < 2 || state.round_elapsed_secs() >= ROUND_DURATION_SECS
}

fn needs_scoring(state: &MatchState) -> bool {
    state
        .round
        .as_ref()
        .is_some_and(|r| r.status == RoundStatus::Ended && r.outcome.is_none())
}

/// Score the stopped round and decide what happens next.
fn conclude_round(state: &mut MatchState, result: &mut TickResult) {
    let survivors = state.remaining_squads();
    let outcome = RoundOutcome::from_survivors(&survivors);

    if let Some(winner) = outcome.winner() {
        state.squads[winner.index()].record_round_win();
    }

    let Some(round) = state.round.as_mut() else {
        return;
    };
    round.outcome = Some(outcome);
    let record = RoundRecord {
        round: round.index,
        outcome,
        elapsed_secs: round.elapsed_secs,
        sudden_death: round.sudden_death,
    };

    match outcome {
        RoundOutcome::Won { squad } => info!("Round {} won by squad {}", record.round + 1, squad),
        RoundOutcome::Contested { survivors } => {
            info!("Round {} contested ({} squads standing)", record.round + 1, survivors)
        }
    }

    state.history.push(record);
    state.push_event(GameEvent::round_ended(record.round, record.elapsed_secs, outcome));
    result.round_ended = Some(outcome);

    if let Some(outcome) = check_game_end(state, record.round) {
        state.end_game(outcome);
        result.match_ended = Some(outcome);
        return;
    }

    if let Err(e) = state.start_round(record.round + 1) {
        warn!("Could not start round {}: {}", record.round + 2, e);
    }
}

/// Game termination after a scored round.
fn check_game_end(state: &MatchState, round_index: u8) -> Option<MatchOutcome> {
    if let Some(squad) = state.squads.iter().find(|s| s.has_won_match()) {
        return Some(MatchOutcome::Winner { squad: squad.id });
    }
    if round_index + 1 >= MAX_ROUNDS {
        return Some(MatchOutcome::NoWinner);
    }
    None
}

// =============================================================================
// SCRIPTED REPLAY
// =============================================================================

/// A host notification, as fed to [`replay_match`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptedEvent {
    /// A player died
    Death {
        /// Victim
        player: PlayerId,
        /// Killer, if known
        killer: Option<PlayerId>,
    },
    /// A player was revived
    Revive {
        /// Target
        player: PlayerId,
    },
    /// Host stopped the round clock
    EndRound,
}

/// Apply one scripted notification.
pub fn apply_scripted(state: &mut MatchState, event: &ScriptedEvent) -> Result<(), MatchError> {
    match event {
        ScriptedEvent::Death { player, killer } => state.notify_death(*player, *killer, None),
        ScriptedEvent::Revive { player } => state.notify_revive(*player),
        ScriptedEvent::EndRound => {
            state.end_round();
            Ok(())
        }
    }
}

/// Replay a match from a script of notifications.
///
/// `script` maps a global tick number to the notifications delivered just
/// before that tick. The game must already be started; replay stops when
/// the game ends or after `max_ticks`. Rejected notifications are skipped.
pub fn replay_match(
    initial_state: MatchState,
    script: &BTreeMap<u32, Vec<ScriptedEvent>>,
    max_ticks: u32,
) -> (MatchState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = state.take_events();

    for t in 0..max_ticks {
        if let Some(events) = script.get(&t) {
            for event in events {
                if let Err(e) = apply_scripted(&mut state, event) {
                    warn!("Scripted event {:?} at tick {} rejected: {}", event, t, e);
                }
            }
        }

        let result = tick(&mut state);
        all_events.extend(result.events);

        if result.match_ended.is_some() {
            break;
        }
    }

    (state, all_events)
}
