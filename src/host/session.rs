//! Match Session
//!
//! Runs one match as a single-writer task. Host commands arrive over an
//! `mpsc` channel and are answered through `oneshot` replies; the round
//! clock is a `tokio::time::interval` polled in the same `select!` loop, so
//! a due tick is always applied before the next queued command. Lifecycle
//! events fan out on a `broadcast` channel.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::game::player::PlayerId;
use crate::game::record::MatchRecord;
use crate::game::state::{MatchError, MatchState};
use crate::game::tick::{tick, TickResult};
use crate::host::protocol::{ErrorCode, HostCommand, HostReply, MatchSnapshot, Notification};

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Configuration for a match session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wall-clock length of one round second.
    pub tick_interval: Duration,
    /// Capacity of the command queue.
    pub command_buffer: usize,
    /// Capacity of the notification channel.
    pub event_buffer: usize,
    /// How long a finished session keeps answering queries.
    pub linger: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            command_buffer: 64,
            event_buffer: 256,
            linger: Duration::from_secs(30),
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The session task has exited.
    #[error("session closed")]
    Closed,

    /// The command was refused.
    #[error("command rejected ({code:?}): {message}")]
    Rejected {
        /// Machine-readable reason.
        code: ErrorCode,
        /// Human-readable message.
        message: String,
    },

    /// The session answered with the wrong reply kind.
    #[error("unexpected reply")]
    UnexpectedReply,
}

enum SessionRequest {
    Command {
        command: HostCommand,
        reply: oneshot::Sender<HostReply>,
    },
    Record {
        reply: oneshot::Sender<Option<MatchRecord>>,
    },
    Shutdown,
}

// =============================================================================
// SESSION
// =============================================================================

/// A match session.
pub struct MatchSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// Session configuration.
    pub config: SessionConfig,
    state: MatchState,
    started_at: Option<DateTime<Utc>>,
    record: Option<MatchRecord>,
    notify_tx: broadcast::Sender<Notification>,
}

impl MatchSession {
    /// Create a session that is driven by hand.
    pub fn new(id: SessionId, config: SessionConfig) -> Self {
        let (notify_tx, _) = broadcast::channel(config.event_buffer.max(1));

        Self {
            id,
            config,
            state: MatchState::new(),
            started_at: None,
            record: None,
            notify_tx,
        }
    }

    /// Start a session task with a fresh id.
    pub fn spawn(config: SessionConfig) -> SessionHandle {
        let id = uuid::Uuid::new_v4().into_bytes();
        Self::spawn_with_id(id, config).0
    }

    /// Start a session task and keep its join handle.
    pub fn spawn_with_id(
        id: SessionId,
        config: SessionConfig,
    ) -> (SessionHandle, JoinHandle<Option<MatchRecord>>) {
        let session = Self::new(id, config);
        let (command_tx, command_rx) = mpsc::channel(session.config.command_buffer.max(1));

        let handle = SessionHandle {
            id,
            commands: command_tx,
            notifications: session.notify_tx.clone(),
        };
        let task = tokio::spawn(session.run(command_rx));

        (handle, task)
    }

    /// Apply one host command.
    pub fn apply(&mut self, command: HostCommand) -> HostReply {
        let result = match command {
            HostCommand::Join { player_id, name, squad } => match HostCommand::parse_squad(squad) {
                Ok(squad) => self.state.join(PlayerId::new(player_id), name, squad),
                Err(e) => Err(MatchError::from(e)),
            },
            HostCommand::Leave { player_id } => {
                self.state.leave(PlayerId::new(player_id)).map(|_| ())
            }
            HostCommand::Death { player_id, killer_id, cause } => self.state.notify_death(
                PlayerId::new(player_id),
                killer_id.map(PlayerId::new),
                cause,
            ),
            HostCommand::Revive { player_id } => self.state.notify_revive(PlayerId::new(player_id)),
            HostCommand::StartGame => self.start_game(),
            HostCommand::EndRound => {
                self.state.end_round();
                Ok(())
            }
            HostCommand::Snapshot => return HostReply::Snapshot(self.snapshot()),
        };

        self.publish_events();

        match result {
            Ok(()) => HostReply::Accepted,
            Err(e) => {
                warn!("Session {:?}: command rejected: {}", &self.id[..4], e);
                HostReply::rejected(&e)
            }
        }
    }

    fn start_game(&mut self) -> Result<(), MatchError> {
        self.state.start_game()?;
        self.state.start_round(0)?;
        self.started_at = Some(Utc::now());
        self.record = None;
        Ok(())
    }

    /// Advance the match by one second.
    pub fn run_tick(&mut self) -> TickResult {
        let result = tick(&mut self.state);

        for event in &result.events {
            let _ = self.notify_tx.send(Notification::Event(event.clone()));
        }

        if result.match_ended.is_some() {
            self.finalize();
        }

        result
    }

    fn finalize(&mut self) {
        let ended_at = Utc::now();
        let started_at = self.started_at.unwrap_or(ended_at);

        match MatchRecord::from_state(self.id, started_at, ended_at, &self.state) {
            Ok(record) => {
                info!(
                    "Session {:?} finished after {} rounds, result {}",
                    &self.id[..4],
                    record.round_count(),
                    hex::encode(record.result_hash())
                );
                let _ = self.notify_tx.send(Notification::Finished(record.clone()));
                self.record = Some(record);
            }
            Err(e) => warn!("Session {:?}: no record: {}", &self.id[..4], e),
        }
    }

    fn publish_events(&mut self) {
        for event in self.state.take_events() {
            let _ = self.notify_tx.send(Notification::Event(event));
        }
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::from_state(&self.state)
    }

    /// The rules state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Record of the last finished game.
    pub fn record(&self) -> Option<&MatchRecord> {
        self.record.as_ref()
    }

    /// Subscribe to notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    #[instrument(skip_all, fields(session = %hex::encode(&self.id[..4])))]
    async fn run(mut self, mut commands: mpsc::Receiver<SessionRequest>) -> Option<MatchRecord> {
        let mut ticker = interval(self.config.tick_interval);
        // Every lost second still counts against the round clock
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let mut close_at: Option<Instant> = None;

        info!("Session started");

        loop {
            let linger = async move {
                match close_at {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                _ = ticker.tick(), if self.state.is_started() => {
                    let result = self.run_tick();
                    if result.match_ended.is_some() {
                        close_at = Some(Instant::now() + self.config.linger);
                    }
                }

                request = commands.recv() => match request {
                    Some(SessionRequest::Command { command, reply }) => {
                        let starts_game = command == HostCommand::StartGame;
                        let response = self.apply(command);
                        if starts_game && response == HostReply::Accepted {
                            // First second of round 0 is a full interval away
                            ticker.reset();
                            close_at = None;
                        }
                        let _ = reply.send(response);
                    }
                    Some(SessionRequest::Record { reply }) => {
                        let _ = reply.send(self.record.clone());
                    }
                    Some(SessionRequest::Shutdown) | None => {
                        debug!("Session shutting down");
                        break;
                    }
                },

                _ = linger => {
                    debug!("Session linger elapsed");
                    break;
                }
            }
        }

        info!("Session closed");
        self.record
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionRequest>,
    notifications: broadcast::Sender<Notification>,
}

impl SessionHandle {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// True once the session task has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Subscribe to notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Send a command and wait for its reply.
    pub async fn send(&self, command: HostCommand) -> Result<HostReply, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionRequest::Command { command, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    async fn expect_accepted(&self, command: HostCommand) -> Result<(), SessionError> {
        match self.send(command).await? {
            HostReply::Accepted => Ok(()),
            HostReply::Rejected { code, message } => Err(SessionError::Rejected { code, message }),
            HostReply::Snapshot(_) => Err(SessionError::UnexpectedReply),
        }
    }

    /// Player joined.
    pub async fn join(
        &self,
        player_id: u32,
        name: impl Into<String>,
        squad: Option<i32>,
    ) -> Result<(), SessionError> {
        self.expect_accepted(HostCommand::Join { player_id, name: name.into(), squad })
            .await
    }

    /// Player left.
    pub async fn leave(&self, player_id: u32) -> Result<(), SessionError> {
        self.expect_accepted(HostCommand::Leave { player_id }).await
    }

    /// Player died.
    pub async fn death(
        &self,
        player_id: u32,
        killer_id: Option<u32>,
        cause: Option<String>,
    ) -> Result<(), SessionError> {
        self.expect_accepted(HostCommand::Death { player_id, killer_id, cause })
            .await
    }

    /// Player revived.
    pub async fn revive(&self, player_id: u32) -> Result<(), SessionError> {
        self.expect_accepted(HostCommand::Revive { player_id }).await
    }

    /// Start the game and round 0.
    pub async fn start_game(&self) -> Result<(), SessionError> {
        self.expect_accepted(HostCommand::StartGame).await
    }

    /// Stop the round clock early.
    pub async fn end_round(&self) -> Result<(), SessionError> {
        self.expect_accepted(HostCommand::EndRound).await
    }

    /// Current state snapshot.
    pub async fn snapshot(&self) -> Result<MatchSnapshot, SessionError> {
        match self.send(HostCommand::Snapshot).await? {
            HostReply::Snapshot(snapshot) => Ok(snapshot),
            _ => Err(SessionError::UnexpectedReply),
        }
    }

    /// Record of the last finished game, if any.
    pub async fn record(&self) -> Result<Option<MatchRecord>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionRequest::Record { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Ask the session to stop.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionRequest::Shutdown).await;
    }
}

// =============================================================================
// MANAGER
// =============================================================================

/// Tracks running sessions.
pub struct SessionManager {
    sessions: RwLock<BTreeMap<SessionId, SessionHandle>>,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Spawn a new session.
    pub async fn create_session(&self, config: SessionConfig) -> SessionHandle {
        let handle = MatchSession::spawn(config);

        let mut sessions = self.sessions.write().await;
        sessions.insert(handle.id(), handle.clone());

        handle
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Stop and forget a session.
    pub async fn remove_session(&self, id: &SessionId) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };

        match removed {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Forget sessions whose task has exited.
    pub async fn cleanup(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.is_closed());
        before - sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{GameEventData, MatchOutcome, RoundOutcome};
    use crate::game::squad::SquadId;
    use crate::{BASE_TIMER_SECS, MAX_ROUNDS, ROUND_DURATION_SECS};

    fn fast_config() -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(10),
            linger: Duration::from_secs(1),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_apply_commands() {
        let mut session = MatchSession::new([1; 16], SessionConfig::default());

        let join = session.apply(HostCommand::Join {
            player_id: 1,
            name: "ana".into(),
            squad: Some(0),
        });
        assert_eq!(join, HostReply::Accepted);

        let bad_squad = session.apply(HostCommand::Join {
            player_id: 2,
            name: String::new(),
            squad: Some(9),
        });
        assert!(matches!(bad_squad, HostReply::Rejected { code: ErrorCode::InvalidSquad, .. }));

        // No round yet
        let death = session.apply(HostCommand::Death { player_id: 1, killer_id: None, cause: None });
        assert!(matches!(death, HostReply::Rejected { code: ErrorCode::RoundNotActive, .. }));

        // Ending a round that never started is not an error
        assert_eq!(session.apply(HostCommand::EndRound), HostReply::Accepted);
        assert!(session.state().round_ended());
        assert!(!session.state().round_started());

        assert_eq!(session.apply(HostCommand::StartGame), HostReply::Accepted);
        assert_eq!(session.state().current_round(), Some(0));

        let again = session.apply(HostCommand::StartGame);
        assert!(matches!(again, HostReply::Rejected { code: ErrorCode::GameInProgress, .. }));

        match session.apply(HostCommand::Snapshot) {
            HostReply::Snapshot(snapshot) => {
                assert_eq!(snapshot.current_round, Some(0));
                assert!(snapshot.round_started);
                assert_eq!(snapshot.players.len(), 1);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_events_published_on_apply() {
        let mut session = MatchSession::new([2; 16], SessionConfig::default());
        let mut rx = session.subscribe();

        session.apply(HostCommand::Join { player_id: 1, name: String::new(), squad: Some(3) });
        session.apply(HostCommand::StartGame);
        session.apply(HostCommand::Death { player_id: 1, killer_id: Some(9), cause: None });

        let mut kinds = Vec::new();
        while let Ok(Notification::Event(event)) = rx.try_recv() {
            kinds.push(event.data);
        }

        assert!(matches!(kinds[0], GameEventData::MatchStarted { players: 1 }));
        assert!(matches!(kinds[1], GameEventData::RoundStarted { round: 0 }));
        assert!(matches!(
            kinds[2],
            GameEventData::PlayerDied { player, killer: Some(_), .. } if player == PlayerId::new(1)
        ));
    }

    #[test]
    fn test_manual_ticks_produce_record() {
        let mut session = MatchSession::new([3; 16], SessionConfig::default());
        session.apply(HostCommand::Join { player_id: 1, name: String::new(), squad: Some(0) });
        session.apply(HostCommand::StartGame);

        // Nobody dies: every round is contested, no winner after seven
        let mut ticks = 0;
        while !session.state().is_ended() {
            session.run_tick();
            ticks += 1;
            assert!(ticks <= ROUND_DURATION_SECS * MAX_ROUNDS as u32);
        }

        let record = session.record().expect("record built at game end");
        assert_eq!(record.outcome, MatchOutcome::NoWinner);
        assert_eq!(record.round_count(), MAX_ROUNDS as usize);
        assert_eq!(record.match_id, [3; 16]);
        assert!(record.rounds.iter().all(|r| r.sudden_death));
    }

    async fn join_one_per_squad(handle: &SessionHandle) {
        for squad in 0..6 {
            handle.join(squad as u32 + 1, "", Some(squad)).await.unwrap();
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<Notification>) -> crate::game::events::GameEvent {
        loop {
            if let Notification::Event(event) = rx.recv().await.unwrap() {
                return event;
            }
        }
    }

    async fn wait_for_sudden_death(rx: &mut broadcast::Receiver<Notification>, expected: u8) {
        loop {
            let event = next_event(rx).await;
            if let GameEventData::SuddenDeathEntered { round } = event.data {
                assert_eq!(round, expected);
                assert_eq!(event.tick, BASE_TIMER_SECS);
                return;
            }
        }
    }

    async fn wait_for_round_end(rx: &mut broadcast::Receiver<Notification>) -> (u8, RoundOutcome) {
        loop {
            if let GameEventData::RoundEnded { round, outcome } = next_event(rx).await.data {
                return (round, outcome);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_round_clock() {
        let handle = MatchSession::spawn(fast_config());
        let mut rx = handle.subscribe();

        join_one_per_squad(&handle).await;
        handle.start_game().await.unwrap();

        wait_for_sudden_death(&mut rx, 0).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.sudden_death);
        assert!(snapshot.players.iter().all(|p| p.pinged));

        // One death per squad in sudden death; squad 0 is left standing
        for player in 2..=6 {
            handle.death(player, Some(1), Some("knife".into())).await.unwrap();
        }

        let (round, outcome) = wait_for_round_end(&mut rx).await;
        assert_eq!(round, 0);
        assert_eq!(outcome, RoundOutcome::Won { squad: SquadId::new(0).unwrap() });

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_round, Some(1));
        assert_eq!(snapshot.squads[0].rounds_won, 1);
        assert!(!snapshot.sudden_death);
        assert!(snapshot.players.iter().all(|p| p.alive && !p.pinged));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_end_round_is_contested() {
        let handle = MatchSession::spawn(fast_config());
        let mut rx = handle.subscribe();

        join_one_per_squad(&handle).await;
        handle.start_game().await.unwrap();
        handle.end_round().await.unwrap();

        let (round, outcome) = wait_for_round_end(&mut rx).await;
        assert_eq!(round, 0);
        assert_eq!(outcome, RoundOutcome::Contested { survivors: 6 });

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_finishes_with_record() {
        let handle = MatchSession::spawn(fast_config());
        let mut rx = handle.subscribe();

        join_one_per_squad(&handle).await;
        handle.start_game().await.unwrap();

        // Squad 4 outlives everyone in two sudden deaths
        for round in 0..2u8 {
            wait_for_sudden_death(&mut rx, round).await;
            for player in [1, 2, 3, 4, 6] {
                handle.death(player, None, None).await.unwrap();
            }
            let (ended, outcome) = wait_for_round_end(&mut rx).await;
            assert_eq!(ended, round);
            assert_eq!(outcome.winner(), SquadId::new(4));
        }

        let record = loop {
            if let Notification::Finished(record) = rx.recv().await.unwrap() {
                break record;
            }
        };
        assert_eq!(record.outcome, MatchOutcome::Winner { squad: SquadId::new(4).unwrap() });
        assert_eq!(record.round_count(), 2);
        assert_eq!(record.match_id, handle.id());

        assert_eq!(handle.record().await.unwrap(), Some(record));

        // Finished session closes once the linger elapses
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(handle.snapshot().await, Err(SessionError::Closed)));
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_command_surfaces_error() {
        let handle = MatchSession::spawn(fast_config());

        let err = handle.start_game().await.unwrap_err();
        assert!(matches!(err, SessionError::Rejected { code: ErrorCode::NotEnoughPlayers, .. }));

        handle.join(1, "", None).await.unwrap();
        let err = handle.join(1, "", None).await.unwrap_err();
        assert!(matches!(err, SessionError::Rejected { code: ErrorCode::DuplicatePlayer, .. }));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_manager() {
        let manager = SessionManager::new();

        let a = manager.create_session(fast_config()).await;
        let b = manager.create_session(fast_config()).await;
        assert_ne!(a.id(), b.id());
        assert_eq!(manager.session_count().await, 2);
        assert!(manager.get_session(&a.id()).await.is_some());

        assert!(manager.remove_session(&a.id()).await);
        assert!(!manager.remove_session(&a.id()).await);
        assert_eq!(manager.session_count().await, 1);

        // A session that stops on its own is swept by cleanup
        b.shutdown().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.cleanup().await, 1);
        assert_eq!(manager.session_count().await, 0);
    }
}
