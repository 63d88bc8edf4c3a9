//! Squad Royale Demo
//!
//! Plays one seeded match through a hand-driven session: twenty-four
//! players join, and a deterministic PRNG decides who dies and who gets
//! revived each second. The same seed always produces the same record.

use anyhow::{bail, Context};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use squad_royale::{
    DeterministicRng, GameEventData, MatchSession, SessionConfig, MAX_ROUNDS,
    PLAYERS_PER_SQUAD, ROUND_DURATION_SECS, SQUAD_COUNT, VERSION,
    host::{HostCommand, HostReply, Notification},
};

/// Chance per second that somebody dies.
const DEATH_CHANCE: u32 = 30;

/// Chance per second that somebody is revived.
const REVIVE_CHANCE: u32 = 15;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seed: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().with_context(|| format!("invalid seed '{}'", arg))?,
        None => 12345,
    };

    info!("Squad Royale v{}", VERSION);
    info!(
        "{} squads of {}, first to win {} of {} rounds",
        SQUAD_COUNT,
        PLAYERS_PER_SQUAD,
        squad_royale::ROUND_WIN_THRESHOLD,
        MAX_ROUNDS
    );

    demo_match(seed)
}

fn demo_match(seed: u64) -> anyhow::Result<()> {
    let mut match_id = [0u8; 16];
    match_id[..8].copy_from_slice(&seed.to_le_bytes());

    let mut rng = DeterministicRng::from_match_id(&match_id);
    let mut session = MatchSession::new(match_id, SessionConfig::default());
    let mut notifications = session.subscribe();

    info!("Match ID: {}", hex::encode(match_id));

    for squad in 0..SQUAD_COUNT as i32 {
        for slot in 0..PLAYERS_PER_SQUAD as i32 {
            let player_id = (squad * PLAYERS_PER_SQUAD as i32 + slot) as u32;
            let reply = session.apply(HostCommand::Join {
                player_id,
                name: format!("player-{}", player_id),
                squad: Some(squad),
            });
            if reply != HostReply::Accepted {
                bail!("join of {} refused: {:?}", player_id, reply);
            }
        }
    }

    if session.apply(HostCommand::StartGame) != HostReply::Accepted {
        bail!("game did not start");
    }

    let max_ticks = ROUND_DURATION_SECS * MAX_ROUNDS as u32;
    let mut ticks = 0;

    while !session.state().is_ended() && ticks < max_ticks {
        if rng.chance(DEATH_CHANCE) {
            let alive: Vec<u32> = session
                .state()
                .players()
                .filter(|p| p.is_alive())
                .map(|p| p.id.0)
                .collect();
            if let Some(&victim) = rng.choose(&alive) {
                let killer = rng.choose(&alive).copied().filter(|k| *k != victim);
                session.apply(HostCommand::Death { player_id: victim, killer_id: killer, cause: None });
            }
        }

        if rng.chance(REVIVE_CHANCE) {
            let revivable: Vec<u32> = session
                .state()
                .players()
                .filter(|p| p.can_be_revived(session.state().squads()))
                .map(|p| p.id.0)
                .collect();
            if let Some(&target) = rng.choose(&revivable) {
                session.apply(HostCommand::Revive { player_id: target });
            }
        }

        session.run_tick();
        ticks += 1;

        while let Ok(notification) = notifications.try_recv() {
            log_notification(&notification);
        }
    }

    let record = session.record().context("match did not finish")?;
    let bytes = record.to_bytes()?;

    info!("=== Match Complete ===");
    info!("Rounds played: {}", record.round_count());
    info!("Round wins: {:?}", record.rounds_won);
    info!("Outcome: {:?}", record.outcome);
    info!("Record: {} bytes", bytes.len());
    info!("Result hash: {}", hex::encode(record.result_hash()));

    Ok(())
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::Event(event) => match &event.data {
            GameEventData::RoundStarted { round } => info!("Round {} started", round + 1),
            GameEventData::SuddenDeathEntered { round } => {
                info!("Round {}: sudden death at {}s", round + 1, event.tick)
            }
            GameEventData::SquadEliminated { squad, sudden_death } => {
                info!("  {} eliminated at {}s (sudden death: {})", squad, event.tick, sudden_death)
            }
            GameEventData::RoundEnded { round, outcome } => {
                info!("Round {} ended at {}s: {:?}", round + 1, event.tick, outcome)
            }
            other => debug!("{:?}", other),
        },
        Notification::Finished(record) => {
            info!("Match finished with {:?}", record.outcome)
        }
    }
}
