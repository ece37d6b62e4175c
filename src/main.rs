//! Triangle Arena headless entry point
//!
//! Plays autopilot runs back to back against in-memory collaborators and logs
//! the outcome of each. Usage: `triangle-arena [runs] [seed]`.

use triangle_arena::consts::*;
use triangle_arena::persistence::ProgressStore;
use triangle_arena::platform::Services;
use triangle_arena::platform::memory::{
    MemoryStorage, RecordingGameplayMarker, RecordingSceneDirector, ScriptedAdGate,
};
use triangle_arena::session::SessionPhase;
use triangle_arena::sim::{GameEvent, TickInput};
use triangle_arena::{LocalLeaderboard, RunSession, Tuning};

/// Ten simulated minutes per run at most
const MAX_FRAMES_PER_RUN: usize = 60 * 60 * 10;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let runs: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(3);

    let mut storage = MemoryStorage::default();
    let mut tuning = Tuning::load(&mut storage);
    if let Some(seed) = args.next().and_then(|a| a.parse().ok()) {
        tuning.seed = seed;
    }

    let mut leaderboard = LocalLeaderboard::load(&mut storage);
    let mut ads = ScriptedAdGate::default();
    let mut scenes = RecordingSceneDirector::default();
    let mut gameplay = RecordingGameplayMarker::default();
    let mut progress = ProgressStore::default();
    progress.load(&mut storage);

    log::info!("Triangle Arena (headless) starting, {} runs", runs);

    for run in 0..runs {
        let mut services = Services {
            storage: &mut storage,
            leaderboard: &mut leaderboard,
            ads: &mut ads,
            scenes: &mut scenes,
            gameplay: &mut gameplay,
            progress: &mut progress,
        };
        play_run(&tuning, run, &mut services);

        // Spend credits between runs like the menu would
        while services.progress.data.purchase_hp_upgrade() {
            log::info!("Bought hull upgrade, level {}", services.progress.data.hp_upgrade_level);
        }
        services.progress.save(services.storage);
        tuning.seed = tuning.seed.wrapping_add(1);
    }

    if let Err(err) = leaderboard.save(&mut storage) {
        log::warn!("Leaderboard save failed: {}", err);
    }

    let data = &progress.data;
    println!(
        "\n{} wins / {} losses, {} kills, best score {}, {} credits, hull level {}",
        data.total_wins, data.total_losses, data.total_kills, data.best_score, data.credits, data.hp_upgrade_level
    );
}

fn play_run(tuning: &Tuning, run: usize, services: &mut Services<'_>) {
    // Every restart after the first goes through an interstitial
    let mut session = RunSession::begin(tuning.clone(), services, run > 0);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut rockets = 0;
    for _ in 0..MAX_FRAMES_PER_RUN {
        for event in session.update(SIM_DT, &input, services) {
            if let GameEvent::RocketsCollected { .. } = event {
                rockets += 1;
            }
        }
        if matches!(session.phase(), SessionPhase::Finished | SessionPhase::Abandoned) {
            break;
        }
    }
    if !matches!(session.phase(), SessionPhase::Finished | SessionPhase::Abandoned) {
        log::warn!("Run {} did not finish in time, leaving", run + 1);
        session.leave(services);
    }

    match session.summary() {
        Some(summary) => println!(
            "Run {}: {} kills, wave {}, score {}, {:.1}s, +{} credits, revive used: {}, pickups: {}",
            run + 1,
            summary.kills,
            summary.wave_reached,
            summary.score,
            summary.elapsed_ms / 1000.0,
            summary.credits_earned,
            summary.revive_used,
            rockets
        ),
        None => println!("Run {}: unfinished", run + 1),
    }
    for row in session.leaderboard_rows() {
        println!("  #{:<2} {:<10} {}", row.rank, row.name, row.score);
    }
}
