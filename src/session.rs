//! Run state machine
//!
//! Drives one run from start to the result scene: fixed-step ticking, manual
//! pause, the revive offer, win/loss finalisation and the guarded scene
//! transition. Ads and scene changes complete asynchronously; the session
//! polls them each frame against deadlines on its own wall clock, which keeps
//! running while the simulation clock is paused.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::platform::{AdKind, AdTicket, LeaderboardRow, SceneKey, Services, fetch_top};
use crate::sim::state::{PauseState, RunOutcome, RunPhase};
use crate::sim::{GameEvent, GameState, TickInput, tick};
use crate::tuning::Tuning;

/// Payload handed to the result scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub kills: u32,
    pub score: u64,
    pub elapsed_ms: f64,
    pub credits_earned: u64,
    pub wave_reached: u32,
    pub revive_used: bool,
}

/// Where the session is, as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting on the restart interstitial
    Starting,
    Playing,
    Paused,
    ReviveOffer,
    /// Finalised, waiting on the loss interstitial or the next scene
    Ending,
    /// Next scene is up
    Finished,
    /// Left before the run finished
    Left,
    /// Neither the target nor the fallback scene could be started
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdPurpose {
    RestartInterstitial,
    Revive,
    LossInterstitial,
}

#[derive(Debug, Clone, Copy)]
struct PendingAd {
    ticket: AdTicket,
    purpose: AdPurpose,
    deadline_ms: f64,
}

#[derive(Debug, Clone, Copy)]
struct SceneWatchdog {
    target: SceneKey,
    deadline_ms: f64,
}

/// One run, from start to the result scene
#[derive(Debug, Clone)]
pub struct RunSession {
    pub game: GameState,
    tuning: Tuning,
    /// Session time in ms; keeps running while the game is paused
    wall_ms: f64,
    accumulator: f32,
    pending_ad: Option<PendingAd>,
    watchdog: Option<SceneWatchdog>,
    summary: Option<RunSummary>,
    top_rows: Vec<LeaderboardRow>,
    /// Cleared when the player leaves the game scene
    active: bool,
    /// Last gameplay mark sent to the host
    gameplay_marked: bool,
    finished: bool,
    abandoned: bool,
}

impl RunSession {
    /// Set up a run. With `show_interstitial_after_restart` the run stays idle
    /// until the interstitial resolves or times out.
    pub fn begin(tuning: Tuning, services: &mut Services<'_>, show_interstitial_after_restart: bool) -> Self {
        let tuning = tuning.normalized();
        let max_hp = services.progress.data.player_max_hp(tuning.player_base_hp);
        let mut session = Self {
            game: GameState::new(tuning.seed, max_hp, &tuning),
            tuning,
            wall_ms: 0.0,
            accumulator: 0.0,
            pending_ad: None,
            watchdog: None,
            summary: None,
            top_rows: Vec::new(),
            active: true,
            gameplay_marked: false,
            finished: false,
            abandoned: false,
        };

        if show_interstitial_after_restart {
            session.request_ad(services, AdKind::Interstitial, AdPurpose::RestartInterstitial);
        } else {
            session.start_gameplay(services);
        }
        session
    }

    pub fn phase(&self) -> SessionPhase {
        if self.abandoned {
            return SessionPhase::Abandoned;
        }
        if self.finished {
            return SessionPhase::Finished;
        }
        if !self.active {
            return SessionPhase::Left;
        }
        if self.game.run.is_ending() {
            return SessionPhase::Ending;
        }
        if self.game.run.phase == RunPhase::Idle {
            return SessionPhase::Starting;
        }
        match self.game.run.pause {
            PauseState::None => SessionPhase::Playing,
            PauseState::Manual => SessionPhase::Paused,
            PauseState::ReviveOffer => SessionPhase::ReviveOffer,
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Leaderboard rows fetched after a win; empty when unavailable
    pub fn leaderboard_rows(&self) -> &[LeaderboardRow] {
        &self.top_rows
    }

    pub fn wall_ms(&self) -> f64 {
        self.wall_ms
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Advance one rendered frame
    pub fn update(&mut self, frame_dt: f32, input: &TickInput, services: &mut Services<'_>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.active || self.finished {
            return events;
        }

        let frame_dt = frame_dt.clamp(0.0, 0.1);
        self.wall_ms += frame_dt as f64 * 1000.0;

        self.poll_ad(services);
        self.poll_watchdog(services);

        if input.pause {
            match self.game.run.toggle_pause() {
                Some(true) => {
                    self.mark_gameplay(services, false);
                    events.push(GameEvent::Paused);
                }
                Some(false) => {
                    self.mark_gameplay(services, true);
                    events.push(GameEvent::Resumed);
                }
                None => {}
            }
        }

        let input = TickInput {
            pause: false,
            ..input.clone()
        };
        self.simulate(frame_dt, &input, services, &mut events);
        events
    }

    fn simulate(&mut self, frame_dt: f32, input: &TickInput, services: &mut Services<'_>, events: &mut Vec<GameEvent>) {
        if !self.game.run.is_simulating() {
            self.accumulator = 0.0;
            return;
        }

        self.accumulator += frame_dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let tick_events = tick(&mut self.game, input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            self.handle_events(&tick_events, services);
            events.extend(tick_events);
            if !self.game.run.is_simulating() {
                break;
            }
        }
        // Drop backlog beyond one frame's worth of substeps
        self.accumulator = self.accumulator.min(SIM_DT * MAX_SUBSTEPS as f32);
    }

    fn handle_events(&mut self, events: &[GameEvent], services: &mut Services<'_>) {
        for event in events {
            match event {
                GameEvent::ReviveOffered => self.offer_revive(services),
                GameEvent::WinReached => {
                    self.finish_win(services);
                }
                GameEvent::Defeated => {
                    self.finish_loss(services);
                }
                _ => {}
            }
        }
    }

    fn start_gameplay(&mut self, services: &mut Services<'_>) {
        self.game.start();
        if self.game.run.phase != RunPhase::Running || self.game.run.is_ending() {
            return;
        }
        self.mark_gameplay(services, true);
        log::info!(
            "Run started (seed {}, hp {}, {} kills to win)",
            self.game.seed,
            self.game.run.max_hp,
            self.game.run.kills_to_win
        );
    }

    /// Send a gameplay mark when liveness changes
    fn mark_gameplay(&mut self, services: &mut Services<'_>, live: bool) {
        if self.gameplay_marked == live {
            return;
        }
        self.gameplay_marked = live;
        if live {
            services.gameplay.gameplay_start();
        } else {
            services.gameplay.gameplay_stop();
        }
    }

    fn request_ad(&mut self, services: &mut Services<'_>, kind: AdKind, purpose: AdPurpose) {
        let timeout_ms = match kind {
            AdKind::Interstitial => self.tuning.interstitial_timeout_ms,
            AdKind::Rewarded => self.tuning.rewarded_timeout_ms,
        };
        match services.ads.begin(kind) {
            Ok(ticket) => {
                self.pending_ad = Some(PendingAd {
                    ticket,
                    purpose,
                    deadline_ms: self.wall_ms + timeout_ms,
                });
            }
            Err(err) => {
                log::warn!("{:?} ad failed to start: {}", kind, err);
                self.resolve_ad(purpose, false, services);
            }
        }
    }

    fn poll_ad(&mut self, services: &mut Services<'_>) {
        let Some(pending) = self.pending_ad else {
            return;
        };
        let result = match services.ads.poll(pending.ticket) {
            Some(result) => result,
            None if self.wall_ms >= pending.deadline_ms => {
                log::warn!("{:?} ad timed out", pending.purpose);
                false
            }
            None => return,
        };
        self.pending_ad = None;
        self.resolve_ad(pending.purpose, result, services);
    }

    fn resolve_ad(&mut self, purpose: AdPurpose, result: bool, services: &mut Services<'_>) {
        match purpose {
            // Interstitial outcomes never block the flow
            AdPurpose::RestartInterstitial => self.start_gameplay(services),
            AdPurpose::LossInterstitial => self.transition(services, SceneKey::GameOver),
            AdPurpose::Revive => self.resolve_revive(result, services),
        }
    }

    fn offer_revive(&mut self, services: &mut Services<'_>) {
        log::info!("Revive offered at {} kills", self.game.run.kills);
        self.mark_gameplay(services, false);
        self.request_ad(services, AdKind::Rewarded, AdPurpose::Revive);
    }

    fn resolve_revive(&mut self, rewarded: bool, services: &mut Services<'_>) {
        if self.game.run.is_ending() || self.game.run.pause != PauseState::ReviveOffer {
            log::debug!("Discarding stale revive result");
            return;
        }
        if rewarded {
            self.game.revive();
            self.mark_gameplay(services, true);
            log::info!("Revive granted, hp {}", self.game.run.hp);
        } else {
            log::info!("Revive declined");
            self.finish_loss(services);
        }
    }

    /// Finalise a win. Returns false if the run was already finalised.
    pub fn finish_win(&mut self, services: &mut Services<'_>) -> bool {
        if !self.game.run.begin_ending(RunOutcome::Win) {
            log::debug!("Run already ending, ignoring win");
            return false;
        }
        self.game.world.freeze();
        self.mark_gameplay(services, false);

        let elapsed_ms = self.run_elapsed_ms();
        let score = (self.tuning.score_base_ms - elapsed_ms).round().max(1.0) as u64;
        let kills = self.game.run.kills;
        let credits = services.progress.data.record_win(score, kills);
        services.progress.save(services.storage);

        if let Err(err) = services.leaderboard.submit_score(score) {
            log::warn!("Score submit failed: {}", err);
        }
        self.top_rows = fetch_top(services.leaderboard, self.tuning.leaderboard_rows);

        log::info!(
            "Run won: {} kills in {:.1}s, score {}, +{} credits",
            kills,
            elapsed_ms / 1000.0,
            score,
            credits
        );
        self.summary = Some(self.build_summary(score, credits));
        self.transition(services, SceneKey::Win);
        true
    }

    /// Finalise a loss. Returns false if the run was already finalised.
    pub fn finish_loss(&mut self, services: &mut Services<'_>) -> bool {
        if !self.game.run.begin_ending(RunOutcome::Loss) {
            log::debug!("Run already ending, ignoring loss");
            return false;
        }
        self.game.world.freeze();
        self.mark_gameplay(services, false);

        let kills = self.game.run.kills;
        let credits = services.progress.data.record_loss(kills);
        services.progress.save(services.storage);

        log::info!("Run lost at wave {}: {} kills, +{} credits", self.game.run.wave, kills, credits);
        self.summary = Some(self.build_summary(0, credits));
        self.request_ad(services, AdKind::Interstitial, AdPurpose::LossInterstitial);
        true
    }

    /// Run time as reported to the result scene, never below 1ms
    fn run_elapsed_ms(&self) -> f64 {
        self.game.elapsed_ms().max(1.0)
    }

    fn build_summary(&self, score: u64, credits_earned: u64) -> RunSummary {
        RunSummary {
            kills: self.game.run.kills,
            score,
            elapsed_ms: self.run_elapsed_ms(),
            credits_earned,
            wave_reached: self.game.run.wave,
            revive_used: self.game.run.revive_used,
        }
    }

    /// Start the result scene and arm the watchdog
    fn transition(&mut self, services: &mut Services<'_>, target: SceneKey) {
        if !self.active {
            log::debug!("Session left, skipping {} scene", target.as_str());
            return;
        }
        match services.scenes.start_scene(target, self.summary.as_ref()) {
            Ok(()) => {
                self.watchdog = Some(SceneWatchdog {
                    target,
                    deadline_ms: self.wall_ms + self.tuning.scene_watchdog_ms,
                });
                self.poll_watchdog(services);
            }
            Err(err) => {
                log::warn!("{} scene failed to start: {}", target.as_str(), err);
                self.fall_back(services);
            }
        }
    }

    fn poll_watchdog(&mut self, services: &mut Services<'_>) {
        let Some(watchdog) = self.watchdog else {
            return;
        };
        if services.scenes.is_active(watchdog.target) {
            self.watchdog = None;
            self.finished = true;
        } else if self.wall_ms >= watchdog.deadline_ms {
            log::warn!("{} scene never became active", watchdog.target.as_str());
            self.watchdog = None;
            self.fall_back(services);
        }
    }

    fn fall_back(&mut self, services: &mut Services<'_>) {
        let fallback = self.tuning.fallback_scene;
        log::warn!("Falling back to {} scene", fallback.as_str());
        match services.scenes.start_scene(fallback, None) {
            Ok(()) => self.finished = true,
            Err(err) => {
                log::error!("Fallback scene failed, abandoning run: {}", err);
                self.abandoned = true;
                self.active = false;
            }
        }
    }

    /// Leave the game scene. Late ad or scene completions are ignored from now on.
    pub fn leave(&mut self, services: &mut Services<'_>) {
        if !self.active {
            return;
        }
        self.mark_gameplay(services, false);
        if let Some(pending) = self.pending_ad.take() {
            log::debug!("Discarding pending {:?} ad", pending.purpose);
        }
        self.watchdog = None;
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LocalLeaderboard;
    use crate::persistence::ProgressStore;
    use crate::platform::memory::{
        AdScript, GameplayMark, MemoryStorage, RecordingGameplayMarker, RecordingSceneDirector, ScriptedAdGate,
    };
    use crate::sim::projectile::{Owner, Shot, create_bullet};
    use glam::Vec2;

    const FRAME: f32 = 0.1;

    #[derive(Default)]
    struct Harness {
        storage: MemoryStorage,
        leaderboard: LocalLeaderboard,
        ads: ScriptedAdGate,
        scenes: RecordingSceneDirector,
        gameplay: RecordingGameplayMarker,
        progress: ProgressStore,
    }

    impl Harness {
        fn services(&mut self) -> Services<'_> {
            Services {
                storage: &mut self.storage,
                leaderboard: &mut self.leaderboard,
                ads: &mut self.ads,
                scenes: &mut self.scenes,
                gameplay: &mut self.gameplay,
                progress: &mut self.progress,
            }
        }

        fn begin(&mut self, interstitial: bool) -> RunSession {
            RunSession::begin(Tuning::default(), &mut self.services(), interstitial)
        }

        fn frames(&mut self, session: &mut RunSession, count: usize) -> Vec<GameEvent> {
            let input = TickInput::default();
            (0..count)
                .flat_map(|_| session.update(FRAME, &input, &mut self.services()))
                .collect()
        }
    }

    fn hit_player(session: &mut RunSession) {
        let pos = session.game.world.player.pos;
        let shot = Shot::new(Owner::Enemy, pos, pos + Vec2::X, 1.0);
        create_bullet(&mut session.game.world.enemy_bullets, session.game.clock_ms, shot).unwrap();
    }

    #[test]
    fn test_begin_starts_running() {
        let mut h = Harness::default();
        let session = h.begin(false);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert!(h.ads.requests.is_empty());
    }

    #[test]
    fn test_max_hp_includes_upgrades() {
        let mut h = Harness::default();
        h.progress.data.hp_upgrade_level = 2;
        let session = h.begin(false);
        assert_eq!(session.game.run.max_hp, PLAYER_BASE_HP + 2);
    }

    #[test]
    fn test_begin_clamps_tuning() {
        let mut h = Harness::default();
        let tuning = Tuning {
            arena_width: 100.0,
            kills_to_win: 0,
            ..Default::default()
        };
        let session = RunSession::begin(tuning, &mut h.services(), false);
        assert_eq!(session.tuning().arena_width, ARENA_WIDTH);
        assert_eq!(session.game.world.arena.width, ARENA_WIDTH);
        assert_eq!(session.game.run.kills_to_win, 1);
    }

    #[test]
    fn test_restart_interstitial_holds_start() {
        let mut h = Harness {
            ads: ScriptedAdGate::new(AdScript::Hang, AdScript::Hang),
            ..Default::default()
        };
        let mut session = h.begin(true);
        h.frames(&mut session, 5);
        assert_eq!(session.phase(), SessionPhase::Starting);
        assert_eq!(session.game.clock_ms, 0.0);

        let ticket = h.ads.last_ticket().unwrap();
        assert!(h.gameplay.marks.is_empty());
        h.ads.settle(ticket, false);
        h.frames(&mut session, 1);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(h.gameplay.marks, vec![GameplayMark::Start]);
    }

    #[test]
    fn test_restart_interstitial_timeout_starts_anyway() {
        let mut h = Harness {
            ads: ScriptedAdGate::new(AdScript::Hang, AdScript::Hang),
            ..Default::default()
        };
        let mut session = h.begin(true);
        h.frames(&mut session, 34);
        assert_eq!(session.phase(), SessionPhase::Starting);
        h.frames(&mut session, 2);
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_restart_interstitial_failure_starts_immediately() {
        let mut h = Harness {
            ads: ScriptedAdGate::new(AdScript::Fail, AdScript::Hang),
            ..Default::default()
        };
        let session = h.begin(true);
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_leaving_discards_late_interstitial() {
        let mut h = Harness {
            ads: ScriptedAdGate::new(AdScript::Hang, AdScript::Hang),
            ..Default::default()
        };
        let mut session = h.begin(true);
        session.leave(&mut h.services());
        let ticket = h.ads.last_ticket().unwrap();
        h.ads.settle(ticket, true);
        h.frames(&mut session, 3);
        assert_eq!(session.phase(), SessionPhase::Left);
        assert_eq!(session.game.run.phase, RunPhase::Idle);
        assert!(h.gameplay.marks.is_empty());
    }

    #[test]
    fn test_double_finalize_awards_once() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        session.game.run.kills = 10;

        assert!(session.finish_loss(&mut h.services()));
        assert!(!session.finish_loss(&mut h.services()));
        assert!(!session.finish_win(&mut h.services()));

        assert_eq!(h.progress.data.credits, 40);
        assert_eq!(h.progress.data.total_losses, 1);
        assert_eq!(h.progress.data.total_wins, 0);
        assert_eq!(h.progress.save_count(), 1);
        assert_eq!(h.storage.writes, 1);
    }

    #[test]
    fn test_win_flow() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        h.frames(&mut session, 10);
        session.game.run.kills = 30;

        assert!(session.finish_win(&mut h.services()));
        let expected_score = (240_000.0 - session.game.elapsed_ms()).round() as u64;
        let summary = session.summary().unwrap().clone();
        assert_eq!(summary.score, expected_score);
        assert_eq!(summary.credits_earned, 140);
        assert_eq!(summary.kills, 30);

        assert_eq!(h.progress.data.best_score, expected_score);
        assert_eq!(h.leaderboard.top_score(), Some(expected_score));
        assert_eq!(session.leaderboard_rows().len(), 5);
        assert_eq!(h.scenes.calls, vec![SceneKey::Win]);
        assert_eq!(h.scenes.last_payload, Some(summary));
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_instant_win_reports_minimum_elapsed() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        assert!(session.finish_win(&mut h.services()));
        let summary = session.summary().unwrap();
        assert_eq!(summary.elapsed_ms, 1.0);
        assert_eq!(summary.score, 239_999);
    }

    #[test]
    fn test_gameplay_marks_follow_pause_and_finish() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        assert_eq!(h.gameplay.marks, vec![GameplayMark::Start]);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        session.update(FRAME, &pause, &mut h.services());
        assert!(!h.gameplay.is_live());
        session.update(FRAME, &pause, &mut h.services());
        assert!(h.gameplay.is_live());

        session.finish_loss(&mut h.services());
        session.finish_loss(&mut h.services());
        session.leave(&mut h.services());
        assert_eq!(
            h.gameplay.marks,
            vec![
                GameplayMark::Start,
                GameplayMark::Stop,
                GameplayMark::Start,
                GameplayMark::Stop
            ]
        );
    }

    #[test]
    fn test_leaving_mid_run_stops_gameplay() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        h.frames(&mut session, 3);
        session.leave(&mut h.services());
        session.leave(&mut h.services());
        assert_eq!(h.gameplay.marks, vec![GameplayMark::Start, GameplayMark::Stop]);
        assert_eq!(session.phase(), SessionPhase::Left);
    }

    #[test]
    fn test_score_never_below_one() {
        let mut h = Harness::default();
        let tuning = Tuning {
            score_base_ms: 10.0,
            ..Default::default()
        };
        let mut session = RunSession::begin(tuning, &mut h.services(), false);
        h.frames(&mut session, 5);
        session.finish_win(&mut h.services());
        assert_eq!(session.summary().unwrap().score, 1);
    }

    #[test]
    fn test_leaderboard_unavailable_still_finishes() {
        let mut h = Harness::default();
        h.leaderboard.available = false;
        let mut session = h.begin(false);
        assert!(session.finish_win(&mut h.services()));
        assert!(session.leaderboard_rows().is_empty());
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_watchdog_falls_back_exactly_once() {
        let mut h = Harness {
            scenes: RecordingSceneDirector::unresponsive(),
            ..Default::default()
        };
        let mut session = h.begin(false);
        session.finish_win(&mut h.services());
        assert_eq!(h.scenes.calls, vec![SceneKey::Win]);

        h.frames(&mut session, 16);
        assert_eq!(h.scenes.calls, vec![SceneKey::Win, SceneKey::MainMenu]);
        h.frames(&mut session, 30);
        assert_eq!(h.scenes.starts_of(SceneKey::MainMenu), 1);
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_watchdog_quiet_when_scene_activates() {
        let mut h = Harness {
            scenes: RecordingSceneDirector::unresponsive(),
            ..Default::default()
        };
        let mut session = h.begin(false);
        session.finish_win(&mut h.services());
        h.frames(&mut session, 5);
        h.scenes.activate(SceneKey::Win);
        h.frames(&mut session, 30);
        assert_eq!(h.scenes.calls, vec![SceneKey::Win]);
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_scene_failure_falls_back() {
        let mut h = Harness {
            scenes: RecordingSceneDirector::failing_on(&[SceneKey::Win]),
            ..Default::default()
        };
        let mut session = h.begin(false);
        session.finish_win(&mut h.services());
        assert_eq!(h.scenes.calls, vec![SceneKey::Win, SceneKey::MainMenu]);
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_fallback_failure_abandons_run() {
        let mut h = Harness {
            scenes: RecordingSceneDirector::failing_on(&[SceneKey::Win, SceneKey::MainMenu]),
            ..Default::default()
        };
        let mut session = h.begin(false);
        session.finish_win(&mut h.services());
        assert_eq!(session.phase(), SessionPhase::Abandoned);
        assert!(h.frames(&mut session, 3).is_empty());
    }

    #[test]
    fn test_revive_declined_routes_to_loss() {
        let mut h = Harness {
            ads: ScriptedAdGate::new(AdScript::Immediate(true), AdScript::Immediate(false)),
            ..Default::default()
        };
        let mut session = h.begin(false);
        session.game.run.hp = 1;
        hit_player(&mut session);

        let events = h.frames(&mut session, 1);
        assert!(events.contains(&GameEvent::ReviveOffered));
        assert_eq!(session.phase(), SessionPhase::ReviveOffer);

        h.frames(&mut session, 2);
        assert_eq!(session.game.run.outcome(), Some(RunOutcome::Loss));
        assert_eq!(h.ads.count(AdKind::Rewarded), 1);
        assert_eq!(h.ads.count(AdKind::Interstitial), 1);
        assert_eq!(h.scenes.calls, vec![SceneKey::GameOver]);
        assert_eq!(h.progress.data.total_losses, 1);
        assert!(session.summary().unwrap().revive_used);
    }

    #[test]
    fn test_revive_granted_resumes() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        session.game.run.hp = 1;
        hit_player(&mut session);

        h.frames(&mut session, 2);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.game.run.hp, 2);
        assert!(session.game.run.revive_used);
        assert!(h.scenes.calls.is_empty());
        assert_eq!(
            h.gameplay.marks,
            vec![GameplayMark::Start, GameplayMark::Stop, GameplayMark::Start]
        );
    }

    #[test]
    fn test_rewarded_timeout_counts_as_decline() {
        let mut h = Harness {
            ads: ScriptedAdGate::new(AdScript::Immediate(true), AdScript::Hang),
            ..Default::default()
        };
        let mut session = h.begin(false);
        session.game.run.hp = 1;
        hit_player(&mut session);
        h.frames(&mut session, 1);
        let clock = session.game.clock_ms;

        h.frames(&mut session, 100);
        assert_eq!(session.phase(), SessionPhase::ReviveOffer);
        // Simulation stays frozen while the offer is open
        assert_eq!(session.game.clock_ms, clock);

        h.frames(&mut session, 25);
        assert_eq!(session.game.run.outcome(), Some(RunOutcome::Loss));
    }

    #[test]
    fn test_manual_pause_freezes_sim_not_wall() {
        let mut h = Harness::default();
        let mut session = h.begin(false);
        h.frames(&mut session, 2);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        let events = session.update(FRAME, &pause, &mut h.services());
        assert_eq!(events, vec![GameEvent::Paused]);

        let clock = session.game.clock_ms;
        let wall = session.wall_ms();
        h.frames(&mut session, 5);
        assert_eq!(session.game.clock_ms, clock);
        assert!(session.wall_ms() > wall);
        assert_eq!(session.phase(), SessionPhase::Paused);
    }
}
