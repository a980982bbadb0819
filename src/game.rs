//! Game state machine
//!
//! `Idle → Playing → GameOver → Idle`. The [`Game`] owns the current
//! [`RunState`] and every host capability it needs ([`Ports`]); the host only
//! forwards input events and frame callbacks.
//!
//! One frame callback is outstanding at a time. The loop re-requests itself
//! while Idle or Playing and stops on game over.

use crate::error::{LeaderboardError, ValidationError};
use crate::highscores::{ClientUpdate, LeaderboardClient, LeaderboardEntry, ScoreTransport};
use crate::persistence::BestScoreStore;
use crate::platform::input::{ActivationLatch, InputAdapter, RawInput, Routed, Signal};
use crate::platform::scheduler::{FrameHandle, FrameScheduler};
use crate::platform::storage::KeyValueStore;
use crate::platform::time::{Clock, format_timestamp};
use crate::renderer::scene::ground_tile_width;
use crate::renderer::{FrameView, Surface, render_frame};
use crate::settings::Settings;
use crate::sim::collision::{Contact, find_contact};
use crate::sim::state::RunState;
use crate::sim::tick::{TickInput, step};
use crate::tuning::Tuning;
use crate::ui::{Notice, UiPorts, UiRegion, UiText};

/// Largest frame delta fed into the accumulator
const MAX_FRAME_DELTA_MS: f64 = 100.0;
/// Tolerated float drift when comparing accumulated time to a step
const STEP_EPSILON_MS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    GameOver,
}

/// Turns display-frame timestamps into whole fixed simulation steps
#[derive(Debug, Clone)]
pub struct FrameTimer {
    step_ms: f64,
    max_substeps: u32,
    last: Option<f64>,
    accumulator: f64,
}

impl FrameTimer {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            step_ms: tuning.step_ms(),
            max_substeps: tuning.max_substeps,
            last: None,
            accumulator: 0.0,
        }
    }

    /// Forget the previous frame; the next frame counts as one step
    pub fn reset(&mut self) {
        self.last = None;
        self.accumulator = 0.0;
    }

    /// Steps to simulate for a frame at `timestamp_ms`
    pub fn advance(&mut self, timestamp_ms: f64) -> u32 {
        let Some(last) = self.last.replace(timestamp_ms) else {
            return 1;
        };
        self.accumulator += (timestamp_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS);

        let mut steps = 0;
        while self.accumulator + STEP_EPSILON_MS >= self.step_ms && steps < self.max_substeps {
            self.accumulator -= self.step_ms;
            steps += 1;
        }
        if steps == self.max_substeps {
            // Too far behind: drop the backlog instead of spiralling
            self.accumulator = 0.0;
        }
        steps
    }
}

/// Host capabilities the state machine is built with
pub struct Ports {
    pub scheduler: Box<dyn FrameScheduler>,
    pub ui: Box<dyn UiPorts>,
    pub surface: Box<dyn Surface>,
    pub transport: Box<dyn ScoreTransport>,
    pub storage: Box<dyn KeyValueStore>,
    pub clock: Box<dyn Clock>,
}

pub struct Game {
    tuning: Tuning,
    settings: Settings,
    phase: Phase,
    run: RunState,
    /// Seed for the next run
    seed: u64,
    adapter: InputAdapter,
    latch: ActivationLatch,
    timer: FrameTimer,
    pending_frame: Option<FrameHandle>,
    /// `clock.now_ms()` before which activation cannot leave GameOver
    cooldown_until: f64,
    idle_offset: f32,
    idle_direction: f32,
    ground_offset: f32,

    scheduler: Box<dyn FrameScheduler>,
    ui: Box<dyn UiPorts>,
    surface: Box<dyn Surface>,
    clock: Box<dyn Clock>,
    best: BestScoreStore,
    leaderboard: LeaderboardClient,
}

impl Game {
    pub fn new(tuning: Tuning, ports: Ports, seed: u64) -> Self {
        let settings = Settings::load(ports.storage.as_ref());
        let best = BestScoreStore::load(ports.storage);
        let leaderboard = LeaderboardClient::new(
            ports.transport,
            i64::from(tuning.leaderboard_limit),
            tuning.max_name_len,
        );

        Self {
            run: RunState::new(seed, &tuning),
            timer: FrameTimer::new(&tuning),
            settings,
            phase: Phase::Idle,
            seed,
            adapter: InputAdapter::default(),
            latch: ActivationLatch::default(),
            pending_frame: None,
            cooldown_until: 0.0,
            idle_offset: 0.0,
            idle_direction: 1.0,
            ground_offset: 0.0,
            scheduler: ports.scheduler,
            ui: ports.ui,
            surface: ports.surface,
            clock: ports.clock,
            best,
            leaderboard,
            tuning,
        }
    }

    /// Show the idle screen, fetch the leaderboard and start the loop
    pub fn boot(&mut self) {
        log::info!("Booting (best score {})", self.best.best().value);
        self.hide_game_over_ui();
        self.ui.show(UiRegion::Intro);
        self.prefill_name();
        self.leaderboard.refresh();
        self.render();
        self.ensure_frame();
    }

    // === Accessors ===

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn best_score(&self) -> u32 {
        self.best.best().value
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        self.leaderboard.entries()
    }

    pub fn activation_held(&self) -> bool {
        self.latch.sample()
    }

    /// Whether a frame callback is outstanding
    pub fn is_looping(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        settings.save(self.best.storage_mut());
        if !settings.idle_drift {
            self.idle_offset = 0.0;
        }
        self.settings = settings;
    }

    // === Input ===

    /// Route a host event. The return value tells the host whether the event
    /// belongs to overlay UI (let it through) or to the game (swallow it).
    pub fn handle_input(&mut self, input: &RawInput) -> Routed {
        let routed = self.adapter.route(input);
        if let Routed::Game(signal) = routed {
            self.on_signal(signal);
        }
        routed
    }

    pub fn on_signal(&mut self, signal: Signal) {
        match (self.phase, signal) {
            (_, Signal::Release) => self.latch.release(),
            (Phase::Idle, Signal::Activate) => {
                self.start_run();
                self.latch.press();
            }
            (Phase::Playing, Signal::Activate) => self.latch.press(),
            (Phase::GameOver, Signal::Activate) => {
                let now = self.clock.now_ms();
                if now < self.cooldown_until {
                    log::debug!(
                        "Activation ignored, cooldown has {:.0} ms left",
                        self.cooldown_until - now
                    );
                } else {
                    self.enter_idle();
                }
            }
        }
    }

    // === Frame loop ===

    /// Frame callback: apply network results, simulate, render, re-arm
    pub fn on_frame(&mut self, timestamp_ms: f64) {
        self.pending_frame = None;
        self.pump_network();

        let steps = self.timer.advance(timestamp_ms);
        match self.phase {
            Phase::Idle => {
                for _ in 0..steps {
                    self.idle_step();
                }
            }
            Phase::Playing => {
                // Input latched at the frame boundary is what every substep sees
                let input = TickInput {
                    activation_held: self.latch.sample(),
                };
                for _ in 0..steps {
                    let report = step(&mut self.run, input, &self.tuning);
                    self.scroll_ground(self.run.speed);
                    if report.scored > 0 {
                        log::debug!("Score {}", self.run.score);
                    }
                    if let Some(contact) = find_contact(&self.run, &self.tuning) {
                        self.enter_game_over(contact);
                        return;
                    }
                }
            }
            Phase::GameOver => {
                // Frozen; a stale callback only redraws
                self.render();
                return;
            }
        }

        self.render();
        self.ensure_frame();
    }

    fn idle_step(&mut self) {
        self.scroll_ground(self.tuning.base_speed);
        if self.settings.idle_drift {
            self.idle_offset += self.idle_direction * self.tuning.idle_drift_step;
            if self.idle_offset.abs() > self.tuning.idle_drift_amplitude {
                self.idle_direction = -self.idle_direction;
            }
        }
    }

    fn scroll_ground(&mut self, speed: f32) {
        let tile = ground_tile_width(&self.tuning);
        self.ground_offset -= speed;
        if self.ground_offset <= -tile {
            self.ground_offset += tile;
        }
    }

    /// Host went away (tab hidden): drop the pending frame and held input
    pub fn suspend(&mut self) {
        if self.pending_frame.is_some() {
            log::info!("Suspended while {:?}", self.phase);
        }
        self.stop_loop();
        self.latch.release();
    }

    /// Host is back: re-arm the loop unless the run is already over
    pub fn resume(&mut self) {
        if self.phase == Phase::GameOver || self.pending_frame.is_some() {
            return;
        }
        log::info!("Resumed while {:?}", self.phase);
        self.timer.reset();
        self.ensure_frame();
    }

    /// Draw the current state again, e.g. after the host resized the surface
    pub fn redraw(&mut self) {
        self.render();
    }

    fn render(&mut self) {
        let view = FrameView {
            phase: self.phase,
            run: &self.run,
            activation_held: self.latch.sample(),
            player_offset: if self.phase == Phase::Idle {
                self.idle_offset
            } else {
                0.0
            },
            ground_offset: self.ground_offset,
            leaderboard: self.leaderboard.entries(),
            best_score: self.best.best().value,
            show_hitboxes: self.settings.show_hitboxes,
        };
        render_frame(self.surface.as_mut(), &view, &self.tuning);
    }

    fn ensure_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
    }

    fn stop_loop(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    // === Transitions ===

    fn start_run(&mut self) {
        self.run = RunState::new(self.seed, &self.tuning);
        log::info!(
            "Run started (seed {}, speed {})",
            self.seed,
            self.run.speed
        );
        self.seed = self
            .seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        self.phase = Phase::Playing;
        self.idle_offset = 0.0;
        self.ui.hide(UiRegion::Intro);
        self.hide_game_over_ui();
        self.timer.reset();
        self.ensure_frame();
    }

    fn enter_game_over(&mut self, contact: Contact) {
        self.stop_loop();
        self.latch.release();
        self.phase = Phase::GameOver;

        let score = self.run.score;
        let new_record = self
            .best
            .record_run(score, format_timestamp(self.clock.epoch_ms()));
        let best = self.best.best().clone();
        log::info!(
            "Game over ({:?}): score {}, best {}{}",
            contact,
            score,
            best.value,
            if new_record { " (new record)" } else { "" }
        );

        self.ui.set_text(UiText::GameOverScore, &score.to_string());
        self.ui
            .set_text(UiText::GameOverHighScore, &best.value.to_string());
        self.ui.set_text(
            UiText::GameOverHighScoreDate,
            best.achieved_at.as_deref().unwrap_or_default(),
        );
        self.ui.show(UiRegion::SaveScorePanel);
        if score > 0 {
            self.ui.show(UiRegion::SaveScoreButton);
        } else {
            self.ui.hide(UiRegion::SaveScoreButton);
        }
        self.ui.hide(UiRegion::NameInput);
        self.ui.show(UiRegion::PlayAgain);
        self.ui.show(UiRegion::Restart);

        self.cooldown_until = self.clock.now_ms() + self.tuning.restart_cooldown_ms;
        self.render();
    }

    fn enter_idle(&mut self) {
        log::info!("Back to idle");
        self.phase = Phase::Idle;
        self.latch.release();
        self.run = RunState::new(self.seed, &self.tuning);
        self.hide_game_over_ui();
        self.ui.show(UiRegion::Intro);
        self.leaderboard.refresh();
        self.timer.reset();
        self.render();
        self.ensure_frame();
    }

    fn hide_game_over_ui(&mut self) {
        for region in [
            UiRegion::SaveScorePanel,
            UiRegion::SaveScoreButton,
            UiRegion::NameInput,
            UiRegion::PlayAgain,
            UiRegion::Restart,
        ] {
            self.ui.hide(region);
        }
    }

    fn prefill_name(&mut self) {
        let name = self.best.last_player_name().unwrap_or_default();
        self.ui.set_text(UiText::PlayerName, &name);
    }

    // === Overlay actions ===

    /// Play-again / restart buttons: back to idle without waiting out the
    /// cooldown
    pub fn play_again(&mut self) {
        if self.phase == Phase::GameOver {
            self.enter_idle();
        }
    }

    /// "Save Score" pressed: swap the button for the name input
    pub fn begin_save(&mut self) {
        if self.phase != Phase::GameOver || self.run.score == 0 {
            return;
        }
        self.ui.hide(UiRegion::SaveScoreButton);
        self.ui.show(UiRegion::NameInput);
        self.prefill_name();
    }

    /// Submit the finished run under `name`. On success the game returns to
    /// Idle at once; the request completes in the background.
    pub fn submit_score(&mut self, name: &str) -> Result<(), LeaderboardError> {
        if self.phase != Phase::GameOver || self.run.score == 0 {
            return Err(ValidationError::NothingToSubmit.into());
        }
        match self.leaderboard.submit(name, self.run.score) {
            Ok(submission) => {
                self.best.remember_player_name(&submission.player);
                self.enter_idle();
                Ok(())
            }
            Err(e) => {
                self.ui.notify(Notice::error(e.to_string(), self.tuning.notice_ms));
                Err(e)
            }
        }
    }

    pub fn has_failed_submission(&self) -> bool {
        self.leaderboard.failed_submission().is_some()
    }

    pub fn retry_submission(&mut self) -> bool {
        self.leaderboard.retry_failed()
    }

    pub fn discard_submission(&mut self) {
        self.leaderboard.discard_failed();
    }

    /// Apply finished leaderboard requests. Runs at the start of every frame;
    /// hosts call it directly while the loop is stopped.
    pub fn pump_network(&mut self) {
        for update in self.leaderboard.poll() {
            match update {
                ClientUpdate::Refreshed { .. } | ClientUpdate::RefreshFailed(_) => {}
                ClientUpdate::Submitted(submission) => {
                    self.ui.notify(Notice::info(
                        format!("Score {} saved for {}", submission.score, submission.player),
                        self.tuning.notice_ms,
                    ));
                    self.leaderboard.refresh();
                }
                ClientUpdate::SubmitFailed { error, .. } => {
                    self.ui.notify(Notice::error(
                        format!("Could not save score ({error}). Retry or discard."),
                        self.tuning.notice_ms,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::highscores::service::{LocalTransport, MemoryScoreService};
    use crate::platform::input::RawKind;
    use crate::platform::scheduler::ManualScheduler;
    use crate::platform::storage::MemoryStorage;
    use crate::platform::time::ManualClock;
    use crate::renderer::RecordingSurface;
    use crate::ui::{NoticeLevel, RecordingUi};

    struct Harness {
        game: Game,
        scheduler: ManualScheduler,
        clock: ManualClock,
        storage: MemoryStorage,
        ui: RecordingUi,
        surface: RecordingSurface,
        transport: LocalTransport,
        now: f64,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_storage(MemoryStorage::new())
        }

        fn with_storage(storage: MemoryStorage) -> Self {
            let tuning = Tuning::default();
            let scheduler = ManualScheduler::new();
            let clock = ManualClock::new(1_714_564_800_000.0);
            let ui = RecordingUi::new();
            let surface = RecordingSurface::new(tuning.surface());
            let service = MemoryScoreService::new(Box::new(clock.clone()));
            let transport = LocalTransport::new(Rc::new(RefCell::new(service)));
            let ports = Ports {
                scheduler: Box::new(scheduler.clone()),
                ui: Box::new(ui.clone()),
                surface: Box::new(surface.clone()),
                transport: Box::new(transport.clone()),
                storage: Box::new(storage.clone()),
                clock: Box::new(clock.clone()),
            };
            let mut game = Game::new(tuning, ports, 42);
            game.boot();
            Self {
                game,
                scheduler,
                clock,
                storage,
                ui,
                surface,
                transport,
                now: 0.0,
            }
        }

        /// Fire the outstanding frame one step later. False if none was
        /// requested.
        fn frame(&mut self) -> bool {
            self.now += self.game.tuning().step_ms();
            self.clock.set(self.now);
            match self.scheduler.take_next() {
                Some(_) => {
                    self.game.on_frame(self.now);
                    true
                }
                None => false,
            }
        }

        fn key(&mut self, down: bool) -> Routed {
            let kind = if down {
                RawKind::KeyDown("Space".into())
            } else {
                RawKind::KeyUp("Space".into())
            };
            self.game.handle_input(&RawInput::new(kind))
        }

        fn tap(&mut self) {
            self.key(true);
            self.key(false);
        }

        /// Start a run and fall to the floor without touching anything
        fn crash(&mut self, score: u32) {
            self.tap();
            let mut frames = 0;
            while self.game.phase() == Phase::Playing {
                self.game.run.score = score;
                assert!(self.frame(), "loop stopped while playing");
                frames += 1;
                assert!(frames < 500);
            }
        }
    }

    #[test]
    fn test_frame_timer() {
        let tuning = Tuning::default();
        let mut timer = FrameTimer::new(&tuning);
        let step = tuning.step_ms();

        assert_eq!(timer.advance(1_000.0), 1);
        assert_eq!(timer.advance(1_000.0 + step), 1);
        // 120 Hz display: every other frame steps
        assert_eq!(timer.advance(1_000.0 + step * 1.5), 0);
        assert_eq!(timer.advance(1_000.0 + step * 2.0), 1);
        // Long stall is clamped and capped
        assert_eq!(timer.advance(10_000.0), tuning.max_substeps);
        assert_eq!(timer.advance(10_000.0 + step), 1);

        timer.reset();
        assert_eq!(timer.advance(50_000.0), 1);
    }

    #[test]
    fn test_boot_shows_idle_and_fetches() {
        let mut h = Harness::new();
        assert_eq!(h.game.phase(), Phase::Idle);
        assert!(h.ui.is_visible(UiRegion::Intro));
        assert!(!h.ui.is_visible(UiRegion::SaveScorePanel));
        assert_eq!(h.transport.request_count(), 1);
        assert_eq!(h.scheduler.pending().len(), 1);

        // Idle keeps looping and drifting
        let start_y = h.game.run().player.y;
        for _ in 0..30 {
            assert!(h.frame());
        }
        assert_eq!(h.game.phase(), Phase::Idle);
        assert_eq!(h.game.run().player.y, start_y);
        assert!(h.game.idle_offset != 0.0);
        assert_eq!(h.scheduler.pending().len(), 1);
    }

    #[test]
    fn test_end_to_end_run() {
        let mut h = Harness::with_storage(MemoryStorage::with_items([("highScore", "1")]));
        h.frame();

        // Start the run with a tap, then let go until frame 10
        h.tap();
        assert_eq!(h.game.phase(), Phase::Playing);
        assert!(!h.ui.is_visible(UiRegion::Intro));

        let tuning = h.game.tuning().clone();
        let mut ys = vec![h.game.run().player.y];
        for frame in 1..=100 {
            if frame == 10 {
                h.key(true);
            }
            if frame == 13 {
                h.key(false);
            }
            if h.game.phase() != Phase::Playing {
                break;
            }
            assert!(h.frame());
            ys.push(h.game.run().player.y);
            if frame == 20 {
                // As if two pairs had been cleared
                h.game.run.score = 2;
            }
        }

        // Falls under gravity, rises while held, falls again
        for f in 1..10 {
            let expected_velocity = tuning.gravity * f as f32;
            assert!((ys[f] - ys[f - 1] - expected_velocity).abs() < 1e-3);
        }
        for f in 10..=12 {
            assert!((ys[f] - ys[f - 1] - tuning.lift).abs() < 1e-3);
        }
        // Still coasting upward right after release, then gravity wins
        assert!(ys[13] < ys[12]);
        assert!(ys[30] > ys[29]);

        // Hit the ground strip well before frame 100
        assert_eq!(h.game.phase(), Phase::GameOver);
        assert!(ys.len() < 100);
        let lower = h.game.run().player.lower_edge(&tuning);
        assert!(lower >= tuning.floor_line());

        // Best score persisted, loop stopped
        assert_eq!(h.game.best_score(), 2);
        assert_eq!(h.storage.get("highScore").unwrap().as_deref(), Some("2"));
        assert!(h.storage.get("highScoreDate").unwrap().is_some());
        assert!(!h.game.is_looping());
        assert!(!h.scheduler.has_pending());
        assert!(!h.frame());

        assert!(h.ui.is_visible(UiRegion::SaveScorePanel));
        assert!(h.ui.is_visible(UiRegion::SaveScoreButton));
        assert_eq!(h.ui.text(UiText::GameOverScore).as_deref(), Some("2"));
        assert!(h.surface.texts().contains(&"Score: 2".to_string()));
    }

    #[test]
    fn test_lower_score_keeps_best() {
        let mut h = Harness::with_storage(MemoryStorage::with_items([
            ("highScore", "9"),
            ("highScoreDate", "2024-01-01 00:00:00"),
        ]));
        h.crash(3);
        assert_eq!(h.game.best_score(), 9);
        assert_eq!(h.storage.get("highScore").unwrap().as_deref(), Some("9"));
        assert_eq!(
            h.ui.text(UiText::GameOverHighScoreDate).as_deref(),
            Some("2024-01-01 00:00:00")
        );
    }

    #[test]
    fn test_restart_cooldown() {
        let mut h = Harness::new();
        h.crash(0);
        assert_eq!(h.game.phase(), Phase::GameOver);
        assert!(!h.game.activation_held());

        h.clock.advance(500.0);
        h.tap();
        assert_eq!(h.game.phase(), Phase::GameOver);

        h.clock.advance(500.0);
        h.tap();
        assert_eq!(h.game.phase(), Phase::Idle);
        assert!(h.game.is_looping());
        assert_eq!(h.game.run().score, 0);
        assert!(h.game.run().obstacles.is_empty());

        // Next activation starts a fresh run
        h.frame();
        h.tap();
        assert_eq!(h.game.phase(), Phase::Playing);
        assert_eq!(h.game.run().speed, h.game.tuning().base_speed);
    }

    #[test]
    fn test_suspend_cancels_pending_frame() {
        let mut h = Harness::new();
        assert!(h.game.is_looping());
        h.game.suspend();
        assert_eq!(h.scheduler.cancelled_count(), 1);
        assert!(!h.game.is_looping());
        assert!(!h.frame());

        h.game.resume();
        assert!(h.frame());
        assert_eq!(h.game.phase(), Phase::Idle);

        // Hiding mid-run releases the held button and freezes the run
        h.key(true);
        assert!(h.frame());
        h.game.suspend();
        assert_eq!(h.scheduler.cancelled_count(), 2);
        assert!(!h.game.activation_held());
        let y = h.game.run().player.y;
        assert!(!h.frame());
        assert_eq!(h.game.run().player.y, y);
        h.game.resume();
        assert!(h.frame());
        assert_eq!(h.game.phase(), Phase::Playing);
    }

    #[test]
    fn test_resume_after_game_over_stays_stopped() {
        let mut h = Harness::new();
        h.crash(0);
        assert_eq!(h.game.phase(), Phase::GameOver);
        h.game.suspend();
        assert_eq!(h.scheduler.cancelled_count(), 0);
        h.game.resume();
        assert!(!h.game.is_looping());
    }

    #[test]
    fn test_single_outstanding_frame() {
        let mut h = Harness::new();
        h.tap();
        h.tap();
        for _ in 0..20 {
            assert!(h.scheduler.pending().len() <= 1);
            h.frame();
        }
        assert!(h.scheduler.pending().len() <= 1);
    }

    #[test]
    fn test_ui_targets_do_not_start_a_run() {
        let mut h = Harness::new();
        let routed = h.game.handle_input(&RawInput::with_target(
            RawKind::PointerDown,
            ["playAgainBtn", "saveScoreContainer", "body"],
        ));
        assert_eq!(routed, Routed::Ui(UiRegion::PlayAgain));
        assert_eq!(h.game.phase(), Phase::Idle);

        // Typing a space into the name field is not a flap either
        let routed = h.game.handle_input(&RawInput::with_target(
            RawKind::KeyDown("Space".into()),
            ["playerName", "nameInputContainer", "saveScoreContainer"],
        ));
        assert!(matches!(routed, Routed::Ui(_)));
        assert_eq!(h.game.phase(), Phase::Idle);

        let routed = h
            .game
            .handle_input(&RawInput::with_target(RawKind::TouchStart, ["gameCanvas"]));
        assert_eq!(routed, Routed::Game(Signal::Activate));
        assert_eq!(h.game.phase(), Phase::Playing);
    }

    #[test]
    fn test_submit_round_trip() {
        let mut h = Harness::new();
        h.crash(7);
        let before = h.transport.request_count();

        h.game.begin_save();
        assert!(h.ui.is_visible(UiRegion::NameInput));
        assert!(!h.ui.is_visible(UiRegion::SaveScoreButton));

        let err = h.game.submit_score("Abcdefghijk").unwrap_err();
        assert!(matches!(
            err,
            LeaderboardError::Validation(ValidationError::NameTooLong { .. })
        ));
        assert_eq!(h.transport.request_count(), before);
        assert_eq!(h.game.phase(), Phase::GameOver);
        assert_eq!(h.ui.last_notice().map(|n| n.level), Some(NoticeLevel::Error));

        h.game.submit_score(" Ada ").unwrap();
        assert_eq!(h.game.phase(), Phase::Idle);
        assert_eq!(h.storage.get("playerName").unwrap().as_deref(), Some("Ada"));

        // Completion arrives on the next frames, followed by a refresh
        h.frame();
        h.frame();
        assert_eq!(h.ui.last_notice().map(|n| n.level), Some(NoticeLevel::Info));
        let ranked: Vec<(String, u32)> = h
            .game
            .leaderboard()
            .iter()
            .map(|e| (e.player.clone(), e.score))
            .collect();
        assert_eq!(ranked, vec![("Ada".to_string(), 7)]);
        assert!(h.surface.texts().contains(&"1. Ada: 7".to_string()));
    }

    #[test]
    fn test_zero_score_cannot_be_saved() {
        let mut h = Harness::new();
        h.crash(0);
        assert!(h.ui.is_visible(UiRegion::SaveScorePanel));
        assert!(!h.ui.is_visible(UiRegion::SaveScoreButton));
        assert_eq!(
            h.game.submit_score("Ada"),
            Err(LeaderboardError::Validation(ValidationError::NothingToSubmit))
        );
    }

    #[test]
    fn test_failed_submission_retry() {
        let mut h = Harness::new();
        h.crash(4);
        h.transport
            .service()
            .borrow_mut()
            .set_outage(Some("database down"));

        h.game.submit_score("Bo").unwrap();
        h.frame();
        assert!(h.game.has_failed_submission());
        assert_eq!(h.ui.last_notice().map(|n| n.level), Some(NoticeLevel::Error));

        h.transport.service().borrow_mut().set_outage(None);
        assert!(h.game.retry_submission());
        h.frame();
        h.frame();
        assert!(!h.game.has_failed_submission());
        assert_eq!(h.game.leaderboard().len(), 1);

        // Discarding when nothing failed is harmless
        h.game.discard_submission();
        assert!(!h.game.retry_submission());
    }

    #[test]
    fn test_play_again_skips_cooldown() {
        let mut h = Harness::new();
        h.crash(1);
        h.game.play_again();
        assert_eq!(h.game.phase(), Phase::Idle);
        assert!(!h.ui.is_visible(UiRegion::PlayAgain));
        assert!(h.ui.is_visible(UiRegion::Intro));
    }

    #[test]
    fn test_settings_persist() {
        let mut h = Harness::new();
        h.game.set_settings(Settings {
            show_hitboxes: true,
            idle_drift: false,
        });
        assert!(h.storage.get("el_vis_settings").unwrap().is_some());

        h.frame();
        h.tap();
        h.frame();
        assert!(h.surface.commands().iter().any(|c| matches!(
            c,
            crate::renderer::DrawCmd::StrokeCircle { .. }
        )));
    }

    #[test]
    fn test_runs_use_different_seeds() {
        let mut h = Harness::new();
        h.crash(0);
        let first = h.game.run().rng_state.seed;
        h.game.play_again();
        h.frame();
        h.tap();
        assert_ne!(h.game.run().rng_state.seed, first);
    }
}
