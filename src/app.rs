//! Session lifecycle host
//!
//! Owns at most one running game, feeds it fixed simulation steps from real
//! frame times, and turns its events into listener notifications. Browser
//! glue wraps this in `Rc<RefCell<_>>`; everything here runs natively too.

use glam::Vec2;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::settings::Settings;
use crate::sim::{ArcadeGame, GameEvent, GameMode, new_session};
use crate::tuning::Tuning;

/// Receives state changes worth showing in the UI
pub trait HostListener {
    fn score_changed(&mut self, _score: u64) {}
    fn game_over(&mut self, _score: u64) {}
    fn next_level_changed(&mut self, _level: usize) {}
    fn lives_changed(&mut self, _lives: u8) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl HostListener for NullListener {}

/// Mount/unmount/restart plus the fixed-step loop
pub struct GameHost {
    tuning: Tuning,
    settings: Settings,
    session: Option<Box<dyn ArcadeGame>>,
    listener: Box<dyn HostListener>,
    accumulator: f32,
    last_frame_ms: Option<f64>,
    /// Bumped on every mount and unmount; stale frame callbacks compare against it
    generation: u64,
}

impl GameHost {
    pub fn new(tuning: Tuning, settings: Settings, listener: Box<dyn HostListener>) -> Self {
        Self {
            tuning,
            settings,
            session: None,
            listener,
            accumulator: 0.0,
            last_frame_ms: None,
            generation: 0,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn HostListener>) {
        self.listener = listener;
    }

    pub fn listener_mut(&mut self) -> &mut dyn HostListener {
        self.listener.as_mut()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a loop started for `generation` may still drive this host
    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_mounted() && self.generation == generation
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&dyn ArcadeGame> {
        self.session.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the preferences, apply them to the running session and persist them
    pub fn set_settings(&mut self, settings: Settings) {
        if let Some(session) = self.session.as_mut() {
            session.apply_settings(&settings);
        }
        settings.save();
        self.settings = settings;
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Start a new session, replacing any running one
    ///
    /// Returns the generation the caller's frame loop must present.
    pub fn mount(&mut self, mode: GameMode, width: f32, height: f32, seed: u64, now_ms: f64) -> u64 {
        if self.is_mounted() {
            self.unmount();
        }
        self.generation += 1;

        let mut session = new_session(mode, &self.tuning, width, height, seed);
        session.apply_settings(&self.settings);
        let events = session.restart(now_ms);
        self.session = Some(session);
        self.accumulator = 0.0;
        self.last_frame_ms = Some(now_ms);

        log::info!("Mounted {} game (generation {})", mode, self.generation);
        self.dispatch(&events);
        self.announce_status();
        self.generation
    }

    /// Tear down the session. Safe to call at any time, any number of times.
    pub fn unmount(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.clear();
        self.generation += 1;
        self.accumulator = 0.0;
        self.last_frame_ms = None;
        log::info!("Unmounted {} game", session.mode());
    }

    /// Restart the running session in place
    pub fn restart(&mut self, now_ms: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let events = session.restart(now_ms);
        self.accumulator = 0.0;
        self.dispatch(&events);
        self.announce_status();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if let Some(session) = self.session.as_mut() {
            session.resize(width, height);
        }
    }

    pub fn pointer_down(&mut self, pos: Vec2, now_ms: f64) {
        if let Some(session) = self.session.as_mut() {
            let events = session.pointer_down(pos, now_ms);
            self.dispatch(&events);
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2, now_ms: f64) {
        if let Some(session) = self.session.as_mut() {
            let events = session.pointer_move(pos, now_ms);
            self.dispatch(&events);
        }
    }

    pub fn pointer_up(&mut self, pos: Vec2, now_ms: f64) {
        if let Some(session) = self.session.as_mut() {
            let events = session.pointer_up(pos, now_ms);
            self.dispatch(&events);
        }
    }

    /// Advance by the real time since the previous frame
    ///
    /// Frames from another generation do nothing. Returns the number of
    /// fixed steps taken.
    pub fn frame(&mut self, now_ms: f64, generation: u64) -> u32 {
        if generation != self.generation {
            return 0;
        }
        let Some(session) = self.session.as_mut() else {
            return 0;
        };

        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_frame_ms = Some(now_ms);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            events.extend(session.step(now_ms, SIM_DT));
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop whatever backlog the cap left behind instead of catching up later
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        self.dispatch(&events);
        substeps
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::ScoreChanged { score } => self.listener.score_changed(score),
                GameEvent::GameOver { score } => self.listener.game_over(score),
                GameEvent::Spawned { next_level, .. } => {
                    self.listener.next_level_changed(next_level)
                }
                GameEvent::FruitMissed { lives_left, .. } => {
                    self.listener.lives_changed(lives_left)
                }
                _ => {}
            }
        }
    }

    /// Push the full status after a mount or restart
    fn announce_status(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let (next, lives) = (session.next_level(), session.lives());
        if let Some(level) = next {
            self.listener.next_level_changed(level);
        }
        if let Some(lives) = lives {
            self.listener.lives_changed(lives);
        }
    }
}

impl Drop for GameHost {
    fn drop(&mut self) {
        self.unmount();
    }
}
