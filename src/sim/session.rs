//! Session - Race lifecycle and tick loop
//!
//! Manages the session state, handles tick updates, and provides the
//! interface the presentation layer drives. The session clocks itself
//! with `Instant` but a host with its own clock can step explicitly.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::sim::config::{Formation, TrackPreset, Tuning};
use crate::sim::race::{FrameInput, Race, RacePhase, RaceSnapshot};
use crate::sim::roster::{self, DriverRef};

/// Longest dt one tick is allowed to integrate; stalls are truncated
/// rather than teleporting the pack.
const MAX_FRAME_DT: f32 = 0.1;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Loading,
    Ready,
    Racing,
    Results,
}

/// Session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub car_count: u32,
    pub game_state: GameState,
}

/// Main session driver.
pub struct Session {
    /// Current session state
    state: GameState,
    /// Active race (if any)
    race: Option<Race>,
    /// Tuning handed to every race this session starts
    tuning: Tuning,
    /// Loaded driver roster
    roster: Vec<DriverRef>,
    /// Index of the controlled car's driver in the roster
    selected_driver: usize,
    /// Available track presets
    presets: Vec<TrackPreset>,
    /// Target tick rate (ticks per second)
    tick_rate: f32,
    /// Last tick timestamp
    last_tick: Instant,
    /// Accumulated tick time for averaging
    tick_times: Vec<f32>,
    /// Whether the session is running
    running: bool,
}

impl Session {
    /// Create a new session with production tuning and the built-in
    /// track catalog.
    pub fn new() -> Self {
        Self::with_tuning(Tuning::default())
    }

    /// Create a session with custom tuning.
    pub fn with_tuning(tuning: Tuning) -> Self {
        Self {
            state: GameState::Idle,
            race: None,
            tuning,
            roster: Vec::new(),
            selected_driver: 0,
            presets: TrackPreset::catalog(),
            tick_rate: 60.0,
            last_tick: Instant::now(),
            tick_times: Vec::with_capacity(60),
            running: false,
        }
    }

    /// Parse and install a roster manifest. A malformed manifest leaves
    /// the session with an empty roster; races still run with the
    /// synthetic default driver.
    pub fn load_roster_manifest(&mut self, json: &str) {
        self.set_roster(roster::roster_from_manifest(json));
    }

    pub fn set_roster(&mut self, roster: Vec<DriverRef>) {
        self.roster = roster;
        self.selected_driver = roster::pick_default_driver(&self.roster);
        log::info!("roster loaded with {} drivers", self.roster.len());
    }

    pub fn roster(&self) -> &[DriverRef] {
        &self.roster
    }

    pub fn presets(&self) -> &[TrackPreset] {
        &self.presets
    }

    /// Select the controlled car's driver. Out-of-range indices are
    /// ignored.
    pub fn select_driver(&mut self, index: usize) {
        if index < self.roster.len() {
            self.selected_driver = index;
        }
    }

    /// Initialize a new race on one of the session presets.
    pub fn init_race(&mut self, preset_index: usize, formation: Formation) {
        self.state = GameState::Loading;

        let preset = self
            .presets
            .get(preset_index)
            .cloned()
            .unwrap_or_else(|| self.presets[0].clone());
        let player_driver = self
            .roster
            .get(self.selected_driver)
            .cloned()
            .unwrap_or_else(roster::default_driver);

        let race = Race::new(
            preset.clone(),
            self.tuning.clone(),
            self.roster.clone(),
            player_driver,
            formation,
        );
        log::info!(
            "race initialized on {} with {} cars",
            preset.name,
            race.cars.len()
        );
        self.race = Some(race);
        self.state = GameState::Ready;
    }

    /// Start the rolling start.
    pub fn start_race(&mut self) {
        if self.race.is_some() {
            self.state = GameState::Racing;
            self.running = true;
            self.last_tick = Instant::now();
            log::info!("race started");
        }
    }

    /// Perform a single self-clocked simulation tick.
    pub fn tick(&mut self, input: FrameInput) -> Option<RaceSnapshot> {
        if !self.running {
            return self.race.as_ref().map(|r| r.snapshot());
        }
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.step(delta.min(MAX_FRAME_DT), input)
    }

    /// Advance the race by an explicit dt.
    pub fn step(&mut self, dt: f32, input: FrameInput) -> Option<RaceSnapshot> {
        if !self.running {
            return self.race.as_ref().map(|r| r.snapshot());
        }

        let tick_start = Instant::now();
        if let Some(race) = &mut self.race {
            race.update(dt, input);
            if race.phase == RacePhase::Finished {
                self.state = GameState::Results;
                self.running = false;
            }
        }

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > 60 {
            self.tick_times.remove(0);
        }

        self.race.as_ref().map(|r| r.snapshot())
    }

    /// Get the current race snapshot without advancing the simulation.
    pub fn get_snapshot(&self) -> Option<RaceSnapshot> {
        self.race.as_ref().map(|r| r.snapshot())
    }

    pub fn race(&self) -> Option<&Race> {
        self.race.as_ref()
    }

    /// Get session statistics.
    pub fn get_stats(&self) -> SessionStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };
        SessionStats {
            tick_rate: self.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            car_count: self
                .race
                .as_ref()
                .map(|r| r.cars.len() as u32)
                .unwrap_or(0),
            game_state: self.state,
        }
    }

    pub fn get_state(&self) -> GameState {
        self.state
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.state = GameState::Idle;
        self.race = None;
        self.running = false;
        self.tick_times.clear();
        log::info!("session reset");
    }

    /// Pause the simulation.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume the simulation.
    pub fn resume(&mut self) {
        if self.state == GameState::Racing {
            self.running = true;
            self.last_tick = Instant::now();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe session wrapper for hosts that drive the simulation from
/// another thread.
pub type SharedSession = Arc<RwLock<Session>>;

/// Create a new shared session.
pub fn create_shared_session() -> SharedSession {
    Arc::new(RwLock::new(Session::new()))
}
