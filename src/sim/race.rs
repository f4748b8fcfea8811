//! Race - Per-frame orchestration and the rolling start
//!
//! Owns the AI field and the controlled car's speed/lane state, and runs
//! the frame in a fixed order: lane resolution, drafting, controlled-car
//! integration, collision resolution, AI integration with recycling,
//! then lap and pack bookkeeping for the outgoing snapshot.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::sim::collision;
use crate::sim::config::{Formation, TrackPreset, Tuning};
use crate::sim::drafting;
use crate::sim::lanes::{self, LaneIntent};
use crate::sim::pack::{self, PackStats};
use crate::sim::roster::DriverRef;
use crate::sim::track::LaneLayout;
use crate::sim::vehicle::{move_toward, Car, CarSnapshot};

/// Race phase. The rolling start is timer-driven and one-way; `Finished`
/// keeps simulating so the pack coasts on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    RollingStart,
    Racing,
    Finished,
}

/// Controlled-car input for one frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FrameInput {
    pub lane: LaneIntent,
    pub brake: bool,
}

/// Complete race state.
pub struct Race {
    pub preset: TrackPreset,
    pub tuning: Tuning,
    pub phase: RacePhase,
    /// The AI field; insertion order carries no meaning
    pub cars: Vec<Car>,
    /// Spawn pool, never empty
    pub roster: Vec<DriverRef>,
    pub player_driver: DriverRef,
    pub layout: LaneLayout,

    /// Seconds left with controls locked
    pub rolling_timer: f32,
    pub player_lane_target: usize,
    /// Continuous lane value easing toward the target
    pub player_lane_value: f32,
    pub lane_cooldown: f32,
    pub player_speed_mph: f32,
    /// Distance into the current lap, simulation units
    pub lap_progress_distance: f32,
    pub current_lap: u32,

    /// Previous frame's draft intensity, feeding the target speed
    pub draft_bonus: f32,
    /// Previous frame's contact boost, feeding the target speed
    pub contact_boost: f32,
    pub draft_gap: Option<f32>,
    pub stats: PackStats,

    rng: StdRng,
}

impl Race {
    /// Build a race with OS-seeded randomness.
    pub fn new(
        preset: TrackPreset,
        tuning: Tuning,
        roster: Vec<DriverRef>,
        player_driver: DriverRef,
        formation: Formation,
    ) -> Self {
        Self::with_rng(
            preset,
            tuning,
            roster,
            player_driver,
            formation,
            StdRng::from_entropy(),
        )
    }

    /// Build a race with injected randomness, for tests that need exact
    /// outcomes.
    pub fn with_rng(
        preset: TrackPreset,
        tuning: Tuning,
        roster: Vec<DriverRef>,
        player_driver: DriverRef,
        formation: Formation,
        mut rng: StdRng,
    ) -> Self {
        let roster = pack::spawn_pool(&roster);
        let player_lane = preset.middle_lane();
        let cars = match formation {
            Formation::Grid => pack::spawn_grid(&preset, &roster, &tuning, &mut rng),
            Formation::TwoWide => {
                pack::spawn_two_wide(&preset, &roster, &tuning, player_lane, &mut rng)
            }
        };
        let layout = LaneLayout::new(&preset);
        let lane_count = preset.lane_count.max(1);
        let stats = pack::gather_stats(&cars, lane_count, tuning.pack.density_range);
        Self {
            rolling_timer: tuning.rolling.duration,
            phase: RacePhase::RollingStart,
            player_lane_target: player_lane,
            player_lane_value: player_lane as f32,
            lane_cooldown: 0.0,
            player_speed_mph: 0.0,
            lap_progress_distance: 0.0,
            current_lap: 1,
            draft_bonus: 0.0,
            contact_boost: 0.0,
            draft_gap: None,
            stats,
            preset,
            tuning,
            cars,
            roster,
            player_driver,
            layout,
            rng,
        }
    }

    pub fn controls_locked(&self) -> bool {
        self.phase == RacePhase::RollingStart
    }

    /// Integer lane the controlled car currently occupies.
    pub fn player_lane_index(&self) -> usize {
        let max_lane = (self.preset.lane_count.max(1) - 1) as f32;
        self.player_lane_value.clamp(0.0, max_lane).round() as usize
    }

    pub fn lap_progress(&self) -> f32 {
        if self.tuning.lap_distance > 0.0 {
            self.lap_progress_distance / self.tuning.lap_distance
        } else {
            0.0
        }
    }

    /// Cornering penalty: two peaks per lap, shaped by a squared sine.
    fn turn_penalty(&self, lap_progress: f32) -> f32 {
        let phase = lap_progress.rem_euclid(1.0);
        self.tuning.controlled.turn_penalty_max
            * (std::f32::consts::PI * phase * 2.0).sin().powi(2)
    }

    /// Target speed for the controlled car this frame, in MPH.
    fn player_target_mph(&self, locked: bool, brake: bool, turn_penalty: f32) -> f32 {
        let rolling = &self.tuning.rolling;
        let controlled = &self.tuning.controlled;
        if locked {
            let ramp = if rolling.duration > 0.0 {
                (1.0 - self.rolling_timer / rolling.duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            rolling.min_mph + ramp * (rolling.max_mph - rolling.min_mph)
        } else {
            let mut target = controlled.base_mph
                + self.draft_bonus * controlled.draft_bonus_mph
                + self.contact_boost * controlled.contact_bonus_factor
                - turn_penalty;
            if brake {
                target = controlled.brake_mph;
            }
            target.clamp(controlled.brake_mph, controlled.base_mph + controlled.headroom_mph)
        }
    }

    /// Advance the whole simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32, input: FrameInput) {
        let lane_count = self.preset.lane_count.max(1);
        let locked = self.controls_locked();
        if locked {
            self.rolling_timer = (self.rolling_timer - dt).max(0.0);
        }

        // lane resolution: the controlled car first, then the field
        self.lane_cooldown = (self.lane_cooldown - dt).max(0.0);
        if locked {
            self.player_lane_target = self.preset.middle_lane();
        } else if self.lane_cooldown <= 0.0 {
            if let Some(target) = lanes::player_lane_request(
                &self.cars,
                lane_count,
                self.player_lane_target,
                input.lane,
                self.tuning.controlled.lane_safety_distance,
            ) {
                self.player_lane_target = target;
                self.lane_cooldown = self.tuning.controlled.lane_cooldown;
            }
        }
        self.player_lane_value = move_toward(
            self.player_lane_value,
            self.player_lane_target as f32,
            dt * self.tuning.controlled.lane_ease_rate,
        );
        let player_lane = self.player_lane_index();

        if !locked {
            lanes::attempt_ai_lane_changes(
                &mut self.cars,
                lane_count,
                &self.tuning.ai,
                &mut self.rng,
            );
        }

        // drafting boosts the field now; the controlled car's own bonus
        // uses last frame's readings and this contact lands next frame
        let contact = drafting::apply_drafting(&mut self.cars, player_lane, &self.tuning.draft);

        let turn_penalty = if locked {
            0.0
        } else {
            self.turn_penalty(self.lap_progress())
        };
        let target_mph = self.player_target_mph(locked, !locked && input.brake, turn_penalty);
        self.player_speed_mph = move_toward(
            self.player_speed_mph,
            target_mph,
            self.tuning.controlled.accel_mph * dt,
        );
        self.contact_boost = contact;

        if !locked {
            let reference_speed = self.player_speed_mph * self.tuning.speed_scale;
            let outcome = collision::resolve(
                &mut self.cars,
                player_lane,
                reference_speed,
                &self.tuning,
                &mut self.rng,
            );
            if outcome.player_penalty > 0.0 {
                self.player_speed_mph = (self.player_speed_mph
                    - outcome.player_penalty / self.tuning.speed_scale)
                    .max(0.0);
            }
        }

        // AI integration; exits are collected first and applied after so
        // every car is evaluated exactly once per frame
        let reference_speed = self.player_speed_mph * self.tuning.speed_scale;
        let mut exited = Vec::new();
        for (idx, car) in self.cars.iter_mut().enumerate() {
            if car.update(dt, reference_speed, locked, &self.tuning) {
                exited.push(idx);
            }
        }
        let exit_count = exited.len();
        for idx in exited.into_iter().rev() {
            self.cars.swap_remove(idx);
        }
        for _ in 0..exit_count {
            let fresh = pack::recycle_car(&self.preset, &self.roster, &self.tuning, &mut self.rng);
            self.cars.push(fresh);
        }

        // lap accounting
        self.lap_progress_distance += reference_speed * dt;
        if self.tuning.lap_distance > 0.0 && self.lap_progress_distance >= self.tuning.lap_distance
        {
            self.lap_progress_distance -= self.tuning.lap_distance;
            self.current_lap = (self.current_lap + 1).min(self.preset.laps);
        }

        // measurements for the snapshot and for next frame's target
        let reading = drafting::draft_reading(&self.cars, player_lane, &self.tuning.draft);
        self.draft_bonus = reading.intensity;
        self.draft_gap = reading.nearest_gap;
        self.stats = pack::gather_stats(&self.cars, lane_count, self.tuning.pack.density_range);

        // phase transitions are one-way
        if locked && self.rolling_timer <= 0.0 {
            self.phase = RacePhase::Racing;
            log::info!("rolling start complete, controls unlocked");
        } else if self.phase == RacePhase::Racing
            && self.current_lap >= self.preset.laps
            && self.lap_progress() >= 0.95
        {
            self.phase = RacePhase::Finished;
            log::info!("race complete after {} laps", self.preset.laps);
        }
    }

    /// Per-frame state handed to presentation.
    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            phase: self.phase,
            lap: self.current_lap,
            laps_total: self.preset.laps,
            lap_progress: self.lap_progress(),
            player_speed_mph: self.player_speed_mph,
            player_lane_value: self.player_lane_value,
            player_lane_index: self.player_lane_index(),
            player_center: self.layout.center_at(self.player_lane_value),
            player_car_num: self.player_driver.car_num.clone(),
            player_driver_name: self.player_driver.driver_name.clone(),
            player_accent: self.player_driver.accent,
            rolling_remaining: self.rolling_timer,
            draft_intensity: self.draft_bonus,
            draft_gap: self.draft_gap,
            contact_boost: self.contact_boost,
            stats: self.stats.clone(),
            cars: self.cars.iter().map(CarSnapshot::from).collect(),
        }
    }
}

/// Compact race state for snapshot transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub phase: RacePhase,
    pub lap: u32,
    pub laps_total: u32,
    pub lap_progress: f32,
    pub player_speed_mph: f32,
    pub player_lane_value: f32,
    pub player_lane_index: usize,
    /// View-space center for the controlled car's lane value
    pub player_center: f32,
    pub player_car_num: String,
    pub player_driver_name: String,
    pub player_accent: (u8, u8, u8),
    pub rolling_remaining: f32,
    pub draft_intensity: f32,
    pub draft_gap: Option<f32>,
    pub contact_boost: f32,
    pub stats: PackStats,
    pub cars: Vec<CarSnapshot>,
}
