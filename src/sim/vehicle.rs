//! Vehicle - Per-car kinetic state and integration
//!
//! Every car is expressed in the controlled car's reference frame: the
//! `distance` field is the signed longitudinal offset from the controlled
//! car (positive = ahead) and only the difference between a car's speed
//! and the frame reference speed moves it. A car that drops far enough
//! behind signals the caller to recycle it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::config::Tuning;
use crate::sim::roster::DriverRef;

/// Running state machine. `Crashing` is time-bounded and always falls
/// through to `Disabled`; `Disabled` never recovers (the car drifts out
/// of range and is recycled like any other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarState {
    Running,
    Crashing,
    Disabled,
}

/// One AI car.
#[derive(Debug, Clone)]
pub struct Car {
    /// Lane the car occupies, always within track bounds
    pub lane_index: usize,
    /// Signed offset from the controlled car, positive = ahead
    pub distance: f32,
    /// Simulation-unit speed
    pub speed: f32,
    pub state: CarState,
    /// Fixed per-car multiplier on target speed and acceleration
    pub aggression: f32,
    /// Cooldown before another lane change may be attempted
    pub lane_change_timer: f32,
    /// Remaining time in the crashing sub-state
    pub crash_timer: f32,
    /// Cosmetic rotation rate while crashing (radians/second)
    pub spin_rate: f32,
    /// Accumulated cosmetic rotation
    pub spin_angle: f32,
    /// Shared identity record
    pub driver: DriverRef,
    /// Which of the driver's visual variants this car wears
    pub variant: usize,
}

impl Car {
    /// Spawn a fresh running car with randomized aggression and variant.
    pub fn spawn(
        lane_index: usize,
        distance: f32,
        driver: DriverRef,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Self {
        let variant = if driver.variants.len() > 1 {
            rng.gen_range(0..driver.variants.len())
        } else {
            0
        };
        let (lo, hi) = (tuning.ai.aggression_min, tuning.ai.aggression_max);
        let aggression = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        Self {
            lane_index,
            distance,
            speed: 0.0,
            state: CarState::Running,
            aggression,
            lane_change_timer: 0.0,
            crash_timer: 0.0,
            spin_rate: 0.0,
            spin_angle: 0.0,
            driver,
            variant,
        }
    }

    /// Put the car into the crashing sub-state with a fresh timer and a
    /// randomized spin.
    pub fn begin_crash(&mut self, tuning: &Tuning, rng: &mut impl Rng) {
        self.state = CarState::Crashing;
        self.crash_timer = tuning.collision.crash_timer;
        let max = tuning.collision.spin_rate_max;
        self.spin_rate = rng.gen_range(-max..=max);
    }

    pub fn is_running(&self) -> bool {
        self.state == CarState::Running
    }

    /// Advance one frame. Returns `true` when the car has fallen out of
    /// range and should be recycled.
    pub fn update(
        &mut self,
        dt: f32,
        reference_speed: f32,
        controls_locked: bool,
        tuning: &Tuning,
    ) -> bool {
        self.lane_change_timer = (self.lane_change_timer - dt).max(0.0);
        match self.state {
            CarState::Running => {
                let ai = &tuning.ai;
                let (target, accel) = if controls_locked {
                    (
                        reference_speed + (self.aggression - 1.0) * ai.locked_target_gain,
                        ai.locked_accel,
                    )
                } else {
                    (
                        reference_speed + (self.aggression - 1.0) * ai.target_gain,
                        ai.accel * self.aggression,
                    )
                };
                self.speed = move_toward(self.speed, target, accel * dt);
                self.distance -= (self.speed - reference_speed) * dt;
                if controls_locked {
                    // the scripted rolling start never lets the pack fall away
                    self.distance = self.distance.max(ai.locked_floor);
                }
            }
            CarState::Crashing => {
                let collision = &tuning.collision;
                let target = reference_speed - collision.crash_target_drop;
                self.speed = move_toward(self.speed, target, collision.crash_accel * dt);
                self.distance -= (self.speed - reference_speed) * dt;
                self.spin_angle += self.spin_rate * dt;
                self.crash_timer -= dt;
                if self.crash_timer <= 0.0 {
                    self.state = CarState::Disabled;
                    self.crash_timer = 0.0;
                }
            }
            CarState::Disabled => {
                let collision = &tuning.collision;
                let target = reference_speed - collision.disabled_target_drop;
                self.speed = move_toward(self.speed, target, collision.disabled_accel * dt);
                self.distance -= (self.speed - reference_speed) * dt;
            }
        }
        self.distance < tuning.ai.exit_distance
    }
}

/// Step a value toward a target without overshooting it.
pub(crate) fn move_toward(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else if value > target {
        (value - step).max(target)
    } else {
        value
    }
}

/// Compact car state for snapshot transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarSnapshot {
    pub lane_index: usize,
    pub distance: f32,
    pub speed: f32,
    pub state: CarState,
    pub spin_angle: f32,
    pub car_num: String,
    pub driver_name: String,
    pub accent: (u8, u8, u8),
    pub variant: usize,
}

impl From<&Car> for CarSnapshot {
    fn from(car: &Car) -> Self {
        Self {
            lane_index: car.lane_index,
            distance: car.distance,
            speed: car.speed,
            state: car.state,
            spin_angle: car.spin_angle,
            car_num: car.driver.car_num.clone(),
            driver_name: car.driver.driver_name.clone(),
            accent: car.driver.accent,
            variant: car.variant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::roster::default_driver;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn car(distance: f32) -> Car {
        let tuning = Tuning::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut car = Car::spawn(0, distance, default_driver(), &tuning, &mut rng);
        car.aggression = 1.0;
        car
    }

    #[test]
    fn speed_approaches_target_without_overshoot() {
        let tuning = Tuning::default();
        let mut car = car(100.0);
        // aggression 1.0 puts the target exactly at the reference speed
        car.update(1.0, 100.0, false, &tuning);
        assert!((car.speed - 100.0).abs() < 1e-4);
        // already at target: another tick must not oscillate
        let before = car.distance;
        car.update(1.0, 100.0, false, &tuning);
        assert!((car.speed - 100.0).abs() < 1e-4);
        assert!((car.distance - before).abs() < 1e-4);
    }

    #[test]
    fn distance_tracks_the_speed_delta_against_the_reference() {
        let tuning = Tuning::default();
        // faster than the reference: distance falls
        let mut fast = car(50.0);
        fast.speed = 300.0;
        fast.update(1.0 / 60.0, 200.0, false, &tuning);
        assert!(fast.distance < 50.0);
        // slower than the reference: distance climbs
        let mut slow = car(50.0);
        slow.speed = 80.0;
        slow.update(1.0 / 60.0, 200.0, false, &tuning);
        assert!(slow.distance > 50.0);
    }

    #[test]
    fn rolling_start_floors_the_distance() {
        let tuning = Tuning::default();
        let mut car = car(-40.0);
        car.speed = 500.0;
        car.update(1.0, 0.0, true, &tuning);
        assert!((car.distance - tuning.ai.locked_floor).abs() < 1e-4);
    }

    #[test]
    fn crash_expires_into_disabled_on_the_same_update() {
        let tuning = Tuning::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut car = car(10.0);
        car.begin_crash(&tuning, &mut rng);
        assert_eq!(car.state, CarState::Crashing);
        assert!(car.crash_timer > 0.0);
        car.crash_timer = 0.01;
        car.update(0.1, 0.0, false, &tuning);
        assert_eq!(car.state, CarState::Disabled);
    }

    #[test]
    fn disabled_cars_never_recover() {
        let tuning = Tuning::default();
        let mut car = car(10.0);
        car.state = CarState::Disabled;
        for _ in 0..120 {
            car.update(1.0 / 60.0, 100.0, false, &tuning);
        }
        assert_eq!(car.state, CarState::Disabled);
        assert!(car.speed < 100.0);
    }

    #[test]
    fn exit_signal_fires_past_the_trailing_threshold() {
        let tuning = Tuning::default();
        let mut far_behind = car(-401.0);
        assert!(far_behind.update(1.0 / 60.0, 0.0, false, &tuning));
        let mut in_range = car(-399.0);
        assert!(!in_range.update(0.0, 0.0, false, &tuning));
    }
}
