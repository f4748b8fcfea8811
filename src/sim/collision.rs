//! Collision - Following-distance enforcement and crash classification
//!
//! Runs after drafting and before integration, only while controls are
//! unlocked. The speed transfer is flavor; the distance clamp at the end
//! of each branch is what actually keeps cars from interpenetrating.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::config::Tuning;
use crate::sim::vehicle::Car;

/// What one resolver pass did.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CollisionOutcome {
    /// Speed penalty for the controlled car, in simulation units
    pub player_penalty: f32,
    /// Cars sent into the crashing state this pass
    pub crashes: u32,
}

/// Resolve illegal following distances. Per lane, running cars are
/// walked most-ahead first so later pairs read the clamped distance of
/// earlier ones; the controlled car's lane is checked last and its floor
/// takes precedence for the affected car.
pub fn resolve(
    cars: &mut [Car],
    player_lane: usize,
    reference_speed: f32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> CollisionOutcome {
    let gap_min = tuning.collision.gap;
    let crash_rel = tuning.crash_rel_units();
    let mut outcome = CollisionOutcome::default();

    let mut lanes: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, car) in cars.iter().enumerate() {
        if car.is_running() {
            lanes.entry(car.lane_index).or_default().push(idx);
        }
    }
    for members in lanes.values_mut() {
        members.sort_by(|&a, &b| cars[b].distance.total_cmp(&cars[a].distance));
        for pair in 0..members.len().saturating_sub(1) {
            let ahead = members[pair];
            let behind = members[pair + 1];
            let gap = cars[ahead].distance - cars[behind].distance;
            if gap > gap_min {
                continue;
            }
            let rel = cars[behind].speed - cars[ahead].speed;
            if rel > crash_rel {
                cars[ahead].begin_crash(tuning, rng);
                cars[behind].begin_crash(tuning, rng);
                outcome.crashes += 2;
                log::debug!(
                    "crash in lane {}: closing rate {:.0} over gap {:.0}",
                    cars[ahead].lane_index,
                    rel,
                    gap
                );
            } else if rel > 0.0 {
                // push, not energy conservation
                cars[ahead].speed += rel * tuning.collision.lead_gain;
                cars[behind].speed -= rel * tuning.collision.trail_loss;
            }
            cars[behind].distance = cars[ahead].distance - gap_min;
        }
    }

    // controlled car's lane: the car ahead may crash, the controlled car
    // only picks up a penalty the controller applies
    for idx in 0..cars.len() {
        if cars[idx].lane_index != player_lane || !cars[idx].is_running() {
            continue;
        }
        let gap = cars[idx].distance;
        if gap <= 0.0 || gap > gap_min {
            continue;
        }
        let rel = reference_speed - cars[idx].speed;
        if rel > crash_rel {
            cars[idx].begin_crash(tuning, rng);
            outcome.crashes += 1;
            outcome.player_penalty += rel * tuning.collision.trail_loss;
            log::debug!("controlled car triggered a crash at gap {gap:.0}");
        } else if rel > 0.0 {
            cars[idx].speed += rel * tuning.collision.lead_gain;
            outcome.player_penalty += rel * tuning.collision.trail_loss;
        }
        if cars[idx].distance < gap_min {
            cars[idx].distance = gap_min;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::roster::default_driver;
    use crate::sim::vehicle::CarState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn car(lane: usize, distance: f32, speed: f32) -> Car {
        let tuning = Tuning::default();
        let mut rng = StdRng::seed_from_u64(6);
        let mut car = Car::spawn(lane, distance, default_driver(), &tuning, &mut rng);
        car.speed = speed;
        car
    }

    fn scale_one() -> Tuning {
        Tuning {
            speed_scale: 1.0,
            ..Tuning::default()
        }
    }

    #[test]
    fn gentle_contact_bumps_and_clamps() {
        let tuning = scale_one();
        let mut rng = StdRng::seed_from_u64(8);
        let mut cars = vec![car(0, 100.0, 0.0), car(0, 90.0, 10.0)];
        let outcome = resolve(&mut cars, 2, 0.0, &tuning, &mut rng);
        assert_eq!(outcome.crashes, 0);
        assert_eq!(cars[0].state, CarState::Running);
        assert_eq!(cars[1].state, CarState::Running);
        assert!((cars[0].speed - 10.0 * 0.55).abs() < 1e-3);
        assert!((cars[1].speed - (10.0 - 10.0 * 0.30)).abs() < 1e-3);
        assert!((cars[1].distance - 88.0).abs() < 1e-3);
    }

    #[test]
    fn hard_closing_rate_crashes_both() {
        let tuning = scale_one();
        let mut rng = StdRng::seed_from_u64(8);
        let mut cars = vec![car(0, 100.0, 0.0), car(0, 92.0, 40.0)];
        let outcome = resolve(&mut cars, 2, 0.0, &tuning, &mut rng);
        assert_eq!(outcome.crashes, 2);
        assert_eq!(cars[0].state, CarState::Crashing);
        assert_eq!(cars[1].state, CarState::Crashing);
        assert!(cars[0].crash_timer > 0.0);
        assert!(cars[1].crash_timer > 0.0);
        // the clamp applies on the crash branch too
        assert!((cars[1].distance - 88.0).abs() < 1e-3);
    }

    #[test]
    fn opening_pairs_are_ignored() {
        let tuning = scale_one();
        let mut rng = StdRng::seed_from_u64(8);
        // closing rate is negative: clamp still applies, no transfer
        let mut cars = vec![car(0, 100.0, 50.0), car(0, 95.0, 0.0)];
        resolve(&mut cars, 2, 0.0, &tuning, &mut rng);
        assert!((cars[0].speed - 50.0).abs() < 1e-3);
        assert!((cars[1].speed - 0.0).abs() < 1e-3);
        assert!((cars[1].distance - 88.0).abs() < 1e-3);
    }

    #[test]
    fn resolver_pass_restores_the_minimum_gap_lane_wide() {
        let tuning = scale_one();
        let mut rng = StdRng::seed_from_u64(8);
        let mut cars = vec![
            car(0, 100.0, 0.0),
            car(0, 99.0, 1.0),
            car(0, 98.0, 2.0),
            car(0, 97.0, 3.0),
        ];
        resolve(&mut cars, 2, 0.0, &tuning, &mut rng);
        let mut running: Vec<&Car> = cars.iter().filter(|c| c.is_running()).collect();
        running.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        for pair in running.windows(2) {
            let gap = pair[0].distance - pair[1].distance;
            assert!(
                gap >= tuning.collision.gap - 1e-3,
                "pair survived at gap {gap}"
            );
        }
    }

    #[test]
    fn controlled_car_lane_floors_the_leader_and_returns_a_penalty() {
        let tuning = scale_one();
        let mut rng = StdRng::seed_from_u64(8);
        let mut cars = vec![car(1, 8.0, 0.0)];
        let outcome = resolve(&mut cars, 1, 20.0, &tuning, &mut rng);
        assert_eq!(cars[0].state, CarState::Running);
        assert!((cars[0].speed - 20.0 * 0.55).abs() < 1e-3);
        assert!((outcome.player_penalty - 20.0 * 0.30).abs() < 1e-3);
        assert!((cars[0].distance - tuning.collision.gap).abs() < 1e-3);
    }

    #[test]
    fn controlled_car_can_crash_the_car_ahead_but_never_itself() {
        let tuning = scale_one();
        let mut rng = StdRng::seed_from_u64(8);
        let mut cars = vec![car(1, 8.0, 0.0)];
        let outcome = resolve(&mut cars, 1, 100.0, &tuning, &mut rng);
        assert_eq!(cars[0].state, CarState::Crashing);
        assert_eq!(outcome.crashes, 1);
        assert!((cars[0].distance - tuning.collision.gap).abs() < 1e-3);
    }
}
