//! Drafting - Slipstream and bumper-contact speed model
//!
//! Walks each lane front-to-back and hands trailing cars a speed addend
//! that grows as the gap closes. The controlled car's boost is returned
//! to the caller instead of being written anywhere: its speed integration
//! lives in the race controller, not in a `Car`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sim::config::DraftTuning;
use crate::sim::vehicle::Car;

/// Draft reading for the controlled car's lane, used by the HUD and by
/// the controlled car's own target-speed bonus. Deliberately measured
/// over a wider window than the speed boosts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DraftReading {
    /// 0..1, strongest same-lane draft
    pub intensity: f32,
    /// Gap to the nearest same-lane car ahead, if any is in range
    pub nearest_gap: Option<f32>,
}

/// Indices of `cars` bucketed by lane, each bucket sorted most-ahead
/// first. Non-positive gaps are left alone here; interpenetration is the
/// collision resolver's concern.
fn lane_buckets(cars: &[Car]) -> HashMap<usize, Vec<usize>> {
    let mut lanes: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, car) in cars.iter().enumerate() {
        lanes.entry(car.lane_index).or_default().push(idx);
    }
    for members in lanes.values_mut() {
        members.sort_by(|&a, &b| cars[b].distance.total_cmp(&cars[a].distance));
    }
    lanes
}

/// Apply slipstream and bumper-pressure boosts to the AI field and
/// return the controlled car's contact boost (capped).
pub fn apply_drafting(cars: &mut [Car], player_lane: usize, tuning: &DraftTuning) -> f32 {
    let lanes = lane_buckets(cars);
    for members in lanes.values() {
        for pair in 0..members.len().saturating_sub(1) {
            let lead = members[pair];
            let trail = members[pair + 1];
            let gap = cars[lead].distance - cars[trail].distance;
            if gap <= 0.0 {
                continue;
            }
            if gap < tuning.slipstream_range {
                cars[trail].speed += tuning.slipstream_boost * (1.0 - gap / tuning.slipstream_range);
            }
            if gap < tuning.bumper_range {
                let pressure = (tuning.bumper_range - gap) / tuning.bumper_range;
                cars[trail].speed += pressure * tuning.bumper_trail_boost;
                cars[lead].speed += pressure * tuning.bumper_lead_boost;
                // soft rail: the trailing car never slides through the lead
                let rail = cars[lead].distance - tuning.soft_rail;
                if cars[trail].distance > rail {
                    cars[trail].distance = rail;
                }
            }
        }
    }

    let mut player_contact = 0.0;
    for car in cars.iter_mut() {
        if car.lane_index != player_lane {
            continue;
        }
        let gap = car.distance;
        if gap > 0.0 && gap < tuning.contact_range {
            let contact = (tuning.contact_range - gap) / tuning.contact_range;
            player_contact += contact * tuning.contact_rate;
            car.speed += contact * tuning.contact_feedback;
        }
    }
    player_contact.min(tuning.contact_cap)
}

/// Measure the controlled car's draft intensity and nearest gap over the
/// wide intensity window.
pub fn draft_reading(cars: &[Car], player_lane: usize, tuning: &DraftTuning) -> DraftReading {
    let mut reading = DraftReading::default();
    let mut min_gap = f32::MAX;
    for car in cars {
        if car.lane_index != player_lane {
            continue;
        }
        let gap = car.distance;
        if gap > 0.0 && gap < tuning.intensity_range {
            reading.intensity = reading.intensity.max(1.0 - gap / tuning.intensity_range);
            min_gap = min_gap.min(gap);
        }
    }
    if min_gap < f32::MAX {
        reading.nearest_gap = Some(min_gap);
    }
    reading
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::Tuning;
    use crate::sim::roster::default_driver;
    use crate::sim::vehicle::Car;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn car(lane: usize, distance: f32, speed: f32) -> Car {
        let tuning = Tuning::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut car = Car::spawn(lane, distance, default_driver(), &tuning, &mut rng);
        car.speed = speed;
        car
    }

    #[test]
    fn trailing_car_gains_slipstream() {
        let tuning = DraftTuning::default();
        let mut cars = vec![car(0, 100.0, 0.0), car(0, 40.0, 50.0)];
        let boost = apply_drafting(&mut cars, 2, &tuning);
        // gap 60: 28 * (1 - 60/160)
        assert!((cars[1].speed - 67.5).abs() < 1e-3);
        assert!((cars[0].speed - 0.0).abs() < 1e-3);
        assert_eq!(boost, 0.0);
    }

    #[test]
    fn bumper_pressure_pushes_both_and_rails_the_trailer() {
        let tuning = DraftTuning::default();
        let mut cars = vec![car(0, 100.0, 0.0), car(0, 90.0, 0.0)];
        apply_drafting(&mut cars, 2, &tuning);
        let pressure = (28.0 - 10.0) / 28.0;
        let slip = 28.0 * (1.0 - 10.0 / 160.0);
        assert!((cars[1].speed - (slip + pressure * 32.0)).abs() < 1e-3);
        assert!((cars[0].speed - pressure * 18.0).abs() < 1e-3);
        // railed to lead distance minus the soft rail
        assert!((cars[1].distance - 86.0).abs() < 1e-3);
    }

    #[test]
    fn non_positive_gaps_are_left_for_the_resolver() {
        let tuning = DraftTuning::default();
        let mut cars = vec![car(0, 50.0, 0.0), car(0, 50.0, 10.0)];
        apply_drafting(&mut cars, 2, &tuning);
        assert!((cars[0].speed - 0.0).abs() < 1e-3);
        assert!((cars[1].speed - 10.0).abs() < 1e-3);
    }

    #[test]
    fn slipstream_grows_as_the_gap_closes() {
        let tuning = DraftTuning::default();
        let mut last_boost = -1.0;
        for gap in [150.0, 120.0, 90.0, 60.0, 30.0, 5.0] {
            let mut cars = vec![car(0, 200.0, 0.0), car(0, 200.0 - gap, 0.0)];
            apply_drafting(&mut cars, 2, &tuning);
            let boost = cars[1].speed;
            assert!(
                boost >= last_boost,
                "boost shrank from {last_boost} to {boost} at gap {gap}"
            );
            last_boost = boost;
        }
    }

    #[test]
    fn contact_boost_sums_and_caps() {
        let tuning = DraftTuning::default();
        let mut cars = vec![car(1, 20.0, 0.0), car(1, 10.0, 0.0), car(1, 5.0, 0.0)];
        let boost = apply_drafting(&mut cars, 1, &tuning);
        assert!(boost > 0.0);
        assert!(boost <= tuning.contact_cap);
        // each contacted car itself gets pushed
        assert!(cars.iter().all(|c| c.speed > 0.0));
    }

    #[test]
    fn intensity_uses_the_wider_window() {
        let tuning = DraftTuning::default();
        // gap 180 is outside the boost window but inside the intensity one
        let cars = vec![car(1, 180.0, 0.0)];
        let reading = draft_reading(&cars, 1, &tuning);
        assert!((reading.intensity - (1.0 - 180.0 / 200.0)).abs() < 1e-4);
        assert_eq!(reading.nearest_gap, Some(180.0));

        let empty = draft_reading(&cars, 0, &tuning);
        assert_eq!(empty.intensity, 0.0);
        assert!(empty.nearest_gap.is_none());
    }
}
