//! Lanes - Lane-change arbitration
//!
//! AI cars blocked by traffic probe a random direction first, then its
//! opposite, and snap lanes when the target is clear. The controlled
//! car's requests go through a safety-distance check and slide visually
//! instead of snapping; the controller owns that easing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::config::AiTuning;
use crate::sim::vehicle::Car;

/// Controlled car's lane-change intent for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneIntent {
    #[default]
    None,
    Left,
    Right,
}

/// Let every eligible blocked AI car look for an open adjacent lane.
/// Acceptance snaps the lane index and starts the cooldown; a blocked
/// car with no viable lane just stays put until a later frame.
pub fn attempt_ai_lane_changes(
    cars: &mut [Car],
    lane_count: usize,
    tuning: &AiTuning,
    rng: &mut impl Rng,
) {
    for i in 0..cars.len() {
        if !cars[i].is_running() || cars[i].lane_change_timer > 0.0 {
            continue;
        }
        let lane = cars[i].lane_index;
        let distance = cars[i].distance;
        let blocked = cars.iter().enumerate().any(|(j, other)| {
            j != i && other.lane_index == lane && {
                let gap = other.distance - distance;
                gap > 0.0 && gap < tuning.blocking_range
            }
        });
        if !blocked {
            continue;
        }
        let preferred: isize = if rng.gen::<bool>() { 1 } else { -1 };
        for dir in [preferred, -preferred] {
            let target = lane as isize + dir;
            if target < 0 || target >= lane_count as isize {
                continue;
            }
            let target = target as usize;
            let conflict = cars.iter().enumerate().any(|(j, other)| {
                j != i
                    && other.lane_index == target
                    && (other.distance - distance).abs() < tuning.conflict_range
            });
            if conflict {
                continue;
            }
            cars[i].lane_index = target;
            cars[i].lane_change_timer = tuning.lane_cooldown;
            break;
        }
    }
}

/// Validate the controlled car's lane-change request. Returns the new
/// target lane when the adjacent lane exists and is clear within the
/// safety distance; a denied request is simply `None`.
pub fn player_lane_request(
    cars: &[Car],
    lane_count: usize,
    current_target: usize,
    intent: LaneIntent,
    safety_distance: f32,
) -> Option<usize> {
    let dir: isize = match intent {
        LaneIntent::Left => -1,
        LaneIntent::Right => 1,
        LaneIntent::None => return None,
    };
    let target = current_target as isize + dir;
    if target < 0 || target >= lane_count as isize {
        return None;
    }
    let target = target as usize;
    let occupied = cars
        .iter()
        .any(|car| car.lane_index == target && car.distance.abs() < safety_distance);
    if occupied {
        None
    } else {
        Some(target)
    }
}
