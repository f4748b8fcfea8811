//! Pack - Field composition, recycling and pack bookkeeping
//!
//! Builds the AI field for a preset (grid or two-wide tight formation),
//! reseeds the pack tail when a car drops out of range, and computes the
//! per-frame pack statistics the HUD consumes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::config::{TrackPreset, Tuning};
use crate::sim::roster::{default_driver, DriverRef};
use crate::sim::vehicle::Car;

/// Roster pool used for spawning. An empty roster substitutes the
/// synthetic default driver so the field is never empty.
pub fn spawn_pool(roster: &[DriverRef]) -> Vec<DriverRef> {
    if roster.is_empty() {
        vec![default_driver()]
    } else {
        roster.to_vec()
    }
}

/// Distribute the field into rows along the preset's formation lanes,
/// cycling through a shuffled roster. Later rows jitter more; a preset
/// with fewer grid cells than the target simply fills what it has.
pub fn spawn_grid(
    preset: &TrackPreset,
    roster: &[DriverRef],
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Vec<Car> {
    let lane_count = preset.lane_count.max(1);
    let row_spacing = tuning
        .pack
        .min_row_spacing
        .max(preset.row_gap * tuning.pack.row_spacing_factor);
    let field_target = match preset.field_size {
        Some(size) if size > 1 => size,
        _ => preset.pack_rows * lane_count,
    };
    let mut ai_limit = if preset.field_size.is_some() {
        field_target.saturating_sub(1).max(3)
    } else {
        field_target.max(3)
    };

    let mut formation_lanes: Vec<usize> = preset
        .formation_lanes
        .clone()
        .unwrap_or_else(|| (0..lane_count).collect())
        .into_iter()
        .filter(|&lane| lane < lane_count)
        .collect();
    if formation_lanes.is_empty() {
        formation_lanes = (0..lane_count).collect();
    }
    let columns = formation_lanes.len().max(1);
    ai_limit = ai_limit.min(preset.pack_rows * columns);

    let mut pool = spawn_pool(roster);
    pool.shuffle(rng);

    let rows = preset.pack_rows.max(1) as f32;
    let mut cars = Vec::with_capacity(ai_limit);
    for idx in 0..ai_limit {
        let row = idx / columns;
        if row >= preset.pack_rows {
            break;
        }
        let lane = formation_lanes[idx % columns];
        let jitter_hi = tuning.pack.row_jitter * row as f32 / rows;
        let jitter = rng.gen_range(-tuning.pack.row_jitter..=jitter_hi);
        let distance = tuning.pack.base_distance + row as f32 * row_spacing + jitter;
        let driver = pool[idx % pool.len()].clone();
        cars.push(Car::spawn(lane, distance, driver, tuning, rng));
    }
    cars
}

/// Tight two-wide pack on the controlled car's lane and its inward
/// neighbour, one row at a time, skipping the cell the controlled car
/// occupies. Row spacing sits near the collision threshold by design.
pub fn spawn_two_wide(
    preset: &TrackPreset,
    roster: &[DriverRef],
    tuning: &Tuning,
    player_lane: usize,
    rng: &mut impl Rng,
) -> Vec<Car> {
    let lane_count = preset.lane_count.max(1);
    let player_lane = player_lane.min(lane_count - 1);
    let mut lanes = vec![player_lane];
    if player_lane + 1 < lane_count {
        lanes.push(player_lane + 1);
    } else if player_lane > 0 {
        lanes.push(player_lane - 1);
    }

    let target = match preset.field_size {
        Some(size) if size > 1 => size - 1,
        _ => preset.pack_rows * lanes.len(),
    }
    .max(3);

    let mut pool = spawn_pool(roster);
    pool.shuffle(rng);

    let mut cars = Vec::with_capacity(target);
    let mut seq = 0usize;
    let mut row = 0usize;
    while cars.len() < target {
        for &lane in &lanes {
            if cars.len() >= target {
                break;
            }
            if row == 0 && lane == player_lane {
                // reserved for the controlled car
                continue;
            }
            let distance = row as f32 * tuning.pack.tight_row_gap;
            let driver = pool[seq % pool.len()].clone();
            seq += 1;
            cars.push(Car::spawn(lane, distance, driver, tuning, rng));
        }
        row += 1;
    }
    cars
}

/// Fresh replacement for a car that fell out of range: random lane,
/// random distance in the forward band, random roster driver.
pub fn recycle_car(
    preset: &TrackPreset,
    pool: &[DriverRef],
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Car {
    let lane = rng.gen_range(0..preset.lane_count.max(1));
    let distance = rng.gen_range(tuning.pack.recycle_min..tuning.pack.recycle_max);
    let driver = pool
        .choose(rng)
        .cloned()
        .unwrap_or_else(default_driver);
    Car::spawn(lane, distance, driver, tuning, rng)
}

/// Pack statistics around the controlled car.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackStats {
    pub ahead: u32,
    pub behind: u32,
    /// Gap to the nearest car ahead in any lane
    pub closest_ahead: Option<f32>,
    /// Cars near the controlled car per lane
    pub lane_density: Vec<u32>,
}

pub fn gather_stats(cars: &[Car], lane_count: usize, density_range: f32) -> PackStats {
    let mut stats = PackStats {
        lane_density: vec![0; lane_count],
        ..PackStats::default()
    };
    let mut closest = f32::MAX;
    for car in cars {
        if car.distance > 0.0 {
            stats.ahead += 1;
            closest = closest.min(car.distance);
        } else {
            stats.behind += 1;
        }
        if car.lane_index < lane_count && car.distance.abs() < density_range {
            stats.lane_density[car.lane_index] += 1;
        }
    }
    if closest < f32::MAX {
        stats.closest_ahead = Some(closest);
    }
    stats
}

/// Nearest cars ahead and behind the controlled car, for the HUD
/// sidebar. Ahead is sorted closest-first, behind likewise.
pub fn pack_view(cars: &[Car], limit: usize) -> (Vec<&Car>, Vec<&Car>) {
    let mut ahead: Vec<&Car> = cars.iter().filter(|c| c.distance > 0.0).collect();
    let mut behind: Vec<&Car> = cars.iter().filter(|c| c.distance <= 0.0).collect();
    ahead.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    behind.sort_by(|a, b| b.distance.total_cmp(&a.distance));
    ahead.truncate(limit);
    behind.truncate(limit);
    (ahead, behind)
}
