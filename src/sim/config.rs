//! Config - Track presets and simulation tuning
//!
//! All tuning values live in one immutable `Tuning` tree that is handed to
//! the race controller at construction, so several simulations can run with
//! different numbers side by side. `Default` carries the production values.

use serde::{Deserialize, Serialize};

/// Static descriptor of an oval layout and its starting formation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPreset {
    /// Display name
    pub name: String,
    /// One-line flavor text for menus
    pub tagline: String,
    /// Number of lanes, at least 1
    pub lane_count: usize,
    /// Visual height of one lane
    pub lane_width: f32,
    /// Spacing between adjacent lanes
    pub lane_spacing: f32,
    /// Rows available for the starting grid
    pub pack_rows: usize,
    /// Longitudinal gap between grid rows
    pub row_gap: f32,
    /// Laps to complete
    pub laps: u32,
    /// Total field size including the controlled car, if fixed
    pub field_size: Option<usize>,
    /// Subset of lanes used for the starting formation
    pub formation_lanes: Option<Vec<usize>>,
}

impl TrackPreset {
    /// Lane the controlled car starts in (and is held to during the
    /// rolling start).
    pub fn middle_lane(&self) -> usize {
        self.lane_count / 2
    }

    /// The built-in track catalog.
    pub fn catalog() -> Vec<TrackPreset> {
        vec![
            TrackPreset {
                name: "Cup21 Draft Oval".into(),
                tagline: "Three-lane Daytona vibe with a 43-car formation.".into(),
                lane_count: 3,
                lane_width: 218.0,
                lane_spacing: 118.0,
                pack_rows: 23,
                row_gap: 56.0,
                laps: 12,
                field_size: Some(43),
                formation_lanes: Some(vec![0, 2]),
            },
            TrackPreset {
                name: "3-Lane Oval".into(),
                tagline: "Wide middle lane, tight draft funnels.".into(),
                lane_count: 3,
                lane_width: 210.0,
                lane_spacing: 220.0,
                pack_rows: 6,
                row_gap: 70.0,
                laps: 10,
                field_size: None,
                formation_lanes: None,
            },
            TrackPreset {
                name: "Superspeedway 5".into(),
                tagline: "Packed, relentless pace with extra lanes.".into(),
                lane_count: 5,
                lane_width: 200.0,
                lane_spacing: 200.0,
                pack_rows: 8,
                row_gap: 65.0,
                laps: 8,
                field_size: None,
                formation_lanes: None,
            },
            TrackPreset {
                name: "Drafting Tri-Oval".into(),
                tagline: "Triangle drafting that rewards timing.".into(),
                lane_count: 4,
                lane_width: 205.0,
                lane_spacing: 210.0,
                pack_rows: 5,
                row_gap: 80.0,
                laps: 6,
                field_size: None,
                formation_lanes: None,
            },
        ]
    }
}

/// Starting formation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formation {
    /// Row formation across the preset's formation lanes
    #[default]
    Grid,
    /// Two-lane tight pack surrounding the controlled car
    TwoWide,
}

/// Rolling-start ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingTuning {
    /// Seconds the controls stay locked
    pub duration: f32,
    /// Ramp start speed (MPH)
    pub min_mph: f32,
    /// Ramp end speed (MPH)
    pub max_mph: f32,
}

impl Default for RollingTuning {
    fn default() -> Self {
        Self {
            duration: 5.0,
            min_mph: 110.0,
            max_mph: 200.0,
        }
    }
}

/// Controlled-car speed and lane handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlledTuning {
    /// Cruise target (MPH)
    pub base_mph: f32,
    /// Brake override target (MPH), also the target-speed floor
    pub brake_mph: f32,
    /// Approach rate toward the target (MPH per second)
    pub accel_mph: f32,
    /// Target-speed ceiling above base (MPH)
    pub headroom_mph: f32,
    /// Peak cornering penalty (MPH)
    pub turn_penalty_max: f32,
    /// MPH added per unit of draft intensity
    pub draft_bonus_mph: f32,
    /// MPH added per unit of contact boost
    pub contact_bonus_factor: f32,
    /// Cooldown between accepted lane changes (seconds)
    pub lane_cooldown: f32,
    /// Visual slide rate between lanes (lanes per second)
    pub lane_ease_rate: f32,
    /// Destination lane must be clear within this distance
    pub lane_safety_distance: f32,
}

impl Default for ControlledTuning {
    fn default() -> Self {
        Self {
            base_mph: 200.0,
            brake_mph: 120.0,
            accel_mph: 120.0,
            headroom_mph: 40.0,
            turn_penalty_max: 34.0,
            draft_bonus_mph: 18.0,
            contact_bonus_factor: 0.28,
            lane_cooldown: 0.18,
            lane_ease_rate: 6.5,
            lane_safety_distance: 120.0,
        }
    }
}

/// AI speed model and lane-change behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiTuning {
    /// Aggression multiplier band sampled at spawn
    pub aggression_min: f32,
    pub aggression_max: f32,
    /// Target-speed spread around the reference per aggression unit
    pub target_gain: f32,
    /// Same spread while controls are locked
    pub locked_target_gain: f32,
    /// Acceleration, multiplied by aggression
    pub accel: f32,
    /// Acceleration while controls are locked
    pub locked_accel: f32,
    /// Cars cannot fall behind this during the rolling start
    pub locked_floor: f32,
    /// Cars this far behind the reference are recycled
    pub exit_distance: f32,
    /// A same-lane car ahead within this range counts as blocking
    pub blocking_range: f32,
    /// A target-lane occupant within this range denies the move
    pub conflict_range: f32,
    /// Cooldown after an accepted lane change (seconds)
    pub lane_cooldown: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            aggression_min: 0.85,
            aggression_max: 1.2,
            target_gain: 32.0,
            locked_target_gain: 12.0,
            accel: 360.0,
            locked_accel: 280.0,
            locked_floor: -48.0,
            exit_distance: -400.0,
            blocking_range: 160.0,
            conflict_range: 170.0,
            lane_cooldown: 0.6,
        }
    }
}

/// Slipstream and bumper-contact model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftTuning {
    /// Gap below which a trailing car picks up slipstream
    pub slipstream_range: f32,
    /// Full-strength slipstream speed addend
    pub slipstream_boost: f32,
    /// Gap below which bumper pressure applies to both cars
    pub bumper_range: f32,
    /// Bumper addend for the trailing car at zero gap
    pub bumper_trail_boost: f32,
    /// Bumper addend for the leading car at zero gap
    pub bumper_lead_boost: f32,
    /// Trailing cars never close past lead distance minus this
    pub soft_rail: f32,
    /// Window ahead of the controlled car that counts as contact
    pub contact_range: f32,
    /// Controlled-car boost per unit of contact
    pub contact_rate: f32,
    /// Speed the contacted AI car itself gains per unit of contact
    pub contact_feedback: f32,
    /// Total contact boost cap
    pub contact_cap: f32,
    /// Wider window used for the HUD draft-intensity reading
    pub intensity_range: f32,
}

impl Default for DraftTuning {
    fn default() -> Self {
        Self {
            slipstream_range: 160.0,
            slipstream_boost: 28.0,
            bumper_range: 28.0,
            bumper_trail_boost: 32.0,
            bumper_lead_boost: 18.0,
            soft_rail: 14.0,
            contact_range: 42.0,
            contact_rate: 30.0,
            contact_feedback: 28.0,
            contact_cap: 50.0,
            intensity_range: 200.0,
        }
    }
}

/// Collision classification and crash sub-state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionTuning {
    /// Hard minimum following distance
    pub gap: f32,
    /// Closing rate above which contact becomes a crash (MPH-equivalent)
    pub crash_rel_mph: f32,
    /// Seconds a car spends crashing before going disabled
    pub crash_timer: f32,
    /// Crashing target speed sits this far below the reference
    pub crash_target_drop: f32,
    /// Deceleration while crashing
    pub crash_accel: f32,
    /// Disabled target speed sits this far below the reference
    pub disabled_target_drop: f32,
    /// Deceleration while disabled
    pub disabled_accel: f32,
    /// Fraction of the closing rate the leading car gains on a bump
    pub lead_gain: f32,
    /// Fraction of the closing rate the trailing car loses on a bump
    pub trail_loss: f32,
    /// Spin rate magnitude bound sampled at crash time (radians/second)
    pub spin_rate_max: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            gap: 12.0,
            crash_rel_mph: 24.0,
            crash_timer: 1.2,
            crash_target_drop: 140.0,
            crash_accel: 420.0,
            disabled_target_drop: 220.0,
            disabled_accel: 560.0,
            lead_gain: 0.55,
            trail_loss: 0.30,
            spin_rate_max: 9.0,
        }
    }
}

/// Pack composition and recycling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackTuning {
    /// Distance of the first grid row
    pub base_distance: f32,
    /// Row spacing floor
    pub min_row_spacing: f32,
    /// Fraction of the preset row gap used as spacing
    pub row_spacing_factor: f32,
    /// Spawn jitter magnitude, scaled up by row index
    pub row_jitter: f32,
    /// Recycled cars respawn in this forward band
    pub recycle_min: f32,
    pub recycle_max: f32,
    /// Row spacing for the two-wide tight formation
    pub tight_row_gap: f32,
    /// Cars within this range count toward lane density
    pub density_range: f32,
}

impl Default for PackTuning {
    fn default() -> Self {
        Self {
            base_distance: 120.0,
            min_row_spacing: 36.0,
            row_spacing_factor: 0.85,
            row_jitter: 6.0,
            recycle_min: 520.0,
            recycle_max: 1500.0,
            tight_row_gap: 26.0,
            density_range: 420.0,
        }
    }
}

/// The full tuning tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Simulation units per MPH
    pub speed_scale: f32,
    /// Simulation units per lap
    pub lap_distance: f32,
    pub rolling: RollingTuning,
    pub controlled: ControlledTuning,
    pub ai: AiTuning,
    pub draft: DraftTuning,
    pub collision: CollisionTuning,
    pub pack: PackTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            speed_scale: 3.8,
            lap_distance: 4200.0,
            rolling: RollingTuning::default(),
            controlled: ControlledTuning::default(),
            ai: AiTuning::default(),
            draft: DraftTuning::default(),
            collision: CollisionTuning::default(),
            pack: PackTuning::default(),
        }
    }
}

impl Tuning {
    /// Crash threshold expressed in simulation units.
    pub fn crash_rel_units(&self) -> f32 {
        self.collision.crash_rel_mph * self.speed_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_presets_are_well_formed() {
        for preset in TrackPreset::catalog() {
            assert!(preset.lane_count >= 1, "{} has no lanes", preset.name);
            if let Some(lanes) = &preset.formation_lanes {
                assert!(lanes.iter().all(|&l| l < preset.lane_count));
            }
            if let Some(size) = preset.field_size {
                assert!(size > 1);
            }
        }
    }

    #[test]
    fn crash_threshold_scales_with_speed_scale() {
        let mut tuning = Tuning::default();
        assert!((tuning.crash_rel_units() - 24.0 * 3.8).abs() < 1e-4);
        tuning.speed_scale = 1.0;
        assert!((tuning.crash_rel_units() - 24.0).abs() < 1e-4);
    }
}
