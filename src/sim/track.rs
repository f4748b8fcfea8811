//! Track - Lane geometry lookups
//!
//! Builds the lane-center table for a preset and answers continuous
//! lane-value queries for the controlled car's slide between lanes.
//! Geometry is expressed in view units, centered on the view midline.

use serde::{Deserialize, Serialize};

use crate::sim::config::TrackPreset;

/// Default vertical view extent the lane stack is centered in.
pub const DEFAULT_VIEW_EXTENT: f32 = 720.0;

/// Lane-center table for one preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneLayout {
    centers: Vec<f32>,
    lane_width: f32,
    lane_spacing: f32,
    view_extent: f32,
}

impl LaneLayout {
    /// Build the layout centered in the default view extent.
    pub fn new(preset: &TrackPreset) -> Self {
        Self::build(preset, DEFAULT_VIEW_EXTENT)
    }

    /// Build the layout centered in a custom view extent.
    pub fn build(preset: &TrackPreset, view_extent: f32) -> Self {
        let mut centers = Vec::with_capacity(preset.lane_count);
        if preset.lane_count > 0 {
            let total = preset.lane_count as f32 * preset.lane_width
                + preset.lane_count.saturating_sub(1) as f32 * preset.lane_spacing;
            let top = view_extent / 2.0 - total / 2.0;
            let step = preset.lane_width + preset.lane_spacing;
            for i in 0..preset.lane_count {
                centers.push(top + step * i as f32 + preset.lane_width / 2.0);
            }
        }
        Self {
            centers,
            lane_width: preset.lane_width,
            lane_spacing: preset.lane_spacing,
            view_extent,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.centers.len()
    }

    /// Center of an integer lane. Degenerate layouts answer the view
    /// midline instead of failing.
    pub fn center_of(&self, lane: usize) -> f32 {
        match self.centers.get(lane.min(self.centers.len().saturating_sub(1))) {
            Some(&center) => center,
            None => self.view_extent / 2.0,
        }
    }

    /// Center at a continuous lane value, interpolating between the two
    /// adjacent lanes.
    pub fn center_at(&self, lane_value: f32) -> f32 {
        if self.centers.is_empty() {
            return self.view_extent / 2.0;
        }
        let max_lane = (self.centers.len() - 1) as f32;
        let lane_value = lane_value.clamp(0.0, max_lane);
        let low = lane_value.floor() as usize;
        let high = lane_value.ceil() as usize;
        if low == high {
            return self.centers[low];
        }
        let t = lane_value - low as f32;
        self.centers[low] * (1.0 - t) + self.centers[high] * t
    }

    /// Vertical extent of the racing surface, with apron margins.
    pub fn bounds(&self) -> (f32, f32) {
        match (self.centers.first(), self.centers.last()) {
            (Some(&first), Some(&last)) => {
                let top = first - self.lane_width / 2.0 - self.lane_spacing * 0.6 - 26.0;
                let bottom = last + self.lane_width / 2.0 + self.lane_spacing * 0.6 + 26.0;
                (top, bottom)
            }
            _ => (0.0, self.view_extent),
        }
    }
}
