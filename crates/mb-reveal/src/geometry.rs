//! Strip geometry
//!
//! The strip is pre-positioned with `start_slot` under the cursor and moves
//! left (negative displacement) until the winning slot is under it.

use serde::{Deserialize, Serialize};

/// Absorbs division noise when mapping exact multiples of the pitch back to slots
const SLOT_EPSILON: f64 = 1e-9;

/// Slot layout in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StripGeometry {
    pub slot_width: f64,
    pub slot_gap: f64,
    /// Slot under the cursor before the spin starts
    pub start_slot: usize,
}

impl StripGeometry {
    pub fn new(slot_width: f64, slot_gap: f64) -> Self {
        Self {
            slot_width,
            slot_gap,
            start_slot: 0,
        }
    }

    /// Distance between consecutive slot origins
    pub fn pitch(&self) -> f64 {
        self.slot_width + self.slot_gap
    }

    /// Can a single leftward translation bring `index` under the cursor?
    pub fn reaches(&self, index: usize) -> bool {
        index >= self.start_slot && self.pitch() > 0.0
    }

    /// Displacement that puts `index` under the cursor (whole pitches, never positive)
    pub fn travel_distance(&self, index: usize) -> f64 {
        let slots = index.saturating_sub(self.start_slot);
        -(slots as f64 * self.pitch())
    }

    /// Slot under the cursor at `displacement`
    pub fn slot_at(&self, displacement: f64) -> usize {
        let pitch = self.pitch();
        if pitch <= 0.0 || !displacement.is_finite() {
            return self.start_slot;
        }
        self.start_slot + (displacement.abs() / pitch + SLOT_EPSILON).floor() as usize
    }
}

impl Default for StripGeometry {
    fn default() -> Self {
        Self::new(150.0, 12.0)
    }
}
