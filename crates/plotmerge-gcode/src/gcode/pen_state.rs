//! Pen state tracking
//!
//! The plotter has a single tool axis: Z. The pen is engaged when Z is at or
//! beyond the pen-down height (minus [`FLOAT_EPS`]). Pen-down is configured
//! numerically above pen-up, so "beyond" means greater.

use plotmerge_core::{approx_eq, ConfigError, FLOAT_EPS};
use serde::{Deserialize, Serialize};

/// Validated pen-up / pen-down pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenHeights {
    pen_up_z: f64,
    pen_down_z: f64,
}

impl PenHeights {
    /// Create a height pair; `pen_down_z` must be strictly greater than `pen_up_z`
    pub fn new(pen_up_z: f64, pen_down_z: f64) -> Result<Self, ConfigError> {
        for (key, value) in [("pen_up_z", pen_up_z), ("pen_down_z", pen_down_z)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    key: key.to_string(),
                });
            }
        }
        if pen_down_z <= pen_up_z {
            return Err(ConfigError::HeightOrdering {
                pen_up_z,
                pen_down_z,
            });
        }
        Ok(Self {
            pen_up_z,
            pen_down_z,
        })
    }

    /// Travel height
    pub fn pen_up_z(&self) -> f64 {
        self.pen_up_z
    }

    /// Contact height
    pub fn pen_down_z(&self) -> f64 {
        self.pen_down_z
    }

    /// Whether a pen at `z` touches the paper
    pub fn is_engaged(&self, z: f64) -> bool {
        z >= self.pen_down_z - FLOAT_EPS
    }
}

/// Engagement before and after one observed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenTransition {
    /// Engaged before the line
    pub was_engaged: bool,
    /// Engaged after the line
    pub is_engaged: bool,
}

impl PenTransition {
    /// Engaged to disengaged: one completed stroke
    pub fn is_lift(&self) -> bool {
        self.was_engaged && !self.is_engaged
    }

    /// Disengaged to engaged
    pub fn is_drop(&self) -> bool {
        !self.was_engaged && self.is_engaged
    }
}

/// Machine state threaded through one job
///
/// Owned by the running job and handed out by `&mut` to the tracker and the
/// macro renderer; never shared between jobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineState {
    z: f64,
    engaged: bool,
}

impl MachineState {
    /// Pen up, at pen-up height
    pub fn at_pen_up(heights: &PenHeights) -> Self {
        Self {
            z: heights.pen_up_z(),
            engaged: false,
        }
    }

    /// Last known Z
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Whether the pen is on the paper
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Update from a line's Z value; `None` leaves the state untouched
    pub fn observe(&mut self, z: Option<f64>, heights: &PenHeights) -> PenTransition {
        let was_engaged = self.engaged;
        if let Some(z) = z {
            self.z = z;
            self.engaged = heights.is_engaged(z);
        }
        PenTransition {
            was_engaged,
            is_engaged: self.engaged,
        }
    }

    /// True when Z sits on pen-up height within tolerance
    pub fn is_at_pen_up(&self, heights: &PenHeights) -> bool {
        approx_eq(self.z, heights.pen_up_z())
    }

    /// Force pen-up height and disengage
    pub fn reset_to_pen_up(&mut self, heights: &PenHeights) {
        self.z = heights.pen_up_z();
        self.engaged = false;
    }
}
