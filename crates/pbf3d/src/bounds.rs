//! Axis-aligned simulation domain.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Axis-aligned bounding box the fluid is confined to.
///
/// Immutable for the lifetime of a simulation (or mutated only between
/// steps, never during one).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, SimError> {
        let bb = Self { min, max };
        bb.validate()?;
        Ok(bb)
    }

    /// Check that the box has positive, finite extent on every axis.
    pub fn validate(&self) -> Result<(), SimError> {
        let ext = self.max - self.min;
        if !ext.is_finite() || ext.min_element() <= 0.0 {
            return Err(SimError::DegenerateBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Side lengths.
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Clamp a point into the box (inclusive on both faces).
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}
