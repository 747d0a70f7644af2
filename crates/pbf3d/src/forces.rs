//! Scene-force accumulation.
//!
//! The solver core consumes a single accumulated force vector per step; this
//! module is the tagged-variant front end that produces it from a
//! heterogeneous force list, evaluated once per step. The core never
//! inspects force variants itself.

use glam::Vec3;

/// A global force acting on every particle.
///
/// Forces are mass-normalized accelerations (gravity is
/// `Gravity(Vec3::new(0.0, -9.8, 0.0))`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneForce {
    /// Gravitational acceleration.
    Gravity(Vec3),
    /// Any other uniform body force (wind, buoyancy trim, etc.).
    Uniform(Vec3),
}

impl SceneForce {
    /// The force vector this variant contributes.
    pub fn contribution(&self) -> Vec3 {
        match self {
            SceneForce::Gravity(g) => *g,
            SceneForce::Uniform(f) => *f,
        }
    }
}

/// Sum the force list into the per-step accumulated vector.
pub fn accumulate(forces: &[SceneForce]) -> Vec3 {
    forces.iter().map(SceneForce::contribution).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_all_variants() {
        let forces = [
            SceneForce::Gravity(Vec3::new(0.0, -9.8, 0.0)),
            SceneForce::Uniform(Vec3::new(1.0, 0.0, 0.0)),
            SceneForce::Uniform(Vec3::new(-0.5, 0.2, 0.0)),
        ];
        assert_eq!(accumulate(&forces), Vec3::new(0.5, -9.6, 0.0));
    }

    #[test]
    fn empty_list_is_zero() {
        assert_eq!(accumulate(&[]), Vec3::ZERO);
    }
}
