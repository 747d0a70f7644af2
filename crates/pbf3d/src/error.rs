//! Configuration-error taxonomy.
//!
//! All of these are fail-fast: they are reported from constructors before any
//! particle or grid storage is allocated. Capacity conditions (bucket
//! overflow) and numerical edge cases are handled inline by the solver and
//! are deliberately *not* errors.

use glam::Vec3;

/// Errors detected while validating simulation configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The volume list produced zero particles in total.
    NoParticles,
    /// Bounding box with non-positive extent on some axis.
    DegenerateBounds {
        /// Minimum corner as given.
        min: Vec3,
        /// Maximum corner as given.
        max: Vec3,
    },
    /// A fluid volume with non-positive extent on some axis.
    DegenerateVolume {
        /// Index of the offending volume in the input list.
        index: usize,
    },
    /// A fluid volume requesting zero particles.
    EmptyVolume {
        /// Index of the offending volume in the input list.
        index: usize,
    },
    /// A scalar solver parameter outside its valid range.
    InvalidParameter {
        /// Field name on [`crate::FluidParams`].
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::NoParticles => {
                write!(f, "fluid volumes produced zero particles")
            }
            SimError::DegenerateBounds { min, max } => {
                write!(f, "degenerate bounding box: min {min:?}, max {max:?}")
            }
            SimError::DegenerateVolume { index } => {
                write!(f, "fluid volume {index} has non-positive extent")
            }
            SimError::EmptyVolume { index } => {
                write!(f, "fluid volume {index} requests zero particles")
            }
            SimError::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {name} = {value}")
            }
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let err = SimError::InvalidParameter {
            name: "smoothing_radius",
            value: -1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("smoothing_radius"), "got: {msg}");
        assert!(msg.contains("-1"), "got: {msg}");
    }
}
