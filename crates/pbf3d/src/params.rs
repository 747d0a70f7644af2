//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::SimError;

/// How the initializer places particles inside each fluid volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Cell-centered lattice packing. Deterministic.
    #[default]
    Lattice,
    /// Uniform random sampling inside the volume, driven by
    /// [`FluidParams::seed`] so runs reproduce.
    Random,
}

/// Tunable parameters for a fluid.
///
/// Feature toggles (vorticity, XSPH, artificial pressure) are runtime flags
/// so every combination can be exercised without rebuilding. All fields are
/// duplicated wholesale when a simulation is cloned.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FluidParams {
    /// Per-particle mass.
    pub mass: f32,
    /// Rest density `p0` the constraint drives local density toward.
    pub rest_density: f32,
    /// Smoothing radius `h`; also the grid cell size.
    pub smoothing_radius: f32,
    /// Constraint iterations per step. Fixed, not adaptive.
    pub iterations: usize,
    /// Bucket capacity; particles past this per bucket are dropped from
    /// neighbor consideration for the step.
    pub max_neighbors: usize,
    /// Below this many within-radius neighbors a particle's lambda is
    /// forced to zero (density estimate too sparse to trust).
    pub min_neighbors: usize,
    /// Relaxation epsilon in the lambda denominator.
    pub relaxation_eps: f32,

    /// Enable vorticity confinement.
    pub vorticity_confinement: bool,
    /// Vorticity confinement force scale.
    pub vorticity_eps: f32,

    /// Enable XSPH viscosity smoothing.
    pub xsph_viscosity: bool,
    /// XSPH mixing coefficient `c`.
    pub xsph_c: f32,

    /// Enable the artificial-pressure (tensile correction) term.
    pub artificial_pressure: bool,
    /// Artificial-pressure strength `k`.
    pub ap_strength: f32,
    /// Artificial-pressure reference distance as a fraction `dq` of `h`.
    pub ap_dq: f32,
    /// Artificial-pressure exponent `n`.
    pub ap_exponent: i32,

    /// Particle placement mode at initialization.
    pub placement: Placement,
    /// RNG seed for random placement.
    pub seed: u64,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            mass: constants::PARTICLE_MASS,
            rest_density: constants::REST_DENSITY,
            smoothing_radius: constants::SMOOTHING_RADIUS,
            iterations: constants::SOLVER_ITERATIONS,
            max_neighbors: constants::MAX_NEIGHBORS,
            min_neighbors: constants::MIN_NEIGHBORS,
            relaxation_eps: constants::RELAXATION_EPS,
            vorticity_confinement: true,
            vorticity_eps: constants::VORTICITY_EPS,
            xsph_viscosity: true,
            xsph_c: constants::XSPH_C,
            artificial_pressure: true,
            ap_strength: constants::ART_PRESSURE_K,
            ap_dq: constants::ART_PRESSURE_DQ,
            ap_exponent: constants::ART_PRESSURE_N,
            placement: Placement::Lattice,
            seed: 0,
        }
    }
}

impl FluidParams {
    /// Fail fast on out-of-range scalar parameters.
    pub fn validate(&self) -> Result<(), SimError> {
        fn positive(name: &'static str, value: f32) -> Result<(), SimError> {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SimError::InvalidParameter { name, value });
            }
            Ok(())
        }

        positive("mass", self.mass)?;
        positive("rest_density", self.rest_density)?;
        positive("smoothing_radius", self.smoothing_radius)?;
        positive("relaxation_eps", self.relaxation_eps)?;
        if self.iterations == 0 {
            return Err(SimError::InvalidParameter {
                name: "iterations",
                value: 0.0,
            });
        }
        if self.max_neighbors == 0 {
            return Err(SimError::InvalidParameter {
                name: "max_neighbors",
                value: 0.0,
            });
        }
        if self.artificial_pressure {
            positive("ap_dq", self.ap_dq)?;
            if self.ap_dq >= 1.0 {
                return Err(SimError::InvalidParameter {
                    name: "ap_dq",
                    value: self.ap_dq,
                });
            }
        }
        Ok(())
    }
}
