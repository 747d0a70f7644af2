//! Default tuning constants for the PBF solver.
//!
//! These are the defaults baked into [`crate::FluidParams::default`]; every
//! one of them is a runtime field on `FluidParams`, so scenes can override
//! them without rebuilding.

/// Default constraint-solver iterations per step.
pub const SOLVER_ITERATIONS: usize = 4;

/// Relaxation epsilon added to the lambda denominator (CFM term).
/// Prevents blow-up when the constraint-gradient sum is near zero.
pub const RELAXATION_EPS: f32 = 0.01;

/// Maximum particles stored per grid bucket. Claims past this are dropped
/// from neighbor consideration for the step (bounded-work approximation).
pub const MAX_NEIGHBORS: usize = 20;

/// Minimum within-radius neighbors required to trust the density estimate.
/// Sparser particles get lambda = 0.
pub const MIN_NEIGHBORS: usize = 3;

/// Vorticity-confinement force scale.
pub const VORTICITY_EPS: f32 = 1e-4;

/// XSPH viscosity mixing coefficient.
pub const XSPH_C: f32 = 1e-4;

/// Artificial-pressure strength `k`.
pub const ART_PRESSURE_K: f32 = 0.1;

/// Artificial-pressure exponent `n`.
pub const ART_PRESSURE_N: i32 = 4;

/// Artificial-pressure reference distance as a fraction of `h`.
pub const ART_PRESSURE_DQ: f32 = 0.3;

/// Default per-particle mass.
pub const PARTICLE_MASS: f32 = 1.0;

/// Default rest density. Matches a block of unit-mass particles packed at
/// roughly half the smoothing radius.
pub const REST_DENSITY: f32 = 6378.0;

/// Default smoothing radius (and grid cell size).
pub const SMOOTHING_RADIUS: f32 = 0.1;
