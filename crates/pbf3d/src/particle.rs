//! Struct-of-arrays particle storage.
//!
//! All arrays are parallel: index `i` across every array refers to the same
//! particle. The arena is sized once at initialization and never reallocated
//! mid-step, so phase passes can borrow individual fields independently.

use glam::Vec3;

/// Per-particle state for the PBF solver.
#[derive(Clone, Debug, Default)]
pub struct ParticleStore {
    /// Authoritative position at the start/end of a step.
    pub position: Vec<Vec3>,
    /// Working position during constraint iterations.
    pub predicted: Vec<Vec3>,
    /// Velocity.
    pub velocity: Vec<Vec3>,
    /// Correction accumulated within a solver iteration; rewritten each
    /// iteration.
    pub displacement: Vec<Vec3>,
    /// Curl estimate used by vorticity confinement.
    pub vorticity: Vec<Vec3>,
    /// SPH density estimate at the predicted position.
    pub density: Vec<f32>,
    /// Density-constraint Lagrange multiplier.
    pub lambda: Vec<f32>,
    /// RGBA visualization color; no simulation effect.
    pub color: Vec<[f32; 4]>,
}

impl ParticleStore {
    /// Create an empty store with capacity for `n` particles.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            position: Vec::with_capacity(n),
            predicted: Vec::with_capacity(n),
            velocity: Vec::with_capacity(n),
            displacement: Vec::with_capacity(n),
            vorticity: Vec::with_capacity(n),
            density: Vec::with_capacity(n),
            lambda: Vec::with_capacity(n),
            color: Vec::with_capacity(n),
        }
    }

    /// Append a resting particle at `position` with the given color.
    pub fn push(&mut self, position: Vec3, color: [f32; 4]) {
        self.position.push(position);
        self.predicted.push(position);
        self.velocity.push(Vec3::ZERO);
        self.displacement.push(Vec3::ZERO);
        self.vorticity.push(Vec3::ZERO);
        self.density.push(0.0);
        self.lambda.push(0.0);
        self.color.push(color);
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// True when no particles are stored.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Check the parallel-array invariant. Cheap; used by debug assertions
    /// at phase boundaries.
    pub fn arrays_consistent(&self) -> bool {
        let n = self.position.len();
        self.predicted.len() == n
            && self.velocity.len() == n
            && self.displacement.len() == n
            && self.vorticity.len() == n
            && self.density.len() == n
            && self.lambda.len() == n
            && self.color.len() == n
    }
}
