//! 3D Position-Based Fluids
//!
//! A data-parallel implementation of position-based fluids: particles
//! predict forward under external forces, then an iterative density
//! constraint projects the predicted positions back toward the rest
//! density, with optional vorticity confinement and XSPH velocity
//! smoothing as post passes.
//!
//! # Example
//!
//! ```
//! use pbf3d::{BoundingBox, FluidParams, FluidSim3D, FluidVolume};
//! use glam::Vec3;
//!
//! let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(2.0)).unwrap();
//! let volume = FluidVolume {
//!     min: Vec3::new(0.5, 0.0, 0.5),
//!     max: Vec3::new(1.5, 1.0, 1.5),
//!     particle_count: 1000,
//!     color: [0.1, 0.4, 0.9, 1.0],
//! };
//! let mut sim = FluidSim3D::new(&[volume], bounds, FluidParams::default()).unwrap();
//!
//! // Run a few frames of free fall under gravity.
//! for _ in 0..10 {
//!     sim.step(Vec3::new(0.0, -9.8, 0.0), 1.0 / 60.0);
//! }
//! assert_eq!(sim.particle_count(), 1000);
//! ```

pub mod bounds;
pub mod constants;
pub mod error;
pub mod forces;
pub mod grid;
pub mod kernels;
pub mod params;
pub mod particle;
pub mod post;
pub mod solver;
pub mod vertex;
pub mod volume;

pub use bounds::BoundingBox;
pub use error::SimError;
pub use forces::SceneForce;
pub use glam::Vec3;
pub use grid::SpatialGrid;
pub use kernels::SmoothingKernels;
pub use params::{FluidParams, Placement};
pub use particle::ParticleStore;
pub use vertex::{ColorMode, ParticleVertex};
pub use volume::FluidVolume;

use rand::{rngs::StdRng, SeedableRng};

/// A position-based fluid simulation over a fixed set of particles.
///
/// Particle count, bounds, and parameters are fixed at construction; the
/// only per-step inputs are the accumulated external force and `dt`.
pub struct FluidSim3D {
    /// Per-particle state arrays.
    pub particles: ParticleStore,
    /// Neighbor-search grid, rebuilt from predicted positions every step.
    grid: SpatialGrid,
    /// The box all particles are confined to.
    pub bounds: BoundingBox,
    /// Solver parameters.
    pub params: FluidParams,
    /// How vertices are colored by [`FluidSim3D::fill_vertices`].
    pub color_mode: ColorMode,

    kernels: SmoothingKernels,

    /// Current simulation frame.
    pub frame: u32,
}

impl FluidSim3D {
    /// Build a simulation from an ordered list of fluid volumes.
    ///
    /// Validates parameters, bounds, and every volume before allocating, and
    /// seeds particles per [`FluidParams::placement`]. Volume order is
    /// particle-index order, so runs with the same inputs are identical.
    pub fn new(
        volumes: &[FluidVolume],
        bounds: BoundingBox,
        params: FluidParams,
    ) -> Result<Self, SimError> {
        params.validate()?;
        bounds.validate()?;
        for (index, vol) in volumes.iter().enumerate() {
            vol.validate(index)?;
        }
        let total: usize = volumes.iter().map(|v| v.particle_count).sum();
        if total == 0 {
            return Err(SimError::NoParticles);
        }

        let mut particles = ParticleStore::with_capacity(total);
        match params.placement {
            Placement::Lattice => {
                for vol in volumes {
                    vol.seed_lattice(&mut particles);
                }
            }
            Placement::Random => {
                let mut rng = StdRng::seed_from_u64(params.seed);
                for vol in volumes {
                    vol.seed_random(&mut rng, &mut particles);
                }
            }
        }
        debug_assert_eq!(particles.len(), total);

        let grid = SpatialGrid::new(&bounds, params.smoothing_radius, params.max_neighbors);
        log::info!(
            "fluid sim: {} particles in {} volumes, grid {:?}",
            total,
            volumes.len(),
            grid.dims()
        );

        Ok(Self {
            particles,
            grid,
            bounds,
            kernels: SmoothingKernels::new(params.smoothing_radius),
            params,
            color_mode: ColorMode::default(),
            frame: 0,
        })
    }

    /// Advance the simulation by `dt` under the accumulated external force
    /// (a mass-normalized acceleration, e.g. gravity).
    pub fn step(&mut self, external_force: Vec3, dt: f32) {
        debug_assert!(dt.is_finite() && dt > 0.0, "bad dt: {}", dt);
        if !(dt.is_finite() && dt > 0.0) || self.particles.is_empty() {
            return;
        }

        // 1. Predict: integrate forces, clamp the prediction into the box.
        self.predict(external_force, dt);

        // 2. Rebuild the neighbor grid from predicted positions.
        self.grid.rebuild(&self.particles.predicted);

        // 3. Iterative density-constraint projection.
        solver::project_density(
            &mut self.particles,
            &self.grid,
            &self.kernels,
            &self.params,
            &self.bounds,
        );

        // 4. Velocities from corrected positions, then optional post passes.
        post::update_velocities(&mut self.particles, &self.bounds, dt);
        if self.params.vorticity_confinement {
            post::vorticity_confinement(
                &mut self.particles,
                &self.grid,
                &self.kernels,
                &self.params,
                dt,
            );
        }
        if self.params.xsph_viscosity {
            post::xsph_viscosity(&mut self.particles, &self.grid, &self.kernels, &self.params);
        }
        post::finalize_positions(&mut self.particles);

        self.frame += 1;
    }

    /// [`FluidSim3D::step`] with a force list instead of a pre-summed vector.
    pub fn step_with_forces(&mut self, scene_forces: &[SceneForce], dt: f32) {
        self.step(forces::accumulate(scene_forces), dt);
    }

    fn predict(&mut self, force: Vec3, dt: f32) {
        use rayon::prelude::*;
        let bounds = self.bounds;
        self.particles
            .velocity
            .par_iter_mut()
            .zip(self.particles.position.par_iter())
            .zip(self.particles.predicted.par_iter_mut())
            .for_each(|((vel, &pos), pred)| {
                *vel += force * dt;
                *pred = bounds.clamp(pos + *vel * dt);
            });
    }

    /// Total particle count.
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Fill `out` with render vertices for the current positions, colored
    /// per [`FluidSim3D::color_mode`].
    pub fn fill_vertices(&self, out: &mut Vec<ParticleVertex>) {
        vertex::fill_vertex_buffer(&self.particles, &self.bounds, self.color_mode, out);
    }
}

// The grid holds atomics and no cross-step state, so a clone gets a fresh
// one; everything else is duplicated wholesale.
impl Clone for FluidSim3D {
    fn clone(&self) -> Self {
        Self {
            particles: self.particles.clone(),
            grid: SpatialGrid::new(
                &self.bounds,
                self.params.smoothing_radius,
                self.params.max_neighbors,
            ),
            bounds: self.bounds,
            params: self.params,
            color_mode: self.color_mode,
            kernels: self.kernels,
            frame: self.frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_sim() -> FluidSim3D {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(1.0)).unwrap();
        let volume = FluidVolume {
            min: Vec3::new(0.3, 0.3, 0.3),
            max: Vec3::new(0.7, 0.7, 0.7),
            particle_count: 64,
            color: [0.1, 0.4, 0.9, 1.0],
        };
        FluidSim3D::new(&[volume], bounds, FluidParams::default()).unwrap()
    }

    #[test]
    fn construction_validates_inputs() {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::ONE).unwrap();
        assert_eq!(
            FluidSim3D::new(&[], bounds, FluidParams::default()).err(),
            Some(SimError::NoParticles)
        );

        let bad_volume = FluidVolume {
            min: Vec3::ONE,
            max: Vec3::ZERO,
            particle_count: 10,
            color: [1.0; 4],
        };
        assert_eq!(
            FluidSim3D::new(&[bad_volume], bounds, FluidParams::default()).err(),
            Some(SimError::DegenerateVolume { index: 0 })
        );

        let mut params = FluidParams::default();
        params.mass = f32::NAN;
        let volume = FluidVolume {
            min: Vec3::ZERO,
            max: Vec3::ONE,
            particle_count: 10,
            color: [1.0; 4],
        };
        assert!(matches!(
            FluidSim3D::new(&[volume], bounds, params),
            Err(SimError::InvalidParameter { name: "mass", .. })
        ));
    }

    #[test]
    fn volumes_seed_in_order_with_their_colors() {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(2.0)).unwrap();
        let red = FluidVolume {
            min: Vec3::ZERO,
            max: Vec3::ONE,
            particle_count: 8,
            color: [1.0, 0.0, 0.0, 1.0],
        };
        let blue = FluidVolume {
            min: Vec3::ONE,
            max: Vec3::splat(2.0),
            particle_count: 27,
            color: [0.0, 0.0, 1.0, 1.0],
        };
        let sim = FluidSim3D::new(&[red, blue], bounds, FluidParams::default()).unwrap();
        assert_eq!(sim.particle_count(), 35);
        assert_eq!(sim.particles.color[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(sim.particles.color[34], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn step_keeps_particles_inside_bounds() {
        let mut sim = small_sim();
        for _ in 0..30 {
            sim.step(Vec3::new(0.0, -9.8, 0.0), 1.0 / 60.0);
        }
        assert_eq!(sim.frame, 30);
        for &p in &sim.particles.position {
            assert!(sim.bounds.contains(p), "{p:?} escaped");
            assert!(p.is_finite());
        }
    }

    #[test]
    fn degenerate_dt_is_a_no_op_in_release() {
        let mut sim = small_sim();
        let before = sim.particles.position.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sim.step(Vec3::ZERO, 0.0);
        }));
        if result.is_ok() {
            // Release build: the step returns without touching state.
            assert_eq!(sim.particles.position, before);
            assert_eq!(sim.frame, 0);
        }
    }

    #[test]
    fn clone_diverges_independently() {
        let mut sim = small_sim();
        sim.step(Vec3::new(0.0, -9.8, 0.0), 1.0 / 60.0);
        let mut copy = sim.clone();
        assert_eq!(copy.frame, sim.frame);
        assert_eq!(copy.particles.position, sim.particles.position);

        copy.step(Vec3::new(0.0, -9.8, 0.0), 1.0 / 60.0);
        assert_eq!(sim.frame, 1);
        assert_eq!(copy.frame, 2);
        assert_ne!(copy.particles.position, sim.particles.position);
    }

    #[test]
    fn force_list_matches_presummed_force() {
        let mut a = small_sim();
        let mut b = small_sim();
        let gravity = Vec3::new(0.0, -9.8, 0.0);
        let wind = Vec3::new(0.5, 0.0, 0.0);
        a.step(gravity + wind, 1.0 / 60.0);
        b.step_with_forces(
            &[SceneForce::Gravity(gravity), SceneForce::Uniform(wind)],
            1.0 / 60.0,
        );
        assert_eq!(a.particles.position, b.particles.position);
    }
}
