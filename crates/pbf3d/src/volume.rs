//! Fluid-volume descriptors and particle seeding.
//!
//! A [`FluidVolume`] is an input owned by the caller: an axis-aligned region,
//! a particle count, and a color. The initializer fills the particle store
//! from an ordered list of volumes, either lattice-packed or uniformly
//! sampled. Overlap between volumes is not validated.

use glam::{Vec3, uvec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::particle::ParticleStore;

/// A region of fluid to seed at initialization.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FluidVolume {
    /// Minimum corner of the region.
    pub min: Vec3,
    /// Maximum corner of the region.
    pub max: Vec3,
    /// Number of particles to place in the region.
    pub particle_count: usize,
    /// RGBA color assigned to every particle of this volume.
    pub color: [f32; 4],
}

impl FluidVolume {
    /// Validate extent and count. `index` is the volume's position in the
    /// input list, reported on failure.
    pub fn validate(&self, index: usize) -> Result<(), SimError> {
        let ext = self.max - self.min;
        if !ext.is_finite() || ext.min_element() <= 0.0 {
            return Err(SimError::DegenerateVolume { index });
        }
        if self.particle_count == 0 {
            return Err(SimError::EmptyVolume { index });
        }
        Ok(())
    }

    /// Per-axis lattice counts whose product covers `particle_count`, with
    /// spacing as uniform as the region's aspect ratio allows.
    fn lattice_dims(&self) -> glam::UVec3 {
        let ext = self.max - self.min;
        let spacing = (ext.x * ext.y * ext.z / self.particle_count as f32).cbrt();
        let mut dims = uvec3(
            (ext.x / spacing).round().max(1.0) as u32,
            (ext.y / spacing).round().max(1.0) as u32,
            (ext.z / spacing).round().max(1.0) as u32,
        );
        // Rounding can undershoot; widen the coarsest axis until the
        // lattice holds every requested particle.
        while (dims.x as usize) * (dims.y as usize) * (dims.z as usize) < self.particle_count {
            let sx = ext.x / dims.x as f32;
            let sy = ext.y / dims.y as f32;
            let sz = ext.z / dims.z as f32;
            if sx >= sy && sx >= sz {
                dims.x += 1;
            } else if sy >= sz {
                dims.y += 1;
            } else {
                dims.z += 1;
            }
        }
        dims
    }

    /// Seed exactly `particle_count` cell-centered lattice positions.
    /// Deterministic: no perturbation.
    pub fn seed_lattice(&self, store: &mut ParticleStore) {
        let dims = self.lattice_dims();
        let step = (self.max - self.min)
            / Vec3::new(dims.x as f32, dims.y as f32, dims.z as f32);
        let mut placed = 0;
        'fill: for k in 0..dims.z {
            for j in 0..dims.y {
                for i in 0..dims.x {
                    if placed == self.particle_count {
                        break 'fill;
                    }
                    let p = self.min
                        + step * Vec3::new(i as f32 + 0.5, j as f32 + 0.5, k as f32 + 0.5);
                    store.push(p, self.color);
                    placed += 1;
                }
            }
        }
    }

    /// Seed `particle_count` positions sampled uniformly in the region.
    pub fn seed_random<R: Rng>(&self, rng: &mut R, store: &mut ParticleStore) {
        for _ in 0..self.particle_count {
            let p = Vec3::new(
                rng.gen_range(self.min.x..self.max.x),
                rng.gen_range(self.min.y..self.max.y),
                rng.gen_range(self.min.z..self.max.z),
            );
            store.push(p, self.color);
        }
    }
}
