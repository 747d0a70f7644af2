//! Post-correction pass: velocity update, vorticity confinement, XSPH.
//!
//! Runs after the constraint iterations, on the same grid build. Constraint
//! projection damps rotational motion; vorticity confinement feeds a little
//! of it back. XSPH blends neighbor velocities for coherent, non-diffusive
//! smoothing. Both are optional at runtime.

use glam::Vec3;
use rayon::prelude::*;

use crate::bounds::BoundingBox;
use crate::grid::SpatialGrid;
use crate::kernels::SmoothingKernels;
use crate::params::FluidParams;
use crate::particle::ParticleStore;

/// Threshold below which the vorticity-gradient direction is undefined.
const GRAD_LEN_EPS: f32 = 1e-10;

/// Derive velocities from the corrected positions:
/// `v = (predicted - position) / dt`.
///
/// Particles resting on a wall get the outward component of their velocity
/// zeroed so they do not tunnel on the next prediction.
pub fn update_velocities(particles: &mut ParticleStore, bounds: &BoundingBox, dt: f32) {
    let inv_dt = 1.0 / dt;
    let min = bounds.min;
    let max = bounds.max;
    particles
        .velocity
        .par_iter_mut()
        .zip(particles.position.par_iter())
        .zip(particles.predicted.par_iter())
        .for_each(|((vel, &pos), &pred)| {
            let mut v = (pred - pos) * inv_dt;
            if (pred.x <= min.x && v.x < 0.0) || (pred.x >= max.x && v.x > 0.0) {
                v.x = 0.0;
            }
            if (pred.y <= min.y && v.y < 0.0) || (pred.y >= max.y && v.y > 0.0) {
                v.y = 0.0;
            }
            if (pred.z <= min.z && v.z < 0.0) || (pred.z >= max.z && v.z > 0.0) {
                v.z = 0.0;
            }
            *vel = v;
        });
}

/// Vorticity confinement: estimate the curl at each particle, then push
/// along `N x omega` where `N` is the normalized gradient of `|omega|`.
pub fn vorticity_confinement(
    particles: &mut ParticleStore,
    grid: &SpatialGrid,
    kernels: &SmoothingKernels,
    params: &FluidParams,
    dt: f32,
) {
    let n = particles.len();
    let h2 = kernels.radius_sq();

    // Pass A: curl estimate from committed velocities.
    let positions = &particles.predicted;
    let velocities = &particles.velocity;
    let omegas: Vec<Vec3> = (0..n)
        .into_par_iter()
        .map(|i| {
            let p_i = positions[i];
            let v_i = velocities[i];
            let mut omega = Vec3::ZERO;
            grid.for_each_neighbor(grid.bucket_of(i), |j| {
                if j == i {
                    return;
                }
                let r_vec = p_i - positions[j];
                let r2 = r_vec.length_squared();
                if r2 < h2 {
                    let grad = kernels.spiky_gradient(r_vec, r2.sqrt());
                    omega += (velocities[j] - v_i).cross(grad);
                }
            });
            omega
        })
        .collect();

    particles
        .vorticity
        .par_iter_mut()
        .zip(omegas.par_iter())
        .for_each(|(w, &omega)| *w = omega);

    // Pass B: confinement force along the gradient of |omega|.
    let vorticity = &particles.vorticity;
    let forces: Vec<Vec3> = (0..n)
        .into_par_iter()
        .map(|i| {
            let p_i = positions[i];
            let omega_i = vorticity[i];
            let mut grad_mag = Vec3::ZERO;
            grid.for_each_neighbor(grid.bucket_of(i), |j| {
                if j == i {
                    return;
                }
                let r_vec = p_i - positions[j];
                let r2 = r_vec.length_squared();
                if r2 < h2 {
                    let grad = kernels.spiky_gradient(r_vec, r2.sqrt());
                    grad_mag += grad * (vorticity[j].length() - omega_i.length());
                }
            });
            let len_sq = grad_mag.length_squared();
            if len_sq <= GRAD_LEN_EPS {
                return Vec3::ZERO;
            }
            let n_hat = grad_mag / len_sq.sqrt();
            n_hat.cross(omega_i) * params.vorticity_eps
        })
        .collect();

    particles
        .velocity
        .par_iter_mut()
        .zip(forces.par_iter())
        .for_each(|(v, &f)| *v += f * dt);
}

/// XSPH viscosity: `v_i += c * sum_j (v_j - v_i) * W_poly6(r)`.
pub fn xsph_viscosity(
    particles: &mut ParticleStore,
    grid: &SpatialGrid,
    kernels: &SmoothingKernels,
    params: &FluidParams,
) {
    let n = particles.len();
    let h2 = kernels.radius_sq();
    let positions = &particles.predicted;
    let velocities = &particles.velocity;

    let corrections: Vec<Vec3> = (0..n)
        .into_par_iter()
        .map(|i| {
            let p_i = positions[i];
            let v_i = velocities[i];
            let mut dv = Vec3::ZERO;
            grid.for_each_neighbor(grid.bucket_of(i), |j| {
                if j == i {
                    return;
                }
                let r_vec = p_i - positions[j];
                let r2 = r_vec.length_squared();
                if r2 < h2 {
                    dv += (velocities[j] - v_i) * kernels.poly6(r2);
                }
            });
            dv * params.xsph_c
        })
        .collect();

    particles
        .velocity
        .par_iter_mut()
        .zip(corrections.par_iter())
        .for_each(|(v, &dv)| *v += dv);
}

/// Commit the corrected positions: `position = predicted`.
pub fn finalize_positions(particles: &mut ParticleStore) {
    particles
        .position
        .par_iter_mut()
        .zip(particles.predicted.par_iter())
        .for_each(|(pos, &pred)| *pos = pred);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;

    fn setup(positions: &[Vec3]) -> (ParticleStore, SpatialGrid, SmoothingKernels, FluidParams, BoundingBox) {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(1.0)).unwrap();
        let params = FluidParams::default();
        let kernels = SmoothingKernels::new(params.smoothing_radius);
        let mut store = ParticleStore::with_capacity(positions.len());
        for &p in positions {
            store.push(p, [1.0; 4]);
        }
        let mut grid = SpatialGrid::new(&bounds, params.smoothing_radius, params.max_neighbors);
        grid.rebuild(&store.predicted);
        (store, grid, kernels, params, bounds)
    }

    #[test]
    fn velocity_from_position_delta() {
        let (mut store, _, _, _, bounds) = setup(&[Vec3::splat(0.5)]);
        store.predicted[0] = Vec3::new(0.5, 0.56, 0.5);
        update_velocities(&mut store, &bounds, 0.1);
        assert!((store.velocity[0] - Vec3::new(0.0, 0.6, 0.0)).length() < 1e-5);
    }

    #[test]
    fn wall_contact_zeroes_outward_velocity() {
        let (mut store, _, _, _, bounds) = setup(&[Vec3::new(0.5, 0.2, 0.5)]);
        // Clamped onto the floor while still moving down.
        store.predicted[0] = Vec3::new(0.5, 0.0, 0.5);
        update_velocities(&mut store, &bounds, 1.0 / 60.0);
        assert_eq!(store.velocity[0].y, 0.0);
        // Inward motion at a wall is untouched.
        store.position[0] = Vec3::new(0.5, 0.0, 0.5);
        store.predicted[0] = Vec3::new(0.5, 0.1, 0.5);
        update_velocities(&mut store, &bounds, 1.0 / 60.0);
        assert!(store.velocity[0].y > 0.0);
    }

    #[test]
    fn xsph_pulls_neighbor_velocities_together() {
        let (mut store, grid, kernels, params, _) =
            setup(&[Vec3::new(0.48, 0.5, 0.5), Vec3::new(0.52, 0.5, 0.5)]);
        store.velocity[0] = Vec3::new(1.0, 0.0, 0.0);
        store.velocity[1] = Vec3::new(-1.0, 0.0, 0.0);
        xsph_viscosity(&mut store, &grid, &kernels, &params);
        assert!(store.velocity[0].x < 1.0);
        assert!(store.velocity[1].x > -1.0);
        // Smoothing is symmetric: momentum preserved.
        let total = store.velocity[0] + store.velocity[1];
        assert!(total.length() < 1e-5, "{total:?}");
    }

    #[test]
    fn shear_flow_has_nonzero_curl() {
        // Velocity varying with y around the center particle.
        let (mut store, grid, kernels, params, _) = setup(&[
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.5, 0.55, 0.5),
            Vec3::new(0.5, 0.45, 0.5),
        ]);
        store.velocity[1] = Vec3::new(1.0, 0.0, 0.0);
        store.velocity[2] = Vec3::new(-1.0, 0.0, 0.0);
        vorticity_confinement(&mut store, &grid, &kernels, &params, 1.0 / 60.0);
        assert!(
            store.vorticity[0].length() > 0.0,
            "curl estimate should see the shear"
        );
        for v in &store.velocity {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn uniform_flow_is_left_alone() {
        let (mut store, grid, kernels, params, _) =
            setup(&[Vec3::new(0.48, 0.5, 0.5), Vec3::new(0.52, 0.5, 0.5)]);
        store.velocity[0] = Vec3::new(0.3, 0.0, 0.0);
        store.velocity[1] = Vec3::new(0.3, 0.0, 0.0);
        vorticity_confinement(&mut store, &grid, &kernels, &params, 1.0 / 60.0);
        assert_eq!(store.vorticity[0], Vec3::ZERO);
        assert_eq!(store.velocity[0], Vec3::new(0.3, 0.0, 0.0));
        xsph_viscosity(&mut store, &grid, &kernels, &params);
        assert_eq!(store.velocity[0], Vec3::new(0.3, 0.0, 0.0));
    }

    #[test]
    fn finalize_commits_predicted() {
        let (mut store, _, _, _, _) = setup(&[Vec3::splat(0.5)]);
        store.predicted[0] = Vec3::new(0.1, 0.2, 0.3);
        finalize_positions(&mut store);
        assert_eq!(store.position[0], Vec3::new(0.1, 0.2, 0.3));
    }
}
