//! Iterative density-constraint projection.
//!
//! Each solver iteration runs two data-parallel passes over the particles:
//! a density/lambda pass and a displacement pass. Every pass reads a
//! snapshot of the previous pass's committed state and writes through a
//! map/collect barrier, so no particle ever observes another particle's
//! half-updated values from the same pass.

use glam::Vec3;
use rayon::prelude::*;

use crate::bounds::BoundingBox;
use crate::grid::SpatialGrid;
use crate::kernels::SmoothingKernels;
use crate::params::FluidParams;
use crate::particle::ParticleStore;

/// Run `params.iterations` constraint iterations over predicted positions.
///
/// The iteration count is fixed; there is no convergence check. Particles
/// with no within-radius neighbor skip the constraint entirely (density 0,
/// lambda 0, displacement 0). Predicted positions are clamped into `bounds`
/// after every applied correction.
pub fn project_density(
    particles: &mut ParticleStore,
    grid: &SpatialGrid,
    kernels: &SmoothingKernels,
    params: &FluidParams,
    bounds: &BoundingBox,
) {
    debug_assert!(particles.arrays_consistent());
    let n = particles.len();
    let h2 = kernels.radius_sq();
    let inv_p0 = 1.0 / params.rest_density;
    // Reference kernel value for the artificial-pressure ratio.
    let w_dq = kernels.poly6((params.ap_dq * kernels.radius()).powi(2));

    for _ in 0..params.iterations {
        // Pass 1: density and lambda from the committed predicted positions.
        let predicted = &particles.predicted;
        let field: Vec<(f32, f32)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let p_i = predicted[i];
                let mut density = 0.0;
                let mut grad_i = Vec3::ZERO;
                let mut sum_grad_sq = 0.0;
                let mut neighbors = 0usize;

                grid.for_each_neighbor(grid.bucket_of(i), |j| {
                    let r_vec = p_i - predicted[j];
                    let r2 = r_vec.length_squared();
                    if r2 < h2 {
                        density += params.mass * kernels.poly6(r2);
                        if j != i {
                            neighbors += 1;
                            let grad = kernels.spiky_gradient(r_vec, r2.sqrt()) * inv_p0;
                            sum_grad_sq += grad.length_squared();
                            grad_i += grad;
                        }
                    }
                });

                if neighbors == 0 {
                    // Near-vacuum: nothing to estimate, nothing to correct.
                    return (0.0, 0.0);
                }

                let c = density * inv_p0 - 1.0;
                // Under-dense neighborhoods (c <= 0) take lambda = 0:
                // projection opposes compression but adds no tensile pull.
                // Sparse neighborhoods are not trusted either.
                let lambda = if c <= 0.0 || neighbors < params.min_neighbors {
                    0.0
                } else {
                    sum_grad_sq += grad_i.length_squared();
                    -c / (sum_grad_sq + params.relaxation_eps)
                };
                (density, lambda)
            })
            .collect();

        particles
            .density
            .par_iter_mut()
            .zip(particles.lambda.par_iter_mut())
            .zip(field.par_iter())
            .for_each(|((d, l), &(density, lambda))| {
                *d = density;
                *l = lambda;
            });

        // Pass 2: position corrections from the committed lambdas.
        let predicted = &particles.predicted;
        let lambdas = &particles.lambda;
        let deltas: Vec<Vec3> = (0..n)
            .into_par_iter()
            .map(|i| {
                let p_i = predicted[i];
                let lambda_i = lambdas[i];
                let mut delta = Vec3::ZERO;

                grid.for_each_neighbor(grid.bucket_of(i), |j| {
                    if j == i {
                        return;
                    }
                    let r_vec = p_i - predicted[j];
                    let r2 = r_vec.length_squared();
                    if r2 < h2 {
                        let s_corr = if params.artificial_pressure {
                            -params.ap_strength
                                * (kernels.poly6(r2) / w_dq).powi(params.ap_exponent)
                        } else {
                            0.0
                        };
                        delta += kernels.spiky_gradient(r_vec, r2.sqrt())
                            * (lambda_i + lambdas[j] + s_corr);
                    }
                });

                delta * inv_p0
            })
            .collect();

        // Apply corrections, then keep every particle inside the box.
        particles
            .displacement
            .par_iter_mut()
            .zip(particles.predicted.par_iter_mut())
            .zip(deltas.par_iter())
            .for_each(|((disp, pred), &delta)| {
                *disp = delta;
                *pred = bounds.clamp(*pred + delta);
            });
    }
}
