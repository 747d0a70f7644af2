//! SPH smoothing kernels (poly6 and spiky gradient, 3D).
//!
//! Poly6 is used for density and velocity-smoothing weights; the spiky
//! kernel supplies gradients that do not vanish at short range. Coefficients
//! are precomputed once so the hot loops avoid `powi` on `h`.

use glam::Vec3;
use std::f32::consts::PI;

/// Precomputed kernel coefficients for a fixed smoothing radius `h`.
#[derive(Clone, Copy, Debug)]
pub struct SmoothingKernels {
    h: f32,
    h2: f32,
    poly6_coeff: f32,      // 315 / (64 * pi * h^9)
    spiky_grad_coeff: f32, // -45 / (pi * h^6)
}

impl SmoothingKernels {
    /// Build kernels for smoothing radius `h` (`h > 0`).
    pub fn new(h: f32) -> Self {
        debug_assert!(h > 0.0, "smoothing radius must be positive, got {}", h);
        Self {
            h,
            h2: h * h,
            poly6_coeff: 315.0 / (64.0 * PI * h.powi(9)),
            spiky_grad_coeff: -45.0 / (PI * h.powi(6)),
        }
    }

    /// Smoothing radius.
    pub fn radius(&self) -> f32 {
        self.h
    }

    /// Squared smoothing radius.
    pub fn radius_sq(&self) -> f32 {
        self.h2
    }

    /// Poly6 kernel W(r, h) from the squared distance `r2`.
    /// Zero at and beyond `h`, smooth at the boundary.
    #[inline]
    pub fn poly6(&self, r2: f32) -> f32 {
        if r2 >= self.h2 {
            return 0.0;
        }
        let term = self.h2 - r2;
        self.poly6_coeff * term * term * term
    }

    /// Spiky kernel gradient for the offset `r_vec` with length `r`.
    ///
    /// Points along `r_vec` (toward the evaluation particle for the
    /// conventional negative coefficient). Guarded to zero at `r = 0` where
    /// the direction is undefined, and beyond `h`.
    #[inline]
    pub fn spiky_gradient(&self, r_vec: Vec3, r: f32) -> Vec3 {
        if r >= self.h || r <= 1e-6 {
            return Vec3::ZERO;
        }
        let term = self.h - r;
        r_vec * (self.spiky_grad_coeff * term * term / r)
    }
}
