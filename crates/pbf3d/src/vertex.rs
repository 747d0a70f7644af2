//! Render-facing vertex output.
//!
//! The renderer is an external collaborator: it receives a flat buffer of
//! position + color per particle, in particle-index order, ready for direct
//! upload. `ParticleVertex` is `Pod`, so the buffer casts to `&[u8]` or
//! `&[f32]` with bytemuck.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::particle::ParticleStore;

/// One particle's vertex data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    /// World position.
    pub position: [f32; 3],
    /// RGBA color.
    pub color: [f32; 4],
}

/// How particle colors are produced for rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Per-volume colors assigned at initialization.
    #[default]
    Volume,
    /// Shade by normalized height inside the bounding box.
    Depth,
}

/// Fill `out` with one vertex per particle, in index order.
///
/// `out` is cleared first; its allocation is reused across frames.
pub fn fill_vertex_buffer(
    store: &ParticleStore,
    bounds: &BoundingBox,
    mode: ColorMode,
    out: &mut Vec<ParticleVertex>,
) {
    out.clear();
    out.reserve(store.len());
    let inv_height = 1.0 / bounds.extents().y;
    for i in 0..store.len() {
        let p = store.position[i];
        let color = match mode {
            ColorMode::Volume => store.color[i],
            ColorMode::Depth => {
                let t = ((p.y - bounds.min.y) * inv_height).clamp(0.0, 1.0);
                [t, t, 1.0, 1.0]
            }
        };
        out.push(ParticleVertex {
            position: p.to_array(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn test_store() -> (ParticleStore, BoundingBox) {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(2.0)).unwrap();
        let mut store = ParticleStore::with_capacity(2);
        store.push(Vec3::new(0.5, 0.0, 0.5), [1.0, 0.0, 0.0, 1.0]);
        store.push(Vec3::new(0.5, 2.0, 0.5), [0.0, 1.0, 0.0, 1.0]);
        (store, bounds)
    }

    #[test]
    fn volume_mode_preserves_particle_colors_and_order() {
        let (store, bounds) = test_store();
        let mut out = Vec::new();
        fill_vertex_buffer(&store, &bounds, ColorMode::Volume, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(out[1].position, [0.5, 2.0, 0.5]);
    }

    #[test]
    fn depth_mode_shades_by_height() {
        let (store, bounds) = test_store();
        let mut out = Vec::new();
        fill_vertex_buffer(&store, &bounds, ColorMode::Depth, &mut out);
        assert_eq!(out[0].color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(out[1].color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn vertices_cast_to_raw_floats() {
        let (store, bounds) = test_store();
        let mut out = Vec::new();
        fill_vertex_buffer(&store, &bounds, ColorMode::Volume, &mut out);
        let floats: &[f32] = bytemuck::cast_slice(&out);
        assert_eq!(floats.len(), 2 * 7);
        assert_eq!(floats[0], 0.5);
    }
}
