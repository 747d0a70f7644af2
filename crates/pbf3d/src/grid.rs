//! Uniform bucket grid for neighbor search.
//!
//! The grid covers the simulation bounding box with cells of side `h` and
//! stores at most `max_per_cell` particle indices per bucket. It is a cache:
//! fully rebuilt from predicted positions every step, with no cross-step
//! identity. Insertion runs in parallel; each particle claims a slot in its
//! bucket with an atomic `fetch_add` on the bucket's occupancy counter, and
//! claims past capacity are silently dropped from neighbor consideration for
//! that step (bounded-work approximation).

use glam::{UVec3, Vec3};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::bounds::BoundingBox;

/// Total cell count, widened before multiplying. A tiny cell size over a
/// large box can exceed `u32::MAX` cells; the product must reach the
/// allocator (fatal) rather than wrap to an undersized grid.
#[inline]
fn cell_count(dims: UVec3) -> usize {
    dims.x as usize * dims.y as usize * dims.z as usize
}

/// Spatial bucket grid over the simulation domain.
pub struct SpatialGrid {
    cell_size: f32,
    origin: Vec3,
    dims: UVec3,
    max_per_cell: usize,
    /// Occupancy counter per bucket. May exceed `max_per_cell` after a
    /// build; readers clamp.
    counts: Vec<AtomicU32>,
    /// `cells * max_per_cell` particle-index slots.
    slots: Vec<AtomicU32>,
    /// Bucket id for each particle (parallel to the particle arrays).
    cell_of: Vec<u32>,
}

impl SpatialGrid {
    /// Allocate a grid covering `bounds` with cells of side `cell_size`.
    ///
    /// Storage is allocated once here; `rebuild` reuses it every step.
    pub fn new(bounds: &BoundingBox, cell_size: f32, max_per_cell: usize) -> Self {
        debug_assert!(cell_size > 0.0);
        debug_assert!(max_per_cell > 0);
        let ext = bounds.extents();
        let dims = UVec3::new(
            (ext.x / cell_size).ceil().max(1.0) as u32,
            (ext.y / cell_size).ceil().max(1.0) as u32,
            (ext.z / cell_size).ceil().max(1.0) as u32,
        );
        let cells = cell_count(dims);
        Self {
            cell_size,
            origin: bounds.min,
            dims,
            max_per_cell,
            counts: (0..cells).map(|_| AtomicU32::new(0)).collect(),
            slots: (0..cells * max_per_cell).map(|_| AtomicU32::new(0)).collect(),
            cell_of: Vec::new(),
        }
    }

    /// Grid dimensions in cells.
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Bucket capacity.
    pub fn max_per_cell(&self) -> usize {
        self.max_per_cell
    }

    /// Bucket coordinate for a position, clamped to the grid extents.
    /// Out-of-box positions map to the boundary bucket, never dropped.
    #[inline]
    pub fn cell_coord(&self, p: Vec3) -> UVec3 {
        let rel = (p - self.origin) / self.cell_size;
        UVec3::new(
            (rel.x.floor().max(0.0) as u32).min(self.dims.x - 1),
            (rel.y.floor().max(0.0) as u32).min(self.dims.y - 1),
            (rel.z.floor().max(0.0) as u32).min(self.dims.z - 1),
        )
    }

    /// Flat bucket id from a coordinate.
    #[inline]
    fn cell_index(&self, c: UVec3) -> u32 {
        c.x + c.y * self.dims.x + c.z * self.dims.x * self.dims.y
    }

    /// Coordinate from a flat bucket id.
    #[inline]
    fn coord_of(&self, id: u32) -> UVec3 {
        UVec3::new(
            id % self.dims.x,
            (id / self.dims.x) % self.dims.y,
            id / (self.dims.x * self.dims.y),
        )
    }

    /// Bucket id the last `rebuild` assigned to `particle`.
    #[inline]
    pub fn bucket_of(&self, particle: usize) -> u32 {
        self.cell_of[particle]
    }

    /// Rebuild the grid from the given positions.
    ///
    /// Clears every occupancy counter before any insertion, inserts all
    /// particles in parallel via atomic slot claims, then sorts each
    /// bucket's occupied slots so neighbor enumeration order (and therefore
    /// floating-point summation order) is reproducible across runs.
    pub fn rebuild(&mut self, positions: &[Vec3]) {
        let n = positions.len();

        self.counts
            .par_iter()
            .for_each(|c| c.store(0, Ordering::Relaxed));

        // Bucket ids first; each write is particle-local.
        let mut cell_of = std::mem::take(&mut self.cell_of);
        cell_of.resize(n, 0);
        cell_of
            .par_iter_mut()
            .zip(positions.par_iter())
            .for_each(|(cell, &p)| {
                *cell = self.cell_index(self.cell_coord(p));
            });

        // Parallel insertion with atomic slot claims.
        let counts = &self.counts;
        let slots = &self.slots;
        let max = self.max_per_cell;
        (0..n).into_par_iter().for_each(|i| {
            let cell = cell_of[i] as usize;
            let slot = counts[cell].fetch_add(1, Ordering::Relaxed) as usize;
            if slot < max {
                slots[cell * max + slot].store(i as u32, Ordering::Relaxed);
            }
        });
        self.cell_of = cell_of;

        // Stable slot order per bucket for deterministic iteration.
        self.slots
            .par_chunks_mut(max)
            .zip(self.counts.par_iter())
            .for_each(|(bucket, count)| {
                let occupied = (count.load(Ordering::Relaxed) as usize).min(max);
                if occupied > 1 {
                    let mut ids: Vec<u32> = bucket[..occupied]
                        .iter()
                        .map(|s| s.load(Ordering::Relaxed))
                        .collect();
                    ids.sort_unstable();
                    for (slot, id) in bucket[..occupied].iter().zip(ids) {
                        slot.store(id, Ordering::Relaxed);
                    }
                }
            });
    }

    /// Visit every particle index stored in the 3x3x3 block of buckets
    /// centered on `bucket` (self included). Read-only; safe to call from
    /// any number of threads once the build for the step is complete. Cost
    /// is bounded by `27 * max_per_cell`.
    #[inline]
    pub fn for_each_neighbor<F: FnMut(usize)>(&self, bucket: u32, mut f: F) {
        let center = self.coord_of(bucket);
        for dz in -1i32..=1 {
            let z = center.z as i32 + dz;
            if z < 0 || z >= self.dims.z as i32 {
                continue;
            }
            for dy in -1i32..=1 {
                let y = center.y as i32 + dy;
                if y < 0 || y >= self.dims.y as i32 {
                    continue;
                }
                for dx in -1i32..=1 {
                    let x = center.x as i32 + dx;
                    if x < 0 || x >= self.dims.x as i32 {
                        continue;
                    }
                    let cell =
                        self.cell_index(UVec3::new(x as u32, y as u32, z as u32)) as usize;
                    let occupied =
                        (self.counts[cell].load(Ordering::Relaxed) as usize).min(self.max_per_cell);
                    for s in 0..occupied {
                        f(self.slots[cell * self.max_per_cell + s].load(Ordering::Relaxed) as usize);
                    }
                }
            }
        }
    }

    /// Collect the neighbor candidates of `particle` into a vec.
    pub fn neighbors_of(&self, particle: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_neighbor(self.bucket_of(particle), |j| out.push(j));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> BoundingBox {
        BoundingBox::new(Vec3::ZERO, Vec3::splat(1.0)).unwrap()
    }

    #[test]
    fn build_and_query_finds_close_particles() {
        let mut grid = SpatialGrid::new(&unit_bounds(), 0.1, 8);
        let positions = vec![
            Vec3::new(0.45, 0.45, 0.45),
            Vec3::new(0.48, 0.45, 0.45), // same cell
            Vec3::new(0.52, 0.45, 0.45), // adjacent cell
            Vec3::new(0.95, 0.95, 0.95), // far away
        ];
        grid.rebuild(&positions);

        let neighbors = grid.neighbors_of(0);
        assert!(neighbors.contains(&0), "query includes self");
        assert!(neighbors.contains(&1));
        assert!(neighbors.contains(&2));
        assert!(!neighbors.contains(&3));
    }

    #[test]
    fn query_is_symmetric() {
        let mut grid = SpatialGrid::new(&unit_bounds(), 0.1, 8);
        let positions = vec![Vec3::new(0.395, 0.5, 0.5), Vec3::new(0.405, 0.5, 0.5)];
        grid.rebuild(&positions);
        assert!(grid.neighbors_of(0).contains(&1));
        assert!(grid.neighbors_of(1).contains(&0));
    }

    #[test]
    fn out_of_box_positions_clamp_to_boundary_bucket() {
        let mut grid = SpatialGrid::new(&unit_bounds(), 0.1, 8);
        let positions = vec![Vec3::new(-5.0, 0.5, 0.5), Vec3::new(0.05, 0.5, 0.5)];
        grid.rebuild(&positions);
        // The escaped particle lands in the x = 0 boundary bucket and is
        // still visible to its in-box neighbor.
        assert!(grid.neighbors_of(1).contains(&0));
    }

    #[test]
    fn bucket_overflow_drops_silently() {
        let mut grid = SpatialGrid::new(&unit_bounds(), 0.5, 2);
        // Five particles hash to the same bucket; capacity is two.
        let positions = vec![Vec3::splat(0.25); 5];
        grid.rebuild(&positions);
        let neighbors = grid.neighbors_of(0);
        assert_eq!(neighbors.len(), 2, "only max_per_cell entries survive");
        // Every surviving index is valid.
        assert!(neighbors.iter().all(|&j| j < 5));
    }

    #[test]
    fn rebuild_clears_previous_step() {
        let mut grid = SpatialGrid::new(&unit_bounds(), 0.1, 8);
        grid.rebuild(&[Vec3::splat(0.45), Vec3::splat(0.46)]);
        assert_eq!(grid.neighbors_of(0).len(), 2);

        // Second build with one distant particle: no stale entries.
        grid.rebuild(&[Vec3::splat(0.95)]);
        let neighbors = grid.neighbors_of(0);
        assert_eq!(neighbors, vec![0]);
    }

    #[test]
    fn cell_count_does_not_wrap_on_huge_grids() {
        // h = 1e-4 over a 2 m box: 20000^3 cells, far past u32::MAX.
        let dims = UVec3::new(20_000, 20_000, 20_000);
        assert_eq!(cell_count(dims), 8_000_000_000_000);
        assert!(cell_count(dims) > u32::MAX as usize);
    }

    #[test]
    fn bucket_order_is_sorted() {
        let mut grid = SpatialGrid::new(&unit_bounds(), 0.5, 16);
        let positions = vec![Vec3::splat(0.25); 9];
        grid.rebuild(&positions);
        let neighbors = grid.neighbors_of(0);
        let mut sorted = neighbors.clone();
        sorted.sort_unstable();
        assert_eq!(neighbors, sorted);
    }
}
