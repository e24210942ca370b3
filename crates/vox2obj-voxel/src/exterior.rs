//! Flood-fill classification of empty space into exterior and enclosed voids.

use std::collections::VecDeque;

use crate::NEIGHBOR_OFFSETS;
use crate::grid::{Bitset, Occupancy};
use crate::voxel::BoundingBox;

/// Cells reachable from outside a model without crossing an occupied cell.
///
/// The search box is the model box grown by one cell on every side, so the outer
/// shell is always empty and the fill wraps around the whole model. Cells outside
/// the search box are exterior by definition.
#[derive(Clone, Debug)]
pub struct ExteriorMap {
    bounds: BoundingBox,
    sx: usize,
    sy: usize,
    reached: Bitset,
    void_cells: usize,
}

impl ExteriorMap {
    /// Breadth-first fill from the expanded box's minimum corner.
    pub fn classify(occ: &impl Occupancy, model_bounds: BoundingBox) -> Self {
        let bounds = model_bounds.expanded(1);
        let (sx, sy, sz) = bounds.dims();
        let mut reached = Bitset::new(sx * sy * sz);
        let idx = |x: i32, y: i32, z: i32| -> usize {
            let lx = (x - bounds.min.0) as usize;
            let ly = (y - bounds.min.1) as usize;
            let lz = (z - bounds.min.2) as usize;
            (lz * sy + ly) * sx + lx
        };

        let mut queue: VecDeque<(i32, i32, i32)> = VecDeque::new();
        let start = bounds.min;
        reached.set(idx(start.0, start.1, start.2), true);
        queue.push_back(start);
        let mut occupied_cells = 0usize;
        while let Some((x, y, z)) = queue.pop_front() {
            for &(dx, dy, dz) in &NEIGHBOR_OFFSETS {
                let n = (x + dx, y + dy, z + dz);
                if !bounds.contains(n) {
                    continue;
                }
                let i = idx(n.0, n.1, n.2);
                if reached.get(i) || occ.is_occupied(n.0, n.1, n.2) {
                    continue;
                }
                reached.set(i, true);
                queue.push_back(n);
            }
        }

        for z in bounds.min.2..=bounds.max.2 {
            for y in bounds.min.1..=bounds.max.1 {
                for x in bounds.min.0..=bounds.max.0 {
                    if occ.is_occupied(x, y, z) {
                        occupied_cells += 1;
                    }
                }
            }
        }
        let void_cells = sx * sy * sz - reached.count_ones() - occupied_cells;
        Self {
            bounds,
            sx,
            sy,
            reached,
            void_cells,
        }
    }

    /// True for reached cells and for anything outside the search box.
    #[inline]
    pub fn is_external(&self, x: i32, y: i32, z: i32) -> bool {
        if !self.bounds.contains((x, y, z)) {
            return true;
        }
        let lx = (x - self.bounds.min.0) as usize;
        let ly = (y - self.bounds.min.1) as usize;
        let lz = (z - self.bounds.min.2) as usize;
        self.reached.get((lz * self.sy + ly) * self.sx + lx)
    }

    /// Empty cells the fill could not reach.
    #[inline]
    pub fn enclosed_void_count(&self) -> usize {
        self.void_cells
    }

    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}
