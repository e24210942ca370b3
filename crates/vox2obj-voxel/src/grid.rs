//! Occupancy lookups over a voxel set: a dense presence grid and a sparse hash fallback.

use hashbrown::HashSet;

use crate::voxel::{BoundingBox, VoxelSet};

const BITS_PER_WORD: usize = 64;
const WORD_INDEX_SHIFT: usize = 6; // log2(64)
const WORD_INDEX_MASK: usize = 63;

/// Fixed-size bitset backed by `u64` words.
#[derive(Clone, Debug)]
pub struct Bitset {
    data: Vec<u64>,
    len: usize,
}

impl Bitset {
    /// Creates a cleared bitset holding `n` bits.
    pub fn new(n: usize) -> Self {
        Self {
            data: vec![0; (n + WORD_INDEX_MASK) / BITS_PER_WORD],
            len: n,
        }
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    #[inline]
    pub fn set(&mut self, i: usize, v: bool) {
        let w = i >> WORD_INDEX_SHIFT;
        let b = i & WORD_INDEX_MASK;
        if v {
            self.data[w] |= 1u64 << b;
        } else {
            self.data[w] &= !(1u64 << b);
        }
    }
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        let w = i >> WORD_INDEX_SHIFT;
        let b = i & WORD_INDEX_MASK;
        (self.data[w] >> b) & 1 != 0
    }
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Answers "is this cell occupied?" for any integer coordinate.
pub trait Occupancy {
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool;
}

/// Dense boolean volume over a bounding box. Cells outside the box read as empty.
#[derive(Clone, Debug)]
pub struct PresenceGrid {
    bounds: BoundingBox,
    sx: usize,
    sy: usize,
    sz: usize,
    bits: Bitset,
}

impl PresenceGrid {
    pub fn new(bounds: BoundingBox) -> Self {
        let (sx, sy, sz) = bounds.dims();
        Self {
            bounds,
            sx,
            sy,
            sz,
            bits: Bitset::new(sx * sy * sz),
        }
    }

    /// Builds a grid covering `bounds`; voxels outside it are dropped.
    pub fn from_voxels(set: &VoxelSet, bounds: BoundingBox) -> Self {
        let mut g = Self::new(bounds);
        for v in set {
            g.set(v.x, v.y, v.z, true);
        }
        g
    }

    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.sx, self.sy, self.sz)
    }

    /// Linear index of a cell, or `None` outside the box.
    #[inline]
    pub fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.bounds.contains((x, y, z)) {
            return None;
        }
        let lx = (x - self.bounds.min.0) as usize;
        let ly = (y - self.bounds.min.1) as usize;
        let lz = (z - self.bounds.min.2) as usize;
        Some((lz * self.sy + ly) * self.sx + lx)
    }

    /// Returns `false` when the cell lies outside the grid.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: i32, v: bool) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.bits.set(i, v);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> bool {
        self.index(x, y, z).is_some_and(|i| self.bits.get(i))
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }
}

impl Occupancy for PresenceGrid {
    #[inline]
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        self.get(x, y, z)
    }
}

/// Hash-keyed occupancy for large sparse models; memory is O(voxels) instead of O(volume).
///
/// Only the occupancy lookup is sparse. The exterior flood fill and the builder's
/// exposed-face flags still keep one bit per cell of the model box (seven bits per
/// cell in total), so peak memory stays proportional to the box volume.
#[derive(Clone, Debug, Default)]
pub struct SparseOccupancy {
    cells: HashSet<(i32, i32, i32)>,
}

impl SparseOccupancy {
    pub fn from_voxels(set: &VoxelSet) -> Self {
        Self {
            cells: set.iter().map(|v| v.coord()).collect(),
        }
    }
}

impl Occupancy for SparseOccupancy {
    #[inline]
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        self.cells.contains(&(x, y, z))
    }
}

/// Selects how occupancy is stored while meshing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OccupancyStrategy {
    #[default]
    Dense,
    Sparse,
}

/// Occupancy built with a chosen strategy.
#[derive(Clone, Debug)]
pub enum AnyOccupancy {
    Dense(PresenceGrid),
    Sparse(SparseOccupancy),
}

impl OccupancyStrategy {
    pub fn build(self, set: &VoxelSet, bounds: BoundingBox) -> AnyOccupancy {
        match self {
            OccupancyStrategy::Dense => AnyOccupancy::Dense(PresenceGrid::from_voxels(set, bounds)),
            OccupancyStrategy::Sparse => AnyOccupancy::Sparse(SparseOccupancy::from_voxels(set)),
        }
    }
}

impl Occupancy for AnyOccupancy {
    #[inline]
    fn is_occupied(&self, x: i32, y: i32, z: i32) -> bool {
        match self {
            AnyOccupancy::Dense(g) => g.is_occupied(x, y, z),
            AnyOccupancy::Sparse(s) => s.is_occupied(x, y, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Voxel;

    #[test]
    fn bitset_set_get_count() {
        let mut b = Bitset::new(130);
        b.set(0, true);
        b.set(64, true);
        b.set(129, true);
        assert!(b.get(0) && b.get(64) && b.get(129));
        assert!(!b.get(1));
        assert_eq!(b.count_ones(), 3);
        b.set(64, false);
        assert_eq!(b.count_ones(), 2);
    }

    #[test]
    fn grid_out_of_bounds_reads_empty() {
        let set: VoxelSet = [Voxel::new(1, 1, 1), Voxel::new(2, 1, 1)].into_iter().collect();
        let g = PresenceGrid::from_voxels(&set, set.bounds().unwrap());
        assert_eq!(g.dims(), (2, 1, 1));
        assert!(g.get(1, 1, 1) && g.get(2, 1, 1));
        assert!(!g.get(0, 1, 1));
        assert!(!g.get(3, 1, 1));
        assert_eq!(g.count(), 2);
    }

    #[test]
    fn strategies_agree() {
        let set: VoxelSet = [Voxel::new(0, 0, 0), Voxel::new(3, -2, 5), Voxel::new(1, 1, 1)]
            .into_iter()
            .collect();
        let b = set.bounds().unwrap();
        let dense = OccupancyStrategy::Dense.build(&set, b);
        let sparse = OccupancyStrategy::Sparse.build(&set, b);
        for x in -1..5 {
            for y in -3..3 {
                for z in -1..7 {
                    assert_eq!(dense.is_occupied(x, y, z), sparse.is_occupied(x, y, z));
                }
            }
        }
    }
}
