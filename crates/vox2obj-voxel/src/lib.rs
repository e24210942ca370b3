//! Voxel sets, occupancy grids, surface filtering and exterior classification.
#![forbid(unsafe_code)]

pub mod exterior;
pub mod grid;
pub mod model;
pub mod surface;
pub mod voxel;

pub use exterior::ExteriorMap;
pub use grid::{AnyOccupancy, Bitset, Occupancy, OccupancyStrategy, PresenceGrid, SparseOccupancy};
pub use model::{InputError, ModelSource, SubModel};
pub use surface::surface_voxels;
pub use voxel::{BoundingBox, Voxel, VoxelSet};

/// The six axis-aligned neighbor offsets, in `Face` index order (+Y, -Y, +X, -X, +Z, -Z).
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
    (0, 1, 0),
    (0, -1, 0),
    (1, 0, 0),
    (-1, 0, 0),
    (0, 0, 1),
    (0, 0, -1),
];
