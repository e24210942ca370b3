use crate::NEIGHBOR_OFFSETS;
use crate::grid::PresenceGrid;
use crate::voxel::{BoundingBox, VoxelSet};

/// Keeps the voxels that have at least one of their six neighbors empty or outside
/// `[0, dims)`. Voxels outside `dims` cannot be enclosed and are always kept.
pub fn surface_voxels(set: &VoxelSet, dims: (usize, usize, usize)) -> VoxelSet {
    let bounds = BoundingBox::from_dims(dims);
    let grid = PresenceGrid::from_voxels(set, bounds);
    let mut out = VoxelSet::with_capacity(set.len() / 2);
    let mut outside = 0usize;
    for v in set {
        if !bounds.contains(v.coord()) {
            outside += 1;
            out.insert(*v);
            continue;
        }
        let buried = NEIGHBOR_OFFSETS
            .iter()
            .all(|&(dx, dy, dz)| grid.get(v.x + dx, v.y + dy, v.z + dz));
        if !buried {
            out.insert(*v);
        }
    }
    if outside > 0 {
        log::debug!("{} voxel(s) lie outside model dims {:?}", outside, dims);
    }
    out
}
