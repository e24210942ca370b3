use proptest::prelude::*;
use vox2obj_voxel::{
    BoundingBox, ExteriorMap, NEIGHBOR_OFFSETS, OccupancyStrategy, Voxel, VoxelSet, surface_voxels,
};

const N: i32 = 6;

fn arb_set() -> impl Strategy<Value = VoxelSet> {
    prop::collection::vec((0..N, 0..N, 0..N), 0..150)
        .prop_map(|cells| cells.into_iter().map(|(x, y, z)| Voxel::new(x, y, z)).collect())
}

fn in_dims(x: i32, y: i32, z: i32) -> bool {
    (0..N).contains(&x) && (0..N).contains(&y) && (0..N).contains(&z)
}

proptest! {
    // Output is a subset; a voxel is dropped iff all six neighbors are occupied
    #[test]
    fn surface_filter_subset_and_iff(set in arb_set()) {
        let dims = (N as usize, N as usize, N as usize);
        let out = surface_voxels(&set, dims);
        for v in out.iter() {
            prop_assert!(set.contains(v.x, v.y, v.z));
        }
        for v in set.iter() {
            let buried = NEIGHBOR_OFFSETS.iter().all(|&(dx, dy, dz)| {
                let (x, y, z) = (v.x + dx, v.y + dy, v.z + dz);
                in_dims(x, y, z) && set.contains(x, y, z)
            });
            prop_assert_eq!(out.contains(v.x, v.y, v.z), !buried);
        }
    }

    // Exterior classification does not depend on the occupancy strategy
    #[test]
    fn exterior_strategy_independent(set in arb_set()) {
        prop_assume!(!set.is_empty());
        let b = set.bounds().unwrap();
        let dense = OccupancyStrategy::Dense.build(&set, b);
        let sparse = OccupancyStrategy::Sparse.build(&set, b);
        let a = ExteriorMap::classify(&dense, b);
        let c = ExteriorMap::classify(&sparse, b);
        let e = b.expanded(1);
        for z in e.min.2..=e.max.2 {
            for y in e.min.1..=e.max.1 {
                for x in e.min.0..=e.max.0 {
                    prop_assert_eq!(a.is_external(x, y, z), c.is_external(x, y, z));
                    if set.contains(x, y, z) {
                        prop_assert!(!a.is_external(x, y, z));
                    }
                }
            }
        }
        prop_assert_eq!(a.enclosed_void_count(), c.enclosed_void_count());
    }
}

#[test]
fn expanded_box_shell_is_external() {
    let set: VoxelSet = [Voxel::new(0, 0, 0)].into_iter().collect();
    let b = BoundingBox::new((0, 0, 0), (0, 0, 0));
    let occ = OccupancyStrategy::Dense.build(&set, b);
    let ext = ExteriorMap::classify(&occ, b);
    assert_eq!(ext.bounds(), b.expanded(1));
    for &(dx, dy, dz) in &NEIGHBOR_OFFSETS {
        assert!(ext.is_external(dx, dy, dz));
    }
    assert!(!ext.is_external(0, 0, 0));
}
