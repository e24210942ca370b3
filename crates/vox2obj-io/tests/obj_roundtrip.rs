use std::io::BufReader;

use proptest::prelude::*;
use vox2obj_geom::Vec3;
use vox2obj_io::{ObjOptions, output_path_for, read_obj_counts, write_obj, write_obj_file};
use vox2obj_mesh::{
    BoxyParams, FaceList, Mesh, QuadMergeParams, WeldParams, build_boxy_mesh, merge_quads, weld,
};
use vox2obj_voxel::{ExteriorMap, OccupancyStrategy, Voxel, VoxelSet, surface_voxels};

fn voxel_mesh(cells: &[(i32, i32, i32)]) -> (Mesh, FaceList) {
    let set: VoxelSet = cells.iter().map(|&(x, y, z)| Voxel::new(x, y, z)).collect();
    let bounds = set.bounds().unwrap();
    let surface = surface_voxels(&set, bounds.dims());
    let occ = OccupancyStrategy::Dense.build(&set, bounds);
    let ext = ExteriorMap::classify(&occ, bounds);
    let mut mesh = build_boxy_mesh(&surface, &occ, &ext, &BoxyParams::default());
    weld(&mut mesh, &WeldParams::default()).unwrap();
    let faces = merge_quads(&mesh, &QuadMergeParams::default());
    (mesh, faces)
}

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("vox2obj-io-{}-{}", tag, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn cube_file_round_trip() {
    let (mesh, faces) = voxel_mesh(&[(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0), (0, 0, 1), (1, 0, 1), (0, 1, 1), (1, 1, 1)]);
    let dir = temp_dir("cube");
    let path = output_path_for(std::path::Path::new("cube.vox"), &dir);
    let written = write_obj_file(&path, &mesh, &faces, &ObjOptions::default()).unwrap();
    assert!(!path.with_extension("obj.tmp").exists());
    let read = read_obj_counts(BufReader::new(std::fs::File::open(&path).unwrap())).unwrap();
    assert_eq!(written, read);
    assert_eq!(read.vertices, 8);
    assert_eq!(read.normals, 8);
    assert_eq!(read.quads, 6);
    assert_eq!(read.triangles, 0);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn failed_write_leaves_no_file() {
    let (mesh, faces) = voxel_mesh(&[(0, 0, 0)]);
    let dir = temp_dir("missing").join("no/such/dir");
    let path = dir.join("x_converted.obj");
    assert!(write_obj_file(&path, &mesh, &faces, &ObjOptions::default()).is_err());
    assert!(!path.exists());
}

#[test]
fn output_is_deterministic() {
    let cells = [(0, 0, 0), (2, 0, 0), (1, 0, 0), (1, 1, 0), (1, 0, -1)];
    let render = || {
        let (mesh, faces) = voxel_mesh(&cells);
        let mut out = Vec::new();
        write_obj(&mut out, &mesh, &faces, &ObjOptions::default()).unwrap();
        out
    };
    assert_eq!(render(), render());
}

proptest! {
    #[test]
    fn counts_survive_round_trip(
        cells in prop::collection::vec((-3..3i32, -3..3i32, -3..3i32), 1..40),
        write_normals in any::<bool>(),
        normal_refs in any::<bool>(),
    ) {
        let (mesh, faces) = voxel_mesh(&cells);
        let opts = ObjOptions { write_normals, normal_refs, object_name: None };
        let mut out = Vec::new();
        let written = write_obj(&mut out, &mesh, &faces, &opts).unwrap();
        let read = read_obj_counts(out.as_slice()).unwrap();
        prop_assert_eq!(written, read);
        prop_assert_eq!(read.vertices, mesh.vertex_count());
        prop_assert_eq!(read.faces(), faces.face_count());
        prop_assert_eq!(read.normals > 0, write_normals);
        prop_assert!(read.quads * 2 + read.triangles == mesh.triangle_count());
    }
}

#[test]
fn translated_vertex_prints_fixed_precision() {
    let mut mesh = Mesh::new();
    mesh.add_vertex(Vec3::new(-0.0000001, 1.5, -2.25));
    let mut out = Vec::new();
    write_obj(&mut out, &mesh, &FaceList::default(), &ObjOptions::default()).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("v 0.000000 1.500000 -2.250000\n"));
}
