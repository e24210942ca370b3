use vox2obj_geom::Vec3;
use vox2obj_mesh::{FaceList, Mesh, QuadMergeParams, merge_quads};

fn mesh_from(points: &[Vec3], tris: &[[u32; 3]]) -> Mesh {
    let mut m = Mesh::new();
    for &p in points {
        m.add_vertex(p);
    }
    for &[a, b, c] in tris {
        m.add_triangle(a, b, c).unwrap();
    }
    m
}

#[test]
fn square_pair_merges_into_one_quad() {
    let m = mesh_from(
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        &[[0, 1, 2], [0, 2, 3]],
    );
    let faces = merge_quads(&m, &QuadMergeParams::default());
    assert_eq!(faces.quads.len(), 1);
    assert!(faces.triangles.is_empty());
    let mut ids = faces.quads[0].vertices;
    ids.sort_unstable();
    assert_eq!(ids, [0, 1, 2, 3]);
}

#[test]
fn t_junction_never_merges() {
    // Vertex 4 splits the diagonal on one side only.
    let m = mesh_from(
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ],
        &[[0, 1, 2], [0, 4, 3], [4, 2, 3]],
    );
    let faces = merge_quads(&m, &QuadMergeParams::default());
    assert!(faces.quads.is_empty());
    assert_eq!(faces.triangles.len(), 3);
}

#[test]
fn folded_pair_never_merges() {
    let m = mesh_from(
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.5),
        ],
        &[[0, 1, 2], [0, 2, 3]],
    );
    let faces = merge_quads(&m, &QuadMergeParams::default());
    assert!(faces.quads.is_empty());
    assert_eq!(faces.triangles.len(), 2);
}

#[test]
fn triangles_only_keeps_everything() {
    let m = mesh_from(
        &[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        &[[0, 1, 2], [0, 2, 3]],
    );
    let faces = FaceList::triangles_only(&m);
    assert_eq!(faces.face_count(), 2);
    assert_eq!(faces.triangles, m.triangles);
}
