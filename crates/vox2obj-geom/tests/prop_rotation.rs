use proptest::prelude::*;
use vox2obj_geom::{Mat3, Quat, Vec3};

fn vapprox(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps && (a.z - b.z).abs() <= eps
}

fn unit_axis() -> impl Strategy<Value = Vec3> {
    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
        .prop_filter("non-zero axis", |(x, y, z)| x * x + y * y + z * z > 1e-2)
        .prop_map(|(x, y, z)| Vec3::new(x, y, z).normalized())
}

fn small_vec3() -> impl Strategy<Value = Vec3> {
    (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

// Matrix whose columns are the rotated basis vectors.
fn mat_of(q: Quat) -> Mat3 {
    let cx = q.rotate(Vec3::X);
    let cy = q.rotate(Vec3::Y);
    let cz = q.rotate(Vec3::Z);
    Mat3::from_rows([[cx.x, cy.x, cz.x], [cx.y, cy.y, cz.y], [cx.z, cy.z, cz.z]])
}

proptest! {
    // Rotation preserves length
    #[test]
    fn rotate_preserves_length(axis in unit_axis(), angle in -6.3f32..6.3, v in small_vec3()) {
        let q = Quat::from_axis_angle(axis, angle);
        let r = q.rotate(v);
        prop_assert!((r.length() - v.length()).abs() <= 1e-3 * v.length().max(1.0));
    }

    // Matrix -> quaternion reproduces the matrix action across every trace branch
    #[test]
    fn from_mat3_matches_matrix(axis in unit_axis(), angle in -6.3f32..6.3, v in small_vec3()) {
        let m = mat_of(Quat::from_axis_angle(axis, angle));
        let q = Quat::from_mat3(&m);
        prop_assert!((q.length() - 1.0).abs() < 1e-4);
        prop_assert!(vapprox(q.rotate(v), m.mul_vec3(v), 1e-2));
    }

    // Hamilton product composes rotations right-to-left
    #[test]
    fn product_composes(a in unit_axis(), b in unit_axis(), ta in -3.1f32..3.1, tb in -3.1f32..3.1, v in small_vec3()) {
        let qa = Quat::from_axis_angle(a, ta);
        let qb = Quat::from_axis_angle(b, tb);
        prop_assert!(vapprox((qa * qb).rotate(v), qa.rotate(qb.rotate(v)), 1e-2));
    }
}

#[test]
fn from_mat3_all_axis_aligned_rotations() {
    // Every signed permutation matrix with det +1 (the 24 cube rotations).
    let perms = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let sample = Vec3::new(1.0, 2.0, 3.0);
    let mut seen = 0;
    for p in perms {
        for signs in 0..8u32 {
            let mut m = [[0.0f32; 3]; 3];
            for r in 0..3 {
                m[r][p[r]] = if signs & (1 << r) != 0 { -1.0 } else { 1.0 };
            }
            let mat = Mat3::from_rows(m);
            if mat.determinant() < 0.0 {
                continue;
            }
            seen += 1;
            let q = Quat::from_mat3(&mat);
            assert!(vapprox(q.rotate(sample), mat.mul_vec3(sample), 1e-5), "{mat:?}");
        }
    }
    assert_eq!(seen, 24);
}
