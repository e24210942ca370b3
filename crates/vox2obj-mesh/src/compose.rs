//! Placement of meshed submodels into one scene mesh.

use vox2obj_geom::{Mat3, Quat, Vec3};
use vox2obj_voxel::SubModel;

use crate::error::GeometryError;
use crate::mesh::Mesh;

const ORTHONORMAL_TOL: f32 = 1e-3;

/// Which axis of the source coordinate system points up.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum UpAxis {
    /// Source is Z-up; output is rotated to Y-up.
    #[default]
    ZUp,
    YUp,
}

impl UpAxis {
    /// Rotation taking source space to the Y-up output frame.
    pub fn correction(self) -> Quat {
        match self {
            UpAxis::ZUp => Quat::from_axis_angle(Vec3::X, -std::f32::consts::FRAC_PI_2),
            UpAxis::YUp => Quat::IDENTITY,
        }
    }
}

/// Rigid placement of one submodel: `p' = rotation * mirror(p) + translation`.
///
/// Reflections cannot be expressed by a unit quaternion, so a matrix with negative
/// determinant is split into an X mirror applied first and a proper rotation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubModelTransform {
    pub rotation: Quat,
    pub translation: Vec3,
    pub mirror_x: bool,
}

impl Default for SubModelTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SubModelTransform {
    pub const IDENTITY: SubModelTransform = SubModelTransform {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        mirror_x: false,
    };

    /// Builds the transform that maps local voxel space so that `pivot` lands on
    /// `position`, rotated by `rotation` and then by the up-axis correction.
    pub fn from_parts(
        rotation: &Mat3,
        position: Vec3,
        pivot: Vec3,
        up: UpAxis,
    ) -> Result<Self, GeometryError> {
        let det = rotation.determinant();
        if !rotation.is_orthonormal(ORTHONORMAL_TOL) {
            return Err(GeometryError::DegenerateRotation { det });
        }
        let mirror_x = det < 0.0;
        let proper = if mirror_x {
            rotation.with_negated_col(0)
        } else {
            *rotation
        };
        let correction = up.correction();
        let q = (correction * Quat::from_mat3(&proper)).normalized();
        let mut xf = Self {
            rotation: q,
            translation: Vec3::ZERO,
            mirror_x,
        };
        xf.translation = correction.rotate(position) - xf.apply(pivot);
        Ok(xf)
    }

    /// Transform for a submodel; its pivot is the integer center of its dims.
    pub fn from_submodel(model: &SubModel, up: UpAxis) -> Result<Self, GeometryError> {
        let (sx, sy, sz) = model.dims;
        let pivot = Vec3::new((sx / 2) as f32, (sy / 2) as f32, (sz / 2) as f32);
        Self::from_parts(&model.rotation, model.position, pivot, up)
    }

    #[inline]
    fn mirror(&self, v: Vec3) -> Vec3 {
        if self.mirror_x { Vec3::new(-v.x, v.y, v.z) } else { v }
    }

    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(self.mirror(p)) + self.translation
    }

    #[inline]
    pub fn apply_normal(&self, n: Vec3) -> Vec3 {
        self.rotation.rotate(self.mirror(n))
    }
}

/// Appends `part` to `scene` under `xf`. Vertices get fresh ids; nothing is shared
/// or unioned with what `scene` already holds.
pub fn compose(scene: &mut Mesh, part: &Mesh, xf: &SubModelTransform) {
    let base = scene.positions.len() as u32;
    // Normals survive only if both sides carry them.
    let mut normals = match (scene.normals.take(), part.normals.as_ref()) {
        (Some(n), Some(_)) => Some(n),
        (None, Some(_)) if scene.positions.is_empty() => Some(Vec::new()),
        _ => None,
    };
    scene.positions.reserve(part.positions.len());
    scene
        .positions
        .extend(part.positions.iter().map(|&p| xf.apply(p)));
    if let (Some(out), Some(src)) = (normals.as_mut(), part.normals.as_ref()) {
        out.extend(src.iter().map(|&n| xf.apply_normal(n)));
    }
    scene.normals = normals;

    scene.triangles.reserve(part.triangles.len());
    for &[a, b, c] in &part.triangles {
        let tri = if xf.mirror_x {
            [base + a, base + c, base + b]
        } else {
            [base + a, base + b, base + c]
        };
        scene.triangles.push(tri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    fn unit_triangle() -> Mesh {
        let mut m = Mesh::new();
        m.add_vertex(Vec3::ZERO);
        m.add_vertex(Vec3::X);
        m.add_vertex(Vec3::Y);
        m.add_triangle(0, 1, 2).unwrap();
        m
    }

    #[test]
    fn z_up_correction_maps_z_to_y() {
        let q = UpAxis::ZUp.correction();
        assert!(close(q.rotate(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, -2.0)));
        assert!(close(UpAxis::YUp.correction().rotate(Vec3::Z), Vec3::Z));
    }

    #[test]
    fn identity_compose_preserves_geometry() {
        let part = unit_triangle();
        let mut scene = Mesh::new();
        compose(&mut scene, &part, &SubModelTransform::IDENTITY);
        compose(&mut scene, &part, &SubModelTransform::IDENTITY);
        assert_eq!(scene.vertex_count(), 6);
        assert_eq!(scene.triangles, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(scene.positions[4], Vec3::X);
    }

    #[test]
    fn pivot_lands_on_position() {
        let xf = SubModelTransform::from_parts(
            &Mat3::IDENTITY,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            UpAxis::YUp,
        )
        .unwrap();
        assert!(close(xf.apply(Vec3::new(1.0, 1.0, 1.0)), Vec3::new(10.0, 0.0, 0.0)));
        assert!(close(xf.apply(Vec3::ZERO), Vec3::new(9.0, -1.0, -1.0)));
    }

    #[test]
    fn mirrored_rotation_flips_winding_and_keeps_normals_outward() {
        let mirror = Mat3::from_rows([[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let xf = SubModelTransform::from_parts(&mirror, Vec3::ZERO, Vec3::ZERO, UpAxis::YUp).unwrap();
        assert!(xf.mirror_x);
        assert!(close(xf.apply(Vec3::new(2.0, 3.0, 4.0)), Vec3::new(-2.0, 3.0, 4.0)));
        let mut scene = Mesh::new();
        compose(&mut scene, &unit_triangle(), &xf);
        assert_eq!(scene.triangles, vec![[0, 2, 1]]);
        assert!(close(scene.face_normal(0), Vec3::Z));
    }

    #[test]
    fn sheared_matrix_is_rejected() {
        let shear = Mat3::from_rows([[1.0, 0.5, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(
            SubModelTransform::from_parts(&shear, Vec3::ZERO, Vec3::ZERO, UpAxis::ZUp),
            Err(GeometryError::DegenerateRotation { .. })
        ));
    }
}
