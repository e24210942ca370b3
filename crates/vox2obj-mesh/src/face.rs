use vox2obj_geom::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

/// Unit-cube corners per face, counter-clockwise seen from outside so that
/// `(c1 - c0) x (c2 - c0)` points along the face normal. Triangles are `(0,1,2)` and `(0,2,3)`.
const FACE_CORNERS: [[(u8, u8, u8); 4]; 6] = [
    [(0, 1, 0), (0, 1, 1), (1, 1, 1), (1, 1, 0)], // +Y
    [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)], // -Y
    [(1, 0, 0), (1, 1, 0), (1, 1, 1), (1, 0, 1)], // +X
    [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)], // -X
    [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)], // +Z
    [(0, 0, 0), (0, 1, 0), (1, 1, 0), (1, 0, 0)], // -Z
];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Axis index (0 = X, 1 = Y, 2 = Z) the face looks along.
    #[inline]
    pub fn normal_axis(self) -> usize {
        match self {
            Face::PosX | Face::NegX => 0,
            Face::PosY | Face::NegY => 1,
            Face::PosZ | Face::NegZ => 2,
        }
    }

    /// In-plane `(u, v)` axes used when sweeping a slice of this face direction.
    #[inline]
    pub fn plane_axes(self) -> (usize, usize) {
        match self {
            Face::PosX | Face::NegX => (2, 1),
            Face::PosY | Face::NegY => (0, 2),
            Face::PosZ | Face::NegZ => (0, 1),
        }
    }

    /// Lattice corners of a face rectangle anchored at cell `origin` and spanning `extent`
    /// cells per axis (the normal-axis extent is 1), in outward winding order.
    pub fn rect_corners(self, origin: [i32; 3], extent: [i32; 3]) -> [[i32; 3]; 4] {
        FACE_CORNERS[self.index()].map(|(cx, cy, cz)| {
            [
                origin[0] + cx as i32 * extent[0],
                origin[1] + cy as i32 * extent[1],
                origin[2] + cz as i32 * extent[2],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_winding_points_outward() {
        for f in Face::ALL {
            let c = f
                .rect_corners([0; 3], [1; 3])
                .map(|[x, y, z]| Vec3::new(x as f32, y as f32, z as f32));
            for tri in [[0, 1, 2], [0, 2, 3]] {
                let n = (c[tri[1]] - c[tri[0]]).cross(c[tri[2]] - c[tri[0]]);
                assert!(n.normalized().dot(f.normal()) > 0.999, "{f:?}");
            }
            // every corner sits on the face's plane
            let axis = f.normal_axis();
            let on_plane = if f.normal().to_array()[axis] > 0.0 { 1.0 } else { 0.0 };
            assert!(c.iter().all(|p| p.to_array()[axis] == on_plane), "{f:?}");
        }
    }

    #[test]
    fn plane_axes_exclude_normal() {
        for f in Face::ALL {
            let (u, v) = f.plane_axes();
            assert_ne!(u, v);
            assert_ne!(u, f.normal_axis());
            assert_ne!(v, f.normal_axis());
        }
    }
}
