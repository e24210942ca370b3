use hashbrown::HashMap;
use vox2obj_geom::{Aabb, Vec3};

use crate::error::GeometryError;

pub type VertexId = u32;

/// Indexed triangle mesh. Vertex ids are positions in `positions`; `normals`, when
/// present, runs parallel to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub triangles: Vec<[VertexId; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Appends a vertex and returns its id. Any stored normals are dropped.
    pub fn add_vertex(&mut self, p: Vec3) -> VertexId {
        self.normals = None;
        let id = self.positions.len() as VertexId;
        self.positions.push(p);
        id
    }

    /// Appends a triangle after checking that it names three distinct existing vertices.
    pub fn add_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) -> Result<usize, GeometryError> {
        if a == b || b == c || a == c {
            return Err(GeometryError::DegenerateTriangle(a, b, c));
        }
        let len = self.positions.len();
        if let Some(&v) = [a, b, c].iter().find(|&&v| v as usize >= len) {
            return Err(GeometryError::DanglingVertex {
                triangle: self.triangles.len(),
                vertex: v,
                len,
            });
        }
        self.triangles.push([a, b, c]);
        Ok(self.triangles.len() - 1)
    }

    /// First triangle naming a vertex id that does not exist.
    pub fn check_references(&self) -> Result<(), GeometryError> {
        let len = self.positions.len();
        for (t, tri) in self.triangles.iter().enumerate() {
            if let Some(&v) = tri.iter().find(|&&v| v as usize >= len) {
                return Err(GeometryError::DanglingVertex { triangle: t, vertex: v, len });
            }
        }
        Ok(())
    }

    /// Unnormalized face normal; its length is twice the triangle area.
    #[inline]
    pub fn face_normal_weighted(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.triangles[t];
        let pa = self.positions[a as usize];
        let pb = self.positions[b as usize];
        let pc = self.positions[c as usize];
        (pb - pa).cross(pc - pa)
    }

    #[inline]
    pub fn face_normal(&self, t: usize) -> Vec3 {
        self.face_normal_weighted(t).normalized()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}

/// Position-keyed vertex deduplication. Keys are positions quantized to `1 / quantum`,
/// so points closer than the quantum collapse onto the first id seen.
#[derive(Debug)]
pub struct VertexCache {
    inv_quantum: f32,
    ids: HashMap<(i64, i64, i64), VertexId>,
}

impl VertexCache {
    pub const DEFAULT_QUANTUM: f32 = 1e-4;

    pub fn new(quantum: f32) -> Self {
        Self {
            inv_quantum: 1.0 / quantum,
            ids: HashMap::new(),
        }
    }

    #[inline]
    fn key(&self, p: Vec3) -> (i64, i64, i64) {
        (
            (p.x * self.inv_quantum).round() as i64,
            (p.y * self.inv_quantum).round() as i64,
            (p.z * self.inv_quantum).round() as i64,
        )
    }

    /// Returns the id of a vertex at `p`, adding it to `mesh` on first sight.
    pub fn get_or_insert(&mut self, mesh: &mut Mesh, p: Vec3) -> VertexId {
        let key = self.key(p);
        *self.ids.entry(key).or_insert_with(|| mesh.add_vertex(p))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for VertexCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUANTUM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_triangle_rejects_bad_ids() {
        let mut m = Mesh::new();
        let a = m.add_vertex(Vec3::ZERO);
        let b = m.add_vertex(Vec3::X);
        assert_eq!(m.add_triangle(a, b, a), Err(GeometryError::DegenerateTriangle(0, 1, 0)));
        assert!(matches!(
            m.add_triangle(a, b, 7),
            Err(GeometryError::DanglingVertex { vertex: 7, len: 2, .. })
        ));
        let c = m.add_vertex(Vec3::Y);
        assert_eq!(m.add_triangle(a, b, c), Ok(0));
        assert!(m.check_references().is_ok());
        assert!((m.face_normal(0) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn vertex_cache_merges_within_quantum() {
        let mut m = Mesh::new();
        let mut cache = VertexCache::default();
        let a = cache.get_or_insert(&mut m, Vec3::new(1.0, 2.0, 3.0));
        let b = cache.get_or_insert(&mut m, Vec3::new(1.00001, 2.0, 3.0));
        let c = cache.get_or_insert(&mut m, Vec3::new(1.1, 2.0, 3.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(m.vertex_count(), 2);
        assert_eq!(cache.len(), 2);
    }
}
