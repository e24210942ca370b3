//! Re-fuses edge-adjacent coplanar triangle pairs into quads for compact output.

use hashbrown::HashMap;
use vox2obj_geom::Vec3;

use crate::mesh::{Mesh, VertexId};

#[derive(Copy, Clone, Debug)]
pub struct QuadMergeParams {
    /// Max `|cos|` of any corner angle; `cos(81 deg)` accepts corners within 81..99 degrees.
    pub angle_tolerance: f32,
    /// Min dot product of the two unit face normals.
    pub coplanar_cos: f32,
    /// Edges shorter than this make the candidate degenerate.
    pub min_edge: f32,
}

impl Default for QuadMergeParams {
    fn default() -> Self {
        Self {
            angle_tolerance: 0.1564,
            coplanar_cos: 0.9999,
            min_edge: 1e-6,
        }
    }
}

/// Four corners in counter-clockwise order about the first source triangle's normal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quad {
    pub vertices: [VertexId; 4],
    /// Indices of the two source triangles in the mesh.
    pub source: [usize; 2],
}

/// Export-time face list: merged quads plus every triangle that was not consumed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceList {
    pub quads: Vec<Quad>,
    pub triangles: Vec<[VertexId; 3]>,
}

impl FaceList {
    /// All triangles pass through unmerged.
    pub fn triangles_only(mesh: &Mesh) -> Self {
        Self {
            quads: Vec::new(),
            triangles: mesh.triangles.clone(),
        }
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.quads.len() + self.triangles.len()
    }
}

#[inline]
fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Undirected edge -> incident triangles. Edges with three or more triangles are
/// non-manifold and never offer a partner.
struct EdgeIndex {
    map: HashMap<(VertexId, VertexId), ([usize; 2], u32)>,
}

impl EdgeIndex {
    fn build(triangles: &[[VertexId; 3]]) -> Self {
        let mut map: HashMap<(VertexId, VertexId), ([usize; 2], u32)> =
            HashMap::with_capacity(triangles.len() * 3 / 2);
        for (t, tri) in triangles.iter().enumerate() {
            for e in 0..3 {
                let slot = map
                    .entry(edge_key(tri[e], tri[(e + 1) % 3]))
                    .or_insert(([usize::MAX; 2], 0));
                if (slot.1 as usize) < 2 {
                    slot.0[slot.1 as usize] = t;
                }
                slot.1 += 1;
            }
        }
        Self { map }
    }

    fn partner(&self, a: VertexId, b: VertexId, t: usize) -> Option<usize> {
        let (tris, count) = self.map.get(&edge_key(a, b))?;
        if *count != 2 {
            return None;
        }
        if tris[0] == t {
            Some(tris[1])
        } else if tris[1] == t {
            Some(tris[0])
        } else {
            None
        }
    }
}

#[inline]
fn has_directed_edge(tri: &[VertexId; 3], a: VertexId, b: VertexId) -> bool {
    (0..3).any(|e| tri[e] == a && tri[(e + 1) % 3] == b)
}

#[inline]
fn tip(tri: &[VertexId; 3], a: VertexId, b: VertexId) -> Option<VertexId> {
    let mut rest = tri.iter().copied().filter(|&v| v != a && v != b);
    let t = rest.next()?;
    if rest.next().is_some() { None } else { Some(t) }
}

/// Tangent frame `(t1, t2)` with `t1 x t2` along `n`. The helper axis is the first of
/// Y, X, Z that is not nearly parallel to `n`.
fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let mut t1 = Vec3::ZERO;
    for axis in [Vec3::Y, Vec3::X, Vec3::Z] {
        t1 = n.cross(axis);
        if t1.length() > 0.1 {
            break;
        }
    }
    let t1 = t1.normalized();
    (t1, n.cross(t1).normalized())
}

fn try_merge(mesh: &Mesh, t: usize, u: usize, a: VertexId, b: VertexId, params: &QuadMergeParams) -> Option<Quad> {
    let tri_t = &mesh.triangles[t];
    let tri_u = &mesh.triangles[u];
    // T walks a->b, so a consistently wound partner walks b->a
    if !has_directed_edge(tri_u, b, a) {
        return None;
    }
    let tip_t = tip(tri_t, a, b)?;
    let tip_u = tip(tri_u, a, b)?;
    let ids = [a, b, tip_t, tip_u];
    for i in 0..4 {
        for j in i + 1..4 {
            if ids[i] == ids[j] {
                return None;
            }
        }
    }

    let n_raw = mesh.face_normal_weighted(t);
    let m_raw = mesh.face_normal_weighted(u);
    if n_raw.length() <= f32::EPSILON || m_raw.length() <= f32::EPSILON {
        return None;
    }
    let n = n_raw.normalized();
    if n.dot(m_raw.normalized()) < params.coplanar_cos {
        return None;
    }

    let pos = ids.map(|v| mesh.positions[v as usize]);
    let centroid = (pos[0] + pos[1] + pos[2] + pos[3]) / 4.0;
    let (t1, t2) = tangent_frame(n);
    let mut order = [0usize, 1, 2, 3];
    let angle = |i: usize| {
        let d = pos[i] - centroid;
        d.dot(t2).atan2(d.dot(t1))
    };
    order.sort_by(|&i, &j| angle(i).total_cmp(&angle(j)));

    for k in 0..4 {
        let prev = pos[order[(k + 3) % 4]];
        let here = pos[order[k]];
        let next = pos[order[(k + 1) % 4]];
        let e1 = prev - here;
        let e2 = next - here;
        if e1.length() < params.min_edge || e2.length() < params.min_edge {
            return None;
        }
        if e1.normalized().dot(e2.normalized()).abs() > params.angle_tolerance {
            return None;
        }
    }

    Some(Quad {
        vertices: order.map(|i| ids[i]),
        source: [t, u],
    })
}

/// Single greedy pass over the triangles in order. Each triangle pairs with the first
/// unconsumed edge neighbor that forms a near-rectangular coplanar quad; everything
/// else passes through as a triangle.
pub fn merge_quads(mesh: &Mesh, params: &QuadMergeParams) -> FaceList {
    let tris = &mesh.triangles;
    let index = EdgeIndex::build(tris);
    let mut consumed = vec![false; tris.len()];
    let mut quads = Vec::with_capacity(tris.len() / 2);
    for t in 0..tris.len() {
        if consumed[t] {
            continue;
        }
        for e in 0..3 {
            let (a, b) = (tris[t][e], tris[t][(e + 1) % 3]);
            let Some(u) = index.partner(a, b, t) else {
                continue;
            };
            if consumed[u] {
                continue;
            }
            if let Some(q) = try_merge(mesh, t, u, a, b, params) {
                consumed[t] = true;
                consumed[u] = true;
                quads.push(q);
                break;
            }
        }
    }
    let triangles: Vec<[VertexId; 3]> = tris
        .iter()
        .zip(&consumed)
        .filter(|(_, c)| !**c)
        .map(|(tri, _)| *tri)
        .collect();
    log::debug!(
        target: "quads",
        "{} triangles -> {} quads + {} triangles",
        tris.len(),
        quads.len(),
        triangles.len()
    );
    FaceList { quads, triangles }
}
