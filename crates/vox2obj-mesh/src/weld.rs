//! Mesh cleanup passes run after boxy emission.
//!
//! The passes run in a fixed order and the whole sequence is idempotent: welding an
//! already welded mesh changes nothing.

use hashbrown::{HashMap, HashSet};
use vox2obj_geom::Vec3;

use crate::error::GeometryError;
use crate::mesh::{Mesh, VertexId};

#[derive(Copy, Clone, Debug)]
pub struct WeldParams {
    /// Vertices closer than this are snapped together.
    pub epsilon: f32,
    /// Vertices on open edges closer than this are fused to close cracks.
    pub crack_epsilon: f32,
    pub recompute_normals: bool,
}

impl Default for WeldParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            crack_epsilon: 1e-3,
            recompute_normals: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeldReport {
    pub duplicates_removed: usize,
    pub vertices_snapped: usize,
    pub cracks_fused: usize,
    pub degenerate_removed: usize,
    pub orphans_removed: usize,
    pub dangling_refs: usize,
    pub non_manifold_edges: usize,
    pub boundary_edges: usize,
}

impl WeldReport {
    pub fn had_changes(&self) -> bool {
        self.duplicates_removed > 0
            || self.vertices_snapped > 0
            || self.cracks_fused > 0
            || self.degenerate_removed > 0
            || self.orphans_removed > 0
    }
}

impl std::fmt::Display for WeldReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dup={} snapped={} cracks={} degenerate={} orphans={} non_manifold={} boundary={}",
            self.duplicates_removed,
            self.vertices_snapped,
            self.cracks_fused,
            self.degenerate_removed,
            self.orphans_removed,
            self.non_manifold_edges,
            self.boundary_edges
        )
    }
}

/// Rotates a triangle so its smallest id comes first, keeping winding.
#[inline]
fn rotate_canonical(t: [VertexId; 3]) -> [VertexId; 3] {
    let k = if t[0] <= t[1] && t[0] <= t[2] {
        0
    } else if t[1] <= t[2] {
        1
    } else {
        2
    };
    [t[k], t[(k + 1) % 3], t[(k + 2) % 3]]
}

/// Drops triangles equal to an earlier one up to cyclic rotation. Keeps first occurrences.
pub fn remove_duplicate_triangles(mesh: &mut Mesh) -> usize {
    let before = mesh.triangles.len();
    let mut seen: HashSet<[VertexId; 3]> = HashSet::with_capacity(before);
    mesh.triangles.retain(|t| seen.insert(rotate_canonical(*t)));
    before - mesh.triangles.len()
}

#[inline]
fn cell_of(p: Vec3, cell: f32) -> (i64, i64, i64) {
    (
        (p.x / cell).floor() as i64,
        (p.y / cell).floor() as i64,
        (p.z / cell).floor() as i64,
    )
}

/// Maps each candidate vertex to the lowest-id candidate within `eps` that is itself a
/// representative. Returns the remap table (identity for non-candidates) and the merge count.
fn snap_candidates(
    positions: &[Vec3],
    candidates: &[VertexId],
    eps: f32,
) -> (Vec<VertexId>, usize) {
    let mut remap: Vec<VertexId> = (0..positions.len() as VertexId).collect();
    if candidates.is_empty() || eps <= 0.0 {
        return (remap, 0);
    }
    let cell = eps * 2.0;
    let mut buckets: HashMap<(i64, i64, i64), Vec<VertexId>> = HashMap::new();
    for &v in candidates {
        buckets.entry(cell_of(positions[v as usize], cell)).or_default().push(v);
    }
    let mut merged = 0;
    for &v in candidates {
        if remap[v as usize] != v {
            continue;
        }
        let p = positions[v as usize];
        let (cx, cy, cz) = cell_of(p, cell);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(list) = buckets.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &o in list {
                        if o <= v || remap[o as usize] != o {
                            continue;
                        }
                        if p.distance(positions[o as usize]) < eps {
                            remap[o as usize] = v;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }
    (remap, merged)
}

/// Applies a vertex remap and drops triangles that collapse. Returns the number dropped.
fn apply_remap(mesh: &mut Mesh, remap: &[VertexId]) -> usize {
    for tri in &mut mesh.triangles {
        for v in tri.iter_mut() {
            *v = remap[*v as usize];
        }
    }
    let before = mesh.triangles.len();
    mesh.triangles.retain(|&[a, b, c]| a != b && b != c && a != c);
    before - mesh.triangles.len()
}

/// Snaps every vertex onto the lowest-id vertex within `eps`.
pub fn snap_vertices(mesh: &mut Mesh, eps: f32) -> (usize, usize) {
    let all: Vec<VertexId> = (0..mesh.positions.len() as VertexId).collect();
    let (remap, merged) = snap_candidates(&mesh.positions, &all, eps);
    if merged == 0 {
        return (0, 0);
    }
    (merged, apply_remap(mesh, &remap))
}

fn edge_counts(triangles: &[[VertexId; 3]]) -> HashMap<(VertexId, VertexId), u32> {
    let mut counts: HashMap<(VertexId, VertexId), u32> = HashMap::with_capacity(triangles.len() * 3 / 2);
    for tri in triangles {
        for e in 0..3 {
            let (a, b) = (tri[e], tri[(e + 1) % 3]);
            *counts.entry(if a < b { (a, b) } else { (b, a) }).or_default() += 1;
        }
    }
    counts
}

/// Fuses vertices that lie on open edges and sit within `eps` of each other,
/// repeating until no pair is left. Duplicates exposed by a fusion are dropped as it
/// goes. Returns `(fused, degenerate_dropped, duplicates_dropped)`.
pub fn fuse_boundary_cracks(mesh: &mut Mesh, eps: f32) -> (usize, usize, usize) {
    let (mut fused, mut degenerate, mut duplicates) = (0, 0, 0);
    loop {
        let counts = edge_counts(&mesh.triangles);
        let mut on_boundary = vec![false; mesh.positions.len()];
        for (&(a, b), _) in counts.iter().filter(|&(_, &n)| n == 1) {
            on_boundary[a as usize] = true;
            on_boundary[b as usize] = true;
        }
        let candidates: Vec<VertexId> = (0..mesh.positions.len() as VertexId)
            .filter(|&v| on_boundary[v as usize])
            .collect();
        let (remap, merged) = snap_candidates(&mesh.positions, &candidates, eps);
        if merged == 0 {
            return (fused, degenerate, duplicates);
        }
        fused += merged;
        degenerate += apply_remap(mesh, &remap);
        duplicates += remove_duplicate_triangles(mesh);
    }
}

/// Drops unreferenced vertices and renumbers the rest contiguously, preserving order.
pub fn compact(mesh: &mut Mesh) -> usize {
    let mut used = vec![false; mesh.positions.len()];
    for tri in &mesh.triangles {
        for &v in tri {
            used[v as usize] = true;
        }
    }
    let before = mesh.positions.len();
    if used.iter().all(|&u| u) {
        return 0;
    }
    let mut remap = vec![VertexId::MAX; before];
    let mut positions = Vec::with_capacity(before);
    let mut normals = mesh.normals.as_ref().map(|n| Vec::with_capacity(n.len()));
    for (old, keep) in used.iter().enumerate() {
        if !keep {
            continue;
        }
        remap[old] = positions.len() as VertexId;
        positions.push(mesh.positions[old]);
        if let (Some(out), Some(src)) = (normals.as_mut(), mesh.normals.as_ref()) {
            out.push(src[old]);
        }
    }
    for tri in &mut mesh.triangles {
        for v in tri.iter_mut() {
            *v = remap[*v as usize];
        }
    }
    mesh.positions = positions;
    mesh.normals = normals;
    before - mesh.positions.len()
}

/// Per-vertex normals as the normalized sum of incident area-weighted face normals.
pub fn recompute_normals(mesh: &mut Mesh) {
    let mut acc = vec![Vec3::ZERO; mesh.positions.len()];
    for t in 0..mesh.triangles.len() {
        let n = mesh.face_normal_weighted(t);
        for &v in &mesh.triangles[t] {
            acc[v as usize] += n;
        }
    }
    mesh.normals = Some(acc.into_iter().map(Vec3::normalized).collect());
}

/// Counts `(dangling references, non-manifold edges, boundary edges)`.
pub fn validate(mesh: &Mesh) -> (usize, usize, usize) {
    let len = mesh.positions.len();
    let dangling = mesh
        .triangles
        .iter()
        .flat_map(|t| t.iter())
        .filter(|&&v| v as usize >= len)
        .count();
    let counts = edge_counts(&mesh.triangles);
    let non_manifold = counts.values().filter(|&&n| n > 2).count();
    let boundary = counts.values().filter(|&&n| n == 1).count();
    (dangling, non_manifold, boundary)
}

/// Runs the cleanup passes in order: duplicates, snapping and crack fusion,
/// compaction, normals, validation.
///
/// Fails only when a triangle references a vertex that does not exist; every other
/// anomaly is counted in the report and logged.
pub fn weld(mesh: &mut Mesh, params: &WeldParams) -> Result<WeldReport, GeometryError> {
    mesh.check_references()?;
    let mut report = WeldReport {
        duplicates_removed: remove_duplicate_triangles(mesh),
        ..WeldReport::default()
    };

    let (snapped, dropped) = snap_vertices(mesh, params.epsilon);
    report.vertices_snapped = snapped;
    report.degenerate_removed += dropped;
    if snapped > 0 {
        report.duplicates_removed += remove_duplicate_triangles(mesh);
    }
    let (fused, dropped, duplicates) = fuse_boundary_cracks(mesh, params.crack_epsilon);
    report.cracks_fused = fused;
    report.degenerate_removed += dropped;
    report.duplicates_removed += duplicates;

    report.orphans_removed = compact(mesh);
    if params.recompute_normals {
        recompute_normals(mesh);
    }

    let (dangling, non_manifold, boundary) = validate(mesh);
    report.dangling_refs = dangling;
    report.non_manifold_edges = non_manifold;
    report.boundary_edges = boundary;
    if dangling > 0 || non_manifold > 0 || boundary > 0 {
        log::warn!(target: "weld", "mesh anomalies after weld: {}", report);
    } else {
        log::debug!(target: "weld", "{}", report);
    }
    Ok(report)
}
