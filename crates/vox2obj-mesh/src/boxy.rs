//! Boundary face emission: outward faces on every voxel side that touches exterior space,
//! either one per unit side or fused into same-plane rectangles.

use hashbrown::HashSet;
use vox2obj_geom::Vec3;
use vox2obj_voxel::{Bitset, BoundingBox, ExteriorMap, Occupancy, VoxelSet};

use crate::face::Face;
use crate::mesh::{Mesh, VertexCache, VertexId};

#[derive(Copy, Clone, Debug)]
pub struct BoxyParams {
    /// Fuse same-plane exposed faces into maximal rectangles before triangulating.
    pub greedy: bool,
    /// Quantization step of the vertex cache.
    pub vertex_quantum: f32,
}

impl Default for BoxyParams {
    fn default() -> Self {
        Self {
            greedy: true,
            vertex_quantum: VertexCache::DEFAULT_QUANTUM,
        }
    }
}

/// Exposed-face flags per direction over the surface voxels' box.
struct ExposedFaces {
    bounds: BoundingBox,
    dims: [usize; 3],
    faces: [Bitset; 6],
    count: usize,
}

impl ExposedFaces {
    fn new(bounds: BoundingBox) -> Self {
        let (sx, sy, sz) = bounds.dims();
        let n = sx * sy * sz;
        Self {
            bounds,
            dims: [sx, sy, sz],
            faces: std::array::from_fn(|_| Bitset::new(n)),
            count: 0,
        }
    }

    #[inline]
    fn idx(&self, c: [usize; 3]) -> usize {
        (c[2] * self.dims[1] + c[1]) * self.dims[0] + c[0]
    }

    #[inline]
    fn local(&self, x: i32, y: i32, z: i32) -> [usize; 3] {
        [
            (x - self.bounds.min.0) as usize,
            (y - self.bounds.min.1) as usize,
            (z - self.bounds.min.2) as usize,
        ]
    }

    fn mark(&mut self, face: Face, x: i32, y: i32, z: i32) {
        let i = self.idx(self.local(x, y, z));
        if !self.faces[face.index()].get(i) {
            self.faces[face.index()].set(i, true);
            self.count += 1;
        }
    }

    #[inline]
    fn get(&self, face: Face, c: [usize; 3]) -> bool {
        self.faces[face.index()].get(self.idx(c))
    }

    fn world_origin(&self, c: [usize; 3]) -> [i32; 3] {
        [
            self.bounds.min.0 + c[0] as i32,
            self.bounds.min.1 + c[1] as i32,
            self.bounds.min.2 + c[2] as i32,
        ]
    }
}

/// Face rectangle in lattice coordinates.
#[derive(Copy, Clone, Debug)]
struct FaceRect {
    face: Face,
    origin: [i32; 3],
    extent: [i32; 3],
}

impl FaceRect {
    fn corners(&self) -> [[i32; 3]; 4] {
        self.face.rect_corners(self.origin, self.extent)
    }

    /// Border loop in winding order. Every lattice vertex that lies on an edge is part of
    /// the loop, so neighbors never see a vertex in the middle of an edge.
    fn outline(&self, lattice: &HashSet<[i32; 3]>) -> Vec<[i32; 3]> {
        let corners = self.corners();
        let mut outline = Vec::with_capacity(4);
        for i in 0..4 {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            outline.push(a);
            let step = [0usize, 1, 2].map(|k| (b[k] - a[k]).signum());
            let mut p = [0usize, 1, 2].map(|k| a[k] + step[k]);
            while p != b {
                if lattice.contains(&p) {
                    outline.push(p);
                }
                p = [0usize, 1, 2].map(|k| p[k] + step[k]);
            }
        }
        outline
    }
}

// Twice the area of `(a, b, c)` signed along `face`'s normal.
fn turn(face: Face, a: [i32; 3], b: [i32; 3], c: [i32; 3]) -> i64 {
    let ab = [0usize, 1, 2].map(|k| (b[k] - a[k]) as i64);
    let ac = [0usize, 1, 2].map(|k| (c[k] - a[k]) as i64);
    let (dx, dy, dz) = face.delta();
    (ab[1] * ac[2] - ab[2] * ac[1]) * dx as i64
        + (ab[2] * ac[0] - ab[0] * ac[2]) * dy as i64
        + (ab[0] * ac[1] - ab[1] * ac[0]) * dz as i64
}

/// Ear-clips a convex outline whose edges may carry collinear points, without adding
/// vertices. Returns index triples into `outline`; an outline of `n` points yields
/// `n - 2` triangles.
fn clip_outline(face: Face, outline: &[[i32; 3]]) -> Vec<[usize; 3]> {
    let mut ring: Vec<usize> = (0..outline.len()).collect();
    let mut tris = Vec::with_capacity(outline.len().saturating_sub(2));
    let convex = |ring: &[usize], prev: usize, i: usize, next: usize| {
        turn(face, outline[ring[prev]], outline[ring[i]], outline[ring[next]]) > 0
    };
    while ring.len() > 3 {
        let n = ring.len();
        let strict: Vec<bool> = (0..n).map(|i| convex(&ring, (i + n - 1) % n, i, (i + 1) % n)).collect();
        let total = strict.iter().filter(|&&s| s).count();
        // Clipping `i` must leave a polygon with a strictly convex vertex. Only the
        // neighbors of `i` change shape.
        let ear = (0..n).map(|k| (k + 1) % n).find(|&i| {
            let (prev, next) = ((i + n - 1) % n, (i + 1) % n);
            if !strict[i] {
                return false;
            }
            let others = total - 1 - strict[prev] as usize - strict[next] as usize;
            others > 0
                || convex(&ring, (prev + n - 1) % n, prev, next)
                || convex(&ring, prev, next, (next + 1) % n)
        });
        let Some(i) = ear else {
            log::warn!(target: "boxy", "{:?} outline of {} points has no ear", face, ring.len());
            return tris;
        };
        tris.push([ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]]);
        ring.remove(i);
    }
    if ring.len() == 3 && convex(&ring, 0, 1, 2) {
        tris.push([ring[0], ring[1], ring[2]]);
    }
    tris
}

// Greedy-rectangle sweep over a row-major `width * height` mask. Calls
// `emit(x, y, w, h)` once per maximal rectangle of set cells.
fn greedy_rects(
    width: usize,
    height: usize,
    mask: &[bool],
    mut emit: impl FnMut(usize, usize, usize, usize),
) {
    let mut used = vec![false; width * height];
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if !mask[idx] || used[idx] {
                continue;
            }
            let mut w = 1;
            while x + w < width && mask[y * width + x + w] && !used[y * width + x + w] {
                w += 1;
            }
            let mut h = 1;
            'expand: while y + h < height {
                for i in 0..w {
                    let j = (y + h) * width + x + i;
                    if !mask[j] || used[j] {
                        break 'expand;
                    }
                }
                h += 1;
            }
            emit(x, y, w, h);
            for yy in 0..h {
                for xx in 0..w {
                    used[(y + yy) * width + x + xx] = true;
                }
            }
        }
    }
}

fn emit_rect(mesh: &mut Mesh, cache: &mut VertexCache, rect: &FaceRect, lattice: &HashSet<[i32; 3]>) {
    let outline = rect.outline(lattice);
    let ids: Vec<VertexId> = outline
        .iter()
        .map(|&[x, y, z]| cache.get_or_insert(mesh, Vec3::new(x as f32, y as f32, z as f32)))
        .collect();
    for [a, b, c] in clip_outline(rect.face, &outline) {
        if let Err(e) = mesh.add_triangle(ids[a], ids[b], ids[c]) {
            log::warn!(target: "boxy", "skipping {:?} face at {:?}: {}", rect.face, rect.origin, e);
        }
    }
}

/// Emits the boundary faces of `surface` toward exterior space.
///
/// A face on side `d` of voxel `v` is produced iff `v + d` is unoccupied and
/// classified external, so enclosed voids never receive faces. Vertices are shared
/// immediately through a [`VertexCache`]. Emission walks faces slice by slice, so the
/// result does not depend on the order of `surface`.
///
/// With `greedy` set, each rectangle border is split at every corner of its neighbors
/// before triangulation. The result is watertight wherever the unit-face mesh is.
pub fn build_boxy_mesh(
    surface: &VoxelSet,
    occupancy: &impl Occupancy,
    exterior: &ExteriorMap,
    params: &BoxyParams,
) -> Mesh {
    let mut mesh = Mesh::new();
    let Some(bounds) = surface.bounds() else {
        return mesh;
    };
    let mut exposed = ExposedFaces::new(bounds);
    for v in surface {
        for face in Face::ALL {
            let (dx, dy, dz) = face.delta();
            let (nx, ny, nz) = (v.x + dx, v.y + dy, v.z + dz);
            if !occupancy.is_occupied(nx, ny, nz) && exterior.is_external(nx, ny, nz) {
                exposed.mark(face, v.x, v.y, v.z);
            }
        }
    }

    let mut rects = Vec::new();
    for face in Face::ALL {
        let n_axis = face.normal_axis();
        let (u_axis, v_axis) = face.plane_axes();
        let (width, height) = (exposed.dims[u_axis], exposed.dims[v_axis]);
        let mut mask = vec![false; width * height];
        for slice in 0..exposed.dims[n_axis] {
            let cell = |u: usize, v: usize| {
                let mut c = [0usize; 3];
                c[n_axis] = slice;
                c[u_axis] = u;
                c[v_axis] = v;
                c
            };
            let mut any = false;
            for v in 0..height {
                for u in 0..width {
                    let set = exposed.get(face, cell(u, v));
                    mask[v * width + u] = set;
                    any |= set;
                }
            }
            if !any {
                continue;
            }
            let mut push = |u: usize, v: usize, w: usize, h: usize| {
                let mut extent = [1i32; 3];
                extent[u_axis] = w as i32;
                extent[v_axis] = h as i32;
                rects.push(FaceRect {
                    face,
                    origin: exposed.world_origin(cell(u, v)),
                    extent,
                });
            };
            if params.greedy {
                greedy_rects(width, height, &mask, &mut push);
            } else {
                for v in 0..height {
                    for u in 0..width {
                        if mask[v * width + u] {
                            push(u, v, 1, 1);
                        }
                    }
                }
            }
        }
    }

    let lattice: HashSet<[i32; 3]> = rects.iter().flat_map(|r| r.corners()).collect();
    let mut cache = VertexCache::new(params.vertex_quantum);
    for rect in &rects {
        emit_rect(&mut mesh, &mut cache, rect, &lattice);
    }
    log::debug!(
        target: "boxy",
        "{} exposed faces -> {} rects, {} vertices, {} triangles",
        exposed.count,
        rects.len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    mesh
}
