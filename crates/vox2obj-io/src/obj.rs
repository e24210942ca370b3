//! Wavefront OBJ text output.
//!
//! Layout: a comment header, an optional `o` line, every `v` in id order, then every
//! `vn` when normals are written, then quads followed by leftover triangles. Indices are
//! 1-based. Face corners are plain `f i j k` / `f i j k l` indices, except that with
//! normals and [`ObjOptions::normal_refs`] each corner is written as `a//a` so viewers
//! pick up the per-vertex normal.

use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use vox2obj_geom::Vec3;
use vox2obj_mesh::{FaceList, Mesh, VertexId};

#[derive(Debug, thiserror::Error)]
pub enum ObjError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

#[derive(Clone, Debug)]
pub struct ObjOptions {
    pub write_normals: bool,
    /// Reference the written normals from face corners (`a//a`).
    pub normal_refs: bool,
    /// Written as an `o` statement when set.
    pub object_name: Option<String>,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            write_normals: true,
            normal_refs: true,
            object_name: None,
        }
    }
}

/// Statement counts of an OBJ document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjCounts {
    pub vertices: usize,
    pub normals: usize,
    pub triangles: usize,
    pub quads: usize,
}

impl ObjCounts {
    pub fn faces(&self) -> usize {
        self.triangles + self.quads
    }
}

fn write_coord(w: &mut impl Write, v: f32) -> io::Result<()> {
    let s = format!("{:.6}", v);
    // negative zero
    let s = if s == "-0.000000" { &s[1..] } else { &s[..] };
    w.write_all(s.as_bytes())
}

fn write_vec(w: &mut impl Write, tag: &str, v: Vec3) -> io::Result<()> {
    w.write_all(tag.as_bytes())?;
    for c in v.to_array() {
        w.write_all(b" ")?;
        write_coord(w, c)?;
    }
    w.write_all(b"\n")
}

fn write_face(w: &mut impl Write, ids: &[VertexId], with_normals: bool) -> io::Result<()> {
    w.write_all(b"f")?;
    for &id in ids {
        let i = id as u64 + 1;
        if with_normals {
            write!(w, " {i}//{i}")?;
        } else {
            write!(w, " {i}")?;
        }
    }
    w.write_all(b"\n")
}

/// Serializes `mesh` with the faces in `faces`. Faces naming a vertex outside the mesh
/// are skipped with a warning. Returns what was actually written.
pub fn write_obj<W: Write>(
    w: &mut W,
    mesh: &Mesh,
    faces: &FaceList,
    opts: &ObjOptions,
) -> Result<ObjCounts, ObjError> {
    let normals = match mesh.normals.as_ref() {
        Some(n) if opts.write_normals && n.len() == mesh.vertex_count() => Some(n),
        Some(_) if opts.write_normals => {
            log::warn!(target: "obj", "normal count does not match vertex count; omitting normals");
            None
        }
        _ => None,
    };
    let with_normals = normals.is_some() && opts.normal_refs;
    let len = mesh.vertex_count();
    let valid = |ids: &[VertexId]| ids.iter().all(|&v| (v as usize) < len);

    writeln!(w, "# vox2obj")?;
    writeln!(
        w,
        "# vertices: {}, faces: {}",
        len,
        faces.face_count()
    )?;
    if let Some(name) = &opts.object_name {
        writeln!(w, "o {}", name)?;
    }

    let mut counts = ObjCounts::default();
    for &p in &mesh.positions {
        write_vec(w, "v", p)?;
        counts.vertices += 1;
    }
    if let Some(normals) = normals {
        for &n in normals {
            write_vec(w, "vn", n)?;
            counts.normals += 1;
        }
    }
    for quad in &faces.quads {
        if !valid(&quad.vertices) {
            log::warn!(target: "obj", "skipping quad with invalid vertex id: {:?}", quad.vertices);
            continue;
        }
        write_face(w, &quad.vertices, with_normals)?;
        counts.quads += 1;
    }
    for tri in &faces.triangles {
        if !valid(tri) {
            log::warn!(target: "obj", "skipping triangle with invalid vertex id: {:?}", tri);
            continue;
        }
        write_face(w, tri, with_normals)?;
        counts.triangles += 1;
    }
    Ok(counts)
}

/// Writes to a temporary sibling of `path` and renames it into place, so a failed
/// write never leaves a truncated file behind.
pub fn write_obj_file(
    path: &Path,
    mesh: &Mesh,
    faces: &FaceList,
    opts: &ObjOptions,
) -> Result<ObjCounts, ObjError> {
    let tmp = path.with_extension("obj.tmp");
    let result = (|| {
        let mut w = BufWriter::new(File::create(&tmp)?);
        let counts = write_obj(&mut w, mesh, faces, opts)?;
        w.flush()?;
        Ok::<_, ObjError>(counts)
    })();
    match result {
        Ok(counts) => {
            fs::rename(&tmp, path)?;
            Ok(counts)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// `{stem}_converted.obj` inside `out_dir`.
pub fn output_path_for(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    out_dir.join(format!("{stem}_converted.obj"))
}

fn parse_index(token: &str, vertices: usize, line: usize) -> Result<(), ObjError> {
    let head = token.split('/').next().unwrap_or("");
    let idx: usize = head.parse().map_err(|_| ObjError::Parse {
        line,
        reason: format!("bad face index {token:?}"),
    })?;
    if idx == 0 || idx > vertices {
        return Err(ObjError::Parse {
            line,
            reason: format!("face index {idx} out of range 1..={vertices}"),
        });
    }
    Ok(())
}

/// Counts `v`, `vn` and `f` statements, checking that vectors have three numeric
/// components and that face indices refer to vertices already declared.
pub fn read_obj_counts<R: BufRead>(r: R) -> Result<ObjCounts, ObjError> {
    let mut counts = ObjCounts::default();
    for (i, line) in r.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };
        match tag {
            "v" | "vn" => {
                let parsed: Vec<f32> = tokens
                    .map(|t| t.parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| ObjError::Parse {
                        line: lineno,
                        reason: format!("bad number: {e}"),
                    })?;
                if parsed.len() != 3 {
                    return Err(ObjError::Parse {
                        line: lineno,
                        reason: format!("`{tag}` needs 3 components, got {}", parsed.len()),
                    });
                }
                if tag == "v" {
                    counts.vertices += 1;
                } else {
                    counts.normals += 1;
                }
            }
            "f" => {
                let ids: Vec<&str> = tokens.collect();
                for t in &ids {
                    parse_index(t, counts.vertices, lineno)?;
                }
                match ids.len() {
                    3 => counts.triangles += 1,
                    4 => counts.quads += 1,
                    n => {
                        return Err(ObjError::Parse {
                            line: lineno,
                            reason: format!("unsupported face arity {n}"),
                        });
                    }
                }
            }
            _ => {}
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox2obj_mesh::Quad;

    fn square() -> (Mesh, FaceList) {
        let mut m = Mesh::new();
        m.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        m.add_vertex(Vec3::new(1.0, 0.0, -0.0));
        m.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        m.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        m.add_triangle(0, 1, 2).unwrap();
        m.add_triangle(0, 2, 3).unwrap();
        let faces = FaceList {
            quads: vec![Quad {
                vertices: [0, 1, 2, 3],
                source: [0, 1],
            }],
            triangles: vec![],
        };
        (m, faces)
    }

    #[test]
    fn writes_plain_faces_without_normals() {
        let (m, faces) = square();
        let mut out = Vec::new();
        let counts = write_obj(&mut out, &m, &faces, &ObjOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# vox2obj\n"));
        assert!(text.contains("v 1.000000 0.000000 0.000000\n"));
        assert!(!text.contains("-0.000000"));
        assert!(text.ends_with("f 1 2 3 4\n"));
        assert_eq!(counts, ObjCounts { vertices: 4, normals: 0, triangles: 0, quads: 1 });
    }

    #[test]
    fn writes_normal_references() {
        let (mut m, faces) = square();
        m.normals = Some(vec![Vec3::Z; 4]);
        let mut out = Vec::new();
        let opts = ObjOptions {
            object_name: Some("square".into()),
            ..ObjOptions::default()
        };
        write_obj(&mut out, &m, &faces, &opts).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("o square\n"));
        assert!(text.contains("vn 0.000000 0.000000 1.000000\n"));
        assert!(text.contains("f 1//1 2//2 3//3 4//4\n"));
    }

    #[test]
    fn plain_indices_keep_normals() {
        let (mut m, faces) = square();
        m.normals = Some(vec![Vec3::Z; 4]);
        let mut out = Vec::new();
        let opts = ObjOptions {
            normal_refs: false,
            ..ObjOptions::default()
        };
        let counts = write_obj(&mut out, &m, &faces, &opts).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(counts.normals, 4);
        assert!(text.ends_with("f 1 2 3 4\n"));
        assert!(!text.contains("//"));
        assert_eq!(read_obj_counts(text.as_bytes()).unwrap(), counts);
    }

    #[test]
    fn invalid_face_is_skipped() {
        let (m, mut faces) = square();
        faces.triangles.push([0, 1, 9]);
        let mut out = Vec::new();
        let counts = write_obj(&mut out, &m, &faces, &ObjOptions::default()).unwrap();
        assert_eq!(counts.faces(), 1);
    }

    #[test]
    fn reader_rejects_out_of_range_index() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n";
        match read_obj_counts(text.as_bytes()) {
            Err(ObjError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn output_path_uses_stem() {
        let p = output_path_for(Path::new("/data/castle.vox"), Path::new("out"));
        assert_eq!(p, Path::new("out").join("castle_converted.obj"));
    }
}
