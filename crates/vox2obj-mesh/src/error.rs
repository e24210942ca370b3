#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("triangle {triangle} references vertex {vertex} but the mesh has {len} vertices")]
    DanglingVertex {
        triangle: usize,
        vertex: u32,
        len: usize,
    },
    #[error("triangle ({0}, {1}, {2}) repeats a vertex")]
    DegenerateTriangle(u32, u32, u32),
    #[error("rotation matrix is not orthonormal (det = {det})")]
    DegenerateRotation { det: f32 },
}
