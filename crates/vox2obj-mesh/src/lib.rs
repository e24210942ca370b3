//! CPU meshing for voxel models: boxy face emission, quad merging, welding, composition.
#![forbid(unsafe_code)]

pub mod boxy;
pub mod compose;
pub mod error;
pub mod face;
pub mod mesh;
pub mod quad;
pub mod weld;

pub use boxy::{BoxyParams, build_boxy_mesh};
pub use compose::{SubModelTransform, UpAxis, compose};
pub use error::GeometryError;
pub use face::Face;
pub use mesh::{Mesh, VertexCache, VertexId};
pub use quad::{FaceList, Quad, QuadMergeParams, merge_quads};
pub use weld::{WeldParams, WeldReport, weld};
