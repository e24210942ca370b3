//! File formats: Wavefront OBJ output and MagicaVoxel `.vox` input.
#![forbid(unsafe_code)]

pub mod obj;
pub mod vox;

pub use obj::{
    ObjCounts, ObjError, ObjOptions, output_path_for, read_obj_counts, write_obj, write_obj_file,
};
pub use vox::{VoxFileSource, rotation_matrix, submodels_from_scene};
