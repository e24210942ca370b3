//! The model abstraction consumed by the meshing pipeline.

use std::path::{Path, PathBuf};

use vox2obj_geom::{Mat3, Vec3};

use crate::voxel::VoxelSet;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("model {name:?} has no voxels")]
    EmptyModel { name: String },
    #[error("file contains no models")]
    NoModels,
}

/// One voxel model placed in the scene.
#[derive(Clone, Debug)]
pub struct SubModel {
    pub name: String,
    /// Local-space voxels, nominally inside `[0, dims)`.
    pub voxels: VoxelSet,
    pub dims: (usize, usize, usize),
    /// Global translation of the model's pivot.
    pub position: Vec3,
    /// Global rotation, row-major.
    pub rotation: Mat3,
}

impl SubModel {
    pub fn new(name: impl Into<String>, voxels: VoxelSet, dims: (usize, usize, usize)) -> Self {
        Self {
            name: name.into(),
            voxels,
            dims,
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
        }
    }

    pub fn with_transform(mut self, position: Vec3, rotation: Mat3) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    /// Errors with [`InputError::EmptyModel`] when there is nothing to mesh.
    pub fn ensure_non_empty(&self) -> Result<(), InputError> {
        if self.voxels.is_empty() {
            return Err(InputError::EmptyModel {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Produces the submodels stored in one input file.
pub trait ModelSource: Sync {
    fn load(&self, path: &Path) -> Result<Vec<SubModel>, InputError>;
}
