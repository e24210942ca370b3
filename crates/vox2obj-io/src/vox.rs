//! MagicaVoxel `.vox` input via `dot_vox`.
//!
//! Files with a scene graph are walked from the root node, composing transform nodes
//! down to each shape. Files without one yield every model at the origin.

use std::path::Path;

use dot_vox::{Frame, Model, Rotation, SceneNode};
use vox2obj_geom::{Mat3, Vec3};
use vox2obj_voxel::{InputError, ModelSource, SubModel, Voxel, VoxelSet};

/// [`ModelSource`] for `.vox` files.
#[derive(Copy, Clone, Debug, Default)]
pub struct VoxFileSource;

impl ModelSource for VoxFileSource {
    fn load(&self, path: &Path) -> Result<Vec<SubModel>, InputError> {
        let unreadable = |reason: String| InputError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        let data = dot_vox::load_bytes(&bytes).map_err(|e| unreadable(e.to_string()))?;
        log::debug!(
            target: "vox",
            "{}: version {}, {} models, {} scene nodes",
            path.display(),
            data.version,
            data.models.len(),
            data.scenes.len()
        );
        let models = submodels_from_scene(&data.models, &data.scenes);
        if models.is_empty() {
            return Err(InputError::NoModels);
        }
        Ok(models)
    }
}

/// Row-major matrix of a frame rotation. `dot_vox` hands out columns.
pub fn rotation_matrix(rotation: Rotation) -> Mat3 {
    let cols = rotation.to_cols_array_2d();
    Mat3::from_rows(std::array::from_fn(|r| std::array::from_fn(|c| cols[c][r])))
}

// Both index fields of `_r` must name distinct columns 0..3. Other codes do not
// describe a signed permutation.
fn is_permutation_code(raw: &str) -> bool {
    raw.parse::<u8>().is_ok_and(|b| {
        let (c0, c1) = (b & 0b11, (b >> 2) & 0b11);
        c0 < 3 && c1 < 3 && c0 != c1
    })
}

fn frame_rotation(frame: &Frame, node: u32) -> Mat3 {
    let Some(raw) = frame.attributes.get("_r") else {
        return Mat3::IDENTITY;
    };
    if !is_permutation_code(raw) {
        log::warn!(target: "vox", "node {}: bad rotation {:?}", node, raw);
        return Mat3::IDENTITY;
    }
    frame.orientation().map_or(Mat3::IDENTITY, rotation_matrix)
}

fn frame_translation(frame: &Frame, node: u32) -> Vec3 {
    match frame.position() {
        Some(p) => Vec3::new(p.x as f32, p.y as f32, p.z as f32),
        None => {
            if let Some(raw) = frame.attributes.get("_t") {
                log::warn!(target: "vox", "node {}: bad translation {:?}", node, raw);
            }
            Vec3::ZERO
        }
    }
}

fn model_voxels(model: &Model) -> VoxelSet {
    model
        .voxels
        .iter()
        .map(|v| Voxel::with_color(v.x as i32, v.y as i32, v.z as i32, v.i))
        .collect()
}

fn model_dims(model: &Model) -> (usize, usize, usize) {
    (model.size.x as usize, model.size.y as usize, model.size.z as usize)
}

struct Visit<'a> {
    node: u32,
    rotation: Mat3,
    translation: Vec3,
    name: Option<&'a str>,
    depth: usize,
}

/// Flattens a scene graph into placed submodels, in depth-first child order.
///
/// A transform node's frame composes as `R = R_parent * R_node` and
/// `t = t_parent + R_parent * t_node`. Hidden nodes are skipped; malformed attributes
/// fall back to identity with a warning.
pub fn submodels_from_scene(models: &[Model], scenes: &[SceneNode]) -> Vec<SubModel> {
    if scenes.is_empty() {
        return models
            .iter()
            .enumerate()
            .map(|(i, m)| SubModel::new(format!("model{i}"), model_voxels(m), model_dims(m)))
            .collect();
    }

    let mut out = Vec::new();
    let mut stack = vec![Visit {
        node: 0,
        rotation: Mat3::IDENTITY,
        translation: Vec3::ZERO,
        name: None,
        depth: 0,
    }];
    while let Some(visit) = stack.pop() {
        let Some(node) = scenes.get(visit.node as usize) else {
            log::warn!(target: "vox", "scene references missing node {}", visit.node);
            continue;
        };
        if visit.depth > scenes.len() {
            log::warn!(target: "vox", "scene graph cycle at node {}", visit.node);
            continue;
        }
        match node {
            SceneNode::Transform {
                attributes,
                frames,
                child,
                ..
            } => {
                if attributes.get("_hidden").is_some_and(|h| h == "1") {
                    log::debug!(target: "vox", "skipping hidden node {}", visit.node);
                    continue;
                }
                let (rotation, translation) = frames
                    .first()
                    .map(|f| (frame_rotation(f, visit.node), frame_translation(f, visit.node)))
                    .unwrap_or((Mat3::IDENTITY, Vec3::ZERO));
                stack.push(Visit {
                    node: *child,
                    rotation: visit.rotation.mul_mat3(&rotation),
                    translation: visit.translation + visit.rotation.mul_vec3(translation),
                    name: attributes.get("_name").map(String::as_str).or(visit.name),
                    depth: visit.depth + 1,
                });
            }
            SceneNode::Group { children, .. } => {
                for &c in children.iter().rev() {
                    stack.push(Visit {
                        node: c,
                        name: None,
                        depth: visit.depth + 1,
                        ..visit
                    });
                }
            }
            SceneNode::Shape { models: shape_models, .. } => {
                // Animated shapes list one model per frame; the first is the rest pose.
                let Some(shape) = shape_models.first() else {
                    continue;
                };
                let Some(model) = models.get(shape.model_id as usize) else {
                    log::warn!(target: "vox", "shape {} references missing model {}", visit.node, shape.model_id);
                    continue;
                };
                let name = visit
                    .name
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("model{}", shape.model_id));
                out.push(
                    SubModel::new(name, model_voxels(model), model_dims(model))
                        .with_transform(visit.translation, visit.rotation),
                );
            }
        }
    }
    out
}
