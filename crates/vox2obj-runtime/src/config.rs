//! Conversion settings, loadable from TOML.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use vox2obj_io::ObjOptions;
use vox2obj_mesh::{BoxyParams, QuadMergeParams, UpAxis, VertexCache, WeldParams};
use vox2obj_voxel::OccupancyStrategy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeshType {
    Triangles,
    #[default]
    Quads,
}

impl FromStr for MeshType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triangles" => Ok(MeshType::Triangles),
            "quads" => Ok(MeshType::Quads),
            other => Err(format!("unknown mesh type {other:?} (expected triangles|quads)")),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyMode {
    #[default]
    Dense,
    Sparse,
}

impl FromStr for OccupancyMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense" => Ok(OccupancyMode::Dense),
            "sparse" => Ok(OccupancyMode::Sparse),
            other => Err(format!("unknown occupancy {other:?} (expected dense|sparse)")),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpAxisMode {
    #[default]
    ZUp,
    YUp,
}

impl FromStr for UpAxisMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "z_up" | "z" => Ok(UpAxisMode::ZUp),
            "y_up" | "y" => Ok(UpAxisMode::YUp),
            other => Err(format!("unknown up axis {other:?} (expected z_up|y_up)")),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WeldConfig {
    #[serde(default = "default_weld_epsilon")]
    pub epsilon: f32,
    #[serde(default = "default_crack_epsilon")]
    pub crack_epsilon: f32,
}
fn default_weld_epsilon() -> f32 {
    1e-4
}
fn default_crack_epsilon() -> f32 {
    1e-3
}
impl Default for WeldConfig {
    fn default() -> Self {
        Self {
            epsilon: default_weld_epsilon(),
            crack_epsilon: default_crack_epsilon(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuadConfig {
    /// Max `|cos|` at a quad corner; 0.1564 is about 9 degrees off square.
    #[serde(default = "default_angle_tolerance")]
    pub angle_tolerance: f32,
    #[serde(default = "default_coplanar_cos")]
    pub coplanar_cos: f32,
}
fn default_angle_tolerance() -> f32 {
    0.1564
}
fn default_coplanar_cos() -> f32 {
    0.9999
}
impl Default for QuadConfig {
    fn default() -> Self {
        Self {
            angle_tolerance: default_angle_tolerance(),
            coplanar_cos: default_coplanar_cos(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConvertConfig {
    #[serde(default)]
    pub mesh_type: MeshType,
    #[serde(default = "default_true")]
    pub write_normals: bool,
    /// Write face corners as `a//a` when normals are written.
    #[serde(default = "default_true")]
    pub normal_refs: bool,
    #[serde(default = "default_true")]
    pub greedy_faces: bool,
    #[serde(default)]
    pub occupancy: OccupancyMode,
    #[serde(default)]
    pub up_axis: UpAxisMode,
    /// Worker threads for batches; 0 picks the available parallelism.
    #[serde(default)]
    pub jobs: usize,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub weld: WeldConfig,
    #[serde(default)]
    pub quads: QuadConfig,
}

fn default_true() -> bool {
    true
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            mesh_type: MeshType::default(),
            write_normals: true,
            normal_refs: true,
            greedy_faces: true,
            occupancy: OccupancyMode::default(),
            up_axis: UpAxisMode::default(),
            jobs: 0,
            output_dir: None,
            weld: WeldConfig::default(),
            quads: QuadConfig::default(),
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &'static str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be a positive number, got {v}"),
                })
            }
        };
        positive("weld.epsilon", self.weld.epsilon)?;
        positive("weld.crack_epsilon", self.weld.crack_epsilon)?;
        positive("quads.angle_tolerance", self.quads.angle_tolerance)?;
        if !(0.0..=1.0).contains(&self.quads.coplanar_cos) {
            return Err(ConfigError::Invalid {
                key: "quads.coplanar_cos",
                reason: format!("must be within [0, 1], got {}", self.quads.coplanar_cos),
            });
        }
        Ok(())
    }

    pub fn boxy_params(&self) -> BoxyParams {
        BoxyParams {
            greedy: self.greedy_faces,
            vertex_quantum: VertexCache::DEFAULT_QUANTUM,
        }
    }

    pub fn weld_params(&self) -> WeldParams {
        WeldParams {
            epsilon: self.weld.epsilon,
            crack_epsilon: self.weld.crack_epsilon,
            recompute_normals: self.write_normals,
        }
    }

    pub fn quad_params(&self) -> QuadMergeParams {
        QuadMergeParams {
            angle_tolerance: self.quads.angle_tolerance,
            coplanar_cos: self.quads.coplanar_cos,
            ..QuadMergeParams::default()
        }
    }

    pub fn occupancy_strategy(&self) -> OccupancyStrategy {
        match self.occupancy {
            OccupancyMode::Dense => OccupancyStrategy::Dense,
            OccupancyMode::Sparse => OccupancyStrategy::Sparse,
        }
    }

    pub fn up_axis(&self) -> UpAxis {
        match self.up_axis {
            UpAxisMode::ZUp => UpAxis::ZUp,
            UpAxisMode::YUp => UpAxis::YUp,
        }
    }

    pub fn obj_options(&self, object_name: Option<String>) -> ObjOptions {
        ObjOptions {
            write_normals: self.write_normals,
            normal_refs: self.normal_refs,
            object_name,
        }
    }

    /// Number of batch workers for `inputs` files.
    pub fn worker_count(&self, inputs: usize) -> usize {
        let n = if self.jobs == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.jobs
        };
        n.min(inputs).max(1)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<ConvertConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: ConvertConfig = toml::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}
