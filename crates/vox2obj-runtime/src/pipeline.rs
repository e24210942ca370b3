//! Per-file conversion: load, mesh each submodel, compose, merge, write.

use std::path::{Path, PathBuf};
use std::time::Instant;

use vox2obj_io::{ObjCounts, ObjError, output_path_for, write_obj_file};
use vox2obj_mesh::{
    FaceList, GeometryError, Mesh, SubModelTransform, build_boxy_mesh, compose, merge_quads, weld,
};
use vox2obj_voxel::{ExteriorMap, InputError, ModelSource, SubModel, surface_voxels};

use crate::config::{ConfigError, ConvertConfig, MeshType};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("obj: {0}")]
    Obj(#[from] ObjError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("cancelled")]
    Cancelled,
}

/// Summary of one converted file.
#[derive(Clone, Debug)]
pub struct JobReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub submodels: usize,
    pub skipped: usize,
    pub counts: ObjCounts,
    pub t_total_ms: u32,
}

/// One input file on its way to OBJ.
#[derive(Debug)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub submodels: Vec<SubModel>,
    pub mesh: Mesh,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, out_dir: &Path) -> Self {
        let input = input.into();
        let output = output_path_for(&input, out_dir);
        Self {
            input,
            output,
            submodels: Vec::new(),
            mesh: Mesh::new(),
        }
    }

    fn object_name(&self) -> Option<String> {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    }
}

/// Meshes one submodel in its local voxel space and welds the result.
pub fn mesh_submodel(model: &SubModel, cfg: &ConvertConfig) -> Result<Mesh, ConvertError> {
    model.ensure_non_empty()?;
    let bounds = model
        .voxels
        .bounds()
        .ok_or_else(|| InputError::EmptyModel { name: model.name.clone() })?;
    let surface = surface_voxels(&model.voxels, model.dims);
    let occupancy = cfg.occupancy_strategy().build(&model.voxels, bounds);
    let exterior = ExteriorMap::classify(&occupancy, bounds);
    log::debug!(
        target: "pipeline",
        "{}: {} voxels, {} surface, {} enclosed void cells",
        model.name,
        model.voxels.len(),
        surface.len(),
        exterior.enclosed_void_count()
    );
    let mut mesh = build_boxy_mesh(&surface, &occupancy, &exterior, &cfg.boxy_params());
    let report = weld(&mut mesh, &cfg.weld_params())?;
    log::debug!(target: "pipeline", "{}: weld {}", model.name, report);
    Ok(mesh)
}

/// Meshes and places every submodel into one scene.
///
/// A submodel that is empty or carries an unusable rotation is skipped with a warning;
/// the call fails only when nothing survives. Returns the scene and the skip count.
pub fn convert_models(
    models: &[SubModel],
    cfg: &ConvertConfig,
) -> Result<(Mesh, usize), ConvertError> {
    if models.is_empty() {
        return Err(InputError::NoModels.into());
    }
    let up = cfg.up_axis();
    let mut scene = Mesh::new();
    let mut skipped = 0;
    let mut last_err = None;
    for model in models {
        let placed = SubModelTransform::from_submodel(model, up)
            .map_err(ConvertError::from)
            .and_then(|xf| Ok((xf, mesh_submodel(model, cfg)?)));
        match placed {
            Ok((xf, part)) => compose(&mut scene, &part, &xf),
            Err(e) => {
                log::warn!(target: "pipeline", "skipping submodel {:?}: {}", model.name, e);
                skipped += 1;
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) if skipped == models.len() => Err(e),
        _ => Ok((scene, skipped)),
    }
}

/// Output faces for the configured mesh type.
pub fn faces_for(mesh: &Mesh, cfg: &ConvertConfig) -> FaceList {
    match cfg.mesh_type {
        MeshType::Quads => merge_quads(mesh, &cfg.quad_params()),
        MeshType::Triangles => FaceList::triangles_only(mesh),
    }
}

/// Converts `job.submodels` into `job.mesh` and writes it to `job.output`.
pub fn run_job(job: &mut ConversionJob, cfg: &ConvertConfig) -> Result<(usize, ObjCounts), ConvertError> {
    let (mesh, skipped) = convert_models(&job.submodels, cfg)?;
    job.mesh = mesh;
    let faces = faces_for(&job.mesh, cfg);
    let counts = write_obj_file(&job.output, &job.mesh, &faces, &cfg.obj_options(job.object_name()))?;
    Ok((skipped, counts))
}

/// Loads `input` through `source` and writes `{stem}_converted.obj` into `out_dir`.
pub fn convert_file(
    source: &dyn ModelSource,
    input: &Path,
    out_dir: &Path,
    cfg: &ConvertConfig,
) -> Result<JobReport, ConvertError> {
    let t0 = Instant::now();
    let mut job = ConversionJob::new(input, out_dir);
    job.submodels = source.load(input)?;
    let (skipped, counts) = run_job(&mut job, cfg)?;
    let t_total_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    log::info!(
        target: "pipeline",
        "{} -> {}: {} submodels ({} skipped), {} vertices, {} quads, {} triangles in {}ms",
        job.input.display(),
        job.output.display(),
        job.submodels.len(),
        skipped,
        counts.vertices,
        counts.quads,
        counts.triangles,
        t_total_ms
    );
    Ok(JobReport {
        input: job.input,
        output: job.output,
        submodels: job.submodels.len(),
        skipped,
        counts,
        t_total_ms,
    })
}
