use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use vox2obj_io::VoxFileSource;
use vox2obj_runtime::{
    BatchSummary, ConvertConfig, MeshType, OccupancyMode, UpAxisMode, load_config_from_path,
    run_batch,
};

/// Convert MagicaVoxel models to Wavefront OBJ surface meshes.
#[derive(Parser, Debug)]
#[command(name = "vox2obj", version, about, long_about = None)]
struct Args {
    /// Input `.vox` files or directories containing them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for `{stem}_converted.obj` outputs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML settings file; flags given here override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Face type in the output: triangles | quads
    #[arg(long)]
    mesh_type: Option<MeshType>,

    /// Occupancy lookup: dense | sparse
    #[arg(long)]
    occupancy: Option<OccupancyMode>,

    /// Up axis of the source models: z_up | y_up
    #[arg(long)]
    up_axis: Option<UpAxisMode>,

    /// Omit `vn` normals
    #[arg(long)]
    no_normals: bool,

    /// Write faces as plain `f i j k` indices even when normals are written
    #[arg(long)]
    plain_faces: bool,

    /// Emit one face per voxel side instead of merged rectangles
    #[arg(long)]
    no_greedy: bool,

    /// Worker threads (0 = all cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, cfg: &mut ConvertConfig) {
        if let Some(t) = self.mesh_type {
            cfg.mesh_type = t;
        }
        if let Some(o) = self.occupancy {
            cfg.occupancy = o;
        }
        if let Some(u) = self.up_axis {
            cfg.up_axis = u;
        }
        if self.no_normals {
            cfg.write_normals = false;
        }
        if self.plain_faces {
            cfg.normal_refs = false;
        }
        if self.no_greedy {
            cfg.greedy_faces = false;
        }
        if let Some(j) = self.jobs {
            cfg.jobs = j;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = Some(dir.clone());
        }
    }
}

fn is_vox(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("vox"))
}

/// Expands directories to the `.vox` files directly inside them, sorted by name.
fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for p in paths {
        if !p.is_dir() {
            out.push(p.clone());
            continue;
        }
        match std::fs::read_dir(p) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|f| f.is_file() && is_vox(f))
                    .collect();
                found.sort();
                if found.is_empty() {
                    log::warn!("{}: no .vox files", p.display());
                }
                out.extend(found);
            }
            Err(e) => log::error!("{}: {}", p.display(), e),
        }
    }
    out
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut cfg = match &args.config {
        Some(path) => match load_config_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ConvertConfig::default(),
    };
    args.apply(&mut cfg);
    if let Err(e) = cfg.validate() {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let out_dir = cfg.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        log::error!("cannot create {}: {}", out_dir.display(), e);
        return ExitCode::FAILURE;
    }
    let inputs = collect_inputs(&args.inputs);
    if inputs.is_empty() {
        log::error!("nothing to convert");
        return ExitCode::FAILURE;
    }

    let cancel = AtomicBool::new(false);
    let outcomes = match run_batch(&VoxFileSource, &inputs, &out_dir, &cfg, &cancel, |o| {
        log::debug!("finished {}", o.input.display());
    }) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let summary = BatchSummary::from_outcomes(&outcomes);
    log::info!(
        "{} converted, {} failed, {} cancelled",
        summary.converted,
        summary.failed,
        summary.cancelled
    );
    if summary.failed > 0 || summary.cancelled > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
