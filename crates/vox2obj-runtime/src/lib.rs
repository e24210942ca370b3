//! Conversion pipeline, batch runner and configuration.
#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod pipeline;

pub use batch::{BatchSummary, JobOutcome, run_batch};
pub use config::{
    ConfigError, ConvertConfig, MeshType, OccupancyMode, QuadConfig, UpAxisMode, WeldConfig,
    load_config_from_path,
};
pub use pipeline::{
    ConversionJob, ConvertError, JobReport, convert_file, convert_models, faces_for,
    mesh_submodel, run_job,
};
