//! Multi-file conversion on a worker pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::unbounded;
use rayon::ThreadPoolBuilder;
use vox2obj_voxel::ModelSource;

use crate::config::ConvertConfig;
use crate::pipeline::{ConvertError, JobReport, convert_file};

/// Result of one input file.
#[derive(Debug)]
pub struct JobOutcome {
    pub input: PathBuf,
    pub result: Result<JobReport, ConvertError>,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Totals over a finished batch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let mut s = Self::default();
        for o in outcomes {
            match &o.result {
                Ok(_) => s.converted += 1,
                Err(ConvertError::Cancelled) => s.cancelled += 1,
                Err(_) => s.failed += 1,
            }
        }
        s
    }
}

/// Converts every file in `inputs` into `out_dir`, one job per file.
///
/// Jobs run on a dedicated pool sized by [`ConvertConfig::worker_count`]. Each outcome
/// is handed to `on_outcome` as soon as its job finishes; the returned list is in input
/// order. A failing file never stops the others. Once `cancel` is set, jobs that have
/// not started yet report [`ConvertError::Cancelled`].
pub fn run_batch<S, F>(
    source: &S,
    inputs: &[PathBuf],
    out_dir: &Path,
    cfg: &ConvertConfig,
    cancel: &AtomicBool,
    mut on_outcome: F,
) -> Result<Vec<JobOutcome>, ConvertError>
where
    S: ModelSource,
    F: FnMut(&JobOutcome),
{
    let workers = cfg.worker_count(inputs.len());
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("vox2obj-worker-{i}"))
        .build()?;
    log::debug!(target: "batch", "{} files on {} workers", inputs.len(), workers);

    let (tx, rx) = unbounded::<(usize, JobOutcome)>();
    let mut slots: Vec<Option<JobOutcome>> = Vec::with_capacity(inputs.len());
    slots.resize_with(inputs.len(), || None);

    std::thread::scope(|ts| {
        let pool = &pool;
        ts.spawn(move || {
            pool.scope(|s| {
                for (idx, input) in inputs.iter().enumerate() {
                    let tx = tx.clone();
                    s.spawn(move |_| {
                        let result = if cancel.load(Ordering::Relaxed) {
                            Err(ConvertError::Cancelled)
                        } else {
                            convert_file(source, input, out_dir, cfg)
                        };
                        if let Err(e) = &result {
                            if !matches!(e, ConvertError::Cancelled) {
                                log::error!(target: "batch", "{}: {}", input.display(), e);
                            }
                        }
                        let _ = tx.send((
                            idx,
                            JobOutcome {
                                input: input.clone(),
                                result,
                            },
                        ));
                    });
                }
            });
            // last sender; the receiver loop ends when it drops
            drop(tx);
        });
        for (idx, outcome) in rx.iter() {
            on_outcome(&outcome);
            slots[idx] = Some(outcome);
        }
    });

    Ok(slots
        .into_iter()
        .zip(inputs)
        .map(|(slot, input)| {
            slot.unwrap_or_else(|| JobOutcome {
                input: input.clone(),
                result: Err(ConvertError::Cancelled),
            })
        })
        .collect())
}
