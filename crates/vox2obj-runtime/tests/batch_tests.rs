use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use vox2obj_io::read_obj_counts;
use vox2obj_runtime::{BatchSummary, ConvertConfig, ConvertError, MeshType, convert_file, run_batch};
use vox2obj_voxel::{InputError, ModelSource, SubModel, Voxel, VoxelSet};

/// Serves an `n`-cube for `cube{n}.vox` and fails every other path.
struct FakeSource;

impl ModelSource for FakeSource {
    fn load(&self, path: &Path) -> Result<Vec<SubModel>, InputError> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let Some(n) = stem.strip_prefix("cube").and_then(|n| n.parse::<i32>().ok()) else {
            return Err(InputError::Unreadable {
                path: path.to_path_buf(),
                reason: "not a cube".into(),
            });
        };
        let mut set = VoxelSet::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    set.insert(Voxel::new(x, y, z));
                }
            }
        }
        Ok(vec![SubModel::new(stem, set, (n as usize, n as usize, n as usize))])
    }
}

fn out_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vox2obj-runtime-{}-{}", tag, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn single_file_writes_obj() {
    let dir = out_dir("single");
    let report = convert_file(&FakeSource, Path::new("in/cube2.vox"), &dir, &ConvertConfig::default()).unwrap();
    assert_eq!(report.output, dir.join("cube2_converted.obj"));
    let counts = read_obj_counts(BufReader::new(File::open(&report.output).unwrap())).unwrap();
    assert_eq!(counts, report.counts);
    assert_eq!(counts.vertices, 8);
    assert_eq!(counts.quads, 6);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn batch_continues_after_failing_file() {
    let dir = out_dir("batch");
    let inputs: Vec<PathBuf> = ["cube1.vox", "broken.vox", "cube3.vox", "cube2.vox"]
        .iter()
        .map(PathBuf::from)
        .collect();
    let cfg = ConvertConfig {
        jobs: 2,
        mesh_type: MeshType::Triangles,
        ..ConvertConfig::default()
    };
    let cancel = AtomicBool::new(false);
    let mut streamed = 0;
    let outcomes = run_batch(&FakeSource, &inputs, &dir, &cfg, &cancel, |_| streamed += 1).unwrap();
    assert_eq!(streamed, 4);
    assert_eq!(outcomes.len(), 4);
    for (o, input) in outcomes.iter().zip(&inputs) {
        assert_eq!(&o.input, input);
    }
    assert!(matches!(
        outcomes[1].result,
        Err(ConvertError::Input(InputError::Unreadable { .. }))
    ));
    assert_eq!(
        BatchSummary::from_outcomes(&outcomes),
        BatchSummary { converted: 3, failed: 1, cancelled: 0 }
    );
    assert!(dir.join("cube3_converted.obj").exists());
    assert!(!dir.join("broken_converted.obj").exists());
    let report = outcomes[2].result.as_ref().unwrap();
    // 3x3x3 cube, greedy faces, triangles only
    assert_eq!(report.counts.triangles, 12);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn cancelled_batch_converts_nothing() {
    let dir = out_dir("cancel");
    let inputs = vec![PathBuf::from("cube1.vox"), PathBuf::from("cube2.vox")];
    let cancel = AtomicBool::new(true);
    let outcomes = run_batch(&FakeSource, &inputs, &dir, &ConvertConfig::default(), &cancel, |_| {}).unwrap();
    assert_eq!(
        BatchSummary::from_outcomes(&outcomes),
        BatchSummary { converted: 0, failed: 0, cancelled: 2 }
    );
    assert!(!dir.join("cube1_converted.obj").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}
