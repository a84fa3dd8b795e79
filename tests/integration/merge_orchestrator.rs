// End-to-end merge runs against a scripted runner and a fixed probe

use crate::common::fakes::{FixedProbe, ScriptedRunner};
use crate::common::helpers::{file_names, folder_with_files};
use std::path::Path;
use tempfile::TempDir;
use vidtools::engine::merge::{plan_candidates, run_candidates};
use vidtools::engine::{EncodeOutcome, MergeSettings, Resolution, ToolError, merge_folder};

const CLIPS: &[&str] = &["trip_0003.mp4", "trip_0001.mp4", "trip_0002.mov", "cover.jpg"];

fn hd_probe() -> FixedProbe {
    FixedProbe::new(&[
        ("trip_0001.mp4", 1920, 1080),
        ("trip_0002.mov", 1920, 1080),
        ("trip_0003.mp4", 1920, 1080),
    ])
}

fn concat_path(argv: &[String]) -> String {
    let i = argv.iter().position(|a| a == "-i").unwrap();
    argv[i + 1].clone()
}

#[test]
fn test_uniform_clips_merge_without_scaling() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", CLIPS);
    let output_dir = root.path().join("out");
    let runner = ScriptedRunner::succeeding();
    let probe = hd_probe();

    let report = merge_folder(&input, &output_dir, &MergeSettings::default(), &runner, &probe)
        .unwrap();

    let runs = runner.runs();
    assert_eq!(runs.len(), 1, "one primary invocation");
    let run = &runs[0];
    assert_eq!(run.value_after("-c:v"), Some("h264_nvenc"));
    assert_eq!(run.value_after("-preset"), Some("p4"));
    assert!(!run.has_flag("-vf"), "uniform clips are not rescaled");
    assert!(!run.has_flag("-hwaccel_output_format"));

    assert_eq!(report.output, output_dir.join("trip.mp4"));
    assert_eq!(report.clips, 3);
    assert_eq!(report.target, None);
    assert_eq!(report.attempts_run, 1);
    assert_eq!(probe.calls(), 3);

    // Manifest lists clips by sequence number and is gone afterwards
    let list = run.concat_list.as_deref().unwrap();
    let order: Vec<&str> = list
        .lines()
        .map(|l| l.rsplit('/').next().unwrap().trim_end_matches('\''))
        .collect();
    assert_eq!(order, vec!["trip_0001.mp4", "trip_0002.mov", "trip_0003.mp4"]);
    assert!(list.lines().all(|l| l.starts_with("file '")));
    assert!(!Path::new(&concat_path(&run.argv)).exists());
    assert_eq!(file_names(&output_dir), vec!["trip.mp4"]);
}

#[test]
fn test_mixed_clips_scale_to_default_resolution() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "mixed", &["a_0001.mp4", "a_0002.mp4", "a_0003.mp4"]);
    let output_dir = root.path().join("out");
    let runner = ScriptedRunner::succeeding();
    let probe = FixedProbe::new(&[
        ("a_0001.mp4", 1920, 1080),
        ("a_0002.mp4", 1280, 720),
        ("a_0003.mp4", 1920, 1080),
    ]);
    let settings = MergeSettings {
        default_resolution: Resolution::new(1920, 1080).unwrap(),
        ..Default::default()
    };

    let report = merge_folder(&input, &output_dir, &settings, &runner, &probe).unwrap();

    assert_eq!(report.target, Some(Resolution::new(1920, 1080).unwrap()));
    assert!(report.attempt.hw_scaling);
    assert_eq!(probe.calls(), 2, "probing stops at the first mismatch");

    let runs = runner.runs();
    assert_eq!(runs.len(), 1);
    let filter = runs[0].value_after("-vf").unwrap();
    assert!(filter.starts_with("scale_cuda="));
    assert!(filter.contains("pad=1920:1080:(ow-iw)/2:(oh-ih)/2"));
    assert_eq!(runs[0].value_after("-hwaccel_output_format"), Some("cuda"));
}

#[test]
fn test_explicit_resolution_skips_probe() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", CLIPS);
    let runner = ScriptedRunner::succeeding();
    let probe = FixedProbe::default();
    let settings = MergeSettings {
        codec: "libx264".to_string(),
        resolution: Some(Resolution::new(1280, 720).unwrap()),
        ..Default::default()
    };

    merge_folder(&input, root.path(), &settings, &runner, &probe).unwrap();

    assert_eq!(probe.calls(), 0);
    let runs = runner.runs();
    assert_eq!(
        runs[0].value_after("-vf"),
        Some(
            "scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2,setsar=1"
        )
    );
    assert!(!runs[0].has_flag("-preset"));
    assert_eq!(runs[0].value_after("-pix_fmt"), Some("yuv420p"));
}

#[test]
fn test_all_candidates_fail_reports_last_tail() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", CLIPS);
    let output_dir = root.path().join("out");
    let runner = ScriptedRunner::with_exit_codes(&[1, 1, 187]);
    let probe = hd_probe();
    let settings = MergeSettings {
        resolution: Some(Resolution::new(1920, 1080).unwrap()),
        ..Default::default()
    };

    let err = merge_folder(&input, &output_dir, &settings, &runner, &probe).unwrap_err();

    match err {
        ToolError::EncodeFailed { code, tail } => {
            assert_eq!(code, 187);
            assert_eq!(tail, vec!["attempt 3 log".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let runs = runner.runs();
    assert_eq!(runs.len(), 3);
    let attempts: Vec<(Option<&str>, bool)> = runs
        .iter()
        .map(|r| {
            let scaled_on_gpu = r.value_after("-vf").is_some_and(|f| f.starts_with("scale_cuda"));
            (r.value_after("-c:v"), scaled_on_gpu)
        })
        .collect();
    assert_eq!(
        attempts,
        vec![
            (Some("h264_nvenc"), true),
            (Some("h264_nvenc"), false),
            (Some("libx264"), false),
        ]
    );

    // Neither the partial output nor the manifest survives
    assert!(file_names(&output_dir).is_empty());
    assert!(!Path::new(&concat_path(&runs[0].argv)).exists());
}

#[test]
fn test_fallback_codec_success() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", CLIPS);
    let runner = ScriptedRunner::with_exit_codes(&[1, 0]);
    let probe = hd_probe();

    let report =
        merge_folder(&input, root.path(), &MergeSettings::default(), &runner, &probe).unwrap();

    assert!(report.attempt.fallback);
    assert_eq!(report.attempt.codec, "libx264");
    assert_eq!(report.attempts_run, 2);
    assert!(report.output.exists());
}

#[test]
fn test_disabled_fallback_fails_after_primary() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", CLIPS);
    let runner = ScriptedRunner::with_exit_codes(&[1]);
    let probe = hd_probe();
    let settings = MergeSettings::default().with_fallback(Some("off"));

    let err = merge_folder(&input, root.path(), &settings, &runner, &probe).unwrap_err();
    assert!(matches!(err, ToolError::EncodeFailed { code: 1, .. }));
    assert_eq!(runner.runs().len(), 1);
}

#[test]
fn test_folder_without_numbered_clips_runs_nothing() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "loose", &["holiday.mp4", "cover.jpg"]);
    let runner = ScriptedRunner::succeeding();

    let err = merge_folder(
        &input,
        root.path(),
        &MergeSettings::default(),
        &runner,
        &FixedProbe::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ToolError::NoMatchingFiles { .. }));
    assert!(runner.runs().is_empty());
}

#[test]
fn test_probe_failure_aborts_before_encoding() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", CLIPS);
    let runner = ScriptedRunner::succeeding();
    let probe = FixedProbe::new(&[("trip_0001.mp4", 1920, 1080)]);

    let err =
        merge_folder(&input, root.path(), &MergeSettings::default(), &runner, &probe).unwrap_err();
    assert!(matches!(err, ToolError::Probe { .. }));
    assert!(runner.runs().is_empty());
}

#[test]
fn test_runner_error_stops_attempts() {
    let runner = ScriptedRunner::default();
    runner.push(Err(ToolError::Interrupted));
    let candidates = plan_candidates("h264_nvenc", Some("libx264"), None, None);
    let root = TempDir::new().unwrap();

    let err = run_candidates(
        &runner,
        "ffmpeg",
        &root.path().join("list.txt"),
        &root.path().join("out.mp4"),
        &candidates,
    )
    .unwrap_err();
    assert!(matches!(err, ToolError::Interrupted));
    assert_eq!(runner.runs().len(), 1);
    assert!(!root.path().join("out.mp4").exists());
}

#[test]
fn test_interrupted_merge_stops_and_cleans_up() {
    let root = TempDir::new().unwrap();
    let input = folder_with_files(&root, "trip", &["trip_0001.mp4", "trip_0002.mp4"]);
    let output_dir = root.path().join("out");
    let runner = ScriptedRunner::default();
    runner.push(Err(ToolError::Interrupted));
    let probe = FixedProbe::new(&[("trip_0001.mp4", 1920, 1080), ("trip_0002.mp4", 1280, 720)]);

    let err =
        merge_folder(&input, &output_dir, &MergeSettings::default(), &runner, &probe).unwrap_err();

    assert!(matches!(err, ToolError::Interrupted));
    // CUDA, CPU and fallback were planned; only the first ran
    let runs = runner.runs();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].value_after("-vf").is_some_and(|f| f.starts_with("scale_cuda")));
    assert!(runs[0].concat_list.is_some());
    assert!(!Path::new(&concat_path(&runs[0].argv)).exists());
    assert!(!output_dir.join("trip.mp4").exists());
}

#[test]
fn test_empty_tail_is_reported() {
    let runner = ScriptedRunner::default();
    runner.push(Ok(EncodeOutcome {
        code: 1,
        tail: Vec::new(),
    }));
    let candidates = plan_candidates("libx264", None, None, None);
    let root = TempDir::new().unwrap();

    let err = run_candidates(
        &runner,
        "ffmpeg",
        &root.path().join("list.txt"),
        &root.path().join("out.mp4"),
        &candidates,
    )
    .unwrap_err();
    assert!(err.to_string().contains("(ffmpeg produced no output)"));
}
