// Rotate, aspect and img2vid against the scripted runner

use crate::common::fakes::{FixedProbe, ScriptedRunner};
use crate::common::helpers::{file_names, folder_with_files};
use std::fs;
use tempfile::TempDir;
use vidtools::engine::tools::{
    AspectRatio, AspectSettings, Img2VidSettings, RotateSettings, Rotation, VideoInputs,
    adjust_aspect_videos, img2vid_folder, rotate_videos,
};
use vidtools::engine::{Task, TaskEnv, TaskReport, ToolError};

#[test]
fn test_rotate_in_place_replaces_original() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(&root, "videos", &["b.mp4", "a.mov", "readme.txt"]);
    let runner = ScriptedRunner::succeeding();
    let inputs = VideoInputs {
        folder: Some(folder.clone()),
        ..Default::default()
    };

    let reports =
        rotate_videos(&inputs, Rotation::Clockwise, &RotateSettings::default(), &runner).unwrap();

    assert_eq!(reports.len(), 2);
    let runs = runner.runs();
    assert!(runs[0].value_after("-i").unwrap().ends_with("a.mov"));
    assert!(runs[0].output().ends_with("a.rotating.mov"));
    assert_eq!(runs[0].value_after("-vf"), Some("transpose=1"));
    assert_eq!(reports[0].output, reports[0].source);

    // The temp files were renamed over the originals
    assert_eq!(file_names(&folder), vec!["a.mov", "b.mp4", "readme.txt"]);
    assert_eq!(fs::read(folder.join("a.mov")).unwrap(), b"encoded");
}

#[test]
fn test_rotate_into_output_folder() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(&root, "videos", &["clip.mp4"]);
    let extra = folder_with_files(&root, "elsewhere", &["extra.mkv"]);
    let out = root.path().join("rotated");
    let runner = ScriptedRunner::succeeding();
    let inputs = VideoInputs {
        folder: Some(folder.clone()),
        files: vec![extra.join("extra.mkv"), folder.join("clip.mp4")],
        output_dir: Some(out.clone()),
    };

    let reports = rotate_videos(
        &inputs,
        Rotation::CounterClockwise,
        &RotateSettings::default(),
        &runner,
    )
    .unwrap();

    assert_eq!(reports.len(), 2, "duplicates are processed once");
    assert_eq!(file_names(&out), vec!["clip.mp4", "extra.mkv"]);
    assert_eq!(fs::read(folder.join("clip.mp4")).unwrap(), b"data");
}

#[test]
fn test_failed_in_place_rotation_keeps_original() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(&root, "videos", &["clip.mp4", "later.mp4"]);
    let runner = ScriptedRunner::with_exit_codes(&[1]);
    let inputs = VideoInputs {
        folder: Some(folder.clone()),
        ..Default::default()
    };

    let err = rotate_videos(&inputs, Rotation::Clockwise, &RotateSettings::default(), &runner)
        .unwrap_err();

    assert!(matches!(err, ToolError::EncodeFailed { code: 1, .. }));
    assert_eq!(runner.runs().len(), 1, "stops at the first failure");
    assert_eq!(file_names(&folder), vec!["clip.mp4", "later.mp4"]);
    assert_eq!(fs::read(folder.join("clip.mp4")).unwrap(), b"data");
}

#[test]
fn test_aspect_passes_probed_bitrate() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(&root, "videos", &["clip.mp4"]);
    let runner = ScriptedRunner::succeeding();
    let probe = FixedProbe::default().with_bitrate("4500000");
    let inputs = VideoInputs {
        files: vec![folder.join("clip.mp4")],
        ..Default::default()
    };

    adjust_aspect_videos(
        &inputs,
        AspectRatio::Portrait,
        &AspectSettings::default(),
        &runner,
        &probe,
    )
    .unwrap();

    let runs = runner.runs();
    assert_eq!(runs[0].value_after("-vf"), Some("scale=ih*(9/16):ih,setdar=9/16"));
    assert_eq!(runs[0].value_after("-preset"), Some("p7"));
    assert_eq!(runs[0].value_after("-b:v"), Some("4500000"));
    assert!(runs[0].output().ends_with("clip.processing.mp4"));
    assert_eq!(file_names(&folder), vec!["clip.mp4"]);
}

#[test]
fn test_img2vid_links_frames_in_order() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(
        &root,
        "holiday",
        &["IMG_2003.jpg", "IMG_2001.jpg", "IMG_2002.jpg", "thumb.jpg"],
    );
    let out = root.path().join("videos");
    let runner = ScriptedRunner::succeeding();

    let output = img2vid_folder(&folder, &out, &Img2VidSettings::default(), &runner).unwrap();

    assert_eq!(output, out.join("holiday.mp4"));
    let runs = runner.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].value_after("-framerate"), Some("2.0"));
    assert_eq!(runs[0].value_after("-c:v"), Some("libx264"));
    let pattern = runs[0].value_after("-i").unwrap();
    assert!(pattern.ends_with("%04d.jpg"));
    // Scratch links are cleaned up with their folder
    let scratch = std::path::Path::new(pattern).parent().unwrap();
    assert!(!scratch.exists());
}

#[test]
fn test_img2vid_failure_removes_output() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(&root, "frames", &["f_0001.png", "f_0002.png"]);
    let out = root.path().join("videos");
    let runner = ScriptedRunner::with_exit_codes(&[69]);

    let err = img2vid_folder(&folder, &out, &Img2VidSettings::default(), &runner).unwrap_err();

    assert!(matches!(err, ToolError::EncodeFailed { code: 69, .. }));
    assert!(file_names(&out).is_empty());
}

#[test]
fn test_img2vid_task_skips_folder_without_frames() {
    let root = TempDir::new().unwrap();
    let folder = folder_with_files(&root, "misc", &["cover.png"]);
    let runner = ScriptedRunner::succeeding();
    let probe = FixedProbe::default();
    let task = Task::Img2Vid(Img2VidSettings::default());

    let report = task
        .run(
            &folder,
            &root.path().join("videos"),
            TaskEnv {
                runner: &runner,
                probe: &probe,
            },
        )
        .unwrap();

    assert!(matches!(report, TaskReport::Skipped { .. }));
    assert!(runner.runs().is_empty());
}
