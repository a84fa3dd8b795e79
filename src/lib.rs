// Batch ffmpeg tools: clip merging, image sequences, rotation and aspect ratio

pub mod config;
pub mod engine;
