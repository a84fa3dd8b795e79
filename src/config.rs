// Global configuration management

use crate::engine::core::{
    CLIP_SEQUENCE_PATTERN, CatalogSpec, FRAME_SEQUENCE_PATTERN, IMAGE_EXTENSIONS, Resolution,
    VIDEO_EXTENSIONS, normalize_extensions, normalize_fallback_codec,
};
use crate::engine::merge::MergeSettings;
use crate::engine::runner::LOG_TAIL_LINES;
use crate::engine::tools::{AspectSettings, Img2VidSettings, RotateSettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub img2vid: Img2VidConfig,

    #[serde(default)]
    pub rotate: RotateConfig,

    #[serde(default)]
    pub aspect: AspectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// ffmpeg program name or path
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// ffmpeg output lines kept for error messages
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Target when clips differ in resolution and none is given
    #[serde(default = "default_merge_resolution")]
    pub default_resolution: String,

    #[serde(default = "default_hw_codec")]
    pub codec: String,

    /// "none" disables the fallback
    #[serde(default = "default_fallback_codec")]
    pub fallback_codec: String,

    /// Unset means p4 for NVENC codecs and no preset otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    #[serde(default = "default_video_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_clip_pattern")]
    pub sequence_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Img2VidConfig {
    #[serde(default = "default_framerate")]
    pub framerate: f64,

    #[serde(default = "default_img2vid_resolution")]
    pub resolution: String,

    /// Encode with h264_nvenc
    #[serde(default)]
    pub cuda: bool,

    #[serde(default = "default_image_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_frame_pattern")]
    pub sequence_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateConfig {
    #[serde(default = "default_hw_codec")]
    pub codec: String,

    #[serde(default = "default_rotate_preset")]
    pub preset: String,

    #[serde(default = "default_video_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AspectConfig {
    #[serde(default = "default_hw_codec")]
    pub codec: String,

    #[serde(default = "default_aspect_preset")]
    pub preset: String,

    #[serde(default = "default_video_extensions")]
    pub extensions: Vec<String>,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_log_tail_lines() -> usize {
    LOG_TAIL_LINES
}

fn default_merge_resolution() -> String {
    "1920x1080".to_string()
}

fn default_hw_codec() -> String {
    "h264_nvenc".to_string()
}

fn default_fallback_codec() -> String {
    "libx264".to_string()
}

fn default_video_extensions() -> Vec<String> {
    normalize_extensions(VIDEO_EXTENSIONS)
}

fn default_image_extensions() -> Vec<String> {
    normalize_extensions(IMAGE_EXTENSIONS)
}

fn default_clip_pattern() -> String {
    CLIP_SEQUENCE_PATTERN.to_string()
}

fn default_frame_pattern() -> String {
    FRAME_SEQUENCE_PATTERN.to_string()
}

fn default_framerate() -> f64 {
    2.0
}

fn default_img2vid_resolution() -> String {
    "3840x2160".to_string()
}

fn default_rotate_preset() -> String {
    "p4".to_string()
}

fn default_aspect_preset() -> String {
    "p7".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_resolution: default_merge_resolution(),
            codec: default_hw_codec(),
            fallback_codec: default_fallback_codec(),
            preset: None,
            extensions: default_video_extensions(),
            sequence_pattern: default_clip_pattern(),
        }
    }
}

impl Default for Img2VidConfig {
    fn default() -> Self {
        Self {
            framerate: default_framerate(),
            resolution: default_img2vid_resolution(),
            cuda: false,
            extensions: default_image_extensions(),
            sequence_pattern: default_frame_pattern(),
        }
    }
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            codec: default_hw_codec(),
            preset: default_rotate_preset(),
            extensions: default_video_extensions(),
        }
    }
}

impl Default for AspectConfig {
    fn default() -> Self {
        Self {
            codec: default_hw_codec(),
            preset: default_aspect_preset(),
            extensions: default_video_extensions(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("vidtools")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("vidtools")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // A read-only config dir is not fatal
            if let Err(e) = config.save() {
                warn!("Could not create default config file: {:#}", e);
                warn!(
                    "Using built-in defaults. Run 'vidtools init-config' to create a config file."
                );
            }

            Ok(config)
        }
    }

    /// Like `load`, but fall back to defaults (with a warning) on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("{:#}", e);
            warn!("Using built-in defaults.");
            Config::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Merge settings before CLI overrides
    pub fn merge_settings(&self) -> Result<MergeSettings> {
        let default_resolution: Resolution = self
            .merge
            .default_resolution
            .parse()
            .context("Invalid [merge] default_resolution in config")?;
        let catalog = CatalogSpec::new(&self.merge.extensions, &self.merge.sequence_pattern)
            .context("Invalid [merge] catalog settings in config")?;

        Ok(MergeSettings {
            ffmpeg: self.tools.ffmpeg.clone(),
            ffprobe: self.tools.ffprobe.clone(),
            codec: self.merge.codec.clone(),
            fallback_codec: normalize_fallback_codec(Some(&self.merge.fallback_codec)),
            preset: self.merge.preset.clone(),
            resolution: None,
            default_resolution,
            catalog,
        })
    }

    pub fn img2vid_settings(&self) -> Result<Img2VidSettings> {
        let resolution: Resolution = self
            .img2vid
            .resolution
            .parse()
            .context("Invalid [img2vid] resolution in config")?;
        let catalog = CatalogSpec::new(&self.img2vid.extensions, &self.img2vid.sequence_pattern)
            .context("Invalid [img2vid] catalog settings in config")?;

        Ok(Img2VidSettings {
            ffmpeg: self.tools.ffmpeg.clone(),
            framerate: self.img2vid.framerate,
            resolution,
            cuda: self.img2vid.cuda,
            catalog,
        })
    }

    pub fn rotate_settings(&self) -> RotateSettings {
        RotateSettings {
            ffmpeg: self.tools.ffmpeg.clone(),
            codec: self.rotate.codec.clone(),
            preset: self.rotate.preset.clone(),
            extensions: normalize_extensions(&self.rotate.extensions),
        }
    }

    pub fn aspect_settings(&self) -> AspectSettings {
        AspectSettings {
            ffmpeg: self.tools.ffmpeg.clone(),
            codec: self.aspect.codec.clone(),
            preset: self.aspect.preset.clone(),
            extensions: normalize_extensions(&self.aspect.extensions),
        }
    }
}
