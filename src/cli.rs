use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vidtools::engine::Resolution;
use vidtools::engine::tools::{AspectRatio, Rotation};

#[derive(Parser)]
#[command(name = "vidtools")]
#[command(about = "Batch ffmpeg tools for numbered clips and image sequences", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug output (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge numbered clips (clip_0001.mp4, ...) of a folder into one video
    Merge {
        /// Folder containing the clips
        input: PathBuf,

        /// Folder to write <input name>.mp4 into
        output: PathBuf,

        #[command(flatten)]
        opts: MergeOpts,
    },

    /// Turn a numbered image sequence into a video
    #[command(name = "img2vid")]
    Img2Vid {
        /// Folder containing the images
        input: PathBuf,

        /// Folder to write <input name>.mp4 into
        output: PathBuf,

        #[command(flatten)]
        opts: Img2VidOpts,
    },

    /// Rotate videos by 90 degrees
    Rotate(RotateArgs),

    /// Change the display aspect ratio of videos
    Aspect(AspectArgs),

    /// Run merge or img2vid over several folders in the background
    Batch {
        #[command(subcommand)]
        tool: BatchTool,
    },

    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Subcommand)]
pub enum BatchTool {
    /// Merge the clips of each folder
    Merge {
        /// Folder receiving one video per input folder
        #[arg(short, long)]
        output: PathBuf,

        /// Folders to process, in order
        #[arg(required = true)]
        folders: Vec<PathBuf>,

        #[command(flatten)]
        opts: MergeOpts,
    },

    /// Encode the image sequence of each folder
    #[command(name = "img2vid")]
    Img2Vid {
        /// Folder receiving one video per input folder
        #[arg(short, long)]
        output: PathBuf,

        /// Folders to process, in order
        #[arg(required = true)]
        folders: Vec<PathBuf>,

        #[command(flatten)]
        opts: Img2VidOpts,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct MergeOpts {
    /// Target resolution WIDTHxHEIGHT (default: keep uniform clips, else config default)
    #[arg(short = 's', long)]
    pub resolution: Option<Resolution>,

    /// Video codec (default from config: h264_nvenc)
    #[arg(long)]
    pub codec: Option<String>,

    /// Encoder preset (default: p4 for NVENC codecs)
    #[arg(long)]
    pub preset: Option<String>,

    /// Codec to retry with when the primary fails ("none" disables)
    #[arg(long)]
    pub fallback_codec: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Img2VidOpts {
    /// Frames per second (default from config: 2.0)
    #[arg(short, long)]
    pub framerate: Option<f64>,

    /// Output resolution WIDTHxHEIGHT (default from config: 3840x2160)
    #[arg(short = 's', long)]
    pub resolution: Option<Resolution>,

    /// Encode with h264_nvenc instead of libx264
    #[arg(long)]
    pub cuda: bool,
}

/// Inputs shared by the per-file tools
#[derive(Args, Debug, Clone)]
pub struct FileInputs {
    /// Folder whose videos are processed
    pub input: Option<PathBuf>,

    /// Output folder (default: overwrite the inputs)
    pub output: Option<PathBuf>,

    /// Extra video file; may be given several times
    #[arg(short = 'v', long = "video-file")]
    pub video_files: Vec<PathBuf>,

    /// Output folder; takes precedence over the positional one
    #[arg(short = 'o', long = "output-folder")]
    pub output_folder: Option<PathBuf>,

    /// Encoder preset (default from config)
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RotateArgs {
    /// clockwise or counter-clockwise
    #[arg(short, long)]
    pub rotation: Rotation,

    #[command(flatten)]
    pub files: FileInputs,
}

#[derive(Args, Debug, Clone)]
pub struct AspectArgs {
    /// 16:9, 4:3, 1:1 or 9:16
    #[arg(short, long)]
    pub ratio: AspectRatio,

    #[command(flatten)]
    pub files: FileInputs,
}

pub fn parse() -> Cli {
    Cli::parse()
}
