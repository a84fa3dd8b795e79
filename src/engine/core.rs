mod error;
mod ffmpeg_cmd;
mod ffmpeg_info;
mod manifest;
mod scan;
mod types;

pub use error::ToolError;
pub use ffmpeg_cmd::{
    HW_CODEC_SUFFIX, HW_DEFAULT_PRESET, ScaleFilter, build_merge_args, build_resize_filter,
    format_command, is_hw_codec, normalize_fallback_codec, resolve_preset,
};
pub use ffmpeg_info::{
    encoder_available, encoder_listed, ensure_tools_available, ffmpeg_version, ffprobe_version,
};
pub use manifest::{ConcatManifest, concat_entry};
pub use scan::{
    CLIP_SEQUENCE_PATTERN, CatalogSpec, FRAME_SEQUENCE_PATTERN, IMAGE_EXTENSIONS,
    SequencePattern, VIDEO_EXTENSIONS, has_extension, list_files, normalize_extensions,
    resolve_folder, scan,
};
pub use types::{EncodeAttempt, EncodeOutcome, MediaFile, Resolution, SequenceNumber};
