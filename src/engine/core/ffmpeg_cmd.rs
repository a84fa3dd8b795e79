use super::types::{EncodeAttempt, Resolution};
use std::path::Path;

/// Codec names with this suffix run on NVIDIA hardware (NVENC)
pub const HW_CODEC_SUFFIX: &str = "_nvenc";

/// Preset used for NVENC codecs when none is given
pub const HW_DEFAULT_PRESET: &str = "p4";

/// Values of `--fallback-codec` that switch the fallback off
const FALLBACK_DISABLED: &[&str] = &["", "none", "false", "off"];

/// Check whether a codec is a hardware (NVENC) encoder
pub fn is_hw_codec(codec: &str) -> bool {
    codec.to_ascii_lowercase().ends_with(HW_CODEC_SUFFIX)
}

/// An explicit preset always wins; NVENC codecs otherwise default to p4,
/// everything else gets no preset flag.
pub fn resolve_preset(codec: &str, explicit: Option<&str>) -> Option<String> {
    match explicit {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ if is_hw_codec(codec) => Some(HW_DEFAULT_PRESET.to_string()),
        _ => None,
    }
}

/// Map the disabling sentinels (`none`, `off`, ...) to no fallback
pub fn normalize_fallback_codec(value: Option<&str>) -> Option<String> {
    let value = value?;
    let lowered = value.trim().to_ascii_lowercase();
    if FALLBACK_DISABLED.contains(&lowered.as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Filter graph that fits clips into a frame, plus whether it consumes
/// frames that live on the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleFilter {
    pub graph: String,
    pub needs_hw_frames: bool,
}

/// Scale and letterbox to `resolution`, on the GPU when `use_hw_scaling`.
///
/// The CUDA chain picks the driving dimension from the aspect ratio so the
/// frame is never stretched, downloads to system memory for padding and
/// converts back to yuv420p.
pub fn build_resize_filter(
    resolution: Option<Resolution>,
    use_hw_scaling: bool,
) -> Option<ScaleFilter> {
    let target = resolution?;
    let Resolution { width, height } = target;
    let pad = format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2", w = width, h = height);

    if use_hw_scaling {
        let ratio = format!("{:.6}", target.aspect_ratio());
        let scale = format!(
            "scale_cuda=w='if(gt(iw/ih,{r}),{w},-2)':h='if(gt(iw/ih,{r}),-2,{h})'",
            r = ratio,
            w = width,
            h = height
        );
        let graph = [
            scale.as_str(),
            "hwdownload",
            "format=nv12",
            pad.as_str(),
            "format=yuv420p",
            "setsar=1",
        ]
        .join(",");
        return Some(ScaleFilter {
            graph,
            needs_hw_frames: true,
        });
    }

    let scale = format!(
        "scale={}:{}:force_original_aspect_ratio=decrease",
        width, height
    );
    Some(ScaleFilter {
        graph: [scale.as_str(), pad.as_str(), "setsar=1"].join(","),
        needs_hw_frames: false,
    })
}

/// Build the full argument vector (program first) for one merge attempt.
///
/// `-hwaccel` must come before `-i` or ffmpeg applies it to the output.
pub fn build_merge_args(
    ffmpeg: &str,
    concat_list: &Path,
    output: &Path,
    attempt: &EncodeAttempt,
) -> Vec<String> {
    let hw_codec = is_hw_codec(&attempt.codec);
    let filter = build_resize_filter(attempt.resolution, attempt.hw_scaling);
    let needs_hw_frames = hw_codec && filter.as_ref().is_some_and(|f| f.needs_hw_frames);

    let mut args: Vec<String> = vec![
        ffmpeg.to_string(),
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "info".into(),
    ];
    if hw_codec {
        args.extend(["-hwaccel".into(), "cuda".into()]);
    }
    if needs_hw_frames {
        args.extend(["-hwaccel_output_format".into(), "cuda".into()]);
    }
    args.extend([
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        concat_list.to_string_lossy().into_owned(),
        "-c:v".into(),
        attempt.codec.clone(),
    ]);
    if let Some(preset) = resolve_preset(&attempt.codec, attempt.preset.as_deref()) {
        args.extend(["-preset".into(), preset]);
    }
    if let Some(filter) = filter {
        args.extend(["-vf".into(), filter.graph]);
    }
    if !hw_codec {
        args.extend(["-pix_fmt".into(), "yuv420p".into()]);
    }
    args.extend([
        "-c:a".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}

/// Format an argument vector as a shell-safe command line for display
pub fn format_command(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}
