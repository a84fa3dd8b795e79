use crate::cli::{
    AspectArgs, BatchTool, Cli, Commands, FileInputs, Img2VidOpts, MergeOpts, RotateArgs,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use vidtools::config::Config;
use vidtools::engine::{
    self, BatchJob, BatchWorker, CancelToken, FfprobeProbe, MergeSettings, ProcessRunner, Task,
    TaskEnv, TaskReport, WorkerMessage, tools,
};

/// Log to stderr; `--verbose` lowers the default level to debug.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) {
    let result = match cli.command {
        Commands::Merge {
            input,
            output,
            opts,
        } => handle_merge(&input, &output, &opts),
        Commands::Img2Vid {
            input,
            output,
            opts,
        } => handle_img2vid(&input, &output, &opts),
        Commands::Rotate(args) => handle_rotate(&args),
        Commands::Aspect(args) => handle_aspect(&args),
        Commands::Batch { tool } => handle_batch(tool),
        Commands::CheckFfmpeg => {
            handle_check_ffmpeg();
            return;
        }
        Commands::InitConfig => {
            handle_init_config();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn merge_settings(config: &Config, opts: &MergeOpts) -> Result<MergeSettings> {
    let mut settings = config.merge_settings()?;
    if let Some(codec) = &opts.codec {
        settings.codec = codec.clone();
    }
    if opts.preset.is_some() {
        settings.preset = opts.preset.clone();
    }
    if let Some(fallback) = &opts.fallback_codec {
        settings = settings.with_fallback(Some(fallback));
    }
    settings.resolution = opts.resolution;
    Ok(settings)
}

fn img2vid_settings(config: &Config, opts: &Img2VidOpts) -> Result<tools::Img2VidSettings> {
    let mut settings = config.img2vid_settings()?;
    if let Some(framerate) = opts.framerate {
        settings.framerate = framerate;
    }
    if let Some(resolution) = opts.resolution {
        settings.resolution = resolution;
    }
    settings.cuda |= opts.cuda;
    Ok(settings)
}

/// SIGINT stops the running ffmpeg rather than killing us outright
fn cancel_token() -> CancelToken {
    let token = CancelToken::new();
    if !engine::install_interrupt_handler(&token) {
        tracing::debug!("No interrupt handler installed");
    }
    token
}

fn process_runner(config: &Config, cancel: CancelToken) -> ProcessRunner {
    ProcessRunner::new(cancel).with_tail_lines(config.tools.log_tail_lines)
}

fn run_folder_task(task: Task, input: &Path, output: &Path, config: &Config) -> Result<()> {
    engine::ensure_tools_available(&task.required_tools())?;
    let runner = process_runner(config, cancel_token());
    let probe = FfprobeProbe::new(&config.tools.ffprobe);
    let env = TaskEnv {
        runner: &runner,
        probe: &probe,
    };

    match task.run(input, output, env)? {
        TaskReport::Completed { output, summary } => {
            println!("{}", summary);
            println!("Video written to {}", output.display());
        }
        TaskReport::Skipped { reason } => println!("Info: {}", reason),
    }
    Ok(())
}

fn handle_merge(input: &Path, output: &Path, opts: &MergeOpts) -> Result<()> {
    let config = Config::load_or_default();
    let task = Task::Merge(merge_settings(&config, opts)?);
    run_folder_task(task, input, output, &config)
}

fn handle_img2vid(input: &Path, output: &Path, opts: &Img2VidOpts) -> Result<()> {
    let config = Config::load_or_default();
    let task = Task::Img2Vid(img2vid_settings(&config, opts)?);
    run_folder_task(task, input, output, &config)
}

fn video_inputs(files: &FileInputs) -> tools::VideoInputs {
    tools::VideoInputs {
        folder: files.input.clone(),
        files: files.video_files.clone(),
        output_dir: files.output_folder.clone().or_else(|| files.output.clone()),
    }
}

fn handle_rotate(args: &RotateArgs) -> Result<()> {
    let config = Config::load_or_default();
    let mut settings = config.rotate_settings();
    if let Some(preset) = &args.files.preset {
        settings.preset = preset.clone();
    }
    engine::ensure_tools_available(&[&settings.ffmpeg])?;

    let runner = process_runner(&config, cancel_token());
    let reports = tools::rotate_videos(
        &video_inputs(&args.files),
        args.rotation,
        &settings,
        &runner,
    )?;
    for report in &reports {
        println!(
            "Rotated {} -> {}",
            file_name(&report.source),
            report.output.display()
        );
    }
    println!("Successfully rotated {} file(s).", reports.len());
    Ok(())
}

fn handle_aspect(args: &AspectArgs) -> Result<()> {
    let config = Config::load_or_default();
    let mut settings = config.aspect_settings();
    if let Some(preset) = &args.files.preset {
        settings.preset = preset.clone();
    }
    engine::ensure_tools_available(&[&settings.ffmpeg])?;

    let runner = process_runner(&config, cancel_token());
    let probe = FfprobeProbe::new(&config.tools.ffprobe);
    let reports = tools::adjust_aspect_videos(
        &video_inputs(&args.files),
        args.ratio,
        &settings,
        &runner,
        &probe,
    )?;
    for report in &reports {
        println!(
            "Changed {} to {} -> {}",
            file_name(&report.source),
            args.ratio,
            report.output.display()
        );
    }
    println!("Successfully processed {} file(s).", reports.len());
    Ok(())
}

fn handle_batch(tool: BatchTool) -> Result<()> {
    let config = Config::load_or_default();
    let (task, output_dir, folders) = match tool {
        BatchTool::Merge {
            output,
            folders,
            opts,
        } => (Task::Merge(merge_settings(&config, &opts)?), output, folders),
        BatchTool::Img2Vid {
            output,
            folders,
            opts,
        } => (
            Task::Img2Vid(img2vid_settings(&config, &opts)?),
            output,
            folders,
        ),
    };
    engine::ensure_tools_available(&task.required_tools())?;

    let cancel = cancel_token();
    let job = BatchJob {
        task,
        folders: dedup_folders(folders),
        output_dir,
    };
    let (handle, rx) = BatchWorker::spawn(
        job,
        process_runner(&config, cancel.clone()),
        FfprobeProbe::new(&config.tools.ffprobe),
        cancel,
    );

    let mut failure: Option<String> = None;
    for message in rx {
        match message {
            WorkerMessage::FolderStarted {
                index,
                total,
                folder,
            } => println!("[{}/{}] Processing {}", index, total, file_name(&folder)),
            WorkerMessage::FolderCompleted { report, .. } => match report {
                TaskReport::Completed { output, summary } => {
                    println!("  {} -> {}", summary, output.display())
                }
                TaskReport::Skipped { reason } => println!("  Info: {}", reason),
            },
            WorkerMessage::Failed {
                index,
                folder,
                error,
            } => {
                failure = Some(format!(
                    "Folder {} ({}) failed: {}",
                    index,
                    folder.display(),
                    error
                ));
            }
            WorkerMessage::Finished { processed, total } => {
                if failure.is_none() {
                    println!("All folders processed ({}/{}).", processed, total);
                } else {
                    println!("Stopped after {}/{} folder(s).", processed, total);
                }
            }
        }
    }

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("Batch worker panicked"))?;
    match failure {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}

/// Adding the same folder twice is ignored, order is kept
fn dedup_folders(folders: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(folders.len());
    for folder in folders {
        if !unique.contains(&folder) {
            unique.push(folder);
        }
    }
    unique
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn handle_check_ffmpeg() {
    let config = Config::load_or_default();
    let tools = &config.tools;

    let report = || -> Result<()> {
        let version = engine::ffmpeg_version(&tools.ffmpeg)?;
        println!("ffmpeg found: {}", version);
        let probe_version = engine::ffprobe_version(&tools.ffprobe)?;
        println!("ffprobe found: {}", probe_version);

        let codec = &config.merge.codec;
        if engine::encoder_available(&tools.ffmpeg, codec) {
            println!("Encoder {} is available", codec);
        } else {
            println!(
                "Encoder {} is not listed by ffmpeg; merges will rely on the fallback codec",
                codec
            );
        }
        Ok(())
    };

    if let Err(e) = report().context("ffmpeg check failed") {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn handle_init_config() {
    match Config::load() {
        Ok(cfg) => {
            match Config::config_path() {
                Ok(path) => println!("Config loaded successfully from {}", path.display()),
                Err(e) => println!("Config loaded, but config path unknown: {:#}", e),
            }
            println!("{:#?}", cfg);
        }
        Err(e) => {
            println!("Config missing or invalid: {:#}", e);
            println!("Creating default config...");

            let cfg = Config::default();
            if let Err(err) = cfg.save() {
                eprintln!("Failed to save default config: {:#}", err);
                process::exit(1);
            } else {
                match Config::config_path() {
                    Ok(path) => println!("Default config saved to {}", path.display()),
                    Err(e) => println!("Default config saved (path unknown): {:#}", e),
                }
            }
        }
    }
}
