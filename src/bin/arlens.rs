use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arlens::render::decode::load_image_file;
use arlens::{
    ArSession, CapturePipeline, DirectoryDownloader, FfmpegEncoder, FrameRGBA, InMemoryDownloads,
    InMemoryEncoder, NoShare, Point, ScriptedTracker, SpriteRenderer, StreamEncoder, TapOutcome,
    ViewerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "arlens", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the character catalog as JSON.
    Catalog(CatalogArgs),
    /// Composite a camera image with the selected character and save a PNG still.
    Still(StillArgs),
    /// Record a clip over a camera image or image directory (requires `ffmpeg` on PATH).
    Record(RecordArgs),
    /// Drive the session state machine from a script and print one JSON line per step.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct CatalogArgs {
    /// Viewer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct StillArgs {
    /// Camera frame image (PNG, JPEG or SVG).
    #[arg(long)]
    camera: PathBuf,

    /// Viewer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with `<id>.png` or `<id>.svg` posters.
    #[arg(long)]
    sprites: Option<PathBuf>,

    /// Catalog index to select once the marker is found.
    #[arg(long, default_value_t = 0)]
    select: usize,

    /// Zoom factor.
    #[arg(long)]
    scale: Option<f32>,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    /// Camera image, or a directory of images played in name order.
    #[arg(long)]
    camera: PathBuf,

    /// Viewer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with `<id>.png` or `<id>.svg` posters.
    #[arg(long)]
    sprites: Option<PathBuf>,

    /// Catalog index to select once the marker is found.
    #[arg(long, default_value_t = 0)]
    select: usize,

    /// Number of ticks to record.
    #[arg(long, default_value_t = 90)]
    frames: u32,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Comma-separated steps: found, lost, select:<i>, next, prev, toggle, scale:<f>,
    /// tap:<x>:<y>, tick.
    #[arg(long)]
    script: String,

    /// Viewer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Surface width.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Surface height.
    #[arg(long, default_value_t = 480)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Catalog(args) => cmd_catalog(args),
        Command::Still(args) => cmd_still(args),
        Command::Record(args) => cmd_record(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ViewerConfig> {
    let cfg = match path {
        Some(p) => ViewerConfig::from_path(p)?,
        None => ViewerConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let catalog = cfg.build_catalog()?;
    let json = serde_json::to_string_pretty(catalog.entries()).context("serialize catalog")?;
    println!("{json}");
    Ok(())
}

type CliSession = ArSession<ScriptedTracker, SpriteRenderer>;

fn open_session(
    cfg: &ViewerConfig,
    camera: FrameRGBA,
    sprites: Option<&Path>,
    encoder: Box<dyn StreamEncoder>,
    out_dir: &Path,
) -> anyhow::Result<CliSession> {
    let catalog = cfg.build_catalog()?;
    let mut renderer = SpriteRenderer::new(camera.size(), &catalog);
    if let Some(dir) = sprites {
        renderer = renderer.with_sprite_dir(dir, &catalog)?;
    }
    let capture = CapturePipeline::new(
        cfg.capture.clone(),
        encoder,
        Box::new(NoShare),
        Box::new(DirectoryDownloader::new(out_dir)),
    )?;
    let tracker = ScriptedTracker::with_camera_frame(camera);
    Ok(ArSession::new(cfg, tracker, renderer, capture)?)
}

fn frame_time(cfg: &ViewerConfig, i: u32) -> Duration {
    Duration::from_secs_f64(f64::from(i) / f64::from(cfg.capture.fps.max(1)))
}

fn find_and_select(
    sess: &mut CliSession,
    cfg: &ViewerConfig,
    select: usize,
) -> anyhow::Result<()> {
    sess.tracker_mut().found(cfg.target_index);
    sess.tick(Duration::ZERO)?;
    sess.select_by_index(select)
        .with_context(|| format!("select character {select}"))?;
    Ok(())
}

fn cmd_still(args: StillArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let camera = load_image_file(&args.camera)?;
    let mut sess = open_session(
        &cfg,
        camera,
        args.sprites.as_deref(),
        Box::new(InMemoryEncoder::new()),
        &args.out_dir,
    )?;

    find_and_select(&mut sess, &cfg, args.select)?;
    if let Some(scale) = args.scale {
        sess.set_scale(scale)?;
    }
    sess.tick(frame_time(&cfg, 1))?;

    let artifact = sess.capture_still()?;
    eprintln!("wrote {}", args.out_dir.join(&artifact.file_name).display());
    Ok(())
}

fn load_camera_frames(path: &Path) -> anyhow::Result<Vec<FrameRGBA>> {
    if !path.is_dir() {
        return Ok(vec![load_image_file(path)?]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("read camera dir '{}'", path.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "svg"))
        })
        .collect();
    files.sort();
    if files.is_empty() {
        anyhow::bail!("no camera images in '{}'", path.display());
    }
    files
        .iter()
        .map(|p| load_image_file(p).map_err(anyhow::Error::from))
        .collect()
}

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    if !arlens::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg is required for recording, but was not found on PATH");
    }
    let cfg = load_config(args.config.as_deref())?;
    let frames = load_camera_frames(&args.camera)?;
    let first = frames[0].clone();
    let mut sess = open_session(
        &cfg,
        first,
        args.sprites.as_deref(),
        Box::new(FfmpegEncoder::probe()),
        &args.out_dir,
    )?;

    find_and_select(&mut sess, &cfg, args.select)?;
    sess.tick(frame_time(&cfg, 1))?;
    sess.start_recording()?;
    for i in 1..args.frames {
        let camera = frames[i as usize % frames.len()].clone();
        sess.tracker_mut().set_camera_frame(Some(camera));
        sess.tick(frame_time(&cfg, i + 1))?;
    }
    let artifact = sess
        .stop_recording()?
        .context("recording ended before it was stopped")?;
    eprintln!(
        "wrote {} ({} bytes)",
        args.out_dir.join(&artifact.file_name).display(),
        artifact.len()
    );
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let catalog = cfg.build_catalog()?;
    let size = arlens::SurfaceSize::new(args.width, args.height);
    if size.is_empty() {
        anyhow::bail!("surface must be at least 1x1");
    }
    let capture = CapturePipeline::new(
        cfg.capture.clone(),
        Box::new(InMemoryEncoder::new()),
        Box::new(NoShare),
        Box::new(InMemoryDownloads::new()),
    )?;
    let tracker = ScriptedTracker::with_camera_frame(FrameRGBA::solid(
        size.width,
        size.height,
        [0, 0, 0, 255],
    ));
    let renderer = SpriteRenderer::new(size, &catalog);
    let mut sess = ArSession::new(&cfg, tracker, renderer, capture)?;

    let mut t = 0u32;
    sess.tick(frame_time(&cfg, t))?;
    for step in args
        .script
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let mut tap = None;
        let result = run_step(&mut sess, &cfg, step, &mut tap);
        t += 1;
        sess.tick(frame_time(&cfg, t))?;
        let line = serde_json::json!({
            "step": step,
            "error": result.err().map(|e| e.to_string()),
            "tap": tap,
            "selection": sess.controller().selection(),
            "controls": sess.controls_view(),
        });
        println!("{line}");
    }
    Ok(())
}

fn run_step(
    sess: &mut CliSession,
    cfg: &ViewerConfig,
    step: &str,
    tap: &mut Option<TapOutcome>,
) -> anyhow::Result<()> {
    let mut parts = step.split(':');
    let op = parts.next().unwrap_or_default();
    match op {
        "found" => {
            sess.tracker_mut().found(cfg.target_index);
        }
        "lost" => {
            sess.tracker_mut().lost(cfg.target_index);
        }
        "tick" => {}
        "next" => {
            sess.select_next();
        }
        "prev" => {
            sess.select_previous();
        }
        "toggle" => {
            sess.toggle_animation();
        }
        "select" => {
            let i: usize = parse_arg(parts.next(), step)?;
            sess.select_by_index(i)?;
        }
        "scale" => {
            let v: f32 = parse_arg(parts.next(), step)?;
            sess.set_scale(v)?;
        }
        "tap" => {
            let x: f64 = parse_arg(parts.next(), step)?;
            let y: f64 = parse_arg(parts.next(), step)?;
            *tap = Some(sess.handle_tap(Point::new(x, y)));
        }
        other => anyhow::bail!("unknown step '{other}'"),
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(raw: Option<&str>, step: &str) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = raw.with_context(|| format!("step '{step}' needs an argument"))?;
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("step '{step}': bad argument '{raw}': {e}"))
}
