use anyhow::{bail, Context};
use clap::Parser;
use gradewatch::{AppConfig, Detector, EventConsumer};
use gradewatch_core::{event_channel, AnchorRegistry, DetectionContext};
use gradewatch_cv::traits::FrameSource;
use gradewatch_cv::{ReplayFrameSource, TemplateBank, TemplateLoader};
use gradewatch_live::LiveClient;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Watch the style-grade indicator and report grade changes
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the grade template images
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Anchor preset index (see --list-anchors)
    #[arg(long)]
    anchor: Option<usize>,

    /// Print the anchor presets and exit
    #[arg(long)]
    list_anchors: bool,

    /// Enable the debug preview
    #[arg(long)]
    debug_preview: bool,

    /// Read frames from image files in this directory instead of the screen
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Stop after this many seconds (0 runs until stopped)
    #[arg(long, default_value_t = 0.0)]
    duration_sec: f64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = AnchorRegistry::builtin();
    if cli.list_anchors {
        for (index, preset) in registry.presets().iter().enumerate() {
            println!("{index:>2}  {}  anchor={:?}", preset.label, preset.anchor);
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.templates {
        config.templates.template_dir = dir;
    }
    if let Some(anchor) = cli.anchor {
        config.anchor_index = anchor;
    }
    if cli.debug_preview {
        config.debug_preview = true;
    }

    if let Some(path) = &cli.write_config {
        config.save(path)?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let templates = TemplateLoader::new(&config.templates.template_dir).load()?;
    let bank = TemplateBank::new(templates, config.templates.scale_offsets.clone())?;

    let context = DetectionContext::new(registry, config.anchor_index, config.debug_preview)
        .context("No anchor presets available")?;
    let calibration = context.calibration();
    info!(
        "Anchor #{} ({}) scale {:.3}",
        calibration.index, calibration.preset.label, calibration.scale
    );
    let context = Arc::new(context);

    let frames = open_frames(cli.replay)?;
    let live = LiveClient::new(&config.live)?;
    let (events_tx, events_rx) = event_channel();

    let detector = Detector::new(context.clone(), events_tx, frames, live, bank, &config);
    let handle = detector
        .spawn()
        .context("Failed to start detection thread")?;

    let deadline = (cli.duration_sec > 0.0)
        .then(|| Duration::try_from_secs_f64(cli.duration_sec).ok())
        .flatten()
        .map(|limit| Instant::now() + limit);
    let tick = config.runtime.consumer_tick();
    let mut consumer = EventConsumer::new();

    while !events_rx.is_closed() {
        consumer.tick(&events_rx);
        if deadline.is_some_and(|end| Instant::now() >= end) {
            info!("Duration elapsed, stopping");
            context.stop();
            break;
        }
        thread::sleep(tick);
    }

    if handle.join().is_err() {
        bail!("Detection thread panicked");
    }
    consumer.tick(&events_rx);
    Ok(())
}

fn open_frames(replay: Option<PathBuf>) -> anyhow::Result<Box<dyn FrameSource + Send>> {
    if let Some(dir) = replay {
        return Ok(Box::new(ReplayFrameSource::from_dir(dir)?));
    }
    screen_frames()
}

#[cfg(feature = "screen")]
fn screen_frames() -> anyhow::Result<Box<dyn FrameSource + Send>> {
    Ok(Box::new(gradewatch_cv::ScreenFrameSource::new()))
}

#[cfg(not(feature = "screen"))]
fn screen_frames() -> anyhow::Result<Box<dyn FrameSource + Send>> {
    bail!("Built without screen capture; rebuild with --features screen or pass --replay <dir>")
}
