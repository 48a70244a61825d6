mod cli;
mod config;
mod encode;
mod playback;
mod render;
mod script;
mod timeline;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use cli::Cli;
use config::ViewConfig;
use encode::ffmpeg::{EncoderSettings, FfmpegEncoder};
use playback::FrameClock;
use render::layers::format_timestamp;
use render::text::{load_font_from_url, TextOverlay};
use render::{CanvasSize, PixelSurface};
use script::Script;
use timeline::{placeholder, AnalysisTimeline};
use view::{TimelineView, ViewOptions, UNAVAILABLE_MESSAGE};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();
    let mut view_cfg = ViewConfig::default();

    if let Some(ref path) = config::find_config_path(cli.config.clone()) {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 1280 { cli.width = cfg.output.width; }
            if cli.height == 360 { cli.height = cfg.output.height; }
            if cli.fps == 30 { cli.fps = cfg.output.fps; }
            if cli.crf == 18 { cli.crf = cfg.output.crf; }
            if cli.codec == "libx264" { cli.codec = cfg.output.codec; }
            if cli.zoom == 1.0 { cli.zoom = cfg.view.zoom; }
            if cli.pan == 0.0 { cli.pan = cfg.view.pan_start; }
            if cli.dpr == 1.0 { cli.dpr = cfg.view.device_pixel_ratio; }
            if cli.font.is_none() {
                cli.font = cfg.output.font;
            }
            if cli.font_url.is_none() {
                cli.font_url = cfg.output.font_url;
            }
            view_cfg = cfg.view;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if cli.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }

    // 1. Load and normalize the analysis payload
    let payload = read_payload(&cli)?;
    let canvas = CanvasSize {
        width: cli.width as f32,
        height: cli.height as f32,
    };
    let options = ViewOptions {
        follow_playhead: view_cfg.follow_playhead && !cli.no_follow,
        click_slop_px: view_cfg.click_slop_px,
    };
    let mut view = TimelineView::new(FrameClock::new(0.0), canvas, options);
    view.load_payload(&payload)
        .map_err(|err| anyhow::anyhow!("{}: {}", UNAVAILABLE_MESSAGE, err))?;
    let timeline = view
        .timeline()
        .cloned()
        .context("Timeline missing after load")?;

    if cli.summary {
        print_summary(&timeline);
        return Ok(());
    }

    log::info!("sonoline - audio analysis timeline renderer");
    log::info!("Output: {}", cli.output.display());
    log::info!("Resolution: {}x{} @ {}fps (dpr {})", cli.width, cli.height, cli.fps, cli.dpr);

    view.set_window(cli.zoom, cli.pan);

    // 2. Interaction script
    let mut timed = match cli.script {
        Some(ref path) => Script::load(path)?,
        None => Script::default(),
    };

    // 3. Text overlay
    let font_bytes = if let Some(ref font_url) = cli.font_url {
        match load_font_from_url(font_url) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::warn!("Failed to load font from URL: {}", err);
                None
            }
        }
    } else {
        None
    };
    let text = TextOverlay::load(cli.font.as_deref(), font_bytes.as_deref());
    let mut surface = PixelSurface::new(canvas, cli.dpr, text);
    let (frame_width, frame_height) = surface.size();

    // 4. Start FFmpeg encoder
    if let Some(ref audio) = cli.audio {
        if !audio.exists() {
            anyhow::bail!("Audio file not found: {}", audio.display());
        }
    }
    log::info!("Starting FFmpeg encoder...");
    let settings = EncoderSettings {
        width: frame_width,
        height: frame_height,
        fps: cli.fps,
        codec: cli.codec.clone(),
        pix_fmt: cli.pix_fmt.clone(),
        crf: cli.crf,
        bitrate: cli.bitrate.clone(),
    };
    let mut encoder = FfmpegEncoder::new(&cli.output, cli.audio.as_deref(), &settings)?;

    // 5. Render loop
    if !cli.paused {
        view.toggle_play();
    }
    let dt = 1.0 / cli.fps as f64;
    let total_frames = (timeline.duration * cli.fps as f64).ceil().max(1.0) as usize;
    log::info!("Total frames: {}, Duration: {:.1}s", total_frames, timeline.duration);

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let mut redraws = 0usize;
    let mut current_segment = None;
    for frame_idx in 0..total_frames {
        let time = frame_idx as f64 * dt;
        for scripted in timed.due(time) {
            script::apply(&mut view, &scripted.action);
        }

        if view.tick() {
            surface.clear();
            view.redraw().replay(&mut surface);
            redraws += 1;
        }

        let playhead = view.cursor().current_time;
        let segment = timeline.segment_at(playhead);
        if segment != current_segment {
            if let Some(index) = segment {
                log::debug!("Segment {} at {}", index, format_timestamp(playhead, 1.0));
            }
            current_segment = segment;
        }

        encoder.write_frame(surface.pixels())?;
        view.transport_mut().advance(dt);
        pb.set_position(frame_idx as u64 + 1);
    }

    pb.finish_with_message("Rendering complete");
    log::debug!("Redrew {} of {} frames", redraws, total_frames);
    if timed.remaining() > 0 {
        log::warn!("{} scripted actions fall after the end of the track", timed.remaining());
    }

    // 6. Finish encoding
    log::info!("Finishing encoding...");
    encoder.finish()?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

fn read_payload(cli: &Cli) -> Result<Value> {
    if let Some(seconds) = cli.demo {
        if !(seconds.is_finite() && seconds > 0.0) {
            anyhow::bail!("--demo needs a positive duration, got {}", seconds);
        }
        log::info!("Generating placeholder analysis: {:.1}s @ {} BPM", seconds, cli.demo_bpm);
        return Ok(placeholder::generate(seconds, cli.demo_bpm, cli.seed));
    }

    let input = cli
        .input
        .as_ref()
        .context("Input analysis file is required (or pass --demo <seconds>)")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    log::info!("Input: {}", input.display());
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", input.display()))
}

fn print_summary(timeline: &AnalysisTimeline) {
    if let Some(caption) = timeline.metadata.caption() {
        println!("Track:      {}", caption);
    }
    if let Some(ref genre) = timeline.metadata.genre {
        println!("Genre:      {}", genre);
    }
    println!("Duration:   {}", format_timestamp(timeline.duration, 1.0));
    println!("Tempo:      {:.1} BPM", timeline.tempo_bpm);
    println!("Energy:     {} samples", timeline.energy.len());
    println!("Beats:      {}", timeline.beats.len());
    println!("Downbeats:  {}", timeline.downbeats.len());
    println!("Segments:   {}", timeline.segments.len());
    for index in 0..timeline.segments.len() {
        if let Some((start, end)) = timeline.segment_span(index) {
            println!(
                "  [{:2}] {} - {}",
                index,
                format_timestamp(start, 1.0),
                format_timestamp(end, 1.0)
            );
        }
    }
}
