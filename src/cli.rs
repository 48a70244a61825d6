use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonoline", about = "Render an audio analysis timeline to video")]
pub struct Cli {
    /// Analysis payload (JSON) from the feature-extraction service
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "timeline.mp4")]
    pub output: PathBuf,

    /// Audio track to mux alongside the timeline
    #[arg(short, long)]
    pub audio: Option<PathBuf>,

    /// Scripted pointer/zoom/playback actions (JSON)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Generate a placeholder analysis of this many seconds instead of reading input
    #[arg(long)]
    pub demo: Option<f64>,

    /// Tempo of the placeholder analysis
    #[arg(long, default_value_t = 120.0)]
    pub demo_bpm: f64,

    /// Seed for the placeholder analysis
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print a summary of the normalized timeline and exit
    #[arg(long)]
    pub summary: bool,

    /// Config file (defaults to ./sonoline.toml or the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Canvas width in logical pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Canvas height in logical pixels
    #[arg(long, default_value_t = 360)]
    pub height: u32,

    /// Device pixel ratio applied when rasterizing
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Initial zoom level (1-20)
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Initial start of the visible window in seconds
    #[arg(long, default_value_t = 0.0)]
    pub pan: f64,

    /// Keep the window still instead of following the playhead
    #[arg(long)]
    pub no_follow: bool,

    /// Start with playback paused
    #[arg(long)]
    pub paused: bool,

    /// Font file for labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Download the label font from a URL
    #[arg(long)]
    pub font_url: Option<String>,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,
}
