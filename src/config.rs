use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::view::interaction::DEFAULT_CLICK_SLOP_PX;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default)]
    pub font_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub pan_start: f64,
    #[serde(default = "default_follow")]
    pub follow_playhead: bool,
    #[serde(default = "default_dpr")]
    pub device_pixel_ratio: f32,
    #[serde(default = "default_click_slop")]
    pub click_slop_px: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            font: None,
            font_url: None,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            pan_start: 0.0,
            follow_playhead: default_follow(),
            device_pixel_ratio: default_dpr(),
            click_slop_px: default_click_slop(),
        }
    }
}

fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 360 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_zoom() -> f64 { 1.0 }
fn default_follow() -> bool { true }
fn default_dpr() -> f32 { 1.0 }
fn default_click_slop() -> f64 { DEFAULT_CLICK_SLOP_PX }

/// Explicit path, else ./sonoline.toml, else the user config directory.
pub fn find_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from("sonoline.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("sonoline").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("sonoline").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}
