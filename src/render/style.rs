use super::commands::Rgba;

/// Horizontal gridlines (dB)
pub const DB_GRID_LEVELS: [f32; 6] = [-10.0, -20.0, -30.0, -40.0, -50.0, -60.0];

/// Vertical range of the energy plot (dB)
pub const DB_CEILING: f32 = 0.0;
pub const DB_FLOOR: f32 = -70.0;

/// Time ticks stay at least this far apart (seconds of visible window)
pub const MIN_TICK_SPACING_SECS: f64 = 25.0;
pub const MAX_TIME_TICKS: usize = 8;

pub const LABEL_SIZE: f32 = 11.0;
pub const CAPTION_SIZE: f32 = 13.0;

/// Reserved strip at the bottom for time labels
pub const AXIS_HEIGHT: f32 = 18.0;
/// Padding above the 0 dB line
pub const TOP_PADDING: f32 = 8.0;

pub const BEAT_TICK_HEIGHT: f32 = 10.0;
pub const DOWNBEAT_RADIUS: f32 = 3.5;
pub const SEGMENT_DASH: (f32, f32) = (6.0, 4.0);

#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub background: Rgba,
    pub grid: Rgba,
    pub label: Rgba,
    pub energy: Rgba,
    pub beat: Rgba,
    pub downbeat: Rgba,
    pub segment: Rgba,
    pub selection: Rgba,
    pub playhead: Rgba,
    pub caption: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(14, 16, 22),
            grid: Rgba::rgb(255, 255, 255).with_alpha(28),
            label: Rgba::rgb(150, 156, 170),
            energy: Rgba::rgb(84, 200, 255),
            beat: Rgba::rgb(255, 255, 255).with_alpha(120),
            downbeat: Rgba::rgb(255, 176, 64),
            segment: Rgba::rgb(186, 120, 255).with_alpha(200),
            selection: Rgba::rgb(186, 120, 255).with_alpha(40),
            playhead: Rgba::rgb(255, 72, 96),
            caption: Rgba::rgb(230, 232, 238),
        }
    }
}
