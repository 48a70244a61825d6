use std::ops::Range;

use super::commands::{DisplayList, DrawCommand, Layer, Rgba, TextAlign};
use super::style::*;
use crate::playback::PlaybackCursor;
use crate::timeline::{AnalysisTimeline, Selection};
use crate::view::viewport::ViewportState;

/// Canvas size in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

/// Vertical layout of the plot area.
#[derive(Clone, Copy, Debug)]
struct PlotArea {
    width: f32,
    top: f32,
    bottom: f32,
}

impl PlotArea {
    fn new(canvas: CanvasSize) -> Self {
        let top = TOP_PADDING.min(canvas.height);
        let bottom = (canvas.height - AXIS_HEIGHT).max(top + 1.0);
        Self {
            width: canvas.width.max(0.0),
            top,
            bottom,
        }
    }

    fn db_to_y(&self, db: f32) -> f32 {
        let db = db.clamp(DB_FLOOR, DB_CEILING);
        self.top + (DB_CEILING - db) / (DB_CEILING - DB_FLOOR) * (self.bottom - self.top)
    }
}

struct Frame<'a> {
    viewport: &'a ViewportState,
    plot: PlotArea,
    palette: &'a Palette,
    list: DisplayList,
}

impl Frame<'_> {
    fn x(&self, time: f64) -> f32 {
        self.viewport.time_to_pixel(self.plot.width as f64, time) as f32
    }

    fn vertical(&mut self, layer: Layer, x: f32, y0: f32, y1: f32, width: f32, color: Rgba) {
        self.vertical_dashed(layer, x, y0, y1, width, color, None);
    }

    #[allow(clippy::too_many_arguments)]
    fn vertical_dashed(
        &mut self,
        layer: Layer,
        x: f32,
        y0: f32,
        y1: f32,
        width: f32,
        color: Rgba,
        dash: Option<(f32, f32)>,
    ) {
        self.list.push(
            layer,
            DrawCommand::Line {
                from: (x, y0),
                to: (x, y1),
                width,
                color,
                dash,
            },
        );
    }

    fn label(&mut self, layer: Layer, pos: (f32, f32), text: String, align: TextAlign) {
        self.list.push(
            layer,
            DrawCommand::Text {
                pos,
                text,
                size: LABEL_SIZE,
                color: self.palette.label,
                align,
            },
        );
    }
}

/// Render one frame of the timeline into a display list.
pub fn render(
    timeline: &AnalysisTimeline,
    viewport: &ViewportState,
    cursor: &PlaybackCursor,
    selection: &Selection,
    canvas: CanvasSize,
    palette: &Palette,
) -> DisplayList {
    let mut frame = Frame {
        viewport,
        plot: PlotArea::new(canvas),
        palette,
        list: DisplayList::default(),
    };

    draw_background(&mut frame, canvas);
    draw_selection(&mut frame, timeline, selection);
    draw_level_grid(&mut frame);
    draw_time_grid(&mut frame);
    draw_energy(&mut frame, timeline);
    draw_beats(&mut frame, timeline);
    draw_downbeats(&mut frame, timeline);
    draw_segments(&mut frame, timeline);
    draw_playhead(&mut frame, cursor);
    draw_caption(&mut frame, timeline);

    frame.list
}

/// Frame shown when no analysis is available.
pub fn render_placeholder(canvas: CanvasSize, message: &str, palette: &Palette) -> DisplayList {
    let mut list = DisplayList::default();
    list.push(
        Layer::Background,
        DrawCommand::FillRect {
            x: 0.0,
            y: 0.0,
            w: canvas.width,
            h: canvas.height,
            color: palette.background,
        },
    );
    list.push(
        Layer::Caption,
        DrawCommand::Text {
            pos: (canvas.width / 2.0, (canvas.height - CAPTION_SIZE) / 2.0),
            text: message.to_string(),
            size: CAPTION_SIZE,
            color: palette.label,
            align: TextAlign::Center,
        },
    );
    list
}

fn draw_background(frame: &mut Frame, canvas: CanvasSize) {
    frame.list.push(
        Layer::Background,
        DrawCommand::FillRect {
            x: 0.0,
            y: 0.0,
            w: canvas.width,
            h: canvas.height,
            color: frame.palette.background,
        },
    );
}

fn draw_selection(frame: &mut Frame, timeline: &AnalysisTimeline, selection: &Selection) {
    let Some((start, end)) = selection.segment.and_then(|idx| timeline.segment_span(idx)) else {
        return;
    };
    let start = start.max(frame.viewport.pan_start());
    let end = end.min(frame.viewport.visible_end());
    if start >= end {
        return;
    }
    let (x0, x1) = (frame.x(start), frame.x(end));
    frame.list.push(
        Layer::SegmentHighlight,
        DrawCommand::FillRect {
            x: x0,
            y: frame.plot.top,
            w: x1 - x0,
            h: frame.plot.bottom - frame.plot.top,
            color: frame.palette.selection,
        },
    );
}

fn draw_level_grid(frame: &mut Frame) {
    for db in DB_GRID_LEVELS {
        let y = frame.plot.db_to_y(db);
        frame.list.push(
            Layer::LevelGrid,
            DrawCommand::Line {
                from: (0.0, y),
                to: (frame.plot.width, y),
                width: 1.0,
                color: frame.palette.grid,
                dash: None,
            },
        );
        frame.label(
            Layer::LevelGrid,
            (4.0, y - LABEL_SIZE - 2.0),
            format!("{:.0} dB", db),
            TextAlign::Left,
        );
    }
}

/// Evenly spaced tick times across the visible window.
pub fn time_ticks(viewport: &ViewportState) -> Vec<f64> {
    let visible = viewport.visible_duration();
    let count = ((visible / MIN_TICK_SPACING_SECS).floor() as usize).clamp(1, MAX_TIME_TICKS);
    let step = visible / count as f64;
    (0..count)
        .map(|k| viewport.pan_start() + k as f64 * step)
        .collect()
}

fn draw_time_grid(frame: &mut Frame) {
    let ticks = time_ticks(frame.viewport);
    let step = frame.viewport.visible_duration() / ticks.len() as f64;
    let (top, bottom) = (frame.plot.top, frame.plot.bottom);
    for t in ticks {
        let x = frame.x(t);
        let color = frame.palette.grid;
        frame.vertical(Layer::TimeGrid, x, top, bottom, 1.0, color);
        frame.label(
            Layer::TimeGrid,
            (x + 3.0, bottom + 3.0),
            format_timestamp(t, step),
            TextAlign::Left,
        );
    }
}

fn draw_energy(frame: &mut Frame, timeline: &AnalysisTimeline) {
    let range = visible_energy(timeline, frame.viewport.pan_start(), frame.viewport.visible_end());
    if range.is_empty() {
        return;
    }
    let points: Vec<(f32, f32)> = range
        .map(|i| {
            (
                frame.x(timeline.energy_time(i)),
                frame.plot.db_to_y(timeline.energy[i]),
            )
        })
        .collect();
    frame.list.push(
        Layer::Energy,
        DrawCommand::Polyline {
            points,
            width: 1.5,
            color: frame.palette.energy,
        },
    );
}

fn draw_beats(frame: &mut Frame, timeline: &AnalysisTimeline) {
    let window = visible_times(
        &timeline.beats,
        frame.viewport.pan_start(),
        frame.viewport.visible_end(),
    );
    let bottom = frame.plot.bottom;
    for &t in window {
        let x = frame.x(t);
        let color = frame.palette.beat;
        frame.vertical(Layer::Beats, x, bottom - BEAT_TICK_HEIGHT, bottom, 1.0, color);
    }
}

fn draw_downbeats(frame: &mut Frame, timeline: &AnalysisTimeline) {
    let window = visible_times(
        &timeline.downbeats,
        frame.viewport.pan_start(),
        frame.viewport.visible_end(),
    );
    let y = frame.plot.bottom - BEAT_TICK_HEIGHT - DOWNBEAT_RADIUS - 2.0;
    for &t in window {
        frame.list.push(
            Layer::Downbeats,
            DrawCommand::FillCircle {
                center: (frame.x(t), y),
                radius: DOWNBEAT_RADIUS,
                color: frame.palette.downbeat,
            },
        );
    }
}

fn draw_segments(frame: &mut Frame, timeline: &AnalysisTimeline) {
    let window = visible_times(
        &timeline.segments,
        frame.viewport.pan_start(),
        frame.viewport.visible_end(),
    );
    let (top, bottom) = (frame.plot.top, frame.plot.bottom);
    for &t in window {
        let x = frame.x(t);
        let color = frame.palette.segment;
        frame.vertical_dashed(Layer::Segments, x, top, bottom, 1.5, color, Some(SEGMENT_DASH));
    }
}

fn draw_playhead(frame: &mut Frame, cursor: &PlaybackCursor) {
    if !frame.viewport.contains(cursor.current_time) {
        return;
    }
    let x = frame.x(cursor.current_time);
    let (bottom, color) = (frame.plot.bottom, frame.palette.playhead);
    frame.vertical(Layer::Playhead, x, 0.0, bottom, 2.0, color);
}

fn draw_caption(frame: &mut Frame, timeline: &AnalysisTimeline) {
    let tempo = format!("{:.0} BPM", timeline.tempo_bpm);
    let text = match timeline.metadata.caption() {
        Some(caption) => format!("{}  ·  {}", caption, tempo),
        None => tempo,
    };
    frame.list.push(
        Layer::Caption,
        DrawCommand::Text {
            pos: (frame.plot.width - 8.0, 4.0),
            text,
            size: CAPTION_SIZE,
            color: frame.palette.caption,
            align: TextAlign::Right,
        },
    );
}

/// Sub-slice of a sorted time list within `[start, end]`.
pub fn visible_times(times: &[f64], start: f64, end: f64) -> &[f64] {
    let lo = times.partition_point(|&t| t < start);
    let hi = times.partition_point(|&t| t <= end);
    &times[lo..hi.max(lo)]
}

/// Indices of energy samples whose time falls within `[start, end]`.
pub fn visible_energy(timeline: &AnalysisTimeline, start: f64, end: f64) -> Range<usize> {
    let n = timeline.energy.len();
    if n == 0 || end < start {
        return 0..0;
    }
    let rate = timeline.energy_rate();

    // Arithmetic guess, then nudge past float rounding at the edges
    let mut lo = ((start * rate).ceil().max(0.0) as usize).min(n);
    while lo > 0 && timeline.energy_time(lo - 1) >= start {
        lo -= 1;
    }
    while lo < n && timeline.energy_time(lo) < start {
        lo += 1;
    }

    let mut hi = ((end * rate).floor().max(0.0) as usize).saturating_add(1).min(n);
    while hi < n && timeline.energy_time(hi) <= end {
        hi += 1;
    }
    while hi > lo && timeline.energy_time(hi - 1) > end {
        hi -= 1;
    }
    lo..hi.max(lo)
}

/// `m:ss`, with tenths when ticks are closer than 10 s.
pub fn format_timestamp(seconds: f64, tick_step: f64) -> String {
    let seconds = seconds.max(0.0);
    // Round before splitting so a carry lands in the minutes
    if tick_step < 10.0 {
        let tenths = (seconds * 10.0).round() as u64;
        format!("{}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
    } else {
        let total = seconds.round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}
