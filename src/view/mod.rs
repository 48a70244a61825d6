pub mod interaction;
pub mod viewport;

use serde_json::Value;

use crate::playback::{PlaybackBridge, PlaybackCursor, PlaybackTransport};
use crate::render::style::Palette;
use crate::render::{render, render_placeholder, CanvasSize, DisplayList};
use crate::timeline::{normalize, AnalysisTimeline, NormalizationError, Selection};
use interaction::{InteractionCommand, InteractionHandler, DEFAULT_CLICK_SLOP_PX};
use viewport::ViewportState;

pub const UNAVAILABLE_MESSAGE: &str = "analysis unavailable";

#[derive(Clone, Copy, Debug)]
pub struct ViewOptions {
    /// Page the window to keep the playhead visible during playback
    pub follow_playhead: bool,
    pub click_slop_px: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            follow_playhead: true,
            click_slop_px: DEFAULT_CLICK_SLOP_PX,
        }
    }
}

struct Loaded {
    timeline: AnalysisTimeline,
    viewport: ViewportState,
    selection: Selection,
}

/// Owns the loaded analysis, viewport, gesture and playback bridge. State
/// changes only mark it dirty; `redraw` produces the display list.
pub struct TimelineView<T: PlaybackTransport> {
    loaded: Option<Loaded>,
    interaction: InteractionHandler,
    playback: PlaybackBridge<T>,
    canvas: CanvasSize,
    palette: Palette,
    options: ViewOptions,
    dirty: bool,
}

impl<T: PlaybackTransport> TimelineView<T> {
    pub fn new(transport: T, canvas: CanvasSize, options: ViewOptions) -> Self {
        Self {
            loaded: None,
            interaction: InteractionHandler::new(options.click_slop_px),
            playback: PlaybackBridge::new(transport),
            canvas,
            palette: Palette::default(),
            options,
            dirty: true,
        }
    }

    /// Replace whatever was loaded. Viewport, selection, gesture and cursor
    /// all start over.
    pub fn load(&mut self, timeline: AnalysisTimeline) {
        log::info!(
            "Loaded timeline: {:.1}s, {:.1} BPM",
            timeline.duration,
            timeline.tempo_bpm
        );
        self.interaction.cancel();
        self.playback.reset(timeline.duration);
        self.loaded = Some(Loaded {
            viewport: ViewportState::new(timeline.duration),
            selection: Selection::default(),
            timeline,
        });
        self.dirty = true;
    }

    /// Normalize and load a raw payload. On failure the view falls back to
    /// the placeholder state and the error is returned to the caller.
    pub fn load_payload(&mut self, payload: &Value) -> Result<(), NormalizationError> {
        match normalize(payload) {
            Ok(timeline) => {
                self.load(timeline);
                Ok(())
            }
            Err(err) => {
                log::warn!("{}: {}", UNAVAILABLE_MESSAGE, err);
                self.unload();
                Err(err)
            }
        }
    }

    pub fn unload(&mut self) {
        self.interaction.cancel();
        self.playback.reset(0.0);
        self.loaded = None;
        self.dirty = true;
    }

    pub fn timeline(&self) -> Option<&AnalysisTimeline> {
        self.loaded.as_ref().map(|l| &l.timeline)
    }

    pub fn viewport(&self) -> Option<ViewportState> {
        self.loaded.as_ref().map(|l| l.viewport)
    }

    #[cfg(test)]
    pub fn selection(&self) -> Selection {
        self.loaded.as_ref().map(|l| l.selection).unwrap_or_default()
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.playback.cursor()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.playback.transport_mut()
    }

    #[cfg(test)]
    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    pub fn zoom_in(&mut self) {
        self.update_viewport(ViewportState::zoom_in);
    }

    pub fn zoom_out(&mut self) {
        self.update_viewport(ViewportState::zoom_out);
    }

    pub fn reset_view(&mut self) {
        self.update_viewport(ViewportState::reset);
    }

    pub fn pan_by(&mut self, delta_seconds: f64) {
        self.update_viewport(|v| v.pan_by(delta_seconds));
    }

    pub fn set_window(&mut self, zoom_level: f64, pan_start: f64) {
        self.update_viewport(|v| v.with_window(zoom_level, pan_start));
    }

    pub fn select_segment(&mut self, segment: Option<usize>) {
        if let Some(loaded) = self.loaded.as_mut() {
            let next = loaded.selection.select(&loaded.timeline, segment);
            if next != loaded.selection {
                loaded.selection = next;
                self.dirty = true;
            }
        }
    }

    pub fn pointer_down(&mut self, x: f64) {
        if self.loaded.is_none() {
            return;
        }
        let command = self.interaction.pointer_down(x, self.width());
        self.apply(command);
    }

    pub fn pointer_move(&mut self, x: f64) {
        let Some(viewport) = self.viewport() else {
            return;
        };
        let command = self.interaction.pointer_move(x, self.width(), &viewport);
        self.apply(command);
    }

    pub fn pointer_up(&mut self, x: f64) {
        let Some(viewport) = self.viewport() else {
            return;
        };
        let command = self.interaction.pointer_up(x, self.width(), &viewport);
        self.apply(command);
    }

    pub fn seek(&mut self, time: f64) {
        if self.loaded.is_none() {
            return;
        }
        self.playback.seek(time);
        self.dirty = true;
    }

    pub fn toggle_play(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        self.playback.toggle_play();
        self.dirty = true;
    }

    /// Pull transport notifications into the cursor. Call once per event-loop
    /// turn; returns true when a redraw is due.
    pub fn tick(&mut self) -> bool {
        if self.playback.sync() {
            if self.options.follow_playhead && self.playback.cursor().is_playing {
                let time = self.playback.cursor().current_time;
                self.update_viewport(|v| v.ensure_visible(time));
            }
            self.dirty = true;
        }
        self.dirty
    }

    /// Build the display list for the current state.
    pub fn redraw(&mut self) -> DisplayList {
        self.dirty = false;
        let cursor = self.playback.cursor();
        match &self.loaded {
            Some(loaded) => render(
                &loaded.timeline,
                &loaded.viewport,
                &cursor,
                &loaded.selection,
                self.canvas,
                &self.palette,
            ),
            None => render_placeholder(self.canvas, UNAVAILABLE_MESSAGE, &self.palette),
        }
    }

    fn width(&self) -> f64 {
        self.canvas.width as f64
    }

    fn apply(&mut self, command: InteractionCommand) {
        match command {
            InteractionCommand::None => {}
            InteractionCommand::PanBy(delta) => self.pan_by(delta),
            InteractionCommand::Seek(time) => self.seek(time),
        }
    }

    fn update_viewport(&mut self, f: impl FnOnce(ViewportState) -> ViewportState) {
        if let Some(loaded) = self.loaded.as_mut() {
            let next = f(loaded.viewport);
            if next != loaded.viewport {
                loaded.viewport = next;
                self.dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::bridge::tests::RecordingTransport;
    use crate::playback::PlaybackEvent;
    use crate::render::Layer;
    use crate::timeline::model::sample_timeline;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn view(width: f32) -> TimelineView<RecordingTransport> {
        TimelineView::new(
            RecordingTransport::default(),
            CanvasSize {
                width,
                height: 200.0,
            },
            ViewOptions::default(),
        )
    }

    #[test]
    fn click_seeks_through_the_bridge_once() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.set_window(2.0, 20.0);

        v.pointer_down(250.0);
        v.pointer_up(250.0);

        assert_relative_eq!(v.cursor().current_time, 45.0);
        assert_eq!(v.transport_mut().seeks.len(), 1);
        assert_relative_eq!(v.transport_mut().seeks[0], 45.0);
    }

    #[test]
    fn drag_left_100px_pans_to_track_start() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.set_window(2.0, 10.0);

        v.pointer_down(300.0);
        v.pointer_move(200.0);
        v.pointer_up(200.0);

        assert_eq!(v.viewport().unwrap().pan_start(), 0.0);
        assert!(v.transport_mut().seeks.is_empty());
    }

    #[test]
    fn drag_past_track_start_clamps() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.set_window(2.0, 10.0);

        v.pointer_down(400.0);
        v.pointer_move(100.0);
        v.pointer_up(100.0);

        assert_eq!(v.viewport().unwrap().pan_start(), 0.0);
        assert!(v.transport_mut().seeks.is_empty());
    }

    #[test]
    fn drag_right_moves_window_later() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.set_window(2.0, 10.0);

        v.pointer_down(200.0);
        v.pointer_move(250.0);
        v.pointer_move(300.0);
        v.pointer_up(300.0);

        assert_relative_eq!(v.viewport().unwrap().pan_start(), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn loading_mid_drag_abandons_gesture() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.set_window(4.0, 50.0);
        v.pointer_down(100.0);
        v.pointer_move(200.0);

        let mut next = sample_timeline(60.0);
        next.segments = vec![0.0, 30.0];
        v.load(next);
        v.pointer_move(400.0);
        v.pointer_up(400.0);

        let vp = v.viewport().unwrap();
        assert_eq!(vp.zoom_level(), 1.0);
        assert_eq!(vp.pan_start(), 0.0);
        assert!(v.transport_mut().seeks.is_empty());
    }

    #[test]
    fn load_clears_selection_and_cursor() {
        let mut v = view(500.0);
        let mut tl = sample_timeline(100.0);
        tl.segments = vec![0.0, 50.0];
        v.load(tl.clone());
        v.select_segment(Some(1));
        v.seek(30.0);
        assert_eq!(v.selection().segment, Some(1));

        v.load(tl);
        assert_eq!(v.selection().segment, None);
        assert_eq!(v.cursor(), PlaybackCursor::default());
    }

    #[test]
    fn bad_payload_falls_back_to_placeholder() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        let err = v.load_payload(&json!({ "title": "no duration" })).unwrap_err();
        assert_eq!(err, NormalizationError::MissingDuration);
        assert!(v.timeline().is_none());

        let list = v.redraw();
        assert_eq!(list.layer(Layer::Background).count(), 1);
        assert_eq!(list.layer(Layer::Energy).count(), 0);

        // Gestures on an empty view do nothing
        v.pointer_down(10.0);
        v.pointer_up(10.0);
        assert!(v.transport_mut().seeks.is_empty());
    }

    #[test]
    fn degenerate_payload_renders_without_curve() {
        let mut v = view(500.0);
        v.load_payload(&json!({ "duration": 180 })).unwrap();
        let list = v.redraw();
        assert!(list.layer(Layer::LevelGrid).count() > 0);
        assert_eq!(list.layer(Layer::Energy).count(), 0);
    }

    #[test]
    fn playback_follows_playhead_and_marks_dirty() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.set_window(4.0, 0.0);
        v.toggle_play();
        v.redraw();
        assert!(!v.needs_redraw());

        v.transport_mut()
            .pending
            .push_back(PlaybackEvent::TimeAdvanced(30.0));
        assert!(v.tick());
        assert_eq!(v.cursor().current_time, 30.0);
        assert!(v.viewport().unwrap().contains(30.0));

        let list = v.redraw();
        assert_eq!(list.layer(Layer::Playhead).count(), 1);
        assert!(!v.tick());
    }

    #[test]
    fn ended_rewinds_cursor() {
        let mut v = view(500.0);
        v.load(sample_timeline(10.0));
        v.toggle_play();
        v.transport_mut().pending.push_back(PlaybackEvent::Ended);
        assert!(v.tick());
        assert_eq!(v.cursor(), PlaybackCursor::default());
    }

    #[test]
    fn zoom_controls_mark_dirty_only_on_change() {
        let mut v = view(500.0);
        v.load(sample_timeline(100.0));
        v.redraw();
        v.zoom_out();
        assert!(!v.needs_redraw());
        v.zoom_in();
        assert!(v.needs_redraw());
        v.redraw();
        v.reset_view();
        assert_eq!(v.viewport().unwrap(), ViewportState::new(100.0));
        v.redraw();
        v.reset_view();
        assert!(!v.needs_redraw());
    }
}
