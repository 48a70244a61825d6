use super::viewport::ViewportState;

/// Horizontal travel (px) a press may make and still count as a click.
pub const DEFAULT_CLICK_SLOP_PX: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging {
        /// Where the pointer went down
        origin_px: f64,
        /// Last position a pan was applied from
        anchor_px: f64,
        /// Travel exceeded the click slop; this gesture can no longer seek
        panning: bool,
    },
}

/// What the owner should do in response to a pointer event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionCommand {
    None,
    /// Apply `ViewportState::pan_by` with this many seconds
    PanBy(f64),
    /// Move the playhead here (seconds, already clamped to the track)
    Seek(f64),
}

/// Pointer gesture state machine: press, optional drag, release.
///
/// A release without travel beyond `click_slop_px` is a seek; once the slop
/// is exceeded the gesture pans incrementally until release.
#[derive(Clone, Copy, Debug)]
pub struct InteractionHandler {
    state: GestureState,
    click_slop_px: f64,
}

impl Default for InteractionHandler {
    fn default() -> Self {
        Self::new(DEFAULT_CLICK_SLOP_PX)
    }
}

impl InteractionHandler {
    pub fn new(click_slop_px: f64) -> Self {
        Self {
            state: GestureState::Idle,
            click_slop_px: click_slop_px.max(0.0),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn pointer_down(&mut self, x: f64, width_px: f64) -> InteractionCommand {
        let x = clamp_px(x, width_px);
        self.state = GestureState::Dragging {
            origin_px: x,
            anchor_px: x,
            panning: false,
        };
        InteractionCommand::None
    }

    pub fn pointer_move(
        &mut self,
        x: f64,
        width_px: f64,
        viewport: &ViewportState,
    ) -> InteractionCommand {
        let GestureState::Dragging {
            origin_px,
            anchor_px,
            panning,
        } = self.state
        else {
            return InteractionCommand::None;
        };
        let x = clamp_px(x, width_px);

        let panning = panning || (x - origin_px).abs() > self.click_slop_px;
        if !panning {
            return InteractionCommand::None;
        }

        self.state = GestureState::Dragging {
            origin_px,
            anchor_px: x,
            panning,
        };
        let delta_px = anchor_px - x;
        if delta_px == 0.0 {
            return InteractionCommand::None;
        }
        InteractionCommand::PanBy(delta_px * viewport.seconds_per_pixel(width_px))
    }

    pub fn pointer_up(
        &mut self,
        x: f64,
        width_px: f64,
        viewport: &ViewportState,
    ) -> InteractionCommand {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        let GestureState::Dragging {
            origin_px,
            anchor_px,
            panning,
        } = state
        else {
            return InteractionCommand::None;
        };
        let x = clamp_px(x, width_px);

        // A release far from the press is a drag even if no move arrived
        if panning || (x - origin_px).abs() > self.click_slop_px {
            let delta_px = anchor_px - x;
            if delta_px == 0.0 {
                return InteractionCommand::None;
            }
            return InteractionCommand::PanBy(delta_px * viewport.seconds_per_pixel(width_px));
        }

        let time = viewport
            .pixel_to_time(width_px, x)
            .clamp(0.0, viewport.duration());
        InteractionCommand::Seek(time)
    }

    /// Abandon any gesture in progress (e.g. the timeline was replaced).
    pub fn cancel(&mut self) {
        if self.state != GestureState::Idle {
            log::debug!("Cancelling gesture in progress");
        }
        self.state = GestureState::Idle;
    }
}

/// Pointer positions outside the canvas are pinned to its edges.
fn clamp_px(x: f64, width_px: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    x.clamp(0.0, width_px.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn half_zoom() -> ViewportState {
        // visible window [20, 70]
        ViewportState::new(100.0).with_window(2.0, 20.0)
    }

    #[test]
    fn click_seeks_to_mapped_time() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        assert_eq!(h.pointer_down(250.0, 500.0), InteractionCommand::None);
        let cmd = h.pointer_up(250.0, 500.0, &v);
        let InteractionCommand::Seek(t) = cmd else {
            panic!("expected seek, got {:?}", cmd);
        };
        assert_relative_eq!(t, 45.0);
        assert_eq!(h.state(), GestureState::Idle);
    }

    #[test]
    fn jitter_within_slop_is_still_a_click() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        h.pointer_down(100.0, 500.0);
        assert_eq!(h.pointer_move(103.0, 500.0, &v), InteractionCommand::None);
        assert!(matches!(h.pointer_up(103.0, 500.0, &v), InteractionCommand::Seek(_)));
    }

    #[test]
    fn drag_pans_incrementally_and_never_seeks() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        h.pointer_down(300.0, 500.0);

        let InteractionCommand::PanBy(first) = h.pointer_move(350.0, 500.0, &v) else {
            panic!("expected pan");
        };
        assert_relative_eq!(first, -5.0);

        let InteractionCommand::PanBy(second) = h.pointer_move(400.0, 500.0, &v) else {
            panic!("expected pan");
        };
        assert_relative_eq!(second, -5.0);

        // Returning to the press point is still a drag
        assert!(matches!(h.pointer_move(300.0, 500.0, &v), InteractionCommand::PanBy(_)));
        assert_eq!(h.pointer_up(300.0, 500.0, &v), InteractionCommand::None);
    }

    #[test]
    fn drag_left_moves_window_earlier_and_clamps() {
        let v = ViewportState::new(100.0).with_window(2.0, 10.0);
        let mut h = InteractionHandler::default();
        h.pointer_down(300.0, 500.0);
        let InteractionCommand::PanBy(delta) = h.pointer_move(200.0, 500.0, &v) else {
            panic!("expected pan");
        };
        assert_relative_eq!(delta, 10.0);
        assert_relative_eq!(v.pan_by(delta).pan_start(), 0.0);

        h.pointer_down(300.0, 500.0);
        let InteractionCommand::PanBy(delta) = h.pointer_move(100.0, 500.0, &v) else {
            panic!("expected pan");
        };
        assert_relative_eq!(delta, 20.0);
        assert_eq!(v.pan_by(delta).pan_start(), 0.0);
    }

    #[test]
    fn far_release_without_moves_is_a_drag() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        h.pointer_down(300.0, 500.0);
        let InteractionCommand::PanBy(delta) = h.pointer_up(200.0, 500.0, &v) else {
            panic!("expected pan");
        };
        assert_relative_eq!(delta, 10.0);
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        assert_eq!(h.pointer_move(200.0, 500.0, &v), InteractionCommand::None);
        assert_eq!(h.pointer_up(200.0, 500.0, &v), InteractionCommand::None);
    }

    #[test]
    fn out_of_canvas_click_is_clamped() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        h.pointer_down(900.0, 500.0);
        assert_eq!(h.pointer_up(900.0, 500.0, &v), InteractionCommand::Seek(70.0));
        h.pointer_down(-40.0, 500.0);
        assert_eq!(h.pointer_up(-40.0, 500.0, &v), InteractionCommand::Seek(20.0));
    }

    #[test]
    fn cancel_discards_anchor() {
        let v = half_zoom();
        let mut h = InteractionHandler::default();
        h.pointer_down(100.0, 500.0);
        h.pointer_move(200.0, 500.0, &v);
        h.cancel();
        assert_eq!(h.state(), GestureState::Idle);
        assert_eq!(h.pointer_move(300.0, 500.0, &v), InteractionCommand::None);
    }
}
