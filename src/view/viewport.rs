/// Full track visible
pub const MIN_ZOOM: f64 = 1.0;

/// Narrowest window is duration / 20
pub const MAX_ZOOM: f64 = 20.0;

/// Factor applied per zoom in / zoom out step
pub const ZOOM_STEP: f64 = 1.5;

/// Slack allowed before the invariant check re-clamps
const INVARIANT_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    zoom_level: f64,
    pan_start: f64,
    duration: f64,
}

impl ViewportState {
    /// Whole-track view for a timeline of `duration` seconds.
    pub fn new(duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            f64::EPSILON
        };
        Self {
            zoom_level: MIN_ZOOM,
            pan_start: 0.0,
            duration,
        }
    }

    /// Start from an explicit zoom and window start, clamped.
    pub fn with_window(self, zoom_level: f64, pan_start: f64) -> Self {
        Self {
            zoom_level: clamp_zoom(zoom_level),
            pan_start,
            ..self
        }
        .clamped()
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn pan_start(&self) -> f64 {
        self.pan_start
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn visible_duration(&self) -> f64 {
        self.duration / self.zoom_level
    }

    pub fn visible_end(&self) -> f64 {
        self.pan_start + self.visible_duration()
    }

    /// Closed-interval membership in the visible window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.pan_start && time <= self.visible_end()
    }

    pub fn zoom_in(self) -> Self {
        self.zoom_around_center(self.zoom_level * ZOOM_STEP)
    }

    pub fn zoom_out(self) -> Self {
        self.zoom_around_center(self.zoom_level / ZOOM_STEP)
    }

    pub fn reset(self) -> Self {
        Self::new(self.duration)
    }

    /// Shift the window by `delta_seconds`; positive deltas move it earlier.
    pub fn pan_by(self, delta_seconds: f64) -> Self {
        if !delta_seconds.is_finite() {
            return self;
        }
        Self {
            pan_start: self.pan_start - delta_seconds,
            ..self
        }
        .clamped()
    }

    /// Page the window so `time` is visible, keeping the zoom level.
    pub fn ensure_visible(self, time: f64) -> Self {
        if self.contains(time) {
            return self;
        }
        let pan_start = if time < self.pan_start {
            time - self.visible_duration()
        } else {
            time
        };
        Self { pan_start, ..self }.clamped()
    }

    pub fn seconds_per_pixel(&self, width_px: f64) -> f64 {
        if width_px <= 0.0 {
            return 0.0;
        }
        self.visible_duration() / width_px
    }

    /// Map a time onto `[0, width_px]`. Times outside the window map outside it.
    pub fn time_to_pixel(&self, width_px: f64, time: f64) -> f64 {
        if width_px <= 0.0 {
            return 0.0;
        }
        (time - self.pan_start) / self.visible_duration() * width_px
    }

    /// Inverse of `time_to_pixel`.
    pub fn pixel_to_time(&self, width_px: f64, px: f64) -> f64 {
        if width_px <= 0.0 {
            return self.pan_start;
        }
        self.pan_start + px / width_px * self.visible_duration()
    }

    fn zoom_around_center(self, zoom_level: f64) -> Self {
        let center = self.pan_start + self.visible_duration() / 2.0;
        let zoom_level = clamp_zoom(zoom_level);
        let visible = self.duration / zoom_level;
        Self {
            zoom_level,
            pan_start: center - visible / 2.0,
            ..self
        }
        .clamped()
    }

    fn max_pan(&self) -> f64 {
        (self.duration - self.visible_duration()).max(0.0)
    }

    fn clamped(self) -> Self {
        let zoom_level = clamp_zoom(self.zoom_level);
        let mut next = Self { zoom_level, ..self };
        let pan_start = if next.pan_start.is_finite() {
            next.pan_start.clamp(0.0, next.max_pan())
        } else {
            0.0
        };
        next.pan_start = pan_start;
        next.check_invariants()
    }

    /// Re-clamp if float drift ever pushed the window out of range.
    fn check_invariants(self) -> Self {
        let ok = (MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom_level)
            && self.pan_start >= 0.0
            && self.visible_end() <= self.duration + INVARIANT_EPSILON;
        if ok {
            return self;
        }
        log::debug!(
            "Viewport invariant violated (zoom={}, pan={}, duration={}), re-clamping",
            self.zoom_level,
            self.pan_start,
            self.duration
        );
        let zoom_level = clamp_zoom(self.zoom_level);
        let visible = self.duration / zoom_level;
        Self {
            zoom_level,
            pan_start: (self.duration - visible).max(0.0).min(self.pan_start.max(0.0)),
            duration: self.duration,
        }
    }
}

fn clamp_zoom(zoom_level: f64) -> f64 {
    if zoom_level.is_finite() {
        zoom_level.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        MIN_ZOOM
    }
}
