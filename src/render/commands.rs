use super::surface::Surface;

/// Straight RGBA, 0-255 per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, a])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One primitive in logical (CSS) pixels. The surface applies the
/// device pixel ratio.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgba,
        /// (on, off) lengths for dashed strokes
        dash: Option<(f32, f32)>,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        width: f32,
        color: Rgba,
    },
    FillCircle {
        center: (f32, f32),
        radius: f32,
        color: Rgba,
    },
    Text {
        /// Anchor point; `y` is the top of the line box
        pos: (f32, f32),
        text: String,
        size: f32,
        color: Rgba,
        align: TextAlign,
    },
}

/// Draw layers, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Background,
    SegmentHighlight,
    LevelGrid,
    TimeGrid,
    Energy,
    Beats,
    Downbeats,
    Segments,
    Playhead,
    Caption,
}

/// Ordered output of one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    items: Vec<(Layer, DrawCommand)>,
}

impl DisplayList {
    pub fn push(&mut self, layer: Layer, command: DrawCommand) {
        self.items.push((layer, command));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &(Layer, DrawCommand)> {
        self.items.iter()
    }

    /// Commands belonging to one layer, in draw order.
    #[cfg(test)]
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.items
            .iter()
            .filter(move |(l, _)| *l == layer)
            .map(|(_, cmd)| cmd)
    }

    /// Replay every command onto a drawing surface.
    pub fn replay(&self, surface: &mut dyn Surface) {
        for (_, command) in &self.items {
            match command {
                DrawCommand::FillRect { x, y, w, h, color } => {
                    surface.fill_rect(*x, *y, *w, *h, *color)
                }
                DrawCommand::Line {
                    from,
                    to,
                    width,
                    color,
                    dash,
                } => surface.stroke_line(*from, *to, *width, *color, *dash),
                DrawCommand::Polyline {
                    points,
                    width,
                    color,
                } => {
                    for pair in points.windows(2) {
                        surface.stroke_line(pair[0], pair[1], *width, *color, None);
                    }
                }
                DrawCommand::FillCircle {
                    center,
                    radius,
                    color,
                } => surface.fill_circle(*center, *radius, *color),
                DrawCommand::Text {
                    pos,
                    text,
                    size,
                    color,
                    align,
                } => surface.fill_text(*pos, text, *size, *color, *align),
            }
        }
    }
}
