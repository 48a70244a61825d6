pub mod commands;
pub mod layers;
pub mod style;
pub mod surface;
pub mod text;

pub use commands::{DisplayList, DrawCommand, Layer};
pub use layers::{render, render_placeholder, CanvasSize};
pub use surface::{PixelSurface, Surface};
pub use text::TextOverlay;
