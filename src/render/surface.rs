use super::commands::{Rgba, TextAlign};
use super::layers::CanvasSize;
use super::text::{blend, TextOverlay};

/// 2D drawing sink. Coordinates are logical pixels.
pub trait Surface {
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);
    fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgba,
        dash: Option<(f32, f32)>,
    );
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba);
    fn fill_text(&mut self, pos: (f32, f32), text: &str, size: f32, color: Rgba, align: TextAlign);
}

/// RGBA8 software surface scaled by a device pixel ratio.
pub struct PixelSurface {
    width: u32,
    height: u32,
    scale: f32,
    pixels: Vec<u8>,
    text: Option<TextOverlay>,
}

impl PixelSurface {
    pub fn new(canvas: CanvasSize, device_pixel_ratio: f32, text: Option<TextOverlay>) -> Self {
        let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let width = (canvas.width.max(0.0) * scale).round() as u32;
        let height = (canvas.height.max(0.0) * scale).round() as u32;
        Self {
            width,
            height,
            scale,
            pixels: vec![0; (width * height * 4) as usize],
            text,
        }
    }

    /// Device-pixel dimensions.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    fn blend_at(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let coverage = color.0[3] as f32 / 255.0;
        blend(&mut self.pixels[idx..idx + 4], color.0, coverage);
    }

    fn to_device(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (x * self.scale, y * self.scale)
    }
}

impl Surface for PixelSurface {
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let (x0, y0) = self.to_device((x, y));
        let (x1, y1) = self.to_device((x + w, y + h));
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));

        let col_start = x0.round().max(0.0) as u32;
        let col_end = (x1.round().max(0.0) as u32).min(self.width);
        let row_start = y0.round().max(0.0) as u32;
        let row_end = (y1.round().max(0.0) as u32).min(self.height);

        for row in row_start..row_end {
            for col in col_start..col_end {
                self.blend_at(col as i32, row as i32, color);
            }
        }
    }

    /// Walks the major axis one device pixel at a time and stamps a span of
    /// `width` pixels across the minor axis, so no pixel is blended twice.
    fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgba,
        dash: Option<(f32, f32)>,
    ) {
        let (x0, y0) = self.to_device(from);
        let (x1, y1) = self.to_device(to);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let thickness = (width * self.scale).round().max(1.0) as i32;
        let x_major = dx.abs() >= dy.abs();
        let steps = dx.abs().max(dy.abs()).round() as i32;
        let length = (dx * dx + dy * dy).sqrt();
        let dash = dash.map(|(on, off)| (on * self.scale, (on + off) * self.scale));

        for i in 0..=steps {
            let f = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
            if let Some((on, period)) = dash {
                if period > 0.0 && (f * length) % period >= on {
                    continue;
                }
            }
            let px = (x0 + dx * f).round() as i32;
            let py = (y0 + dy * f).round() as i32;
            for k in 0..thickness {
                let offset = k - thickness / 2;
                if x_major {
                    self.blend_at(px, py + offset, color);
                } else {
                    self.blend_at(px + offset, py, color);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba) {
        let (cx, cy) = self.to_device(center);
        let r = radius * self.scale;
        if r <= 0.0 {
            return;
        }
        let r2 = r * r;
        let (min_x, max_x) = ((cx - r).floor() as i32, (cx + r).ceil() as i32);
        let (min_y, max_y) = ((cy - r).floor() as i32, (cy + r).ceil() as i32);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (fx, fy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if fx * fx + fy * fy <= r2 {
                    self.blend_at(x, y, color);
                }
            }
        }
    }

    fn fill_text(&mut self, pos: (f32, f32), text: &str, size: f32, color: Rgba, align: TextAlign) {
        let Some(overlay) = self.text.as_ref() else {
            return;
        };
        let size = size * self.scale;
        let (x, y) = self.to_device(pos);
        let text_width = overlay.measure_width(text, size) as f32;
        let x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - text_width / 2.0,
            TextAlign::Right => x - text_width,
        };
        overlay.composite(
            &mut self.pixels,
            self.width,
            self.height,
            text,
            x.round() as i32,
            y.round() as i32,
            size,
            color.0,
        );
    }
}
