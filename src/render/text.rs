use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::path::Path;

/// Fonts tried when neither a path nor a URL is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct TextOverlay {
    font: Font,
}

impl TextOverlay {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        Self::from_bytes(&bytes)
    }

    /// Resolve a font from explicit bytes, then a path, then well-known
    /// system locations. `None` means labels will not be drawn.
    pub fn load(font_path: Option<&Path>, font_bytes: Option<&[u8]>) -> Option<Self> {
        if let Some(bytes) = font_bytes {
            match Self::from_bytes(bytes) {
                Ok(overlay) => return Some(overlay),
                Err(err) => log::warn!("{:#}", err),
            }
        }

        if let Some(path) = font_path {
            match Self::from_file(path) {
                Ok(overlay) => {
                    log::info!("Loaded font {}", path.display());
                    return Some(overlay);
                }
                Err(err) => log::warn!("{:#}", err),
            }
        }

        for candidate in SYSTEM_FONTS {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            if let Ok(overlay) = Self::from_file(path) {
                log::info!("Using system font {}", path.display());
                return Some(overlay);
            }
        }

        log::warn!("No usable font found; timeline labels will be skipped");
        None
    }

    /// Composite text onto an RGBA pixel buffer with its top-left at (x, y).
    #[allow(clippy::too_many_arguments)]
    pub fn composite(
        &self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        text: &str,
        x: i32,
        y: i32,
        font_size: f32,
        color: [u8; 4],
    ) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, font_size);
            let glyph_y = y + font_size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = bitmap[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }

                    let px = cursor_x + gx as i32;
                    let py = glyph_y + gy as i32;

                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }

                    let idx = ((py as u32 * width + px as u32) * 4) as usize;
                    let coverage = alpha as f32 / 255.0 * (color[3] as f32 / 255.0);
                    blend(&mut pixels[idx..idx + 4], color, coverage);
                }
            }

            cursor_x += metrics.advance_width.round() as i32;
        }
    }

    /// Measure the width of rendered text in pixels.
    pub fn measure_width(&self, text: &str, font_size: f32) -> u32 {
        let width: f32 = text
            .chars()
            .map(|ch| self.font.metrics(ch, font_size).advance_width.round())
            .sum();
        width.max(0.0) as u32
    }
}

/// Source-over blend of `color` into one RGBA pixel at the given coverage.
pub fn blend(pixel: &mut [u8], color: [u8; 4], coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    let inv_a = 1.0 - a;
    pixel[0] = (color[0] as f32 * a + pixel[0] as f32 * inv_a) as u8;
    pixel[1] = (color[1] as f32 * a + pixel[1] as f32 * inv_a) as u8;
    pixel[2] = (color[2] as f32 * a + pixel[2] as f32 * inv_a) as u8;
    pixel[3] = 255;
}

/// Download a TTF/OTF font.
pub fn load_font_from_url(url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading font from {}", url);
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to fetch font: {}", url))?
        .error_for_status()
        .with_context(|| format!("Font request failed: {}", url))?;
    let bytes = response.bytes().context("Failed to read font response")?;
    Ok(bytes.to_vec())
}
