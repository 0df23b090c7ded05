//! Text measurement and rasterization using fontdue

use crate::compositor::blend_over;
use crate::{Error, Result};
use danmu_core::TextMeasure;
use fontdue::{Font, FontSettings, Metrics};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;

/// Rasterizes single lines of danmaku text at a fixed pixel size
pub struct TextRenderer {
    font: Font,
    size: f32,
    /// Coverage bitmaps cached per character (the size never changes)
    glyphs: HashMap<char, (Metrics, Vec<u8>)>,
}

impl TextRenderer {
    /// Loads a TrueType/OpenType font from a file
    pub fn from_file(path: &Path, size: f32) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data, size)
    }

    /// Loads a TrueType/OpenType font from raw bytes
    pub fn from_bytes(data: &[u8], size: f32) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(Error::Core(danmu_core::Error::InvalidConfig(format!(
                "font size must be positive, got {size}"
            ))));
        }

        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| Error::Font(e.to_string()))?;

        Ok(Self {
            font,
            size,
            glyphs: HashMap::new(),
        })
    }

    /// Configured pixel size
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Width in pixels of `text` rendered on a single line
    pub fn line_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, self.size).advance_width)
            .sum()
    }

    /// Distance from the top of a line to its baseline
    fn ascent(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(self.size)
    }

    /// Draws `text` onto an RGBA layer with its top-left corner at `(x, y)`.
    ///
    /// Glyph coverage is scaled by `alpha` and composited over whatever the
    /// layer already holds, so overlapping draws blend instead of clobbering.
    pub fn draw(
        &mut self,
        layer: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        color: [u8; 3],
        alpha: u8,
    ) {
        let baseline = y + self.ascent();
        let size = self.size;
        let font = &self.font;
        let glyphs = &mut self.glyphs;
        let mut cursor = x;

        for ch in text.chars() {
            let (metrics, bitmap) = glyphs
                .entry(ch)
                .or_insert_with(|| font.rasterize(ch, size));

            let glyph_x = (cursor + metrics.xmin as f32).round() as i32;
            let glyph_y = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col];
                    if coverage == 0 {
                        continue;
                    }

                    let px = glyph_x + col as i32;
                    let py = glyph_y + row as i32;
                    if px < 0 || py < 0 || px >= layer.width() as i32 || py >= layer.height() as i32
                    {
                        continue;
                    }

                    let src_alpha = ((coverage as u16 * alpha as u16) / 255) as u8;
                    blend_over(layer.get_pixel_mut(px as u32, py as u32), color, src_alpha);
                }
            }

            cursor += metrics.advance_width;
        }
    }
}

impl TextMeasure for TextRenderer {
    fn line_width(&self, text: &str) -> f32 {
        TextRenderer::line_width(self, text)
    }
}
