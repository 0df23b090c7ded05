//! Frame compositor for blending danmaku over video frames

use crate::font::TextRenderer;
use danmu_core::ActiveDanmaku;
use image::{Rgba, RgbaImage};

/// Composites the active danmaku set onto decoded frames
pub struct Compositor {
    text: TextRenderer,
    lane_height: u32,
}

impl Compositor {
    /// Creates a compositor drawing with the given renderer and lane height
    pub fn new(text: TextRenderer, lane_height: u32) -> Self {
        Self { text, lane_height }
    }

    /// The text renderer, usable as the scheduler's width measurer
    pub fn text(&self) -> &TextRenderer {
        &self.text
    }

    /// Renders the active set onto a copy of `frame`.
    ///
    /// Text is drawn onto a transparent overlay first and the overlay is
    /// flattened onto the copy last, so partially transparent annotations
    /// blend against each other before they blend against the frame. The
    /// input frame is left untouched.
    pub fn render(&mut self, frame: &RgbaImage, active: &[ActiveDanmaku]) -> RgbaImage {
        let mut overlay = RgbaImage::from_pixel(frame.width(), frame.height(), Rgba([0, 0, 0, 0]));

        for danmaku in active {
            let y = danmaku.lane as u32 * self.lane_height;
            self.text.draw(
                &mut overlay,
                &danmaku.event.text,
                danmaku.x,
                y as f32,
                danmaku.event.color,
                danmaku.event.alpha,
            );
        }

        let mut composited = frame.clone();
        flatten(&mut composited, &overlay);
        composited
    }
}

/// Composites a straight-alpha source pixel over a destination pixel
pub(crate) fn blend_over(dst: &mut Rgba<u8>, color: [u8; 3], alpha: u8) {
    if alpha == 0 {
        return;
    }

    let src_alpha = alpha as f32 / 255.0;
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return;
    }

    for channel in 0..3 {
        let src = color[channel] as f32;
        let accumulated = dst[channel] as f32 * dst_alpha * (1.0 - src_alpha);
        dst[channel] = ((src * src_alpha + accumulated) / out_alpha).round() as u8;
    }
    dst[3] = (out_alpha * 255.0).round() as u8;
}

/// Flattens a straight-alpha overlay onto an opaque base of the same size
fn flatten(base: &mut RgbaImage, overlay: &RgbaImage) {
    for (base_pixel, overlay_pixel) in base.pixels_mut().zip(overlay.pixels()) {
        let alpha = overlay_pixel[3] as f32 / 255.0;
        if alpha <= 0.0 {
            continue;
        }
        let inv_alpha = 1.0 - alpha;

        for channel in 0..3 {
            base_pixel[channel] = (overlay_pixel[channel] as f32 * alpha
                + base_pixel[channel] as f32 * inv_alpha) as u8;
        }
        base_pixel[3] = 255;
    }
}
