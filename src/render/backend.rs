use crate::effects::blend::{BlendOp, Raster};
use crate::foundation::core::{ColorSpace, FrameSize, TimeMs};
use crate::foundation::error::SsbResult;
use crate::foundation::math::{mul_div255, unit_to_u8};
use crate::render::state::{FontDesc, RenderState};
use crate::render::texture::TextureCache;
use crate::transform::path::PathSegment;

/// A rasterized piece of an event, ready to composite.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    /// Premultiplied RGBA8, `width * 4` bytes per row.
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Placement of the top-left pixel in the frame.
    pub x: i32,
    pub y: i32,
    pub blend: BlendOp,
    pub fade_in_ms: TimeMs,
    pub fade_out_ms: TimeMs,
}

impl Overlay {
    /// Borrow the image as a compositor source.
    pub fn raster(&self) -> SsbResult<Raster<'_>> {
        Raster::new(
            &self.image,
            self.width,
            self.height,
            self.width as usize * 4,
            ColorSpace::Rgba,
        )
    }

    /// Opacity factor of the fade envelope at `elapsed` ms into an event lasting `duration` ms.
    pub fn fade_factor(&self, elapsed: TimeMs, duration: TimeMs) -> f64 {
        let mut f = 1.0f64;
        if self.fade_in_ms > 0 && elapsed < self.fade_in_ms {
            f = f.min(elapsed as f64 / self.fade_in_ms as f64);
        }
        let remaining = duration.saturating_sub(elapsed);
        if self.fade_out_ms > 0 && remaining < self.fade_out_ms {
            f = f.min(remaining as f64 / self.fade_out_ms as f64);
        }
        f.clamp(0.0, 1.0)
    }

    /// Copy with every channel scaled by `factor`.
    pub fn faded(&self, factor: f64) -> Self {
        let k = unit_to_u8(factor);
        let mut out = self.clone();
        if k != 255 {
            for b in &mut out.image {
                *b = mul_div255(*b, k);
            }
        }
        out
    }
}

/// Vertical font metrics in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub height: f64,
    pub ascent: f64,
    pub descent: f64,
    pub internal_leading: f64,
    pub external_leading: f64,
}

/// Font collaborator used to lay out and outline text geometry.
pub trait FontProvider: Send {
    fn metrics(&self, font: &FontDesc) -> SsbResult<FontMetrics>;

    /// Advance width of `text`, spacing included.
    fn text_width(&self, font: &FontDesc, text: &str) -> SsbResult<f64>;

    /// Outline of `text` with its origin at the top-left of the line box.
    fn text_path(&self, font: &FontDesc, text: &str) -> SsbResult<Vec<PathSegment>>;
}

/// Per-frame inputs shared by every rasterization call.
#[derive(Clone, Copy)]
pub struct RasterContext<'a> {
    /// Target frame size; overlays outside it may be clipped.
    pub frame: FrameSize,
    /// Milliseconds since the event start.
    pub elapsed_ms: TimeMs,
    /// Script-to-frame scale, applied to stroke widths and blur strengths.
    pub scale: (f64, f64),
    pub textures: &'a TextureCache,
}

/// Turns a render state and a frame-space path into an overlay.
pub trait Rasterizer: Send {
    /// `Ok(None)` means nothing visible was produced.
    fn rasterize(
        &mut self,
        state: &RenderState,
        path: &[PathSegment],
        ctx: &RasterContext<'_>,
    ) -> SsbResult<Option<Overlay>>;
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
