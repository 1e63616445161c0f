use crate::effects::blur::blur;
use crate::foundation::core::Rgba;
use crate::foundation::error::{SsbError, SsbResult};
use crate::foundation::math::{mul_div255, unit_to_u8};
use crate::render::backend::{Overlay, RasterContext, Rasterizer};
use crate::render::state::RenderState;
use crate::script::tags::{FillMode, KaraokeMode, LineCap, LineJoin};
use crate::transform::path::{PathSegment, SegmentKind, path_close, path_extents};
use smallvec::{SmallVec, smallvec};
use vello_cpu::kurbo;

/// Options for [`CpuRasterizer`].
#[derive(Clone, Debug)]
pub struct CpuRasterizerOpts {
    pub(crate) max_overlay_side: u32,
}

impl Default for CpuRasterizerOpts {
    fn default() -> Self {
        Self {
            max_overlay_side: u32::from(u16::MAX),
        }
    }
}

impl CpuRasterizerOpts {
    /// Largest overlay width or height; bigger overlays fail to rasterize.
    pub fn with_max_overlay_side(mut self, side: u32) -> Self {
        self.max_overlay_side = side.min(u32::from(u16::MAX));
        self
    }
}

/// [`Rasterizer`] computing coverage with `vello_cpu` and colorizing it in software.
#[derive(Clone, Debug, Default)]
pub struct CpuRasterizer {
    opts: CpuRasterizerOpts,
}

impl CpuRasterizer {
    pub fn new(opts: CpuRasterizerOpts) -> Self {
        Self { opts }
    }
}

/// Pixel-aligned overlay bounds in frame space.
#[derive(Clone, Copy, Debug)]
struct Bounds {
    x: i32,
    y: i32,
    width: u16,
    height: u16,
}

/// Shape extents used by gradients and karaoke sweeps.
#[derive(Clone, Copy, Debug)]
struct Extents {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Extents {
    fn unit(&self, x: f64, y: f64) -> (f64, f64) {
        let u = if self.x1 > self.x0 {
            (x - self.x0) / (self.x1 - self.x0)
        } else {
            0.0
        };
        let v = if self.y1 > self.y0 {
            (y - self.y0) / (self.y1 - self.y0)
        } else {
            0.0
        };
        (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0))
    }
}

impl Rasterizer for CpuRasterizer {
    #[tracing::instrument(level = "trace", skip_all, fields(segments = path.len()))]
    fn rasterize(
        &mut self,
        state: &RenderState,
        path: &[PathSegment],
        ctx: &RasterContext<'_>,
    ) -> SsbResult<Option<Overlay>> {
        let Some((x0, y0, x1, y1)) = path_extents(path) else {
            return Ok(None);
        };
        let extents = Extents { x0, y0, x1, y1 };
        let (sx, sy) = (ctx.scale.0.abs(), ctx.scale.1.abs());
        let stroke_width = state.line.width * (sx + sy) / 2.0;
        let (blur_h, blur_v) = (state.blur_h * sx, state.blur_v * sy);

        let Some(bounds) = self.bounds(state, extents, stroke_width, (blur_h, blur_v), ctx)? else {
            return Ok(None);
        };
        let origin = (f64::from(bounds.x), f64::from(bounds.y));
        let mut coverage = coverage(state, path, extents, origin, bounds, stroke_width, (sx + sy) / 2.0);
        if !state.anti_aliasing {
            for c in &mut coverage {
                *c = if *c >= 128 { 255 } else { 0 };
            }
        }
        if coverage.iter().all(|&c| c == 0) {
            return Ok(None);
        }

        let mut image = colorize(state, &coverage, bounds, extents, ctx);
        let (w, h) = (usize::from(bounds.width), usize::from(bounds.height));
        if blur_h > 0.0 || blur_v > 0.0 {
            blur(&mut image, w, h, w * 4, 4, blur_h, blur_v)?;
        }

        Ok(Some(Overlay {
            image,
            width: u32::from(bounds.width),
            height: u32::from(bounds.height),
            x: bounds.x,
            y: bounds.y,
            blend: state.blend,
            fade_in_ms: state.fade_in,
            fade_out_ms: state.fade_out,
        }))
    }
}

impl CpuRasterizer {
    fn bounds(
        &self,
        state: &RenderState,
        e: Extents,
        stroke_width: f64,
        blur: (f64, f64),
        ctx: &RasterContext<'_>,
    ) -> SsbResult<Option<Bounds>> {
        let stroke_pad = match state.mode {
            // Miter joins may reach past half the width.
            FillMode::Wire => stroke_width * 2.0,
            FillMode::Fill | FillMode::Boxed => 0.0,
        };
        let pad_x = stroke_pad + blur.0.ceil() + 1.0;
        let pad_y = stroke_pad + blur.1.ceil() + 1.0;
        let left = (e.x0 - pad_x).floor().max(0.0);
        let top = (e.y0 - pad_y).floor().max(0.0);
        let right = (e.x1 + pad_x).ceil().min(f64::from(ctx.frame.width));
        let bottom = (e.y1 + pad_y).ceil().min(f64::from(ctx.frame.height));
        if !(right > left && bottom > top) {
            return Ok(None);
        }
        let (width, height) = ((right - left) as u32, (bottom - top) as u32);
        if width > self.opts.max_overlay_side || height > self.opts.max_overlay_side {
            return Err(SsbError::render(format!(
                "overlay {width}x{height} exceeds {} pixels per side",
                self.opts.max_overlay_side
            )));
        }
        let side = |v: u32| u16::try_from(v).map_err(|_| SsbError::render("overlay side exceeds u16"));
        Ok(Some(Bounds {
            x: left as i32,
            y: top as i32,
            width: side(width)?,
            height: side(height)?,
        }))
    }
}

fn to_bezpath(path: &[PathSegment], origin: (f64, f64)) -> kurbo::BezPath {
    let mut out = kurbo::BezPath::new();
    let mut ctrl: SmallVec<[kurbo::Point; 3]> = SmallVec::new();
    let mut open = false;
    let mut start = kurbo::Point::ZERO;
    for seg in path {
        let p = kurbo::Point::new(seg.x - origin.0, seg.y - origin.1);
        match seg.kind {
            SegmentKind::Move => {
                out.move_to(p);
                start = p;
                open = true;
            }
            SegmentKind::Line => {
                if !open {
                    out.move_to(start);
                    open = true;
                }
                out.line_to(p);
            }
            SegmentKind::Curve => {
                ctrl.push(p);
                if let [c1, c2, end] = ctrl[..] {
                    if !open {
                        out.move_to(start);
                        open = true;
                    }
                    out.curve_to(c1, c2, end);
                    ctrl.clear();
                }
            }
            SegmentKind::Close => {
                if open {
                    out.close_path();
                    open = false;
                }
            }
        }
    }
    out
}

fn stroke(state: &RenderState, width: f64, scale: f64) -> kurbo::Stroke {
    let join = match state.line.join {
        LineJoin::Round => kurbo::Join::Round,
        LineJoin::Bevel => kurbo::Join::Bevel,
        LineJoin::Miter => kurbo::Join::Miter,
    };
    let cap = match state.line.cap {
        LineCap::Flat => kurbo::Cap::Butt,
        LineCap::Round => kurbo::Cap::Round,
        LineCap::Square => kurbo::Cap::Square,
    };
    let stroke = kurbo::Stroke::new(width).with_join(join).with_caps(cap);
    if state.line.dashes.is_empty() {
        stroke
    } else {
        stroke.with_dashes(
            state.line.dash_offset * scale,
            state.line.dashes.iter().map(|d| d * scale),
        )
    }
}

/// 8-bit coverage of the shape, one byte per overlay pixel.
fn coverage(
    state: &RenderState,
    path: &[PathSegment],
    e: Extents,
    origin: (f64, f64),
    bounds: Bounds,
    stroke_width: f64,
    scale: f64,
) -> Vec<u8> {
    let mut rc = vello_cpu::RenderContext::new(bounds.width, bounds.height);
    rc.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    match state.mode {
        FillMode::Fill => {
            let mut closed = path.to_vec();
            path_close(&mut closed);
            rc.fill_path(&to_bezpath(&closed, origin));
        }
        FillMode::Wire => {
            rc.set_stroke(stroke(state, stroke_width, scale));
            rc.stroke_path(&to_bezpath(path, origin));
        }
        FillMode::Boxed => {
            rc.fill_rect(&kurbo::Rect::new(
                e.x0 - origin.0,
                e.y0 - origin.1,
                e.x1 - origin.0,
                e.y1 - origin.1,
            ));
        }
    }
    rc.flush();
    let mut pixmap = vello_cpu::Pixmap::new(bounds.width, bounds.height);
    rc.render_to_pixmap(&mut pixmap);
    pixmap
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|px| px[3])
        .collect()
}

fn gradient(colors: &[Rgba], u: f64, v: f64) -> Rgba {
    match colors {
        [tl, tr, br, bl] => tl.lerp(*tr, u).lerp(bl.lerp(*br, u), v),
        [c, ..] => *c,
        [] => Rgba::WHITE,
    }
}

fn colorize(
    state: &RenderState,
    coverage: &[u8],
    bounds: Bounds,
    e: Extents,
    ctx: &RasterContext<'_>,
) -> Vec<u8> {
    let w = usize::from(bounds.width);
    let colors: SmallVec<[Rgba; 4]> = match state.mode {
        FillMode::Wire => smallvec![state.line_color],
        FillMode::Fill | FillMode::Boxed => state.colors.clone(),
    };
    let texture = state
        .texture
        .as_ref()
        .and_then(|t| ctx.textures.get(&t.file).map(|tex| (t, tex)));
    let karaoke = &state.karaoke;
    let phase = karaoke.phase(ctx.elapsed_ms);
    let started = karaoke.start.is_some_and(|s| ctx.elapsed_ms >= s);

    let mut image = vec![0u8; coverage.len() * 4];
    for (i, (&cov, out)) in coverage.iter().zip(image.chunks_exact_mut(4)).enumerate() {
        if cov == 0 {
            continue;
        }
        let fx = f64::from(bounds.x) + (i % w) as f64 + 0.5;
        let fy = f64::from(bounds.y) + (i / w) as f64 + 0.5;
        let (u, v) = e.unit(fx, fy);
        let base = gradient(&colors, u, v);
        let highlight = karaoke.color.with_alpha(base.a);
        let (color, highlighted) = match (phase, karaoke.mode) {
            (Some(_), KaraokeMode::Solid) if started => (highlight, true),
            (Some(p), KaraokeMode::Glow) => (base.lerp(highlight, p), p > 0.0),
            (Some(p), KaraokeMode::Fill) if u < p => (highlight, true),
            _ => (base, false),
        };

        let px = match &texture {
            Some((tref, tex)) if !highlighted => {
                let texel = tex.sample(
                    (fx - tref.x).floor() as i64,
                    (fy - tref.y).floor() as i64,
                    tref.wrap,
                );
                let a = unit_to_u8(color.a);
                texel.map(|c| mul_div255(c, a))
            }
            _ => color.to_premul_rgba8(),
        };
        for (o, c) in out.iter_mut().zip(px) {
            *o = mul_div255(c, cov);
        }
    }
    image
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
