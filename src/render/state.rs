use crate::effects::blend::BlendOp;
use crate::expression::Formula;
use crate::foundation::core::{Point, Rgba, TimeMs};
use crate::foundation::math::lerp;
use crate::script::tags::{
    Animation, Direction, FillMode, FontStyle, GeometryMode, KaraokeMode, LineCap, LineJoin, Rgb,
    RotateAxis, StencilMode, Tag, TextureWrap,
};
use crate::transform::matrix::{Matrix4x4d, MatrixOrder};
use smallvec::{SmallVec, smallvec};

/// Font selection and spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct FontDesc {
    /// Family name handed to the font provider.
    pub family: String,
    /// Bold, italic, underline and strikeout flags.
    pub style: FontStyle,
    /// Em size in script pixels.
    pub size: f64,
    /// Extra advance between glyphs.
    pub space_h: f64,
    /// Extra advance between lines.
    pub space_v: f64,
}

/// Stroke parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LineStyle {
    /// Stroke width in script pixels, used by wire mode.
    pub width: f64,
    pub join: LineJoin,
    pub cap: LineCap,
    /// Distance into the dash pattern where the stroke starts.
    pub dash_offset: f64,
    /// Alternating dash and gap lengths; empty for a solid line.
    pub dashes: SmallVec<[f64; 4]>,
}

/// Texture used instead of the flat fill color.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    /// File name, resolved relative to the script directory.
    pub file: String,
    /// Horizontal offset of the texture origin in frame pixels.
    pub x: f64,
    /// Vertical offset of the texture origin in frame pixels.
    pub y: f64,
    /// Sampling outside the image.
    pub wrap: TextureWrap,
}

/// Running karaoke cursor of an event.
#[derive(Clone, Debug, PartialEq)]
pub struct KaraokeState {
    /// Syllable start relative to the event start; `None` until the first karaoke tag.
    pub start: Option<TimeMs>,
    pub duration: TimeMs,
    pub color: Rgba,
    pub mode: KaraokeMode,
}

impl KaraokeState {
    /// Highlight progress of the current syllable at `elapsed` ms into the event.
    ///
    /// `None` when no karaoke tag was applied.
    pub fn phase(&self, elapsed: TimeMs) -> Option<f64> {
        let start = self.start?;
        Some(if elapsed < start {
            0.0
        } else if elapsed >= start.saturating_add(self.duration) {
            1.0
        } else {
            (elapsed - start) as f64 / self.duration as f64
        })
    }
}

/// Timing context a tag is applied in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventTiming {
    /// Event start.
    pub start_ms: TimeMs,
    /// Event end, exclusive.
    pub end_ms: TimeMs,
    /// Query time.
    pub time_ms: TimeMs,
}

impl EventTiming {
    /// Timing of an event spanning `start_ms..end_ms`, queried at `time_ms`.
    pub fn new(start_ms: TimeMs, end_ms: TimeMs, time_ms: TimeMs) -> Self {
        Self {
            start_ms,
            end_ms,
            time_ms,
        }
    }

    /// Milliseconds since the event start, 0 before it.
    pub fn elapsed(&self) -> TimeMs {
        self.time_ms.saturating_sub(self.start_ms)
    }

    /// Event length, 0 for inverted spans.
    pub fn duration(&self) -> TimeMs {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Position in the event window, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        match self.duration() {
            0 => 0.0,
            d => (self.elapsed() as f64 / d as f64).min(1.0),
        }
    }
}

/// Cumulative drawing state folded from an event's tags.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub font: FontDesc,
    pub line: LineStyle,
    pub geometry: GeometryMode,
    pub mode: FillMode,
    /// `(x, y)` deform formulas.
    pub deform: Option<(String, String)>,
    pub deform_progress: f64,
    pub position: Option<Point>,
    /// Numpad alignment 1-9.
    pub alignment: u8,
    pub margin_h: f64,
    pub margin_v: f64,
    pub direction: Direction,
    pub matrix: Matrix4x4d,
    /// One color, or four corner colors (top-left, top-right, bottom-right, bottom-left).
    pub colors: SmallVec<[Rgba; 4]>,
    pub line_color: Rgba,
    pub texture: Option<TextureRef>,
    pub blend: BlendOp,
    pub blur_h: f64,
    pub blur_v: f64,
    pub stencil: StencilMode,
    pub anti_aliasing: bool,
    pub fade_in: TimeMs,
    pub fade_out: TimeMs,
    pub karaoke: KaraokeState,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            font: FontDesc {
                family: "Arial".to_owned(),
                style: FontStyle::default(),
                size: 30.0,
                space_h: 0.0,
                space_v: 0.0,
            },
            line: LineStyle {
                width: 2.0,
                join: LineJoin::Round,
                cap: LineCap::Round,
                dash_offset: 0.0,
                dashes: SmallVec::new(),
            },
            geometry: GeometryMode::Text,
            mode: FillMode::Fill,
            deform: None,
            deform_progress: 0.0,
            position: None,
            alignment: 2,
            margin_h: 0.0,
            margin_v: 0.0,
            direction: Direction::Ltr,
            matrix: Matrix4x4d::identity(),
            colors: smallvec![Rgba::WHITE],
            line_color: Rgba::BLACK,
            texture: None,
            blend: BlendOp::Over,
            blur_h: 0.0,
            blur_v: 0.0,
            stencil: StencilMode::Off,
            anti_aliasing: true,
            fade_in: 0,
            fade_out: 0,
            karaoke: KaraokeState {
                start: None,
                duration: 0,
                color: Rgba::new(1.0, 0.0, 0.0, 1.0),
                mode: KaraokeMode::Fill,
            },
        }
    }
}

fn rgb(c: Rgb, a: f64) -> Rgba {
    Rgba::new(c[0], c[1], c[2], a)
}

fn corner(colors: &[Rgba], i: usize) -> Rgba {
    colors
        .get(i)
        .or_else(|| colors.first())
        .copied()
        .unwrap_or(Rgba::WHITE)
}

impl RenderState {
    /// Fold one tag into the state.
    pub fn apply(&mut self, tag: &Tag, timing: EventTiming) {
        match tag {
            Tag::FontFamily(f) => self.font.family.clone_from(f),
            Tag::FontStyle(s) => self.font.style = *s,
            Tag::FontSize(s) => self.font.size = *s,
            Tag::FontSpace { h, v } => {
                self.font.space_h = h.unwrap_or(self.font.space_h);
                self.font.space_v = v.unwrap_or(self.font.space_v);
            }
            Tag::LineWidth(w) => self.line.width = *w,
            Tag::LineStyle { join, cap } => {
                self.line.join = *join;
                self.line.cap = *cap;
            }
            Tag::LineDash { offset, dashes } => {
                self.line.dash_offset = *offset;
                self.line.dashes.clone_from(dashes);
            }
            Tag::Geometry(g) => self.geometry = *g,
            Tag::Mode(m) => self.mode = *m,
            Tag::Deform { x, y } => {
                self.deform = Some((x.clone(), y.clone()));
                self.deform_progress = 0.0;
            }
            Tag::Position(p) => self.position = *p,
            Tag::Alignment(a) => self.alignment = *a,
            Tag::Margin { h, v } => {
                self.margin_h = h.unwrap_or(self.margin_h);
                self.margin_v = v.unwrap_or(self.margin_v);
            }
            Tag::Direction(d) => self.direction = *d,
            Tag::Identity => {
                self.matrix.set_identity();
            }
            Tag::Translate { .. }
            | Tag::Scale { .. }
            | Tag::Rotate { .. }
            | Tag::Shear { .. }
            | Tag::Transform(_) => self.compose(tag, 1.0),
            Tag::Color(colors) => self.set_colors(colors, 1.0),
            Tag::Alpha(alphas) => self.set_alphas(alphas, 1.0),
            Tag::LineColor(c) => self.line_color = rgb(*c, self.line_color.a),
            Tag::LineAlpha(a) => self.line_color.a = *a,
            Tag::Texture(file) => {
                if file.is_empty() {
                    self.texture = None;
                } else {
                    let (x, y, wrap) = self
                        .texture
                        .as_ref()
                        .map_or((0.0, 0.0, TextureWrap::Clamp), |t| (t.x, t.y, t.wrap));
                    self.texture = Some(TextureRef {
                        file: file.clone(),
                        x,
                        y,
                        wrap,
                    });
                }
            }
            Tag::TexFill { x, y, wrap } => match &mut self.texture {
                Some(t) => {
                    t.x = *x;
                    t.y = *y;
                    t.wrap = *wrap;
                }
                None => tracing::debug!("texfill without texture ignored"),
            },
            Tag::Blend(op) => self.blend = *op,
            Tag::Blur { h, v } => {
                self.blur_h = *h;
                self.blur_v = *v;
            }
            Tag::Stencil(s) => self.stencil = *s,
            Tag::AntiAliasing(on) => self.anti_aliasing = *on,
            Tag::Fade { fade_in, fade_out } => {
                self.fade_in = *fade_in;
                self.fade_out = *fade_out;
            }
            Tag::Animate(anim) => self.animate(anim, timing),
            Tag::Karaoke(duration) => {
                let k = &mut self.karaoke;
                k.start = Some(k.start.map_or(0, |s| s.saturating_add(k.duration)));
                k.duration = *duration;
            }
            Tag::KaraokeSet(at) => {
                self.karaoke.start = Some(*at);
                self.karaoke.duration = 0;
            }
            Tag::KaraokeColor(c) => self.karaoke.color = rgb(*c, 1.0),
            Tag::KaraokeMode(m) => self.karaoke.mode = *m,
        }
    }

    /// Compose a transform tag, scaled toward identity by `p`.
    fn compose(&mut self, tag: &Tag, p: f64) {
        let order = MatrixOrder::Prepend;
        match *tag {
            Tag::Translate { x, y, z } => {
                self.matrix.translate(x * p, y * p, z * p, order);
            }
            Tag::Scale { x, y, z } => {
                self.matrix
                    .scale(lerp(1.0, x, p), lerp(1.0, y, p), lerp(1.0, z, p), order);
            }
            Tag::Rotate {
                axis,
                first,
                second,
            } => {
                let a = (first * p).to_radians();
                let b = (second * p).to_radians();
                match axis {
                    RotateAxis::X => self.matrix.rotate_x(a, order),
                    RotateAxis::Y => self.matrix.rotate_y(a, order),
                    RotateAxis::Z => self.matrix.rotate_z(a, order),
                    RotateAxis::Xy => self.matrix.rotate_x(a, order).rotate_y(b, order),
                    RotateAxis::Yx => self.matrix.rotate_y(a, order).rotate_x(b, order),
                };
            }
            Tag::Shear { x, y } => {
                self.matrix.shear(x * p, y * p, order);
            }
            Tag::Transform(m) => {
                let id = Matrix4x4d::identity();
                let mut scaled = [0.0; 16];
                for (i, v) in scaled.iter_mut().enumerate() {
                    *v = lerp(id.as_array()[i], m[i], p);
                }
                self.matrix.multiply(&Matrix4x4d::from_array(scaled), order);
            }
            _ => {}
        }
    }

    fn set_colors(&mut self, colors: &[Rgb], p: f64) {
        let old = self.colors.clone();
        let n = colors.len().max(old.len());
        self.colors = (0..n)
            .map(|i| {
                let from = corner(&old, i);
                let to = colors.get(i).or_else(|| colors.first()).copied();
                to.map_or(from, |c| from.lerp(rgb(c, from.a), p))
            })
            .collect();
    }

    fn set_alphas(&mut self, alphas: &[f64], p: f64) {
        if alphas.len() > self.colors.len() {
            let first = corner(&self.colors, 0);
            self.colors.resize(alphas.len(), first);
        }
        for (i, c) in self.colors.iter_mut().enumerate() {
            if let Some(a) = alphas.get(i).or_else(|| alphas.first()) {
                c.a = lerp(c.a, *a, p);
            }
        }
    }

    fn animate(&mut self, anim: &Animation, timing: EventTiming) {
        // Widened so script offsets near the i64 bounds cannot overflow.
        let duration = i128::from(timing.duration());
        let resolve = |t: i64| {
            let t = i128::from(t);
            if t < 0 { duration + t } else { t }
        };
        let t0 = anim.start.map_or(0, resolve);
        let t1 = anim.end.map_or(duration, resolve);
        let elapsed = i128::from(timing.elapsed());

        let mut p = if t1 <= t0 {
            if elapsed >= t0 { 1.0 } else { 0.0 }
        } else {
            ((elapsed - t0) as f64 / (t1 - t0) as f64).clamp(0.0, 1.0)
        };
        if let Some(src) = &anim.formula {
            match Formula::compile(src).and_then(|mut f| f.eval(0.0, 0.0, p)) {
                Ok(v) => p = v,
                Err(err) => tracing::debug!(formula = %src, %err, "animate progress formula failed"),
            }
        }

        for tag in &anim.tags {
            self.interpolate(tag, p, timing);
        }
    }

    fn interpolate(&mut self, tag: &Tag, p: f64, timing: EventTiming) {
        match tag {
            Tag::FontSize(s) => self.font.size = lerp(self.font.size, *s, p),
            Tag::FontSpace { h, v } => {
                if let Some(h) = h {
                    self.font.space_h = lerp(self.font.space_h, *h, p);
                }
                if let Some(v) = v {
                    self.font.space_v = lerp(self.font.space_v, *v, p);
                }
            }
            Tag::LineWidth(w) => self.line.width = lerp(self.line.width, *w, p),
            Tag::Position(Some(to)) if self.position.is_some() => {
                self.position = self
                    .position
                    .map(|from| Point::new(lerp(from.x, to.x, p), lerp(from.y, to.y, p)));
            }
            Tag::Margin { h, v } => {
                if let Some(h) = h {
                    self.margin_h = lerp(self.margin_h, *h, p);
                }
                if let Some(v) = v {
                    self.margin_v = lerp(self.margin_v, *v, p);
                }
            }
            Tag::Translate { .. }
            | Tag::Scale { .. }
            | Tag::Rotate { .. }
            | Tag::Shear { .. }
            | Tag::Transform(_) => self.compose(tag, p),
            Tag::Color(colors) => self.set_colors(colors, p),
            Tag::Alpha(alphas) => self.set_alphas(alphas, p),
            Tag::LineColor(c) => {
                self.line_color = self.line_color.lerp(rgb(*c, self.line_color.a), p);
            }
            Tag::LineAlpha(a) => self.line_color.a = lerp(self.line_color.a, *a, p),
            Tag::TexFill { x, y, wrap } => {
                if let Some(t) = &mut self.texture {
                    t.x = lerp(t.x, *x, p);
                    t.y = lerp(t.y, *y, p);
                    if p >= 0.5 {
                        t.wrap = *wrap;
                    }
                }
            }
            Tag::Blur { h, v } => {
                self.blur_h = lerp(self.blur_h, *h, p);
                self.blur_v = lerp(self.blur_v, *v, p);
            }
            Tag::KaraokeColor(c) => {
                self.karaoke.color = self.karaoke.color.lerp(rgb(*c, 1.0), p);
            }
            Tag::Deform { x, y } => {
                self.deform = Some((x.clone(), y.clone()));
                self.deform_progress = p;
            }
            Tag::Animate(_) => tracing::debug!("nested animate ignored"),
            other if p >= 0.5 => self.apply(other, timing),
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/state.rs"]
mod tests;
