use crate::effects::blend::{RasterMut, blend};
use crate::foundation::cache::BoundedCache;
use crate::foundation::core::{ColorSpace, FrameSize, TimeMs};
use crate::foundation::error::{SsbError, SsbResult};
use crate::foundation::math::mul_div255;
use crate::render::backend::{FontProvider, Overlay, RasterContext, Rasterizer};
use crate::render::cpu::CpuRasterizer;
use crate::render::deform::{DEFAULT_FORMULA_CACHE_CAPACITY, FormulaCache};
use crate::render::layout::{LayoutContext, layout_event};
use crate::render::state::EventTiming;
use crate::render::texture::{DEFAULT_TEXTURE_CACHE_CAPACITY, TextureCache};
use crate::script::model::{Document, Event};
use crate::script::parser::{ParseLevel, ScriptParser};
use crate::script::tags::StencilMode;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding [`RendererOpts`]'s overlay cache capacity.
pub const OVERLAY_CACHE_CAPACITY_ENV: &str = "SSB_OVERLAY_CACHE_CAPACITY";

const DEFAULT_OVERLAY_CACHE_CAPACITY: usize = 64;

/// Options for [`Renderer`] construction.
#[derive(Clone, Debug)]
pub struct RendererOpts {
    pub(crate) level: ParseLevel,
    pub(crate) overlay_cache_capacity: usize,
    pub(crate) formula_cache_capacity: usize,
    pub(crate) texture_cache_capacity: usize,
}

impl Default for RendererOpts {
    fn default() -> Self {
        let overlay_cache_capacity = std::env::var(OVERLAY_CACHE_CAPACITY_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_OVERLAY_CACHE_CAPACITY);
        Self {
            level: ParseLevel::default(),
            overlay_cache_capacity,
            formula_cache_capacity: DEFAULT_FORMULA_CACHE_CAPACITY,
            texture_cache_capacity: DEFAULT_TEXTURE_CACHE_CAPACITY,
        }
    }
}

impl RendererOpts {
    /// Script parse strictness.
    pub fn with_level(mut self, level: ParseLevel) -> Self {
        self.level = level;
        self
    }

    /// Number of static events whose overlays are memoized. 0 disables the cache.
    pub fn with_overlay_cache_capacity(mut self, capacity: usize) -> Self {
        self.overlay_cache_capacity = capacity;
        self
    }

    /// Number of compiled deform formula pairs kept between frames.
    pub fn with_formula_cache_capacity(mut self, capacity: usize) -> Self {
        self.formula_cache_capacity = capacity;
        self
    }

    pub fn with_texture_cache_capacity(mut self, capacity: usize) -> Self {
        self.texture_cache_capacity = capacity;
        self
    }
}

type OverlayList = Option<Arc<Vec<Overlay>>>;

/// A parsed script bound to a target frame geometry.
///
/// Rendering takes `&mut self`; one instance renders one frame at a time.
pub struct Renderer {
    doc: Document,
    target: FrameSize,
    space: ColorSpace,
    formulas: Arc<FormulaCache>,
    textures: Arc<TextureCache>,
    overlays: BoundedCache<usize, OverlayList>,
    rasterizer: Box<dyn Rasterizer>,
    fonts: Option<Box<dyn FontProvider>>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("events", &self.doc.events.len())
            .field("target", &self.target)
            .field("space", &self.space)
            .field("fonts", &self.fonts.is_some())
            .finish_non_exhaustive()
    }
}

fn check_target(width: u32, height: u32) -> SsbResult<FrameSize> {
    let size = FrameSize::new(width, height);
    if size.is_empty() {
        return Err(SsbError::render(format!("invalid target size {width}x{height}")));
    }
    Ok(size)
}

impl Renderer {
    /// Load a script file. Textures are resolved relative to its directory.
    #[tracing::instrument(skip(opts), fields(path = %path.as_ref().display()))]
    pub fn from_path(
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        space: ColorSpace,
        opts: RendererOpts,
    ) -> SsbResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            SsbError::render(format!("cannot open script {}: {e}", path.display()))
        })?;
        let mut parser = ScriptParser::new(opts.level);
        parser.parse_reader(std::io::BufReader::new(file))?;
        let base = path.parent().map(Path::to_path_buf);
        Self::build(parser.into_document(), base, width, height, space, &opts)
    }

    /// Parse a script held in memory. Textures are resolved relative to the working directory.
    #[tracing::instrument(skip(script, opts), fields(bytes = script.len()))]
    pub fn from_script(
        script: &str,
        width: u32,
        height: u32,
        space: ColorSpace,
        opts: RendererOpts,
    ) -> SsbResult<Self> {
        let mut parser = ScriptParser::new(opts.level);
        parser.parse_script(script)?;
        Self::build(parser.into_document(), None, width, height, space, &opts)
    }

    fn build(
        doc: Document,
        base_dir: Option<PathBuf>,
        width: u32,
        height: u32,
        space: ColorSpace,
        opts: &RendererOpts,
    ) -> SsbResult<Self> {
        let target = check_target(width, height)?;
        tracing::debug!(events = doc.events.len(), styles = doc.styles.len(), "script loaded");
        Ok(Self {
            doc,
            target,
            space,
            formulas: Arc::new(FormulaCache::new(opts.formula_cache_capacity)),
            textures: Arc::new(TextureCache::new(base_dir, opts.texture_cache_capacity)),
            overlays: BoundedCache::new(opts.overlay_cache_capacity),
            rasterizer: Box::new(CpuRasterizer::default()),
            fonts: None,
        })
    }

    /// Replace the rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self.overlays.clear();
        self
    }

    /// Enable text geometry with `fonts`.
    pub fn with_font_provider(mut self, fonts: impl FontProvider + 'static) -> Self {
        self.fonts = Some(Box::new(fonts));
        self.overlays.clear();
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Current target size and pixel layout.
    pub fn target(&self) -> (FrameSize, ColorSpace) {
        (self.target, self.space)
    }

    /// Shared texture store, e.g. to register in-memory textures.
    pub fn textures(&self) -> &Arc<TextureCache> {
        &self.textures
    }

    /// Change the target geometry. Cached overlays are dropped.
    pub fn set_target(&mut self, width: u32, height: u32, space: ColorSpace) -> SsbResult<()> {
        self.target = check_target(width, height)?;
        self.space = space;
        self.overlays.clear();
        Ok(())
    }

    /// Draw every event active at `time_ms` onto `frame`.
    ///
    /// Returns `true` when at least one overlay touched the frame. Only an invalid frame buffer
    /// is an error; events that fail to render are logged and skipped.
    #[tracing::instrument(level = "debug", skip(self, frame))]
    pub fn render(&mut self, frame: &mut [u8], stride: usize, time_ms: TimeMs) -> SsbResult<bool> {
        let mut dst = RasterMut::new(frame, self.target.width, self.target.height, stride, self.space)?;
        let Self {
            doc,
            target,
            formulas,
            textures,
            overlays,
            rasterizer,
            fonts,
            ..
        } = self;
        let layout = LayoutContext {
            script_frame: doc.frame,
            target: *target,
            fonts: fonts.as_deref(),
            formulas,
        };

        let mut drawn = false;
        for (idx, event) in doc.events.iter().enumerate() {
            if !event.is_active(time_ms) {
                continue;
            }
            let timing = EventTiming::new(event.start_ms, event.end_ms, time_ms);
            let cached = if event.static_tags { overlays.get(&idx) } else { None };
            let list = match cached {
                Some(list) => list,
                None => {
                    let raster = RasterContext {
                        frame: *target,
                        elapsed_ms: timing.elapsed(),
                        scale: layout.scale(),
                        textures,
                    };
                    match event_overlays(event, timing, &layout, rasterizer.as_mut(), &raster) {
                        Ok(list) => {
                            let list = Arc::new(list);
                            if event.static_tags {
                                overlays.add(idx, Some(list.clone()));
                            }
                            list
                        }
                        Err(err) => {
                            tracing::warn!(event = idx, %err, "event skipped");
                            continue;
                        }
                    }
                }
            };

            for overlay in list.iter() {
                let factor = overlay.fade_factor(timing.elapsed(), timing.duration());
                if factor <= 0.0 {
                    continue;
                }
                let faded;
                let overlay = if factor < 1.0 {
                    faded = overlay.faded(factor);
                    &faded
                } else {
                    overlay
                };
                match overlay.raster() {
                    Ok(src) => drawn |= blend(&src, &mut dst, overlay.x, overlay.y, overlay.blend),
                    Err(err) => tracing::warn!(event = idx, %err, "overlay skipped"),
                }
            }
        }
        Ok(drawn)
    }
}

/// Rasterize every geometry of `event`, applying its stencil operations.
fn event_overlays(
    event: &Event,
    timing: EventTiming,
    layout: &LayoutContext<'_>,
    rasterizer: &mut dyn Rasterizer,
    ctx: &RasterContext<'_>,
) -> SsbResult<Vec<Overlay>> {
    let mut out = Vec::new();
    let mut stencil: Option<Stencil> = None;
    for item in layout_event(event, timing, layout) {
        let Some(mut overlay) = rasterizer.rasterize(&item.state, &item.path, ctx)? else {
            continue;
        };
        match item.state.stencil {
            StencilMode::Off => {}
            StencilMode::Set | StencilMode::Unset => {
                stencil
                    .get_or_insert_with(|| Stencil::new(ctx.frame))
                    .write(&overlay, item.state.stencil == StencilMode::Set);
                continue;
            }
            StencilMode::Inside | StencilMode::Outside => {
                let inside = item.state.stencil == StencilMode::Inside;
                match &stencil {
                    Some(mask) => mask.apply(&mut overlay, inside),
                    None if inside => continue,
                    None => {}
                }
            }
        }
        out.push(overlay);
    }
    Ok(out)
}

/// Frame-size coverage mask written by `set`/`unset` geometry.
struct Stencil {
    size: FrameSize,
    mask: Vec<u8>,
}

impl Stencil {
    fn new(size: FrameSize) -> Self {
        Self {
            size,
            mask: vec![0; size.width as usize * size.height as usize],
        }
    }

    /// Frame-space pixels covered by `overlay`: `(mask index, overlay pixel index)`.
    fn covered<'a>(&self, overlay: &'a Overlay) -> impl Iterator<Item = (usize, usize)> + 'a {
        let (fw, fh) = (i64::from(self.size.width), i64::from(self.size.height));
        let (ow, oh) = (i64::from(overlay.width), i64::from(overlay.height));
        let (ox, oy) = (i64::from(overlay.x), i64::from(overlay.y));
        (0..oh).flat_map(move |y| {
            (0..ow).filter_map(move |x| {
                let (fx, fy) = (ox + x, oy + y);
                (fx >= 0 && fy >= 0 && fx < fw && fy < fh)
                    .then(|| ((fy * fw + fx) as usize, (y * ow + x) as usize))
            })
        })
    }

    fn write(&mut self, overlay: &Overlay, set: bool) {
        let pixels: Vec<(usize, usize)> = self.covered(overlay).collect();
        for (m, p) in pixels {
            let a = overlay.image[p * 4 + 3];
            let cur = &mut self.mask[m];
            *cur = if set {
                (*cur).max(a)
            } else {
                mul_div255(*cur, 255 - a)
            };
        }
    }

    fn apply(&self, overlay: &mut Overlay, inside: bool) {
        let mut keep = vec![0u8; overlay.width as usize * overlay.height as usize];
        for (m, p) in self.covered(overlay) {
            keep[p] = self.mask[m];
        }
        for (px, &k) in overlay.image.chunks_exact_mut(4).zip(&keep) {
            let k = if inside { k } else { 255 - k };
            for c in px {
                *c = mul_div255(*c, k);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
