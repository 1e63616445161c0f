//! SSB subtitle rendering.
//!
//! A script is parsed once into a [`Document`] and bound to a target frame by a [`Renderer`].
//! Each call to [`Renderer::render`] folds the tags of every active event into a
//! [`RenderState`], lays out its geometry, rasterizes it into overlays and blends them onto a
//! caller-owned frame buffer.
//!
//! - Load with [`Renderer::from_path`] or [`Renderer::from_script`]
//! - Draw with [`Renderer::render`]
//! - Embedders without `Result` handling use the [`host`] functions
#![forbid(unsafe_code)]

mod effects;
mod expression;
mod foundation;
mod render;
mod script;
mod transform;

/// Entry points reporting errors through a message buffer.
pub mod host;

pub use crate::foundation::cache::BoundedCache;
pub use crate::foundation::core::{ColorSpace, FrameSize, Point, Rgba, TimeMs};
pub use crate::foundation::error::{SsbError, SsbResult};

pub use crate::effects::blend::{BlendOp, Raster, RasterMut, blend};
pub use crate::effects::blur::{blur, gauss_kernel};
pub use crate::expression::Formula;
pub use crate::transform::matrix::{Matrix4x4d, MatrixOrder};
pub use crate::transform::path::{
    PathSegment, SegmentKind, path_by_arc, path_close, path_extents, path_flatten, path_to_path,
    points_to_path,
};

pub use crate::script::model::{Document, Event, Geometry, Meta, Object};
pub use crate::script::parser::{MAX_INLINE_STYLES, ParseLevel, ScriptParser};
pub use crate::script::tags::{
    Animation, Direction, FillMode, FontStyle, GeometryMode, KaraokeMode, LineCap, LineJoin,
    Rgb, RotateAxis, StencilMode, Tag, TextureWrap, parse_tag, parse_tag_block,
};
pub use crate::script::time::{format_time, parse_time};

pub use crate::render::backend::{FontMetrics, FontProvider, Overlay, RasterContext, Rasterizer};
pub use crate::render::cpu::{CpuRasterizer, CpuRasterizerOpts};
pub use crate::render::deform::{DEFAULT_FORMULA_CACHE_CAPACITY, FormulaCache, path_deform};
pub use crate::render::layout::{LayoutContext, LayoutItem, layout_event};
pub use crate::render::pipeline::{OVERLAY_CACHE_CAPACITY_ENV, Renderer, RendererOpts};
pub use crate::render::state::{
    EventTiming, FontDesc, KaraokeState, LineStyle, RenderState, TextureRef,
};
pub use crate::render::texture::{DEFAULT_TEXTURE_CACHE_CAPACITY, Texture, TextureCache};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
