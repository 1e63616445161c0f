use crate::foundation::core::ColorSpace;
use crate::foundation::error::{SsbError, SsbResult};
use crate::foundation::math::div255;

/// Pixel combination rule used when compositing an overlay onto a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendOp {
    /// Replace destination pixels.
    Source,
    /// Premultiplied source-over.
    #[default]
    Over,
    /// Saturating addition.
    Add,
    /// Saturating subtraction.
    Sub,
    /// Multiply.
    Mul,
    /// Screen.
    Screen,
    /// Absolute difference.
    Diff,
}

impl std::str::FromStr for BlendOp {
    type Err = SsbError;

    fn from_str(s: &str) -> SsbResult<Self> {
        Ok(match s {
            "source" => Self::Source,
            "over" => Self::Over,
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "screen" => Self::Screen,
            "diff" => Self::Diff,
            other => return Err(SsbError::parse(format!("invalid blend mode \"{other}\""))),
        })
    }
}

/// Read-only view of a caller-owned pixel buffer.
#[derive(Clone, Copy, Debug)]
pub struct Raster<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    space: ColorSpace,
}

/// Mutable view of a caller-owned pixel buffer.
#[derive(Debug)]
pub struct RasterMut<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    space: ColorSpace,
}

fn check_layout(len: usize, width: u32, height: u32, stride: usize, space: ColorSpace) -> SsbResult<()> {
    let row = (width as usize)
        .checked_mul(space.bytes_per_pixel())
        .ok_or_else(|| SsbError::validation("raster row size overflow"))?;
    if stride < row {
        return Err(SsbError::validation(format!(
            "stride {stride} is smaller than a row of {row} bytes"
        )));
    }
    if height == 0 {
        return Ok(());
    }
    let needed = stride
        .checked_mul(height as usize - 1)
        .and_then(|v| v.checked_add(row))
        .ok_or_else(|| SsbError::validation("raster size overflow"))?;
    if len < needed {
        return Err(SsbError::validation(format!(
            "raster buffer holds {len} bytes, {needed} required"
        )));
    }
    Ok(())
}

impl<'a> Raster<'a> {
    /// Describe `data` as a `width` x `height` raster with rows `stride` bytes apart.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        space: ColorSpace,
    ) -> SsbResult<Self> {
        check_layout(data.len(), width, height, stride, space)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            space,
        })
    }

    /// Tightly packed premultiplied RGBA.
    pub fn rgba(data: &'a [u8], width: u32, height: u32) -> SsbResult<Self> {
        Self::new(data, width, height, width as usize * 4, ColorSpace::Rgba)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl<'a> RasterMut<'a> {
    /// Describe `data` as a writable `width` x `height` raster with rows `stride` bytes apart.
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        space: ColorSpace,
    ) -> SsbResult<Self> {
        check_layout(data.len(), width, height, stride, space)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            space,
        })
    }

    /// Tightly packed premultiplied RGBA.
    pub fn rgba(data: &'a mut [u8], width: u32, height: u32) -> SsbResult<Self> {
        Self::new(data, width, height, width as usize * 4, ColorSpace::Rgba)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Composite `src` onto `dst` with its top-left corner at `(dst_x, dst_y)`.
///
/// Returns `false`, leaving `dst` untouched, when the placed source does not intersect the
/// destination.
pub fn blend(src: &Raster<'_>, dst: &mut RasterMut<'_>, dst_x: i32, dst_y: i32, op: BlendOp) -> bool {
    let x0 = i64::from(dst_x).max(0);
    let y0 = i64::from(dst_y).max(0);
    let x1 = (i64::from(dst_x) + i64::from(src.width)).min(i64::from(dst.width));
    let y1 = (i64::from(dst_y) + i64::from(src.height)).min(i64::from(dst.height));
    if x0 >= x1 || y0 >= y1 {
        return false;
    }

    let clip = Clip {
        src_x: (x0 - i64::from(dst_x)) as usize,
        src_y: (y0 - i64::from(dst_y)) as usize,
        dst_x: x0 as usize,
        dst_y: y0 as usize,
        cols: (x1 - x0) as usize,
        rows: (y1 - y0) as usize,
    };

    match op {
        BlendOp::Source => dispatch::<SourceOp>(src, dst, clip),
        BlendOp::Over => dispatch::<OverOp>(src, dst, clip),
        BlendOp::Add => dispatch::<AddOp>(src, dst, clip),
        BlendOp::Sub => dispatch::<SubOp>(src, dst, clip),
        BlendOp::Mul => dispatch::<MulOp>(src, dst, clip),
        BlendOp::Screen => dispatch::<ScreenOp>(src, dst, clip),
        BlendOp::Diff => dispatch::<DiffOp>(src, dst, clip),
    }
    true
}

#[derive(Clone, Copy, Debug)]
struct Clip {
    src_x: usize,
    src_y: usize,
    dst_x: usize,
    dst_y: usize,
    cols: usize,
    rows: usize,
}

fn dispatch<O: PixelOp>(src: &Raster<'_>, dst: &mut RasterMut<'_>, clip: Clip) {
    match (src.space.has_alpha(), dst.space.has_alpha()) {
        (true, true) => blend_rows::<O, true, true>(src, dst, clip),
        (true, false) => blend_rows::<O, true, false>(src, dst, clip),
        (false, true) => blend_rows::<O, false, true>(src, dst, clip),
        (false, false) => blend_rows::<O, false, false>(src, dst, clip),
    }
}

fn blend_rows<O: PixelOp, const SA: bool, const DA: bool>(
    src: &Raster<'_>,
    dst: &mut RasterMut<'_>,
    clip: Clip,
) {
    let sbpp = src.space.bytes_per_pixel();
    let dbpp = dst.space.bytes_per_pixel();
    for row in 0..clip.rows {
        let s_off = (clip.src_y + row) * src.stride + clip.src_x * sbpp;
        let d_off = (clip.dst_y + row) * dst.stride + clip.dst_x * dbpp;
        let s_row = &src.data[s_off..s_off + clip.cols * sbpp];
        let d_row = &mut dst.data[d_off..d_off + clip.cols * dbpp];
        for (s, d) in s_row.chunks_exact(sbpp).zip(d_row.chunks_exact_mut(dbpp)) {
            O::apply::<SA, DA>(s, d);
        }
    }
}

trait PixelOp {
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]);
}

#[inline(always)]
fn alpha_of<const A: bool>(px: &[u8]) -> u32 {
    if A { u32::from(px[3]) } else { 255 }
}

struct SourceOp;
struct OverOp;
struct AddOp;
struct SubOp;
struct MulOp;
struct ScreenOp;
struct DiffOp;

impl PixelOp for SourceOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        d[..3].copy_from_slice(&s[..3]);
        if DA {
            d[3] = alpha_of::<SA>(s) as u8;
        }
    }
}

impl PixelOp for OverOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        let sa = alpha_of::<SA>(s);
        if sa == 0 {
            return;
        }
        if sa == 255 {
            SourceOp::apply::<SA, DA>(s, d);
            return;
        }
        let inv = 255 - sa;
        for c in 0..3 {
            d[c] = (u32::from(s[c]) + div255(u32::from(d[c]) * inv)).min(255) as u8;
        }
        if DA {
            d[3] = (sa + div255(u32::from(d[3]) * inv)).min(255) as u8;
        }
    }
}

impl PixelOp for AddOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        for c in 0..3 {
            d[c] = d[c].saturating_add(s[c]);
        }
        if SA && DA {
            d[3] = d[3].saturating_add(s[3]);
        }
    }
}

impl PixelOp for SubOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        for c in 0..3 {
            d[c] = d[c].saturating_sub(s[c]);
        }
        if SA && DA {
            d[3] = d[3].saturating_sub(s[3]);
        }
    }
}

/// Shared structure of the separable operators: `f` combines straight (unpremultiplied)
/// destination and source channels.
#[inline(always)]
fn separable<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8], f: impl Fn(u32, u32) -> u32) {
    let sa = alpha_of::<SA>(s);
    let da = alpha_of::<DA>(d);
    let inv = 255 - sa;

    if da == 0 {
        for c in 0..3 {
            d[c] = div255(u32::from(d[c]) * inv) as u8;
        }
        if DA {
            d[3] = sa as u8;
        }
        return;
    }
    if sa == 255 && da == 255 {
        for c in 0..3 {
            d[c] = f(u32::from(d[c]), u32::from(s[c])).min(255) as u8;
        }
        return;
    }
    if sa == 0 {
        return;
    }
    for c in 0..3 {
        let d_un = (u32::from(d[c]) * 255 / da).min(255);
        let s_un = (u32::from(s[c]) * 255 / sa).min(255);
        let mixed = div255(f(d_un, s_un).min(255) * sa);
        d[c] = (mixed + div255(u32::from(d[c]) * inv)).min(255) as u8;
    }
    if DA {
        d[3] = (sa + div255(da * inv)).min(255) as u8;
    }
}

impl PixelOp for MulOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        separable::<SA, DA>(s, d, |a, b| div255(a * b));
    }
}

impl PixelOp for ScreenOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        separable::<SA, DA>(s, d, |a, b| 255 - div255((255 - a) * (255 - b)));
    }
}

impl PixelOp for DiffOp {
    #[inline(always)]
    fn apply<const SA: bool, const DA: bool>(s: &[u8], d: &mut [u8]) {
        separable::<SA, DA>(s, d, |a, b| a.abs_diff(b));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blend.rs"]
mod tests;
