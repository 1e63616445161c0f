use crate::foundation::error::{SsbError, SsbResult};

/// Script time in milliseconds.
pub type TimeMs = u64;

/// A plane coordinate pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel layout of a caller-owned frame or overlay buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColorSpace {
    /// 3 bytes per pixel, no alpha.
    Rgb,
    /// 4 bytes per pixel, the fourth byte is padding and never written.
    Rgbx,
    /// 4 bytes per pixel, premultiplied alpha.
    Rgba,
}

impl ColorSpace {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgbx | Self::Rgba => 4,
        }
    }

    /// Whether the fourth channel carries alpha.
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }
}

impl std::str::FromStr for ColorSpace {
    type Err = SsbError;

    fn from_str(s: &str) -> SsbResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(Self::Rgb),
            "rgbx" => Ok(Self::Rgbx),
            "rgba" => Ok(Self::Rgba),
            other => Err(SsbError::validation(format!(
                "unsupported colorspace \"{other}\""
            ))),
        }
    }
}

/// Straight-alpha color with unit-interval channels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Rgba {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a color.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with another alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Channel-wise linear interpolation toward `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        use crate::foundation::math::lerp;
        Self {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
            a: lerp(self.a, other.a, t),
        }
    }

    /// Premultiplied 8-bit RGBA.
    pub fn to_premul_rgba8(self) -> [u8; 4] {
        use crate::foundation::math::{mul_div255_round, unit_to_u8};
        let a = unit_to_u8(self.a);
        [
            mul_div255_round(unit_to_u8(self.r), a),
            mul_div255_round(unit_to_u8(self.g), a),
            mul_div255_round(unit_to_u8(self.b), a),
            a,
        ]
    }
}

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels (0 = unset).
    pub width: u32,
    /// Height in pixels (0 = unset).
    pub height: u32,
}

impl FrameSize {
    /// Create a frame size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
