/// Exact `x / 255` for `x` in `0..=255 * 255` using the `* 257 >> 16` reciprocal.
#[inline(always)]
pub(crate) fn div255(x: u32) -> u32 {
    ((x + 1) * 257) >> 16
}

/// `x * y / 255`, truncated, for 8-bit operands.
#[inline(always)]
pub(crate) fn mul_div255(x: u8, y: u8) -> u8 {
    div255(u32::from(x) * u32::from(y)) as u8
}

/// Rounded `x * y / 255`, used where values are converted from straight to premultiplied alpha.
pub(crate) fn mul_div255_round(x: u8, y: u8) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

/// Convert a unit-interval float into an 8-bit channel.
pub(crate) fn unit_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
