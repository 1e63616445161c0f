use crate::foundation::error::{SsbError, SsbResult};
use rayon::prelude::*;

/// Normalized 1-D Gaussian kernel for a (possibly fractional) blur `strength`.
///
/// The kernel has `2 * ceil(strength) + 1` taps; a fractional strength tapers the two edge taps.
/// Non-positive strengths yield the identity kernel `[1.0]`.
pub fn gauss_kernel(strength: f64) -> Vec<f32> {
    if !strength.is_finite() || strength <= 0.0 {
        return vec![1.0];
    }
    let radius = strength.ceil() as usize;
    let sigma = (2.0 * strength + 1.0) / 3.0;
    let norm = 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
    let denom = 2.0 * sigma * sigma;

    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            norm * (-x * x / denom).exp()
        })
        .collect();
    let taper = 1.0 - (radius as f64 - strength);
    weights[0] *= taper;
    weights[2 * radius] *= taper;

    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Separable Gaussian blur of an interleaved 8-bit buffer, in place.
///
/// `channels` must be 1, 3 or 4. A horizontal pass over every row completes before the vertical
/// pass starts; both are split into contiguous row bands run on the rayon pool.
#[tracing::instrument(level = "trace", skip(buffer))]
pub fn blur(
    buffer: &mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
    strength_h: f64,
    strength_v: f64,
) -> SsbResult<()> {
    if !matches!(channels, 1 | 3 | 4) {
        return Err(SsbError::validation(format!(
            "blur expects 1, 3 or 4 channels, got {channels}"
        )));
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or_else(|| SsbError::validation("blur row size overflow"))?;
    if stride < row_len {
        return Err(SsbError::validation("blur stride is smaller than a row"));
    }
    if height > 0 && buffer.len() < stride * (height - 1) + row_len {
        return Err(SsbError::validation("blur buffer is shorter than its layout"));
    }
    let do_h = strength_h > 0.0;
    let do_v = strength_v > 0.0;
    if (!do_h && !do_v) || width == 0 || height == 0 {
        return Ok(());
    }

    let kernel_h = if do_h { gauss_kernel(strength_h) } else { Vec::new() };
    let kernel_v = match (do_v, do_h && strength_v == strength_h) {
        (false, _) => Vec::new(),
        (true, true) => kernel_h.clone(),
        (true, false) => gauss_kernel(strength_v),
    };

    let mut work: Vec<f32> = Vec::with_capacity(row_len * height);
    for row in buffer.chunks(stride).take(height) {
        work.extend(row[..row_len].iter().map(|&v| f32::from(v)));
    }
    let mut scratch = vec![0.0f32; work.len()];
    let band = band_rows(height) * row_len;

    if do_h {
        scratch
            .par_chunks_mut(band)
            .zip(work.par_chunks(band))
            .for_each(|(out, src)| {
                for (o, s) in out.chunks_mut(row_len).zip(src.chunks(row_len)) {
                    convolve_row(s, o, width, channels, &kernel_h);
                }
            });
        std::mem::swap(&mut work, &mut scratch);
    }

    if do_v {
        let src = &work;
        scratch
            .par_chunks_mut(band)
            .enumerate()
            .for_each(|(bi, out)| {
                let first_row = bi * band / row_len;
                for (r, o) in out.chunks_mut(row_len).enumerate() {
                    convolve_column(src, o, first_row + r, height, row_len, &kernel_v);
                }
            });
        std::mem::swap(&mut work, &mut scratch);
    }

    for (row, src) in buffer.chunks_mut(stride).zip(work.chunks(row_len)) {
        for (d, &s) in row[..row_len].iter_mut().zip(src) {
            *d = s.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

fn band_rows(height: usize) -> usize {
    let threads = std::thread::available_parallelism().map_or(1, |n| n.get()).max(1);
    height.div_ceil(threads).max(1)
}

fn convolve_row(src: &[f32], out: &mut [f32], width: usize, channels: usize, k: &[f32]) {
    let radius = (k.len() / 2) as isize;
    let last = width as isize - 1;
    for x in 0..width {
        let mut acc = [0.0f32; 4];
        for (ki, &w) in k.iter().enumerate() {
            let sx = (x as isize + ki as isize - radius).clamp(0, last) as usize;
            let px = &src[sx * channels..sx * channels + channels];
            for (a, &v) in acc.iter_mut().zip(px) {
                *a += w * v;
            }
        }
        out[x * channels..x * channels + channels].copy_from_slice(&acc[..channels]);
    }
}

fn convolve_column(src: &[f32], out: &mut [f32], y: usize, height: usize, row_len: usize, k: &[f32]) {
    let radius = (k.len() / 2) as isize;
    let last = height as isize - 1;
    out.fill(0.0);
    for (ki, &w) in k.iter().enumerate() {
        let sy = (y as isize + ki as isize - radius).clamp(0, last) as usize;
        let row = &src[sy * row_len..sy * row_len + row_len];
        for (o, &v) in out.iter_mut().zip(row) {
            *o += w * v;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
