//! Host-facing entry points for embedders that cannot handle `Result`.
//!
//! Every function reports failure through a caller-owned message buffer and a `bool`/`Option`
//! return. The buffer is cleared on entry and holds the error text after a failure.

use crate::foundation::core::{ColorSpace, TimeMs};
use crate::foundation::error::SsbResult;
use crate::render::pipeline::{Renderer, RendererOpts};
use crate::script::parser::ParseLevel;
use std::path::Path;

fn opts(warnings: bool) -> RendererOpts {
    RendererOpts::default().with_level(ParseLevel::from_warnings(warnings))
}

fn report<T>(result: SsbResult<T>, error: &mut String) -> Option<T> {
    error.clear();
    match result {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::debug!(%err, "host call failed");
            *error = err.to_string();
            None
        }
    }
}

/// Load a script file and bind it to a `width`x`height` target in `colorspace`
/// (`"rgb"`, `"rgbx"` or `"rgba"`). `warnings` enables semantic checks while parsing.
pub fn create_renderer_from_file(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    colorspace: &str,
    warnings: bool,
    error: &mut String,
) -> Option<Renderer> {
    let result = colorspace
        .parse::<ColorSpace>()
        .and_then(|space| Renderer::from_path(path, width, height, space, opts(warnings)));
    report(result, error)
}

/// Like [`create_renderer_from_file`] for a script held in memory.
pub fn create_renderer_from_memory(
    script: &str,
    width: u32,
    height: u32,
    colorspace: &str,
    warnings: bool,
    error: &mut String,
) -> Option<Renderer> {
    let result = colorspace
        .parse::<ColorSpace>()
        .and_then(|space| Renderer::from_script(script, width, height, space, opts(warnings)));
    report(result, error)
}

/// Change the target geometry of `renderer`. On failure the previous target is kept.
pub fn set_target(
    renderer: &mut Renderer,
    width: u32,
    height: u32,
    colorspace: &str,
    error: &mut String,
) -> bool {
    let result = colorspace
        .parse::<ColorSpace>()
        .and_then(|space| renderer.set_target(width, height, space));
    report(result, error).is_some()
}

/// Draw the events active at `time_ms` onto `frame`.
///
/// Returns `false` with an empty `error` when nothing was drawn, and `false` with a message when
/// the frame buffer does not match the target.
pub fn render(
    renderer: &mut Renderer,
    frame: &mut [u8],
    stride: usize,
    time_ms: TimeMs,
    error: &mut String,
) -> bool {
    report(renderer.render(frame, stride, time_ms), error).unwrap_or(false)
}

#[cfg(test)]
#[path = "../tests/unit/host.rs"]
mod tests;
