//! Placement of event geometry in frame space.
//!
//! Geometries flow like text inside a block: each one is placed at a pen position that advances
//! by its width, and text line breaks start a new line. Consecutive geometries that share
//! position, alignment, margins and direction form one block. A block is anchored at its
//! explicit position or inside the frame margins according to its numpad alignment. The
//! current matrix is applied around that anchor, then script coordinates are scaled to the
//! target frame.

use crate::foundation::core::{FrameSize, Point};
use crate::render::backend::FontProvider;
use crate::render::deform::{FormulaCache, path_deform};
use crate::render::state::{EventTiming, RenderState};
use crate::script::model::{Event, Geometry, Object};
use crate::script::tags::Direction;
use crate::transform::path::{
    PathSegment, SegmentKind, path_extents, path_flatten, path_to_path, points_to_path,
};

/// Flattening tolerance used before a projective matrix is applied.
const PROJECTIVE_FLATNESS: f64 = 0.1;

/// One geometry resolved to frame space, with the state it is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutItem {
    pub state: RenderState,
    pub path: Vec<PathSegment>,
}

/// Inputs shared by every event laid out for one frame.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    /// Coordinate space of the script; empty means "same as the target".
    pub script_frame: FrameSize,
    pub target: FrameSize,
    pub fonts: Option<&'a dyn FontProvider>,
    pub formulas: &'a FormulaCache,
}

impl LayoutContext<'_> {
    fn script_size(&self) -> (f64, f64) {
        let frame = if self.script_frame.is_empty() {
            self.target
        } else {
            self.script_frame
        };
        (f64::from(frame.width), f64::from(frame.height))
    }

    /// Script-to-target scale factors.
    pub fn scale(&self) -> (f64, f64) {
        let (w, h) = self.script_size();
        if w <= 0.0 || h <= 0.0 {
            return (1.0, 1.0);
        }
        (f64::from(self.target.width) / w, f64::from(self.target.height) / h)
    }
}

/// A geometry in its own coordinates with the box it occupies in the flow.
struct Piece {
    state: RenderState,
    path: Vec<PathSegment>,
    width: f64,
    height: f64,
    line_break: bool,
}

#[derive(PartialEq)]
struct BlockKey {
    position: Option<Point>,
    alignment: u8,
    margins: (f64, f64),
    direction: Direction,
}

impl BlockKey {
    fn of(state: &RenderState) -> Self {
        Self {
            position: state.position,
            alignment: state.alignment,
            margins: (state.margin_h, state.margin_v),
            direction: state.direction,
        }
    }
}

/// Fold `event`'s tags at `timing` and place every geometry it draws.
pub fn layout_event(event: &Event, timing: EventTiming, ctx: &LayoutContext<'_>) -> Vec<LayoutItem> {
    let pieces = collect_pieces(event, timing, ctx);
    let mut out = Vec::with_capacity(pieces.len());
    let mut start = 0;
    while start < pieces.len() {
        let key = BlockKey::of(&pieces[start].state);
        let end = pieces[start..]
            .iter()
            .position(|p| BlockKey::of(&p.state) != key)
            .map_or(pieces.len(), |n| start + n);
        place_block(&pieces[start..end], ctx, &mut out);
        start = end;
    }
    out
}

fn collect_pieces(event: &Event, timing: EventTiming, ctx: &LayoutContext<'_>) -> Vec<Piece> {
    let mut state = RenderState::default();
    let mut pieces = Vec::new();
    for object in &event.objects {
        match object {
            Object::Tag(tag) => state.apply(tag, timing),
            Object::Geometry(Geometry::Points(points)) => {
                let path = points_to_path(points, state.line.width);
                pieces.push(shape_piece(&state, path, ctx));
            }
            Object::Geometry(Geometry::Path(path)) => {
                pieces.push(shape_piece(&state, path_to_path(path), ctx));
            }
            Object::Geometry(Geometry::Text(text)) => {
                let Some(fonts) = ctx.fonts else {
                    tracing::debug!("no font provider, text geometry skipped");
                    continue;
                };
                text_pieces(&state, text, fonts, ctx, &mut pieces);
            }
        }
    }
    pieces
}

fn deformed(state: &RenderState, mut path: Vec<PathSegment>, ctx: &LayoutContext<'_>) -> Vec<PathSegment> {
    if let Some((x, y)) = &state.deform {
        path_deform(&mut path, x, y, state.deform_progress, ctx.formulas);
    }
    path
}

fn shape_piece(state: &RenderState, path: Vec<PathSegment>, ctx: &LayoutContext<'_>) -> Piece {
    let (width, height) = path_extents(&path).map_or((0.0, 0.0), |(_, _, x1, y1)| (x1.max(0.0), y1.max(0.0)));
    Piece {
        state: state.clone(),
        path: deformed(state, path, ctx),
        width,
        height,
        line_break: false,
    }
}

fn text_pieces(
    state: &RenderState,
    text: &str,
    fonts: &dyn FontProvider,
    ctx: &LayoutContext<'_>,
    out: &mut Vec<Piece>,
) {
    let metrics = match fonts.metrics(&state.font) {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(family = %state.font.family, %err, "font metrics unavailable");
            return;
        }
    };
    for (i, line) in text.split('\n').enumerate() {
        let shaped = fonts
            .text_width(&state.font, line)
            .and_then(|w| fonts.text_path(&state.font, line).map(|p| (w, p)));
        match shaped {
            Ok((width, path)) => out.push(Piece {
                state: state.clone(),
                path: deformed(state, path, ctx),
                width,
                height: metrics.height + state.font.space_v,
                line_break: i > 0,
            }),
            Err(err) => tracing::warn!(text = line, %err, "text outline unavailable"),
        }
    }
}

/// Offsets of each piece inside its block, and the block size.
fn flow(pieces: &[Piece], direction: Direction, column: usize) -> (Vec<(f64, f64)>, f64, f64) {
    let mut lines: Vec<std::ops::Range<usize>> = Vec::new();
    let mut begin = 0;
    for (i, p) in pieces.iter().enumerate() {
        if p.line_break && i > begin {
            lines.push(begin..i);
            begin = i;
        }
    }
    lines.push(begin..pieces.len());

    let vertical = direction == Direction::Ttb;
    // (extent along the flow, extent across it) per line.
    let sizes: Vec<(f64, f64)> = lines
        .iter()
        .map(|r| {
            pieces[r.clone()].iter().fold((0.0f64, 0.0f64), |(along, across), p| {
                if vertical {
                    (along + p.height, across.max(p.width))
                } else {
                    (along + p.width + p.state.font.space_h, across.max(p.height))
                }
            })
        })
        .collect();
    let longest = sizes.iter().map(|s| s.0).fold(0.0, f64::max);
    let total_across: f64 = sizes.iter().map(|s| s.1).sum();

    let mut offsets = vec![(0.0, 0.0); pieces.len()];
    let mut across = 0.0;
    for (range, (along_len, across_len)) in lines.iter().zip(&sizes) {
        let slack = longest - along_len;
        let mut pen = match column {
            0 => 0.0,
            1 => slack / 2.0,
            _ => slack,
        };
        let order: Vec<usize> = if direction == Direction::Rtl {
            range.clone().rev().collect()
        } else {
            range.clone().collect()
        };
        for i in order {
            let p = &pieces[i];
            offsets[i] = if vertical {
                let o = (across, pen);
                pen += p.height;
                o
            } else {
                // Bottom-align pieces on the line.
                let o = (pen, across + across_len - p.height);
                pen += p.width + p.state.font.space_h;
                o
            };
        }
        across += across_len;
    }

    if vertical {
        (offsets, total_across, longest)
    } else {
        (offsets, longest, total_across)
    }
}

fn place_block(pieces: &[Piece], ctx: &LayoutContext<'_>, out: &mut Vec<LayoutItem>) {
    let Some(first) = pieces.first() else {
        return;
    };
    let state = &first.state;
    let alignment = state.alignment.clamp(1, 9) - 1;
    let (column, row) = (usize::from(alignment % 3), usize::from(alignment / 3));
    let (offsets, width, height) = flow(pieces, state.direction, column);

    let (frame_w, frame_h) = ctx.script_size();
    let anchor = state.position.unwrap_or_else(|| {
        let x = [state.margin_h, frame_w / 2.0, frame_w - state.margin_h][column];
        let y = [frame_h - state.margin_v, frame_h / 2.0, state.margin_v][row];
        Point::new(x, y)
    });
    let left = anchor.x - [0.0, width / 2.0, width][column];
    let top = anchor.y - [height, height / 2.0, 0.0][row];
    let (sx, sy) = ctx.scale();

    for (piece, (ox, oy)) in pieces.iter().zip(offsets) {
        let mut path = piece.path.clone();
        let m = &piece.state.matrix;
        let projective = m.as_array()[12..] != [0.0, 0.0, 0.0, 1.0];
        if projective {
            path_flatten(&mut path, PROJECTIVE_FLATNESS);
        }
        for seg in path.iter_mut().filter(|s| s.kind != SegmentKind::Close) {
            let mut v = [left + ox + seg.x - anchor.x, top + oy + seg.y - anchor.y, 0.0, 1.0];
            m.transform4d(&mut v);
            if projective && v[3].abs() > f64::EPSILON {
                v[0] /= v[3];
                v[1] /= v[3];
            }
            seg.x = (v[0] + anchor.x) * sx;
            seg.y = (v[1] + anchor.y) * sy;
        }
        if !path.is_empty() {
            out.push(LayoutItem {
                state: piece.state.clone(),
                path,
            });
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
