use super::*;
use crate::effects::blend::BlendOp;
use crate::foundation::core::{FrameSize, TimeMs};
use crate::render::texture::{Texture, TextureCache};
use crate::script::tags::{TextureWrap, Tag};
use crate::render::state::{EventTiming, TextureRef};

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PathSegment> {
    vec![
        PathSegment::move_to(x0, y0),
        PathSegment::line_to(x1, y0),
        PathSegment::line_to(x1, y1),
        PathSegment::line_to(x0, y1),
        PathSegment::close(),
    ]
}

fn raster(state: &RenderState, path: &[PathSegment], elapsed_ms: TimeMs, textures: &TextureCache) -> Option<Overlay> {
    let ctx = RasterContext {
        frame: FrameSize::new(32, 32),
        elapsed_ms,
        scale: (1.0, 1.0),
        textures,
    };
    CpuRasterizer::default().rasterize(state, path, &ctx).unwrap()
}

fn pixel(o: &Overlay, x: i32, y: i32) -> [u8; 4] {
    let i = ((y - o.y) as usize * o.width as usize + (x - o.x) as usize) * 4;
    [o.image[i], o.image[i + 1], o.image[i + 2], o.image[i + 3]]
}

fn textures() -> TextureCache {
    TextureCache::new(None, 4)
}

fn with(tags: &[Tag]) -> RenderState {
    let mut s = RenderState::default();
    for t in tags {
        s.apply(t, EventTiming::new(0, 1000, 0));
    }
    s
}

#[test]
fn fills_aligned_square_with_flat_color() {
    let tex = textures();
    let state = with(&[Tag::Color(smallvec![[1.0, 0.0, 0.0]])]);
    let o = raster(&state, &square(4.0, 4.0, 12.0, 12.0), 0, &tex).unwrap();
    assert!(o.x <= 4 && o.y <= 4);
    assert_eq!(pixel(&o, 8, 8), [255, 0, 0, 255]);
    assert_eq!(pixel(&o, 4, 4), [255, 0, 0, 255]);
    assert_eq!(pixel(&o, 3, 8), [0, 0, 0, 0]);
    assert_eq!(pixel(&o, 12, 8), [0, 0, 0, 0]);
    assert_eq!(o.blend, BlendOp::Over);
}

#[test]
fn offscreen_and_empty_paths_produce_nothing() {
    let tex = textures();
    let state = RenderState::default();
    assert!(raster(&state, &square(40.0, 40.0, 50.0, 50.0), 0, &tex).is_none());
    assert!(raster(&state, &[], 0, &tex).is_none());
}

#[test]
fn aliased_coverage_is_binary() {
    let tex = textures();
    let state = with(&[Tag::AntiAliasing(false)]);
    let o = raster(&state, &square(4.3, 4.3, 12.6, 12.6), 0, &tex).unwrap();
    assert!(o.image.chunks_exact(4).all(|p| p[3] == 0 || p[3] == 255));
    let state = RenderState::default();
    let o = raster(&state, &square(4.3, 4.3, 12.6, 12.6), 0, &tex).unwrap();
    assert!(o.image.chunks_exact(4).any(|p| p[3] != 0 && p[3] != 255));
}

#[test]
fn wire_mode_strokes_with_line_color() {
    let tex = textures();
    let state = with(&[Tag::Mode(FillMode::Wire), Tag::LineWidth(2.0)]);
    let o = raster(&state, &square(4.0, 4.0, 20.0, 20.0), 0, &tex).unwrap();
    assert_eq!(pixel(&o, 12, 12), [0, 0, 0, 0]);
    assert_eq!(pixel(&o, 12, 4), [0, 0, 0, 255]);
}

#[test]
fn boxed_mode_fills_extents() {
    let tex = textures();
    let state = with(&[Tag::Mode(FillMode::Boxed)]);
    let triangle = vec![
        PathSegment::move_to(4.0, 4.0),
        PathSegment::line_to(12.0, 4.0),
        PathSegment::line_to(4.0, 12.0),
        PathSegment::close(),
    ];
    let o = raster(&state, &triangle, 0, &tex).unwrap();
    assert_eq!(pixel(&o, 11, 11), [255, 255, 255, 255]);
}

#[test]
fn four_colors_form_a_gradient() {
    let tex = textures();
    let state = with(&[Tag::Color(smallvec![
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 1.0, 1.0]
    ])]);
    let o = raster(&state, &square(0.0, 0.0, 20.0, 20.0), 0, &tex).unwrap();
    let tl = pixel(&o, 0, 0);
    let br = pixel(&o, 19, 19);
    assert!(tl[0] > 200 && tl[1] < 30 && tl[2] < 30, "{tl:?}");
    assert!(br[2] > 200 && br[0] < 30, "{br:?}");
}

#[test]
fn karaoke_modes_highlight() {
    let tex = textures();
    let path = square(0.0, 0.0, 20.0, 10.0);
    let solid = with(&[Tag::KaraokeMode(KaraokeMode::Solid), Tag::Karaoke(500), Tag::Karaoke(100)]);
    assert_eq!(pixel(&raster(&solid, &path, 400, &tex).unwrap(), 5, 5), [255, 255, 255, 255]);
    assert_eq!(pixel(&raster(&solid, &path, 500, &tex).unwrap(), 5, 5), [255, 0, 0, 255]);

    let fill = with(&[Tag::Karaoke(0), Tag::Karaoke(1000)]);
    let o = raster(&fill, &path, 500, &tex).unwrap();
    assert_eq!(pixel(&o, 2, 5), [255, 0, 0, 255]);
    assert_eq!(pixel(&o, 17, 5), [255, 255, 255, 255]);

    let glow = with(&[Tag::KaraokeMode(KaraokeMode::Glow), Tag::Karaoke(0), Tag::Karaoke(1000)]);
    let p = pixel(&raster(&glow, &path, 500, &tex).unwrap(), 5, 5);
    assert_eq!(p[0], 255);
    assert!((120..=135).contains(&p[1]), "{p:?}");
}

#[test]
fn blur_spreads_beyond_the_shape() {
    let tex = textures();
    let state = with(&[Tag::Blur { h: 2.0, v: 2.0 }]);
    let o = raster(&state, &square(10.0, 10.0, 20.0, 20.0), 0, &tex).unwrap();
    assert!(o.x <= 7);
    assert!(pixel(&o, 9, 15)[3] > 0);
    assert!(pixel(&o, 15, 15)[3] > 200);
}

#[test]
fn textures_replace_flat_color() {
    let tex = textures();
    tex.insert(
        "checker",
        Texture {
            width: 2,
            height: 1,
            rgba8_premul: vec![255, 0, 0, 255, 0, 0, 255, 255],
        },
    );
    let mut state = RenderState::default();
    state.texture = Some(TextureRef {
        file: "checker".to_owned(),
        x: 0.0,
        y: 0.0,
        wrap: TextureWrap::Repeat,
    });
    let o = raster(&state, &square(0.0, 0.0, 8.0, 8.0), 0, &tex).unwrap();
    assert_eq!(pixel(&o, 2, 3), [255, 0, 0, 255]);
    assert_eq!(pixel(&o, 3, 3), [0, 0, 255, 255]);
}

#[test]
fn oversized_overlays_are_rejected() {
    let tex = textures();
    let ctx = RasterContext {
        frame: FrameSize::new(32, 32),
        elapsed_ms: 0,
        scale: (1.0, 1.0),
        textures: &tex,
    };
    let mut r = CpuRasterizer::new(CpuRasterizerOpts::default().with_max_overlay_side(8));
    assert!(r.rasterize(&RenderState::default(), &square(0.0, 0.0, 20.0, 20.0), &ctx).is_err());
}
