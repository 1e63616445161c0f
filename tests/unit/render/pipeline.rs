use super::*;
use crate::render::state::RenderState;
use crate::transform::path::PathSegment;
use std::sync::atomic::{AtomicUsize, Ordering};

const SCRIPT: &str = "#FRAME
Width: 20
Height: 20

#EVENTS
0.000-1.000|||{geometry=path;alignment=7;color=FF0000}m 0 0 l 10 0 10 10 0 10
";

fn renderer(script: &str) -> Renderer {
    Renderer::from_script(script, 20, 20, ColorSpace::Rgba, RendererOpts::default()).unwrap()
}

fn px(frame: &[u8], x: usize, y: usize) -> [u8; 4] {
    let i = (y * 20 + x) * 4;
    [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
}

#[test]
fn renders_active_events_only() {
    let mut r = renderer(SCRIPT);
    let mut frame = vec![0u8; 20 * 20 * 4];
    assert!(r.render(&mut frame, 80, 500).unwrap());
    assert_eq!(px(&frame, 5, 5), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 15, 15), [0, 0, 0, 0]);

    let mut frame = vec![0u8; 20 * 20 * 4];
    assert!(!r.render(&mut frame, 80, 1000).unwrap());
    assert!(frame.iter().all(|&b| b == 0));
}

#[test]
fn invalid_frames_are_rejected() {
    let mut r = renderer(SCRIPT);
    let mut short = vec![0u8; 10];
    assert!(r.render(&mut short, 80, 0).is_err());
    let mut frame = vec![0u8; 20 * 20 * 4];
    assert!(r.render(&mut frame, 40, 0).is_err());
}

#[test]
fn fade_scales_the_overlay() {
    let script = SCRIPT.replace("color=FF0000", "color=FF0000;fade=1000,0");
    let mut r = renderer(&script);
    let mut frame = vec![0u8; 20 * 20 * 4];
    r.render(&mut frame, 80, 500).unwrap();
    assert_eq!(px(&frame, 5, 5), [128, 0, 0, 128]);
}

#[test]
fn targets_can_change() {
    let mut r = renderer(SCRIPT);
    r.set_target(40, 40, ColorSpace::Rgb).unwrap();
    assert_eq!(r.target(), (FrameSize::new(40, 40), ColorSpace::Rgb));
    let mut frame = vec![0u8; 40 * 40 * 3];
    assert!(r.render(&mut frame, 120, 0).unwrap());
    // The script frame is scaled to the target.
    let i = (15 * 40 + 15) * 3;
    assert_eq!(&frame[i..i + 3], &[255, 0, 0]);
    assert!(r.set_target(0, 10, ColorSpace::Rgb).is_err());
}

#[test]
fn construction_errors_surface() {
    let opts = RendererOpts::default().with_level(ParseLevel::All);
    let err = Renderer::from_script("#EVENTS\n0.000-1.000|Nope||x", 10, 10, ColorSpace::Rgba, opts).unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(Renderer::from_script("", 0, 10, ColorSpace::Rgba, RendererOpts::default()).is_err());
    assert!(
        Renderer::from_path("/nonexistent/dir/script.ssb", 10, 10, ColorSpace::Rgba, RendererOpts::default())
            .is_err()
    );
}

struct Counting {
    inner: CpuRasterizer,
    calls: Arc<AtomicUsize>,
}

impl Rasterizer for Counting {
    fn rasterize(&mut self, state: &RenderState, path: &[PathSegment], ctx: &RasterContext<'_>) -> SsbResult<Option<Overlay>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rasterize(state, path, ctx)
    }
}

fn counting(script: &str, opts: RendererOpts) -> (Renderer, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let r = Renderer::from_script(script, 20, 20, ColorSpace::Rgba, opts)
        .unwrap()
        .with_rasterizer(Counting {
            inner: CpuRasterizer::default(),
            calls: calls.clone(),
        });
    (r, calls)
}

#[test]
fn static_events_are_cached() {
    let (mut r, calls) = counting(SCRIPT, RendererOpts::default().with_overlay_cache_capacity(4));
    let mut frame = vec![0u8; 20 * 20 * 4];
    r.render(&mut frame, 80, 0).unwrap();
    r.render(&mut frame, 80, 10).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    r.set_target(20, 20, ColorSpace::Rgba).unwrap();
    r.render(&mut frame, 80, 10).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let (mut r, calls) = counting(SCRIPT, RendererOpts::default().with_overlay_cache_capacity(0));
    r.render(&mut frame, 80, 0).unwrap();
    r.render(&mut frame, 80, 10).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn time_dependent_events_are_not_cached() {
    let script = SCRIPT.replace("color=FF0000", "color=FF0000;karaoke=100");
    let (mut r, calls) = counting(&script, RendererOpts::default());
    let mut frame = vec![0u8; 20 * 20 * 4];
    r.render(&mut frame, 80, 0).unwrap();
    r.render(&mut frame, 80, 10).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn stencil_masks_later_geometry() {
    let script = "#FRAME
Width: 20
Height: 20

#EVENTS
0.000-1.000|||{geometry=path;alignment=7;stencil=set}m 0 0 l 10 0 10 20 0 20{position=0,0;stencil=inside}m 0 0 l 20 0 20 20 0 20
";
    let mut r = renderer(script);
    let mut frame = vec![0u8; 20 * 20 * 4];
    r.render(&mut frame, 80, 0).unwrap();
    assert_eq!(px(&frame, 5, 5), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 15, 5), [0, 0, 0, 0]);

    let outside = script.replace("stencil=inside", "stencil=outside");
    let mut r = renderer(&outside);
    let mut frame = vec![0u8; 20 * 20 * 4];
    r.render(&mut frame, 80, 0).unwrap();
    assert_eq!(px(&frame, 5, 5), [0, 0, 0, 0]);
    assert_eq!(px(&frame, 15, 5), [255, 255, 255, 255]);
}

#[test]
fn stencil_write_and_apply() {
    let size = FrameSize::new(4, 1);
    let mut s = Stencil::new(size);
    let ov = |x: i32, a: u8| Overlay {
        image: [255, 255, 255, a].repeat(2),
        width: 2,
        height: 1,
        x,
        y: 0,
        blend: crate::effects::blend::BlendOp::Over,
        fade_in_ms: 0,
        fade_out_ms: 0,
    };
    s.write(&ov(-1, 255), true);
    s.write(&ov(3, 255), true);
    assert_eq!(s.mask, vec![255, 0, 0, 255]);
    s.write(&ov(3, 255), false);
    assert_eq!(s.mask, vec![255, 0, 0, 0]);

    let mut o = ov(0, 255);
    s.apply(&mut o, true);
    assert_eq!(o.image, vec![255, 255, 255, 255, 0, 0, 0, 0]);
}
