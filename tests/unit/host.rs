use super::*;

const SCRIPT: &str = "#FRAME
Width: 16
Height: 16

#EVENTS
0.000-1.000|||{geometry=path;alignment=7;color=00FF00}m 0 0 l 8 0 8 8 0 8
";

#[test]
fn memory_scripts_render() {
    let mut error = String::from("stale");
    let mut r = create_renderer_from_memory(SCRIPT, 16, 16, "rgba", false, &mut error).unwrap();
    assert!(error.is_empty());

    let mut frame = vec![0u8; 16 * 16 * 4];
    assert!(render(&mut r, &mut frame, 64, 100, &mut error));
    assert!(error.is_empty());
    assert_eq!(&frame[..4], &[0, 255, 0, 255]);

    let mut frame = vec![0u8; 16 * 16 * 4];
    assert!(!render(&mut r, &mut frame, 64, 5_000, &mut error));
    assert!(error.is_empty());
}

#[test]
fn failures_fill_the_message_buffer() {
    let mut error = String::new();
    assert!(create_renderer_from_memory(SCRIPT, 16, 16, "yuv", false, &mut error).is_none());
    assert!(error.contains("colorspace"));

    assert!(create_renderer_from_file("/nonexistent/script.ssb", 16, 16, "rgb", false, &mut error).is_none());
    assert!(error.contains("cannot open script"));

    let bad = "#EVENTS\n0.000-1.000|Missing||x\n";
    assert!(create_renderer_from_memory(bad, 16, 16, "rgb", false, &mut error).is_some());
    assert!(error.is_empty());
    assert!(create_renderer_from_memory(bad, 16, 16, "rgb", true, &mut error).is_none());
    assert!(error.starts_with("line 2:"));
}

#[test]
fn bad_frames_and_targets_report_errors() {
    let mut error = String::new();
    let mut r = create_renderer_from_memory(SCRIPT, 16, 16, "rgb", false, &mut error).unwrap();

    let mut short = vec![0u8; 8];
    assert!(!render(&mut r, &mut short, 48, 100, &mut error));
    assert!(!error.is_empty());

    assert!(!set_target(&mut r, 0, 16, "rgb", &mut error));
    assert!(!error.is_empty());
    assert!(!set_target(&mut r, 32, 32, "bgr", &mut error));
    assert_eq!(r.target().0.width, 16);

    assert!(set_target(&mut r, 32, 32, "RGBX", &mut error));
    assert!(error.is_empty());
    assert_eq!(r.target().1, ColorSpace::Rgbx);
}
