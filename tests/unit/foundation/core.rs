use super::*;

#[test]
fn colorspace_layouts() {
    assert_eq!(ColorSpace::Rgb.bytes_per_pixel(), 3);
    assert_eq!(ColorSpace::Rgbx.bytes_per_pixel(), 4);
    assert!(!ColorSpace::Rgbx.has_alpha());
    assert!(ColorSpace::Rgba.has_alpha());
}

#[test]
fn colorspace_from_str_is_case_insensitive() {
    assert_eq!("RGBA".parse::<ColorSpace>().unwrap(), ColorSpace::Rgba);
    assert_eq!("rgbx".parse::<ColorSpace>().unwrap(), ColorSpace::Rgbx);
    assert!("bgr".parse::<ColorSpace>().is_err());
}

#[test]
fn premul_conversion_scales_channels() {
    assert_eq!(Rgba::WHITE.to_premul_rgba8(), [255, 255, 255, 255]);
    assert_eq!(Rgba::new(1.0, 0.0, 0.0, 0.0).to_premul_rgba8(), [0, 0, 0, 0]);
    assert_eq!(
        Rgba::new(1.0, 1.0, 1.0, 0.5).to_premul_rgba8(),
        [128, 128, 128, 128]
    );
}

#[test]
fn color_lerp_endpoints() {
    let a = Rgba::BLACK;
    let b = Rgba::WHITE.with_alpha(0.0);
    assert_eq!(a.lerp(b, 0.0), a);
    assert_eq!(a.lerp(b, 1.0), b);
}
