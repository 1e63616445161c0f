use super::*;

#[test]
fn kernels_sum_to_one() {
    for strength in [0.25f64, 0.5, 1.0, 1.5, 2.0, 3.7, 8.0, 25.0] {
        let k = gauss_kernel(strength);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() <= 1e-5, "strength {strength}: sum {sum}");
        assert_eq!(k.len(), 2 * strength.ceil() as usize + 1);
    }
}

#[test]
fn kernel_is_symmetric_with_tapered_edges() {
    let whole = gauss_kernel(2.0);
    let frac = gauss_kernel(1.5);
    assert_eq!(whole.len(), frac.len());
    assert!((frac[0] - frac[4]).abs() < 1e-7);
    assert!(frac[0] / frac[2] < whole[0] / whole[2]);
    assert_eq!(gauss_kernel(0.0), vec![1.0]);
    assert_eq!(gauss_kernel(-3.0), vec![1.0]);
}

#[test]
fn zero_strength_is_noop() {
    let mut buf = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let before = buf.clone();
    blur(&mut buf, 2, 1, 8, 4, 0.0, 0.0).unwrap();
    assert_eq!(buf, before);
}

#[test]
fn constant_image_is_unchanged() {
    let (w, h) = (6usize, 5usize);
    let mut buf = [10u8, 20, 30, 40].repeat(w * h);
    let before = buf.clone();
    blur(&mut buf, w, h, w * 4, 4, 3.0, 1.5).unwrap();
    assert_eq!(buf, before);
}

#[test]
fn single_pixel_spreads_and_conserves_energy() {
    let (w, h) = (9usize, 9usize);
    let mut buf = vec![0u8; w * h];
    buf[4 * w + 4] = 255;
    blur(&mut buf, w, h, w, 1, 1.0, 1.0).unwrap();

    let nonzero = buf.iter().filter(|&&v| v != 0).count();
    assert!(nonzero > 1);
    let sum: i32 = buf.iter().map(|&v| i32::from(v)).sum();
    assert!((sum - 255).abs() <= 12, "sum {sum}");
    // Symmetric spread.
    assert_eq!(buf[4 * w + 3], buf[4 * w + 5]);
    assert_eq!(buf[3 * w + 4], buf[5 * w + 4]);
}

#[test]
fn horizontal_only_keeps_rows_independent() {
    let (w, h) = (5usize, 3usize);
    let mut buf = vec![0u8; w * h * 3];
    let mid = (w + 2) * 3;
    buf[mid..mid + 3].copy_from_slice(&[255, 255, 255]);
    blur(&mut buf, w, h, w * 3, 3, 1.0, 0.0).unwrap();
    assert!(buf[..w * 3].iter().all(|&v| v == 0));
    assert!(buf[2 * w * 3..].iter().all(|&v| v == 0));
    assert!(buf[(w + 1) * 3] > 0);
}

#[test]
fn stride_padding_is_preserved() {
    let (w, h, stride) = (2usize, 2usize, 5usize);
    let mut buf = vec![0u8, 200, 0, 0, 99, 200, 0, 0, 0, 99];
    blur(&mut buf, w, h, stride, 1, 1.0, 1.0).unwrap();
    assert_eq!(buf[2..5], [0, 0, 99]);
    assert_eq!(buf[9], 99);
}

#[test]
fn invalid_layouts_are_rejected() {
    let mut buf = vec![0u8; 16];
    assert!(blur(&mut buf, 2, 2, 8, 2, 1.0, 1.0).is_err());
    assert!(blur(&mut buf, 4, 2, 8, 4, 1.0, 1.0).is_err());
    assert!(blur(&mut buf, 2, 2, 4, 4, 1.0, 1.0).is_err());
}
