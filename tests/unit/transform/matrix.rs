use super::*;
use std::f64::consts::{FRAC_PI_2, PI};

fn assert_close(a: &[f64], b: &[f64], eps: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() <= eps, "{a:?} != {b:?}");
    }
}

#[test]
fn scale_then_rotate_z_pi_maps_unit_x() {
    let mut v = [1.0, 0.0, 0.0];
    Matrix4x4d::identity()
        .scale(3.0, 1.0, 1.0, MatrixOrder::Prepend)
        .rotate_z(PI, MatrixOrder::Prepend)
        .transform3d(&mut v);
    assert_close(&v, &[-3.0, 0.0, 0.0], 1e-9);
}

#[test]
fn prepend_and_append_differ_for_non_commuting_transforms() {
    let mut a = Matrix4x4d::identity();
    a.translate(10.0, 0.0, 0.0, MatrixOrder::Prepend)
        .scale(2.0, 2.0, 1.0, MatrixOrder::Prepend);
    let mut v = [1.0, 1.0];
    a.transform2d(&mut v);
    assert_close(&v, &[12.0, 2.0], 1e-12);

    let mut b = Matrix4x4d::identity();
    b.translate(10.0, 0.0, 0.0, MatrixOrder::Append)
        .scale(2.0, 2.0, 1.0, MatrixOrder::Append);
    let mut v = [1.0, 1.0];
    b.transform2d(&mut v);
    assert_close(&v, &[22.0, 2.0], 1e-12);
}

#[test]
fn rotate_x_and_y_quarter_turns() {
    let mut v = [0.0, 1.0, 0.0];
    Matrix4x4d::identity()
        .rotate_x(FRAC_PI_2, MatrixOrder::Prepend)
        .transform3d(&mut v);
    assert_close(&v, &[0.0, 0.0, 1.0], 1e-12);

    let mut v = [0.0, 0.0, 1.0];
    Matrix4x4d::identity()
        .rotate_y(FRAC_PI_2, MatrixOrder::Prepend)
        .transform3d(&mut v);
    assert_close(&v, &[1.0, 0.0, 0.0], 1e-12);
}

#[test]
fn transform4d_uses_projective_row() {
    let mut m = Matrix4x4d::from_array([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.5, 1.0,
    ]);
    let mut v = [1.0, 2.0, 2.0, 1.0];
    m.transform4d(&mut v);
    assert_close(&v, &[1.0, 2.0, 2.0, 2.0], 1e-12);

    // transform3d ignores the projective row.
    let mut v3 = [1.0, 2.0, 2.0];
    m.transform3d(&mut v3);
    assert_close(&v3, &[1.0, 2.0, 2.0], 1e-12);
    assert!(m.invert());
}

#[test]
fn invert_round_trips_composed_transforms() {
    let mut m = Matrix4x4d::identity();
    m.translate(5.0, -3.0, 2.0, MatrixOrder::Prepend)
        .rotate_z(0.7, MatrixOrder::Prepend)
        .scale(2.0, 0.5, 4.0, MatrixOrder::Prepend)
        .rotate_x(0.3, MatrixOrder::Prepend);
    let mut inv = m;
    assert!(inv.invert());

    let mut prod = m;
    prod.multiply(&inv, MatrixOrder::Prepend);
    assert_close(prod.as_array(), Matrix4x4d::identity().as_array(), 1e-12);
}

#[test]
fn singular_matrix_is_left_unchanged() {
    let mut m = Matrix4x4d::identity();
    m.scale(1.0, 0.0, 1.0, MatrixOrder::Prepend);
    let before = m;
    assert!(!m.invert());
    assert_eq!(m, before);
}

#[test]
fn shear_and_identity_reset() {
    let mut m = Matrix4x4d::identity();
    m.shear(0.5, 0.0, MatrixOrder::Prepend);
    let mut v = [0.0, 2.0];
    m.transform2d(&mut v);
    assert_close(&v, &[1.0, 2.0], 1e-12);
    assert!(!m.is_identity());
    m.set_identity();
    assert!(m.is_identity());
}
