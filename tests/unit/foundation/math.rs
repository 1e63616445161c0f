use super::*;

fn div255_exact(x: u32) -> u32 {
    x / 255
}

#[test]
fn div255_matches_integer_division_over_full_range() {
    for x in 0..=(255u32 * 255) {
        assert_eq!(div255(x), div255_exact(x), "x={x}");
    }
}

#[test]
fn mul_div255_endpoints() {
    assert_eq!(mul_div255(255, 255), 255);
    assert_eq!(mul_div255(0, 255), 0);
    assert_eq!(mul_div255(128, 255), 128);
    assert_eq!(mul_div255(255, 1), 1);
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(2.0), 255);
    assert_eq!(unit_to_u8(0.5), 128);
}
