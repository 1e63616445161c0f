use super::*;

#[test]
fn evaluates_arithmetic_with_bound_variables() {
    let mut f = Formula::compile("x + y * 2 - t").unwrap();
    assert_eq!(f.eval(1.0, 3.0, 0.5).unwrap(), 6.5);
    assert_eq!(f.eval(0.0, 0.0, 0.0).unwrap(), 0.0);
    assert_eq!(f.source(), "x + y * 2 - t");
}

#[test]
fn evaluates_functions_and_constants() {
    let mut f = Formula::compile("sin(_pi / 2) + max(x, 3, 2) + avg(1, 2, 3) + 2^3").unwrap();
    assert!((f.eval(1.0, 0.0, 0.0).unwrap() - 14.0).abs() < 1e-12);

    let mut f = Formula::compile("sqrt(x*x + y*y)").unwrap();
    assert_eq!(f.eval(3.0, 4.0, 0.0).unwrap(), 5.0);

    let mut f = Formula::compile("rint(2.5) + sum(x) + sign(-y) + LOG10(100)").unwrap();
    assert_eq!(f.eval(1.0, 4.0, 0.0).unwrap(), 4.0);
}

#[test]
fn comparisons_and_logic_read_as_zero_or_one() {
    let mut f = Formula::compile("x > 2 && y != 0").unwrap();
    assert_eq!(f.eval(3.0, 1.0, 0.0).unwrap(), 1.0);
    assert_eq!(f.eval(3.0, 0.0, 0.0).unwrap(), 0.0);
    assert_eq!(f.eval(1.0, 1.0, 0.0).unwrap(), 0.0);
}

#[test]
fn conditionals_pick_one_branch() {
    let mut f = Formula::compile("t < 0.5 ? x : x + 10 * (t - 0.5)").unwrap();
    assert_eq!(f.eval(2.0, 0.0, 0.25).unwrap(), 2.0);
    assert_eq!(f.eval(2.0, 0.0, 1.0).unwrap(), 7.0);

    // The untaken branch is not evaluated, so its division by zero is harmless.
    let mut f = Formula::compile("x == 0 ? 0 : 1 / x").unwrap();
    assert_eq!(f.eval(0.0, 0.0, 0.0).unwrap(), 0.0);
    assert_eq!(f.eval(4.0, 0.0, 0.0).unwrap(), 0.25);
}

#[test]
fn compile_errors_are_parse_errors() {
    for src in ["x +", "foo(1)", "sin(1, 2)", "z * 2", "x $ y", "min()"] {
        let err = Formula::compile(src).unwrap_err();
        assert!(matches!(err, SsbError::Parse(_)), "{src}: {err}");
    }
    let err = Formula::compile("x + zed").unwrap_err();
    assert!(err.to_string().contains("byte 4"), "{err}");
}

#[test]
fn non_finite_results_are_errors() {
    let mut f = Formula::compile("1 / x").unwrap();
    assert!(matches!(f.eval(0.0, 0.0, 0.0), Err(SsbError::Degenerate(_))));
    assert_eq!(f.eval(4.0, 0.0, 0.0).unwrap(), 0.25);
}
