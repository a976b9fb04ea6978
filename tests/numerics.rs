use fpsmc::utils::add_protect2;

fn approx_eq(a: f64, b: f64, eps: f64) {
    assert!(
        (a - b).abs() <= eps,
        "expected {a} ~= {b} within eps={eps}, got diff={}",
        (a - b).abs()
    );
}

#[test]
fn matches_direct_sum_for_moderate_values() {
    for (a, b) in [(0.0f64, 0.0f64), (-1.0, -2.0), (3.5, -0.5), (-10.0, -10.0)] {
        let direct = (a.exp() + b.exp()).ln();
        approx_eq(add_protect2(a, b), direct, 1e-12);
    }
}

#[test]
fn protects_against_underflow() {
    // exp(-1000) underflows to 0; the guarded sum must still be ~= -1.
    let v = add_protect2(-1000.0, -1.0);
    approx_eq(v, -1.0, 1e-12);
    assert!(v.is_finite());

    let v = add_protect2(-745.0, -746.0);
    assert!(v.is_finite());
    approx_eq(v, -745.0 + (1.0 + (-1.0f64).exp()).ln(), 1e-12);
}

#[test]
fn is_symmetric() {
    for (a, b) in [(-1000.0, -1.0), (0.3, -7.2), (-3.0, -3.0), (12.0, -40.0)] {
        assert_eq!(add_protect2(a, b), add_protect2(b, a));
    }
}

#[test]
fn handles_negative_infinity() {
    approx_eq(add_protect2(f64::NEG_INFINITY, -2.0), -2.0, 1e-12);
    approx_eq(add_protect2(-2.0, f64::NEG_INFINITY), -2.0, 1e-12);
    assert_eq!(
        add_protect2(f64::NEG_INFINITY, f64::NEG_INFINITY),
        f64::NEG_INFINITY
    );
}
