// log(exp(a) + exp(b)) without intermediate underflow.
pub fn add_protect2(a: f64, b: f64) -> f64 {
    let max = if a > b { a } else { b };
    if !max.is_finite() {
        return max;
    }
    ((a - max).exp() + (b - max).exp()).ln() + max
}
