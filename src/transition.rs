use crate::error::{EngineError, Result};
use crate::grid::TimeGrid;

const DEGENERACY_EPS: f64 = 1e-9;

// The seven probability-family arrays of the fast PSMC recursion, one entry
// per time-interval state. Pure function of (tk, epsize, rho); computed once
// per parameter set and shared read-only by both HMM passes.
//
// Closed forms are interval integrals of the coalescent/recombination
// survival functions over [tk[i], tk[i+1]); the last state integrates to
// infinity and has its own form in every family.
#[derive(Debug, Clone)]
pub struct TransitionFamily {
    pub p1: Vec<f64>,
    pub p2: Vec<f64>,
    pub p3: Vec<f64>,
    pub p4: Vec<f64>,
    pub p5: Vec<f64>,
    pub p6: Vec<f64>,
    pub p7: Vec<f64>,
}

impl TransitionFamily {
    pub fn new(grid: &TimeGrid, rho: f64) -> Result<Self> {
        if !(rho.is_finite() && rho > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "rho must be positive and finite, got {rho}"
            )));
        }
        let l = grid.n_states();
        let tk = grid.tk();
        let eps = grid.epsize();

        for i in 0..l - 1 {
            let denom = 1.0 - 2.0 * rho * eps[i];
            if denom.abs() < DEGENERACY_EPS {
                return Err(EngineError::NumericDegeneracy(format!(
                    "1 - 2*rho*epsize == 0 at state {i} (rho={rho}, epsize={})",
                    eps[i]
                )));
            }
        }

        // P2 depends on P5; everything else is independent.
        let p1 = compute_p1(tk, eps, rho, l);
        let p5 = compute_p5(tk, eps, l);
        let p6 = compute_p6(tk, eps, rho, l);
        let p2: Vec<f64> = p5.iter().map(|v| 1.0 - v).collect();
        let p3 = compute_p3(tk, eps, rho, l);
        let p4 = compute_p4(tk, eps, rho, l);
        let p7 = compute_p7(tk, eps, rho, l);

        let fam = Self {
            p1,
            p2,
            p3,
            p4,
            p5,
            p6,
            p7,
        };
        for (name, ary) in [
            ("P1", &fam.p1),
            ("P2", &fam.p2),
            ("P3", &fam.p3),
            ("P4", &fam.p4),
            ("P5", &fam.p5),
            ("P6", &fam.p6),
            ("P7", &fam.p7),
        ] {
            if let Some(i) = ary.iter().position(|v| !v.is_finite()) {
                return Err(EngineError::NumericDegeneracy(format!(
                    "{name}[{i}] is not finite"
                )));
            }
        }
        Ok(fam)
    }

    // Probability of coalescing within each state, entered from above:
    // pi[i] = prod_{j<i} P5[j] * P2[i]. P5[l-1] = 0 makes the sum telescope
    // to exactly 1.
    pub fn stationary(&self) -> Vec<f64> {
        let l = self.p2.len();
        let mut pi = vec![0.0; l];
        let mut survival = 1.0;
        for i in 0..l {
            pi[i] = survival * self.p2[i];
            survival *= self.p5[i];
        }
        let sum: f64 = pi.iter().sum();
        for v in pi.iter_mut() {
            *v /= sum;
        }
        pi
    }
}

fn compute_p1(tk: &[f64], eps: &[f64], rho: f64, l: usize) -> Vec<f64> {
    let mut p = vec![0.0; l];
    for i in 0..l - 1 {
        let tau = tk[i + 1] - tk[i];
        let mut v = 1.0 / (1.0 + eps[i] * 2.0 * rho);
        v *= (-rho * 2.0 * tk[i]).exp() - (-rho * 2.0 * tk[i + 1] - tau / eps[i]).exp();
        v /= 1.0 - (-tau / eps[i]).exp();
        p[i] = v;
    }
    let i = l - 1;
    p[i] = 1.0 / (1.0 + eps[i] * 2.0 * rho) * (-rho * 2.0 * tk[i]).exp();
    p
}

fn compute_p3(tk: &[f64], eps: &[f64], rho: f64, l: usize) -> Vec<f64> {
    let mut p = vec![0.0; l];
    for i in 0..l - 1 {
        let tau = tk[i + 1] - tk[i];
        let mut v = (-tk[i] * 2.0 * rho).exp();
        v += eps[i] * 2.0 * rho / (1.0 - eps[i] * 2.0 * rho)
            * (-tau / eps[i] - tk[i] * 2.0 * rho).exp();
        v -= 1.0 / (1.0 - eps[i] * 2.0 * rho) * (-tk[i + 1] * 2.0 * rho).exp();
        p[i] = v;
    }
    let i = l - 1;
    p[i] = (-tk[i] * 2.0 * rho).exp();
    p
}

fn compute_p4(tk: &[f64], eps: &[f64], rho: f64, l: usize) -> Vec<f64> {
    let mut p = vec![0.0; l];
    for i in 0..l - 1 {
        let tau = tk[i + 1] - tk[i];
        let mut tmp = 2.0 * rho / (1.0 + 2.0 * rho * eps[i]) * (-2.0 * rho * tk[i]).exp();
        tmp -= 2.0 * (-tau / eps[i] - 2.0 * rho * tk[i]).exp();
        tmp -= 2.0 * rho * eps[i] / (1.0 - eps[i] * 2.0 * rho)
            * (-2.0 * rho * tk[i] - 2.0 * tau / eps[i]).exp();
        tmp += 2.0 / (1.0 - eps[i] * 2.0 * rho) / (1.0 + 2.0 * rho)
            * (-rho * tk[i + 1] - tau / eps[i]).exp();
        p[i] = tmp / (1.0 - (-tau / eps[i]).exp());
    }
    let i = l - 1;
    p[i] = 2.0 * rho / (1.0 + 2.0 * rho * eps[i]) * (-2.0 * rho * tk[i]).exp();
    p
}

fn compute_p5(tk: &[f64], eps: &[f64], l: usize) -> Vec<f64> {
    let mut p = vec![0.0; l];
    for i in 0..l - 1 {
        p[i] = (-(tk[i + 1] - tk[i]) / eps[i]).exp();
    }
    p[l - 1] = 0.0;
    p
}

fn compute_p6(tk: &[f64], eps: &[f64], rho: f64, l: usize) -> Vec<f64> {
    let mut p = vec![0.0; l];
    for i in 0..l - 1 {
        let tau = tk[i + 1] - tk[i];
        let decay = (-tau / eps[i]).exp();
        let mut tmp = (-2.0 * rho * tk[i]).exp();
        tmp -= 1.0 / (1.0 - 2.0 * rho * eps[i]) * (-2.0 * rho * tk[i + 1]).exp();
        tmp += 2.0 * rho * eps[i] / (1.0 - 2.0 * rho * eps[i])
            * (-2.0 * rho * tk[i] - tau / eps[i]).exp();
        p[i] = decay / (1.0 - decay) * tmp;
    }
    p[l - 1] = 0.0;
    p
}

fn compute_p7(tk: &[f64], eps: &[f64], rho: f64, l: usize) -> Vec<f64> {
    let mut p = vec![0.0; l];
    for i in 0..l - 1 {
        let tau = tk[i + 1] - tk[i];
        let mut v = 1.0 - (-tau * 2.0 * rho).exp() - (-tk[i] * 2.0 * rho).exp();
        v -= eps[i] * 2.0 * rho / (1.0 - eps[i] * 2.0 * rho)
            * (-tau / eps[i] - tk[i] * 2.0 * rho).exp();
        v += 1.0 / (1.0 - eps[i] * 2.0 * rho) * (-tk[i] * 2.0 * rho).exp();
        p[i] = v;
    }
    let i = l - 1;
    p[i] = 1.0 - (-2.0 * rho * tk[i]).exp();
    p
}
