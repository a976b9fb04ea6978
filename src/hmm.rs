use anyhow::Context;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::emission::compute_emissions;
use crate::error::{EngineError, Result};
use crate::grid::TimeGrid;
use crate::io::params::ModelParams;
use crate::transition::TransitionFamily;
use crate::windows::{Site, Window};

#[derive(Debug, Clone, Copy)]
pub struct FbResult {
    pub forward_loglik: f64,
    pub backward_loglik: f64,
}

// Forward-backward engine over the discretized coalescence-time states.
//
// Owns every dense lattice: `fw`, `bw`, `pp`, `emis` are (n_states,
// n_windows + 1) arrays sized once at construction. Columns are genomic
// windows, column 0 the boundary; `emis` is log domain, `fw`/`bw` are kept
// in probability domain with per-column scaling so long sequences do not
// underflow, and `pp` holds the per-column normalized posterior.
#[derive(Debug)]
pub struct FastPsmc {
    grid: TimeGrid,
    mu: f64,
    trans: TransitionFamily,
    stationary: Vec<f64>,
    n_windows: usize,
    emis: Array2<f64>,
    fw: Array2<f64>,
    bw: Array2<f64>,
    pp: Array2<f64>,
}

impl FastPsmc {
    pub fn new(n_windows: usize, params: &ModelParams) -> Result<Self> {
        let grid = TimeGrid::new(
            params.n_intervals,
            params.max_t,
            params.alpha,
            params.times.as_deref(),
            params.sizes.as_deref(),
        )?;
        Self::with_grid(n_windows, grid, params.rho, params.mu)
    }

    pub fn with_grid(n_windows: usize, grid: TimeGrid, rho: f64, mu: f64) -> Result<Self> {
        if n_windows == 0 {
            return Err(EngineError::InvalidParameter(
                "window sequence is empty".into(),
            ));
        }
        if !(mu.is_finite() && mu > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "mu must be positive and finite, got {mu}"
            )));
        }
        let trans = TransitionFamily::new(&grid, rho)?;
        let stationary = trans.stationary();
        let l = grid.n_states();
        Ok(Self {
            grid,
            mu,
            trans,
            stationary,
            n_windows,
            emis: Array2::zeros((l, n_windows + 1)),
            fw: Array2::zeros((l, n_windows + 1)),
            bw: Array2::zeros((l, n_windows + 1)),
            pp: Array2::zeros((l, n_windows + 1)),
        })
    }

    pub fn n_states(&self) -> usize {
        self.grid.n_states()
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn transition(&self) -> &TransitionFamily {
        &self.trans
    }

    pub fn stationary(&self) -> &[f64] {
        &self.stationary
    }

    pub fn emissions(&self) -> &Array2<f64> {
        &self.emis
    }

    pub fn posterior(&self) -> &Array2<f64> {
        &self.pp
    }

    // Full forward-backward sweep. The two returned log-likelihoods are
    // computed from independent recursions and must agree; a mismatch means
    // a broken transition family.
    pub fn compute_forward_backward(
        &mut self,
        sites: &[Site],
        windows: &[Window],
        progress_enabled: bool,
    ) -> Result<FbResult> {
        if windows.len() != self.n_windows {
            return Err(EngineError::InvalidParameter(format!(
                "engine was sized for {} windows, got {}",
                self.n_windows,
                windows.len()
            )));
        }
        self.emis = compute_emissions(&self.grid, self.mu, sites, windows, progress_enabled)?;

        let l = self.n_states();
        let w = self.n_windows;

        // Per-column max of the log emissions; pulled out of the lattice so
        // the probability-domain columns stay near 1.
        let mut shift = vec![0.0; w + 1];
        for v in 1..=w {
            let mut m = f64::NEG_INFINITY;
            for j in 0..l {
                m = m.max(self.emis[(j, v)]);
            }
            if !m.is_finite() {
                return Err(EngineError::NumericDegeneracy(format!(
                    "emission column {v} has no finite entry"
                )));
            }
            shift[v] = m;
        }

        let mut cur = vec![0.0; l];
        let mut next = vec![0.0; l];
        let mut r1 = vec![0.0; l];
        let mut r2 = vec![0.0; l];

        // Forward pass: column 0 is the stationary boundary, column v+1 is
        // the transition image of column v times the window v+1 emissions.
        for i in 0..l {
            self.fw[(i, 0)] = self.stationary[i];
        }
        let mut forward_loglik = 0.0;
        for v in 0..w {
            for i in 0..l {
                cur[i] = self.fw[(i, v)];
            }
            transition_apply(&self.trans, &cur, &mut r1, &mut r2, &mut next);
            let mut norm = 0.0;
            for i in 0..l {
                next[i] *= (self.emis[(i, v + 1)] - shift[v + 1]).exp();
                norm += next[i];
            }
            check_column("forward", v + 1, norm, &next)?;
            for i in 0..l {
                self.fw[(i, v + 1)] = next[i] / norm;
            }
            forward_loglik += norm.ln() + shift[v + 1];
        }

        // Backward pass: same transition family applied transposed, walking
        // right to left with the emission of the column being left.
        for i in 0..l {
            self.bw[(i, w)] = 1.0;
        }
        let mut backward_loglik = 0.0;
        for v in (1..=w).rev() {
            for i in 0..l {
                cur[i] = self.bw[(i, v)] * (self.emis[(i, v)] - shift[v]).exp();
            }
            transition_apply_transposed(&self.trans, &cur, &mut r1, &mut next);
            let norm: f64 = next.iter().sum();
            check_column("backward", v - 1, norm, &next)?;
            for i in 0..l {
                self.bw[(i, v - 1)] = next[i] / norm;
            }
            backward_loglik += norm.ln() + shift[v];
        }
        let mut boundary = 0.0;
        for i in 0..l {
            boundary += self.stationary[i] * self.bw[(i, 0)];
        }
        if !(boundary.is_finite() && boundary > 0.0) {
            return Err(EngineError::NumericDegeneracy(format!(
                "backward boundary mass is {boundary}"
            )));
        }
        backward_loglik += boundary.ln();

        // Posterior, normalized per column. Per-column scale factors of fw
        // and bw cancel out here.
        for v in 1..=w {
            let mut sum = 0.0;
            for i in 0..l {
                let q = self.fw[(i, v)] * self.bw[(i, v)];
                self.pp[(i, v)] = q;
                sum += q;
            }
            if !(sum.is_finite() && sum > 0.0) {
                return Err(EngineError::NumericDegeneracy(format!(
                    "posterior column {v} sums to {sum}"
                )));
            }
            for i in 0..l {
                self.pp[(i, v)] /= sum;
            }
        }

        Ok(FbResult {
            forward_loglik,
            backward_loglik,
        })
    }
}

fn check_column(pass: &str, window: usize, norm: f64, col: &[f64]) -> Result<()> {
    if norm.is_finite() && norm > 0.0 {
        return Ok(());
    }
    let state = col.iter().position(|v| !v.is_finite()).unwrap_or(0);
    Err(EngineError::NumericDegeneracy(format!(
        "{pass} column {window} normalizer is {norm} (first bad state {state})"
    )))
}

// One application of the transition operator: out = M x, in O(n_states).
//
// R1[i] is the suffix sum of x over states >= i; R2 folds the
// already-coalesced mass downward through P2 while mixing in the P6/P7
// contributions of each state passed.
fn transition_apply(t: &TransitionFamily, x: &[f64], r1: &mut [f64], r2: &mut [f64], out: &mut [f64]) {
    let l = x.len();
    r1[l - 1] = x[l - 1];
    for i in (0..l - 1).rev() {
        r1[i] = r1[i + 1] + x[i];
    }
    r2[0] = x[0] * t.p6[0] + r1[0] * t.p7[0];
    for i in 1..l {
        r2[i] = r2[i - 1] * t.p2[i] + x[i] * t.p6[i] + r1[i] * t.p7[i];
    }
    out[0] = x[0] * (t.p1[0] + t.p4[0]) + r1[0] * t.p3[0];
    for i in 1..l {
        out[i] = x[i] * (t.p1[i] + t.p4[i]) + r2[i - 1] * t.p2[i - 1] + r1[i] * t.p3[i];
    }
}

// Exact transpose of `transition_apply`: out = M^T y, also in O(n_states).
//
// `r1` here plays the suffix role of R1: r1[j] collects the P2-chained mass
// arriving from states above j. The two prefix accumulators fold the P3 and
// P7 columns. Keeping this the literal transpose is what makes the forward
// and backward total log-likelihoods agree to machine precision.
fn transition_apply_transposed(t: &TransitionFamily, y: &[f64], r1: &mut [f64], out: &mut [f64]) {
    let l = y.len();
    r1[l - 1] = 0.0;
    for j in (0..l - 1).rev() {
        r1[j] = t.p2[j] * y[j + 1] + t.p2[j + 1] * r1[j + 1];
    }
    let mut recomb = 0.0;
    let mut chained = 0.0;
    for j in 0..l {
        recomb += t.p3[j] * y[j];
        chained += t.p7[j] * r1[j];
        out[j] = y[j] * (t.p1[j] + t.p4[j]) + recomb + t.p6[j] * r1[j] + chained;
    }
}

// Diagnostic dump of the posterior: per window, the MAP state and the
// posterior mean of the interval start times.
pub fn write_posterior_tsv(
    path: &Path,
    engine: &FastPsmc,
    windows: &[Window],
) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "window\tfrom\tto\tmap_state\tmean_time")?;
    let pp = engine.posterior();
    let tk = engine.grid().tk();
    let l = engine.n_states();
    for (v, win) in windows.iter().enumerate() {
        let col = v + 1;
        let mut map_state = 0usize;
        let mut best = f64::NEG_INFINITY;
        let mut mean_time = 0.0;
        for j in 0..l {
            let p = pp[(j, col)];
            if p > best {
                best = p;
                map_state = j;
            }
            mean_time += p * tk[j];
        }
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{:.6}",
            v, win.from, win.to, map_state, mean_time
        )?;
    }
    Ok(())
}
