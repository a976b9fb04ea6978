use crate::error::{EngineError, Result};

// Terminal interval starts at max_t; this sentinel only marks the open end.
pub const T_INF: f64 = 1000.0;
// Model assumption: effectively constant ancient population size.
pub const ANCIENT_EPSIZE: f64 = 100.0;

// Discretized coalescence-time grid.
//
// `tk` holds n_states + 1 boundaries: tk[0] = 0, tk[n_states - 1] = max_t,
// tk[n_states] = T_INF. State i covers [tk[i], tk[i+1]); the last state is
// the open-ended interval starting at max_t. `epsize` holds one effective
// population size per state; the last entry is always ANCIENT_EPSIZE.
#[derive(Debug, Clone)]
pub struct TimeGrid {
    tk: Vec<f64>,
    epsize: Vec<f64>,
}

impl TimeGrid {
    pub fn new(
        n_intervals: usize,
        max_t: f64,
        alpha: f64,
        times: Option<&[f64]>,
        sizes: Option<&[f64]>,
    ) -> Result<Self> {
        if n_intervals == 0 {
            return Err(EngineError::InvalidParameter(
                "n_intervals must be >= 1".into(),
            ));
        }
        if !(max_t.is_finite() && max_t > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "max_t must be positive and finite, got {max_t}"
            )));
        }
        if max_t >= T_INF {
            return Err(EngineError::InvalidParameter(format!(
                "max_t must be below the terminal sentinel {T_INF}, got {max_t}"
            )));
        }
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "alpha must be positive and finite, got {alpha}"
            )));
        }

        let n = n_intervals;
        let mut tk = Vec::with_capacity(n + 2);
        match times {
            None => {
                // Log-spaced schedule, denser near time zero. t[n] would come
                // out as max_t analytically; it is forced exactly below.
                let beta = (1.0 + max_t / alpha).ln() / n as f64;
                for k in 0..n {
                    tk.push(alpha * ((beta * k as f64).exp() - 1.0));
                }
                tk.push(max_t);
                tk.push(T_INF);
            }
            Some(inp) => {
                if inp.len() != n + 1 {
                    return Err(EngineError::InvalidParameter(format!(
                        "expected {} explicit time boundaries for {} intervals, got {}",
                        n + 1,
                        n,
                        inp.len()
                    )));
                }
                tk.extend_from_slice(&inp[..n]);
                tk.push(max_t);
                tk.push(T_INF);
            }
        }
        Self::from_boundaries(tk, sizes)
    }

    // Direct construction from a full boundary array ending in the sentinel.
    pub fn from_boundaries(tk: Vec<f64>, sizes: Option<&[f64]>) -> Result<Self> {
        if tk.len() < 2 {
            return Err(EngineError::InvalidParameter(
                "time grid needs at least one state".into(),
            ));
        }
        if tk[0] != 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "first time boundary must be 0, got {}",
                tk[0]
            )));
        }
        let l = tk.len() - 1;
        for i in 0..l {
            if !tk[i].is_finite() {
                return Err(EngineError::InvalidParameter(format!(
                    "time boundary {i} is not finite"
                )));
            }
            if tk[i + 1] <= tk[i] {
                return Err(EngineError::InvalidParameter(format!(
                    "time boundaries must be strictly increasing, tk[{}]={} vs tk[{}]={}",
                    i,
                    tk[i],
                    i + 1,
                    tk[i + 1]
                )));
            }
        }

        let mut epsize = match sizes {
            None => vec![1.0; l],
            Some(inp) => {
                if inp.len() + 1 < l {
                    return Err(EngineError::InvalidParameter(format!(
                        "expected at least {} effective sizes for {} states, got {}",
                        l - 1,
                        l,
                        inp.len()
                    )));
                }
                let mut v = Vec::with_capacity(l);
                v.extend_from_slice(&inp[..l - 1]);
                v.push(ANCIENT_EPSIZE);
                v
            }
        };
        // Last entry is always the ancient-size sentinel, explicit input or not.
        epsize[l - 1] = ANCIENT_EPSIZE;
        for (i, s) in epsize.iter().enumerate() {
            if !(s.is_finite() && *s > 0.0) {
                return Err(EngineError::InvalidParameter(format!(
                    "effective size {i} must be positive and finite, got {s}"
                )));
            }
        }

        Ok(Self { tk, epsize })
    }

    pub fn n_states(&self) -> usize {
        self.epsize.len()
    }

    pub fn tk(&self) -> &[f64] {
        &self.tk
    }

    pub fn epsize(&self) -> &[f64] {
        &self.epsize
    }
}
