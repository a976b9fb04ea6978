use ndarray::Array2;

use crate::error::{EngineError, Result};
use crate::grid::TimeGrid;
use crate::progress;
use crate::utils::add_protect2;
use crate::windows::{Site, Window};

// Per-(state, window) log-likelihood of the genotype evidence.
//
// A site in state j is a two-hypothesis mixture weighted by the coalescence
// decay exp(-2*tk[j]*mu): still-separate lineages emit g0, coalesced
// lineages emit g1. Sites within a window are independent, so the window
// emission is the sum of per-site log mixtures. Column 0 is padding; the
// recursions start writing at column 1.
pub fn compute_emissions(
    grid: &TimeGrid,
    mu: f64,
    sites: &[Site],
    windows: &[Window],
    progress_enabled: bool,
) -> Result<Array2<f64>> {
    validate_windows(sites, windows)?;

    let l = grid.n_states();
    let tk = grid.tk();
    let mut emis = Array2::zeros((l, windows.len() + 1));

    // Mixture weights per state, kept in log domain. For tk[j] = 0 the
    // coalesced weight is exactly zero and its log is -inf, which
    // add_protect2 handles.
    let mut lw0 = vec![0.0; l];
    let mut lw1 = vec![0.0; l];
    for j in 0..l {
        lw0[j] = -2.0 * tk[j] * mu;
        lw1[j] = (-(-2.0 * tk[j] * mu).exp_m1()).ln();
    }

    let pb = if progress_enabled && !windows.is_empty() {
        Some(progress::bar(windows.len() as u64, "EMIT", "windows"))
    } else {
        None
    };

    for (v, win) in windows.iter().enumerate() {
        for j in 0..l {
            let mut sum = 0.0;
            for site in &sites[win.from..win.to] {
                sum += add_protect2(site.g0 + lw0[j], site.g1 + lw1[j]);
            }
            if sum.is_nan() {
                return Err(EngineError::NumericDegeneracy(format!(
                    "emission is NaN at state {j}, window {v}"
                )));
            }
            emis[(j, v + 1)] = sum;
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("windows done");
    }

    Ok(emis)
}

fn validate_windows(sites: &[Site], windows: &[Window]) -> Result<()> {
    let mut expect_from = 0usize;
    for (v, win) in windows.iter().enumerate() {
        if win.from > win.to {
            return Err(EngineError::InvalidParameter(format!(
                "window {v} has from {} > to {}",
                win.from, win.to
            )));
        }
        if win.to > sites.len() {
            return Err(EngineError::IndexMismatch {
                window: v,
                from: win.from,
                to: win.to,
                n_sites: sites.len(),
            });
        }
        if win.from != expect_from {
            return Err(EngineError::InvalidParameter(format!(
                "window {v} starts at site {} but the previous window ends at {}",
                win.from, expect_from
            )));
        }
        expect_from = win.to;
    }
    Ok(())
}
