use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// The full parameter bundle consumed by the engine: n_intervals free finite
// time intervals (so n_intervals + 1 states), the finite horizon max_t, the
// grid shape alpha, recombination rate rho, mutation rate mu, and optional
// explicit time-boundary / effective-size arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    pub n_intervals: usize,
    pub max_t: f64,
    pub alpha: f64,
    pub rho: f64,
    pub mu: f64,
    #[serde(default)]
    pub times: Option<Vec<f64>>,
    #[serde(default)]
    pub sizes: Option<Vec<f64>>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_intervals: 32,
            max_t: 15.0,
            alpha: 0.01,
            rho: 0.207,
            mu: 1e-4,
            times: None,
            sizes: None,
        }
    }
}

pub fn save_params(path: &Path, params: &ModelParams) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, params)
        .with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

pub fn load_params(path: &Path) -> Result<ModelParams> {
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let reader = BufReader::new(file);
    let params =
        serde_json::from_reader(reader).with_context(|| format!("failed to parse {:?}", path))?;
    Ok(params)
}
