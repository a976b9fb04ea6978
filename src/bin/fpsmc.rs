use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use fpsmc::FastPsmc;
use fpsmc::hmm::write_posterior_tsv;
use fpsmc::io::gl::read_gl;
use fpsmc::io::params::{ModelParams, load_params, save_params};
use fpsmc::progress;
use fpsmc::windows::build_windows;

#[derive(Parser, Debug)]
#[command(name = "fpsmc")]
#[command(about = "Forward-backward inference for a fast PSMC-like coalescent HMM", long_about = None)]
struct Cli {
    // Genotype-likelihood input: chrom pos g0 g1 per row, .gz supported.
    input_file: PathBuf,
    #[arg(long, help = "JSON parameter bundle; overrides the model flags below")]
    params: Option<PathBuf>,
    #[arg(long, default_value_t = 100, help = "Genomic span of one window")]
    win_size: u64,
    #[arg(long, help = "Run a single chromosome")]
    chr: Option<String>,
    #[arg(long, default_value_t = 32)]
    n_intervals: usize,
    #[arg(long, default_value_t = 15.0)]
    max_t: f64,
    #[arg(long, default_value_t = 0.01)]
    alpha: f64,
    #[arg(long, default_value_t = 0.207)]
    rho: f64,
    #[arg(long, default_value_t = 1e-4)]
    mu: f64,
    #[arg(long, help = "Write per-window posterior TSV, one file per chromosome")]
    posterior_out: Option<PathBuf>,
    #[arg(long, help = "Save the effective parameter bundle as JSON")]
    save_params: Option<PathBuf>,
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let params = match &cli.params {
        Some(path) => load_params(path)?,
        None => ModelParams {
            n_intervals: cli.n_intervals,
            max_t: cli.max_t,
            alpha: cli.alpha,
            rho: cli.rho,
            mu: cli.mu,
            times: None,
            sizes: None,
        },
    };
    eprintln!(
        "-> n_intervals:{} max_t:{} rho:{} mu:{}",
        params.n_intervals, params.max_t, params.rho, params.mu
    );

    let chroms = if cli.no_progress {
        read_gl(&cli.input_file).context("failed to read gl input")?
    } else {
        let pb = progress::spinner("IO", "Reading gl");
        let chroms = read_gl(&cli.input_file).context("failed to read gl input")?;
        pb.finish_with_message("Reading gl done");
        chroms
    };

    if let Some(path) = &cli.save_params {
        save_params(path, &params)?;
    }

    let mut n_failed = 0usize;
    let mut n_run = 0usize;
    for chrom in &chroms {
        if let Some(only) = &cli.chr {
            if &chrom.name != only {
                continue;
            }
        }
        n_run += 1;
        // A failing chromosome is a data or parameter problem; report it and
        // keep going with the rest.
        if let Err(e) = run_chromosome(chrom, &params, &cli) {
            eprintln!("Warning: chromosome {} failed: {e:#}", chrom.name);
            n_failed += 1;
        }
    }
    if let Some(only) = &cli.chr {
        if n_run == 0 {
            anyhow::bail!("chromosome {only} not found in input");
        }
    }
    if n_failed > 0 {
        eprintln!("{n_failed} chromosome(s) failed");
    }
    Ok(())
}

fn run_chromosome(chrom: &fpsmc::io::gl::ChromSites, params: &ModelParams, cli: &Cli) -> Result<()> {
    let windows = build_windows(&chrom.positions, cli.win_size);
    if windows.is_empty() {
        anyhow::bail!(
            "no complete windows of span {} ({} sites)",
            cli.win_size,
            chrom.sites.len()
        );
    }

    let mut engine = FastPsmc::new(windows.len(), params)?;
    let fb = engine.compute_forward_backward(&chrom.sites, &windows, !cli.no_progress)?;
    println!(
        "{}\twindows:{}\tforward llh:{:.6}\tbackward llh:{:.6}",
        chrom.name,
        windows.len(),
        fb.forward_loglik,
        fb.backward_loglik
    );

    if let Some(base) = &cli.posterior_out {
        let path = chrom_out_path(base, &chrom.name);
        write_posterior_tsv(&path, &engine, &windows)?;
        println!("posterior: {}", path.display());
    }
    Ok(())
}

fn chrom_out_path(base: &Path, chrom: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "posterior".to_string());
    let name = format!("{stem}.{chrom}.tsv");
    match base.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
