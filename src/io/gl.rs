use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::windows::Site;

// Genotype-likelihood input: whitespace-separated text, one site per row,
// `chrom pos g0 g1` with natural-log likelihoods and 1-based, strictly
// increasing positions within a chromosome. A change of chromosome name
// starts a new block.
#[derive(Debug, Clone)]
pub struct ChromSites {
    pub name: String,
    pub positions: Vec<u64>,
    pub sites: Vec<Site>,
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
    let reader: Box<dyn Read> = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

pub fn read_gl(path: &Path) -> Result<Vec<ChromSites>> {
    let mut reader = open_reader(path)?;
    let mut line = String::new();
    let mut row_no = 0usize;

    let mut out: Vec<ChromSites> = Vec::new();
    let mut cur: Option<ChromSites> = None;

    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .with_context(|| format!("failed to read {path:?}"))?;
        if bytes == 0 {
            break;
        }
        row_no += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut cols = trimmed.split_whitespace();
        let chrom = cols
            .next()
            .with_context(|| format!("invalid gl row {row_no}: missing chrom"))?;
        let pos_str = cols
            .next()
            .with_context(|| format!("invalid gl row {row_no}: missing pos"))?;
        let g0_str = cols
            .next()
            .with_context(|| format!("invalid gl row {row_no}: missing g0"))?;
        let g1_str = cols
            .next()
            .with_context(|| format!("invalid gl row {row_no}: missing g1"))?;

        let pos: u64 = pos_str
            .parse()
            .with_context(|| format!("invalid gl row {row_no}: bad pos '{pos_str}'"))?;
        if pos == 0 {
            bail!("invalid gl row {row_no}: pos must be >= 1");
        }
        let g0: f64 = g0_str
            .parse()
            .with_context(|| format!("invalid gl row {row_no}: bad g0 '{g0_str}'"))?;
        let g1: f64 = g1_str
            .parse()
            .with_context(|| format!("invalid gl row {row_no}: bad g1 '{g1_str}'"))?;
        if g0.is_nan() || g1.is_nan() {
            bail!("invalid gl row {row_no}: likelihood is NaN");
        }

        let start_new = match &cur {
            None => true,
            Some(c) => c.name != chrom,
        };
        if start_new {
            if let Some(c) = cur.take() {
                out.push(c);
            }
            cur = Some(ChromSites {
                name: chrom.to_string(),
                positions: Vec::new(),
                sites: Vec::new(),
            });
        }
        let c = cur.as_mut().unwrap();
        if let Some(last) = c.positions.last() {
            if pos <= *last {
                bail!("invalid gl row {row_no}: pos must increase within chromosome");
            }
        }
        c.positions.push(pos);
        c.sites.push(Site { g0, g1 });
    }

    if let Some(c) = cur {
        out.push(c);
    }
    if out.is_empty() {
        bail!("no valid gl rows found in input");
    }
    Ok(out)
}
