// One genomic observation: log-likelihood of the genotype evidence under the
// not-yet-coalesced (g0) and coalesced (g1) hypotheses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub g0: f64,
    pub g1: f64,
}

// Half-open range [from, to) of site indices forming one HMM observation
// column. Windows are contiguous, non-overlapping, and cover a prefix of the
// site sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: usize,
    pub to: usize,
}

// Group consecutive sites into windows of fixed genomic span. Each window is
// anchored at the position of its first site; a window reaching the end of
// the data is dropped since it may be truncated by the input boundary.
pub fn build_windows(positions: &[u64], win_size: u64) -> Vec<Window> {
    let mut out = Vec::new();
    if win_size == 0 {
        return out;
    }
    let mut from = 0usize;
    while from < positions.len() {
        let end_pos = positions[from].saturating_add(win_size);
        let mut at = from;
        while at < positions.len() && positions[at] < end_pos {
            at += 1;
        }
        if at == positions.len() {
            break;
        }
        out.push(Window { from, to: at });
        from = at;
    }
    out
}
