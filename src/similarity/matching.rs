use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::hungarian;
use crate::errors::{Error, Result};

/// Reduction of a pairwise score grid between two sets to a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingMode {
    /// One-to-one assignment maximising the summed similarity.
    Optimal,
    /// Every element keeps its best partner on the other side, even when
    /// several elements pick the same one.
    Greedy,
}

impl std::fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Optimal => "optimal",
            Self::Greedy => "greedy",
        })
    }
}

/// Scores how well the elements of `left` and `right` correspond.
///
/// Either set empty scores `0.0`, checked before identical sets, which score
/// `1.0` without calling `score`. Otherwise `score` is called once per pair and
/// should return a value in `[0, 1]`. Finite values outside it are clamped.
///
/// # Errors
/// Propagates errors from `score` and from the assignment solver, and returns
/// [`Error::SimilarityOutOfRange`] when `score` yields NaN or an infinity.
pub fn match_sets<T, F>(
    left: &BTreeSet<T>,
    right: &BTreeSet<T>,
    mode: MatchingMode,
    mut score: F,
) -> Result<f64>
where
    T: Ord,
    F: FnMut(&T, &T) -> Result<f64>,
{
    if left.is_empty() || right.is_empty() {
        return Ok(0.0);
    }
    if left == right {
        return Ok(1.0);
    }

    let mut grid = Vec::with_capacity(left.len());
    for a in left {
        let mut row = Vec::with_capacity(right.len());
        for b in right {
            let value = score(a, b)?;
            if !value.is_finite() {
                return Err(Error::SimilarityOutOfRange { value });
            }
            row.push(value.clamp(0.0, 1.0));
        }
        grid.push(row);
    }

    let result = match mode {
        MatchingMode::Optimal => optimal(&grid)?,
        MatchingMode::Greedy => greedy(&grid),
    }
    .clamp(0.0, 1.0);
    trace!(
        mode = %mode,
        left = left.len(),
        right = right.len(),
        score = result,
        "sets_matched"
    );
    Ok(result)
}

/// `2 · Σ matched similarity / (|A| + |B|)` over a minimum-cost assignment of
/// `1 - similarity`.
fn optimal(similarities: &[Vec<f64>]) -> Result<f64> {
    let costs: Vec<Vec<f64>> = similarities
        .iter()
        .map(|row| row.iter().map(|sim| 1.0 - sim).collect())
        .collect();
    let assignment = hungarian::solve(&costs)?;
    let matched: f64 = assignment
        .iter()
        .zip(&costs)
        .filter_map(|(job, row)| job.map(|job| 1.0 - row[job]))
        .sum();
    Ok(2.0 * matched / size(similarities))
}

/// `(Σ row maxima + Σ column maxima) / (|A| + |B|)`.
fn greedy(similarities: &[Vec<f64>]) -> f64 {
    let cols = similarities.first().map_or(0, Vec::len);
    let rows_best: f64 = similarities
        .iter()
        .map(|row| row.iter().copied().fold(0.0, f64::max))
        .sum();
    let cols_best: f64 = (0..cols)
        .map(|col| {
            similarities
                .iter()
                .map(|row| row[col])
                .fold(0.0, f64::max)
        })
        .sum();
    (rows_best + cols_best) / size(similarities)
}

#[allow(clippy::cast_precision_loss)]
fn size(similarities: &[Vec<f64>]) -> f64 {
    (similarities.len() + similarities.first().map_or(0, Vec::len)) as f64
}
