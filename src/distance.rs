//! Euclidean distance helpers for dense `f64` vectors.
//!
//! The index itself only ranks buckets by Hamming distance. These helpers are
//! for callers that keep their own vectors and want exact distances for the
//! final stage, either as a full `m x n` matrix ([`pairwise_euclidean`]) or by
//! re-ranking a candidate list ([`rerank`]).
//!
//! ## Important nuance
//!
//! [`pairwise_euclidean`] uses the expansion
//! $\lVert x-y \rVert^2 = \lVert x \rVert^2 - 2\langle x,y\rangle + \lVert y \rVert^2$,
//! which is much faster for whole matrices but can cancel to a tiny negative
//! number for near-identical rows. The absolute value is taken before the
//! square root. [`l2_distance`] is the direct per-pair form.

use crate::error::{IndexError, Result};
use crate::hash::ItemId;
use crate::matrix::Matrix;
use std::cmp::Ordering;
use std::collections::HashMap;

/// L2 (Euclidean) distance, computed directly.
///
/// If lengths differ this returns `f64::INFINITY` (so it is never selected as a
/// nearest neighbor).
#[inline]
#[must_use]
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    l2_distance_squared(a, b).sqrt()
}

/// Squared L2 distance.
#[inline]
#[must_use]
pub fn l2_distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Pairwise Euclidean distances between the rows of `x` (`m x d`) and `y` (`n x d`).
///
/// Entry `(i, j)` is `sqrt(|sum(x_i^2) - 2 x_i.y_j + sum(y_j^2)|)`. NaN and
/// infinities in the inputs propagate.
pub fn pairwise_euclidean(x: &Matrix, y: &Matrix) -> Result<Matrix> {
    if x.n_cols() != y.n_cols() {
        return Err(IndexError::ShapeMismatch {
            expected: x.n_cols(),
            found: y.n_cols(),
        });
    }
    let x_sq = x.row_sq_norms();
    let y_sq = y.row_sq_norms();
    let n = y.n_rows();
    let mut data = Vec::with_capacity(x.n_rows() * n);
    for (xi, &sx) in x.rows().zip(&x_sq) {
        for (yj, &sy) in y.rows().zip(&y_sq) {
            let cross: f64 = xi.iter().zip(yj).map(|(a, b)| a * b).sum();
            data.push((sx - 2.0 * cross + sy).abs().sqrt());
        }
    }
    Matrix::new(x.n_rows(), n, data)
}

/// Re-rank candidate ids by exact Euclidean distance to `query`.
///
/// `vectors` maps ids to the caller's stored vectors; candidates without an
/// entry are dropped. Returns at most `k` `(id, distance)` pairs in ascending
/// distance, with ties kept in candidate order.
pub fn rerank(
    query: &[f64],
    candidates: &[ItemId],
    vectors: &HashMap<ItemId, Vec<f64>>,
    k: usize,
) -> Vec<(ItemId, f64)> {
    let mut scored: Vec<(ItemId, f64)> = candidates
        .iter()
        .filter_map(|id| vectors.get(id).map(|v| (*id, l2_distance(query, v))))
        .collect();
    // Stable sort keeps candidate order among equal distances.
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}
