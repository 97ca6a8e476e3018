//! Dense row-major `f64` matrices.
//!
//! [`Matrix`] is the feature-matrix type accepted by [`LSHIndex`](crate::LSHIndex)
//! (one row per item or query) and also stores the hyperplane weights. Only the
//! handful of kernels the index needs are provided: matrix product, per-row
//! sum of squares, and sign thresholding into [`BitCode`]s.

use crate::error::{IndexError, Result};
use crate::hash::BitCode;
use serde::{Deserialize, Serialize};

/// Dense `rows x cols` matrix stored row-major.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wrap a flat row-major buffer.
    ///
    /// Fails if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            IndexError::InvalidParameter(format!("matrix shape {rows}x{cols} overflows"))
        })?;
        if data.len() != expected {
            return Err(IndexError::InvalidParameter(format!(
                "buffer of length {} does not fit a {rows}x{cols} matrix",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Wrap a buffer whose length is known to be `rows * cols`.
    pub(crate) fn from_vec_unchecked(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = rows.checked_mul(cols).ok_or_else(|| {
            IndexError::InvalidParameter(format!("matrix shape {rows}x{cols} overflows"))
        })?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    /// Build from a list of equally sized rows.
    ///
    /// An empty list yields a `0 x 0` matrix.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(IndexError::InvalidParameter(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// True if the buffer length agrees with the shape. Always holds for
    /// matrices built through the constructors; checked after deserializing.
    pub(crate) fn is_consistent(&self) -> bool {
        self.rows.checked_mul(self.cols) == Some(self.data.len())
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Matrix product `self (m x k) . other (k x n) -> m x n`.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(IndexError::ShapeMismatch {
                expected: other.rows,
                found: self.cols,
            });
        }
        let n = other.cols;
        let mut out = vec![0.0; self.rows * n];
        for i in 0..self.rows {
            project_row_into(self.row(i), other, &mut out[i * n..(i + 1) * n]);
        }
        Ok(Matrix {
            rows: self.rows,
            cols: n,
            data: out,
        })
    }

    /// Per-row sum of squares.
    pub fn row_sq_norms(&self) -> Vec<f64> {
        self.rows().map(|r| r.iter().map(|x| x * x).sum()).collect()
    }

    /// Element-wise `>= 0`, one [`BitCode`] per row.
    ///
    /// NaN compares false and therefore maps to a cleared bit.
    pub fn threshold_ge_zero(&self) -> Vec<BitCode> {
        self.rows().map(BitCode::from_signs).collect()
    }
}

/// Accumulate `row . weights` into `out` (length `weights.n_cols()`).
///
/// Iterates `k` in the outer loop so each weight row is read contiguously.
#[inline]
pub(crate) fn project_row_into(row: &[f64], weights: &Matrix, out: &mut [f64]) {
    debug_assert_eq!(row.len(), weights.rows);
    debug_assert_eq!(out.len(), weights.cols);
    out.iter_mut().for_each(|v| *v = 0.0);
    for (k, &x) in row.iter().enumerate() {
        let w = weights.row(k);
        for (acc, &wk) in out.iter_mut().zip(w) {
            *acc += x * wk;
        }
    }
}
