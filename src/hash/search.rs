//! Random-projection LSH index.
//!
//! Items are hashed to `code_length`-bit codes by the signs of their
//! projections onto random hyperplanes, then grouped into buckets by code.
//! Queries rank every stored code by Hamming distance to the query's code and
//! read buckets in that order.
//!
//! # Ordering
//!
//! Buckets at equal Hamming distance are visited in bucket-creation order, and
//! ids within a bucket in insertion (= id) order. `search_knn` stops reading
//! once it has `n_neighbors` ids and truncates; `search_radius` reads every
//! bucket within `radius` and stops at the first one beyond it.
//!
//! # Example
//!
//! ```rust
//! use hyperlsh::{LSHIndex, Matrix};
//!
//! let data = Matrix::from_rows(&[
//!     [1.0, 0.2, -0.3],
//!     [0.9, 0.1, -0.2],
//!     [-1.0, 0.5, 0.8],
//! ])?;
//! let mut index = LSHIndex::new(32, Some(7))?;
//! index.build_index(&data)?;
//!
//! let neighbors = index.search_knn(&data, 2)?;
//! assert_eq!(neighbors.len(), 3);
//! assert_eq!(neighbors[0].len(), 2);
//! # Ok::<(), hyperlsh::IndexError>(())
//! ```

use super::code::{hamming, BitCode};
use super::hash_table::BucketTable;
use super::random_projection::{rand_normal, ProjectionRng};
use super::ItemId;
use crate::error::{IndexError, Result};
use crate::matrix::{project_row_into, Matrix};
use crate::persistence::IndexSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default number of hyperplanes (bits per code).
pub const DEFAULT_CODE_LENGTH: usize = 256;
/// Default `n_neighbors` for k-NN queries.
pub const DEFAULT_N_NEIGHBORS: usize = 10;
/// Default Hamming radius for radius queries.
pub const DEFAULT_RADIUS: usize = 1;

/// What `build_index` does with the generator when called again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RebuildPolicy {
    /// Restart the generator from the stored seed, so every build with the same
    /// input yields the same hyperplanes.
    #[default]
    Reseed,
    /// Keep drawing from the live generator; a second build gets new planes.
    Continue,
}

/// LSH index parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LSHParams {
    /// Bits per code (number of random hyperplanes).
    pub code_length: usize,
    /// Generator seed; chosen from entropy when `None`.
    pub random_seed: Option<u64>,
    /// Generator handling on rebuild.
    pub rebuild: RebuildPolicy,
}

impl Default for LSHParams {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            random_seed: None,
            rebuild: RebuildPolicy::default(),
        }
    }
}

impl LSHParams {
    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = code_length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_rebuild(mut self, rebuild: RebuildPolicy) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.code_length == 0 {
            return Err(IndexError::InvalidParameter(
                "code_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of the current table contents.
#[derive(Debug, Clone, PartialEq)]
pub struct LSHStats {
    pub n_samples: usize,
    pub n_keys: usize,
    pub n_features: usize,
    pub code_length: usize,
    pub max_bucket_len: usize,
    pub mean_bucket_len: f64,
    /// Approximate heap usage of weights, codes and buckets.
    pub size_bytes: usize,
}

/// Single-table random-hyperplane LSH index.
///
/// Mutating calls take `&mut self`; queries take `&self` and never touch the
/// generator, so an index behind an `RwLock` serves concurrent readers.
#[derive(Debug, Clone)]
pub struct LSHIndex {
    params: LSHParams,
    n_samples: usize,
    n_features: usize,
    last_id: ItemId,
    /// `n_features x code_length`; `None` until built.
    weights: Option<Matrix>,
    table: BucketTable,
    rng: ProjectionRng,
}

impl LSHIndex {
    /// Create an empty index.
    pub fn new(code_length: usize, random_seed: Option<u64>) -> Result<Self> {
        Self::with_params(LSHParams {
            code_length,
            random_seed,
            ..LSHParams::default()
        })
    }

    pub fn with_params(mut params: LSHParams) -> Result<Self> {
        params.validate()?;
        let rng = match params.random_seed {
            Some(seed) => ProjectionRng::new(seed),
            None => ProjectionRng::from_entropy(),
        };
        params.random_seed = Some(rng.seed());
        Ok(Self {
            params,
            n_samples: 0,
            n_features: 0,
            last_id: 0,
            weights: None,
            table: BucketTable::new(),
            rng,
        })
    }

    /// Draw hyperplanes for `features` and hash every row into a fresh table.
    ///
    /// Ids `0..n` are assigned in row order. Any previous contents are
    /// discarded. On error the index is left unchanged.
    pub fn build_index(&mut self, features: &Matrix) -> Result<&mut Self> {
        if features.n_rows() == 0 || features.n_cols() == 0 {
            return Err(IndexError::InvalidParameter(format!(
                "cannot build from a {}x{} matrix",
                features.n_rows(),
                features.n_cols()
            )));
        }
        let start = Instant::now();
        let mut rng = self.rng.clone();
        if self.params.rebuild == RebuildPolicy::Reseed {
            rng.reseed();
        }
        let weights = rand_normal(
            features.n_cols(),
            self.params.code_length,
            0.0,
            1.0,
            &mut rng,
        );
        let codes = features.dot(&weights)?.threshold_ge_zero();

        let mut table = BucketTable::new();
        for (id, code) in codes.iter().enumerate() {
            table.insert(code, id as ItemId);
        }

        self.rng = rng;
        self.weights = Some(weights);
        self.table = table;
        self.n_samples = features.n_rows();
        self.n_features = features.n_cols();
        self.last_id = features.n_rows() as ItemId;

        debug!(
            n_samples = self.n_samples,
            n_features = self.n_features,
            n_keys = self.table.len(),
            code_length = self.params.code_length,
            elapsed_us = start.elapsed().as_micros() as u64,
            "built LSH index"
        );
        if self.table.len() == 1 && self.n_samples > 1 {
            warn!(
                n_samples = self.n_samples,
                "all items hashed to a single bucket; queries will degrade to a linear scan"
            );
        }
        Ok(self)
    }

    /// Hash new rows with the existing hyperplanes and assign fresh ids.
    ///
    /// Returns the new ids in row order.
    pub fn append_data(&mut self, features: &Matrix) -> Result<Vec<ItemId>> {
        let codes = self.hash_function(features)?;
        let first = self.last_id;
        let ids: Vec<ItemId> = (first..first + codes.len() as ItemId).collect();
        let mut created = 0usize;
        for (code, &id) in codes.iter().zip(&ids) {
            if self.table.insert(code, id) {
                created += 1;
            }
        }
        self.n_samples += ids.len();
        self.last_id += ids.len() as ItemId;
        debug!(
            appended = ids.len(),
            new_keys = created,
            n_samples = self.n_samples,
            n_keys = self.table.len(),
            "appended to LSH index"
        );
        Ok(ids)
    }

    /// Remove ids from the table.
    ///
    /// Ids that are not present are skipped. Returns the ids actually removed,
    /// in input order. Removed ids are never reassigned.
    pub fn remove_data(&mut self, ids: &[ItemId]) -> Result<Vec<ItemId>> {
        self.require_built()?;
        let removed: Vec<ItemId> = ids
            .iter()
            .copied()
            .filter(|&id| self.table.remove(id))
            .collect();
        self.n_samples -= removed.len();
        debug!(
            requested = ids.len(),
            removed = removed.len(),
            n_samples = self.n_samples,
            n_keys = self.table.len(),
            "removed from LSH index"
        );
        Ok(removed)
    }

    /// Codes for each row of `features`, computed with the index's hyperplanes.
    pub fn hash_function(&self, features: &Matrix) -> Result<Vec<BitCode>> {
        let weights = self.check_queries(features)?;
        Ok(features.dot(weights)?.threshold_ge_zero())
    }

    /// Up to `n_neighbors` ids per query row, nearest buckets first.
    pub fn search_knn(&self, queries: &Matrix, n_neighbors: usize) -> Result<Vec<Vec<ItemId>>> {
        if n_neighbors == 0 {
            return Err(IndexError::InvalidParameter(
                "n_neighbors must be greater than 0".to_string(),
            ));
        }
        let weights = self.check_queries(queries)?;
        Ok(self.map_queries(queries, weights, |code| self.knn_one(code, n_neighbors)))
    }

    /// Like [`search_knn`](Self::search_knn), with each id paired with the
    /// Hamming distance between its bucket's code and the query's code.
    pub fn search_knn_with_distances(
        &self,
        queries: &Matrix,
        n_neighbors: usize,
    ) -> Result<Vec<Vec<(ItemId, usize)>>> {
        if n_neighbors == 0 {
            return Err(IndexError::InvalidParameter(
                "n_neighbors must be greater than 0".to_string(),
            ));
        }
        let weights = self.check_queries(queries)?;
        let cap = n_neighbors.min(self.n_samples);
        Ok(self.map_queries(queries, weights, |code| {
            let mut out = Vec::with_capacity(cap);
            for (dist, row) in self.rank_codes(code) {
                if out.len() >= n_neighbors {
                    break;
                }
                let bucket = self.table.bucket(&self.table.codes()[row]);
                out.extend(bucket.iter().map(|&id| (id, dist)));
            }
            out.truncate(n_neighbors);
            out
        }))
    }

    /// All ids whose bucket code is within Hamming distance `radius` of the
    /// query's code, nearest buckets first.
    pub fn search_radius(&self, queries: &Matrix, radius: usize) -> Result<Vec<Vec<ItemId>>> {
        let weights = self.check_queries(queries)?;
        Ok(self.map_queries(queries, weights, |code| self.radius_one(code, radius)))
    }

    fn knn_one(&self, code: &BitCode, n_neighbors: usize) -> Vec<ItemId> {
        // `n_neighbors` is caller-controlled; never reserve more than we hold.
        let mut out = Vec::with_capacity(n_neighbors.min(self.n_samples));
        let mut visited = 0usize;
        for (_, row) in self.rank_codes(code) {
            if out.len() >= n_neighbors {
                break;
            }
            out.extend_from_slice(self.table.bucket(&self.table.codes()[row]));
            visited += 1;
        }
        out.truncate(n_neighbors);
        trace!(buckets = visited, found = out.len(), "knn query");
        out
    }

    fn radius_one(&self, code: &BitCode, radius: usize) -> Vec<ItemId> {
        let mut out = Vec::new();
        for (dist, row) in self.rank_codes(code) {
            if dist > radius {
                break;
            }
            out.extend_from_slice(self.table.bucket(&self.table.codes()[row]));
        }
        trace!(radius, found = out.len(), "radius query");
        out
    }

    /// `(distance, row)` for every stored code, ascending by distance; equal
    /// distances keep bucket-creation order.
    fn rank_codes(&self, code: &BitCode) -> Vec<(usize, usize)> {
        let mut ranked: Vec<(usize, usize)> = self
            .table
            .codes()
            .iter()
            .enumerate()
            .map(|(row, c)| (hamming(code, c), row))
            .collect();
        ranked.sort_by_key(|&(dist, _)| dist);
        ranked
    }

    /// Hash each query row and apply `f`, preserving row order.
    fn map_queries<T, F>(&self, queries: &Matrix, weights: &Matrix, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&BitCode) -> T + Sync + Send,
    {
        let hash_row = |i: usize| {
            let mut projection = vec![0.0; weights.n_cols()];
            project_row_into(queries.row(i), weights, &mut projection);
            f(&BitCode::from_signs(&projection))
        };

        #[cfg(feature = "parallel")]
        {
            (0..queries.n_rows()).into_par_iter().map(hash_row).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (0..queries.n_rows()).map(hash_row).collect()
        }
    }

    fn require_built(&self) -> Result<&Matrix> {
        self.weights.as_ref().ok_or(IndexError::NotBuilt)
    }

    /// Built, and the matrix has `n_features` columns (empty matrices pass).
    fn check_queries(&self, features: &Matrix) -> Result<&Matrix> {
        let weights = self.require_built()?;
        if features.n_rows() > 0 && features.n_cols() != self.n_features {
            return Err(IndexError::ShapeMismatch {
                expected: self.n_features,
                found: features.n_cols(),
            });
        }
        Ok(weights)
    }

    pub fn is_built(&self) -> bool {
        self.weights.is_some()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.table.contains(id)
    }

    pub fn code_length(&self) -> usize {
        self.params.code_length
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of distinct codes (buckets).
    pub fn n_keys(&self) -> usize {
        self.table.len()
    }

    /// Next id to be assigned.
    pub fn last_id(&self) -> ItemId {
        self.last_id
    }

    pub fn hash_table(&self) -> &BucketTable {
        &self.table
    }

    /// Distinct stored codes, in bucket-creation order.
    pub fn hash_codes(&self) -> &[BitCode] {
        self.table.codes()
    }

    /// Hyperplane weights (`n_features x code_length`), once built.
    pub fn weights(&self) -> Option<&Matrix> {
        self.weights.as_ref()
    }

    pub fn random_seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn rng_state(&self) -> &ProjectionRng {
        &self.rng
    }

    pub fn params(&self) -> &LSHParams {
        &self.params
    }

    pub fn stats(&self) -> LSHStats {
        let n_keys = self.table.len();
        let code_words = self.params.code_length.div_ceil(64);
        let size_bytes = self.weights.as_ref().map_or(0, |w| w.as_slice().len())
            * std::mem::size_of::<f64>()
            // code list plus one key per bucket and per id
            + (2 * n_keys + self.n_samples) * code_words * std::mem::size_of::<u64>()
            + 2 * self.n_samples * std::mem::size_of::<ItemId>();
        LSHStats {
            n_samples: self.n_samples,
            n_keys,
            n_features: self.n_features,
            code_length: self.params.code_length,
            max_bucket_len: self.table.max_bucket_len(),
            mean_bucket_len: if n_keys == 0 {
                0.0
            } else {
                self.n_samples as f64 / n_keys as f64
            },
            size_bytes,
        }
    }

    /// Capture the full state, including the generator's stream position.
    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            params: self.params.clone(),
            code_length: self.params.code_length,
            n_samples: self.n_samples,
            n_features: self.n_features,
            n_keys: self.table.len(),
            last_id: self.last_id,
            weight_matrix: self.weights.clone(),
            buckets: self.table.to_entries(),
            hash_codes: self.table.codes().to_vec(),
            random_seed: self.rng.seed(),
            generator_state: self.rng.clone(),
        }
    }

    /// Restore an index from a snapshot, checking that its parts agree.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self> {
        let IndexSnapshot {
            params,
            code_length,
            n_samples,
            n_features,
            n_keys,
            last_id,
            weight_matrix,
            buckets,
            hash_codes,
            random_seed,
            generator_state,
        } = snapshot;
        params.validate()?;
        let bad = |msg: String| Err(IndexError::Snapshot(msg));

        if code_length != params.code_length {
            return bad(format!(
                "code_length {code_length} disagrees with params ({})",
                params.code_length
            ));
        }
        if random_seed != generator_state.seed() || params.random_seed != Some(random_seed) {
            return bad("random_seed disagrees with generator state".to_string());
        }
        match &weight_matrix {
            Some(w) => {
                if !w.is_consistent() || w.n_rows() != n_features || w.n_cols() != code_length {
                    return bad(format!("weight matrix is not {n_features}x{code_length}"));
                }
            }
            None => {
                if n_samples != 0 || !buckets.is_empty() || last_id != 0 {
                    return bad("unbuilt index with data".to_string());
                }
            }
        }

        let table = BucketTable::from_entries(buckets, code_length).map_err(IndexError::Snapshot)?;
        if table.len() != n_keys || hash_codes.as_slice() != table.codes() {
            return bad(format!(
                "n_keys {n_keys} and hash_codes disagree with {} buckets",
                table.len()
            ));
        }
        if table.num_items() != n_samples {
            return bad(format!(
                "n_samples {n_samples} disagrees with {} stored ids",
                table.num_items()
            ));
        }
        if let Some((_, ids)) = table.iter().find(|(_, ids)| ids.iter().any(|&id| id >= last_id)) {
            return bad(format!("bucket holds ids {ids:?} at or past last_id {last_id}"));
        }

        Ok(Self {
            params,
            n_samples,
            n_features,
            last_id,
            weights: weight_matrix,
            table,
            rng: generator_state,
        })
    }
}
