//! hyperlsh: random-hyperplane LSH for approximate nearest neighbor search.
//!
//! Dense `f64` vectors are projected onto `code_length` random hyperplanes and
//! reduced to sign bits. Items sharing a code share a bucket; queries rank every
//! stored code by Hamming distance and read buckets nearest-first.
//!
//! - [`matrix`]: dense row-major matrices and the projection kernels
//! - [`hash`]: codes, bucket table, generator, and the [`LSHIndex`] itself
//! - [`distance`]: exact Euclidean distances for re-ranking candidates
//! - [`persistence`]: snapshot export/import and file save/load
//!
//! ```rust
//! use hyperlsh::{LSHIndex, Matrix};
//!
//! let data = Matrix::from_rows(&[[1.0, 0.0], [0.9, 0.1], [-1.0, 0.3]])?;
//! let mut index = LSHIndex::new(64, Some(42))?;
//! index.build_index(&data)?;
//!
//! let ids = index.append_data(&Matrix::from_rows(&[[0.95, 0.05]])?)?;
//! assert_eq!(ids, vec![3]);
//!
//! let hits = index.search_radius(&Matrix::from_rows(&[[0.95, 0.05]])?, 0)?;
//! assert!(hits[0].contains(&3));
//! # Ok::<(), hyperlsh::IndexError>(())
//! ```
//!
//! # Critical Nuances
//!
//! ## Hamming ranking is an angle proxy
//!
//! Code distance estimates the *angle* between vectors, not their Euclidean
//! distance. Two parallel vectors of very different norms hash identically.
//! If magnitude matters, re-rank candidates with [`distance::rerank`].
//!
//! ## Code length trades buckets for precision
//!
//! Short codes put many items in each bucket (coarse ranking); long codes
//! spread items over many buckets, and since every query scans all distinct
//! codes, query cost grows with the number of buckets.

pub mod distance;
pub mod error;
pub mod hash;
pub mod matrix;
pub mod persistence;

// Re-exports
pub use error::{IndexError, Result};
pub use hash::{
    BitCode, BucketTable, HashKey, ItemId, LSHIndex, LSHParams, LSHStats, RebuildPolicy,
};
pub use matrix::Matrix;
