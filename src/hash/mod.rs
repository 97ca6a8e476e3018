//! Random-hyperplane locality sensitive hashing.
//!
//! The core idea of LSH: **design hash functions where similar items collide
//! more often than dissimilar ones**. For random hyperplanes (Charikar 2002):
//!
//! ```text
//! P[sign(r·a) = sign(r·b)] = 1 - θ(a,b)/π
//! ```
//!
//! where `r` has i.i.d. normal entries and θ is the angle between `a` and `b`.
//! Concatenating `L` such signs gives an `L`-bit code whose Hamming distance
//! to another code estimates the angle between the underlying vectors.
//!
//! ## Pipeline
//!
//! 1. [`random_projection`]: draw a `d x L` weight matrix from a seeded
//!    generator (Box–Muller normals, fixed draw order).
//! 2. Project each row and threshold at `>= 0` into a [`BitCode`].
//! 3. [`code`]: pack the code into a [`HashKey`] (lossless, collision-free).
//! 4. [`hash_table`]: group item ids by key, tracking the distinct codes.
//! 5. [`search`]: rank all distinct codes by Hamming distance to a query code
//!    and read buckets in that order.
//!
//! This is a single-table index that scans *all* distinct codes per query,
//! so it never misses a populated bucket; its cost grows with the number of
//! distinct codes rather than the number of items.
//!
//! ## References
//!
//! - Charikar (2002). "Similarity estimation techniques from rounding algorithms."
//! - Indyk & Motwani (1998). "Approximate nearest neighbors: towards removing
//!   the curse of dimensionality."

pub mod code;
pub mod hash_table;
pub mod random_projection;
pub mod search;

/// Item identifier. Assigned sequentially from 0 and never reused.
pub type ItemId = u64;

pub use code::{decode_key, encode_row, hamming, BitCode, HashKey};
pub use hash_table::BucketTable;
pub use random_projection::{rand_normal, ProjectionRng};
pub use search::{
    LSHIndex, LSHParams, LSHStats, RebuildPolicy, DEFAULT_CODE_LENGTH, DEFAULT_N_NEIGHBORS,
    DEFAULT_RADIUS,
};
