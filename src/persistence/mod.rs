//! Snapshot persistence for [`LSHIndex`](crate::LSHIndex).
//!
//! The index state (parameters, hyperplanes, buckets, distinct codes, id
//! counter and generator stream) is captured as an [`IndexSnapshot`] and
//! encoded with `postcard` behind a small magic/version header.
//!
//! ```rust
//! use hyperlsh::{persistence, LSHIndex, Matrix};
//!
//! let data = Matrix::from_rows(&[[0.5, -1.0], [0.25, 2.0]])?;
//! let mut index = LSHIndex::new(16, Some(1))?;
//! index.build_index(&data)?;
//!
//! let blob = persistence::export_bytes(&index)?;
//! let restored = persistence::import_bytes(&blob)?;
//! assert_eq!(restored.search_knn(&data, 1)?, index.search_knn(&data, 1)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod format;
pub mod snapshot;

pub use error::{PersistenceError, PersistenceResult};
pub use snapshot::{export_bytes, import_bytes, load, read_from, save, write_to, IndexSnapshot};
