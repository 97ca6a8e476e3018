//! Whole-index snapshots.
//!
//! An [`IndexSnapshot`] is a plain-data copy of everything an [`LSHIndex`]
//! holds, including the generator's stream position. Restoring one and
//! running the same queries gives identical results, and any later draws
//! continue the original sequence.

use crate::hash::{BitCode, ItemId, LSHIndex, LSHParams, ProjectionRng};
use crate::matrix::Matrix;
use crate::persistence::error::PersistenceResult;
use crate::persistence::format::{split_header, write_header};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Serializable state of an [`LSHIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub params: LSHParams,
    pub code_length: usize,
    pub n_samples: usize,
    pub n_features: usize,
    pub n_keys: usize,
    pub last_id: ItemId,
    /// `None` if the index was never built.
    pub weight_matrix: Option<Matrix>,
    /// `(code, ids)` per bucket, in bucket-creation order.
    pub buckets: Vec<(BitCode, Vec<ItemId>)>,
    pub hash_codes: Vec<BitCode>,
    pub random_seed: u64,
    pub generator_state: ProjectionRng,
}

/// Encode an index as a self-describing byte blob.
pub fn export_bytes(index: &LSHIndex) -> PersistenceResult<Vec<u8>> {
    let mut out = Vec::new();
    write_header(&mut out);
    let body = postcard::to_allocvec(&index.to_snapshot())?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a blob produced by [`export_bytes`].
pub fn import_bytes(bytes: &[u8]) -> PersistenceResult<LSHIndex> {
    let body = split_header(bytes)?;
    let snapshot: IndexSnapshot = postcard::from_bytes(body)?;
    Ok(LSHIndex::from_snapshot(snapshot)?)
}

/// Write an index blob to `writer`.
pub fn write_to<W: Write>(index: &LSHIndex, mut writer: W) -> PersistenceResult<()> {
    writer.write_all(&export_bytes(index)?)?;
    writer.flush()?;
    Ok(())
}

/// Read an index blob from `reader` (to end of stream).
pub fn read_from<R: Read>(mut reader: R) -> PersistenceResult<LSHIndex> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    import_bytes(&bytes)
}

/// Save an index to `path`.
///
/// Writes a sibling temp file, syncs it, then renames over `path`, so a crash
/// never leaves a half-written snapshot at `path`.
pub fn save(index: &LSHIndex, path: impl AsRef<Path>) -> PersistenceResult<()> {
    let path = path.as_ref();
    let bytes = export_bytes(index)?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);
    {
        let mut file = File::create(tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(tmp, path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved LSH index");
    Ok(())
}

/// Load an index saved with [`save`].
pub fn load(path: impl AsRef<Path>) -> PersistenceResult<LSHIndex> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let index = import_bytes(&bytes)?;
    debug!(
        path = %path.display(),
        n_samples = index.n_samples(),
        n_keys = index.n_keys(),
        "loaded LSH index"
    );
    Ok(index)
}
