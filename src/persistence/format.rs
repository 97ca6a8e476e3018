//! On-disk framing for index snapshots.
//!
//! ```text
//! +-------+---------+-------------------------+
//! | magic | version | postcard(IndexSnapshot) |
//! | 4 B   | u32 LE  | variable                |
//! +-------+---------+-------------------------+
//! ```
//!
//! The header lets a reader reject foreign files and future formats before
//! attempting to decode the body.

use crate::persistence::error::{PersistenceError, PersistenceResult};

/// Magic bytes for snapshot blobs.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"HLSH";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Write the header for the current format version.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&SNAPSHOT_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
}

/// Validate the header and return the body.
pub fn split_header(bytes: &[u8]) -> PersistenceResult<&[u8]> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistenceError::Format(format!(
            "snapshot too short: {} bytes",
            bytes.len()
        )));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[..4] != SNAPSHOT_MAGIC {
        return Err(PersistenceError::Format(format!(
            "bad magic bytes {:?}",
            &header[..4]
        )));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(PersistenceError::Format(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        )));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let mut buf = Vec::new();
        write_header(&mut buf);
        buf.extend_from_slice(b"body");
        assert_eq!(split_header(&buf).unwrap(), b"body");
    }

    #[test]
    fn rejects_short_and_foreign_input() {
        assert!(matches!(
            split_header(b"HLS"),
            Err(PersistenceError::Format(_))
        ));
        let mut buf = b"NOPE".to_vec();
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        assert!(matches!(split_header(&buf), Err(PersistenceError::Format(_))));
    }

    #[test]
    fn rejects_future_version() {
        let mut buf = SNAPSHOT_MAGIC.to_vec();
        buf.extend_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        let err = split_header(&buf).unwrap_err();
        assert!(err.to_string().contains("unsupported format version"));
    }
}
