//! Packed binary codes and their bucket keys.
//!
//! A [`BitCode`] stores `L` sign bits packed little-endian into `ceil(L/64)`
//! `u64` words (bit `j` lives in word `j / 64` at position `j % 64`). Bits past
//! `L` in the last word are always zero, so derived equality and hashing are
//! exact and Hamming distance is a word-wise XOR + popcount.
//!
//! [`HashKey`] is the bucket-table key. It is the same fixed-width packing,
//! so [`encode_row`] / [`decode_key`] are lossless and two distinct codes can
//! never share a key.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Inline capacity covers the default 256-bit code without a heap allocation.
type Words = SmallVec<[u64; 4]>;

#[inline]
fn n_words(len: usize) -> usize {
    len.div_ceil(64)
}

/// Fixed-length binary code, one bit per hyperplane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitCode {
    len: usize,
    words: Words,
}

impl BitCode {
    /// All-zero code of `len` bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            words: SmallVec::from_elem(0, n_words(len)),
        }
    }

    /// Bit `j` is set iff `f(j)` is true.
    pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> bool) -> Self {
        let mut code = Self::zeros(len);
        for j in 0..len {
            if f(j) {
                code.words[j / 64] |= 1u64 << (j % 64);
            }
        }
        code
    }

    /// Bit `j` is set iff `projection[j] >= 0`.
    pub fn from_signs(projection: &[f64]) -> Self {
        Self::from_fn(projection.len(), |j| projection[j] >= 0.0)
    }

    pub fn from_bools(bits: &[bool]) -> Self {
        Self::from_fn(bits.len(), |j| bits[j])
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value of bit `j`.
    ///
    /// # Panics
    ///
    /// Panics if `j >= len()`.
    #[inline]
    pub fn get(&self, j: usize) -> bool {
        assert!(j < self.len, "bit {j} out of range for {}-bit code", self.len);
        (self.words[j / 64] >> (j % 64)) & 1 == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |j| (self.words[j / 64] >> (j % 64)) & 1 == 1)
    }

    pub fn to_bools(&self) -> Vec<bool> {
        self.iter().collect()
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Packed words, little-endian bit order.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Hamming distance to another code of the same length.
    #[inline]
    pub fn hamming_distance(&self, other: &BitCode) -> usize {
        debug_assert_eq!(self.len, other.len, "hamming distance of unequal codes");
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// Zero bits past `len` hold, and the word count matches.
    pub(crate) fn is_canonical(&self) -> bool {
        if self.words.len() != n_words(self.len) {
            return false;
        }
        match (self.len % 64, self.words.last()) {
            (0, _) | (_, None) => true,
            (tail, Some(last)) => last >> tail == 0,
        }
    }
}

impl fmt::Display for BitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Bucket-table key for a [`BitCode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashKey {
    len: usize,
    words: Words,
}

impl HashKey {
    /// Code length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encode a code as its bucket key.
#[inline]
pub fn encode_row(code: &BitCode) -> HashKey {
    HashKey {
        len: code.len,
        words: code.words.clone(),
    }
}

/// Exact inverse of [`encode_row`].
#[inline]
pub fn decode_key(key: &HashKey) -> BitCode {
    BitCode {
        len: key.len,
        words: key.words.clone(),
    }
}

/// Number of differing bit positions, in `0..=a.len()`.
#[inline]
pub fn hamming(a: &BitCode, b: &BitCode) -> usize {
    a.hamming_distance(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bools_round_trip() {
        let bits = [true, false, true, true, false];
        let code = BitCode::from_bools(&bits);
        assert_eq!(code.len(), 5);
        assert_eq!(code.to_bools(), bits.to_vec());
        assert_eq!(code.count_ones(), 3);
        assert_eq!(code.to_string(), "10110");
    }

    #[test]
    fn codes_spanning_words() {
        let code = BitCode::from_fn(130, |j| j == 0 || j == 64 || j == 129);
        assert_eq!(code.words().len(), 3);
        assert!(code.get(0) && code.get(64) && code.get(129));
        assert!(!code.get(63) && !code.get(128));
        assert!(code.is_canonical());
    }

    #[test]
    fn key_round_trip_is_exact() {
        let code = BitCode::from_fn(256, |j| j % 3 == 0);
        let key = encode_row(&code);
        assert_eq!(key.len(), 256);
        assert_eq!(decode_key(&key), code);
    }

    #[test]
    fn distinct_codes_have_distinct_keys() {
        let a = BitCode::from_fn(70, |j| j == 69);
        let b = BitCode::from_fn(70, |j| j == 5);
        assert_ne!(encode_row(&a), encode_row(&b));
    }

    #[test]
    fn hamming_bounds() {
        let a = BitCode::zeros(100);
        let b = BitCode::from_fn(100, |_| true);
        assert_eq!(hamming(&a, &a), 0);
        assert_eq!(hamming(&a, &b), 100);
        let c = BitCode::from_fn(100, |j| j < 7);
        assert_eq!(hamming(&a, &c), 7);
        assert_eq!(hamming(&c, &b), 93);
    }

    #[test]
    #[should_panic]
    fn get_out_of_range_panics() {
        BitCode::zeros(8).get(8);
    }

    #[test]
    fn non_canonical_tail_detected() {
        let mut code = BitCode::zeros(3);
        code.words[0] = 1 << 5;
        assert!(!code.is_canonical());
    }
}
