//! Bucket table: code key -> item ids.
//!
//! Besides the buckets themselves the table keeps the list of distinct codes
//! currently present, in the order their buckets were created. Queries rank
//! that list by Hamming distance, and ties keep this order.
//!
//! A bucket exists only while it holds at least one id. Removing the last id
//! deletes the bucket and its entry in the code list in the same call.

use super::code::{decode_key, encode_row, hamming, BitCode, HashKey};
use super::ItemId;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketTable {
    buckets: HashMap<HashKey, Vec<ItemId>>,
    /// Distinct codes in bucket-creation order.
    codes: Vec<BitCode>,
    /// Reverse index: id -> key of the bucket holding it.
    owner: HashMap<ItemId, HashKey>,
}

impl BucketTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to the bucket for `code`, creating the bucket if needed.
    ///
    /// Returns `true` if a new bucket was created.
    pub fn insert(&mut self, code: &BitCode, id: ItemId) -> bool {
        debug_assert!(!self.owner.contains_key(&id), "id {id} inserted twice");
        let key = encode_row(code);
        let created = match self.buckets.get_mut(&key) {
            Some(bucket) => {
                bucket.push(id);
                false
            }
            None => {
                self.buckets.insert(key.clone(), vec![id]);
                self.codes.push(code.clone());
                true
            }
        };
        self.owner.insert(id, key);
        created
    }

    /// Remove `id` from its bucket.
    ///
    /// Returns `false` if the id is not in the table. An emptied bucket is
    /// dropped together with its code.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(key) = self.owner.remove(&id) else {
            return false;
        };
        // Every owned id sits in exactly the bucket its owner entry names.
        let bucket = self.buckets.get_mut(&key);
        debug_assert!(bucket.is_some(), "owner of id {id} names a missing bucket");
        let Some(bucket) = bucket else {
            return true;
        };
        let pos = bucket.iter().position(|&x| x == id);
        debug_assert!(pos.is_some(), "id {id} is missing from its bucket");
        if let Some(pos) = pos {
            bucket.remove(pos);
        }
        if bucket.is_empty() {
            self.buckets.remove(&key);
            self.evict_code(&key);
        }
        true
    }

    fn evict_code(&mut self, key: &HashKey) {
        let code = decode_key(key);
        if let Some(row) = self.codes.iter().position(|c| hamming(c, &code) == 0) {
            self.codes.remove(row);
        }
    }

    /// Ids stored under `key`, in insertion order.
    pub fn get(&self, key: &HashKey) -> Option<&[ItemId]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Ids stored under `code`; empty if there is no such bucket.
    pub fn bucket(&self, code: &BitCode) -> &[ItemId] {
        self.get(&encode_row(code)).unwrap_or(&[])
    }

    /// Distinct codes, in bucket-creation order.
    pub fn codes(&self) -> &[BitCode] {
        &self.codes
    }

    /// `(code, ids)` pairs in bucket-creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&BitCode, &[ItemId])> + '_ {
        self.codes.iter().map(move |c| (c, self.bucket(c)))
    }

    /// Number of buckets (distinct keys).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of ids across all buckets.
    pub fn num_items(&self) -> usize {
        self.owner.len()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.owner.contains_key(&id)
    }

    /// Code of the bucket holding `id`.
    pub fn code_of(&self, id: ItemId) -> Option<BitCode> {
        self.owner.get(&id).map(decode_key)
    }

    /// Size of the largest bucket (0 when empty).
    pub fn max_bucket_len(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Owned `(code, ids)` pairs in bucket-creation order.
    pub(crate) fn to_entries(&self) -> Vec<(BitCode, Vec<ItemId>)> {
        self.iter().map(|(c, ids)| (c.clone(), ids.to_vec())).collect()
    }

    /// Rebuild from `(code, ids)` pairs, keeping their order as bucket-creation
    /// order. Rejects empty buckets, repeated codes, repeated ids, and codes
    /// that are not `code_length` bits.
    pub(crate) fn from_entries(
        entries: Vec<(BitCode, Vec<ItemId>)>,
        code_length: usize,
    ) -> Result<Self, String> {
        let mut table = Self::new();
        for (code, ids) in entries {
            if code.len() != code_length || !code.is_canonical() {
                return Err(format!("bucket code is not a {code_length}-bit code"));
            }
            if ids.is_empty() {
                return Err(format!("empty bucket for code {code}"));
            }
            let key = encode_row(&code);
            if table.buckets.contains_key(&key) {
                return Err(format!("duplicate bucket for code {code}"));
            }
            for &id in &ids {
                if table.owner.insert(id, key.clone()).is_some() {
                    return Err(format!("id {id} appears in more than one bucket"));
                }
            }
            table.buckets.insert(key, ids);
            table.codes.push(code);
        }
        Ok(table)
    }
}
