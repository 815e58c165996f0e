//! Canonical serialization for stable fingerprints.
//!
//! Used for rule-set fingerprints and reachability memo keys. Inputs must
//! serialize deterministically: struct fields in declaration order, vectors
//! in index order, and `BTreeMap` rather than `HashMap` for maps.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Serialization of the crate's own types cannot fail (no non-string map
/// keys, no custom serializers); a failure yields an empty buffer.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// xxh64 of the canonical bytes.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// [`canonical_hash`] as 16 lowercase hex digits.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
