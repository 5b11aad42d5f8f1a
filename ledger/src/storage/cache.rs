//! Block change log.
//!
//! Every ledger write made while executing a block is also appended, in
//! order, as a [`UtxoDbCache`] entry. The BLAKE3 root over the encoded
//! entries goes into the block header, so two nodes that executed the same
//! block must have made byte-identical writes in the same order. Vault rows
//! are node-local and never appear here.

use serde::{Deserialize, Serialize};

use crate::codec::{FieldReader, FieldWriter, Record};
use crate::error::LedgerResult;
use crate::hash::blake3_hash_multi;

/// One `(key, value)` write. The value is the encoded record, opaque here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoDbCache {
    key: String,
    #[serde(with = "hex::serde")]
    value: Vec<u8>,
}

impl UtxoDbCache {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl Record for UtxoDbCache {
    const NAME: &'static str = "UTXODBCache";
    const FIELD_COUNT: usize = 2;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.str(&self.key);
        w.bytes(&self.value);
        Ok(())
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        Ok(Self {
            key: r.string()?,
            value: r.bytes()?,
        })
    }
}

/// Content hash of a block's ordered change log.
///
/// Each entry's encoding is self-delimiting, so hashing the encodings back
/// to back is unambiguous.
pub fn cache_root(entries: &[UtxoDbCache]) -> LedgerResult<[u8; 32]> {
    let encoded = entries
        .iter()
        .map(UtxoDbCache::encode)
        .collect::<LedgerResult<Vec<_>>>()?;
    Ok(blake3_hash_multi(encoded.iter().map(Vec::as_slice)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(k: &str, v: &[u8]) -> UtxoDbCache {
        UtxoDbCache::new(k, v.to_vec())
    }

    #[test]
    fn codec_round_trip() {
        for e in [entry("", b""), entry("TB#x_0", &[0, 1, 2, 255])] {
            assert_eq!(UtxoDbCache::decode(&e.encode().unwrap()).unwrap(), e);
        }
    }

    #[test]
    fn root_depends_on_order() {
        let a = entry("a", b"1");
        let b = entry("b", b"2");
        let ab = cache_root(&[a.clone(), b.clone()]).unwrap();
        let ba = cache_root(&[b, a]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn root_is_not_fooled_by_boundary_shifts() {
        let split_one = cache_root(&[entry("ab", b"c")]).unwrap();
        let split_two = cache_root(&[entry("a", b"bc")]).unwrap();
        assert_ne!(split_one, split_two);
    }

    #[test]
    fn identical_logs_have_identical_roots() {
        let log = vec![entry("TB#k", b"base"), entry("TN#k", b"idx")];
        assert_eq!(cache_root(&log).unwrap(), cache_root(&log.clone()).unwrap());
    }

    #[test]
    fn json_value_is_hex() {
        let json = serde_json::to_string(&entry("k", &[0xde, 0xad])).unwrap();
        assert!(json.contains("\"dead\""));
    }
}
