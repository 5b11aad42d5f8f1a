//! In-memory [`KvStore`]. Same ordering and atomicity guarantees as the
//! sled store, none of the durability.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{BatchOp, KvStore, WriteBatch};
use crate::error::LedgerResult;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply_batch(&self, batch: WriteBatch) -> LedgerResult<()> {
        // One write lock for the whole batch, so readers see all or nothing.
        let mut entries = self.entries.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(key, value) => {
                    entries.insert(key, value);
                }
                BatchOp::Delete(key) => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_and_overwrite() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.put(b"k", b"v1").unwrap();
        store.put(b"k", b"v2").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b"missing").unwrap(), None);
    }

    #[test]
    fn scan_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put("TB#b", "2");
        batch.put("TB#a", "1");
        batch.put("TE#a#1", "x");
        batch.put("TA", "y");
        store.apply_batch(batch).unwrap();

        let keys: Vec<_> = store
            .scan_prefix(b"TB#")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"TB#a".to_vec(), b"TB#b".to_vec()]);
    }

    #[test]
    fn later_puts_in_batch_win() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put("k", "first");
        batch.put("k", "second");
        store.apply_batch(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn delete_then_put_in_one_batch() {
        let store = MemoryStore::new();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();

        let mut batch = WriteBatch::new();
        batch.delete("a");
        batch.delete("b");
        batch.put("b", "3");
        batch.delete("missing");
        store.apply_batch(batch).unwrap();

        assert_eq!(store.get(b"a").unwrap(), None);
        assert_eq!(store.get(b"b").unwrap(), Some(b"3".to_vec()));
        assert_eq!(store.len(), 1);
    }
}
