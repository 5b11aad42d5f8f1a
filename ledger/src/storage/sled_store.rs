//! sled-backed [`KvStore`].
//!
//! Each store is one named sled tree. The ledger keeps its authoritative
//! records and its vault rows in separate trees of the same database, so
//! the vault can be dropped and rebuilt without touching ledger state.
//!
//! Batches go through `Tree::apply_batch`, which sled applies atomically.

use std::path::Path;

use sled::{Batch, Db, Tree};

use super::{BatchOp, KvStore, WriteBatch};
use crate::error::LedgerResult;

/// One sled tree plus the database handle used for flushing.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    /// Open (or create) the database at `path` and use its default tree.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let db = sled::open(path)?;
        let tree = (*db).clone();
        Ok(Self { db, tree })
    }

    /// A named tree inside an already-open database.
    pub fn with_tree(db: &Db, name: &str) -> LedgerResult<Self> {
        Ok(Self {
            db: db.clone(),
            tree: db.open_tree(name)?,
        })
    }

    /// Database that vanishes when the last handle drops. For tests.
    pub fn temporary_db() -> LedgerResult<Db> {
        Ok(sled::Config::new().temporary(true).open()?)
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        for item in self.tree.scan_prefix(prefix) {
            let (k, v) = item?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    fn apply_batch(&self, batch: WriteBatch) -> LedgerResult<()> {
        let mut sled_batch = Batch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(key, value) => sled_batch.insert(key, value),
                BatchOp::Delete(key) => sled_batch.remove(key),
            }
        }
        self.tree.apply_batch(sled_batch)?;
        Ok(())
    }

    fn flush(&self) -> LedgerResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trees_are_independent() {
        let db = SledStore::temporary_db().unwrap();
        let ledger = SledStore::with_tree(&db, "ledger").unwrap();
        let vault = SledStore::with_tree(&db, "vault").unwrap();

        ledger.put(b"TB#x", b"1").unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(vault.is_empty());
        assert_eq!(vault.get(b"TB#x").unwrap(), None);
    }

    #[test]
    fn batch_and_prefix_scan() {
        let db = SledStore::temporary_db().unwrap();
        let store = SledStore::with_tree(&db, "ledger").unwrap();

        let mut batch = WriteBatch::new();
        batch.put("TN#b", "2");
        batch.put("TN#a", "1");
        batch.put("TX#a", "3");
        store.apply_batch(batch).unwrap();

        let scanned = store.scan_prefix(b"TN#").unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0], (b"TN#a".to_vec(), b"1".to_vec()));

        let mut batch = WriteBatch::new();
        batch.delete("TN#a");
        batch.put("TX#b", "4");
        store.apply_batch(batch).unwrap();
        assert_eq!(store.get(b"TN#a").unwrap(), None);
        assert_eq!(store.len(), 3);
        store.flush().unwrap();
    }

    #[test]
    fn reopen_persists_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledStore::open(dir.path()).unwrap();
            store.put(b"k", b"v").unwrap();
            store.flush().unwrap();
        }
        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
