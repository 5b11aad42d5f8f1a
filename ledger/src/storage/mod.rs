//! # Storage
//!
//! The ledger only needs three things from a key-value store: point reads,
//! ordered prefix scans, and atomic batch writes. [`KvStore`] is exactly
//! that, with two implementations:
//!
//! ```text
//! memory.rs      — MemoryStore, a BTreeMap behind a RwLock (tests, tooling)
//! sled_store.rs  — SledStore, one sled tree per store (nodes)
//! keys.rs        — textual key derivation for every record type
//! cache.rs       — UtxoDbCache change-log entries and their block root
//! ```
//!
//! Reads during execution go through [`StateRead`], which both committed
//! stores (via [`StoreView`]) and in-flight transaction overlays implement.

pub mod cache;
pub mod keys;
pub mod memory;
pub mod sled_store;

pub use cache::{cache_root, UtxoDbCache};
pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::codec::Record;
use crate::error::LedgerResult;

// ---------------------------------------------------------------------------
// WriteBatch
// ---------------------------------------------------------------------------

/// One write in a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Ordered set of writes applied atomically. Later writes to the same key
/// win.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put(key.into(), value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete(key.into()));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

// ---------------------------------------------------------------------------
// KvStore
// ---------------------------------------------------------------------------

/// Minimal key-value store contract.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply every write in `batch` or none of them.
    fn apply_batch(&self, batch: WriteBatch) -> LedgerResult<()>;

    fn put(&self, key: &[u8], value: &[u8]) -> LedgerResult<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.apply_batch(batch)
    }

    /// Make previous writes durable. No-op for volatile stores.
    fn flush(&self) -> LedgerResult<()> {
        Ok(())
    }

    /// Number of keys stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// StateRead
// ---------------------------------------------------------------------------

/// Read access to ledger state by textual key.
pub trait StateRead {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;
}

/// Committed-state view over a store.
pub struct StoreView<'a, S: ?Sized>(pub &'a S);

impl<S: KvStore + ?Sized> StateRead for StoreView<'_, S> {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        self.0.get(key.as_bytes())
    }
}

/// Read and decode one record, `None` if the key is absent.
pub fn read_record<R: Record, V: StateRead + ?Sized>(
    view: &V,
    key: &str,
) -> LedgerResult<Option<R>> {
    match view.read(key)? {
        Some(bytes) => Ok(Some(R::decode(&bytes)?)),
        None => Ok(None),
    }
}

/// Decode every record under a prefix, ascending key order.
pub fn scan_records<R: Record, S: KvStore + ?Sized>(
    store: &S,
    prefix: &str,
) -> LedgerResult<Vec<(String, R)>> {
    store
        .scan_prefix(prefix.as_bytes())?
        .into_iter()
        .map(|(k, v)| Ok((String::from_utf8_lossy(&k).into_owned(), R::decode(&v)?)))
        .collect()
}
