//! # Ledger
//!
//! The facade everything else talks to. A [`Ledger`] owns two stores of the
//! same kind:
//!
//! | Store   | Contents                                   | Authoritative |
//! |---------|--------------------------------------------|---------------|
//! | `state` | `TB#` `TE#` `TN#` `TX#` records, height    | yes           |
//! | `vault` | owner-indexed `Vault` rows, `AccountRecord`| no (derived)  |
//!
//! ## Block lifecycle
//!
//! ```text
//! begin_block(H) ─▶ apply_transaction()* ─▶ commit_block()
//!       │                                         │
//!   takes the writer lock             one atomic batch to `state`,
//!   H must exceed the last            then vault rows + cache updates
//!   committed height                  for registered owners
//! ```
//!
//! Dropping a [`BlockExecutor`] instead of committing it abandons the block.
//!
//! ## Vault freshness
//!
//! Vault rows and the in-memory cache are updated after each commit, but
//! only for owners that were registered at that point. Registering an owner
//! later scans every `TokenBase` once to catch up. If a commit ever fails to
//! index, the cache is dropped and [`Ledger::rebuild_vault`] repairs the
//! rows.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;

use parking_lot::{Mutex, RwLock};
use primitive_types::{H256, U256};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::Record;
use crate::config::{LedgerConfig, ACCOUNT_RECORD_KEY, META_LATEST_HEIGHT, TOKEN_BASE_PREFIX};
use crate::error::{LedgerError, LedgerResult};
use crate::execution::{self, AppliedTransaction, BlockExecutor};
use crate::storage::{
    cache_root, keys, read_record, scan_records, KvStore, MemoryStore, SledStore, StoreView,
    UtxoDbCache, WriteBatch,
};
use crate::token::{
    h256_to_hex, BlockHeight, Token, TokenBase, TokenExt, TokenExtOnBlockNum, TokenKey,
    TokenState,
};
use crate::transaction::UtxoTx;
use crate::vault::{
    self, AccountRecord, QueryUtxoParam, Selection, TokenRecord, Vault, VaultCache,
};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Summary of a committed block.
#[derive(Clone, Debug, Serialize)]
pub struct BlockCommit {
    pub height: BlockHeight,
    /// BLAKE3 root over the ordered change log.
    #[serde(with = "hex::serde")]
    pub cache_root: [u8; 32],
    pub entries: Vec<UtxoDbCache>,
    pub transactions: Vec<AppliedTransaction>,
}

impl BlockCommit {
    pub fn cache_root_hex(&self) -> String {
        hex::encode(self.cache_root)
    }
}

/// One step of a token's lineage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackedTx {
    pub tx_hash: H256,
    pub utxo_tx: UtxoTx,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// UTXO token ledger over a pair of key-value stores.
///
/// Reads are lock-free with respect to block execution: they see the last
/// committed block. Writes are serialized through one writer lock held by
/// the active [`BlockExecutor`].
pub struct Ledger<S: KvStore = SledStore> {
    state: S,
    vault_store: S,
    config: LedgerConfig,
    writer: Mutex<()>,
    cache: RwLock<VaultCache>,
    accounts: RwLock<AccountRecord>,
}

impl Ledger<SledStore> {
    /// Open (or create) a ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P, config: LedgerConfig) -> LedgerResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db, config)
    }

    /// sled database that is deleted when the ledger drops.
    pub fn open_temporary(config: LedgerConfig) -> LedgerResult<Self> {
        let db = SledStore::temporary_db()?;
        Self::from_db(&db, config)
    }

    fn from_db(db: &sled::Db, config: LedgerConfig) -> LedgerResult<Self> {
        Self::with_stores(
            SledStore::with_tree(db, "ledger")?,
            SledStore::with_tree(db, "vault")?,
            config,
        )
    }
}

impl Ledger<MemoryStore> {
    pub fn in_memory(config: LedgerConfig) -> LedgerResult<Self> {
        Self::with_stores(MemoryStore::new(), MemoryStore::new(), config)
    }
}

impl<S: KvStore> Ledger<S> {
    /// Build a ledger over existing stores, restoring registered accounts.
    pub fn with_stores(state: S, vault_store: S, config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        let accounts: AccountRecord =
            read_record(&StoreView(&vault_store), ACCOUNT_RECORD_KEY)?.unwrap_or_default();
        info!(
            accounts = accounts.len(),
            records = state.len(),
            "ledger opened"
        );
        Ok(Self {
            state,
            vault_store,
            config,
            writer: Mutex::new(()),
            cache: RwLock::new(VaultCache::new()),
            accounts: RwLock::new(accounts),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn view(&self) -> StoreView<'_, S> {
        StoreView(&self.state)
    }

    // -- Blocks -------------------------------------------------------------

    /// Height of the last committed block, `None` for a fresh ledger.
    pub fn latest_height(&self) -> LedgerResult<Option<BlockHeight>> {
        let Some(raw) = self.state.get(META_LATEST_HEIGHT.as_bytes())? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
            LedgerError::malformed("LatestHeight", format!("expected 8 bytes, got {}", raw.len()))
        })?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    /// Start executing block `height`.
    ///
    /// Blocks until any other in-flight block is committed or dropped.
    /// `height` must be strictly greater than the last committed height.
    pub fn begin_block(&self, height: BlockHeight) -> LedgerResult<BlockExecutor<'_, S>> {
        let writer = self.writer.lock();
        if let Some(latest) = self.latest_height()? {
            if height <= latest {
                return Err(LedgerError::NonMonotonicHeight {
                    latest,
                    requested: height,
                });
            }
        }
        Ok(BlockExecutor::new(&self.state, height, writer))
    }

    /// Persist everything `executor` staged in one atomic batch, then
    /// update the vault.
    ///
    /// `executor` must come from this ledger's [`begin_block`](Self::begin_block).
    pub fn commit_block(&self, executor: BlockExecutor<'_, S>) -> LedgerResult<BlockCommit> {
        let (pending, _writer) = executor.finish();
        let height = pending.height;
        let root = cache_root(&pending.journal)?;

        let mut batch = pending.batch;
        batch.put(META_LATEST_HEIGHT, height.to_be_bytes().to_vec());
        self.state.apply_batch(batch)?;
        if self.config.flush_on_commit {
            self.state.flush()?;
        }

        if let Err(e) = self.index_block(&pending.applied) {
            warn!(height, error = %e, "vault indexing failed, cache dropped; rebuild vaults");
            *self.cache.write() = VaultCache::new();
        }

        info!(
            height,
            transactions = pending.applied.len(),
            writes = pending.journal.len(),
            root = %hex::encode(root),
            "block committed"
        );
        Ok(BlockCommit {
            height,
            cache_root: root,
            entries: pending.journal,
            transactions: pending.applied,
        })
    }

    /// Append the block's new tokens to their registered owners' vaults and
    /// mark consumed ones spent in the cache.
    ///
    /// Within a block, rows are appended in token key order. That is the
    /// order [`rebuild_vault`](Self::rebuild_vault) reproduces, so a vault
    /// reads the same whether it was built live or rebuilt.
    fn index_block(&self, applied: &[AppliedTransaction]) -> LedgerResult<()> {
        let accounts = self.accounts.read();
        if accounts.is_empty() {
            return Ok(());
        }

        let mut produced: BTreeMap<H256, Vec<&TokenBase>> = BTreeMap::new();
        for base in applied.iter().flat_map(|tx| &tx.produced) {
            let owner = base.owner_hash()?;
            if accounts.contains(&owner) {
                produced.entry(owner).or_default().push(base);
            }
        }

        let mut rows = WriteBatch::new();
        let mut cache = self.cache.write();
        for (owner, mut bases) in produced {
            bases.sort_by_key(|base| base.key());
            let mut seq = self.next_vault_seq(&owner)?;
            for base in bases {
                let key = base.key();
                rows.put(keys::vault_row(&owner, seq), Vault::new(owner, seq, key).encode()?);
                cache.upsert(&owner, TokenRecord::new(key, base.value(), TokenState::Unspent));
                seq += 1;
            }
            rows.put(keys::vault_seq(&owner), seq.to_be_bytes().to_vec());
        }
        // after the appends, so a token produced and spent in one block ends up spent
        for base in applied.iter().flat_map(|tx| &tx.consumed) {
            let owner = base.owner_hash()?;
            if accounts.contains(&owner) {
                cache.set_state(&owner, &base.key(), TokenState::Spent);
            }
        }

        if !rows.is_empty() {
            debug!(rows = rows.len(), "vault rows indexed");
            self.vault_store.apply_batch(rows)?;
            if self.config.flush_on_commit {
                self.vault_store.flush()?;
            }
        }
        Ok(())
    }

    // -- Token queries ------------------------------------------------------

    /// Extension of `key` in effect at `height`.
    pub fn resolve(&self, key: &TokenKey, height: BlockHeight) -> LedgerResult<TokenExt> {
        execution::resolve(&self.view(), key, height)
    }

    pub fn token(&self, key: &TokenKey, height: BlockHeight) -> LedgerResult<Token> {
        execution::resolve_token(&self.view(), key, height)
    }

    pub fn latest_token(&self, key: &TokenKey) -> LedgerResult<Token> {
        self.token(key, BlockHeight::MAX)
    }

    pub fn token_base(&self, key: &TokenKey) -> LedgerResult<Option<TokenBase>> {
        execution::load_base(&self.view(), key)
    }

    pub fn token_history(&self, key: &TokenKey) -> LedgerResult<TokenExtOnBlockNum> {
        execution::load_history(&self.view(), key)
    }

    pub fn utxo_tx(&self, tx_hash: &H256) -> LedgerResult<Option<UtxoTx>> {
        read_record(&self.view(), &keys::utxo_tx(tx_hash))
    }

    /// Every transaction in `key`'s ancestry, breadth-first starting with
    /// the one that produced it. Each transaction appears once.
    pub fn track_token(&self, key: &TokenKey) -> LedgerResult<Vec<TrackedTx>> {
        if self.token_base(key)?.is_none() {
            return Err(LedgerError::UnknownToken(key.to_string()));
        }
        let mut queue = VecDeque::from([key.tx_hash()]);
        let mut seen = HashSet::new();
        let mut lineage = Vec::new();
        while let Some(tx_hash) = queue.pop_front() {
            if !seen.insert(tx_hash) {
                continue;
            }
            let utxo_tx = self
                .utxo_tx(&tx_hash)?
                .ok_or_else(|| LedgerError::NotFound(keys::utxo_tx(&tx_hash)))?;
            queue.extend(utxo_tx.inputs().iter().map(TokenKey::tx_hash));
            lineage.push(TrackedTx { tx_hash, utxo_tx });
        }
        Ok(lineage)
    }

    // -- Accounts -----------------------------------------------------------

    /// Start indexing `owner_hash` and build its vault from current state.
    ///
    /// Returns `false` if the owner was already registered.
    pub fn register_account(&self, owner_hash: H256) -> LedgerResult<bool> {
        if owner_hash.is_zero() {
            return Err(LedgerError::InvalidOwner("zero owner hash".into()));
        }
        {
            let mut accounts = self.accounts.write();
            if accounts.contains(&owner_hash) {
                return Ok(false);
            }
            let mut next = accounts.clone();
            next.add(owner_hash);
            self.vault_store
                .put(ACCOUNT_RECORD_KEY.as_bytes(), &next.encode()?)?;
            self.vault_store.flush()?;
            *accounts = next;
        }
        let indexed = self.rebuild_vault(&owner_hash)?;
        info!(owner = %h256_to_hex(&owner_hash), tokens = indexed, "account registered");
        Ok(true)
    }

    pub fn is_registered(&self, owner_hash: &H256) -> bool {
        self.accounts.read().contains(owner_hash)
    }

    pub fn accounts(&self) -> Vec<H256> {
        self.accounts.read().accounts().to_vec()
    }

    fn ensure_registered(&self, owner_hash: &H256) -> LedgerResult<()> {
        if self.is_registered(owner_hash) {
            Ok(())
        } else {
            Err(LedgerError::AccountNotRegistered(h256_to_hex(owner_hash)))
        }
    }

    // -- Vault --------------------------------------------------------------

    /// Greedy first-fit selection of `owner_hash`'s unspent tokens.
    ///
    /// `page.cnt == 0` means the configured default page size; larger
    /// requests are clamped to the configured maximum.
    pub fn select_tokens(
        &self,
        owner_hash: &H256,
        target: U256,
        page: QueryUtxoParam,
    ) -> LedgerResult<Selection> {
        let page = QueryUtxoParam {
            cnt: self.config.effective_page_size(page.cnt),
            ..page
        };
        let selection =
            self.with_records(owner_hash, |records| vault::select_tokens(records, target, page))?;
        debug!(
            owner = %h256_to_hex(owner_hash),
            target = %target,
            chosen = selection.token_keys.len(),
            end = selection.page.end,
            total = selection.page.total,
            sufficient = selection.is_sufficient(),
            "tokens selected"
        );
        Ok(selection)
    }

    /// One page of `owner_hash`'s vault rows, optionally filtered by state.
    pub fn list_vault(
        &self,
        owner_hash: &H256,
        filter: Option<TokenState>,
        page: QueryUtxoParam,
    ) -> LedgerResult<(Vec<TokenRecord>, QueryUtxoParam)> {
        let page = QueryUtxoParam {
            cnt: self.config.effective_page_size(page.cnt),
            ..page
        };
        self.with_records(owner_hash, |records| vault::list_records(records, filter, page))
    }

    /// Sum of `owner_hash`'s unspent tokens.
    pub fn balance(&self, owner_hash: &H256) -> LedgerResult<U256> {
        self.with_records(owner_hash, vault::unspent_balance)
    }

    /// Reload `owner_hash`'s cached rows from the vault store.
    pub fn refresh_vault(&self, owner_hash: &H256) -> LedgerResult<usize> {
        self.ensure_registered(owner_hash)?;
        Ok(self.load_vault(owner_hash)?.len())
    }

    /// Drop `owner_hash`'s cached rows; the next query reloads them.
    pub fn invalidate_vault(&self, owner_hash: &H256) -> bool {
        self.cache.write().invalidate(owner_hash)
    }

    /// Re-derive `owner_hash`'s vault rows from every `TokenBase` in the
    /// ledger and reload the cache.
    ///
    /// Rows are ordered by creation height, then token key, which is the
    /// order commits append them in. Existing rows are replaced.
    pub fn rebuild_vault(&self, owner_hash: &H256) -> LedgerResult<usize> {
        self.ensure_registered(owner_hash)?;
        let view = self.view();
        let mut found = Vec::new();
        for (_, base) in scan_records::<TokenBase, _>(&self.state, TOKEN_BASE_PREFIX)? {
            if base.owner_hash().ok().as_ref() != Some(owner_hash) {
                continue;
            }
            let key = base.key();
            let created = execution::load_history(&view, &key)?
                .created()
                .ok_or_else(|| LedgerError::NotFound(keys::token_ext_index(&key)))?;
            let (_, ext) = execution::resolve_latest(&view, &key)?;
            found.push((created, TokenRecord::new(key, base.value(), ext.state())));
        }
        found.sort_by_key(|(created, record)| (*created, record.token_key));
        let records: Vec<TokenRecord> = found.into_iter().map(|(_, record)| record).collect();

        let mut rows = WriteBatch::new();
        let prefix = keys::vault_owner_prefix(owner_hash);
        for (row_key, _) in self.vault_store.scan_prefix(prefix.as_bytes())? {
            rows.delete(row_key);
        }
        for (seq, record) in (0u64..).zip(&records) {
            let row = Vault::new(*owner_hash, seq, record.token_key);
            rows.put(keys::vault_row(owner_hash, seq), row.encode()?);
        }
        rows.put(keys::vault_seq(owner_hash), (records.len() as u64).to_be_bytes().to_vec());
        self.vault_store.apply_batch(rows)?;
        if self.config.flush_on_commit {
            self.vault_store.flush()?;
        }

        let count = records.len();
        self.cache.write().replace_owner(*owner_hash, records);
        info!(owner = %h256_to_hex(owner_hash), tokens = count, "vault rebuilt");
        Ok(count)
    }

    /// Sequence number the owner's next vault row gets.
    fn next_vault_seq(&self, owner_hash: &H256) -> LedgerResult<u64> {
        let Some(raw) = self.vault_store.get(keys::vault_seq(owner_hash).as_bytes())? else {
            return Ok(0);
        };
        let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
            LedgerError::malformed("VaultSeq", format!("expected 8 bytes, got {}", raw.len()))
        })?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Load `owner_hash`'s rows in `seq` order.
    fn load_vault(&self, owner_hash: &H256) -> LedgerResult<Vec<TokenRecord>> {
        let view = self.view();
        let prefix = keys::vault_owner_prefix(owner_hash);
        let mut records = Vec::new();
        for (row_key, row) in scan_records::<Vault, _>(&self.vault_store, &prefix)? {
            let Some(base) = execution::load_base(&view, &row.token_key)? else {
                warn!(row = %row_key, "vault row without token base, skipped");
                continue;
            };
            let (_, ext) = execution::resolve_latest(&view, &row.token_key)?;
            records.push(TokenRecord::new(row.token_key, base.value(), ext.state()));
        }
        self.cache.write().replace_owner(*owner_hash, records.clone());
        debug!(owner = %h256_to_hex(owner_hash), rows = records.len(), "vault loaded");
        Ok(records)
    }

    /// Run `f` over `owner_hash`'s rows, loading them on a cache miss.
    fn with_records<T>(
        &self,
        owner_hash: &H256,
        f: impl FnOnce(&[TokenRecord]) -> T,
    ) -> LedgerResult<T> {
        self.ensure_registered(owner_hash)?;
        {
            let cache = self.cache.read();
            if let Some(records) = cache.records(owner_hash) {
                return Ok(f(records));
            }
        }
        let records = self.load_vault(owner_hash)?;
        Ok(f(&records))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
