//! # Block Executor
//!
//! Applies UTXO transactions for one block height.
//!
//! ```text
//!   Ledger::begin_block(H) ──▶ BlockExecutor ──apply_transaction()──▶ ...
//!                                   │
//!                                   └── Ledger::commit_block() ──▶ one atomic batch
//! ```
//!
//! Writes land in three layers. A transaction stages into its own
//! [`TxScope`]; if every check passes the scope is folded into the block's
//! staged set, otherwise it is dropped and the block is untouched. Nothing
//! reaches the store until the whole block is committed.
//!
//! Applying a transaction at height `H`:
//!
//! 1. Reject it outright if it has neither inputs nor outputs, or if its
//!    hash already has a `UtxoTx` record.
//! 2. For each input: the `TokenBase` must exist, its latest snapshot must
//!    be `Unspent` and no later than `H`, and the validation engine must
//!    approve. Write a `Spent` snapshot at `H` and record `H` in `TN#`.
//! 3. For each output `i`: derive key `(tx_hash, i)`, compute the owner
//!    hash, bind a validation contract, then write `TB#`, an `Unspent`
//!    snapshot at `H`, and `TN# = [H]`.
//! 4. Write the `UtxoTx` record linking inputs to outputs.
//!
//! Value conservation is not checked here; the validation contracts own
//! that rule.

use std::collections::BTreeMap;

use parking_lot::MutexGuard;
use primitive_types::{H256, U256};
use serde::Serialize;
use tracing::{debug, warn};

use super::resolver::{load_base, load_history, resolve, resolve_token};
use crate::codec::Record;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{keys, read_record, KvStore, StateRead, UtxoDbCache, WriteBatch};
use crate::token::{
    h256_to_hex, owner_hash, BlockHeight, CheckType, Token, TokenBase, TokenExt,
    TokenExtOnBlockNum, TokenKey,
};
use crate::transaction::{UtxoTx, UtxoTxIn, UtxoTxOut, ValidationEngine};

// ---------------------------------------------------------------------------
// AppliedTransaction
// ---------------------------------------------------------------------------

/// What a successfully applied transaction did, for vault bookkeeping and
/// for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedTransaction {
    pub tx_hash: H256,
    pub utxo_tx: UtxoTx,
    /// Bases of the tokens this transaction spent.
    pub consumed: Vec<TokenBase>,
    /// Bases of the tokens it created, in output order.
    pub produced: Vec<TokenBase>,
}

// ---------------------------------------------------------------------------
// TxScope
// ---------------------------------------------------------------------------

/// Write overlay for a single transaction.
///
/// Reads see the scope's own writes first, then the parent.
pub struct TxScope<'p, P: StateRead + ?Sized> {
    parent: &'p P,
    writes: BTreeMap<String, Vec<u8>>,
    journal: Vec<UtxoDbCache>,
}

impl<'p, P: StateRead + ?Sized> TxScope<'p, P> {
    fn new(parent: &'p P) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    fn put<R: Record>(&mut self, key: String, record: &R) -> LedgerResult<()> {
        let value = record.encode()?;
        self.journal.push(UtxoDbCache::new(key.clone(), value.clone()));
        self.writes.insert(key, value);
        Ok(())
    }

    fn into_parts(self) -> (BTreeMap<String, Vec<u8>>, Vec<UtxoDbCache>) {
        (self.writes, self.journal)
    }
}

impl<P: StateRead + ?Sized> StateRead for TxScope<'_, P> {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.parent.read(key),
        }
    }
}

// ---------------------------------------------------------------------------
// PendingBlock
// ---------------------------------------------------------------------------

/// A fully executed block waiting to be committed.
#[derive(Debug)]
pub struct PendingBlock {
    pub(crate) height: BlockHeight,
    pub(crate) batch: WriteBatch,
    pub(crate) journal: Vec<UtxoDbCache>,
    pub(crate) applied: Vec<AppliedTransaction>,
}

impl PendingBlock {
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Ordered change log of the block.
    pub fn entries(&self) -> &[UtxoDbCache] {
        &self.journal
    }

    pub fn transactions(&self) -> &[AppliedTransaction] {
        &self.applied
    }
}

// ---------------------------------------------------------------------------
// BlockExecutor
// ---------------------------------------------------------------------------

/// Stages transactions for one block.
///
/// Holds the ledger's writer lock for its whole lifetime, so at most one
/// block is in flight per ledger. Dropping it without committing discards
/// everything it staged.
pub struct BlockExecutor<'a, S: KvStore + ?Sized> {
    store: &'a S,
    height: BlockHeight,
    staged: BTreeMap<String, Vec<u8>>,
    journal: Vec<UtxoDbCache>,
    applied: Vec<AppliedTransaction>,
    _writer: MutexGuard<'a, ()>,
}

impl<'a, S: KvStore + ?Sized> BlockExecutor<'a, S> {
    pub(crate) fn new(store: &'a S, height: BlockHeight, writer: MutexGuard<'a, ()>) -> Self {
        debug!(height, "block execution started");
        Self {
            store,
            height,
            staged: BTreeMap::new(),
            journal: Vec::new(),
            applied: Vec::new(),
            _writer: writer,
        }
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Transactions applied so far.
    pub fn applied(&self) -> &[AppliedTransaction] {
        &self.applied
    }

    /// Change log so far.
    pub fn entries(&self) -> &[UtxoDbCache] {
        &self.journal
    }

    /// Resolve against committed state plus this block's staged writes.
    pub fn resolve(&self, key: &TokenKey, height: BlockHeight) -> LedgerResult<TokenExt> {
        resolve(self, key, height)
    }

    pub fn token(&self, key: &TokenKey, height: BlockHeight) -> LedgerResult<Token> {
        resolve_token(self, key, height)
    }

    /// Apply one transaction at this block's height.
    ///
    /// On error nothing the transaction staged is kept; the block continues
    /// as if it had never been submitted.
    pub fn apply_transaction(
        &mut self,
        tx_hash: H256,
        inputs: &[UtxoTxIn],
        outputs: &[UtxoTxOut],
        engine: &dyn ValidationEngine,
    ) -> LedgerResult<UtxoTx> {
        let applied = self.stage(|scope, height| {
            stage_transaction(scope, height, tx_hash, inputs, outputs, engine)
        });
        match applied {
            Ok(applied) => {
                debug!(
                    height = self.height,
                    tx = %h256_to_hex(&tx_hash),
                    inputs = inputs.len(),
                    outputs = outputs.len(),
                    "utxo transaction applied"
                );
                let utxo_tx = applied.utxo_tx.clone();
                self.applied.push(applied);
                Ok(utxo_tx)
            }
            Err(e) => {
                warn!(
                    height = self.height,
                    tx = %h256_to_hex(&tx_hash),
                    error = %e,
                    "utxo transaction rejected"
                );
                Err(e)
            }
        }
    }

    /// Write a new snapshot for `key` at this height with the same state and
    /// a new detail string.
    pub fn annotate_token(&mut self, key: &TokenKey, detail: &str) -> LedgerResult<TokenExt> {
        let ext = self.stage(|scope, height| {
            let (current, mut history) = latest_snapshot(&*scope, key, height)?;
            let next = current.with_detail(detail);
            scope.put(keys::token_ext(key, height), &next)?;
            if history.record(height)? {
                scope.put(keys::token_ext_index(key), &history)?;
            }
            Ok(next)
        })?;
        debug!(height = self.height, token = %key, "token annotated");
        Ok(ext)
    }

    /// Hand the staged block over for commit.
    pub(crate) fn finish(self) -> (PendingBlock, MutexGuard<'a, ()>) {
        let mut batch = WriteBatch::new();
        for (key, value) in self.staged {
            batch.put(key, value);
        }
        let pending = PendingBlock {
            height: self.height,
            batch,
            journal: self.journal,
            applied: self.applied,
        };
        (pending, self._writer)
    }

    /// Run `f` against a fresh overlay and keep its writes only on success.
    fn stage<T>(
        &mut self,
        f: impl FnOnce(&mut TxScope<'_, Self>, BlockHeight) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let height = self.height;
        let (out, writes, journal) = {
            let mut scope = TxScope::new(&*self);
            let out = f(&mut scope, height)?;
            let (writes, journal) = scope.into_parts();
            (out, writes, journal)
        };
        self.staged.extend(writes);
        self.journal.extend(journal);
        Ok(out)
    }
}

impl<S: KvStore + ?Sized> StateRead for BlockExecutor<'_, S> {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.store.get(key.as_bytes()),
        }
    }
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

fn stage_transaction<P: StateRead + ?Sized>(
    scope: &mut TxScope<'_, P>,
    height: BlockHeight,
    tx_hash: H256,
    inputs: &[UtxoTxIn],
    outputs: &[UtxoTxOut],
    engine: &dyn ValidationEngine,
) -> LedgerResult<AppliedTransaction> {
    if inputs.is_empty() && outputs.is_empty() {
        return Err(LedgerError::EmptyTransaction);
    }
    let tx_key = keys::utxo_tx(&tx_hash);
    if scope.read(&tx_key)?.is_some() {
        return Err(LedgerError::AlreadyExists(tx_key));
    }

    let mut consumed = Vec::with_capacity(inputs.len());
    for input in inputs {
        consumed.push(consume_input(scope, height, input, engine)?);
    }

    let mut produced = Vec::with_capacity(outputs.len());
    for (i, output) in outputs.iter().enumerate() {
        produced.push(produce_output(scope, height, tx_hash, i as u64, output, engine)?);
    }

    let utxo_tx = UtxoTx::new(
        consumed.iter().map(TokenBase::key).collect(),
        produced.iter().map(TokenBase::key).collect(),
    );
    scope.put(tx_key, &utxo_tx)?;

    Ok(AppliedTransaction {
        tx_hash,
        utxo_tx,
        consumed,
        produced,
    })
}

/// Latest snapshot of an existing token plus its history, refusing tokens
/// whose history already runs past `height`.
fn latest_snapshot<P: StateRead + ?Sized>(
    scope: &TxScope<'_, P>,
    key: &TokenKey,
    height: BlockHeight,
) -> LedgerResult<(TokenExt, TokenExtOnBlockNum)> {
    if load_base(scope, key)?.is_none() {
        return Err(LedgerError::UnknownToken(key.to_string()));
    }
    let history = load_history(scope, key)?;
    let latest = history
        .latest()
        .ok_or_else(|| LedgerError::NotFound(keys::token_ext_index(key)))?;
    if latest > height {
        return Err(LedgerError::NonMonotonicHeight {
            latest,
            requested: height,
        });
    }
    let ext = read_record::<TokenExt, _>(scope, &keys::token_ext(key, latest))?
        .ok_or_else(|| LedgerError::NotFound(keys::token_ext(key, latest)))?;
    Ok((ext, history))
}

fn consume_input<P: StateRead + ?Sized>(
    scope: &mut TxScope<'_, P>,
    height: BlockHeight,
    input: &UtxoTxIn,
    engine: &dyn ValidationEngine,
) -> LedgerResult<TokenBase> {
    let key = &input.token_key;
    let base =
        load_base(&*scope, key)?.ok_or_else(|| LedgerError::UnknownToken(key.to_string()))?;
    let (current, mut history) = latest_snapshot(&*scope, key, height)?;
    if current.is_spent() {
        return Err(LedgerError::DoubleSpend {
            key: key.to_string(),
            height,
        });
    }

    let token = Token::new(base, current);
    engine.check_spend(&token, input, height)?;

    scope.put(keys::token_ext(key, height), &TokenExt::spent(input.detail.clone()))?;
    if history.record(height)? {
        scope.put(keys::token_ext_index(key), &history)?;
    }
    Ok(token.token_base)
}

fn produce_output<P: StateRead + ?Sized>(
    scope: &mut TxScope<'_, P>,
    height: BlockHeight,
    tx_hash: H256,
    index: u64,
    output: &UtxoTxOut,
    engine: &dyn ValidationEngine,
) -> LedgerResult<TokenBase> {
    let key = TokenKey::new(tx_hash, U256::from(index));
    let base_key = keys::token_base(&key);
    if scope.read(&base_key)?.is_some() {
        return Err(LedgerError::AlreadyExists(base_key));
    }

    let check_type = CheckType::parse(&output.check_type)?;
    if owner_hash(&output.to, check_type)?.is_zero() {
        return Err(LedgerError::InvalidOwner(output.to.clone()));
    }
    let binding = engine.bind_validation_contract(&key, output, height)?;

    let base = TokenBase::new(
        tx_hash,
        key.idx(),
        output.value,
        output.to.clone(),
        check_type,
        binding.address,
        binding.contract_type,
    );
    scope.put(base_key, &base)?;
    scope.put(keys::token_ext(&key, height), &TokenExt::unspent(output.detail.clone()))?;
    scope.put(keys::token_ext_index(&key), &TokenExtOnBlockNum::created_at(height))?;
    Ok(base)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::token::{ContractType, TokenState};
    use crate::transaction::{ContractBinding, PassthroughEngine};
    use parking_lot::Mutex;
    use primitive_types::H160;

    const ALICE: &str = "alice-pubkey";
    const BOB: &str = "bob-pubkey";

    fn hash(b: u8) -> H256 {
        H256::repeat_byte(b)
    }

    fn executor<'a>(
        store: &'a MemoryStore,
        lock: &'a Mutex<()>,
        height: BlockHeight,
    ) -> BlockExecutor<'a, MemoryStore> {
        BlockExecutor::new(store, height, lock.lock())
    }

    fn commit(exec: BlockExecutor<'_, MemoryStore>, store: &MemoryStore) -> PendingBlock {
        let (pending, _guard) = exec.finish();
        store.apply_batch(pending.batch.clone()).unwrap();
        pending
    }

    fn mint(store: &MemoryStore, lock: &Mutex<()>, height: BlockHeight, tx: u8, values: &[u64]) {
        let mut exec = executor(store, lock, height);
        let outputs: Vec<_> = values.iter().map(|v| UtxoTxOut::new(ALICE, *v, "P2PK")).collect();
        exec.apply_transaction(hash(tx), &[], &outputs, &PassthroughEngine)
            .unwrap();
        commit(exec, store);
    }

    fn key(tx: u8, idx: u64) -> TokenKey {
        TokenKey::new(hash(tx), U256::from(idx))
    }

    #[test]
    fn mint_creates_unspent_tokens() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        let mut exec = executor(&store, &lock, 1);
        let tx = exec
            .apply_transaction(
                hash(1),
                &[],
                &[UtxoTxOut::new(ALICE, 100u64, "P2PK").with_detail("genesis")],
                &PassthroughEngine,
            )
            .unwrap();
        assert!(tx.inputs().is_empty());
        assert_eq!(tx.outputs(), &[key(1, 0)]);

        let token = exec.token(&key(1, 0), 1).unwrap();
        assert_eq!(token.token_base.value(), U256::from(100));
        assert_eq!(token.token_ext.state(), TokenState::Unspent);
        assert_eq!(token.token_ext.detail(), "genesis");
        assert_eq!(token.token_base.contract_type(), ContractType::General);
        // TB, TE, TN, TX
        assert_eq!(exec.entries().len(), 4);
    }

    #[test]
    fn staged_writes_are_invisible_until_committed() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        {
            let mut exec = executor(&store, &lock, 1);
            exec.apply_transaction(
                hash(1),
                &[],
                &[UtxoTxOut::new(ALICE, 5u64, "P2PK")],
                &PassthroughEngine,
            )
            .unwrap();
            assert!(store.is_empty());
        }
        // dropped without commit
        assert!(store.is_empty());
    }

    #[test]
    fn spend_marks_input_and_links_graph() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 1, 1, &[100]);

        let mut exec = executor(&store, &lock, 2);
        let tx = exec
            .apply_transaction(
                hash(2),
                &[UtxoTxIn::new(key(1, 0)).with_detail("pay bob")],
                &[UtxoTxOut::new(BOB, 60u64, "P2PK"), UtxoTxOut::new(ALICE, 40u64, "P2PK")],
                &PassthroughEngine,
            )
            .unwrap();
        assert_eq!(tx.inputs(), &[key(1, 0)]);
        assert_eq!(tx.outputs(), &[key(2, 0), key(2, 1)]);

        let spent = exec.resolve(&key(1, 0), 2).unwrap();
        assert!(spent.is_spent());
        assert_eq!(spent.detail(), "pay bob");
        assert!(!exec.resolve(&key(1, 0), 1).unwrap().is_spent());

        let pending = commit(exec, &store);
        assert_eq!(pending.transactions().len(), 1);
        assert_eq!(pending.transactions()[0].consumed[0].owner(), ALICE);
        let history: TokenExtOnBlockNum =
            read_record(&crate::storage::StoreView(&store), &keys::token_ext_index(&key(1, 0)))
                .unwrap()
                .unwrap();
        assert_eq!(history.heights(), &[1, 2]);
    }

    #[test]
    fn double_spend_in_same_block_is_rejected() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 1, 1, &[10]);

        let mut exec = executor(&store, &lock, 2);
        let input = [UtxoTxIn::new(key(1, 0))];
        let out = [UtxoTxOut::new(BOB, 10u64, "P2PK")];
        exec.apply_transaction(hash(2), &input, &out, &PassthroughEngine)
            .unwrap();
        let err = exec
            .apply_transaction(hash(3), &input, &out, &PassthroughEngine)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DoubleSpend { height: 2, .. }));
        assert_eq!(exec.applied().len(), 1);
    }

    #[test]
    fn failed_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 1, 1, &[10]);

        let mut exec = executor(&store, &lock, 2);
        let before = exec.entries().len();
        // first input fine, second unknown: the first must not end up spent
        let err = exec
            .apply_transaction(
                hash(2),
                &[UtxoTxIn::new(key(1, 0)), UtxoTxIn::new(key(9, 0))],
                &[UtxoTxOut::new(BOB, 10u64, "P2PK")],
                &PassthroughEngine,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownToken(_)));
        assert_eq!(exec.entries().len(), before);
        assert!(!exec.resolve(&key(1, 0), 2).unwrap().is_spent());
        assert!(exec.resolve(&key(2, 0), 2).is_err());
    }

    #[test]
    fn rejects_empty_and_replayed_transactions() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        let mut exec = executor(&store, &lock, 1);
        assert!(matches!(
            exec.apply_transaction(hash(1), &[], &[], &PassthroughEngine),
            Err(LedgerError::EmptyTransaction)
        ));

        let out = [UtxoTxOut::new(ALICE, 1u64, "P2PK")];
        exec.apply_transaction(hash(1), &[], &out, &PassthroughEngine)
            .unwrap();
        assert!(matches!(
            exec.apply_transaction(hash(1), &[], &out, &PassthroughEngine),
            Err(LedgerError::AlreadyExists(k)) if k.starts_with("TX#")
        ));
    }

    #[test]
    fn rejects_bad_outputs() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        let mut exec = executor(&store, &lock, 1);

        let err = exec
            .apply_transaction(
                hash(1),
                &[],
                &[UtxoTxOut::new(ALICE, 1u64, "MULTISIG")],
                &PassthroughEngine,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnrecognizedCheckType(_)));

        let err = exec
            .apply_transaction(
                hash(2),
                &[],
                &[UtxoTxOut::new("not-hex", 1u64, "P2PKH")],
                &PassthroughEngine,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOwner(_)));

        let zero = "0".repeat(64);
        let err = exec
            .apply_transaction(
                hash(3),
                &[],
                &[UtxoTxOut::new(zero, 1u64, "P2PKH")],
                &PassthroughEngine,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOwner(_)));
        assert!(exec.entries().is_empty());
    }

    #[test]
    fn output_values_are_not_conserved_here() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 1, 1, &[100]);

        let mut exec = executor(&store, &lock, 2);
        exec.apply_transaction(
            hash(2),
            &[UtxoTxIn::new(key(1, 0))],
            &[UtxoTxOut::new(BOB, 150u64, "P2PK")],
            &PassthroughEngine,
        )
        .unwrap();
        assert_eq!(exec.token(&key(2, 0), 2).unwrap().token_base.value(), U256::from(150));
    }

    #[test]
    fn input_history_ahead_of_block_is_rejected() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 5, 1, &[10]);

        let mut exec = executor(&store, &lock, 4);
        let err = exec
            .apply_transaction(hash(2), &[UtxoTxIn::new(key(1, 0))], &[], &PassthroughEngine)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NonMonotonicHeight {
                latest: 5,
                requested: 4
            }
        ));
    }

    struct DenyAll;

    impl ValidationEngine for DenyAll {
        fn check_spend(
            &self,
            token: &Token,
            _input: &UtxoTxIn,
            _height: BlockHeight,
        ) -> LedgerResult<()> {
            Err(LedgerError::ValidationRejected {
                key: token.key().to_string(),
                reason: "locked".into(),
            })
        }

        fn bind_validation_contract(
            &self,
            _key: &TokenKey,
            _output: &UtxoTxOut,
            _height: BlockHeight,
        ) -> LedgerResult<ContractBinding> {
            Ok(ContractBinding {
                address: H160::repeat_byte(9),
                contract_type: ContractType::CaseBased,
            })
        }
    }

    #[test]
    fn engine_decides_spends_and_bindings() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        let mut exec = executor(&store, &lock, 1);
        exec.apply_transaction(hash(1), &[], &[UtxoTxOut::new(ALICE, 3u64, "P2PK")], &DenyAll)
            .unwrap();
        let base = exec.token(&key(1, 0), 1).unwrap().token_base;
        assert_eq!(base.validation_contract(), H160::repeat_byte(9));
        assert_eq!(base.contract_type(), ContractType::CaseBased);

        let err = exec
            .apply_transaction(hash(2), &[UtxoTxIn::new(key(1, 0))], &[], &DenyAll)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ValidationRejected { .. }));
    }

    #[test]
    fn annotate_keeps_state_and_adds_snapshot() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 1, 1, &[10]);

        let mut exec = executor(&store, &lock, 3);
        let ext = exec.annotate_token(&key(1, 0), "escrowed").unwrap();
        assert_eq!(ext.state(), TokenState::Unspent);
        assert_eq!(exec.resolve(&key(1, 0), 3).unwrap().detail(), "escrowed");
        assert_eq!(exec.resolve(&key(1, 0), 2).unwrap().detail(), "");

        assert!(matches!(
            exec.annotate_token(&key(7, 0), "x"),
            Err(LedgerError::UnknownToken(_))
        ));
    }

    #[test]
    fn spend_after_annotation_in_same_block_overwrites_snapshot() {
        let store = MemoryStore::new();
        let lock = Mutex::new(());
        mint(&store, &lock, 1, 1, &[10]);

        let mut exec = executor(&store, &lock, 2);
        exec.annotate_token(&key(1, 0), "note").unwrap();
        exec.apply_transaction(hash(2), &[UtxoTxIn::new(key(1, 0))], &[], &PassthroughEngine)
            .unwrap();
        assert!(exec.resolve(&key(1, 0), 2).unwrap().is_spent());
        let pending = commit(exec, &store);
        let history: TokenExtOnBlockNum =
            read_record(&crate::storage::StoreView(&store), &keys::token_ext_index(&key(1, 0)))
                .unwrap()
                .unwrap();
        assert_eq!(history.heights(), &[1, 2]);
        assert_eq!(pending.height(), 2);
    }
}
