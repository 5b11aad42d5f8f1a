// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strata Ledger — UTXO Token Ledger
//!
//! Strata tracks value as unspent outputs (tokens) produced and consumed by
//! transactions, and answers "what did this token look like at block H"
//! for any H it has seen.
//!
//! A token is split into an immutable genesis record and a series of
//! height-stamped state snapshots, so history is kept without ever
//! rewriting a record. Transactions are applied per block through a
//! [`BlockExecutor`] and land in the store as one atomic batch, together
//! with an ordered change log whose root goes into the block header.
//!
//! Owners registered with a node get a vault: an owner-indexed cache of
//! their tokens used for greedy coin selection.
//!
//! ## Modules
//!
//! - **codec** — Ordered-field record encoding shared by every record.
//! - **token** — Token keys, `TokenBase`, `TokenExt`, height index.
//! - **transaction** — `UtxoTx` spend graph, inputs/outputs, engine seam.
//! - **storage** — `KvStore` over sled or memory, key layout, change log.
//! - **execution** — Height resolution and the block executor.
//! - **vault** — Account registry, vault rows, coin selection.
//! - **ledger** — The [`Ledger`] facade tying it all together.
//! - **config** — Key prefixes, limits, runtime config.

pub mod codec;
pub mod config;
pub mod error;
pub mod execution;
pub mod hash;
pub mod ledger;
pub mod storage;
pub mod token;
pub mod transaction;
pub mod vault;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use execution::{AppliedTransaction, BlockExecutor};
pub use ledger::{BlockCommit, Ledger, TrackedTx};
pub use token::{BlockHeight, CheckType, ContractType, Token, TokenKey, TokenState};
pub use transaction::{PassthroughEngine, UtxoTx, UtxoTxIn, UtxoTxOut, ValidationEngine};
pub use vault::{QueryUtxoParam, Selection};

/// Ledger crate version, as recorded in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
