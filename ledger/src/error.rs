//! # Ledger Errors
//!
//! One error type for the whole library. Codec and store failures propagate
//! straight to the caller: a malformed record means store corruption or a
//! format version mismatch, and nothing in here tries to patch it up.
//!
//! Coin selection coming up short is deliberately *not* an error. See
//! [`crate::vault::Selection::is_sufficient`].

use thiserror::Error;

use crate::token::BlockHeight;

/// Errors produced by the ledger, its codec, and its stores.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced key is absent from the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored byte sequence could not be decoded into the expected record.
    #[error("malformed {record} record: {reason}")]
    MalformedRecord {
        /// Record type that was being decoded.
        record: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// An input token is already spent at or before the resolution height.
    #[error("double spend of token {key} at height {height}")]
    DoubleSpend {
        /// Textual token key (`<tx_hash>_<idx>`).
        key: String,
        /// Height at which the spend was attempted.
        height: BlockHeight,
    },

    /// An input key has no `TokenBase`.
    #[error("unknown token: {0}")]
    UnknownToken(String),

    /// Ownership check type outside `P2PK` / `P2PKH`.
    #[error("unrecognized check type: {0:?}")]
    UnrecognizedCheckType(String),

    /// A token key string is not `<64 hex>_<decimal>`.
    #[error("invalid token key: {0:?}")]
    InvalidTokenKey(String),

    /// An owner cannot be turned into a usable (non-zero) owner hash.
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    /// A write-once record already exists under this key.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// Block heights must only move forward.
    #[error("non-monotonic height: latest {latest}, requested {requested}")]
    NonMonotonicHeight {
        /// Highest height already recorded.
        latest: BlockHeight,
        /// Height that was requested.
        requested: BlockHeight,
    },

    /// Vault queries are only served for registered owners.
    #[error("account not registered: {0}")]
    AccountNotRegistered(String),

    /// A transaction with neither inputs nor outputs.
    #[error("transaction has no inputs and no outputs")]
    EmptyTransaction,

    /// The validation engine refused a spend or an output binding.
    #[error("validation rejected for {key}: {reason}")]
    ValidationRejected {
        /// Token key the engine was asked about.
        key: String,
        /// Engine-supplied reason.
        reason: String,
    },

    /// Underlying sled failure.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Shorthand for building a [`LedgerError::MalformedRecord`].
    pub fn malformed(record: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;
