//! # Ledger Configuration & Constants
//!
//! Key prefixes, codec limits, and paging bounds live here. The prefixes
//! are part of the on-disk format: every node derives the same keys for
//! the same token, and block change-log roots depend on it. Changing one
//! is a format break.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

// ---------------------------------------------------------------------------
// Key Prefixes
// ---------------------------------------------------------------------------

/// `TB#<tx_hash>_<idx>` — immutable token base record.
pub const TOKEN_BASE_PREFIX: &str = "TB#";

/// `TE#<tx_hash>_<idx>#<height>` — token extension snapshot at a height.
pub const TOKEN_EXT_PREFIX: &str = "TE#";

/// `TN#<tx_hash>_<idx>` — heights at which the extension changed.
pub const TOKEN_EXT_INDEX_PREFIX: &str = "TN#";

/// `TX#<tx_hash>` — spend-graph node.
pub const UTXO_TX_PREFIX: &str = "TX#";

/// `VS#<owner_hash>` — next vault row sequence number of one owner, kept
/// in the vault store.
pub const VAULT_SEQ_PREFIX: &str = "VS#";

/// Digits in a vault row sequence number. Zero padding makes key order
/// equal numeric order.
pub const VAULT_SEQ_WIDTH: usize = 20;

/// Registered account list, kept in the vault store.
pub const ACCOUNT_RECORD_KEY: &str = "AR#accounts";

/// Latest committed block height. Ledger metadata, never part of the
/// block change log.
pub const META_LATEST_HEIGHT: &str = "META#height";

/// Separator between owner hash and token key in vault rows, and between
/// token key and height in extension keys.
pub const KEY_SEPARATOR: char = '#';

/// Separator between transaction hash and output index in a token key.
pub const TOKEN_KEY_SEPARATOR: char = '_';

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Upper bound on a single encoded record. Decoding refuses anything that
/// claims to be larger, so a corrupt length prefix cannot trigger a huge
/// allocation.
pub const MAX_RECORD_BYTES: u64 = 16 * 1024 * 1024;

/// Hash width for transaction hashes and owner hashes.
pub const HASH_LENGTH: usize = 32;

/// Width of a validation-contract address.
pub const ADDRESS_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Page size used when a query asks for `cnt == 0`.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Hard ceiling on rows scanned by one vault query.
pub const MAX_PAGE_SIZE: u64 = 10_000;

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Runtime knobs for a [`Ledger`](crate::Ledger).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Rows per page when the caller passes `cnt == 0`.
    pub default_page_size: u64,
    /// Largest `cnt` honored; bigger requests are clamped.
    pub max_page_size: u64,
    /// Flush the store to disk after every committed block.
    pub flush_on_commit: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            flush_on_commit: true,
        }
    }
}

impl LedgerConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_slice(&raw)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would make paging meaningless.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(LedgerError::Config("page sizes must be non-zero".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(LedgerError::Config(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    /// Turn a caller-supplied page size into the number of rows to scan.
    pub fn effective_page_size(&self, cnt: u64) -> u64 {
        match cnt {
            0 => self.default_page_size,
            n => n.min(self.max_page_size),
        }
    }
}
