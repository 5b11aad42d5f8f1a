//! Vault records.
//!
//! [`Vault`] rows are the persisted owner index (`<owner_hash>#<seq>` in
//! the vault store, `seq` counting up per owner in insertion order).
//! [`TokenRecord`] is the in-memory row coin selection works on.
//! [`AccountRecord`] lists the owners this node tracks.

use std::fmt;

use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};

use crate::codec::{FieldReader, FieldWriter, Record};
use crate::error::{LedgerError, LedgerResult};
use crate::token::{h256_to_hex, TokenKey, TokenState};

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Persisted "owner holds token" row.
///
/// `seq` is the row's position in the owner's vault. Coin selection walks
/// rows in `seq` order, so it is assigned once and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub owner_hash: H256,
    pub seq: u64,
    pub token_key: TokenKey,
}

impl Vault {
    pub fn new(owner_hash: H256, seq: u64, token_key: TokenKey) -> Self {
        Self {
            owner_hash,
            seq,
            token_key,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Record for Vault {
    const NAME: &'static str = "Vault";
    const FIELD_COUNT: usize = 3;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.h256(&self.owner_hash);
        w.u64(self.seq);
        w.str(&self.token_key.to_string());
        Ok(())
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        let owner_hash = r.h256()?;
        let seq = r.u64()?;
        let raw = r.string()?;
        let token_key = raw
            .parse()
            .map_err(|e: LedgerError| r.malformed(e.to_string()))?;
        Ok(Self {
            owner_hash,
            seq,
            token_key,
        })
    }
}

impl fmt::Display for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vault[{} #{} -> {}]",
            h256_to_hex(&self.owner_hash),
            self.seq,
            self.token_key
        )
    }
}

// ---------------------------------------------------------------------------
// TokenRecord
// ---------------------------------------------------------------------------

/// One vault row as coin selection sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token_key: TokenKey,
    pub token_value: U256,
    pub token_state: TokenState,
}

impl TokenRecord {
    pub fn new(token_key: TokenKey, token_value: U256, token_state: TokenState) -> Self {
        Self {
            token_key,
            token_value,
            token_state,
        }
    }

    pub fn is_unspent(&self) -> bool {
        self.token_state == TokenState::Unspent
    }
}

// ---------------------------------------------------------------------------
// AccountRecord
// ---------------------------------------------------------------------------

/// Owner hashes registered with this node, in registration order.
///
/// Append-only; adding an owner twice is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    account_list: Vec<H256>,
}

impl AccountRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `owner_hash` was not registered before.
    pub fn add(&mut self, owner_hash: H256) -> bool {
        if self.contains(&owner_hash) {
            return false;
        }
        self.account_list.push(owner_hash);
        true
    }

    pub fn contains(&self, owner_hash: &H256) -> bool {
        self.account_list.contains(owner_hash)
    }

    pub fn accounts(&self) -> &[H256] {
        &self.account_list
    }

    pub fn len(&self) -> usize {
        self.account_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.account_list.is_empty()
    }
}

impl Record for AccountRecord {
    const NAME: &'static str = "AccountRecord";
    const FIELD_COUNT: usize = 1;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.list(&self.account_list, |w, h| w.h256(h))
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        Ok(Self {
            account_list: r.list(|r| r.h256())?,
        })
    }
}
