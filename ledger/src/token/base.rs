//! # TokenBase & Ownership Hashes
//!
//! `TokenBase` holds the genesis facts of a token. It is written exactly
//! once, under `TB#<tx_hash>_<idx>`, and never touched again. There are no
//! setters: anything that changes over a token's life lives in
//! [`TokenExt`](super::TokenExt) snapshots instead.
//!
//! The owner hash derived here is the join key into the vault, so its
//! derivation is pure and has exactly one answer per `(owner, check_type)`.

use std::fmt;

use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};

use super::types::{parse_h256_hex, CheckType, ContractType, TokenKey};
use crate::codec::{FieldReader, FieldWriter, Record};
use crate::error::{LedgerError, LedgerResult};
use crate::hash::keccak256;

// ---------------------------------------------------------------------------
// Ownership hash
// ---------------------------------------------------------------------------

/// Derive the 32-byte owner hash for a recognized check type.
///
/// - `P2PK`: Keccak-256 of the raw owner string.
/// - `P2PKH`: the owner string *is* the hash, as 64 hex digits (optional
///   `0x`). Anything else is [`LedgerError::InvalidOwner`].
pub fn owner_hash(owner: &str, check_type: CheckType) -> LedgerResult<H256> {
    match check_type {
        CheckType::P2PK => Ok(keccak256(owner.as_bytes())),
        CheckType::P2PKH => parse_h256_hex(owner).ok_or_else(|| {
            LedgerError::InvalidOwner(format!("P2PKH owner is not a 32-byte hex hash: {owner:?}"))
        }),
    }
}

/// Derive an owner hash from a raw host-chain tag.
///
/// Returns the zero hash when the tag is unrecognized or the owner cannot
/// be parsed for its tag. Zero means "cannot be indexed by owner": callers
/// must treat it as a validation failure, never as a real owner bucket.
pub fn owner_hash_from_tag(owner: &str, check_type: &str) -> H256 {
    CheckType::parse(check_type)
        .and_then(|ct| owner_hash(owner, ct))
        .unwrap_or_else(|_| H256::zero())
}

// ---------------------------------------------------------------------------
// TokenBase
// ---------------------------------------------------------------------------

/// Immutable genesis record of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBase {
    /// Hash of the host-chain transaction that produced the token.
    transaction_hash: H256,
    /// Output index within that transaction.
    idx_in_utxo_tx: U256,
    value: U256,
    /// Public key (P2PK) or account hash hex (P2PKH).
    owner: String,
    check_type: CheckType,
    validation_contract: H160,
    contract_type: ContractType,
}

impl TokenBase {
    pub fn new(
        transaction_hash: H256,
        idx_in_utxo_tx: U256,
        value: U256,
        owner: impl Into<String>,
        check_type: CheckType,
        validation_contract: H160,
        contract_type: ContractType,
    ) -> Self {
        Self {
            transaction_hash,
            idx_in_utxo_tx,
            value,
            owner: owner.into(),
            check_type,
            validation_contract,
            contract_type,
        }
    }

    pub fn key(&self) -> TokenKey {
        TokenKey::new(self.transaction_hash, self.idx_in_utxo_tx)
    }

    pub fn transaction_hash(&self) -> H256 {
        self.transaction_hash
    }

    pub fn idx_in_utxo_tx(&self) -> U256 {
        self.idx_in_utxo_tx
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn check_type(&self) -> CheckType {
        self.check_type
    }

    pub fn validation_contract(&self) -> H160 {
        self.validation_contract
    }

    pub fn contract_type(&self) -> ContractType {
        self.contract_type
    }

    /// Vault join key for this token's owner.
    pub fn owner_hash(&self) -> LedgerResult<H256> {
        owner_hash(&self.owner, self.check_type)
    }

    /// JSON view for RPC and debugging.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Record for TokenBase {
    const NAME: &'static str = "TokenBase";
    const FIELD_COUNT: usize = 7;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.h256(&self.transaction_hash);
        w.u256(self.idx_in_utxo_tx);
        w.u256(self.value);
        w.str(&self.owner);
        w.str(self.check_type.tag());
        w.h160(&self.validation_contract);
        w.str(self.contract_type.tag());
        Ok(())
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        let transaction_hash = r.h256()?;
        let idx_in_utxo_tx = r.u256()?;
        let value = r.u256()?;
        let owner = r.string()?;
        let check_tag = r.string()?;
        let check_type = CheckType::parse(&check_tag)
            .map_err(|_| r.malformed(format!("unknown check type {check_tag:?}")))?;
        let validation_contract = r.h160()?;
        let contract_tag = r.string()?;
        let contract_type = ContractType::from_tag(&contract_tag)
            .ok_or_else(|| r.malformed(format!("unknown contract type {contract_tag:?}")))?;

        Ok(Self {
            transaction_hash,
            idx_in_utxo_tx,
            value,
            owner,
            check_type,
            validation_contract,
            contract_type,
        })
    }
}

impl fmt::Display for TokenBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenBase[{} value={} owner={} check={} contract={:?} ({})]",
            self.key(),
            self.value,
            self.owner,
            self.check_type,
            self.validation_contract,
            self.contract_type
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
