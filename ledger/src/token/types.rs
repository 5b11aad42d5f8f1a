//! Vocabulary types shared by every token record: the token key, the
//! ownership and contract tags, and spend state.
//!
//! The tags are closed enums. The host chain hands them to us as strings,
//! so each one has a strict `parse` and nothing downstream ever compares
//! strings again.

use std::fmt;
use std::str::FromStr;

use primitive_types::{H256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{HASH_LENGTH, TOKEN_KEY_SEPARATOR};
use crate::error::{LedgerError, LedgerResult};

/// Block height as supplied by the execution engine.
pub type BlockHeight = u64;

/// Parse a 32-byte value rendered as hex, with or without a `0x` prefix.
///
/// Returns `None` for anything that is not exactly 64 hex digits.
pub fn parse_h256_hex(s: &str) -> Option<H256> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.len() != HASH_LENGTH * 2 {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    Some(H256::from_slice(&bytes))
}

/// Lowercase hex without prefix, the form used inside storage keys.
pub fn h256_to_hex(value: &H256) -> String {
    hex::encode(value.as_bytes())
}

// ---------------------------------------------------------------------------
// TokenKey
// ---------------------------------------------------------------------------

/// Identity of a token: the transaction that produced it and its output
/// index within that transaction.
///
/// Textual form is `<64 lowercase hex>_<decimal index>`. Parsing accepts
/// an optional `0x` on the hash but insists on a canonical index (no
/// leading zeros, no sign), so one token has exactly one key string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenKey {
    tx_hash: H256,
    idx: U256,
}

impl TokenKey {
    pub fn new(tx_hash: H256, idx: U256) -> Self {
        Self { tx_hash, idx }
    }

    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    pub fn idx(&self) -> U256 {
        self.idx
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            h256_to_hex(&self.tx_hash),
            TOKEN_KEY_SEPARATOR,
            self.idx
        )
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenKey({self})")
    }
}

impl FromStr for TokenKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidTokenKey(s.to_string());

        let (hash, idx) = s.split_once(TOKEN_KEY_SEPARATOR).ok_or_else(invalid)?;
        let tx_hash = parse_h256_hex(hash).ok_or_else(invalid)?;
        if idx.is_empty() || !idx.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let idx_value = U256::from_dec_str(idx).map_err(|_| invalid())?;
        if idx_value.to_string() != idx {
            return Err(invalid());
        }
        Ok(Self::new(tx_hash, idx_value))
    }
}

impl Serialize for TokenKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// CheckType
// ---------------------------------------------------------------------------

/// How token ownership is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckType {
    /// Pay-to-public-key: the owner field is the key itself.
    P2PK,
    /// Pay-to-public-key-hash: the owner field is an already-computed hash.
    P2PKH,
}

impl CheckType {
    /// Canonical tag as stored on chain.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::P2PK => "P2PK",
            Self::P2PKH => "P2PKH",
        }
    }

    /// Strict, case-sensitive parse of a host-chain tag.
    pub fn parse(tag: &str) -> LedgerResult<Self> {
        match tag {
            "P2PK" => Ok(Self::P2PK),
            "P2PKH" => Ok(Self::P2PKH),
            other => Err(LedgerError::UnrecognizedCheckType(other.to_string())),
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// ContractType
// ---------------------------------------------------------------------------

/// Flavor of the validation contract guarding a token.
///
/// `General` tokens share a deployed validation contract. `CaseBased`
/// tokens get their own instance, initialized from a template contract when
/// the token is produced. What either contract actually checks is the
/// execution engine's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    General,
    CaseBased,
}

impl ContractType {
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::CaseBased => "CaseBased",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "General" => Some(Self::General),
            "CaseBased" => Some(Self::CaseBased),
            _ => None,
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// TokenState
// ---------------------------------------------------------------------------

/// Spend state carried by each extension snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenState {
    Unspent,
    Spent,
}

impl TokenState {
    /// Single-byte wire code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Unspent => 0,
            Self::Spent => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unspent),
            1 => Some(Self::Spent),
            _ => None,
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspent => write!(f, "Unspent"),
            Self::Spent => write!(f, "Spent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
