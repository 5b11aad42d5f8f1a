//! # Token Model
//!
//! A token is split across three records so that history stays cheap to
//! query:
//!
//! ```text
//! TB#<key>           TokenBase            genesis facts, written once
//! TE#<key>#<height>  TokenExt             state snapshot per change height
//! TN#<key>           TokenExtOnBlockNum   which heights have a snapshot
//! ```
//!
//! [`Token`] pairs a base with one resolved snapshot. It is a read-side
//! convenience and is never persisted.

pub mod base;
pub mod ext;
pub mod types;

pub use base::{owner_hash, owner_hash_from_tag, TokenBase};
pub use ext::{TokenExt, TokenExtOnBlockNum};
pub use types::{
    h256_to_hex, parse_h256_hex, BlockHeight, CheckType, ContractType, TokenKey, TokenState,
};

use std::fmt;

use serde::{Deserialize, Serialize};

/// A token as of one resolution height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_base: TokenBase,
    pub token_ext: TokenExt,
}

impl Token {
    pub fn new(token_base: TokenBase, token_ext: TokenExt) -> Self {
        Self {
            token_base,
            token_ext,
        }
    }

    pub fn key(&self) -> TokenKey {
        self.token_base.key()
    }

    pub fn is_spendable(&self) -> bool {
        !self.token_ext.is_spent()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token_base, self.token_ext)
    }
}
