//! # Token Extensions
//!
//! A token's mutable state is a series of [`TokenExt`] snapshots, one per
//! block height at which it changed, stored under `TE#<key>#<height>`.
//! Snapshots are never edited: a change writes a new one.
//!
//! [`TokenExtOnBlockNum`] (`TN#<key>`) lists the heights that have a
//! snapshot, in non-decreasing order. Resolving "the state at height H"
//! is a binary search for the greatest listed height `<= H`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{BlockHeight, TokenState};
use crate::codec::{FieldReader, FieldWriter, Record};
use crate::error::{LedgerError, LedgerResult};

// ---------------------------------------------------------------------------
// TokenExt
// ---------------------------------------------------------------------------

/// One snapshot of a token's mutable state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExt {
    state: TokenState,
    /// Free-form comment supplied with the transaction that wrote it.
    detail: String,
}

impl TokenExt {
    pub fn new(state: TokenState, detail: impl Into<String>) -> Self {
        Self {
            state,
            detail: detail.into(),
        }
    }

    pub fn unspent(detail: impl Into<String>) -> Self {
        Self::new(TokenState::Unspent, detail)
    }

    pub fn spent(detail: impl Into<String>) -> Self {
        Self::new(TokenState::Spent, detail)
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn is_spent(&self) -> bool {
        self.state == TokenState::Spent
    }

    /// Next snapshot with the same state and a new detail.
    pub fn with_detail(&self, detail: impl Into<String>) -> Self {
        Self::new(self.state, detail)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Record for TokenExt {
    const NAME: &'static str = "TokenExt";
    const FIELD_COUNT: usize = 2;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.u8(self.state.code());
        w.str(&self.detail);
        Ok(())
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        let code = r.u8()?;
        let state =
            TokenState::from_code(code).ok_or_else(|| r.malformed(format!("bad state {code}")))?;
        Ok(Self {
            state,
            detail: r.string()?,
        })
    }
}

impl fmt::Display for TokenExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenExt[{} {:?}]", self.state, self.detail)
    }
}

// ---------------------------------------------------------------------------
// TokenExtOnBlockNum
// ---------------------------------------------------------------------------

/// Ordered heights at which a token's extension changed.
///
/// The first entry is the creation height. Entries never decrease; an
/// attempt to record a lower height than the last one is a
/// [`LedgerError::NonMonotonicHeight`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExtOnBlockNum {
    updated_block_num: Vec<BlockHeight>,
}

impl TokenExtOnBlockNum {
    pub fn new() -> Self {
        Self::default()
    }

    /// History starting with a single creation height.
    pub fn created_at(height: BlockHeight) -> Self {
        Self {
            updated_block_num: vec![height],
        }
    }

    /// Build from an existing list, enforcing the ordering invariant.
    pub fn from_heights(heights: Vec<BlockHeight>) -> LedgerResult<Self> {
        if let Some(pair) = heights.windows(2).find(|w| w[0] > w[1]) {
            return Err(LedgerError::NonMonotonicHeight {
                latest: pair[0],
                requested: pair[1],
            });
        }
        Ok(Self {
            updated_block_num: heights,
        })
    }

    pub fn heights(&self) -> &[BlockHeight] {
        &self.updated_block_num
    }

    pub fn len(&self) -> usize {
        self.updated_block_num.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updated_block_num.is_empty()
    }

    /// Height at which the token was created.
    pub fn created(&self) -> Option<BlockHeight> {
        self.updated_block_num.first().copied()
    }

    /// Most recent change height.
    pub fn latest(&self) -> Option<BlockHeight> {
        self.updated_block_num.last().copied()
    }

    /// Append `height`. Returns `false` when it is already the last entry
    /// (a second change in the same block reuses the same snapshot key).
    pub fn record(&mut self, height: BlockHeight) -> LedgerResult<bool> {
        match self.latest() {
            Some(latest) if latest > height => Err(LedgerError::NonMonotonicHeight {
                latest,
                requested: height,
            }),
            Some(latest) if latest == height => Ok(false),
            _ => {
                self.updated_block_num.push(height);
                Ok(true)
            }
        }
    }

    /// Greatest recorded height `<= height`, or `None` when the token did
    /// not exist yet. Among equal heights the last appended one wins.
    pub fn effective_height(&self, height: BlockHeight) -> Option<BlockHeight> {
        let pos = self.updated_block_num.partition_point(|&h| h <= height);
        pos.checked_sub(1).map(|i| self.updated_block_num[i])
    }
}

impl Record for TokenExtOnBlockNum {
    const NAME: &'static str = "TokenExtOnBlockNum";
    const FIELD_COUNT: usize = 1;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.list(&self.updated_block_num, |w, h| w.u64(*h))
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        let heights = r.list(|r| r.u64())?;
        Self::from_heights(heights).map_err(|e| r.malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
