//! Paging cursor and selection result for vault queries.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::token::TokenKey;

/// Paging cursor over one owner's vault rows.
///
/// The caller fills `start` and `cnt`. A query fills `end` (row offset
/// reached, feed it back as the next `start`), `total` and `total_value`.
/// What `total` and `total_value` count depends on the query; see
/// [`select_tokens`](super::select_tokens) and
/// [`list_records`](super::list_records).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryUtxoParam {
    pub start: u64,
    pub cnt: u64,
    pub end: u64,
    pub total: u64,
    pub total_value: U256,
}

impl QueryUtxoParam {
    pub fn new(start: u64, cnt: u64) -> Self {
        Self {
            start,
            cnt,
            ..Self::default()
        }
    }

    /// Cursor for the page after this one, same size.
    pub fn next_page(&self) -> Self {
        Self::new(self.end, self.cnt)
    }
}

/// Outcome of one coin selection.
///
/// Falling short of the target is a normal outcome, not an error: the
/// caller reads [`is_sufficient`](Self::is_sufficient) and decides whether
/// to page on or give up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Chosen tokens, in vault row order.
    pub token_keys: Vec<TokenKey>,
    pub page: QueryUtxoParam,
    pub target: U256,
}

impl Selection {
    /// Sum of the chosen tokens' values.
    pub fn total_value(&self) -> U256 {
        self.page.total_value
    }

    pub fn is_sufficient(&self) -> bool {
        self.page.total_value >= self.target
    }

    /// How much is still missing; zero when sufficient.
    pub fn shortfall(&self) -> U256 {
        self.target.saturating_sub(self.page.total_value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
