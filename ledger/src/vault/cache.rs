//! # Vault Cache & Coin Selection
//!
//! Per-owner lists of [`TokenRecord`] rows, kept in memory so coin
//! selection never touches the store. Row order is stable: it is the order
//! rows were loaded in, with newly produced tokens appended. Selection
//! results depend on that order, so it is part of the contract.
//!
//! The cache is derived data. Any owner can be dropped with
//! [`VaultCache::invalidate`] and rebuilt from the vault store.

use std::collections::HashMap;

use primitive_types::{H256, U256};

use super::query::{QueryUtxoParam, Selection};
use super::record::TokenRecord;
use crate::token::{TokenKey, TokenState};

// ---------------------------------------------------------------------------
// Selection algorithms
// ---------------------------------------------------------------------------

fn clamp(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Greedy first-fit coin selection over one owner's rows.
///
/// Skips `page.start` rows, then walks at most `page.cnt` rows, taking every
/// `Unspent` one until the running sum reaches `target`. Spent rows still
/// count towards `cnt`. On return:
///
/// - `end`: row offset just past the last row examined.
/// - `total`: number of `Unspent` rows in the whole vault.
/// - `total_value`: sum of the chosen tokens.
pub fn select_tokens(records: &[TokenRecord], target: U256, mut page: QueryUtxoParam) -> Selection {
    let start = clamp(page.start).min(records.len());
    let mut token_keys = Vec::new();
    let mut sum = U256::zero();
    let mut scanned = 0usize;

    for record in records[start..].iter().take(clamp(page.cnt)) {
        if sum >= target {
            break;
        }
        scanned += 1;
        if record.is_unspent() {
            token_keys.push(record.token_key);
            sum = sum.saturating_add(record.token_value);
        }
    }

    page.end = (start + scanned) as u64;
    page.total = records.iter().filter(|r| r.is_unspent()).count() as u64;
    page.total_value = sum;
    Selection {
        token_keys,
        page,
        target,
    }
}

/// One page of rows, optionally restricted to a state.
///
/// Offsets count matching rows only. `total` is the number of matching
/// rows and `total_value` the sum of the returned page.
pub fn list_records(
    records: &[TokenRecord],
    filter: Option<TokenState>,
    mut page: QueryUtxoParam,
) -> (Vec<TokenRecord>, QueryUtxoParam) {
    let matching: Vec<&TokenRecord> = records
        .iter()
        .filter(|r| filter.map_or(true, |state| r.token_state == state))
        .collect();
    let start = clamp(page.start).min(matching.len());
    let rows: Vec<TokenRecord> = matching[start..]
        .iter()
        .take(clamp(page.cnt))
        .map(|r| **r)
        .collect();

    page.end = (start + rows.len()) as u64;
    page.total = matching.len() as u64;
    page.total_value = rows
        .iter()
        .fold(U256::zero(), |acc, r| acc.saturating_add(r.token_value));
    (rows, page)
}

/// Sum of all `Unspent` rows.
pub fn unspent_balance(records: &[TokenRecord]) -> U256 {
    records
        .iter()
        .filter(|r| r.is_unspent())
        .fold(U256::zero(), |acc, r| acc.saturating_add(r.token_value))
}

// ---------------------------------------------------------------------------
// VaultCache
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
struct OwnerVault {
    records: Vec<TokenRecord>,
    index: HashMap<TokenKey, usize>,
}

impl OwnerVault {
    fn from_records(records: Vec<TokenRecord>) -> Self {
        let mut vault = Self::default();
        for record in records {
            vault.upsert(record);
        }
        vault
    }

    fn upsert(&mut self, record: TokenRecord) {
        match self.index.get(&record.token_key) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.token_key, self.records.len());
                self.records.push(record);
            }
        }
    }
}

/// In-memory vault rows for every loaded owner.
#[derive(Debug, Default)]
pub struct VaultCache {
    owners: HashMap<H256, OwnerVault>,
}

impl VaultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, owner_hash: &H256) -> bool {
        self.owners.contains_key(owner_hash)
    }

    /// Replace an owner's rows wholesale. Duplicate keys collapse onto the
    /// first occurrence's position.
    pub fn replace_owner(&mut self, owner_hash: H256, records: Vec<TokenRecord>) {
        self.owners
            .insert(owner_hash, OwnerVault::from_records(records));
    }

    /// Drop an owner's rows. Returns `true` if they were loaded.
    pub fn invalidate(&mut self, owner_hash: &H256) -> bool {
        self.owners.remove(owner_hash).is_some()
    }

    pub fn records(&self, owner_hash: &H256) -> Option<&[TokenRecord]> {
        self.owners.get(owner_hash).map(|v| v.records.as_slice())
    }

    /// Insert or update one row of a loaded owner. Unloaded owners are left
    /// alone; they pick the row up on their next load.
    pub fn upsert(&mut self, owner_hash: &H256, record: TokenRecord) -> bool {
        match self.owners.get_mut(owner_hash) {
            Some(vault) => {
                vault.upsert(record);
                true
            }
            None => false,
        }
    }

    /// Flip the state of an existing row. Returns `false` if the owner is
    /// not loaded or has no such row.
    pub fn set_state(&mut self, owner_hash: &H256, key: &TokenKey, state: TokenState) -> bool {
        let Some(vault) = self.owners.get_mut(owner_hash) else {
            return false;
        };
        match vault.index.get(key) {
            Some(&i) => {
                vault.records[i].token_state = state;
                true
            }
            None => false,
        }
    }

    /// Number of loaded owners.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> TokenKey {
        TokenKey::new(H256::repeat_byte(n), U256::zero())
    }

    fn row(n: u8, value: u64, state: TokenState) -> TokenRecord {
        TokenRecord::new(key(n), U256::from(value), state)
    }

    fn snapshot() -> Vec<TokenRecord> {
        vec![
            row(1, 30, TokenState::Unspent),
            row(2, 20, TokenState::Spent),
            row(3, 25, TokenState::Unspent),
        ]
    }

    #[test]
    fn greedy_first_fit_skips_spent_rows() {
        let sel = select_tokens(&snapshot(), U256::from(40), QueryUtxoParam::new(0, 10));
        assert_eq!(sel.token_keys, vec![key(1), key(3)]);
        assert_eq!(sel.page.total_value, U256::from(55));
        assert_eq!(sel.page.end, 3);
        assert_eq!(sel.page.total, 2);
        assert!(sel.is_sufficient());
    }

    #[test]
    fn stops_as_soon_as_target_is_met() {
        let sel = select_tokens(&snapshot(), U256::from(30), QueryUtxoParam::new(0, 10));
        assert_eq!(sel.token_keys, vec![key(1)]);
        assert_eq!(sel.page.end, 1);
    }

    #[test]
    fn zero_target_selects_nothing() {
        let sel = select_tokens(&snapshot(), U256::zero(), QueryUtxoParam::new(0, 10));
        assert!(sel.token_keys.is_empty());
        assert_eq!(sel.page.end, 0);
        assert!(sel.is_sufficient());
    }

    #[test]
    fn page_exhaustion_reports_shortfall() {
        let rows: Vec<_> = (1..=5).map(|n| row(n, 10, TokenState::Unspent)).collect();
        let sel = select_tokens(&rows, U256::from(100), QueryUtxoParam::new(0, 2));
        assert_eq!(sel.token_keys.len(), 2);
        assert_eq!(sel.page.end, 2);
        assert!(sel.page.end < sel.page.total);
        assert!(!sel.is_sufficient());
        assert_eq!(sel.shortfall(), U256::from(80));

        let next = select_tokens(&rows, U256::from(100), sel.page.next_page());
        assert_eq!(next.token_keys, vec![key(3), key(4)]);
        assert_eq!(next.page.end, 4);
    }

    #[test]
    fn start_past_end_is_empty() {
        let sel = select_tokens(&snapshot(), U256::from(1), QueryUtxoParam::new(99, 10));
        assert!(sel.token_keys.is_empty());
        assert_eq!(sel.page.end, 3);
        assert_eq!(sel.page.total, 2);
    }

    #[test]
    fn spent_rows_count_towards_page_size() {
        let sel = select_tokens(&snapshot(), U256::from(100), QueryUtxoParam::new(0, 2));
        assert_eq!(sel.token_keys, vec![key(1)]);
        assert_eq!(sel.page.end, 2);
    }

    #[test]
    fn listing_filters_and_pages() {
        let rows = snapshot();
        let (all, page) = list_records(&rows, None, QueryUtxoParam::new(0, 2));
        assert_eq!(all.len(), 2);
        assert_eq!((page.end, page.total), (2, 3));
        assert_eq!(page.total_value, U256::from(50));

        let (unspent, page) =
            list_records(&rows, Some(TokenState::Unspent), QueryUtxoParam::new(1, 10));
        assert_eq!(unspent, vec![row(3, 25, TokenState::Unspent)]);
        assert_eq!((page.end, page.total), (2, 2));

        assert_eq!(unspent_balance(&rows), U256::from(55));
    }

    #[test]
    fn cache_tracks_rows_per_owner() {
        let alice = H256::repeat_byte(0xa1);
        let mut cache = VaultCache::new();
        assert!(!cache.upsert(&alice, row(9, 1, TokenState::Unspent)));

        cache.replace_owner(alice, snapshot());
        assert!(cache.is_loaded(&alice));
        assert!(cache.set_state(&alice, &key(1), TokenState::Spent));
        assert!(!cache.set_state(&alice, &key(7), TokenState::Spent));
        assert!(cache.upsert(&alice, row(4, 5, TokenState::Unspent)));
        assert!(cache.upsert(&alice, row(2, 20, TokenState::Unspent)));

        let records = cache.records(&alice).unwrap();
        let keys: Vec<_> = records.iter().map(|r| r.token_key).collect();
        assert_eq!(keys, vec![key(1), key(2), key(3), key(4)]);
        assert_eq!(unspent_balance(records), U256::from(50));

        assert!(cache.invalidate(&alice));
        assert!(cache.records(&alice).is_none());
        assert!(cache.is_empty());
    }
}
