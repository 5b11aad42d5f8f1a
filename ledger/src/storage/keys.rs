//! Storage key derivation.
//!
//! | Record               | Key                               | Store  |
//! |----------------------|-----------------------------------|--------|
//! | `TokenBase`          | `TB#<tx_hash>_<idx>`              | ledger |
//! | `TokenExt`           | `TE#<tx_hash>_<idx>#<height>`     | ledger |
//! | `TokenExtOnBlockNum` | `TN#<tx_hash>_<idx>`              | ledger |
//! | `UtxoTx`             | `TX#<tx_hash>`                    | ledger |
//! | `Vault`              | `<owner_hash>#<seq>`              | vault  |
//! | next vault `seq`     | `VS#<owner_hash>`                 | vault  |
//! | `AccountRecord`      | `AR#accounts`                     | vault  |
//!
//! Hashes are 64 lowercase hex digits and heights/indices are canonical
//! decimal, so two different records can never derive the same key. Vault
//! row sequence numbers are zero-padded, so a prefix scan returns an
//! owner's rows in insertion order.

use primitive_types::H256;

use crate::config::{
    KEY_SEPARATOR, TOKEN_BASE_PREFIX, TOKEN_EXT_INDEX_PREFIX, TOKEN_EXT_PREFIX, UTXO_TX_PREFIX,
    VAULT_SEQ_PREFIX, VAULT_SEQ_WIDTH,
};
use crate::token::{h256_to_hex, BlockHeight, TokenKey};

pub fn token_base(key: &TokenKey) -> String {
    format!("{TOKEN_BASE_PREFIX}{key}")
}

pub fn token_ext(key: &TokenKey, height: BlockHeight) -> String {
    format!("{TOKEN_EXT_PREFIX}{key}{KEY_SEPARATOR}{height}")
}

pub fn token_ext_index(key: &TokenKey) -> String {
    format!("{TOKEN_EXT_INDEX_PREFIX}{key}")
}

pub fn utxo_tx(tx_hash: &H256) -> String {
    format!("{UTXO_TX_PREFIX}{}", h256_to_hex(tx_hash))
}

/// Prefix shared by every vault row of one owner.
pub fn vault_owner_prefix(owner_hash: &H256) -> String {
    format!("{}{KEY_SEPARATOR}", h256_to_hex(owner_hash))
}

/// Row `seq` of one owner's vault.
pub fn vault_row(owner_hash: &H256, seq: u64) -> String {
    format!(
        "{}{seq:0width$}",
        vault_owner_prefix(owner_hash),
        width = VAULT_SEQ_WIDTH
    )
}

pub fn vault_seq(owner_hash: &H256) -> String {
    format!("{VAULT_SEQ_PREFIX}{}", h256_to_hex(owner_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn key() -> TokenKey {
        TokenKey::new(H256::repeat_byte(0xab), U256::from(2))
    }

    #[test]
    fn token_keys_follow_layout() {
        let h = "ab".repeat(32);
        assert_eq!(token_base(&key()), format!("TB#{h}_2"));
        assert_eq!(token_ext(&key(), 17), format!("TE#{h}_2#17"));
        assert_eq!(token_ext_index(&key()), format!("TN#{h}_2"));
        assert_eq!(utxo_tx(&H256::repeat_byte(0xab)), format!("TX#{h}"));
    }

    #[test]
    fn vault_rows_are_owner_scoped() {
        let alice = H256::repeat_byte(1);
        let bob = H256::repeat_byte(2);
        let row = vault_row(&alice, 7);
        assert!(row.starts_with(&vault_owner_prefix(&alice)));
        assert!(!row.starts_with(&vault_owner_prefix(&bob)));
        assert!(row.ends_with("#00000000000000000007"));
        assert!(!vault_seq(&alice).starts_with(&vault_owner_prefix(&alice)));
    }

    #[test]
    fn vault_rows_sort_numerically() {
        let alice = H256::repeat_byte(1);
        let mut rows: Vec<_> = [10, 2, u64::MAX, 0]
            .into_iter()
            .map(|seq| vault_row(&alice, seq))
            .collect();
        rows.sort();
        let expected: Vec<_> = [0, 2, 10, u64::MAX]
            .into_iter()
            .map(|seq| vault_row(&alice, seq))
            .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn ext_keys_differ_per_height_and_index() {
        let other = TokenKey::new(H256::repeat_byte(0xab), U256::from(21));
        assert_ne!(token_ext(&key(), 1), token_ext(&key(), 11));
        // "..._2#1" vs "..._21#..." cannot collide thanks to the separator.
        assert_ne!(token_ext(&key(), 11), token_ext(&other, 1));
    }
}
