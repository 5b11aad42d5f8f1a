//! # Vault
//!
//! A node-local, owner-indexed view of the ledger used for coin selection.
//! Only owners registered in the [`AccountRecord`] are indexed.
//!
//! ```text
//! record.rs  — Vault rows, TokenRecord, AccountRecord
//! query.rs   — QueryUtxoParam paging cursor, Selection result
//! cache.rs   — VaultCache and the selection/listing algorithms
//! ```
//!
//! The vault is a cache. It is rebuilt from ledger state whenever it is in
//! doubt, and nothing in the ledger ever reads from it.

pub mod cache;
pub mod query;
pub mod record;

pub use cache::{list_records, select_tokens, unspent_balance, VaultCache};
pub use query::{QueryUtxoParam, Selection};
pub use record::{AccountRecord, TokenRecord, Vault};
