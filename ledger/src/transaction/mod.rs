//! # Transactions
//!
//! ```text
//! types.rs    — UtxoTxIn / UtxoTxOut construction descriptors
//! utxo_tx.rs  — UtxoTx, the persisted spend-graph node
//! engine.rs   — ValidationEngine seam to the contract executor
//! ```

pub mod engine;
pub mod types;
pub mod utxo_tx;

pub use engine::{ContractBinding, PassthroughEngine, ValidationEngine};
pub use types::{UtxoTxIn, UtxoTxOut};
pub use utxo_tx::UtxoTx;
