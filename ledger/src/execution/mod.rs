//! # Execution
//!
//! ```text
//! resolver.rs  — versioned lookup of a token's state at a height
//! executor.rs  — BlockExecutor: stages transactions for one block
//! ```

pub mod executor;
pub mod resolver;

pub use executor::{AppliedTransaction, BlockExecutor, PendingBlock, TxScope};
pub use resolver::{load_base, load_history, resolve, resolve_latest, resolve_token};
