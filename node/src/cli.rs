//! # CLI Interface
//!
//! Command-line structure for `strata-node`, built with `clap` derive.
//! Every subcommand works on the ledger database under `--data-dir`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use strata_ledger::TokenState;

use crate::logging::LogFormat;

/// Strata UTXO ledger node.
///
/// Applies blocks of UTXO transactions to a local ledger and answers
/// token, lineage, and vault queries against it.
#[derive(Parser, Debug)]
#[command(
    name = "strata-node",
    about = "Strata UTXO ledger node",
    version,
    propagate_version = true
)]
pub struct StrataNodeCli {
    /// Ledger data directory. `init` creates it.
    #[arg(
        long,
        short = 'd',
        env = "STRATA_DATA_DIR",
        default_value = "./strata-data",
        global = true
    )]
    pub data_dir: PathBuf,

    /// Ledger config file (JSON).
    ///
    /// When omitted, `config.json` in the data directory is used if present.
    #[arg(long, short = 'c', env = "STRATA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format on stderr.
    #[arg(
        long,
        env = "STRATA_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, a default config, and an empty ledger.
    Init,
    /// Register an owner so its tokens are indexed in the vault.
    Register(OwnerArgs),
    /// Apply one block of transactions from a JSON file.
    Apply(ApplyArgs),
    /// Show a token as of a height (latest by default).
    Token(TokenArgs),
    /// Select unspent tokens covering a target value.
    Select(SelectArgs),
    /// List an owner's vault rows.
    Vault(VaultArgs),
    /// Sum of an owner's unspent tokens.
    Balance(OwnerArgs),
    /// List the transactions a token descends from.
    Track(TrackArgs),
    /// Print version information and exit.
    Version,
}

/// Identifies an owner either by hash or by P2PK public key.
#[derive(Args, Debug)]
pub struct OwnerArgs {
    /// Owner hash, 64 hex digits (optional `0x`).
    #[arg(long, required_unless_present = "pubkey", conflicts_with = "pubkey")]
    pub owner: Option<String>,

    /// P2PK public key; the owner hash is its Keccak-256.
    #[arg(long)]
    pub pubkey: Option<String>,
}

/// Arguments for the `apply` subcommand.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Block file: `{"height": N, "transactions": [...]}`.
    pub file: PathBuf,
}

/// Arguments for the `token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Token key, `<tx_hash>_<idx>`.
    pub key: String,

    /// Resolution height. Latest state when omitted.
    #[arg(long)]
    pub height: Option<u64>,
}

/// Paging cursor shared by vault queries.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Row offset to start from (the `end` of the previous page).
    #[arg(long, default_value_t = 0)]
    pub start: u64,

    /// Rows to scan; 0 uses the configured default.
    #[arg(long, default_value_t = 0)]
    pub cnt: u64,
}

/// Arguments for the `select` subcommand.
#[derive(Args, Debug)]
pub struct SelectArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,

    /// Value to cover, in decimal.
    #[arg(long)]
    pub target: String,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Row state filter for `vault`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateFilter {
    Unspent,
    Spent,
}

impl From<StateFilter> for TokenState {
    fn from(filter: StateFilter) -> Self {
        match filter {
            StateFilter::Unspent => TokenState::Unspent,
            StateFilter::Spent => TokenState::Spent,
        }
    }
}

/// Arguments for the `vault` subcommand.
#[derive(Args, Debug)]
pub struct VaultArgs {
    #[command(flatten)]
    pub owner: OwnerArgs,

    /// Only rows in this state.
    #[arg(long, value_enum)]
    pub state: Option<StateFilter>,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments for the `track` subcommand.
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Token key, `<tx_hash>_<idx>`.
    pub key: String,
}
