//! Subcommand handlers.
//!
//! Each handler opens the ledger under the data directory, performs one
//! operation, and prints the result as pretty JSON on stdout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use strata_ledger::token::{h256_to_hex, owner_hash, parse_h256_hex};
use strata_ledger::{
    BlockCommit, BlockHeight, CheckType, Ledger, LedgerConfig, PassthroughEngine, QueryUtxoParam,
    TokenKey, UtxoTxIn, UtxoTxOut,
};

use crate::cli::{ApplyArgs, OwnerArgs, PageArgs, SelectArgs, TokenArgs, TrackArgs, VaultArgs};

const CONFIG_FILE: &str = "config.json";
const DB_DIR: &str = "db";

// ---------------------------------------------------------------------------
// Block file
// ---------------------------------------------------------------------------

/// A block as read by `apply`.
///
/// ```json
/// {
///   "height": 7,
///   "transactions": [
///     {
///       "tx_hash": "0x…",
///       "inputs":  [{ "token_key": "<hash>_0" }],
///       "outputs": [{ "to": "alice", "value": "0x64", "check_type": "P2PK" }]
///     }
///   ]
/// }
/// ```
///
/// Values use the `0x`-prefixed hex quantity form.
#[derive(Debug, Deserialize)]
pub struct BlockFile {
    pub height: BlockHeight,
    #[serde(default)]
    pub transactions: Vec<TxFile>,
}

#[derive(Debug, Deserialize)]
pub struct TxFile {
    pub tx_hash: String,
    #[serde(default)]
    pub inputs: Vec<UtxoTxIn>,
    #[serde(default)]
    pub outputs: Vec<UtxoTxOut>,
}

impl BlockFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("{} is not a valid block file", path.display()))
    }
}

#[derive(Debug, Serialize)]
struct Rejected {
    tx_hash: String,
    error: String,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Where the ledger lives and how it is configured.
#[derive(Debug, Clone)]
pub struct NodeEnv {
    data_dir: PathBuf,
    config: Option<PathBuf>,
}

impl NodeEnv {
    pub fn new(data_dir: PathBuf, config: Option<PathBuf>) -> Self {
        Self { data_dir, config }
    }

    fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_DIR)
    }

    fn config(&self) -> Result<LedgerConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => {
                let path = self.data_dir.join(CONFIG_FILE);
                if !path.exists() {
                    return Ok(LedgerConfig::default());
                }
                path
            }
        };
        LedgerConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))
    }

    fn open(&self) -> Result<Ledger> {
        let db = self.db_path();
        if !db.exists() {
            bail!("no ledger at {}; run `strata-node init` first", db.display());
        }
        Ledger::open(&db, self.config()?)
            .with_context(|| format!("failed to open ledger at {}", db.display()))
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_owner(args: &OwnerArgs) -> Result<H256> {
    match (&args.owner, &args.pubkey) {
        (Some(hash), _) => Ok(owner_hash(hash, CheckType::P2PKH)?),
        (None, Some(pubkey)) => Ok(owner_hash(pubkey, CheckType::P2PK)?),
        (None, None) => bail!("either --owner or --pubkey is required"),
    }
}

fn page_of(args: &PageArgs) -> QueryUtxoParam {
    QueryUtxoParam::new(args.start, args.cnt)
}

fn parse_key(raw: &str) -> Result<TokenKey> {
    raw.parse::<TokenKey>()
        .with_context(|| format!("invalid token key {raw:?}"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub fn init(env: &NodeEnv) -> Result<()> {
    fs::create_dir_all(&env.data_dir)
        .with_context(|| format!("failed to create {}", env.data_dir.display()))?;

    let config_path = env.data_dir.join(CONFIG_FILE);
    if env.config.is_none() && !config_path.exists() {
        fs::write(&config_path, serde_json::to_vec_pretty(&LedgerConfig::default())?)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        info!(path = %config_path.display(), "default config written");
    }

    let ledger = Ledger::open(env.db_path(), env.config()?)
        .with_context(|| format!("failed to create ledger at {}", env.db_path().display()))?;
    info!(data_dir = %env.data_dir.display(), "ledger initialized");

    print_json(&json!({
        "data_dir": env.data_dir.display().to_string(),
        "latest_height": ledger.latest_height()?,
        "accounts": ledger.accounts().len(),
    }))
}

pub fn register(env: &NodeEnv, args: &OwnerArgs) -> Result<()> {
    let owner = resolve_owner(args)?;
    let ledger = env.open()?;
    let added = ledger.register_account(owner)?;
    print_json(&json!({
        "owner": h256_to_hex(&owner),
        "added": added,
        "balance": ledger.balance(&owner)?.to_string(),
    }))
}

/// Apply every transaction in the file as one block. Rejected transactions
/// are reported and leave no trace; the rest commit together.
pub fn apply(env: &NodeEnv, args: &ApplyArgs) -> Result<()> {
    let block = BlockFile::read(&args.file)?;
    let ledger = env.open()?;
    let (commit, rejected) = apply_block(&ledger, &block)?;
    print_json(&json!({
        "height": commit.height,
        "cache_root": commit.cache_root_hex(),
        "applied": commit.transactions.len(),
        "writes": commit.entries.len(),
        "rejected": rejected,
    }))
}

fn apply_block(ledger: &Ledger, block: &BlockFile) -> Result<(BlockCommit, Vec<Rejected>)> {
    let mut executor = ledger.begin_block(block.height)?;
    let mut rejected = Vec::new();
    for tx in &block.transactions {
        let applied = match parse_h256_hex(&tx.tx_hash) {
            Some(tx_hash) => executor
                .apply_transaction(tx_hash, &tx.inputs, &tx.outputs, &PassthroughEngine)
                .map_err(|e| e.to_string()),
            None => Err(format!("invalid tx_hash {:?}", tx.tx_hash)),
        };
        if let Err(error) = applied {
            warn!(tx_hash = %tx.tx_hash, %error, "transaction rejected");
            rejected.push(Rejected {
                tx_hash: tx.tx_hash.clone(),
                error,
            });
        }
    }
    Ok((ledger.commit_block(executor)?, rejected))
}

pub fn token(env: &NodeEnv, args: &TokenArgs) -> Result<()> {
    let key = parse_key(&args.key)?;
    let ledger = env.open()?;
    let token = match args.height {
        Some(height) => ledger.token(&key, height)?,
        None => ledger.latest_token(&key)?,
    };
    let history = ledger.token_history(&key)?;
    print_json(&json!({
        "token": token,
        "history": history.heights(),
    }))
}

pub fn select(env: &NodeEnv, args: &SelectArgs) -> Result<()> {
    let owner = resolve_owner(&args.owner)?;
    let target = U256::from_dec_str(&args.target)
        .map_err(|e| anyhow!("invalid target {:?}: {e:?}", args.target))?;
    let ledger = env.open()?;
    let selection = ledger.select_tokens(&owner, target, page_of(&args.page))?;
    print_json(&json!({
        "selection": &selection,
        "sufficient": selection.is_sufficient(),
        "shortfall": selection.shortfall().to_string(),
    }))
}

pub fn vault(env: &NodeEnv, args: &VaultArgs) -> Result<()> {
    let owner = resolve_owner(&args.owner)?;
    let ledger = env.open()?;
    let (rows, page) = ledger.list_vault(&owner, args.state.map(Into::into), page_of(&args.page))?;
    print_json(&json!({
        "owner": h256_to_hex(&owner),
        "rows": rows,
        "page": page,
    }))
}

pub fn balance(env: &NodeEnv, args: &OwnerArgs) -> Result<()> {
    let owner = resolve_owner(args)?;
    let ledger = env.open()?;
    print_json(&json!({
        "owner": h256_to_hex(&owner),
        "balance": ledger.balance(&owner)?.to_string(),
    }))
}

pub fn track(env: &NodeEnv, args: &TrackArgs) -> Result<()> {
    let key = parse_key(&args.key)?;
    let ledger = env.open()?;
    let lineage = ledger.track_token(&key)?;
    print_json(&lineage)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
