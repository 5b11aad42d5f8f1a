// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strata Node
//!
//! Entry point for the `strata-node` binary: an operator CLI over a local
//! Strata UTXO ledger. Results go to stdout as JSON; logs go to stderr.
//!
//! - `init`     create the data directory and an empty ledger
//! - `register` index an owner's tokens in the vault
//! - `apply`    apply a block file
//! - `token`    resolve a token at a height
//! - `select`   pick unspent tokens covering a value
//! - `vault`    list an owner's vault rows
//! - `balance`  sum an owner's unspent tokens
//! - `track`    walk a token's lineage
//! - `version`  print build version information

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::{Commands, StrataNodeCli};
use commands::NodeEnv;

fn main() -> Result<()> {
    let cli = StrataNodeCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    logging::init_logging("strata_node=info,strata_ledger=info", cli.log_format);
    tracing::debug!(data_dir = %cli.data_dir.display(), "strata-node starting");

    let env = NodeEnv::new(cli.data_dir, cli.config);
    match &cli.command {
        Commands::Init => commands::init(&env),
        Commands::Register(args) => commands::register(&env, args),
        Commands::Apply(args) => commands::apply(&env, args),
        Commands::Token(args) => commands::token(&env, args),
        Commands::Select(args) => commands::select(&env, args),
        Commands::Vault(args) => commands::vault(&env, args),
        Commands::Balance(args) => commands::balance(&env, args),
        Commands::Track(args) => commands::track(&env, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Prints version information for the binary and the ledger it links.
fn print_version() {
    println!("strata-node {}", env!("CARGO_PKG_VERSION"));
    println!("ledger      {}", strata_ledger::VERSION);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
