//! Seam to the contract execution engine.
//!
//! The ledger decides *whether* bookkeeping is consistent (the token exists,
//! it is unspent, heights move forward). Whether a spend is *allowed*, and
//! which contract guards a new token, belongs to the engine that runs the
//! `General` / `CaseBased` validation contracts. That engine plugs in here.

use primitive_types::H160;

use super::types::{UtxoTxIn, UtxoTxOut};
use crate::error::LedgerResult;
use crate::token::{BlockHeight, ContractType, Token, TokenKey};

/// Validation contract chosen for a new token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractBinding {
    pub address: H160,
    pub contract_type: ContractType,
}

/// Hooks the executor calls while applying a transaction.
///
/// Returning an error aborts the whole transaction; nothing it staged
/// becomes visible.
pub trait ValidationEngine {
    /// Approve consuming `token` (resolved at the latest height) for `input`.
    fn check_spend(
        &self,
        token: &Token,
        input: &UtxoTxIn,
        height: BlockHeight,
    ) -> LedgerResult<()>;

    /// Pick the validation contract for the token produced by `output`.
    fn bind_validation_contract(
        &self,
        key: &TokenKey,
        output: &UtxoTxOut,
        height: BlockHeight,
    ) -> LedgerResult<ContractBinding>;
}

/// Engine that approves every spend and trusts the addresses in the output.
///
/// An output naming a template (`init_contract`) becomes `CaseBased` and is
/// bound to its `validation_contract`, which is the instance address the
/// host engine produced from that template. Everything else is `General`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughEngine;

impl ValidationEngine for PassthroughEngine {
    fn check_spend(
        &self,
        _token: &Token,
        _input: &UtxoTxIn,
        _height: BlockHeight,
    ) -> LedgerResult<()> {
        Ok(())
    }

    fn bind_validation_contract(
        &self,
        _key: &TokenKey,
        output: &UtxoTxOut,
        _height: BlockHeight,
    ) -> LedgerResult<ContractBinding> {
        let contract_type = if output.has_init_contract() {
            ContractType::CaseBased
        } else {
            ContractType::General
        };
        Ok(ContractBinding {
            address: output.validation_contract,
            contract_type,
        })
    }
}
