//! The spend graph node: which tokens a transaction consumed and which it
//! produced. Written once under `TX#<tx_hash>`, never updated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{FieldReader, FieldWriter, Record};
use crate::error::LedgerResult;
use crate::token::TokenKey;

/// Historical record of one UTXO transaction.
///
/// Whether the inputs were actually unspent when consumed is checked by the
/// executor, not by this record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoTx {
    in_token_key: Vec<TokenKey>,
    out_token_key: Vec<TokenKey>,
}

impl UtxoTx {
    pub fn new(in_token_key: Vec<TokenKey>, out_token_key: Vec<TokenKey>) -> Self {
        Self {
            in_token_key,
            out_token_key,
        }
    }

    /// Tokens consumed, in input order.
    pub fn inputs(&self) -> &[TokenKey] {
        &self.in_token_key
    }

    /// Tokens produced, in output order.
    pub fn outputs(&self) -> &[TokenKey] {
        &self.out_token_key
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn read_keys(r: &mut FieldReader) -> LedgerResult<Vec<TokenKey>> {
    r.list(|r| {
        let text = r.string()?;
        text.parse()
            .map_err(|_| r.malformed(format!("bad token key {text:?}")))
    })
}

impl Record for UtxoTx {
    const NAME: &'static str = "UTXOTx";
    const FIELD_COUNT: usize = 2;

    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()> {
        w.list(&self.in_token_key, |w, k| w.str(&k.to_string()))?;
        w.list(&self.out_token_key, |w, k| w.str(&k.to_string()))
    }

    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self> {
        Ok(Self {
            in_token_key: read_keys(r)?,
            out_token_key: read_keys(r)?,
        })
    }
}

impl fmt::Display for UtxoTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UTXOTx[{} in, {} out]",
            self.in_token_key.len(),
            self.out_token_key.len()
        )
    }
}
