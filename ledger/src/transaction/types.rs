//! Transaction-construction descriptors.
//!
//! These come out of the host chain's transaction after preliminary
//! verification and are consumed by the block executor. They are never
//! persisted as-is: the executor turns them into token records and a
//! [`UtxoTx`](super::UtxoTx).

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};

use crate::token::TokenKey;

/// One token being consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoTxIn {
    pub token_key: TokenKey,
    /// Function and params for logical validation (`General` and `CaseBased`).
    #[serde(default)]
    pub call_func_and_params: String,
    /// Function and params for the global-state update (`General` only).
    #[serde(default)]
    pub exe_func_and_params: String,
    /// Comment stored on the `Spent` snapshot.
    #[serde(default)]
    pub detail: String,
}

impl UtxoTxIn {
    pub fn new(token_key: TokenKey) -> Self {
        Self {
            token_key,
            call_func_and_params: String::new(),
            exe_func_and_params: String::new(),
            detail: String::new(),
        }
    }

    pub fn with_call(mut self, call: impl Into<String>, exe: impl Into<String>) -> Self {
        self.call_func_and_params = call.into();
        self.exe_func_and_params = exe.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// One token being produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoTxOut {
    /// Payee: public key for `P2PK`, account hash hex for `P2PKH`.
    pub to: String,
    pub value: U256,
    /// Raw ownership tag from the host chain. Parsed strictly on apply.
    pub check_type: String,
    /// Template contract used to initialize a per-token validation contract.
    #[serde(default)]
    pub init_contract: H160,
    #[serde(default)]
    pub init_func_and_params: String,
    #[serde(default)]
    pub validation_contract: H160,
    /// Comment stored on the first `Unspent` snapshot.
    #[serde(default)]
    pub detail: String,
}

impl UtxoTxOut {
    pub fn new(
        to: impl Into<String>,
        value: impl Into<U256>,
        check_type: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            value: value.into(),
            check_type: check_type.into(),
            init_contract: H160::zero(),
            init_func_and_params: String::new(),
            validation_contract: H160::zero(),
            detail: String::new(),
        }
    }

    pub fn with_validation_contract(mut self, address: H160) -> Self {
        self.validation_contract = address;
        self
    }

    pub fn with_init_contract(mut self, template: H160, params: impl Into<String>) -> Self {
        self.init_contract = template;
        self.init_func_and_params = params.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Whether this output asks for a per-token contract instance.
    pub fn has_init_contract(&self) -> bool {
        !self.init_contract.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::H256;

    #[test]
    fn out_json_defaults_optional_fields() {
        let json = r#"{"to":"alice","value":"0x64","check_type":"P2PK"}"#;
        let out: UtxoTxOut = serde_json::from_str(json).unwrap();
        assert_eq!(out.value, U256::from(100));
        assert!(out.init_contract.is_zero());
        assert!(!out.has_init_contract());
        assert!(out.detail.is_empty());
    }

    #[test]
    fn in_json_parses_token_key() {
        let key = TokenKey::new(H256::repeat_byte(2), U256::from(4));
        let json = format!(r#"{{"token_key":"{key}","detail":"spend"}}"#);
        let input: UtxoTxIn = serde_json::from_str(&json).unwrap();
        assert_eq!(input.token_key, key);
        assert_eq!(input.detail, "spend");
    }

    #[test]
    fn in_json_rejects_bad_key() {
        let json = r#"{"token_key":"nope"}"#;
        assert!(serde_json::from_str::<UtxoTxIn>(json).is_err());
    }

    #[test]
    fn builders_set_fields() {
        let out = UtxoTxOut::new("bob", 5u64, "P2PKH")
            .with_init_contract(H160::repeat_byte(1), "init(1)")
            .with_detail("change");
        assert!(out.has_init_contract());
        assert_eq!(out.init_func_and_params, "init(1)");
        assert_eq!(out.detail, "change");
    }
}
