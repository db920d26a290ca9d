//! Draft transaction structures
//!
//! Unsigned transactions handed to the wallet for signing and broadcast.
//! Output order is significant: SLP quantities in the OP_RETURN refer to
//! outputs by position, so drafts are never shuffled.

use serde::{Deserialize, Serialize};

use slp_core::{Address, Satoshi, TokenId, TxId};

/// A spendable ledger output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    pub txid: TxId,
    pub vout: u32,
    pub value: Satoshi,
    /// Locking script (hex), carried through for the signer
    #[serde(default)]
    pub script_pubkey: String,
}

impl UnspentOutput {
    pub fn new(txid: impl Into<String>, vout: u32, value: Satoshi) -> Self {
        Self {
            txid: TxId::new(txid),
            vout,
            value,
            script_pubkey: String::new(),
        }
    }

    /// `txid:vout` reference
    pub fn outpoint(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }
}

/// An output carrying an SLP token balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUtxo {
    pub token_id: TokenId,
    pub amount_raw: u64,
    pub output: UnspentOutput,
}

impl TokenUtxo {
    pub fn new(token_id: TokenId, amount_raw: u64, output: UnspentOutput) -> Self {
        Self {
            token_id,
            amount_raw,
            output,
        }
    }
}

/// Draft output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum DraftOutput {
    /// Zero-value null-data output
    OpReturn { script: String },
    /// Payment to an address
    PayTo { address: Address, value: Satoshi },
}

impl DraftOutput {
    pub fn op_return(script: &[u8]) -> Self {
        Self::OpReturn {
            script: hex::encode(script),
        }
    }

    pub fn pay_to(address: &Address, value: Satoshi) -> Self {
        Self::PayTo {
            address: address.clone(),
            value,
        }
    }

    pub fn value(&self) -> Satoshi {
        match self {
            Self::OpReturn { .. } => 0,
            Self::PayTo { value, .. } => *value,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::OpReturn { .. } => None,
            Self::PayTo { address, .. } => Some(address),
        }
    }
}

/// Complete unsigned transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTransaction {
    pub inputs: Vec<UnspentOutput>,
    pub outputs: Vec<DraftOutput>,
}

impl DraftTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_input_value(&self) -> Satoshi {
        self.inputs.iter().map(|i| i.value).sum()
    }

    pub fn total_output_value(&self) -> Satoshi {
        self.outputs.iter().map(DraftOutput::value).sum()
    }

    /// Fee implied by inputs minus outputs
    pub fn implied_fee(&self) -> Satoshi {
        self.total_input_value() - self.total_output_value()
    }

    /// Decoded OP_RETURN script, if output 0 is one
    pub fn op_return_script(&self) -> Option<Vec<u8>> {
        match self.outputs.first()? {
            DraftOutput::OpReturn { script } => hex::decode(script).ok(),
            DraftOutput::PayTo { .. } => None,
        }
    }

    pub fn to_json(&self) -> slp_core::Result<String> {
        serde_json::to_string(self).map_err(|e| slp_core::Error::Serialization(e.to_string()))
    }
}
