//! Configuration types for SLP wallets

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::types::{constants, Network, Satoshi};

/// Fee and dust parameters used by UTXO selection.
///
/// The defaults assume P2PKH inputs and outputs at 1 sat/byte. Wallets
/// spending other script types should override `input_fee` and `output_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    #[serde(default = "default_dust_limit")]
    pub dust_limit: Satoshi,

    #[serde(default = "default_input_fee")]
    pub input_fee: Satoshi,

    #[serde(default = "default_output_fee")]
    pub output_fee: Satoshi,

    #[serde(default = "default_op_return_base_bytes")]
    pub op_return_base_bytes: Satoshi,

    #[serde(default = "default_quantity_bytes")]
    pub quantity_bytes: Satoshi,

    #[serde(default = "default_propagation_fee")]
    pub propagation_fee_per_output: Satoshi,
}

fn default_dust_limit() -> Satoshi {
    constants::DUST_LIMIT
}

fn default_input_fee() -> Satoshi {
    constants::INPUT_FEE
}

fn default_output_fee() -> Satoshi {
    constants::OUTPUT_FEE
}

fn default_op_return_base_bytes() -> Satoshi {
    constants::OP_RETURN_BASE_BYTES
}

fn default_quantity_bytes() -> Satoshi {
    constants::QUANTITY_BYTES
}

fn default_propagation_fee() -> Satoshi {
    constants::PROPAGATION_FEE_PER_OUTPUT
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            dust_limit: default_dust_limit(),
            input_fee: default_input_fee(),
            output_fee: default_output_fee(),
            op_return_base_bytes: default_op_return_base_bytes(),
            quantity_bytes: default_quantity_bytes(),
            propagation_fee_per_output: default_propagation_fee(),
        }
    }
}

impl FeeSchedule {
    /// Fee weight of `num_outputs` standard outputs
    pub fn output_fee(&self, num_outputs: usize) -> Satoshi {
        num_outputs as Satoshi * self.output_fee
    }

    /// Estimated size of a SEND OP_RETURN output carrying `num_quantities` amounts
    pub fn op_return_size(&self, num_quantities: usize) -> Satoshi {
        self.op_return_base_bytes + num_quantities as Satoshi * self.quantity_bytes
    }

    pub fn propagation_fee(&self, num_quantities: usize) -> Satoshi {
        (num_quantities as Satoshi + 1) * self.propagation_fee_per_output
    }

    /// Total fee for a token send with `num_quantities` recipient amounts.
    ///
    /// Outputs are counted as the recipients plus one change output; the
    /// OP_RETURN itself is covered by `op_return_size`.
    pub fn send_fee(&self, num_quantities: usize) -> Satoshi {
        self.output_fee(num_quantities + 1)
            + self.op_return_size(num_quantities)
            + self.propagation_fee(num_quantities)
    }

    /// Total fee for a GENESIS with a known payload size and `num_token_outputs`
    /// dust outputs (receiver, plus the mint baton if any)
    pub fn genesis_fee(&self, payload_len: usize, num_token_outputs: usize) -> Satoshi {
        self.output_fee(num_token_outputs + 1)
            + payload_len as Satoshi
            + self.propagation_fee(num_token_outputs)
    }
}

/// Wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    /// Network (mainnet or testnet)
    pub network: Network,

    /// Selection fee parameters
    #[serde(default)]
    pub fees: FeeSchedule,

    /// Fee rate handed to the signer
    #[serde(default = "default_fee_per_kb")]
    pub fee_per_kb: Satoshi,

    /// Allow spending unconfirmed outputs
    #[serde(default = "default_allow_unconfirmed")]
    pub allow_unconfirmed: bool,
}

fn default_fee_per_kb() -> Satoshi {
    constants::FEE_PER_KB
}

fn default_allow_unconfirmed() -> bool {
    true
}

impl WalletConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            fees: FeeSchedule::default(),
            fee_per_kb: default_fee_per_kb(),
            allow_unconfirmed: default_allow_unconfirmed(),
        }
    }
}
