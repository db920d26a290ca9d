//! Core type definitions for SLP wallets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{AmountError, TokenIdError};

/// Token ID (32 bytes, the txid of the token's GENESIS transaction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId([u8; 32]);

impl TokenId {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a token id from a byte slice, which must be exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TokenIdError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TokenIdError::Length(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self, TokenIdError> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for TokenId {
    type Err = TokenIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Transaction ID (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger address in cashaddr or SLP-address form.
///
/// Encoding and checksum validation belong to the wallet; this type only
/// carries the string and classifies it by prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Network this address belongs to, if the prefix is recognised
    pub fn network(&self) -> Option<Network> {
        let prefix = self.0.split(':').next()?;
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| prefix == n.cashaddr_prefix() || prefix == n.slp_prefix())
    }

    /// Check if this is an SLP-form address (`simpleledger:` / `slptest:`)
    pub fn is_slp(&self) -> bool {
        let prefix = self.0.split(':').next().unwrap_or_default();
        prefix == Network::Mainnet.slp_prefix() || prefix == Network::Testnet.slp_prefix()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    pub fn cashaddr_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "bitcoincash",
            Self::Testnet => "bchtest",
        }
    }

    pub fn slp_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "simpleledger",
            Self::Testnet => "slptest",
        }
    }

    /// Smallest value a non-OP_RETURN output may carry and still relay
    pub fn min_non_dust_output(&self) -> Satoshi {
        constants::DUST_LIMIT
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a token is a plain fungible token, an NFT1 group or an NFT1 child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TokenKind {
    Fungible,
    /// NFT1 group (parent). Units are fungible and sent with the group
    /// token type; spending one mints a child.
    NftGroup,
    /// NFT1 child, minted by burning one unit of `parent_id`
    NonFungible {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<TokenId>,
    },
}

/// Token metadata as loaded from the token's GENESIS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub token_id: TokenId,
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    pub decimals: u8,
    pub kind: TokenKind,
}

impl TokenDescriptor {
    pub fn fungible(
        token_id: TokenId,
        ticker: impl Into<String>,
        decimals: u8,
    ) -> Result<Self, AmountError> {
        if decimals > constants::MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals { decimals });
        }
        Ok(Self {
            token_id,
            ticker: ticker.into(),
            name: String::new(),
            decimals,
            kind: TokenKind::Fungible,
        })
    }

    /// NFT1 group token. Only one-unit outputs can mint children, so
    /// groups usually carry 0 decimals.
    pub fn nft_group(
        token_id: TokenId,
        ticker: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Result<Self, AmountError> {
        if decimals > constants::MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals { decimals });
        }
        Ok(Self {
            token_id,
            ticker: ticker.into(),
            name: name.into(),
            decimals,
            kind: TokenKind::NftGroup,
        })
    }

    /// NFTs are indivisible, so decimals is always zero
    pub fn nft(
        token_id: TokenId,
        parent_id: Option<TokenId>,
        ticker: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            token_id,
            ticker: ticker.into(),
            name: name.into(),
            decimals: 0,
            kind: TokenKind::NonFungible { parent_id },
        }
    }

    pub fn is_nft(&self) -> bool {
        matches!(self.kind, TokenKind::NonFungible { .. })
    }

    pub fn is_nft_group(&self) -> bool {
        self.kind == TokenKind::NftGroup
    }
}

impl fmt::Display for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} decimals)", self.ticker, self.token_id, self.decimals)
    }
}

/// Satoshi amount. Signed so that net-of-fee accumulators can go negative.
pub type Satoshi = i64;

/// Constants
pub mod constants {
    use super::Satoshi;

    /// Minimum non-dust output value
    pub const DUST_LIMIT: Satoshi = 546;

    /// Estimated marginal fee of one signed P2PKH input at 1 sat/byte
    pub const INPUT_FEE: Satoshi = 148;

    /// Estimated fee weight of one P2PKH output
    pub const OUTPUT_FEE: Satoshi = 34;

    /// Fixed size of a SEND OP_RETURN output without quantities
    pub const OP_RETURN_BASE_BYTES: Satoshi = 55;

    /// Bytes added to the OP_RETURN per encoded quantity (push opcode + 8)
    pub const QUANTITY_BYTES: Satoshi = 9;

    /// Relay margin per output, low fee-rate transactions otherwise propagate poorly
    pub const PROPAGATION_FEE_PER_OUTPUT: Satoshi = 50;

    /// Default fee rate in satoshi per kilobyte
    pub const FEE_PER_KB: Satoshi = 1000;

    /// Largest decimal precision a token may declare
    pub const MAX_DECIMALS: u8 = 9;
}
