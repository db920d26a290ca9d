//! Error types for SLP wallets

use thiserror::Error;

use crate::types::{Satoshi, TokenId};

/// Core errors that can occur while building token transactions
#[derive(Debug, Error)]
pub enum Error {
    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("OP_RETURN error: {0}")]
    OpReturn(#[from] OpReturnError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Invalid token id: {0}")]
    TokenId(#[from] TokenIdError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Amount(e) => e.error_code(),
            Self::Selection(e) => e.error_code(),
            Self::OpReturn(e) => e.error_code(),
            Self::Transaction(e) => e.error_code(),
            Self::TokenId(_) => "invalid_token_id",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Token id parsing errors
#[derive(Debug, Error)]
pub enum TokenIdError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

/// Decimal to raw amount conversion errors
#[derive(Debug, Error)]
pub enum AmountError {
    #[error("{ticker} supports maximum {decimals} decimals but amount is {amount}")]
    Precision {
        ticker: String,
        decimals: u8,
        amount: String,
    },

    #[error("Amount {amount} does not fit in 8 unsigned bytes")]
    Range { amount: String },

    #[error("Malformed decimal amount: {amount:?}")]
    Malformed { amount: String },

    #[error("Unsupported decimal precision {decimals} (maximum 9)")]
    UnsupportedDecimals { decimals: u8 },
}

impl AmountError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Precision { .. } => "precision",
            Self::Range { .. } => "range",
            Self::Malformed { .. } => "malformed_amount",
            Self::UnsupportedDecimals { .. } => "unsupported_decimals",
        }
    }
}

/// UTXO selection errors
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Insufficient token balance ({token_id}): need {required}, have {available}")]
    InsufficientTokenBalance {
        token_id: TokenId,
        required: u64,
        available: u64,
    },

    #[error("Insufficient BCH balance: need {required} satoshi, have {available}")]
    InsufficientCurrencyBalance {
        required: Satoshi,
        available: Satoshi,
    },

    #[error("No NFT1 parent UTXO holding exactly 1 unit of {parent_id}")]
    MissingParentUtxo { parent_id: TokenId },

    #[error("Requested token quantities overflow 8 unsigned bytes")]
    QuantityOverflow,

    #[error("No token quantities requested")]
    EmptyRequest,
}

impl SelectionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientTokenBalance { .. } => "insufficient_token_balance",
            Self::InsufficientCurrencyBalance { .. } => "insufficient_currency_balance",
            Self::MissingParentUtxo { .. } => "missing_parent_utxo",
            Self::QuantityOverflow => "quantity_overflow",
            Self::EmptyRequest => "empty_request",
        }
    }
}

/// OP_RETURN encoding and decoding errors
#[derive(Debug, Error)]
pub enum OpReturnError {
    #[error("Decimals must be 0-9, got {0}")]
    InvalidDecimals(u8),

    #[error("Mint baton vout must be at least 2, got {0}")]
    InvalidMintBatonVout(u8),

    #[error("SEND carries 1-19 quantities, got {0}")]
    InvalidQuantityCount(usize),

    #[error("{op} is not defined for token type 0x{token_type:02x}")]
    UnsupportedOperation { token_type: u8, op: &'static str },

    #[error("Script is not an OP_RETURN")]
    NotOpReturn,

    #[error("OP_RETURN does not carry the SLP lokad id")]
    NotSlp,

    #[error("Unknown token type 0x{0}")]
    UnknownTokenType(String),

    #[error("Unknown transaction type {0:?}")]
    UnknownTxType(String),

    #[error("Script truncated at byte {0}")]
    Truncated(usize),

    #[error("Unexpected opcode 0x{0:02x} in SLP payload")]
    UnexpectedOpcode(u8),

    #[error("Field {field} has invalid length {len}")]
    InvalidFieldLength { field: &'static str, len: usize },

    #[error("Expected {expected} chunks, got {actual}")]
    ChunkCount { expected: usize, actual: usize },

    #[error("NFT1 child GENESIS must have 0 decimals, no mint baton and quantity 1")]
    InvalidNftChildGenesis,

    #[error("OP_RETURN is {len} bytes, relay limit is {max}")]
    ScriptTooLarge { len: usize, max: usize },
}

impl OpReturnError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDecimals(_)
            | Self::InvalidMintBatonVout(_)
            | Self::InvalidQuantityCount(_)
            | Self::UnsupportedOperation { .. }
            | Self::InvalidNftChildGenesis
            | Self::ScriptTooLarge { .. } => "invalid_op_return_field",
            Self::NotOpReturn | Self::NotSlp => "not_slp",
            Self::UnknownTokenType(_)
            | Self::UnknownTxType(_)
            | Self::Truncated(_)
            | Self::UnexpectedOpcode(_)
            | Self::InvalidFieldLength { .. }
            | Self::ChunkCount { .. } => "malformed_op_return",
        }
    }
}

/// Transaction assembly errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("No recipients provided")]
    NoRecipients,

    #[error("Too many token outputs: {count} exceeds maximum of {max}")]
    TooManyOutputs { count: usize, max: usize },

    #[error("Selection covers {selected} raw tokens but recipients total {requested}")]
    AmountMismatch { selected: u64, requested: u64 },
}

impl TxError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoRecipients => "no_recipients",
            Self::TooManyOutputs { .. } => "too_many_outputs",
            Self::AmountMismatch { .. } => "amount_mismatch",
        }
    }
}

/// Result type alias for SLP operations
pub type Result<T> = std::result::Result<T, Error>;
