//! Wallet facade errors

use thiserror::Error;

use slp_core::{AmountError, OpReturnError, SelectionError, TokenId, TxError};

/// Errors returned by [`crate::SlpWallet`]
#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Core(#[from] slp_core::Error),

    /// The UTXO source, key store or broadcaster failed
    #[error("Wallet backend error: {0}")]
    Backend(String),

    #[error("Unknown token: {0}")]
    UnknownToken(TokenId),

    #[error("Token {token_id} is not an NFT")]
    NotAnNft { token_id: TokenId },

    #[error("Address {address} is not on {expected}")]
    NetworkMismatch { address: String, expected: String },

    /// The blocking selection task panicked or was cancelled
    #[error("Selection task failed: {0}")]
    Task(String),
}

impl WalletError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.error_code(),
            Self::Backend(_) => "backend",
            Self::UnknownToken(_) => "unknown_token",
            Self::NotAnNft { .. } => "not_an_nft",
            Self::NetworkMismatch { .. } => "network_mismatch",
            Self::Task(_) => "task",
        }
    }
}

macro_rules! impl_from_core {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for WalletError {
                fn from(e: $ty) -> Self {
                    Self::Core(e.into())
                }
            }
        )*
    };
}

impl_from_core!(AmountError, SelectionError, OpReturnError, TxError);

pub type Result<T> = std::result::Result<T, WalletError>;
