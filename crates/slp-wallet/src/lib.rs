//! slp-wallet: async facade for sending and minting SLP tokens
//!
//! Wraps the pure selection and assembly functions from `slp-tx` behind a
//! [`WalletBackend`] that supplies UTXOs and signs the result.

pub mod backend;
pub mod error;
pub mod wallet;

pub use backend::WalletBackend;
pub use error::{Result, WalletError};
pub use wallet::SlpWallet;
