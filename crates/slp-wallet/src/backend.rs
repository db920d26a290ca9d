//! Collaborator interface for UTXO lookup, addresses and signing

use async_trait::async_trait;

use slp_core::{Address, TokenDescriptor, TokenId, TxId};
use slp_tx::{DraftTransaction, TokenUtxo, UnspentOutput};

use crate::error::Result;

/// Everything the wallet facade needs from the outside world.
///
/// Implementations own key material, the UTXO index and network access.
/// Plain outputs must not carry tokens; spending one as plain BCH burns its
/// tokens.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Metadata for `token_id`, `None` if the token is unknown
    async fn token_descriptor(&self, token_id: &TokenId) -> Result<Option<TokenDescriptor>>;

    /// Spendable outputs carrying `token_id`. NFT1 parent outputs are
    /// looked up through this method with the group id.
    async fn token_utxos(
        &self,
        token_id: &TokenId,
        include_unconfirmed: bool,
    ) -> Result<Vec<TokenUtxo>>;

    /// Spendable outputs with no tokens attached
    async fn plain_utxos(&self, include_unconfirmed: bool) -> Result<Vec<UnspentOutput>>;

    async fn token_change_address(&self) -> Result<Address>;

    async fn change_address(&self) -> Result<Address>;

    /// Sign every input of `tx` and broadcast it
    async fn sign_and_broadcast(&self, tx: DraftTransaction) -> Result<TxId>;
}
