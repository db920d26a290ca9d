//! Async wallet facade
//!
//! Each operation gathers UTXOs and addresses from the backend, runs the
//! selection and assembly on a blocking task, then hands the draft to the
//! backend for signing. A per-wallet lock is held from UTXO lookup until the
//! broadcast returns, so concurrent requests never pick the same outputs.

use std::sync::Arc;

use tokio::sync::Mutex;

use slp_core::{Address, TokenDescriptor, TokenId, TokenKind, TxError, TxId, WalletConfig};
use slp_tx::{
    build_genesis_tx, build_multi_send_tx, build_nft_child_genesis_tx, build_send_tx,
    select_token_utxos, to_raw_amount, ChangeAddresses, DraftTransaction, GenesisParams,
    TokenType,
};

use crate::backend::WalletBackend;
use crate::error::{Result, WalletError};

/// SLP wallet over a [`WalletBackend`]
pub struct SlpWallet<B> {
    backend: Arc<B>,
    config: WalletConfig,
    selection_lock: Mutex<()>,
}

impl<B: WalletBackend> SlpWallet<B> {
    pub fn new(backend: B, config: WalletConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config,
            selection_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send a decimal `amount` of a fungible token to `to`
    pub async fn send_tokens(
        &self,
        token_id: &TokenId,
        amount: &str,
        to: &Address,
    ) -> Result<TxId> {
        let token = self.descriptor(token_id).await?;
        let raw = to_raw_amount(amount, &token)?;
        self.send_raw(&token, vec![(to.clone(), raw)]).await
    }

    /// Send a single NFT1 child token to `to`
    pub async fn send_nft(&self, token_id: &TokenId, to: &Address) -> Result<TxId> {
        let token = self.descriptor(token_id).await?;
        if !token.is_nft() {
            return Err(WalletError::NotAnNft {
                token_id: *token_id,
            });
        }
        self.send_raw(&token, vec![(to.clone(), 1)]).await
    }

    /// Pay several recipients raw token amounts in one SEND, outputs in the
    /// order given
    pub async fn send_tokens_multi(
        &self,
        token_id: &TokenId,
        recipients: &[(Address, u64)],
    ) -> Result<TxId> {
        let token = self.descriptor(token_id).await?;
        self.send_raw(&token, recipients.to_vec()).await
    }

    /// Create a fungible token or NFT1 group. The supply goes to `receiver`;
    /// a `baton_receiver` makes the token mintable.
    pub async fn create_genesis(
        &self,
        token_type: TokenType,
        params: GenesisParams,
        receiver: &Address,
        baton_receiver: Option<&Address>,
    ) -> Result<TxId> {
        self.check_network(receiver)?;
        if let Some(baton) = baton_receiver {
            self.check_network(baton)?;
        }

        let _guard = self.selection_lock.lock().await;
        let plain = self.backend.plain_utxos(self.config.allow_unconfirmed).await?;
        let change_address = self.backend.change_address().await?;
        let fees = self.config.fees.clone();
        let receiver = receiver.clone();
        let baton_receiver = baton_receiver.cloned();

        let built = run_blocking(move || {
            build_genesis_tx(
                token_type,
                &params,
                &plain,
                &receiver,
                baton_receiver.as_ref(),
                &change_address,
                &fees,
            )
        })
        .await?;

        tracing::info!(
            ticker = %built.summary.ticker,
            fee = built.summary.fee,
            mint_baton = ?built.summary.mint_baton_vout,
            "Submitting GENESIS for signing"
        );
        self.broadcast(built.unsigned_tx).await
    }

    /// Mint an NFT1 child by burning one unit of the group `parent_id`
    pub async fn create_nft_child_genesis(
        &self,
        parent_id: &TokenId,
        ticker: &str,
        name: &str,
        document_url: &str,
        receiver: &Address,
    ) -> Result<TxId> {
        self.check_network(receiver)?;

        let _guard = self.selection_lock.lock().await;
        let allow_unconfirmed = self.config.allow_unconfirmed;
        let parents = self.backend.token_utxos(parent_id, allow_unconfirmed).await?;
        let plain = self.backend.plain_utxos(allow_unconfirmed).await?;
        let change_address = self.backend.change_address().await?;
        let fees = self.config.fees.clone();
        let parent_id = *parent_id;
        let (ticker, name, document_url) =
            (ticker.to_string(), name.to_string(), document_url.to_string());
        let receiver = receiver.clone();

        let built = run_blocking(move || {
            build_nft_child_genesis_tx(
                &parent_id,
                &parents,
                &plain,
                &ticker,
                &name,
                &document_url,
                &receiver,
                &change_address,
                &fees,
            )
        })
        .await?;

        tracing::info!(
            parent_id = %parent_id,
            burned_parent = ?built.summary.burned_parent,
            fee = built.summary.fee,
            "Submitting NFT child GENESIS for signing"
        );
        self.broadcast(built.unsigned_tx).await
    }

    async fn send_raw(
        &self,
        token: &TokenDescriptor,
        recipients: Vec<(Address, u64)>,
    ) -> Result<TxId> {
        if recipients.is_empty() {
            return Err(TxError::NoRecipients.into());
        }
        for (address, _) in &recipients {
            self.check_network(address)?;
        }

        let _guard = self.selection_lock.lock().await;
        let allow_unconfirmed = self.config.allow_unconfirmed;
        let token_utxos = self
            .backend
            .token_utxos(&token.token_id, allow_unconfirmed)
            .await?;
        let plain = self.backend.plain_utxos(allow_unconfirmed).await?;
        let change = ChangeAddresses {
            token: self.backend.token_change_address().await?,
            currency: self.backend.change_address().await?,
        };
        let token_type = token_type_for(token);
        let token_id = token.token_id;
        let fees = self.config.fees.clone();

        let built = run_blocking(move || {
            let requested: Vec<u64> = recipients.iter().map(|(_, qty)| *qty).collect();
            let selection =
                select_token_utxos(&token_id, &requested, &token_utxos, &plain, &fees)?;
            match recipients.as_slice() {
                [(to, _)] => build_send_tx(&selection, token_type, to, &change, &fees),
                _ => build_multi_send_tx(&selection, token_type, &recipients, &change, &fees),
            }
        })
        .await?;

        tracing::info!(
            token_id = %token_id,
            recipients = built.summary.recipient_quantities.len(),
            token_change = built.summary.token_change,
            fee = built.summary.fee,
            "Submitting SEND for signing"
        );
        self.broadcast(built.unsigned_tx).await
    }

    async fn descriptor(&self, token_id: &TokenId) -> Result<TokenDescriptor> {
        self.backend
            .token_descriptor(token_id)
            .await?
            .ok_or(WalletError::UnknownToken(*token_id))
    }

    async fn broadcast(&self, tx: DraftTransaction) -> Result<TxId> {
        let inputs = tx.inputs.len();
        let txid = self.backend.sign_and_broadcast(tx).await?;
        tracing::info!(txid = %txid, inputs, "Broadcast transaction");
        Ok(txid)
    }

    /// Reject addresses with a prefix from the other network. Unprefixed
    /// addresses are left to the backend.
    fn check_network(&self, address: &Address) -> Result<()> {
        match address.network() {
            Some(network) if network != self.config.network => Err(WalletError::NetworkMismatch {
                address: address.to_string(),
                expected: self.config.network.as_str().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn token_type_for(token: &TokenDescriptor) -> TokenType {
    match token.kind {
        TokenKind::Fungible => TokenType::Fungible,
        TokenKind::NftGroup => TokenType::NftParent,
        TokenKind::NonFungible { .. } => TokenType::NftChild,
    }
}

/// Run a pure build step off the async runtime
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> slp_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let built = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WalletError::Task(e.to_string()))??;
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use slp_core::{Network, SelectionError};
    use slp_tx::{parse_op_return, SlpTxType, TokenUtxo, UnspentOutput};

    #[derive(Default)]
    struct MockBackend {
        tokens: HashMap<TokenId, TokenDescriptor>,
        token_utxos: StdMutex<Vec<TokenUtxo>>,
        plain_utxos: StdMutex<Vec<UnspentOutput>>,
        broadcast: StdMutex<Vec<DraftTransaction>>,
    }

    impl MockBackend {
        fn with_token(mut self, token: TokenDescriptor) -> Self {
            self.tokens.insert(token.token_id, token);
            self
        }

        fn with_token_utxo(self, token_id: TokenId, txid: &str, amount: u64) -> Self {
            self.token_utxos.lock().unwrap().push(TokenUtxo::new(
                token_id,
                amount,
                UnspentOutput::new(txid, 1, 546),
            ));
            self
        }

        fn with_plain_utxo(self, txid: &str, value: i64) -> Self {
            self.plain_utxos
                .lock()
                .unwrap()
                .push(UnspentOutput::new(txid, 0, value));
            self
        }

        fn broadcast_txs(&self) -> Vec<DraftTransaction> {
            self.broadcast.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WalletBackend for MockBackend {
        async fn token_descriptor(&self, token_id: &TokenId) -> Result<Option<TokenDescriptor>> {
            Ok(self.tokens.get(token_id).cloned())
        }

        async fn token_utxos(
            &self,
            token_id: &TokenId,
            _include_unconfirmed: bool,
        ) -> Result<Vec<TokenUtxo>> {
            let utxos = self.token_utxos.lock().unwrap();
            Ok(utxos
                .iter()
                .filter(|u| u.token_id == *token_id)
                .cloned()
                .collect())
        }

        async fn plain_utxos(&self, _include_unconfirmed: bool) -> Result<Vec<UnspentOutput>> {
            Ok(self.plain_utxos.lock().unwrap().clone())
        }

        async fn token_change_address(&self) -> Result<Address> {
            Ok(Address::new("simpleledger:tokenchange"))
        }

        async fn change_address(&self) -> Result<Address> {
            Ok(Address::new("bitcoincash:change"))
        }

        async fn sign_and_broadcast(&self, tx: DraftTransaction) -> Result<TxId> {
            // let a competing request run before the spent outputs disappear
            tokio::task::yield_now().await;

            let spent: Vec<String> = tx.inputs.iter().map(|i| i.outpoint()).collect();
            self.token_utxos
                .lock()
                .unwrap()
                .retain(|u| !spent.contains(&u.output.outpoint()));
            self.plain_utxos
                .lock()
                .unwrap()
                .retain(|u| !spent.contains(&u.outpoint()));

            let mut broadcast = self.broadcast.lock().unwrap();
            broadcast.push(tx);
            Ok(TxId::new(format!("tx{}", broadcast.len())))
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn fungible_id() -> TokenId {
        TokenId::from_bytes([0x01; 32])
    }

    fn nft_id() -> TokenId {
        TokenId::from_bytes([0x41; 32])
    }

    fn group_id() -> TokenId {
        TokenId::from_bytes([0x81; 32])
    }

    fn bob() -> Address {
        Address::new("simpleledger:bob")
    }

    fn wallet(backend: MockBackend) -> SlpWallet<MockBackend> {
        SlpWallet::new(backend, WalletConfig::default())
    }

    fn funded_backend() -> MockBackend {
        MockBackend::default()
            .with_token(TokenDescriptor::fungible(fungible_id(), "FT", 2).unwrap())
            .with_token(TokenDescriptor::nft(nft_id(), Some(group_id()), "NFT", "One"))
            .with_plain_utxo("p1", 10_000)
            .with_plain_utxo("p2", 20_000)
    }

    #[tokio::test]
    async fn test_send_tokens_scales_and_broadcasts() {
        init_tracing();
        let backend = funded_backend()
            .with_token_utxo(fungible_id(), "t1", 200)
            .with_token_utxo(fungible_id(), "t2", 300);
        let wallet = wallet(backend);

        let txid = wallet
            .send_tokens(&fungible_id(), "2.5", &bob())
            .await
            .unwrap();
        assert_eq!(txid.as_str(), "tx1");

        let txs = wallet.backend().broadcast_txs();
        assert_eq!(txs.len(), 1);
        let script = txs[0].op_return_script().unwrap();
        let parsed = parse_op_return(&script).unwrap();
        assert_eq!(parsed.tx_type, SlpTxType::Send);
        // 250 raw: 200 + 300 selected, 250 back as change
        assert_eq!(parsed.quantities, vec![250, 250]);
        assert_eq!(txs[0].outputs[1].address(), Some(&bob()));
        assert_eq!(
            txs[0].outputs[2].address(),
            Some(&Address::new("simpleledger:tokenchange"))
        );
    }

    #[tokio::test]
    async fn test_send_tokens_rejects_excess_precision() {
        let wallet = wallet(funded_backend().with_token_utxo(fungible_id(), "t1", 1_000));

        let err = wallet
            .send_tokens(&fungible_id(), "1.234", &bob())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "precision");
        assert!(wallet.backend().broadcast_txs().is_empty());
    }

    #[tokio::test]
    async fn test_send_tokens_insufficient_balance() {
        let wallet = wallet(funded_backend().with_token_utxo(fungible_id(), "t1", 100));

        let err = wallet
            .send_tokens(&fungible_id(), "5", &bob())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WalletError::Core(slp_core::Error::Selection(
                SelectionError::InsufficientTokenBalance {
                    required: 500,
                    available: 100,
                    ..
                }
            ))
        ));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let wallet = wallet(funded_backend());
        let missing = TokenId::from_bytes([0xee; 32]);

        let err = wallet.send_tokens(&missing, "1", &bob()).await.unwrap_err();
        assert!(matches!(err, WalletError::UnknownToken(id) if id == missing));
    }

    #[tokio::test]
    async fn test_rejects_other_network_address() {
        let wallet = wallet(funded_backend().with_token_utxo(fungible_id(), "t1", 1_000));

        let err = wallet
            .send_tokens(&fungible_id(), "1", &Address::new("slptest:alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NetworkMismatch { .. }));
    }

    #[tokio::test]
    async fn test_send_nft() {
        let wallet = wallet(funded_backend().with_token_utxo(nft_id(), "n1", 1));

        wallet.send_nft(&nft_id(), &bob()).await.unwrap();

        let txs = wallet.backend().broadcast_txs();
        let parsed = parse_op_return(&txs[0].op_return_script().unwrap()).unwrap();
        assert_eq!(parsed.tx_type, SlpTxType::NftChildSend);
        assert_eq!(parsed.quantities, vec![1]);
    }

    #[tokio::test]
    async fn test_send_group_tokens_keeps_group_type() {
        let backend = funded_backend()
            .with_token(TokenDescriptor::nft_group(group_id(), "GRP", "Group", 0).unwrap())
            .with_token_utxo(group_id(), "g10", 10);
        let wallet = wallet(backend);
        let me = Address::new("simpleledger:me");

        wallet
            .send_tokens_multi(&group_id(), &[(me.clone(), 1), (me.clone(), 1)])
            .await
            .unwrap();

        let txs = wallet.backend().broadcast_txs();
        let parsed = parse_op_return(&txs[0].op_return_script().unwrap()).unwrap();
        assert_eq!(parsed.token_type, TokenType::NftParent);
        assert_eq!(parsed.tx_type, SlpTxType::NftParentSend);
        assert_eq!(parsed.token_id, Some(group_id()));
        assert_eq!(parsed.quantities, vec![1, 1, 8]);

        // group units are not sendable as NFT children
        let err = wallet.send_nft(&group_id(), &bob()).await.unwrap_err();
        assert!(matches!(err, WalletError::NotAnNft { .. }));
    }

    #[tokio::test]
    async fn test_send_nft_rejects_fungible_token() {
        let wallet = wallet(funded_backend().with_token_utxo(fungible_id(), "t1", 1));

        let err = wallet.send_nft(&fungible_id(), &bob()).await.unwrap_err();
        assert!(matches!(err, WalletError::NotAnNft { .. }));
    }

    #[tokio::test]
    async fn test_send_tokens_multi() {
        let wallet = wallet(funded_backend().with_token_utxo(fungible_id(), "t1", 1_000));
        let alice = Address::new("simpleledger:alice");

        wallet
            .send_tokens_multi(&fungible_id(), &[(alice.clone(), 100), (bob(), 250)])
            .await
            .unwrap();

        let txs = wallet.backend().broadcast_txs();
        let parsed = parse_op_return(&txs[0].op_return_script().unwrap()).unwrap();
        assert_eq!(parsed.quantities, vec![100, 250, 650]);
        assert_eq!(txs[0].outputs[1].address(), Some(&alice));
        assert_eq!(txs[0].outputs[2].address(), Some(&bob()));
    }

    #[tokio::test]
    async fn test_send_tokens_multi_requires_recipients() {
        let wallet = wallet(funded_backend());

        let err = wallet
            .send_tokens_multi(&fungible_id(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "no_recipients");
    }

    #[tokio::test]
    async fn test_create_genesis_with_baton() {
        let wallet = wallet(funded_backend());
        let params = GenesisParams {
            ticker: "NEW".to_string(),
            name: "New Token".to_string(),
            document_url: String::new(),
            document_hash: None,
            decimals: 8,
            mint_baton_vout: None,
            initial_quantity: 21_000_000,
        };

        wallet
            .create_genesis(
                TokenType::Fungible,
                params,
                &bob(),
                Some(&Address::new("simpleledger:minter")),
            )
            .await
            .unwrap();

        let txs = wallet.backend().broadcast_txs();
        let parsed = parse_op_return(&txs[0].op_return_script().unwrap()).unwrap();
        assert_eq!(parsed.tx_type, SlpTxType::Genesis);
        assert_eq!(parsed.mint_baton_vout, Some(2));
        assert_eq!(parsed.quantities, vec![21_000_000]);
        assert_eq!(txs[0].inputs[0].txid.as_str(), "p1");
    }

    #[tokio::test]
    async fn test_create_nft_child_genesis_burns_parent() {
        let wallet = wallet(funded_backend().with_token_utxo(group_id(), "g1", 1));

        wallet
            .create_nft_child_genesis(&group_id(), "NFT", "Child", "", &bob())
            .await
            .unwrap();

        let txs = wallet.backend().broadcast_txs();
        assert_eq!(txs[0].inputs[0].outpoint(), "g1:1");
        let parsed = parse_op_return(&txs[0].op_return_script().unwrap()).unwrap();
        assert_eq!(parsed.tx_type, SlpTxType::NftChildGenesis);

        // the only group unit is spent now
        let err = wallet
            .create_nft_child_genesis(&group_id(), "NFT", "Child 2", "", &bob())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "missing_parent_utxo");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sends_never_share_inputs() {
        init_tracing();
        let backend = funded_backend()
            .with_token_utxo(fungible_id(), "t1", 500)
            .with_token_utxo(fungible_id(), "t2", 500);
        let wallet = Arc::new(wallet(backend));

        let first = {
            let wallet = wallet.clone();
            tokio::spawn(async move { wallet.send_tokens(&fungible_id(), "5", &bob()).await })
        };
        let second = {
            let wallet = wallet.clone();
            tokio::spawn(async move { wallet.send_tokens(&fungible_id(), "5", &bob()).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let txs = wallet.backend().broadcast_txs();
        assert_eq!(txs.len(), 2);
        let first_inputs: Vec<String> = txs[0].inputs.iter().map(|i| i.outpoint()).collect();
        for input in &txs[1].inputs {
            assert!(!first_inputs.contains(&input.outpoint()));
        }
    }

    #[test]
    fn test_testnet_config_accepts_testnet_addresses() {
        let config = WalletConfig {
            network: Network::Testnet,
            ..WalletConfig::default()
        };
        let wallet = SlpWallet::new(MockBackend::default(), config);
        assert_eq!(wallet.config().network, Network::Testnet);
        assert!(wallet.check_network(&Address::new("slptest:alice")).is_ok());
        assert!(wallet.check_network(&Address::new("bchtest:alice")).is_ok());
        assert!(wallet
            .check_network(&Address::new("simpleledger:alice"))
            .is_err());
        assert!(wallet.check_network(&Address::new("alice")).is_ok());
    }
}
