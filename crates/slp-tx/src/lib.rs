//! slp-tx: SLP transaction building for Bitcoin Cash
//!
//! Token UTXO selection, OP_RETURN metadata encoding and decoding, amount
//! conversion and unsigned transaction assembly.

pub mod amount;
pub mod draft;
pub mod op_return;
pub mod script;
pub mod tx_builder;
pub mod utxo_selector;

pub use amount::{from_raw_amount, to_raw_amount};
pub use draft::*;
pub use op_return::{
    build_genesis, build_mint, build_multi_send, build_nft_child_genesis, build_send,
    parse_op_return, GenesisInfo, GenesisParams, ParsedOpReturn, SlpTxType, TokenType, LOKAD_ID,
    MAX_OP_RETURN_BYTES, MAX_SEND_QUANTITIES,
};
pub use tx_builder::{
    build_genesis_tx, build_multi_send_tx, build_nft_child_genesis_tx, build_send_tx,
    ChangeAddresses, GenesisBuildResult, GenesisSummary, SendBuildResult, SendSummary,
};
pub use utxo_selector::{
    select_funding, select_nft_parent_utxo, select_token_utxos, FundingSelection, TokenSelection,
};
