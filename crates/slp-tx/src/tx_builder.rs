//! SLP transaction assembly
//!
//! Turns a selection and an encoded OP_RETURN into an unsigned transaction.
//! Output order is fixed because SLP quantities are positional:
//!
//! 1. OP_RETURN (value 0)
//! 2. token outputs at dust, in quantity order (recipients, then token change
//!    or the mint baton)
//! 3. BCH change, only when it clears dust

use slp_core::{Address, FeeSchedule, Result, Satoshi, SelectionError, TokenId, TxError};

use crate::draft::{DraftOutput, DraftTransaction, TokenUtxo, UnspentOutput};
use crate::op_return::{
    build_genesis, build_multi_send, build_nft_child_genesis, build_send, GenesisParams,
    TokenType, MAX_SEND_QUANTITIES,
};
use crate::utxo_selector::{select_funding, select_nft_parent_utxo, TokenSelection};

/// Where leftover tokens and BCH go
#[derive(Debug, Clone)]
pub struct ChangeAddresses {
    /// Receives the token change dust output
    pub token: Address,
    pub currency: Address,
}

impl ChangeAddresses {
    /// Same address for both kinds of change
    pub fn single(address: &Address) -> Self {
        Self {
            token: address.clone(),
            currency: address.clone(),
        }
    }
}

/// Result of building a SEND transaction
#[derive(Debug)]
pub struct SendBuildResult {
    pub unsigned_tx: DraftTransaction,
    pub op_return: Vec<u8>,
    pub summary: SendSummary,
}

/// Summary of what the SEND transaction does
#[derive(Debug, Clone)]
pub struct SendSummary {
    pub token_id: TokenId,
    pub token_type: TokenType,
    pub recipient_quantities: Vec<u64>,
    pub token_change: u64,
    pub fee: Satoshi,
    /// Zero when the leftover was below dust and left to the miner
    pub change_satoshi: Satoshi,
    pub input_count: usize,
}

/// Result of building a GENESIS transaction
#[derive(Debug)]
pub struct GenesisBuildResult {
    pub unsigned_tx: DraftTransaction,
    pub op_return: Vec<u8>,
    pub summary: GenesisSummary,
}

#[derive(Debug, Clone)]
pub struct GenesisSummary {
    pub token_type: TokenType,
    pub ticker: String,
    pub initial_quantity: u64,
    pub mint_baton_vout: Option<u8>,
    pub fee: Satoshi,
    pub change_satoshi: Satoshi,
    /// Outpoint of the NFT1 parent unit burned by a child genesis
    pub burned_parent: Option<String>,
}

/// Build a single-recipient SEND from a selection.
///
/// The recipient receives `selection.quantities[0]`; token change, if any,
/// goes to `change.token`.
pub fn build_send_tx(
    selection: &TokenSelection,
    token_type: TokenType,
    recipient: &Address,
    change: &ChangeAddresses,
    fees: &FeeSchedule,
) -> Result<SendBuildResult> {
    let op_return = build_send(token_type, &selection.token_id, &selection.quantities)?;
    let recipients = [(recipient.clone(), selection.requested_tokens())];

    Ok(assemble_send(
        selection, token_type, &recipients, op_return, change, fees,
    ))
}

/// Build a SEND paying several recipients, one quantity each, in the order given.
///
/// `selection` must have been made for the same recipient amounts: its first
/// quantity has to equal their sum.
pub fn build_multi_send_tx(
    selection: &TokenSelection,
    token_type: TokenType,
    recipients: &[(Address, u64)],
    change: &ChangeAddresses,
    fees: &FeeSchedule,
) -> Result<SendBuildResult> {
    if recipients.is_empty() {
        return Err(TxError::NoRecipients.into());
    }
    if selection.quantities.is_empty() {
        return Err(SelectionError::EmptyRequest.into());
    }

    let requested = recipients
        .iter()
        .try_fold(0u64, |acc, (_, qty)| acc.checked_add(*qty))
        .ok_or(SelectionError::QuantityOverflow)?;
    if requested != selection.requested_tokens() {
        return Err(TxError::AmountMismatch {
            selected: selection.requested_tokens(),
            requested,
        }
        .into());
    }

    let count = recipients.len() + usize::from(selection.has_token_change());
    if count > MAX_SEND_QUANTITIES {
        return Err(TxError::TooManyOutputs {
            count,
            max: MAX_SEND_QUANTITIES,
        }
        .into());
    }

    let amounts: Vec<u64> = recipients.iter().map(|(_, qty)| *qty).collect();
    let op_return = build_multi_send(
        token_type,
        &selection.token_id,
        &amounts,
        Some(selection.token_change()),
    )?;

    Ok(assemble_send(
        selection, token_type, recipients, op_return, change, fees,
    ))
}

fn assemble_send(
    selection: &TokenSelection,
    token_type: TokenType,
    recipients: &[(Address, u64)],
    op_return: Vec<u8>,
    change: &ChangeAddresses,
    fees: &FeeSchedule,
) -> SendBuildResult {
    let mut outputs = vec![DraftOutput::op_return(&op_return)];
    outputs.extend(
        recipients
            .iter()
            .map(|(address, _)| DraftOutput::pay_to(address, fees.dust_limit)),
    );
    if selection.has_token_change() {
        outputs.push(DraftOutput::pay_to(&change.token, fees.dust_limit));
    }
    let change_satoshi = push_currency_change(&mut outputs, selection.change_satoshi, change, fees);

    let unsigned_tx = DraftTransaction {
        inputs: selection.selected.clone(),
        outputs,
    };

    tracing::debug!(
        token_id = %selection.token_id,
        recipients = recipients.len(),
        outputs = unsigned_tx.outputs.len(),
        "Assembled SEND transaction"
    );

    SendBuildResult {
        summary: SendSummary {
            token_id: selection.token_id,
            token_type,
            recipient_quantities: recipients.iter().map(|(_, qty)| *qty).collect(),
            token_change: selection.token_change(),
            fee: selection.fee,
            change_satoshi,
            input_count: unsigned_tx.inputs.len(),
        },
        unsigned_tx,
        op_return,
    }
}

/// Build a GENESIS for a fungible token or an NFT1 group.
///
/// The initial supply goes to `receiver` at output 1. With a `baton_receiver`
/// the mint baton is placed at output 2, overriding `params.mint_baton_vout`.
/// NFT1 children need a parent input; use [`build_nft_child_genesis_tx`].
pub fn build_genesis_tx(
    token_type: TokenType,
    params: &GenesisParams,
    plain_utxos: &[UnspentOutput],
    receiver: &Address,
    baton_receiver: Option<&Address>,
    change_address: &Address,
    fees: &FeeSchedule,
) -> Result<GenesisBuildResult> {
    if token_type == TokenType::NftChild {
        return Err(slp_core::OpReturnError::UnsupportedOperation {
            token_type: token_type.byte(),
            op: "GENESIS without parent",
        }
        .into());
    }

    let mut params = params.clone();
    params.mint_baton_vout = baton_receiver.map(|_| 2);
    let op_return = build_genesis(token_type, &params)?;

    let mut token_outputs = vec![receiver];
    token_outputs.extend(baton_receiver);

    assemble_genesis(
        token_type,
        &params,
        op_return,
        None,
        plain_utxos,
        &token_outputs,
        change_address,
        fees,
    )
}

/// Build an NFT1 child GENESIS, burning one unit of `parent_id`.
///
/// The parent output is always input 0. Fails with `MissingParentUtxo` when
/// no output holds exactly one unit of the parent.
#[allow(clippy::too_many_arguments)]
pub fn build_nft_child_genesis_tx(
    parent_id: &TokenId,
    parent_utxos: &[TokenUtxo],
    plain_utxos: &[UnspentOutput],
    ticker: &str,
    name: &str,
    document_url: &str,
    receiver: &Address,
    change_address: &Address,
    fees: &FeeSchedule,
) -> Result<GenesisBuildResult> {
    let parent = select_nft_parent_utxo(parent_id, parent_utxos)?;
    let op_return = build_nft_child_genesis(ticker, name, document_url)?;
    let params = GenesisParams::nft_child(ticker, name, document_url);

    assemble_genesis(
        TokenType::NftChild,
        &params,
        op_return,
        Some(&parent.output),
        plain_utxos,
        &[receiver],
        change_address,
        fees,
    )
}

#[allow(clippy::too_many_arguments)]
fn assemble_genesis(
    token_type: TokenType,
    params: &GenesisParams,
    op_return: Vec<u8>,
    parent: Option<&UnspentOutput>,
    plain_utxos: &[UnspentOutput],
    token_outputs: &[&Address],
    change_address: &Address,
    fees: &FeeSchedule,
) -> Result<GenesisBuildResult> {
    let send_satoshi = fees.dust_limit * token_outputs.len() as Satoshi;
    let fee = fees.genesis_fee(op_return.len(), token_outputs.len());
    let required = send_satoshi + fee;

    let already = parent.map_or(0, |p| p.value - fees.input_fee);
    let funding = select_funding(plain_utxos, already, required, fees);
    let leftover = funding.total_satoshi - required;
    if leftover < 0 {
        return Err(SelectionError::InsufficientCurrencyBalance {
            required,
            available: funding.total_satoshi,
        }
        .into());
    }

    let mut inputs: Vec<UnspentOutput> = parent.into_iter().cloned().collect();
    inputs.extend(funding.selected);

    let mut outputs = vec![DraftOutput::op_return(&op_return)];
    outputs.extend(
        token_outputs
            .iter()
            .map(|address| DraftOutput::pay_to(address, fees.dust_limit)),
    );
    let change = ChangeAddresses::single(change_address);
    let change_satoshi = push_currency_change(&mut outputs, leftover, &change, fees);

    tracing::debug!(
        token_type = ?token_type,
        ticker = %params.ticker,
        inputs = inputs.len(),
        fee,
        "Assembled GENESIS transaction"
    );

    Ok(GenesisBuildResult {
        unsigned_tx: DraftTransaction { inputs, outputs },
        op_return,
        summary: GenesisSummary {
            token_type,
            ticker: params.ticker.clone(),
            initial_quantity: params.initial_quantity,
            mint_baton_vout: params.mint_baton_vout,
            fee,
            change_satoshi,
            burned_parent: parent.map(UnspentOutput::outpoint),
        },
    })
}

/// Append the BCH change output if it clears dust. Returns the amount paid out.
fn push_currency_change(
    outputs: &mut Vec<DraftOutput>,
    change_satoshi: Satoshi,
    change: &ChangeAddresses,
    fees: &FeeSchedule,
) -> Satoshi {
    if change_satoshi >= fees.dust_limit {
        outputs.push(DraftOutput::pay_to(&change.currency, change_satoshi));
        change_satoshi
    } else {
        0
    }
}
