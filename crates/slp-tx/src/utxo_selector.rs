//! Token-aware UTXO selection
//!
//! Two-pass strategy:
//! 1. Select outputs carrying the token, smallest token amount first, until
//!    the requested quantity is covered. Their BCH counts toward the fee.
//! 2. If that BCH does not cover the dust outputs plus fee, add plain BCH
//!    outputs, smallest value first.
//!
//! Smallest-first is not the minimum-input choice. It consolidates dust-sized
//! holdings, and the fee arithmetic below assumes it.

use slp_core::{FeeSchedule, Satoshi, SelectionError, TokenId};

use crate::draft::{TokenUtxo, UnspentOutput};

// =============================================================================
// Selection result
// =============================================================================

/// Result of token UTXO selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSelection {
    pub token_id: TokenId,
    /// `[requested]` or `[requested, token_change]`
    pub quantities: Vec<u64>,
    /// BCH left after dust outputs and fee
    pub change_satoshi: Satoshi,
    pub fee: Satoshi,
    /// BCH locked in dust outputs (recipients plus token change)
    pub send_satoshi: Satoshi,
    /// Token inputs first, then plain inputs, in selection order
    pub selected: Vec<UnspentOutput>,
    pub token_input_count: usize,
    pub input_tokens: u64,
}

impl TokenSelection {
    pub fn requested_tokens(&self) -> u64 {
        self.quantities.first().copied().unwrap_or(0)
    }

    pub fn token_change(&self) -> u64 {
        self.quantities.get(1).copied().unwrap_or(0)
    }

    pub fn has_token_change(&self) -> bool {
        self.quantities.len() == 2
    }

    pub fn token_inputs(&self) -> &[UnspentOutput] {
        let split = self.token_input_count.min(self.selected.len());
        &self.selected[..split]
    }

    pub fn plain_inputs(&self) -> &[UnspentOutput] {
        let split = self.token_input_count.min(self.selected.len());
        &self.selected[split..]
    }
}

/// Plain outputs picked to fund a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingSelection {
    pub selected: Vec<UnspentOutput>,
    /// BCH available after the selected inputs, net of their input fees
    pub total_satoshi: Satoshi,
}

// =============================================================================
// Selection functions
// =============================================================================

/// Select token and plain outputs to send `requested` raw amounts of `token_id`.
///
/// `requested` holds one amount per recipient. The first quantity of the
/// result is their sum; a second is present only when the selected token
/// inputs exceed it.
pub fn select_token_utxos(
    token_id: &TokenId,
    requested: &[u64],
    token_utxos: &[TokenUtxo],
    plain_utxos: &[UnspentOutput],
    fees: &FeeSchedule,
) -> Result<TokenSelection, SelectionError> {
    if requested.is_empty() {
        return Err(SelectionError::EmptyRequest);
    }

    let target_tokens = requested
        .iter()
        .try_fold(0u64, |acc, q| acc.checked_add(*q))
        .ok_or(SelectionError::QuantityOverflow)?;
    let mut send_satoshi = fees.dust_limit * requested.len() as Satoshi;

    // Pass 1: token outputs, smallest token amount first
    let mut candidates: Vec<&TokenUtxo> = token_utxos
        .iter()
        .filter(|u| u.token_id == *token_id)
        .collect();
    candidates.sort_by_key(|u| u.amount_raw);

    let mut selected = Vec::new();
    let mut input_tokens: u128 = 0;
    let mut input_satoshi: Satoshi = 0;

    for utxo in &candidates {
        if input_tokens >= target_tokens as u128 {
            break;
        }
        input_tokens += utxo.amount_raw as u128;
        input_satoshi += utxo.output.value - fees.input_fee;
        selected.push(utxo.output.clone());
    }

    if input_tokens < target_tokens as u128 {
        return Err(SelectionError::InsufficientTokenBalance {
            token_id: *token_id,
            required: target_tokens,
            available: input_tokens.min(u64::MAX as u128) as u64,
        });
    }
    // Token change lives in its own output and needs BCH to clear dust
    let change_tokens = (input_tokens - target_tokens as u128).min(u64::MAX as u128) as u64;
    if change_tokens > 0 {
        send_satoshi += fees.dust_limit;
    }

    let fee = fees.send_fee(requested.len());
    let token_input_count = selected.len();

    // Pass 2: plain outputs, only if token inputs do not already cover it
    let funding = select_funding(plain_utxos, input_satoshi, send_satoshi + fee, fees);
    selected.extend(funding.selected);

    let change_satoshi = funding.total_satoshi - send_satoshi - fee;
    if change_satoshi < 0 {
        return Err(SelectionError::InsufficientCurrencyBalance {
            required: send_satoshi + fee,
            available: funding.total_satoshi,
        });
    }

    let mut quantities = vec![target_tokens];
    if change_tokens > 0 {
        quantities.push(change_tokens);
    }

    tracing::debug!(
        token_id = %token_id,
        token_inputs = token_input_count,
        plain_inputs = selected.len() - token_input_count,
        fee,
        change_satoshi,
        change_tokens,
        "Selected token UTXOs"
    );

    Ok(TokenSelection {
        token_id: *token_id,
        quantities,
        change_satoshi,
        fee,
        send_satoshi,
        selected,
        token_input_count,
        input_tokens: input_tokens.min(u64::MAX as u128) as u64,
    })
}

/// Add plain outputs, smallest first, until the net BCH strictly exceeds `required`.
///
/// `already` is the net BCH contributed by inputs chosen earlier. Each added
/// output counts its value minus `fees.input_fee`. The caller decides whether
/// the result is sufficient.
pub fn select_funding(
    plain_utxos: &[UnspentOutput],
    already: Satoshi,
    required: Satoshi,
    fees: &FeeSchedule,
) -> FundingSelection {
    let mut candidates: Vec<&UnspentOutput> = plain_utxos.iter().collect();
    candidates.sort_by_key(|u| u.value);

    let mut selected = Vec::new();
    let mut total_satoshi = already;

    for utxo in candidates {
        if total_satoshi > required {
            break;
        }
        total_satoshi += utxo.value - fees.input_fee;
        selected.push(utxo.clone());
    }

    FundingSelection {
        selected,
        total_satoshi,
    }
}

/// Find an NFT1 parent output holding exactly one unit of `parent_id`
pub fn select_nft_parent_utxo<'a>(
    parent_id: &TokenId,
    parent_utxos: &'a [TokenUtxo],
) -> Result<&'a TokenUtxo, SelectionError> {
    parent_utxos
        .iter()
        .find(|u| u.token_id == *parent_id && u.amount_raw == 1)
        .ok_or(SelectionError::MissingParentUtxo {
            parent_id: *parent_id,
        })
}
