//! SLP OP_RETURN encoding and decoding
//!
//! Every SLP message is a null-data script of data pushes:
//!
//! ```text
//! GENESIS: OP_RETURN <"SLP\0"> <type> <"GENESIS"> <ticker> <name> <url> <hash> <decimals> <baton> <qty>
//! MINT:    OP_RETURN <"SLP\0"> <type> <"MINT"> <token_id> <baton> <qty>
//! SEND:    OP_RETURN <"SLP\0"> <type> <"SEND"> <token_id> <qty>{1,19}
//! ```
//!
//! Quantities are 8-byte big-endian. In a SEND the n-th quantity belongs to
//! output n+1 of the transaction.

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use slp_core::{OpReturnError, TokenId};

use crate::script::{parse_pushes, ScriptBuilder};

/// Protocol identifier pushed first in every SLP message
pub const LOKAD_ID: &[u8; 4] = b"SLP\0";

/// Maximum number of quantities in a SEND
pub const MAX_SEND_QUANTITIES: usize = 19;

/// Largest OP_RETURN script standard nodes relay
pub const MAX_OP_RETURN_BYTES: usize = 223;

const GENESIS: &[u8] = b"GENESIS";
const MINT: &[u8] = b"MINT";
const SEND: &[u8] = b"SEND";

/// SLP token type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    /// Token Type 1, fungible
    Fungible,
    /// NFT1 group token
    NftParent,
    /// NFT1 child, one unit per token
    NftChild,
}

impl TokenType {
    pub fn byte(&self) -> u8 {
        match self {
            Self::Fungible => 0x01,
            Self::NftParent => 0x81,
            Self::NftChild => 0x41,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Fungible),
            0x81 => Some(Self::NftParent),
            0x41 => Some(Self::NftChild),
            _ => None,
        }
    }
}

/// Combined token type and operation of a decoded SLP message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlpTxType {
    Genesis,
    Mint,
    Send,
    NftParentGenesis,
    NftParentMint,
    NftParentSend,
    NftChildGenesis,
    NftChildSend,
}

impl SlpTxType {
    fn classify(token_type: TokenType, keyword: &[u8]) -> Result<Self, OpReturnError> {
        let tx_type = match (token_type, keyword) {
            (TokenType::Fungible, GENESIS) => Self::Genesis,
            (TokenType::Fungible, MINT) => Self::Mint,
            (TokenType::Fungible, SEND) => Self::Send,
            (TokenType::NftParent, GENESIS) => Self::NftParentGenesis,
            (TokenType::NftParent, MINT) => Self::NftParentMint,
            (TokenType::NftParent, SEND) => Self::NftParentSend,
            (TokenType::NftChild, GENESIS) => Self::NftChildGenesis,
            (TokenType::NftChild, SEND) => Self::NftChildSend,
            (TokenType::NftChild, MINT) => {
                return Err(OpReturnError::UnsupportedOperation {
                    token_type: token_type.byte(),
                    op: "MINT",
                })
            }
            _ => {
                return Err(OpReturnError::UnknownTxType(
                    String::from_utf8_lossy(keyword).into_owned(),
                ))
            }
        };
        Ok(tx_type)
    }

    pub fn is_genesis(&self) -> bool {
        matches!(
            self,
            Self::Genesis | Self::NftParentGenesis | Self::NftChildGenesis
        )
    }

    pub fn is_mint(&self) -> bool {
        matches!(self, Self::Mint | Self::NftParentMint)
    }

    pub fn is_send(&self) -> bool {
        matches!(self, Self::Send | Self::NftParentSend | Self::NftChildSend)
    }
}

/// GENESIS fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisParams {
    pub ticker: String,
    pub name: String,
    pub document_url: String,
    #[serde(default)]
    pub document_hash: Option<[u8; 32]>,
    pub decimals: u8,
    /// Output index of the mint baton, `None` for a fixed supply
    #[serde(default)]
    pub mint_baton_vout: Option<u8>,
    pub initial_quantity: u64,
}

impl GenesisParams {
    /// NFT1 child genesis: one indivisible, non-reissuable unit
    pub fn nft_child(
        ticker: impl Into<String>,
        name: impl Into<String>,
        document_url: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            document_url: document_url.into(),
            document_hash: None,
            decimals: 0,
            mint_baton_vout: None,
            initial_quantity: 1,
        }
    }
}

/// Encode a GENESIS message
pub fn build_genesis(
    token_type: TokenType,
    params: &GenesisParams,
) -> Result<Vec<u8>, OpReturnError> {
    if params.decimals > slp_core::constants::MAX_DECIMALS {
        return Err(OpReturnError::InvalidDecimals(params.decimals));
    }
    check_baton_vout(params.mint_baton_vout)?;
    if token_type == TokenType::NftChild
        && (params.decimals != 0
            || params.mint_baton_vout.is_some()
            || params.initial_quantity != 1)
    {
        return Err(OpReturnError::InvalidNftChildGenesis);
    }

    let script = ScriptBuilder::op_return()
        .push(LOKAD_ID)
        .push(&[token_type.byte()])
        .push(GENESIS)
        .push(params.ticker.as_bytes())
        .push(params.name.as_bytes())
        .push(params.document_url.as_bytes())
        .push(params.document_hash.as_ref().map_or(&[][..], |h| &h[..]))
        .push(&[params.decimals])
        .push_opt_u8(params.mint_baton_vout)
        .push_u64(params.initial_quantity)
        .build();

    check_script_size(script)
}

/// Encode an NFT1 child GENESIS (decimals 0, no baton, quantity 1)
pub fn build_nft_child_genesis(
    ticker: &str,
    name: &str,
    document_url: &str,
) -> Result<Vec<u8>, OpReturnError> {
    build_genesis(
        TokenType::NftChild,
        &GenesisParams::nft_child(ticker, name, document_url),
    )
}

/// Encode a MINT message. NFT1 children cannot be minted.
pub fn build_mint(
    token_type: TokenType,
    token_id: &TokenId,
    mint_baton_vout: Option<u8>,
    quantity: u64,
) -> Result<Vec<u8>, OpReturnError> {
    if token_type == TokenType::NftChild {
        return Err(OpReturnError::UnsupportedOperation {
            token_type: token_type.byte(),
            op: "MINT",
        });
    }
    check_baton_vout(mint_baton_vout)?;

    Ok(ScriptBuilder::op_return()
        .push(LOKAD_ID)
        .push(&[token_type.byte()])
        .push(MINT)
        .push(token_id.as_bytes())
        .push_opt_u8(mint_baton_vout)
        .push_u64(quantity)
        .build())
}

/// Encode a SEND message with the given output quantities, in order
pub fn build_send(
    token_type: TokenType,
    token_id: &TokenId,
    quantities: &[u64],
) -> Result<Vec<u8>, OpReturnError> {
    if quantities.is_empty() || quantities.len() > MAX_SEND_QUANTITIES {
        return Err(OpReturnError::InvalidQuantityCount(quantities.len()));
    }

    let mut builder = ScriptBuilder::op_return()
        .push(LOKAD_ID)
        .push(&[token_type.byte()])
        .push(SEND)
        .push(token_id.as_bytes());
    for &qty in quantities {
        builder = builder.push_u64(qty);
    }
    Ok(builder.build())
}

/// Encode a payment-session SEND: one quantity per recipient in the order
/// given, then the token change if there is any.
pub fn build_multi_send(
    token_type: TokenType,
    token_id: &TokenId,
    recipient_quantities: &[u64],
    change: Option<u64>,
) -> Result<Vec<u8>, OpReturnError> {
    let mut quantities = recipient_quantities.to_vec();
    if let Some(change) = change.filter(|c| *c > 0) {
        quantities.push(change);
    }
    build_send(token_type, token_id, &quantities)
}

fn check_baton_vout(vout: Option<u8>) -> Result<(), OpReturnError> {
    match vout {
        Some(v) if v < 2 => Err(OpReturnError::InvalidMintBatonVout(v)),
        _ => Ok(()),
    }
}

fn check_script_size(script: Vec<u8>) -> Result<Vec<u8>, OpReturnError> {
    if script.len() > MAX_OP_RETURN_BYTES {
        return Err(OpReturnError::ScriptTooLarge {
            len: script.len(),
            max: MAX_OP_RETURN_BYTES,
        });
    }
    Ok(script)
}

// =============================================================================
// Decoding
// =============================================================================

/// GENESIS metadata recovered from a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisInfo {
    pub ticker: String,
    pub name: String,
    pub document_url: String,
    pub document_hash: Option<[u8; 32]>,
    pub decimals: u8,
}

/// A decoded SLP message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedOpReturn {
    pub token_type: TokenType,
    pub tx_type: SlpTxType,
    /// Token being minted or sent. GENESIS creates a new id (its own txid).
    pub token_id: Option<TokenId>,
    pub genesis: Option<GenesisInfo>,
    pub mint_baton_vout: Option<u8>,
    /// Output quantities, index 0 refers to output 1
    pub quantities: Vec<u64>,
}

impl ParsedOpReturn {
    pub fn has_mint_baton(&self) -> bool {
        self.mint_baton_vout.is_some()
    }
}

/// Decode an SLP OP_RETURN script
pub fn parse_op_return(script: &[u8]) -> Result<ParsedOpReturn, OpReturnError> {
    let chunks = parse_pushes(script)?;

    if chunks.first() != Some(&&LOKAD_ID[..]) {
        return Err(OpReturnError::NotSlp);
    }
    if chunks.len() < 3 {
        return Err(OpReturnError::ChunkCount {
            expected: 3,
            actual: chunks.len(),
        });
    }

    let type_chunk = chunks[1];
    let token_type = match type_chunk {
        [b] => TokenType::from_byte(*b),
        _ => None,
    }
    .ok_or_else(|| OpReturnError::UnknownTokenType(hex::encode(type_chunk)))?;

    let tx_type = SlpTxType::classify(token_type, chunks[2])?;
    let fields = &chunks[3..];

    if tx_type.is_genesis() {
        parse_genesis(token_type, tx_type, fields)
    } else if tx_type.is_mint() {
        parse_mint(token_type, tx_type, fields)
    } else {
        parse_send(token_type, tx_type, fields)
    }
}

fn parse_genesis(
    token_type: TokenType,
    tx_type: SlpTxType,
    fields: &[&[u8]],
) -> Result<ParsedOpReturn, OpReturnError> {
    if fields.len() != 7 {
        return Err(OpReturnError::ChunkCount {
            expected: 10,
            actual: fields.len() + 3,
        });
    }

    let document_hash = match fields[3].len() {
        0 => None,
        32 => {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(fields[3]);
            Some(hash)
        }
        len => {
            return Err(OpReturnError::InvalidFieldLength {
                field: "document_hash",
                len,
            })
        }
    };

    let decimals = single_byte(fields[4], "decimals")?;
    if decimals > slp_core::constants::MAX_DECIMALS {
        return Err(OpReturnError::InvalidDecimals(decimals));
    }
    let mint_baton_vout = optional_byte(fields[5], "mint_baton_vout")?;
    check_baton_vout(mint_baton_vout)?;
    let quantity = quantity(fields[6])?;

    if token_type == TokenType::NftChild
        && (decimals != 0 || mint_baton_vout.is_some() || quantity != 1)
    {
        return Err(OpReturnError::InvalidNftChildGenesis);
    }

    Ok(ParsedOpReturn {
        token_type,
        tx_type,
        token_id: None,
        genesis: Some(GenesisInfo {
            ticker: String::from_utf8_lossy(fields[0]).into_owned(),
            name: String::from_utf8_lossy(fields[1]).into_owned(),
            document_url: String::from_utf8_lossy(fields[2]).into_owned(),
            document_hash,
            decimals,
        }),
        mint_baton_vout,
        quantities: vec![quantity],
    })
}

fn parse_mint(
    token_type: TokenType,
    tx_type: SlpTxType,
    fields: &[&[u8]],
) -> Result<ParsedOpReturn, OpReturnError> {
    if fields.len() != 3 {
        return Err(OpReturnError::ChunkCount {
            expected: 6,
            actual: fields.len() + 3,
        });
    }

    let mint_baton_vout = optional_byte(fields[1], "mint_baton_vout")?;
    check_baton_vout(mint_baton_vout)?;

    Ok(ParsedOpReturn {
        token_type,
        tx_type,
        token_id: Some(token_id(fields[0])?),
        genesis: None,
        mint_baton_vout,
        quantities: vec![quantity(fields[2])?],
    })
}

fn parse_send(
    token_type: TokenType,
    tx_type: SlpTxType,
    fields: &[&[u8]],
) -> Result<ParsedOpReturn, OpReturnError> {
    let Some((id_chunk, qty_chunks)) = fields.split_first() else {
        return Err(OpReturnError::ChunkCount {
            expected: 5,
            actual: 3,
        });
    };
    if qty_chunks.is_empty() || qty_chunks.len() > MAX_SEND_QUANTITIES {
        return Err(OpReturnError::InvalidQuantityCount(qty_chunks.len()));
    }

    let quantities = qty_chunks
        .iter()
        .map(|c| quantity(c))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedOpReturn {
        token_type,
        tx_type,
        token_id: Some(token_id(id_chunk)?),
        genesis: None,
        mint_baton_vout: None,
        quantities,
    })
}

fn token_id(chunk: &[u8]) -> Result<TokenId, OpReturnError> {
    TokenId::from_slice(chunk).map_err(|_| OpReturnError::InvalidFieldLength {
        field: "token_id",
        len: chunk.len(),
    })
}

fn quantity(chunk: &[u8]) -> Result<u64, OpReturnError> {
    if chunk.len() != 8 {
        return Err(OpReturnError::InvalidFieldLength {
            field: "quantity",
            len: chunk.len(),
        });
    }
    Ok(BigEndian::read_u64(chunk))
}

fn single_byte(chunk: &[u8], field: &'static str) -> Result<u8, OpReturnError> {
    match chunk {
        [b] => Ok(*b),
        _ => Err(OpReturnError::InvalidFieldLength {
            field,
            len: chunk.len(),
        }),
    }
}

fn optional_byte(chunk: &[u8], field: &'static str) -> Result<Option<u8>, OpReturnError> {
    match chunk {
        [] => Ok(None),
        [b] => Ok(Some(*b)),
        _ => Err(OpReturnError::InvalidFieldLength {
            field,
            len: chunk.len(),
        }),
    }
}
