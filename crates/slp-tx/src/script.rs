//! Minimal null-data script builder and push-data parser

use byteorder::{BigEndian, ByteOrder};

use slp_core::OpReturnError;

pub const OP_RETURN: u8 = 0x6a;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;

/// Largest data length pushed with a single length-prefix opcode
const MAX_DIRECT_PUSH: usize = 0x4b;

/// Builds an `OP_RETURN <push> <push> ...` script.
///
/// Every field is emitted as a data push, including single bytes that a
/// general-purpose builder would turn into `OP_1`..`OP_16`. Empty fields are
/// `OP_PUSHDATA1 0x00`.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    pub fn op_return() -> Self {
        Self {
            bytes: vec![OP_RETURN],
        }
    }

    pub fn push(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len == 0 {
            self.bytes.extend_from_slice(&[OP_PUSHDATA1, 0x00]);
        } else if len <= MAX_DIRECT_PUSH {
            self.bytes.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.bytes.extend_from_slice(&[OP_PUSHDATA1, len as u8]);
        } else if len <= u16::MAX as usize {
            self.bytes.push(OP_PUSHDATA2);
            self.bytes.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.bytes.push(OP_PUSHDATA4);
            self.bytes.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.bytes.extend_from_slice(data);
        self
    }

    /// Push an 8-byte big-endian quantity
    pub fn push_u64(self, value: u64) -> Self {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, value);
        self.push(&buf)
    }

    /// Push an optional single byte, empty when `None`
    pub fn push_opt_u8(self, value: Option<u8>) -> Self {
        match value {
            Some(v) => self.push(&[v]),
            None => self.push(&[]),
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Split an OP_RETURN script into its data pushes.
///
/// Any non-push opcode after the leading `OP_RETURN` is rejected, as is a
/// push whose declared length runs past the end of the script.
pub fn parse_pushes(script: &[u8]) -> Result<Vec<&[u8]>, OpReturnError> {
    match script.first() {
        Some(&OP_RETURN) => {}
        _ => return Err(OpReturnError::NotOpReturn),
    }

    let mut chunks = Vec::new();
    let mut pos = 1;
    while pos < script.len() {
        let opcode = script[pos];
        let (data_start, len) = match opcode {
            0x01..=0x4b => (pos + 1, opcode as usize),
            OP_PUSHDATA1 => {
                let len = *script.get(pos + 1).ok_or(OpReturnError::Truncated(pos))?;
                (pos + 2, len as usize)
            }
            OP_PUSHDATA2 => {
                let raw = script
                    .get(pos + 1..pos + 3)
                    .ok_or(OpReturnError::Truncated(pos))?;
                (pos + 3, u16::from_le_bytes([raw[0], raw[1]]) as usize)
            }
            OP_PUSHDATA4 => {
                let raw = script
                    .get(pos + 1..pos + 5)
                    .ok_or(OpReturnError::Truncated(pos))?;
                (
                    pos + 5,
                    u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize,
                )
            }
            other => return Err(OpReturnError::UnexpectedOpcode(other)),
        };

        let data = script
            .get(data_start..data_start + len)
            .ok_or(OpReturnError::Truncated(data_start))?;
        chunks.push(data);
        pos = data_start + len;
    }

    Ok(chunks)
}
