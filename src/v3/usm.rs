//! USM security parameters block (RFC 3414 Section 2.4).
//!
//! Carried inside the v3 message as an OCTET STRING wrapping a BER SEQUENCE:
//!
//! ```text
//! UsmSecurityParameters ::= SEQUENCE {
//!     msgAuthoritativeEngineID     OCTET STRING,
//!     msgAuthoritativeEngineBoots  INTEGER (0..2147483647),
//!     msgAuthoritativeEngineTime   INTEGER (0..2147483647),
//!     msgUserName                  OCTET STRING (SIZE(0..32)),
//!     msgAuthenticationParameters  OCTET STRING,
//!     msgPrivacyParameters         OCTET STRING
//! }
//! ```

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};

/// The 12-zero-byte placeholder that occupies msgAuthenticationParameters
/// while the signature is computed, and marks unauthenticated messages.
pub const AUTH_PLACEHOLDER: [u8; 12] = [0u8; 12];

/// Decoded USM security parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UsmSecurityParams {
    /// Authoritative engine ID.
    pub engine_id: Bytes,
    /// Engine boot count.
    pub engine_boots: u32,
    /// Engine time (seconds since last boot).
    pub engine_time: u32,
    /// User name.
    pub username: Bytes,
    /// Authentication parameters (HMAC-96 digest, placeholder, or empty).
    pub auth_params: Bytes,
    /// Privacy parameters (salt, or empty).
    pub priv_params: Bytes,
}

impl UsmSecurityParams {
    /// Whether the auth params field is absent or still the placeholder,
    /// i.e. the message carries no usable signature.
    pub fn is_unauthenticated(&self) -> bool {
        self.auth_params.is_empty() || self.auth_params[..] == AUTH_PLACEHOLDER
    }

    /// Encode into `buf` as `OCTET STRING { SEQUENCE { ... } }`.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        let mut inner = EncodeBuf::new();
        inner.push_sequence(|b| {
            b.push_octet_string(&self.priv_params);
            b.push_octet_string(&self.auth_params);
            b.push_octet_string(&self.username);
            b.push_integer(self.engine_time as i64);
            b.push_integer(self.engine_boots as i64);
            b.push_octet_string(&self.engine_id);
        });
        buf.push_octet_string(&inner.finish());
    }

    /// Decode from the content of the msgSecurityParameters OCTET STRING.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let engine_id = seq.read_octet_string()?;

        let raw_boots = seq.read_integer()?;
        if !(0..=i32::MAX as i64).contains(&raw_boots) {
            return Err(Error::decode(
                seq.offset(),
                DecodeErrorKind::InvalidEngineField(raw_boots),
            ));
        }
        let raw_time = seq.read_integer()?;
        if !(0..=i32::MAX as i64).contains(&raw_time) {
            return Err(Error::decode(
                seq.offset(),
                DecodeErrorKind::InvalidEngineField(raw_time),
            ));
        }

        let username = seq.read_octet_string()?;
        let auth_params = seq.read_octet_string()?;
        let priv_params = seq.read_octet_string()?;

        Ok(Self {
            engine_id,
            engine_boots: raw_boots as u32,
            engine_time: raw_time as u32,
            username,
            auth_params,
            priv_params,
        })
    }
}

/// Locate msgAuthenticationParameters inside a fully serialized v3 message.
///
/// Returns `(offset, length)` of the field's content so the computed HMAC
/// can be spliced over the placeholder. Walks the fixed message structure:
/// outer SEQUENCE, version, msgGlobalData, then the USM SEQUENCE's first
/// four fields.
pub fn find_auth_params(message: &[u8]) -> Option<(usize, usize)> {
    let mut pos = 0;

    // Outer SEQUENCE header
    pos = enter_tlv(message, pos, 0x30)?;
    // version INTEGER
    pos = skip_tlv(message, pos)?;
    // msgGlobalData SEQUENCE
    pos = skip_tlv(message, pos)?;
    // msgSecurityParameters OCTET STRING header
    pos = enter_tlv(message, pos, 0x04)?;
    // USM SEQUENCE header
    pos = enter_tlv(message, pos, 0x30)?;
    // engineID, boots, time, username
    for _ in 0..4 {
        pos = skip_tlv(message, pos)?;
    }

    // msgAuthenticationParameters OCTET STRING
    if *message.get(pos)? != 0x04 {
        return None;
    }
    let (len, len_size) = read_length(message, pos + 1)?;
    let start = pos + 1 + len_size;
    if start + len > message.len() {
        return None;
    }
    Some((start, len))
}

/// Check the expected tag and step inside the TLV (past tag and length).
fn enter_tlv(data: &[u8], pos: usize, expected_tag: u8) -> Option<usize> {
    if *data.get(pos)? != expected_tag {
        return None;
    }
    let (_, len_size) = read_length(data, pos + 1)?;
    Some(pos + 1 + len_size)
}

/// Step over a whole TLV.
fn skip_tlv(data: &[u8], pos: usize) -> Option<usize> {
    data.get(pos)?;
    let (len, len_size) = read_length(data, pos + 1)?;
    let end = pos + 1 + len_size + len;
    (end <= data.len()).then_some(end)
}

/// Parse a BER length at `pos`, returning (length, bytes_consumed).
fn read_length(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let first = *data.get(pos)?;
    if first < 0x80 {
        return Some((first as usize, 1));
    }
    if first == 0x80 {
        return None;
    }
    let count = (first & 0x7F) as usize;
    if count == 0 || count > 4 || pos + 1 + count > data.len() {
        return None;
    }
    let mut len = 0usize;
    for &byte in &data[pos + 1..pos + 1 + count] {
        len = (len << 8) | byte as usize;
    }
    Some((len, 1 + count))
}
