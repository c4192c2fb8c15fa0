//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a typed value. Decoding is where the protocol
//! engine applies its value-interpretation rules: opaque rendering hints and
//! the USM error-counter rewrite both need the OID for context, so they live
//! here rather than in [`Value`].

use crate::ber::{Decoder, EncodeBuf};
use crate::error::Result;
use crate::oid::Oid;
use crate::value::{OpaqueHints, Value};

/// The six usmStats error counters under 1.3.6.1.6.3.15.1.1 (RFC 3414
/// Section 5). A Report PDU carrying one of these signals a security
/// failure, not data; the decoded counter value is rewritten into a
/// `<name>_<value>` symbol so callers can tell the two apart.
const USM_STATS: [(u32, &str); 6] = [
    (1, "unsupported_security_levels"),
    (2, "not_in_time_windows"),
    (3, "unknown_user_names"),
    (4, "unknown_engineid"),
    (5, "wrong_digests"),
    (6, "decryption_errors"),
];

/// Variable binding: an (OID, value) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (for GET/GETNEXT requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.value.encode(buf);
            buf.push_oid(&self.oid);
        });
    }

    /// Decode from BER with default opaque handling.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        Self::decode_with(decoder, &OpaqueHints::default())
    }

    /// Decode from BER, consulting `hints` for opaque rendering.
    pub fn decode_with(decoder: &mut Decoder, hints: &OpaqueHints) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let oid = seq.read_oid()?;
        let value = Value::decode_with(&mut seq, Some(&oid), hints)?;
        let value = rewrite_usm_counter(&oid, value);
        Ok(VarBind { oid, value })
    }
}

/// Rewrite a usmStats counter value into its descriptive symbol.
///
/// Applies to any numeric value under the six well-known OIDs; everything
/// else passes through unchanged.
fn rewrite_usm_counter(oid: &Oid, value: Value) -> Value {
    let arcs = oid.arcs();
    if arcs.len() != 11 || !arcs.starts_with(&[1, 3, 6, 1, 6, 3, 15, 1, 1]) || arcs[10] != 0 {
        return value;
    }
    let Some(count) = value.as_u64() else {
        return value;
    };
    match USM_STATS.iter().find(|(arc, _)| *arc == arcs[9]) {
        Some((_, name)) => Value::Symbol(format!("{name}_{count}")),
        None => value,
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Encode a varbind list as a SEQUENCE OF VarBind.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // Reverse buffer: last varbind is pushed first
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}

/// Decode a SEQUENCE OF VarBind.
pub fn decode_varbind_list(decoder: &mut Decoder, hints: &OpaqueHints) -> Result<Vec<VarBind>> {
    let mut seq = decoder.read_sequence()?;
    let mut varbinds = Vec::new();
    while !seq.is_empty() {
        varbinds.push(VarBind::decode_with(&mut seq, hints)?);
    }
    Ok(varbinds)
}
