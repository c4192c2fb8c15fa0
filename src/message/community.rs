//! Community-based SNMP message format (v1/v2c).
//!
//! V1 and v2c messages share one structure,
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu }`,
//! differing only in the version number.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::value::OpaqueHints;
use crate::version::Version;
use bytes::Bytes;

/// Community-based SNMP message (v1/v2c).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    /// SNMP version (V1 or V2c).
    pub version: Version,
    /// Community string.
    pub community: Bytes,
    /// Protocol data unit.
    pub pdu: Pdu,
}

impl CommunityMessage {
    /// Create a new community message.
    ///
    /// # Panics
    ///
    /// Panics on [`Version::V3`]; v3 messages use [`V3Message`](crate::message::V3Message).
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        assert!(
            version != Version::V3,
            "CommunityMessage carries v1/v2c only"
        );
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Encode to the exact DER wire form.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32() as i64);
        });
        buf.finish()
    }

    /// Decode from wire bytes with default opaque handling.
    pub fn decode(data: Bytes) -> Result<Self> {
        Self::decode_with(data, &OpaqueHints::default())
    }

    /// Decode from wire bytes, consulting `hints` for opaque rendering.
    pub fn decode_with(data: Bytes, hints: &OpaqueHints) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let raw_version = seq.read_integer()?;
        let version = Version::from_i32(raw_version as i32)
            .filter(|v| *v != Version::V3)
            .ok_or_else(|| {
                tracing::debug!(target: "snmp_client::message", version = raw_version, "unknown version");
                Error::decode(seq.offset(), DecodeErrorKind::UnknownVersion(raw_version))
            })?;

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode_with(&mut seq, hints)?;

        Ok(Self {
            version,
            community,
            pdu,
        })
    }
}
