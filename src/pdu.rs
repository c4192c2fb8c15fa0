//! SNMP Protocol Data Units.
//!
//! [`Pdu`] is the inner request/response structure shared by every message
//! format: `[type] { request-id, error-status, error-index, varbind-list }`.
//! The community (v1/v2c) and scoped (v3) wrappers live in [`crate::message`].

use crate::ber::{tag, Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::util::random_id;
use crate::value::{OpaqueHints, Value};
use crate::varbind::{decode_varbind_list, encode_varbind_list, VarBind};

/// PDU type, carried as a context-specific constructed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    Get = tag::pdu::GET_REQUEST,
    GetNext = tag::pdu::GET_NEXT_REQUEST,
    Response = tag::pdu::RESPONSE,
    Set = tag::pdu::SET_REQUEST,
    /// Report PDUs arrive in SNMPv3 error/discovery responses; they are
    /// never built by this client.
    Report = tag::pdu::REPORT,
}

impl PduType {
    /// Create from a wire tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tag::pdu::GET_REQUEST => Some(Self::Get),
            tag::pdu::GET_NEXT_REQUEST => Some(Self::GetNext),
            tag::pdu::RESPONSE => Some(Self::Response),
            tag::pdu::SET_REQUEST => Some(Self::Set),
            tag::pdu::REPORT => Some(Self::Report),
            _ => None,
        }
    }

    /// Get the wire tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "Get"),
            Self::GetNext => write!(f, "GetNext"),
            Self::Response => write!(f, "Response"),
            Self::Set => write!(f, "Set"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// The OID a synthetic error varbind is attached to.
///
/// Sits next to the usmStats counters (1.3.6.1.6.3.15.1.1.7.0), mirroring
/// the convention of surfacing security failures inline with data.
pub(crate) fn error_varbind_oid() -> Oid {
    crate::oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 7, 0)
}

/// An SNMP PDU: request/response body shared by all protocol versions.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type.
    pub pdu_type: PduType,
    /// Request ID for request/response correlation (31-bit).
    pub request_id: i32,
    /// Error status (0 = no error).
    pub error_status: i32,
    /// Error index (1-based index of the offending varbind).
    pub error_index: i32,
    /// Variable bindings.
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Build a request/response PDU.
    ///
    /// `request_id` defaults to a fresh random 31-bit value when `None`. A
    /// non-zero `error_status` injects a synthetic leading varbind carrying
    /// the symbolic error name, surfacing the error inline with the data.
    ///
    /// Building a [`PduType::Report`] fails with `UnsupportedPduType`:
    /// reports are agent-originated.
    pub fn build(
        pdu_type: PduType,
        request_id: Option<i32>,
        error_status: i32,
        error_index: i32,
        varbinds: Vec<VarBind>,
    ) -> Result<Self> {
        if pdu_type == PduType::Report {
            return Err(Error::UnsupportedPduType(pdu_type.tag()));
        }
        Ok(Self::assemble(
            pdu_type,
            request_id.unwrap_or_else(random_id),
            error_status,
            error_index,
            varbinds,
        ))
    }

    /// Build a GET request for the given OIDs.
    pub fn get_request(oids: &[Oid]) -> Self {
        Self::assemble(
            PduType::Get,
            random_id(),
            0,
            0,
            oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        )
    }

    /// Build a GETNEXT request for the given OIDs.
    pub fn get_next_request(oids: &[Oid]) -> Self {
        Self::assemble(
            PduType::GetNext,
            random_id(),
            0,
            0,
            oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        )
    }

    /// Build a SET request.
    pub fn set_request(varbinds: Vec<VarBind>) -> Self {
        Self::assemble(PduType::Set, random_id(), 0, 0, varbinds)
    }

    /// Shared constructor: both built and decoded PDUs inject the synthetic
    /// error varbind here.
    fn assemble(
        pdu_type: PduType,
        request_id: i32,
        error_status: i32,
        error_index: i32,
        mut varbinds: Vec<VarBind>,
    ) -> Self {
        if error_status != 0 {
            let name = ErrorStatus::from_i32(error_status).to_string();
            varbinds.insert(0, VarBind::new(error_varbind_oid(), Value::Symbol(name)));
        }
        Self {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        }
    }

    /// Whether the agent reported an error.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// The error status as a symbolic kind.
    pub fn error_status_kind(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index as i64);
            buf.push_integer(self.error_status as i64);
            buf.push_integer(self.request_id as i64);
        });
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        Self::decode_with(decoder, &OpaqueHints::default())
    }

    /// Decode from BER, consulting `hints` for opaque rendering.
    pub fn decode_with(decoder: &mut Decoder, hints: &OpaqueHints) -> Result<Self> {
        let raw_tag = decoder
            .peek_tag()
            .ok_or_else(|| Error::decode(decoder.offset(), DecodeErrorKind::TruncatedData))?;
        let pdu_type = PduType::from_tag(raw_tag).ok_or_else(|| {
            tracing::debug!(target: "snmp_client::pdu", tag = raw_tag, "unknown PDU type");
            Error::decode(decoder.offset(), DecodeErrorKind::UnknownPduType(raw_tag))
        })?;

        let mut body = decoder.read_constructed(raw_tag)?;
        let request_id = body.read_integer()? as i32;
        let error_status = body.read_integer()? as i32;
        let error_index = body.read_integer()? as i32;
        let varbinds = decode_varbind_list(&mut body, hints)?;

        Ok(Self::assemble(
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        ))
    }
}
