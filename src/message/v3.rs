//! SNMPv3 message format (RFC 3412) over USM (RFC 3414).
//!
//! ```text
//! SEQUENCE {
//!     INTEGER version (3)
//!     SEQUENCE msgGlobalData {
//!         INTEGER msgID
//!         INTEGER msgMaxSize
//!         OCTET STRING msgFlags (1 byte)
//!         INTEGER msgSecurityModel (3 = USM)
//!     }
//!     OCTET STRING msgSecurityParameters (USM SEQUENCE)
//!     msgData (plaintext ScopedPDU, or OCTET STRING ciphertext)
//! }
//! ```
//!
//! The signature covers the entire serialized message, including the
//! security-parameters block, which must already hold its final shape.
//! Encoding therefore serializes with a 12-zero-byte placeholder in
//! msgAuthenticationParameters, computes the HMAC over those bytes, and
//! splices the real signature over the placeholder; the result is
//! byte-identical to re-serializing with the signature in place.

use bytes::Bytes;

use crate::ber::{tag, Decoder, EncodeBuf};
use crate::error::{AuthErrorKind, DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::util::random_id;
use crate::v3::usm::{find_auth_params, AUTH_PLACEHOLDER};
use crate::v3::{SecurityLevel, SecurityParameters, UsmSecurityParams};
use crate::value::OpaqueHints;

/// msgMaxSize advertised in every outgoing message: the largest payload a
/// single UDP datagram can carry (65535 - 20 IPv4 - 8 UDP).
pub const MSG_MAX_SIZE: i64 = 65507;

/// Reportable bit in msgFlags.
const MSG_REPORTABLE: u8 = 0x04;

/// USM security model identifier.
const SECURITY_MODEL_USM: i64 = 3;

/// Scoped PDU: a PDU wrapped with the engine and context it addresses.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedPdu {
    /// Context engine ID (the authoritative engine, usually).
    pub engine_id: Bytes,
    /// Context name (usually empty).
    pub context: Bytes,
    /// The inner PDU.
    pub pdu: Pdu,
}

impl ScopedPdu {
    /// Create a new scoped PDU.
    pub fn new(engine_id: impl Into<Bytes>, context: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            engine_id: engine_id.into(),
            context: context.into(),
            pdu,
        }
    }

    /// Encode into `buf`.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.context);
            buf.push_octet_string(&self.engine_id);
        });
    }

    /// Encode to standalone DER bytes.
    pub fn to_der(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        self.encode(&mut buf);
        buf.finish()
    }

    /// Decode from BER.
    pub fn decode_with(decoder: &mut Decoder, hints: &OpaqueHints) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let engine_id = seq.read_octet_string()?;
        let context = seq.read_octet_string()?;
        let pdu = Pdu::decode_with(&mut seq, hints)?;
        Ok(Self {
            engine_id,
            context,
            pdu,
        })
    }
}

/// A decoded SNMPv3 message.
#[derive(Debug)]
pub struct V3Message {
    /// msgID from the header.
    pub msg_id: i32,
    /// The sender's USM security parameters (engine ID, boots, time).
    pub security_params: UsmSecurityParams,
    /// The decoded (verified and decrypted as applicable) scoped PDU.
    pub scoped_pdu: ScopedPdu,
}

impl V3Message {
    /// Encode an outgoing request.
    ///
    /// Delegates payload protection to `security` (encryption at AuthPriv),
    /// assembles the USM block with the auth placeholder, serializes, and
    /// splices in the signature when the level requires authentication.
    pub fn encode(
        scoped_pdu: &ScopedPdu,
        security: &mut SecurityParameters,
        engine_boots: u32,
        engine_time: u32,
    ) -> Result<Bytes> {
        let scoped_der = scoped_pdu.to_der();
        let (payload, salt) = security.encode_payload(&scoped_der, engine_boots, engine_time)?;
        let encrypted = security.security_level().requires_priv();

        let usm = UsmSecurityParams {
            engine_id: security.engine_id().clone(),
            engine_boots,
            engine_time,
            username: Bytes::copy_from_slice(security.username()),
            auth_params: Bytes::copy_from_slice(&AUTH_PLACEHOLDER),
            priv_params: salt,
        };

        let flags = MSG_REPORTABLE | security.security_level().to_flags();
        let msg_id = random_id();

        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            if encrypted {
                buf.push_octet_string(&payload);
            } else {
                // Already a serialized ScopedPdu SEQUENCE
                buf.push_bytes(&payload);
            }
            usm.encode(buf);
            buf.push_sequence(|buf| {
                buf.push_integer(SECURITY_MODEL_USM);
                buf.push_octet_string(&[flags]);
                buf.push_integer(MSG_MAX_SIZE);
                buf.push_integer(msg_id as i64);
            });
            buf.push_integer(3);
        });

        let mut message = buf.finish().to_vec();
        if let Some(signature) = security.sign(&message)? {
            let (offset, len) = find_auth_params(&message)
                .ok_or(Error::auth(AuthErrorKind::AuthParamsNotFound))?;
            if len != signature.len() {
                return Err(Error::auth(AuthErrorKind::WrongMacLength {
                    expected: len,
                    actual: signature.len(),
                }));
            }
            message[offset..offset + len].copy_from_slice(&signature);
        }

        Ok(Bytes::from(message))
    }

    /// Decode an incoming message.
    ///
    /// An auth-params field that is empty or still the placeholder marks an
    /// unprotected payload (discovery/report responses that predate
    /// authentication), decoded directly. Anything else is verified against
    /// the session keys and decrypted when the privacy bit is set.
    pub fn decode(data: Bytes, security: &SecurityParameters) -> Result<Self> {
        Self::decode_with(data, security, &OpaqueHints::default())
    }

    /// Decode an incoming message, consulting `hints` for opaque rendering.
    pub fn decode_with(
        data: Bytes,
        security: &SecurityParameters,
        hints: &OpaqueHints,
    ) -> Result<Self> {
        let raw = data.clone();
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let version = seq.read_integer()?;
        if version != 3 {
            tracing::debug!(target: "snmp_client::message", version, "unexpected version in v3 frame");
            return Err(Error::decode(
                seq.offset(),
                DecodeErrorKind::UnknownVersion(version),
            ));
        }

        let mut global = seq.read_sequence()?;
        let msg_id = global.read_integer()? as i32;
        let _msg_max_size = global.read_integer()?;
        let flags = global.read_octet_string()?;
        if flags.len() != 1 {
            return Err(Error::decode(
                global.offset(),
                DecodeErrorKind::InvalidMsgFlagsLength { length: flags.len() },
            ));
        }
        if SecurityLevel::from_flags(flags[0]).is_none() {
            return Err(Error::decode(
                global.offset(),
                DecodeErrorKind::InvalidMsgFlags,
            ));
        }
        let model = global.read_integer()?;
        if model != SECURITY_MODEL_USM {
            return Err(Error::decode(
                global.offset(),
                DecodeErrorKind::UnknownSecurityModel(model),
            ));
        }

        let security_params = UsmSecurityParams::decode(seq.read_octet_string()?)?;

        let scoped_pdu = if security_params.is_unauthenticated() {
            ScopedPdu::decode_with(&mut seq, hints)?
        } else {
            verify_signature(&raw, &security_params, security)?;

            if seq.peek_tag() == Some(tag::universal::OCTET_STRING) {
                let ciphertext = seq.read_octet_string()?;
                let plaintext = security.decode_payload(
                    &ciphertext,
                    &security_params.priv_params,
                    security_params.engine_boots,
                    security_params.engine_time,
                )?;
                ScopedPdu::decode_with(&mut Decoder::new(plaintext), hints)?
            } else {
                ScopedPdu::decode_with(&mut seq, hints)?
            }
        };

        Ok(Self {
            msg_id,
            security_params,
            scoped_pdu,
        })
    }
}

/// Verify the HMAC over a received message: zero the auth params field and
/// recompute over the whole datagram.
fn verify_signature(
    raw: &[u8],
    params: &UsmSecurityParams,
    security: &SecurityParameters,
) -> Result<()> {
    if !security.security_level().requires_auth() {
        return Ok(());
    }
    let (offset, len) =
        find_auth_params(raw).ok_or(Error::auth(AuthErrorKind::AuthParamsNotFound))?;
    let mut zeroed = raw.to_vec();
    zeroed[offset..offset + len].fill(0);
    security.verify(&zeroed, &params.auth_params)
}
