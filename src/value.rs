//! SNMP value types.
//!
//! [`Value`] is the closed taxonomy of protocol variable types. The first
//! eight application-tagged kinds map 1:1 to ASN.1 APPLICATION tags 0-7;
//! the universal kinds use standard primitive encodings. `Symbol` never
//! appears on the wire as its own tag: it carries decoded exception
//! indicators, USM error-counter names, and synthesized names for tags the
//! taxonomy cannot map.

use crate::ber::{tag, Decoder, EncodeBuf};
use crate::error::{tag_class_name, DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::timetick::Timetick;
use bytes::Bytes;

/// Printable ASCII range used by the opaque rendering heuristic.
const PRINTABLE: std::ops::RangeInclusive<u8> = 32..=126;

/// An SNMP protocol value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed, big-integer safe up to 64 bits)
    Integer(i64),
    /// OCTET STRING (arbitrary bytes)
    OctetString(Bytes),
    /// BOOLEAN
    Boolean(bool),
    /// NULL
    Null,
    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),
    /// IpAddress (APPLICATION 0, 4 bytes network order)
    IpAddress([u8; 4]),
    /// Counter32 (APPLICATION 1)
    Counter32(u32),
    /// Gauge32 (APPLICATION 2)
    Gauge(u32),
    /// TimeTicks (APPLICATION 3)
    Timetick(Timetick),
    /// Opaque (APPLICATION 4), held in its rendered text form.
    ///
    /// Decoding renders the payload per the RFC 2578 Section 7.1.9
    /// double-wrapping rules: printable payloads become trimmed text, binary
    /// payloads become lowercase hex. See [`render_opaque`].
    Opaque(String),
    /// NsapAddress (APPLICATION 5, raw bytes)
    Nsap(Bytes),
    /// Counter64 (APPLICATION 6, unsigned big integer from raw bytes)
    Counter64(u64),
    /// Unsigned32 (APPLICATION 7)
    UnsignedInteger(u32),
    /// A decoded marker name: SNMPv2 exception indicators, USM error
    /// counters, PDU error statuses, and unknown-tag synthesis.
    ///
    /// Encodes with OCTET STRING semantics.
    Symbol(String),
}

impl Value {
    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64 (covers the unsigned kinds and non-negative integers).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge(v) | Value::UnsignedInteger(v) => Some(*v as u64),
            Value::Timetick(t) => Some(t.ticks()),
            Value::Integer(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// Try to get as text.
    ///
    /// Returns the string form of octet strings (when valid UTF-8), opaques,
    /// and symbols.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::OctetString(b) => std::str::from_utf8(b).ok(),
            Value::Opaque(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Nsap(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Whether this value is a decoded marker symbol.
    ///
    /// Symbols terminate walks: they mark exceptions (`end_of_mib_view`),
    /// error statuses, and USM error counters rather than data.
    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Boolean(v) => buf.push_boolean(*v),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_tlv(tag::application::IP_ADDRESS, addr),
            Value::Counter32(v) => buf.push_unsigned(tag::application::COUNTER32, *v as u64),
            Value::Gauge(v) => buf.push_unsigned(tag::application::GAUGE32, *v as u64),
            Value::Timetick(t) => {
                buf.push_unsigned_fixed4(tag::application::TIMETICKS, t.wire_value())
            }
            Value::Opaque(s) => buf.push_tlv(tag::application::OPAQUE, s.as_bytes()),
            Value::Nsap(data) => buf.push_tlv(tag::application::NSAP, data),
            Value::Counter64(v) => buf.push_unsigned(tag::application::COUNTER64, *v),
            Value::UnsignedInteger(v) => buf.push_unsigned(tag::application::UINTEGER32, *v as u64),
            Value::Symbol(s) => buf.push_octet_string(s.as_bytes()),
        }
    }

    /// Decode from BER with default opaque handling and no OID context.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        Self::decode_with(decoder, None, &OpaqueHints::default())
    }

    /// Decode from BER.
    ///
    /// `oid` and `hints` drive the opaque rendering override table; decoding
    /// inside a varbind passes the varbind's OID here.
    pub fn decode_with(
        decoder: &mut Decoder,
        oid: Option<&Oid>,
        hints: &OpaqueHints,
    ) -> Result<Self> {
        let raw_tag = decoder.read_tag()?;
        let (class, _constructed, number) = tag::split(raw_tag);
        let len = decoder.read_length()?;

        match (class, number) {
            (0, 1) => {
                if len == 0 {
                    return Err(Error::decode(decoder.offset(), DecodeErrorKind::InvalidBoolean));
                }
                let bytes = decoder.read_bytes(len)?;
                Ok(Value::Boolean(bytes.iter().any(|&b| b != 0)))
            }
            (0, 2) => Ok(Value::Integer(decoder.read_integer_content(len)?)),
            (0, 4) => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            (0, 5) => {
                if len != 0 {
                    return Err(Error::decode(decoder.offset(), DecodeErrorKind::InvalidNull));
                }
                Ok(Value::Null)
            }
            (0, 6) => Ok(Value::ObjectIdentifier(decoder.read_oid_content(len)?)),
            (1, 0) => {
                if len != 4 {
                    return Err(Error::decode(
                        decoder.offset(),
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let bytes = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            (1, 1) => Ok(Value::Counter32(decoder.read_unsigned32_content(len)?)),
            (1, 2) => Ok(Value::Gauge(decoder.read_unsigned32_content(len)?)),
            (1, 3) => Ok(Value::Timetick(Timetick::from(
                decoder.read_unsigned32_content(len)?,
            ))),
            (1, 4) => {
                let bytes = decoder.read_bytes(len)?;
                let rendered = match hints.classify(oid) {
                    Some(OpaqueForm::Hex) => hex_string(&bytes),
                    Some(OpaqueForm::Text) => printable_string(&bytes),
                    None => render_opaque(&bytes),
                };
                Ok(Value::Opaque(rendered))
            }
            (1, 5) => Ok(Value::Nsap(decoder.read_bytes(len)?)),
            (1, 6) => Ok(Value::Counter64(decoder.read_unsigned64_content(len)?)),
            (1, 7) => Ok(Value::UnsignedInteger(decoder.read_unsigned32_content(len)?)),
            (0, _) | (1, _) => Err(Error::decode(
                decoder.offset(),
                DecodeErrorKind::UnsupportedTag { class, number },
            )),
            (2, 0) => {
                let _ = decoder.read_bytes(len)?;
                Ok(Value::Symbol("no_such_instance".into()))
            }
            (2, 1) => {
                let _ = decoder.read_bytes(len)?;
                Ok(Value::Symbol("no_such_object".into()))
            }
            (2, 2) => {
                let _ = decoder.read_bytes(len)?;
                Ok(Value::Symbol("end_of_mib_view".into()))
            }
            _ => {
                let bytes = decoder.read_bytes(len)?;
                Ok(Value::Symbol(synthesized_symbol(class, number, &bytes)))
            }
        }
    }
}

/// Render an opaque payload per RFC 2578 Section 7.1.9.
///
/// Opaque values double-wrap arbitrary content as an OCTET STRING; without
/// MIB knowledge the payload is classified by content. Any byte outside
/// printable ASCII (32-126), or a payload with nothing but spaces, renders
/// as lowercase hex; everything else renders as the trimmed printable text.
///
/// # Examples
///
/// ```
/// use snmp_client::value::render_opaque;
///
/// assert_eq!(render_opaque(b" zebra fish "), "zebra fish");
/// assert_eq!(render_opaque(&[0x9f, 0x78, 0x04]), "9f7804");
/// ```
pub fn render_opaque(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    let all_printable = bytes.iter().all(|b| PRINTABLE.contains(b));
    let only_padding = bytes.iter().all(|&b| b == b' ' || b == 0);
    if !all_printable || only_padding {
        hex_string(bytes)
    } else {
        printable_string(bytes)
    }
}

/// Lowercase hex rendering of raw bytes.
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Printable characters of `bytes`, trimmed of surrounding spaces.
fn printable_string(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .filter(|b| PRINTABLE.contains(*b))
        .map(|&b| b as char)
        .collect();
    text.trim_matches(' ').to_string()
}

/// Symbol name for a tag the taxonomy cannot map: class, number, and the
/// payload reduced to word characters.
fn synthesized_symbol(class: u8, number: u32, payload: &[u8]) -> String {
    let sanitized: Vec<String> = payload
        .split(|b: &u8| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();
    let mut name = format!("{}_{}", tag_class_name(class), number);
    if !sanitized.is_empty() {
        name.push('_');
        name.push_str(&sanitized.join("_"));
    }
    name
}

/// Which rendering an [`OpaqueHints`] entry forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpaqueForm {
    Hex,
    Text,
}

/// Override table for opaque rendering, consulted before the content
/// heuristic.
///
/// Entries match a varbind's OID exactly or as a subtree prefix. The table
/// is an explicit configuration object scoped to a session (or a single
/// decode call), never process-global.
///
/// # Examples
///
/// ```
/// use snmp_client::{oid, value::OpaqueHints};
///
/// let hints = OpaqueHints::new()
///     .force_hex(oid!(1, 3, 6, 1, 4, 1, 2011, 5, 117, 1, 2, 1, 1))
///     .force_text(oid!(1, 3, 6, 1, 2, 1, 47, 1, 1, 1, 1, 8));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpaqueHints {
    hex: Vec<Oid>,
    text: Vec<Oid>,
}

impl OpaqueHints {
    /// Create an empty hint table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force hex rendering for `oid` and its subtree.
    pub fn force_hex(mut self, oid: Oid) -> Self {
        self.hex.push(oid);
        self
    }

    /// Force text rendering for `oid` and its subtree.
    pub fn force_text(mut self, oid: Oid) -> Self {
        self.text.push(oid);
        self
    }

    fn classify(&self, oid: Option<&Oid>) -> Option<OpaqueForm> {
        let oid = oid?;
        if self.hex.iter().any(|p| p == oid || p.is_parent_of(oid)) {
            Some(OpaqueForm::Hex)
        } else if self.text.iter().any(|p| p == oid || p.is_parent_of(oid)) {
            Some(OpaqueForm::Text)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "{s}"),
                Err(_) => write!(f, "{}", hex_string(data)),
            },
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::Counter32(v) => write!(f, "{v}"),
            Value::Gauge(v) => write!(f, "{v}"),
            Value::Timetick(t) => write!(f, "{t}"),
            Value::Opaque(s) => write!(f, "{s}"),
            Value::Nsap(data) => write!(f, "{}", hex_string(data)),
            Value::Counter64(v) => write!(f, "{v}"),
            Value::UnsignedInteger(v) => write!(f, "{v}"),
            Value::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<Timetick> for Value {
    fn from(t: Timetick) -> Self {
        Value::Timetick(t)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}
