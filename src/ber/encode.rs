//! BER encoding.
//!
//! [`EncodeBuf`] builds messages back-to-front: callers push the innermost
//! content first (fields in reverse order), then lengths and tags wrap it.
//! Because a TLV's length is the number of bytes already pushed since the
//! wrapper started, no length pre-computation or buffer shifting is needed.
//! [`EncodeBuf::finish`] reverses the accumulated bytes into wire order.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// A reverse-order BER encode buffer.
///
/// All `push_*` methods append bytes in reverse; the encoded message reads
/// correctly only after [`finish`](Self::finish).
#[derive(Default)]
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Number of bytes pushed so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Push a raw tag byte.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Push a length field.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, n) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..n]);
    }

    /// Push raw content bytes (stored reversed).
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buf.extend(data.iter().rev());
    }

    /// Push a complete TLV with the given tag and content.
    pub fn push_tlv(&mut self, tag: u8, content: &[u8]) {
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// Push an INTEGER with minimal two's-complement content.
    pub fn push_integer(&mut self, value: i64) {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        // Strip redundant sign octets, keeping at least one byte
        while start < 7
            && ((bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
                || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0))
        {
            start += 1;
        }
        self.push_tlv(tag::universal::INTEGER, &bytes[start..]);
    }

    /// Push an unsigned value with the given tag, minimal content plus a
    /// leading zero octet when the high bit would read as a sign.
    pub fn push_unsigned(&mut self, tag: u8, value: u64) {
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
        if bytes[start] & 0x80 != 0 {
            let mut content = [0u8; 9];
            content[1..].copy_from_slice(&bytes);
            self.push_tlv(tag, &content[start..]);
        } else {
            self.push_tlv(tag, &bytes[start..]);
        }
    }

    /// Push an unsigned value as exactly 4 big-endian bytes (TimeTicks form).
    pub fn push_unsigned_fixed4(&mut self, tag: u8, value: u32) {
        self.push_tlv(tag, &value.to_be_bytes());
    }

    /// Push an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_tlv(tag::universal::OCTET_STRING, data);
    }

    /// Push a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Push a BOOLEAN (DER canonical: 0xFF for true).
    pub fn push_boolean(&mut self, value: bool) {
        self.push_tlv(tag::universal::BOOLEAN, &[if value { 0xFF } else { 0x00 }]);
    }

    /// Push an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        let content = oid.to_ber();
        self.push_tlv(tag::universal::OBJECT_IDENTIFIER, &content);
    }

    /// Push a constructed TLV whose content is produced by `f`.
    ///
    /// `f` must push the constructed type's fields in reverse order.
    pub fn push_constructed(&mut self, tag: u8, f: impl FnOnce(&mut Self)) {
        let start = self.buf.len();
        f(self);
        let content_len = self.buf.len() - start;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Push a SEQUENCE whose content is produced by `f` (fields reversed).
    pub fn push_sequence(&mut self, f: impl FnOnce(&mut Self)) {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Flip the buffer into wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}
