//! BER decoding.
//!
//! Zero-copy decoding over `Bytes`: sub-decoders for constructed types slice
//! the parent buffer instead of copying.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
pub struct Decoder {
    data: Bytes,
    offset: usize,
}

impl Decoder {
    /// Create a new decoder over `data`.
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Current offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next tag byte without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.offset)
            .ok_or_else(|| Error::decode(self.offset, DecodeErrorKind::TruncatedData))?;
        self.offset += 1;
        Ok(byte)
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Read a length field.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset)?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read `len` raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        // saturating_add so a hostile length cannot wrap past the bounds check
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(Error::decode(self.offset, DecodeErrorKind::TruncatedData));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and require a specific tag, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.read_tag()?;
        if actual != expected {
            tracing::debug!(
                target: "snmp_client::ber",
                offset = self.offset - 1,
                expected,
                actual,
                "unexpected tag"
            );
            return Err(Error::decode(
                self.offset - 1,
                DecodeErrorKind::UnexpectedTag { expected, actual },
            ));
        }
        self.read_length()
    }

    /// Read a signed INTEGER.
    pub fn read_integer(&mut self) -> Result<i64> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_content(len)
    }

    /// Read signed integer content of the given length.
    ///
    /// Content longer than 8 bytes is truncated to its trailing 8 bytes with
    /// a warning, matching net-snmp's permissive overflow handling.
    pub fn read_integer_content(&mut self, len: usize) -> Result<i64> {
        if len == 0 {
            return Err(Error::decode(self.offset, DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 8 {
            tracing::warn!(
                target: "snmp_client::ber",
                offset = self.offset,
                length = len,
                "integer too long, truncating to 8 bytes"
            );
        }

        let bytes = self.read_bytes(len)?;
        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes.iter().take(8) {
            value = (value << 8) | byte as i64;
        }
        Ok(value)
    }

    /// Read unsigned 32-bit content of the given length.
    ///
    /// Accepts up to 5 bytes (one leading zero octet); longer content is
    /// truncated permissively like signed integers.
    pub fn read_unsigned32_content(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(Error::decode(self.offset, DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 5 {
            tracing::warn!(
                target: "snmp_client::ber",
                offset = self.offset,
                length = len,
                "unsigned integer too long, truncating to 4 bytes"
            );
        }

        let bytes = self.read_bytes(len)?;
        let mut value: u32 = 0;
        for &byte in bytes.iter().take(5) {
            value = (value << 8) | byte as u32;
        }
        Ok(value)
    }

    /// Read unsigned 64-bit content of the given length (Counter64).
    ///
    /// At most 9 bytes: one leading zero octet plus 8 value bytes.
    pub fn read_unsigned64_content(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(Error::decode(self.offset, DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 9 {
            return Err(Error::decode(
                self.offset,
                DecodeErrorKind::Integer64TooLong { length: len },
            ));
        }

        let bytes = self.read_bytes(len)?;
        let mut value: u64 = 0;
        for &byte in bytes.iter() {
            value = (value << 8) | byte as u64;
        }
        Ok(value)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(Error::decode(self.offset, DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_content(len)
    }

    /// Read OID content of the given length.
    pub fn read_oid_content(&mut self, len: usize) -> Result<Oid> {
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes)
    }

    /// Read a SEQUENCE, returning a decoder over its content.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed TLV with a specific tag, returning a decoder over
    /// its content.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        let content = self.read_bytes(len)?;
        Ok(Decoder::new(content))
    }

    /// Skip one TLV without interpreting it.
    pub fn skip_tlv(&mut self) -> Result<()> {
        let _ = self.read_tag()?;
        let len = self.read_length()?;
        let new_offset = self.offset.saturating_add(len);
        if new_offset > self.data.len() {
            return Err(Error::decode(self.offset, DecodeErrorKind::TlvOverflow));
        }
        self.offset = new_offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integer() {
        assert_eq!(Decoder::from_slice(&[0x02, 0x01, 0x00]).read_integer().unwrap(), 0);
        assert_eq!(Decoder::from_slice(&[0x02, 0x01, 0x7F]).read_integer().unwrap(), 127);
        assert_eq!(
            Decoder::from_slice(&[0x02, 0x02, 0x00, 0x80]).read_integer().unwrap(),
            128
        );
        assert_eq!(Decoder::from_slice(&[0x02, 0x01, 0xFF]).read_integer().unwrap(), -1);
        assert_eq!(Decoder::from_slice(&[0x02, 0x01, 0x80]).read_integer().unwrap(), -128);
    }

    #[test]
    fn test_read_integer_wide() {
        // 5-byte positive value beyond i32
        let mut dec = Decoder::from_slice(&[0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(dec.read_integer().unwrap(), 0x01_0000_0000);
    }

    #[test]
    fn test_non_minimal_integer_accepted() {
        let mut dec = Decoder::from_slice(&[0x02, 0x02, 0x00, 0x01]);
        assert_eq!(dec.read_integer().unwrap(), 1);
        let mut dec = Decoder::from_slice(&[0x02, 0x02, 0xFF, 0xFF]);
        assert_eq!(dec.read_integer().unwrap(), -1);
    }

    #[test]
    fn test_zero_length_integer_rejected() {
        let mut dec = Decoder::from_slice(&[0x02, 0x00]);
        assert!(dec.read_integer().is_err());
    }

    #[test]
    fn test_read_octet_string() {
        let mut dec = Decoder::from_slice(&[0x04, 0x05, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(&dec.read_octet_string().unwrap()[..], b"hello");
    }

    #[test]
    fn test_read_null() {
        Decoder::from_slice(&[0x05, 0x00]).read_null().unwrap();
        assert!(Decoder::from_slice(&[0x05, 0x01, 0x00]).read_null().is_err());
    }

    #[test]
    fn test_read_oid() {
        let mut dec = Decoder::from_slice(&[0x06, 0x03, 0x2B, 0x06, 0x01]);
        assert_eq!(dec.read_oid().unwrap().arcs(), &[1, 3, 6, 1]);
    }

    #[test]
    fn test_read_sequence() {
        let mut dec = Decoder::from_slice(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), 1);
        assert_eq!(seq.read_integer().unwrap(), 2);
        assert!(seq.is_empty());
        assert!(dec.is_empty());
    }

    #[test]
    fn test_read_bytes_bounds() {
        let mut dec = Decoder::from_slice(&[0x01, 0x02, 0x03]);
        assert!(dec.read_bytes(100).is_err());
        assert!(dec.read_bytes(usize::MAX).is_err());
    }

    #[test]
    fn test_skip_tlv() {
        let mut dec = Decoder::from_slice(&[0x04, 0x02, 0xAA, 0xBB, 0x02, 0x01, 0x07]);
        dec.skip_tlv().unwrap();
        assert_eq!(dec.read_integer().unwrap(), 7);
    }

    #[test]
    fn test_skip_tlv_overflow() {
        let mut dec = Decoder::from_slice(&[0x04, 0x7F, 0xAA]);
        assert!(dec.skip_tlv().is_err());
    }

    #[test]
    fn test_unsigned64() {
        // Counter64 content: 9 bytes with a leading zero octet
        let mut dec =
            Decoder::from_slice(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(dec.read_unsigned64_content(9).unwrap(), u64::MAX);

        let mut dec = Decoder::from_slice(&[0x01, 0x00]);
        assert_eq!(dec.read_unsigned64_content(2).unwrap(), 256);

        let mut dec = Decoder::from_slice(&[0u8; 10]);
        assert!(dec.read_unsigned64_content(10).is_err());
    }

    #[test]
    fn test_unexpected_tag_reports_kind() {
        let mut dec = Decoder::from_slice(&[0x04, 0x00]);
        let err = dec.read_integer().unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeErrorKind::UnexpectedTag { expected: 0x02, actual: 0x04 },
                ..
            }
        ));
    }
}
