//! Error types for the SNMP client.
//!
//! This module provides:
//!
//! - [`Error`] - the main error type for all library operations
//! - [`ErrorStatus`] - SNMP protocol errors reported inside response PDUs
//! - Kind enums ([`OidErrorKind`], [`DecodeErrorKind`], [`CryptoErrorKind`],
//!   [`AuthErrorKind`]) that describe the precise failure without allocating.
//!
//! Every failure is terminal for the request in progress and propagates to
//! the caller; nothing is silently swallowed. Retrying a [`Error::Timeout`]
//! is the facade's decision, not the protocol engine's.

use std::net::SocketAddr;
use std::time::Duration;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// A segment was empty or not a decimal number.
    InvalidArc,
    /// OID must have at least 2 arcs.
    TooShort,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::TooShort => write!(f, "OID must have at least 2 arcs"),
        }
    }
}

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected a different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Invalid BER length encoding.
    InvalidLength,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field uses too many octets.
    LengthTooLong { octets: usize },
    /// Length exceeds the decoder's sanity limit.
    LengthExceedsMax { length: usize, max: usize },
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Counter64 content longer than 9 bytes.
    Integer64TooLong { length: usize },
    /// Subidentifier overflow while decoding an OID.
    IntegerOverflow,
    /// NULL with non-zero length.
    InvalidNull,
    /// Zero-length BOOLEAN.
    InvalidBoolean,
    /// IP address content must be exactly 4 bytes.
    InvalidIpAddressLength { length: usize },
    /// A tag class/number combination the varbind taxonomy cannot map.
    UnsupportedTag { class: u8, number: u32 },
    /// Unknown SNMP version field.
    UnknownVersion(i64),
    /// Unknown PDU type tag.
    UnknownPduType(u8),
    /// Unknown msgSecurityModel (only USM=3 is supported).
    UnknownSecurityModel(i64),
    /// msgFlags sets the privacy bit without the auth bit.
    InvalidMsgFlags,
    /// msgFlags must be a single octet.
    InvalidMsgFlagsLength { length: usize },
    /// Engine boots/time outside the RFC 3414 range (0..2147483647).
    InvalidEngineField(i64),
    /// TLV extends past the end of the data.
    TlvOverflow,
}

/// Name of a 2-bit BER tag class, for diagnostics and symbol synthesis.
pub(crate) fn tag_class_name(class: u8) -> &'static str {
    match class {
        0 => "universal",
        1 => "application",
        2 => "context_specific",
        _ => "private",
    }
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{expected:02X}, got 0x{actual:02X}")
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({octets} octets)")
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {length} exceeds maximum {max}")
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::Integer64TooLong { length } => write!(f, "integer64 too long: {length} bytes"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidBoolean => write!(f, "zero-length BOOLEAN"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {length}")
            }
            Self::UnsupportedTag { class, number } => {
                write!(f, "unsupported {} tag {number}", tag_class_name(*class))
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {v}"),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{t:02X}"),
            Self::UnknownSecurityModel(m) => write!(f, "unknown security model: {m}"),
            Self::InvalidMsgFlags => write!(f, "invalid msgFlags: privacy without authentication"),
            Self::InvalidMsgFlagsLength { length } => {
                write!(f, "msgFlags must be 1 byte, got {length}")
            }
            Self::InvalidEngineField(v) => {
                write!(f, "engine boots/time out of range: {v}")
            }
            Self::TlvOverflow => write!(f, "TLV extends past end of data"),
        }
    }
}

/// Cryptographic error kinds (privacy encryption/decryption).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoErrorKind {
    /// No privacy key available (keys not derived yet).
    NoPrivKey,
    /// Invalid key length for the cipher.
    InvalidKeyLength,
    /// Cipher operation failed.
    CipherError,
    /// privParameters field has the wrong length.
    InvalidPrivParamsLength { expected: usize, actual: usize },
    /// Ciphertext length not a multiple of the block size.
    InvalidCiphertextLength { length: usize, block_size: usize },
}

impl std::fmt::Display for CryptoErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPrivKey => write!(f, "no privacy key available"),
            Self::InvalidKeyLength => write!(f, "invalid key length"),
            Self::CipherError => write!(f, "cipher operation failed"),
            Self::InvalidPrivParamsLength { expected, actual } => {
                write!(
                    f,
                    "invalid privParameters length: expected {expected}, got {actual}"
                )
            }
            Self::InvalidCiphertextLength { length, block_size } => {
                write!(
                    f,
                    "ciphertext length {length} not multiple of block size {block_size}"
                )
            }
        }
    }
}

/// Authentication error kinds (SNMPv3 message integrity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// HMAC verification failed.
    HmacMismatch,
    /// Authentication parameters have the wrong length.
    WrongMacLength { expected: usize, actual: usize },
    /// Could not locate the auth params field in the serialized message.
    AuthParamsNotFound,
    /// No authentication key available (keys not derived yet).
    NoAuthKey,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HmacMismatch => write!(f, "HMAC verification failed"),
            Self::WrongMacLength { expected, actual } => {
                write!(f, "wrong MAC length: expected {expected}, got {actual}")
            }
            Self::AuthParamsNotFound => write!(f, "could not locate auth params in message"),
            Self::NoAuthKey => write!(f, "no authentication key available"),
        }
    }
}

/// Which protocol name failed to parse during security parameter construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    /// Security level name (`noauth`, `auth_no_priv`, `auth_priv`).
    SecurityLevel,
    /// Authentication protocol name (`md5`, `sha`).
    Auth,
    /// Privacy protocol name (`des`, `aes`).
    Priv,
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SecurityLevel => write!(f, "security level"),
            Self::Auth => write!(f, "auth protocol"),
            Self::Priv => write!(f, "priv protocol"),
        }
    }
}

/// The main error type for all SNMP client operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {t}")).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// No reply within the configured duration.
    ///
    /// `retries` carries the number of retries attempted; the protocol engine
    /// raises it with zero and the client facade rewrites it after its
    /// bounded retry loop is exhausted.
    #[error("timeout after {elapsed:?}{} ({retries} retries)", target.map(|t| format!(" waiting for {t}")).unwrap_or_default())]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        retries: u32,
    },

    /// Malformed OID text or structure.
    #[error("invalid OID{}: {kind}", input.as_deref().map(|i| format!(" {i:?}")).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// Structurally invalid wire bytes.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// PDU built with an unknown request kind.
    #[error("unsupported PDU type: 0x{0:02X}")]
    UnsupportedPduType(u8),

    /// Unknown security-level/auth-protocol/priv-protocol name.
    #[error("unsupported {kind}: {input}")]
    UnsupportedProtocol { kind: ProtocolKind, input: Box<str> },

    /// Message authentication failed (SNMPv3).
    #[error("authentication failed: {kind}")]
    AuthenticationFailed { kind: AuthErrorKind },

    /// Privacy encryption failed (SNMPv3).
    #[error("encryption failed: {kind}")]
    EncryptionFailed { kind: CryptoErrorKind },

    /// Privacy decryption failed (SNMPv3).
    ///
    /// Wrong key, corrupted ciphertext, or an authentic USM decryption
    /// failure; mirrors the `decryption_errors` USM counter semantics.
    #[error("decryption failed: {kind}")]
    DecryptionFailed { kind: CryptoErrorKind },

    /// Reply request ID does not match the outstanding request.
    ///
    /// A zero response ID is accepted unconditionally before this error is
    /// raised (some agents answer with request-id 0).
    #[error("unexpected response: request ID mismatch, expected {expected}, got {actual}")]
    RequestIdMismatch { expected: i32, actual: i32 },

    /// Invalid session/client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error carrying the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create an authentication error.
    pub fn auth(kind: AuthErrorKind) -> Self {
        Self::AuthenticationFailed { kind }
    }

    /// Create an encryption error.
    pub fn encrypt(kind: CryptoErrorKind) -> Self {
        Self::EncryptionFailed { kind }
    }

    /// Create a decryption error.
    pub fn decrypt(kind: CryptoErrorKind) -> Self {
        Self::DecryptionFailed { kind }
    }

    /// Create an unsupported-protocol error.
    pub fn unsupported_protocol(kind: ProtocolKind, input: impl Into<Box<str>>) -> Self {
        Self::UnsupportedProtocol {
            kind,
            input: input.into(),
        }
    }
}

/// SNMP protocol error status codes carried in response PDUs.
///
/// A non-zero status on a response PDU is surfaced to the caller as a
/// synthetic leading varbind whose value is the symbolic name rendered by
/// this type's `Display` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    /// No error (status = 0).
    None,
    /// Response would not fit in a single message (status = 1).
    ResponseTooBig,
    /// Requested OID not found (status = 2).
    NoSuchName,
    /// Invalid value in a SET request (status = 3).
    BadValue,
    /// Attempted write to a read-only object (status = 4).
    ReadOnly,
    /// Unspecified error (status = 5).
    GenericError,
    /// Object exists but access is denied (status = 6).
    AccessDenied,
    /// SET value has the wrong type (status = 7).
    WrongType,
    /// SET value has the wrong length (status = 8).
    WrongLength,
    /// SET value uses the wrong encoding (status = 9).
    WrongEncoding,
    /// SET value is out of range (status = 10).
    WrongValue,
    /// Object does not support creation (status = 11).
    NoCreation,
    /// Value is inconsistent with other managed objects (status = 12).
    InconsistentValue,
    /// Resource required for the SET is unavailable (status = 13).
    ResourceUnavailable,
    /// SET commit phase failed (status = 14).
    CommitFailed,
    /// SET undo phase failed (status = 15).
    UndoFailed,
    /// Access denied by the agent's access control (status = 16).
    AuthorizationError,
    /// Object does not support modification (status = 17).
    NotWritable,
    /// Named object cannot be created (status = 18).
    InconsistentName,
    /// Unknown or future status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Map a raw wire status code to its symbolic kind.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::ResponseTooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenericError,
            6 => Self::AccessDenied,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Get the raw wire status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::ResponseTooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenericError => 5,
            Self::AccessDenied => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::ResponseTooBig => write!(f, "response_too_big"),
            Self::NoSuchName => write!(f, "no_such_name"),
            Self::BadValue => write!(f, "bad_value"),
            Self::ReadOnly => write!(f, "read_only"),
            Self::GenericError => write!(f, "generic_error"),
            Self::AccessDenied => write!(f, "access_denied"),
            Self::WrongType => write!(f, "wrong_type"),
            Self::WrongLength => write!(f, "wrong_length"),
            Self::WrongEncoding => write!(f, "wrong_encoding"),
            Self::WrongValue => write!(f, "wrong_value"),
            Self::NoCreation => write!(f, "no_creation"),
            Self::InconsistentValue => write!(f, "inconsistent_value"),
            Self::ResourceUnavailable => write!(f, "resource_unavailable"),
            Self::CommitFailed => write!(f, "commit_failed"),
            Self::UndoFailed => write!(f, "undo_failed"),
            Self::AuthorizationError => write!(f, "authorization_error"),
            Self::NotWritable => write!(f, "not_writable"),
            Self::InconsistentName => write!(f, "inconsistent_name"),
            Self::Unknown(code) => write!(f, "unknown_pdu_error_{code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_roundtrip() {
        for code in 0..=18 {
            let status = ErrorStatus::from_i32(code);
            assert_eq!(status.as_i32(), code);
        }
        assert_eq!(ErrorStatus::from_i32(99), ErrorStatus::Unknown(99));
        assert_eq!(ErrorStatus::Unknown(99).as_i32(), 99);
    }

    #[test]
    fn test_error_status_display() {
        assert_eq!(ErrorStatus::ResponseTooBig.to_string(), "response_too_big");
        assert_eq!(ErrorStatus::NoSuchName.to_string(), "no_such_name");
        assert_eq!(ErrorStatus::Unknown(42).to_string(), "unknown_pdu_error_42");
    }

    #[test]
    fn test_timeout_display_mentions_retries() {
        let err = Error::Timeout {
            target: None,
            elapsed: Duration::from_millis(100),
            retries: 5,
        };
        assert!(err.to_string().contains("5 retries"));
    }

    #[test]
    fn test_unsupported_protocol_display() {
        let err = Error::unsupported_protocol(ProtocolKind::Auth, "fake");
        assert_eq!(err.to_string(), "unsupported auth protocol: fake");
    }
}
