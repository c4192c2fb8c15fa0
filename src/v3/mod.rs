//! SNMPv3 User-based Security Model (RFC 3414).
//!
//! This module implements:
//!
//! - Security level and protocol identifiers
//! - Password-to-key derivation and key localization ([`auth`])
//! - Message authentication (HMAC-MD5-96, HMAC-SHA-96)
//! - Privacy (DES-CBC, AES-128-CFB) ([`privacy`])
//! - The per-session [`SecurityParameters`] object tying them together

pub mod auth;
pub mod privacy;
mod security;
pub(crate) mod usm;

pub use auth::LocalizedKey;
pub use privacy::PrivKey;
pub use security::{SecurityParameters, SecurityParametersBuilder};
pub use usm::UsmSecurityParams;

use crate::error::{Error, ProtocolKind, Result};

/// SNMPv3 security level, ordered from least to most capable.
///
/// Wire encoding in msgFlags: bit 0 = auth, bit 1 = priv, so the levels map
/// to 0, 1, and 3 (2, privacy without authentication, is invalid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SecurityLevel {
    /// No authentication, no privacy.
    #[default]
    NoAuthNoPriv,
    /// Authentication only.
    AuthNoPriv,
    /// Authentication and privacy (encryption).
    AuthPriv,
}

impl SecurityLevel {
    /// Decode from the low bits of a msgFlags byte.
    pub fn from_flags(flags: u8) -> Option<Self> {
        match flags & 0x03 {
            0x00 => Some(Self::NoAuthNoPriv),
            0x01 => Some(Self::AuthNoPriv),
            0x03 => Some(Self::AuthPriv),
            _ => None, // 0x02: priv without auth
        }
    }

    /// Encode to the low bits of a msgFlags byte.
    pub fn to_flags(self) -> u8 {
        match self {
            Self::NoAuthNoPriv => 0x00,
            Self::AuthNoPriv => 0x01,
            Self::AuthPriv => 0x03,
        }
    }

    /// Parse a security level name.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "noauth" | "no_auth_no_priv" | "noauthnopriv" => Ok(Self::NoAuthNoPriv),
            "auth_no_priv" | "authnopriv" => Ok(Self::AuthNoPriv),
            "auth_priv" | "authpriv" => Ok(Self::AuthPriv),
            _ => Err(Error::unsupported_protocol(ProtocolKind::SecurityLevel, s)),
        }
    }

    /// Whether this level signs messages.
    pub fn requires_auth(self) -> bool {
        self >= Self::AuthNoPriv
    }

    /// Whether this level encrypts the scoped PDU.
    pub fn requires_priv(self) -> bool {
        self == Self::AuthPriv
    }
}

impl std::str::FromStr for SecurityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Authentication protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    /// HMAC-MD5-96 (RFC 3414)
    Md5,
    /// HMAC-SHA-96 (RFC 3414)
    Sha1,
}

impl AuthProtocol {
    /// Parse an auth protocol name (`md5`, `sha`, `sha1`).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha" | "sha1" | "sha-1" => Ok(Self::Sha1),
            _ => Err(Error::unsupported_protocol(ProtocolKind::Auth, s)),
        }
    }

    /// Digest output length in bytes; also the derived key length.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
        }
    }

    /// Truncated MAC length carried in msgAuthenticationParameters (HMAC-96).
    pub fn mac_len(self) -> usize {
        12
    }
}

impl std::str::FromStr for AuthProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA"),
        }
    }
}

/// Privacy protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    /// DES-CBC (RFC 3414 Section 8)
    Des,
    /// AES-128-CFB (RFC 3826)
    Aes,
}

impl PrivProtocol {
    /// Parse a priv protocol name (`des`, `aes`).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "des" => Ok(Self::Des),
            "aes" | "aes128" | "aes-128" => Ok(Self::Aes),
            _ => Err(Error::unsupported_protocol(ProtocolKind::Priv, s)),
        }
    }

    /// Required key material in bytes (DES: 8 key + 8 pre-IV).
    pub fn key_len(self) -> usize {
        16
    }
}

impl std::str::FromStr for PrivProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Des => write!(f, "DES"),
            Self::Aes => write!(f, "AES"),
        }
    }
}
