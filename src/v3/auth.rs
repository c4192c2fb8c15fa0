//! Authentication key derivation and HMAC operations (RFC 3414).
//!
//! - Password-to-key derivation (1 MiB expansion + hash)
//! - Key localization (binding a key to an engine ID)
//! - HMAC-96 message authentication

use digest::Digest;
use hmac::{Hmac, Mac};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::AuthProtocol;

/// Minimum password length net-snmp enforces (`USM_PASSWORDTOOSHORT`).
///
/// Shorter passwords are accepted here for interoperability, with a warning.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// RFC 3414 A.2: the password is expanded to exactly 1 MiB before hashing.
/// Deliberately expensive, as the mandated defense against dictionary
/// attacks on short passwords.
const EXPANSION_SIZE: usize = 1_048_576;

/// A key derived from a password and localized to a specific engine ID.
///
/// Key material is zeroed from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LocalizedKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: AuthProtocol,
}

impl LocalizedKey {
    /// Derive a localized key from a password and engine ID.
    ///
    /// RFC 3414 Section A.2:
    /// 1. Expand the password to 1 MiB by repetition and hash it (passkey)
    /// 2. Hash `passkey || engine_id || passkey` (localization)
    pub fn from_password(protocol: AuthProtocol, password: &[u8], engine_id: &[u8]) -> Self {
        if password.len() < MIN_PASSWORD_LENGTH {
            tracing::warn!(
                password_len = password.len(),
                min_len = MIN_PASSWORD_LENGTH,
                "SNMPv3 password shorter than the recommended minimum"
            );
        }
        let passkey = passkey(protocol, password);
        let key = localize(protocol, &passkey, engine_id);
        Self { key, protocol }
    }

    /// Wrap an already-localized key.
    pub fn from_bytes(protocol: AuthProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
        }
    }

    /// The protocol this key authenticates with.
    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Compute the HMAC-96 signature over `data` (12 bytes).
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match self.protocol {
            AuthProtocol::Md5 => hmac96_md5(&self.key, data),
            AuthProtocol::Sha1 => hmac96_sha1(&self.key, data),
        }
    }

    /// Verify an HMAC-96 signature in constant time.
    pub fn verify(&self, data: &[u8], expected: &[u8]) -> bool {
        let computed = self.sign(data);
        if computed.len() != expected.len() {
            return false;
        }
        let mut diff = 0u8;
        for (a, b) in computed.iter().zip(expected.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

impl std::fmt::Debug for LocalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizedKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Password-to-key transformation (RFC 3414 Section A.2).
pub fn passkey(protocol: AuthProtocol, password: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => passkey_impl::<md5::Md5>(password),
        AuthProtocol::Sha1 => passkey_impl::<sha1::Sha1>(password),
    }
}

fn passkey_impl<D: Digest>(password: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return vec![0u8; <D as Digest>::output_size()];
    }

    let mut hasher = D::new();
    let mut window = [0u8; 64];
    let mut index = 0;
    let mut fed = 0;

    // Cycle the password through a 64-byte sliding window across the
    // whole megabyte, feeding each window to the digest
    while fed < EXPANSION_SIZE {
        for byte in &mut window {
            *byte = password[index];
            index = (index + 1) % password.len();
        }
        hasher.update(window);
        fed += window.len();
    }

    hasher.finalize().to_vec()
}

/// Key localization (RFC 3414 Section A.2): `H(passkey || engine_id || passkey)`.
pub fn localize(protocol: AuthProtocol, passkey: &[u8], engine_id: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => localize_impl::<md5::Md5>(passkey, engine_id),
        AuthProtocol::Sha1 => localize_impl::<sha1::Sha1>(passkey, engine_id),
    }
}

fn localize_impl<D: Digest>(passkey: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(passkey);
    hasher.update(engine_id);
    hasher.update(passkey);
    hasher.finalize().to_vec()
}

/// HMAC-MD5 truncated to 12 bytes (RFC 3414 Section 6.3.1, RFC 2104).
fn hmac96_md5(key: &[u8], data: &[u8]) -> Vec<u8> {
    type HmacMd5 = Hmac<md5::Md5>;

    let mut mac = <HmacMd5 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes()[..12].to_vec()
}

/// HMAC-SHA-1 truncated to 12 bytes (RFC 3414 Section 7.3.1).
fn hmac96_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    type HmacSha1 = Hmac<sha1::Sha1>;

    let mut mac = <HmacSha1 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes()[..12].to_vec()
}
