//! Privacy (encryption) protocols for SNMPv3 (RFC 3414 Section 8, RFC 3826).
//!
//! # Salt/IV construction
//!
//! ## DES-CBC
//! - Salt (privParameters): engineBoots (4 bytes) || counter (4 bytes)
//! - IV: pre-IV XOR salt, where the pre-IV is the last 8 bytes of the
//!   16-byte privacy key
//!
//! ## AES-128-CFB
//! - Salt (privParameters): 64-bit counter (8 bytes)
//! - IV: engineBoots (4) || engineTime (4) || salt (8); concatenation,
//!   not XOR

use bytes::Bytes;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{AuthProtocol, PrivProtocol};
use crate::error::{CryptoErrorKind, Error, Result};
use crate::util::random_nonzero_u64;

/// Privacy key plus the session-scoped salt counter.
///
/// The key is the localized authentication-style key reused for privacy:
/// DES splits it into 8 key bytes and 8 pre-IV bytes, AES-128 uses the
/// first 16 bytes directly. Key material is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: PrivProtocol,
    /// Monotonic counter feeding salts/IVs, seeded from OS randomness.
    #[zeroize(skip)]
    salt_counter: u64,
}

impl PrivKey {
    /// Derive a privacy key from a password and engine ID.
    ///
    /// Uses the same derivation as authentication keys (RFC 3414 A.2); the
    /// privacy protocol determines how the key bytes are split.
    pub fn from_password(
        auth_protocol: AuthProtocol,
        priv_protocol: PrivProtocol,
        password: &[u8],
        engine_id: &[u8],
    ) -> Self {
        let passkey = super::auth::passkey(auth_protocol, password);
        let key = super::auth::localize(auth_protocol, &passkey, engine_id);
        Self {
            key,
            protocol: priv_protocol,
            salt_counter: random_nonzero_u64(),
        }
    }

    /// Wrap already-localized key bytes.
    pub fn from_bytes(protocol: PrivProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
            salt_counter: random_nonzero_u64(),
        }
    }

    /// The privacy protocol.
    pub fn protocol(&self) -> PrivProtocol {
        self.protocol
    }

    /// Next salt counter value; skips zero on wraparound to avoid IV reuse.
    fn next_salt(&mut self) -> u64 {
        let salt = self.salt_counter;
        self.salt_counter = self.salt_counter.wrapping_add(1);
        if salt == 0 {
            let salt = self.salt_counter;
            self.salt_counter = self.salt_counter.wrapping_add(1);
            salt
        } else {
            salt
        }
    }

    fn check_key_len(&self, building: bool) -> Result<()> {
        if self.key.len() >= self.protocol.key_len() {
            Ok(())
        } else if building {
            Err(Error::encrypt(CryptoErrorKind::InvalidKeyLength))
        } else {
            Err(Error::decrypt(CryptoErrorKind::InvalidKeyLength))
        }
    }

    /// Encrypt a serialized scoped PDU.
    ///
    /// Returns `(ciphertext, privParameters)`.
    pub fn encrypt(
        &mut self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
    ) -> Result<(Bytes, Bytes)> {
        self.check_key_len(true)?;
        let salt = self.next_salt();
        match self.protocol {
            PrivProtocol::Des => self.encrypt_des(plaintext, engine_boots, salt),
            PrivProtocol::Aes => self.encrypt_aes(plaintext, engine_boots, engine_time, salt),
        }
    }

    /// Decrypt a scoped PDU using the wire-supplied privParameters.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        priv_params: &[u8],
        engine_boots: u32,
        engine_time: u32,
    ) -> Result<Bytes> {
        self.check_key_len(false)?;
        if priv_params.len() != 8 {
            return Err(Error::decrypt(CryptoErrorKind::InvalidPrivParamsLength {
                expected: 8,
                actual: priv_params.len(),
            }));
        }
        match self.protocol {
            PrivProtocol::Des => self.decrypt_des(ciphertext, priv_params),
            PrivProtocol::Aes => self.decrypt_aes(ciphertext, priv_params, engine_boots, engine_time),
        }
    }

    /// DES-CBC encryption (RFC 3414 Section 8.1.1.1).
    fn encrypt_des(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        salt_counter: u64,
    ) -> Result<(Bytes, Bytes)> {
        use cbc::cipher::block_padding::ZeroPadding;
        use cbc::cipher::{BlockEncryptMut, KeyIvInit};
        type DesCbc = cbc::Encryptor<des::Des>;

        let key = &self.key[..8];
        let pre_iv = &self.key[8..16];

        // Salt = engineBoots (4 bytes) || low 32 bits of the counter
        let mut salt = [0u8; 8];
        salt[..4].copy_from_slice(&engine_boots.to_be_bytes());
        salt[4..].copy_from_slice(&(salt_counter as u32).to_be_bytes());

        let mut iv = [0u8; 8];
        for (i, byte) in iv.iter_mut().enumerate() {
            *byte = pre_iv[i] ^ salt[i];
        }

        // Zero-pad to a whole number of blocks; BER framing inside the
        // plaintext makes the trailing pad harmless to the receiver
        let padded_len = plaintext.len().div_ceil(8) * 8;
        let mut buffer = vec![0u8; padded_len];
        buffer[..plaintext.len()].copy_from_slice(plaintext);

        let cipher = DesCbc::new_from_slices(key, &iv)
            .map_err(|_| Error::encrypt(CryptoErrorKind::InvalidKeyLength))?;
        let ciphertext = cipher
            .encrypt_padded_mut::<ZeroPadding>(&mut buffer, padded_len)
            .map_err(|_| Error::encrypt(CryptoErrorKind::CipherError))?;

        Ok((
            Bytes::copy_from_slice(ciphertext),
            Bytes::copy_from_slice(&salt),
        ))
    }

    /// DES-CBC decryption (RFC 3414 Section 8.1.1.3).
    fn decrypt_des(&self, ciphertext: &[u8], salt: &[u8]) -> Result<Bytes> {
        use cbc::cipher::block_padding::NoPadding;
        use cbc::cipher::{BlockDecryptMut, KeyIvInit};
        type DesCbc = cbc::Decryptor<des::Des>;

        if ciphertext.is_empty() || ciphertext.len() % 8 != 0 {
            return Err(Error::decrypt(CryptoErrorKind::InvalidCiphertextLength {
                length: ciphertext.len(),
                block_size: 8,
            }));
        }

        let key = &self.key[..8];
        let pre_iv = &self.key[8..16];

        let mut iv = [0u8; 8];
        for (i, byte) in iv.iter_mut().enumerate() {
            *byte = pre_iv[i] ^ salt[i];
        }

        let cipher = DesCbc::new_from_slices(key, &iv)
            .map_err(|_| Error::decrypt(CryptoErrorKind::InvalidKeyLength))?;

        let mut buffer = ciphertext.to_vec();
        let plaintext = cipher
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map_err(|_| Error::decrypt(CryptoErrorKind::CipherError))?;

        Ok(Bytes::copy_from_slice(plaintext))
    }

    /// AES-128-CFB encryption (RFC 3826 Section 3.1.3).
    fn encrypt_aes(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt_counter: u64,
    ) -> Result<(Bytes, Bytes)> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
        type Aes128Cfb = cfb_mode::Encryptor<aes::Aes128>;

        let key = &self.key[..16];
        let salt = salt_counter.to_be_bytes();
        let iv = aes_iv(engine_boots, engine_time, &salt);

        let mut buffer = plaintext.to_vec();
        let cipher = Aes128Cfb::new_from_slices(key, &iv)
            .map_err(|_| Error::encrypt(CryptoErrorKind::InvalidKeyLength))?;
        cipher.encrypt(&mut buffer);

        Ok((Bytes::from(buffer), Bytes::copy_from_slice(&salt)))
    }

    /// AES-128-CFB decryption (RFC 3826 Section 3.1.4).
    fn decrypt_aes(
        &self,
        ciphertext: &[u8],
        salt: &[u8],
        engine_boots: u32,
        engine_time: u32,
    ) -> Result<Bytes> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
        type Aes128Cfb = cfb_mode::Decryptor<aes::Aes128>;

        let key = &self.key[..16];
        let iv = aes_iv(engine_boots, engine_time, salt);

        let mut buffer = ciphertext.to_vec();
        let cipher = Aes128Cfb::new_from_slices(key, &iv)
            .map_err(|_| Error::decrypt(CryptoErrorKind::InvalidKeyLength))?;
        cipher.decrypt(&mut buffer);

        Ok(Bytes::from(buffer))
    }
}

/// AES IV: engineBoots (4) || engineTime (4) || salt (8).
fn aes_iv(engine_boots: u32, engine_time: u32, salt: &[u8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..4].copy_from_slice(&engine_boots.to_be_bytes());
    iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
    iv[8..].copy_from_slice(salt);
    iv
}

impl std::fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
