//! Per-session USM security state.
//!
//! [`SecurityParameters`] owns a user's credentials, the discovered engine
//! ID, and the derived keys. Key derivation is expensive (a 1 MiB digest
//! pass per key), so keys are computed once per (password, engine-id) pair
//! and cached; changing the engine ID after discovery re-derives them.

use bytes::Bytes;
use zeroize::Zeroizing;

use super::auth::LocalizedKey;
use super::privacy::PrivKey;
use super::{AuthProtocol, PrivProtocol, SecurityLevel};
use crate::error::{AuthErrorKind, CryptoErrorKind, Error, Result};

/// USM credentials and derived key material for one session.
pub struct SecurityParameters {
    username: String,
    security_level: SecurityLevel,
    auth_protocol: Option<AuthProtocol>,
    priv_protocol: Option<PrivProtocol>,
    auth_password: Zeroizing<Vec<u8>>,
    priv_password: Zeroizing<Vec<u8>>,
    engine_id: Bytes,
    auth_key: Option<LocalizedKey>,
    priv_key: Option<PrivKey>,
}

impl SecurityParameters {
    /// Start building security parameters for `username`.
    pub fn builder(username: impl Into<String>) -> SecurityParametersBuilder {
        SecurityParametersBuilder {
            username: username.into(),
            security_level: None,
            auth_protocol: None,
            priv_protocol: None,
            auth_password: Zeroizing::new(Vec::new()),
            priv_password: Zeroizing::new(Vec::new()),
            engine_id: Bytes::new(),
        }
    }

    /// The user name.
    pub fn username(&self) -> &[u8] {
        self.username.as_bytes()
    }

    /// The security level.
    pub fn security_level(&self) -> SecurityLevel {
        self.security_level
    }

    /// The engine ID this session's keys are localized to (empty before
    /// discovery).
    pub fn engine_id(&self) -> &Bytes {
        &self.engine_id
    }

    /// Learn (or replace) the authoritative engine ID, re-deriving keys.
    pub fn set_engine_id(&mut self, engine_id: Bytes) {
        if engine_id == self.engine_id {
            return;
        }
        self.engine_id = engine_id;
        self.derive_keys();
    }

    /// Signature length carried in msgAuthenticationParameters.
    pub fn mac_len(&self) -> usize {
        12
    }

    fn derive_keys(&mut self) {
        self.auth_key = None;
        self.priv_key = None;
        if self.engine_id.is_empty() {
            return;
        }
        if let Some(auth) = self.auth_protocol {
            tracing::debug!(
                target: "snmp_client::usm",
                username = %self.username,
                protocol = %auth,
                "deriving localized keys"
            );
            self.auth_key = Some(LocalizedKey::from_password(
                auth,
                &self.auth_password,
                &self.engine_id,
            ));
            if let Some(privacy) = self.priv_protocol {
                self.priv_key = Some(PrivKey::from_password(
                    auth,
                    privacy,
                    &self.priv_password,
                    &self.engine_id,
                ));
            }
        }
    }

    /// Sign a fully serialized message (with the auth placeholder in place).
    ///
    /// Returns `Ok(None)` below `AuthNoPriv`.
    pub fn sign(&self, message: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.security_level.requires_auth() {
            return Ok(None);
        }
        let key = self
            .auth_key
            .as_ref()
            .ok_or(Error::auth(AuthErrorKind::NoAuthKey))?;
        Ok(Some(key.sign(message)))
    }

    /// Verify a received message's signature.
    ///
    /// `message` must already have its auth params field zeroed. A no-op
    /// below `AuthNoPriv`.
    pub fn verify(&self, message: &[u8], mac: &[u8]) -> Result<()> {
        if !self.security_level.requires_auth() {
            return Ok(());
        }
        let key = self
            .auth_key
            .as_ref()
            .ok_or(Error::auth(AuthErrorKind::NoAuthKey))?;
        if mac.len() != self.mac_len() {
            return Err(Error::auth(AuthErrorKind::WrongMacLength {
                expected: self.mac_len(),
                actual: mac.len(),
            }));
        }
        if !key.verify(message, mac) {
            return Err(Error::auth(AuthErrorKind::HmacMismatch));
        }
        Ok(())
    }

    /// Protect an outgoing scoped PDU.
    ///
    /// Below `AuthPriv` the DER passes through unchanged with an empty
    /// privacy salt; at `AuthPriv` it is encrypted and the wire salt is
    /// returned alongside.
    pub fn encode_payload(
        &mut self,
        scoped_pdu_der: &[u8],
        engine_boots: u32,
        engine_time: u32,
    ) -> Result<(Bytes, Bytes)> {
        if !self.security_level.requires_priv() {
            return Ok((Bytes::copy_from_slice(scoped_pdu_der), Bytes::new()));
        }
        let key = self
            .priv_key
            .as_mut()
            .ok_or(Error::encrypt(CryptoErrorKind::NoPrivKey))?;
        key.encrypt(scoped_pdu_der, engine_boots, engine_time)
    }

    /// Unprotect an incoming payload; inverse of [`encode_payload`](Self::encode_payload).
    pub fn decode_payload(
        &self,
        payload: &[u8],
        salt: &[u8],
        engine_boots: u32,
        engine_time: u32,
    ) -> Result<Bytes> {
        if !self.security_level.requires_priv() {
            return Ok(Bytes::copy_from_slice(payload));
        }
        let key = self
            .priv_key
            .as_ref()
            .ok_or(Error::decrypt(CryptoErrorKind::NoPrivKey))?;
        key.decrypt(payload, salt, engine_boots, engine_time)
    }
}

impl std::fmt::Debug for SecurityParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityParameters")
            .field("username", &self.username)
            .field("security_level", &self.security_level)
            .field("auth_protocol", &self.auth_protocol)
            .field("priv_protocol", &self.priv_protocol)
            .field("engine_id", &self.engine_id)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}

/// Builder for [`SecurityParameters`].
pub struct SecurityParametersBuilder {
    username: String,
    security_level: Option<SecurityLevel>,
    auth_protocol: Option<AuthProtocol>,
    priv_protocol: Option<PrivProtocol>,
    auth_password: Zeroizing<Vec<u8>>,
    priv_password: Zeroizing<Vec<u8>>,
    engine_id: Bytes,
}

impl SecurityParametersBuilder {
    /// Set the security level explicitly.
    ///
    /// When unset, the level is inferred from the configured protocols.
    pub fn security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = Some(level);
        self
    }

    /// Configure authentication.
    pub fn auth(mut self, protocol: AuthProtocol, password: impl Into<Vec<u8>>) -> Self {
        self.auth_protocol = Some(protocol);
        self.auth_password = Zeroizing::new(password.into());
        self
    }

    /// Configure privacy (requires authentication).
    pub fn privacy(mut self, protocol: PrivProtocol, password: impl Into<Vec<u8>>) -> Self {
        self.priv_protocol = Some(protocol);
        self.priv_password = Zeroizing::new(password.into());
        self
    }

    /// Provide a pre-known engine ID, deriving keys immediately and
    /// skipping the discovery probe's key derivation later.
    pub fn engine_id(mut self, engine_id: impl Into<Bytes>) -> Self {
        self.engine_id = engine_id.into();
        self
    }

    /// Validate the configuration and build the parameters.
    pub fn build(self) -> Result<SecurityParameters> {
        let security_level = self.security_level.unwrap_or(match (
            self.auth_protocol.is_some(),
            self.priv_protocol.is_some(),
        ) {
            (_, true) => SecurityLevel::AuthPriv,
            (true, false) => SecurityLevel::AuthNoPriv,
            (false, false) => SecurityLevel::NoAuthNoPriv,
        });

        if security_level.requires_auth() && self.auth_protocol.is_none() {
            return Err(Error::Config(format!(
                "security level {security_level:?} requires an auth protocol and password"
            )));
        }
        if security_level.requires_priv() && self.priv_protocol.is_none() {
            return Err(Error::Config(format!(
                "security level {security_level:?} requires a priv protocol and password"
            )));
        }
        if self.priv_protocol.is_some() && !security_level.requires_priv() {
            return Err(Error::Config(
                "priv protocol configured but security level excludes privacy".into(),
            ));
        }

        let mut params = SecurityParameters {
            username: self.username,
            security_level,
            auth_protocol: self.auth_protocol,
            priv_protocol: self.priv_protocol,
            auth_password: self.auth_password,
            priv_password: self.priv_password,
            engine_id: Bytes::new(),
            auth_key: None,
            priv_key: None,
        };
        if !self.engine_id.is_empty() {
            params.set_engine_id(self.engine_id);
        }
        Ok(params)
    }
}
