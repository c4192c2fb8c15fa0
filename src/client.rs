//! High-level client facade.
//!
//! [`Client`] wraps a [`Session`] with the user-facing conveniences: builder
//! construction from a host string, single-call get/get-next/set, a bounded
//! retry-on-timeout loop, and the subtree walk built from repeated get-next
//! requests. Everything protocol-shaped stays in the session; this layer is
//! orchestration only.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::session::{Session, DEFAULT_TIMEOUT, SNMP_PORT};
use crate::transport::{Transport, UdpTransport};
use crate::v3::{AuthProtocol, PrivProtocol, SecurityLevel, SecurityParameters};
use crate::value::{OpaqueHints, Value};
use crate::varbind::VarBind;
use crate::version::Version;

/// Default number of retries after a timeout.
pub const DEFAULT_RETRIES: u32 = 1;

/// An SNMP client bound to one agent.
///
/// # Examples
///
/// ```no_run
/// use snmp_client::{oid, Client};
///
/// # async fn example() -> snmp_client::Result<()> {
/// let mut client = Client::builder("192.168.1.1")
///     .version_str("2c")?
///     .community("public")
///     .connect()
///     .await?;
///
/// for vb in client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await? {
///     println!("{vb}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client<T: Transport = UdpTransport> {
    session: Session<T>,
    retries: u32,
}

impl Client<UdpTransport> {
    /// Start building a client for `target` (`host`, `host:port`, or a
    /// literal socket address).
    pub fn builder(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            target: target.into(),
            version: Version::V3,
            community: Bytes::from_static(b"public"),
            context: Bytes::new(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            hints: OpaqueHints::default(),
            username: None,
            security_level: None,
            auth: None,
            privacy: None,
            engine_id: None,
        }
    }
}

impl<T: Transport> Client<T> {
    /// Wrap an existing session.
    pub fn from_session(session: Session<T>, retries: u32) -> Self {
        Self { session, retries }
    }

    /// The target address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.session.peer_addr()
    }

    /// The underlying session.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Perform a GET for one OID, returning the response varbinds.
    ///
    /// A non-zero error status on the response appears as a leading varbind
    /// whose value is the symbolic error name.
    pub async fn get(&mut self, oid: &Oid) -> Result<Vec<VarBind>> {
        self.get_many(std::slice::from_ref(oid)).await
    }

    /// Perform a GET for several OIDs at once.
    pub async fn get_many(&mut self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let varbinds = oids.iter().map(|oid| VarBind::null(oid.clone())).collect();
        let response = self.request(PduType::Get, varbinds).await?;
        Ok(response.varbinds)
    }

    /// Perform a GETNEXT for one OID.
    pub async fn get_next(&mut self, oid: &Oid) -> Result<Vec<VarBind>> {
        let response = self
            .request(PduType::GetNext, vec![VarBind::null(oid.clone())])
            .await?;
        Ok(response.varbinds)
    }

    /// Perform a SET.
    pub async fn set(&mut self, oid: &Oid, value: Value) -> Result<Vec<VarBind>> {
        let response = self
            .request(PduType::Set, vec![VarBind::new(oid.clone(), value)])
            .await?;
        Ok(response.varbinds)
    }

    /// Walk the subtree under `root` with repeated GETNEXT requests.
    ///
    /// The traversal starts with a GET on the root itself (a leaf answer
    /// means there is no subtree to step through), then follows get-next
    /// until the returned OID leaves the subtree, the value is a terminal
    /// symbol (`end_of_mib_view`, an error status, a USM counter), or the
    /// agent stops making progress.
    pub async fn walk(&mut self, root: &Oid) -> Result<Vec<VarBind>> {
        let mut results = Vec::new();
        let mut current = root.clone();
        let mut probing_root = true;

        loop {
            let pdu_type = if probing_root {
                PduType::Get
            } else {
                PduType::GetNext
            };
            let response = self
                .request(pdu_type, vec![VarBind::null(current.clone())])
                .await?;
            let Some(vb) = response.varbinds.last().cloned() else {
                break;
            };
            let terminal = vb.value.is_symbol();

            if probing_root {
                probing_root = false;
                if terminal {
                    // The root is a subtree node, not an instance; step on
                    continue;
                }
            } else if vb.oid <= current {
                tracing::warn!(
                    target: "snmp_client::client",
                    previous = %current,
                    returned = %vb.oid,
                    "walk stopped: agent returned a non-increasing OID"
                );
                break;
            }

            current = vb.oid.clone();
            if terminal || !root.is_parent_of(&current) {
                break;
            }
            results.push(vb);
        }

        Ok(results)
    }

    /// Close the client and its session.
    ///
    /// See [`Session::close`].
    pub fn close(self) {
        self.session.close();
    }

    /// Build a request and send it through the bounded retry loop.
    ///
    /// The PDU is built once, so every retransmission carries the identical
    /// request ID. Only timeouts are retried; all other failures (and the
    /// final timeout, annotated with the retry count) propagate.
    pub async fn request(&mut self, pdu_type: PduType, varbinds: Vec<VarBind>) -> Result<Pdu> {
        let pdu = self.session.build_pdu(pdu_type, varbinds)?;
        let mut attempts: u32 = 0;

        loop {
            match self.session.send_request(&pdu).await {
                Ok(response) => return Ok(response),
                Err(Error::Timeout {
                    target, elapsed, ..
                }) => {
                    if attempts < self.retries {
                        attempts += 1;
                        tracing::debug!(
                            target: "snmp_client::client",
                            request_id = pdu.request_id,
                            attempt = attempts,
                            max = self.retries,
                            "timeout, resending request"
                        );
                        continue;
                    }
                    return Err(Error::Timeout {
                        target,
                        elapsed,
                        retries: attempts,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    target: String,
    version: Version,
    community: Bytes,
    context: Bytes,
    timeout: Duration,
    retries: u32,
    hints: OpaqueHints,
    username: Option<String>,
    security_level: Option<SecurityLevel>,
    auth: Option<(AuthProtocol, String)>,
    privacy: Option<(PrivProtocol, String)>,
    engine_id: Option<Bytes>,
}

impl ClientBuilder {
    /// Set the protocol version (default: v3).
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the protocol version from a string (`1`, `2c`, `v3`, ...).
    pub fn version_str(self, version: &str) -> Result<Self> {
        Ok(self.version(Version::parse(version)?))
    }

    /// Set the community string (v1/v2c; default `public`).
    pub fn community(mut self, community: impl Into<Bytes>) -> Self {
        self.community = community.into();
        self
    }

    /// Set the v3 context name.
    pub fn context(mut self, context: impl Into<Bytes>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the request timeout (default 5 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries after a timeout (default 1).
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set opaque rendering hints for decoded responses.
    pub fn opaque_hints(mut self, hints: OpaqueHints) -> Self {
        self.hints = hints;
        self
    }

    /// Set the USM user name (v3).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the security level explicitly (v3; inferred from the configured
    /// protocols otherwise).
    pub fn security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = Some(level);
        self
    }

    /// Set the security level from a name (`noauth`, `auth_no_priv`,
    /// `auth_priv`).
    pub fn security_level_str(self, level: &str) -> Result<Self> {
        Ok(self.security_level(SecurityLevel::parse(level)?))
    }

    /// Configure v3 authentication.
    pub fn auth(mut self, protocol: AuthProtocol, password: impl Into<String>) -> Self {
        self.auth = Some((protocol, password.into()));
        self
    }

    /// Configure v3 authentication from a protocol name (`md5`, `sha`).
    pub fn auth_str(self, protocol: &str, password: impl Into<String>) -> Result<Self> {
        Ok(self.auth(AuthProtocol::parse(protocol)?, password))
    }

    /// Configure v3 privacy.
    pub fn privacy(mut self, protocol: PrivProtocol, password: impl Into<String>) -> Self {
        self.privacy = Some((protocol, password.into()));
        self
    }

    /// Configure v3 privacy from a protocol name (`des`, `aes`).
    pub fn privacy_str(self, protocol: &str, password: impl Into<String>) -> Result<Self> {
        Ok(self.privacy(PrivProtocol::parse(protocol)?, password))
    }

    /// Provide a pre-known engine ID (v3), skipping key derivation at
    /// discovery time.
    pub fn engine_id(mut self, engine_id: impl Into<Bytes>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }

    /// Resolve the target and connect.
    pub async fn connect(self) -> Result<Client<UdpTransport>> {
        let addr = resolve_target(&self.target).await?;

        let session = match self.version {
            Version::V3 => {
                let username = self
                    .username
                    .ok_or_else(|| Error::Config("SNMPv3 requires a username".into()))?;
                let mut builder = SecurityParameters::builder(username);
                if let Some(level) = self.security_level {
                    builder = builder.security_level(level);
                }
                if let Some((protocol, password)) = self.auth {
                    builder = builder.auth(protocol, password.into_bytes());
                }
                if let Some((protocol, password)) = self.privacy {
                    builder = builder.privacy(protocol, password.into_bytes());
                }
                if let Some(engine_id) = self.engine_id {
                    builder = builder.engine_id(engine_id);
                }
                let params = builder.build()?;
                Session::usm(addr, params, self.context).await?
            }
            version => Session::community(addr, version, self.community).await?,
        };

        Ok(Client {
            session: session.timeout(self.timeout).opaque_hints(self.hints),
            retries: self.retries,
        })
    }
}

/// Resolve `host`, `host:port`, or a literal address, defaulting to port 161.
async fn resolve_target(target: &str) -> Result<SocketAddr> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let with_port = if target.contains(':') {
        target.to_string()
    } else {
        format!("{target}:{SNMP_PORT}")
    };
    tokio::net::lookup_host(&with_port)
        .await
        .map_err(|e| Error::Io {
            target: None,
            source: e,
        })?
        .next()
        .ok_or_else(|| Error::Config(format!("could not resolve host {target}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CommunityMessage;
    use crate::oid;
    use crate::transport::mock::MockTransport;

    fn v2c_client(transport: MockTransport, retries: u32) -> Client<MockTransport> {
        let session = Session::community_over(transport, Version::V2c, &b"public"[..]);
        Client::from_session(session, retries)
    }

    fn reply_for(transport: &MockTransport, oid: Oid, value: Value) {
        // Correlation accepts a zero response ID, which lets canned replies
        // ignore the (random) request ID
        let pdu = Pdu::build(
            PduType::Response,
            Some(0),
            0,
            0,
            vec![VarBind::new(oid, value)],
        )
        .unwrap();
        let msg = CommunityMessage::new(Version::V2c, &b"public"[..], pdu);
        transport.push_reply(msg.encode());
    }

    #[tokio::test]
    async fn test_get() {
        let transport = MockTransport::default();
        reply_for(
            &transport,
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            Value::from("Device description"),
        );

        let mut client = v2c_client(transport, 0);
        let varbinds = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await.unwrap();
        assert_eq!(varbinds.len(), 1);
        assert_eq!(varbinds[0].value.as_str(), Some("Device description"));
    }

    #[tokio::test]
    async fn test_set() {
        let transport = MockTransport::default();
        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::from("admin"));

        let mut client = v2c_client(transport, 0);
        let varbinds = client
            .set(&oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::from("admin"))
            .await
            .unwrap();
        assert_eq!(varbinds[0].value.as_str(), Some("admin"));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_counts_attempts() {
        let transport = MockTransport::default();
        let mut client = v2c_client(transport.clone(), 5);

        let err = client.get(&oid!(1, 3, 6, 1)).await.unwrap_err();
        match err {
            Error::Timeout { retries, .. } => assert_eq!(retries, 5),
            other => panic!("expected timeout, got {other:?}"),
        }
        // retries=5 means 6 total attempts
        assert_eq!(transport.sent_count(), 6);
        assert!(err.to_string().contains("5 retries"));
    }

    #[tokio::test]
    async fn test_retry_reuses_request_id() {
        let transport = MockTransport::default();
        let mut client = v2c_client(transport.clone(), 2);
        let _ = client.get(&oid!(1, 3, 6, 1)).await.unwrap_err();

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        // Identical PDU resent on every attempt, request ID included
        assert_eq!(sent[0], sent[1]);
        assert_eq!(sent[1], sent[2]);
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let transport = MockTransport::default();
        let mut client = v2c_client(transport.clone(), 3);

        // One canned reply: the first recv times out nothing queued...
        // queue the reply up front; the mock answers the first attempt
        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("name"));
        let varbinds = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).await.unwrap();
        assert_eq!(varbinds[0].value.as_str(), Some("name"));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_error_response_surfaces_symbol() {
        let transport = MockTransport::default();
        let pdu = Pdu::build(
            PduType::Response,
            Some(0),
            2, // no_such_name
            1,
            vec![VarBind::null(oid!(1, 3, 6, 1, 6, 3, 10, 2, 1, 1, 0))],
        )
        .unwrap();
        let msg = CommunityMessage::new(Version::V2c, &b"public"[..], pdu);
        transport.push_reply(msg.encode());

        let mut client = v2c_client(transport, 0);
        let varbinds = client
            .get(&oid!(1, 3, 6, 1, 6, 3, 10, 2, 1, 1, 0))
            .await
            .unwrap();
        assert_eq!(varbinds[0].value, Value::Symbol("no_such_name".into()));
    }

    #[tokio::test]
    async fn test_walk_collects_subtree() {
        let transport = MockTransport::default();
        let root = oid!(1, 3, 6, 1, 2, 1, 1);

        // GET on the root: no_such_name marker, so the walk steps with getnext
        let err_pdu = Pdu::build(PduType::Response, Some(0), 2, 1, vec![]).unwrap();
        transport.push_reply(CommunityMessage::new(Version::V2c, &b"public"[..], err_pdu).encode());

        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("descr"));
        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("name"));
        // Next OID leaves the subtree: walk ends, value not collected
        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2));

        let mut client = v2c_client(transport, 0);
        let results = client.walk(&root).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
        assert_eq!(results[1].oid, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0));
    }

    #[tokio::test]
    async fn test_walk_stops_on_end_of_mib() {
        let transport = MockTransport::default();
        let root = oid!(1, 3, 6, 1, 7);

        let err_pdu = Pdu::build(PduType::Response, Some(0), 2, 1, vec![]).unwrap();
        transport.push_reply(CommunityMessage::new(Version::V2c, &b"public"[..], err_pdu).encode());

        reply_for(&transport, oid!(1, 3, 6, 1, 7, 1), Value::from("last"));
        // endOfMibView exception terminates the walk
        let pdu = Pdu::build(
            PduType::Response,
            Some(0),
            0,
            0,
            vec![VarBind::new(
                oid!(1, 3, 6, 1, 7, 2),
                Value::Symbol("end_of_mib_view".into()),
            )],
        )
        .unwrap();
        transport.push_reply(CommunityMessage::new(Version::V2c, &b"public"[..], pdu).encode());

        let mut client = v2c_client(transport, 0);
        let results = client.walk(&root).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value.as_str(), Some("last"));
    }

    #[tokio::test]
    async fn test_walk_on_leaf_instance_is_empty() {
        let transport = MockTransport::default();
        let leaf = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);

        // GET answers the leaf itself; there is no subtree below it
        reply_for(&transport, leaf.clone(), Value::from("name"));

        let mut client = v2c_client(transport, 0);
        let results = client.walk(&leaf).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_walk_stops_on_non_increasing_oid() {
        let transport = MockTransport::default();
        let root = oid!(1, 3, 6, 1, 2, 1, 1);

        let err_pdu = Pdu::build(PduType::Response, Some(0), 2, 1, vec![]).unwrap();
        transport.push_reply(CommunityMessage::new(Version::V2c, &b"public"[..], err_pdu).encode());

        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::Integer(1));
        // A broken agent repeats the same OID; the walk must not loop
        reply_for(&transport, oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::Integer(1));

        let mut client = v2c_client(transport, 0);
        let results = client.walk(&root).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_builder_rejects_v3_without_username() {
        let err = Client::builder("127.0.0.1:161").connect().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_builder_rejects_unknown_version() {
        assert!(Client::builder("host").version_str("4c").is_err());
    }

    #[tokio::test]
    async fn test_builder_rejects_unknown_protocols() {
        assert!(Client::builder("host").auth_str("fake", "pw").is_err());
        assert!(Client::builder("host").privacy_str("rot13", "pw").is_err());
        assert!(Client::builder("host").security_level_str("fake").is_err());
    }
}
