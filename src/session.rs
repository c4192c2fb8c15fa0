//! Request/response session.
//!
//! A [`Session`] owns one transport and the per-protocol state needed to
//! turn a PDU into a datagram and a reply datagram back into a PDU. One
//! request is in flight at a time; the caller's task blocks on the reply.
//!
//! The v1/v2c and v3 paths share the transport discipline and response
//! correlation; they diverge only in framing, captured by the protocol
//! variant held inside the session rather than a subtype hierarchy.

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::message::{CommunityMessage, ScopedPdu, V3Message};
use crate::pdu::{Pdu, PduType};
use crate::transport::{Transport, UdpTransport};
use crate::v3::SecurityParameters;
use crate::value::OpaqueHints;
use crate::varbind::VarBind;
use crate::version::Version;

/// Default SNMP agent port.
pub const SNMP_PORT: u16 = 161;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Seconds of pad added to the discovery gap, anticipating network latency
/// and clock skew between the probe reply and later requests.
const TIME_SYNC_PAD: i64 = 2;

/// SNMPv3 engine discovery progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// No probe sent yet.
    NotStarted,
    /// Probe answered; engine state captured.
    Complete {
        /// Remote engine's boot counter.
        engine_boots: u32,
        /// Local-clock-to-engine-clock offset, fixed at discovery.
        time_gap: i64,
    },
}

/// Per-protocol session state.
enum Protocol {
    Community {
        version: Version,
        community: Bytes,
    },
    Usm {
        params: SecurityParameters,
        context: Bytes,
        discovery: DiscoveryState,
    },
}

/// An SNMP session: one target, one transport, one outstanding request.
pub struct Session<T: Transport = UdpTransport> {
    transport: T,
    timeout: Duration,
    protocol: Protocol,
    hints: OpaqueHints,
}

impl Session<UdpTransport> {
    /// Open a v1/v2c session to `target`.
    pub async fn community(
        target: SocketAddr,
        version: Version,
        community: impl Into<Bytes>,
    ) -> Result<Self> {
        let transport = UdpTransport::connect(target).await?;
        Ok(Self::community_over(transport, version, community))
    }

    /// Open a v3/USM session to `target`.
    pub async fn usm(
        target: SocketAddr,
        params: SecurityParameters,
        context: impl Into<Bytes>,
    ) -> Result<Self> {
        let transport = UdpTransport::connect(target).await?;
        Ok(Self::usm_over(transport, params, context))
    }
}

impl<T: Transport> Session<T> {
    /// Build a v1/v2c session over an existing transport.
    ///
    /// The transport may be shared: dropping the session leaves a shared
    /// socket open for its other owners.
    pub fn community_over(
        transport: T,
        version: Version,
        community: impl Into<Bytes>,
    ) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            protocol: Protocol::Community {
                version,
                community: community.into(),
            },
            hints: OpaqueHints::default(),
        }
    }

    /// Build a v3/USM session over an existing transport.
    ///
    /// Even with a pre-known engine ID the first request runs the discovery
    /// probe: engine boots and time are only learned over the wire.
    pub fn usm_over(transport: T, params: SecurityParameters, context: impl Into<Bytes>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            protocol: Protocol::Usm {
                params,
                context: context.into(),
                discovery: DiscoveryState::NotStarted,
            },
            hints: OpaqueHints::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the opaque rendering hints used when decoding responses.
    pub fn opaque_hints(mut self, hints: OpaqueHints) -> Self {
        self.hints = hints;
        self
    }

    /// The target address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.transport.peer_addr()
    }

    /// Discovered engine boots and time gap, once the v3 probe completed.
    pub fn engine_sync(&self) -> Option<(u32, i64)> {
        match &self.protocol {
            Protocol::Usm {
                discovery:
                    DiscoveryState::Complete {
                        engine_boots,
                        time_gap,
                    },
                ..
            } => Some((*engine_boots, *time_gap)),
            _ => None,
        }
    }

    /// Build a request PDU of the given type.
    pub fn build_pdu(&self, pdu_type: PduType, varbinds: Vec<VarBind>) -> Result<Pdu> {
        Pdu::build(pdu_type, None, 0, 0, varbinds)
    }

    /// Build and send a request, returning the decoded response PDU.
    pub async fn request(&mut self, pdu_type: PduType, varbinds: Vec<VarBind>) -> Result<Pdu> {
        let pdu = self.build_pdu(pdu_type, varbinds)?;
        self.send_request(&pdu).await
    }

    /// Send a prebuilt request PDU, returning the decoded response PDU.
    ///
    /// Retrying callers pass the same PDU again so the retransmission
    /// carries the identical request ID.
    pub async fn send_request(&mut self, pdu: &Pdu) -> Result<Pdu> {
        match &self.protocol {
            Protocol::Community { .. } => self.send_community(pdu).await,
            Protocol::Usm { .. } => self.send_usm(pdu).await,
        }
    }

    async fn send_community(&mut self, pdu: &Pdu) -> Result<Pdu> {
        let Protocol::Community { version, community } = &self.protocol else {
            unreachable!("community path on community protocol only");
        };
        let message = CommunityMessage::new(*version, community.clone(), pdu.clone());
        let reply = self.exchange(message.encode()).await?;
        let response = CommunityMessage::decode_with(reply, &self.hints)?;
        validate_request_id(pdu.request_id, response.pdu.request_id)?;
        Ok(response.pdu)
    }

    async fn send_usm(&mut self, pdu: &Pdu) -> Result<Pdu> {
        let (engine_boots, time_gap) = self.ensure_discovered().await?;
        let engine_time = estimate_engine_time(now_secs(), time_gap);

        let wire = {
            let Protocol::Usm {
                params, context, ..
            } = &mut self.protocol
            else {
                unreachable!("usm path on usm protocol only");
            };
            let scoped = ScopedPdu::new(params.engine_id().clone(), context.clone(), pdu.clone());
            V3Message::encode(&scoped, params, engine_boots, engine_time)?
        };

        let reply = self.exchange(wire).await?;

        let Protocol::Usm { params, .. } = &self.protocol else {
            unreachable!("usm path on usm protocol only");
        };
        let message = V3Message::decode_with(reply, params, &self.hints)?;
        validate_request_id(pdu.request_id, message.scoped_pdu.pdu.request_id)?;
        Ok(message.scoped_pdu.pdu)
    }

    /// Run the discovery probe if it has not completed yet.
    async fn ensure_discovered(&mut self) -> Result<(u32, i64)> {
        if let Some(sync) = self.engine_sync() {
            return Ok(sync);
        }
        self.probe_for_engine().await
    }

    /// Send the engine-discovery probe: an unauthenticated, unencrypted
    /// get-request carrying only the configured username.
    ///
    /// The reply's USM block holds the engine ID, boots, and time. The time
    /// gap computed here converts the local clock into estimated engine
    /// time for every subsequent request, with no further probes.
    async fn probe_for_engine(&mut self) -> Result<(u32, i64)> {
        let username = match &self.protocol {
            Protocol::Usm { params, .. } => {
                String::from_utf8_lossy(params.username()).into_owned()
            }
            Protocol::Community { .. } => unreachable!("discovery is a v3 concern"),
        };

        let mut probe_params = SecurityParameters::builder(username).build()?;
        let probe_pdu = Pdu::build(PduType::Get, None, 0, 0, vec![])?;
        let scoped = ScopedPdu::new(Bytes::new(), Bytes::new(), probe_pdu);
        let wire = V3Message::encode(&scoped, &mut probe_params, 0, 0)?;

        let reply = self.exchange(wire).await?;
        let message = V3Message::decode_with(reply, &probe_params, &self.hints)?;

        let engine_id = message.security_params.engine_id.clone();
        let engine_boots = message.security_params.engine_boots;
        let engine_time = message.security_params.engine_time;
        let time_gap = compute_time_gap(now_secs(), engine_time, self.timeout);

        tracing::debug!(
            target: "snmp_client::session",
            peer = %self.transport.peer_addr(),
            engine_boots,
            engine_time,
            time_gap,
            "engine discovered"
        );

        let Protocol::Usm {
            params, discovery, ..
        } = &mut self.protocol
        else {
            unreachable!("discovery is a v3 concern");
        };
        params.set_engine_id(engine_id);
        *discovery = DiscoveryState::Complete {
            engine_boots,
            time_gap,
        };

        Ok((engine_boots, time_gap))
    }

    /// One datagram round-trip: send, then wait for a single reply.
    async fn exchange(&mut self, data: Bytes) -> Result<Bytes> {
        self.transport.send(&data).await?;
        self.transport.recv(self.timeout).await
    }

    /// Close the session, releasing its handle on the transport.
    ///
    /// A shared transport stays open for its remaining owners; the socket
    /// itself closes when the last clone is dropped.
    pub fn close(self) {
        drop(self.transport);
    }
}

/// Check reply correlation. A zero response ID is accepted unconditionally:
/// some agents answer every request with request-id 0.
fn validate_request_id(expected: i32, actual: i32) -> Result<()> {
    if actual == 0 || actual == expected {
        Ok(())
    } else {
        Err(Error::RequestIdMismatch { expected, actual })
    }
}

/// The fixed local-to-engine clock offset captured at discovery.
///
/// The timeout plus a two-second pad anticipates the latency between the
/// probe reply being stamped and later requests being built.
fn compute_time_gap(local_secs: i64, engine_time: u32, timeout: Duration) -> i64 {
    local_secs - (engine_time as i64 + timeout.as_secs() as i64 + TIME_SYNC_PAD)
}

/// Estimated current engine time from the local clock and the stored gap.
fn estimate_engine_time(local_secs: i64, time_gap: i64) -> u32 {
    (local_secs - time_gap).clamp(0, u32::MAX as i64) as u32
}

/// Seconds on the local wall clock.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::EncodeBuf;
    use crate::oid;
    use crate::transport::mock::MockTransport;
    use crate::v3::UsmSecurityParams;
    use crate::value::Value;

    fn response_pdu(request_id: i32, varbinds: Vec<VarBind>) -> Pdu {
        Pdu::build(PduType::Response, Some(request_id), 0, 0, varbinds).unwrap()
    }

    #[tokio::test]
    async fn test_v2c_request_response() {
        let transport = MockTransport::default();
        let request = Pdu::build(
            PduType::Get,
            Some(321),
            0,
            0,
            vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
        )
        .unwrap();

        let reply = CommunityMessage::new(
            Version::V2c,
            &b"public"[..],
            response_pdu(
                321,
                vec![VarBind::new(
                    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                    Value::from("test"),
                )],
            ),
        );
        transport.push_reply(reply.encode());

        let mut session = Session::community_over(transport.clone(), Version::V2c, &b"public"[..]);
        let response = session.send_request(&request).await.unwrap();

        assert_eq!(response.request_id, 321);
        assert_eq!(response.varbinds[0].value.as_str(), Some("test"));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_response_id_accepted() {
        let transport = MockTransport::default();
        let request = Pdu::build(PduType::Get, Some(321), 0, 0, vec![]).unwrap();

        let reply =
            CommunityMessage::new(Version::V2c, &b"public"[..], response_pdu(0, vec![]));
        transport.push_reply(reply.encode());

        let mut session = Session::community_over(transport, Version::V2c, &b"public"[..]);
        assert!(session.send_request(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_mismatched_response_id_rejected() {
        let transport = MockTransport::default();
        let request = Pdu::build(PduType::Get, Some(321), 0, 0, vec![]).unwrap();

        let reply =
            CommunityMessage::new(Version::V2c, &b"public"[..], response_pdu(99, vec![]));
        transport.push_reply(reply.encode());

        let mut session = Session::community_over(transport, Version::V2c, &b"public"[..]);
        let err = session.send_request(&request).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RequestIdMismatch {
                expected: 321,
                actual: 99
            }
        ));
    }

    #[tokio::test]
    async fn test_timeout_propagates() {
        let transport = MockTransport::default();
        let request = Pdu::build(PduType::Get, Some(1), 0, 0, vec![]).unwrap();

        let mut session = Session::community_over(transport, Version::V2c, &b"public"[..]);
        let err = session.send_request(&request).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { retries: 0, .. }));
    }

    /// A discovery reply: report PDU with the engine state in the USM block.
    fn discovery_reply(engine_id: &'static [u8], boots: u32, time: u32) -> Bytes {
        let report = Pdu {
            pdu_type: PduType::Report,
            request_id: 0,
            error_status: 0,
            error_index: 0,
            varbinds: vec![VarBind::new(
                oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 4, 0),
                Value::Counter32(1),
            )],
        };
        let scoped = ScopedPdu::new(Bytes::from_static(engine_id), Bytes::new(), report);
        let usm = UsmSecurityParams {
            engine_id: Bytes::from_static(engine_id),
            engine_boots: boots,
            engine_time: time,
            username: Bytes::new(),
            auth_params: Bytes::new(),
            priv_params: Bytes::new(),
        };
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|b| {
            scoped.encode(b);
            usm.encode(b);
            b.push_sequence(|b| {
                b.push_integer(3);
                b.push_octet_string(&[0x00]);
                b.push_integer(65507);
                b.push_integer(7);
            });
            b.push_integer(3);
        });
        buf.finish()
    }

    /// An unauthenticated v3 response for a noauth user.
    fn v3_response(engine_id: &'static [u8], request_id: i32) -> Bytes {
        let scoped = ScopedPdu::new(
            Bytes::from_static(engine_id),
            Bytes::new(),
            response_pdu(
                request_id,
                vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("tt"))],
            ),
        );
        let usm = UsmSecurityParams {
            engine_id: Bytes::from_static(engine_id),
            engine_boots: 9,
            engine_time: 1000,
            username: Bytes::from_static(b"unsafe"),
            auth_params: Bytes::new(),
            priv_params: Bytes::new(),
        };
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|b| {
            scoped.encode(b);
            usm.encode(b);
            b.push_sequence(|b| {
                b.push_integer(3);
                b.push_octet_string(&[0x00]);
                b.push_integer(65507);
                b.push_integer(8);
            });
            b.push_integer(3);
        });
        buf.finish()
    }

    #[tokio::test]
    async fn test_v3_discovery_then_request() {
        const ENGINE: &[u8] = b"\x80\x00\x1f\x88\x80test";

        let transport = MockTransport::default();
        transport.push_reply(discovery_reply(ENGINE, 9, 1000));

        let request = Pdu::build(
            PduType::Get,
            Some(555),
            0,
            0,
            vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))],
        )
        .unwrap();
        transport.push_reply(v3_response(ENGINE, 555));

        let params = SecurityParameters::builder("unsafe").build().unwrap();
        let timeout = Duration::from_secs(3);
        let mut session =
            Session::usm_over(transport.clone(), params, Bytes::new()).timeout(timeout);

        let before = now_secs();
        let response = session.send_request(&request).await.unwrap();
        let after = now_secs();

        assert_eq!(response.varbinds[0].value.as_str(), Some("tt"));
        // Probe plus request
        assert_eq!(transport.sent_count(), 2);

        let (engine_boots, time_gap) = session.engine_sync().unwrap();
        assert_eq!(engine_boots, 9);
        // time_gap == local - (engine_time + timeout + 2), within clock tick
        assert!(time_gap >= compute_time_gap(before, 1000, timeout));
        assert!(time_gap <= compute_time_gap(after, 1000, timeout));
    }

    #[tokio::test]
    async fn test_v3_discovery_runs_once() {
        const ENGINE: &[u8] = b"\x80\x00engine2";

        let transport = MockTransport::default();
        transport.push_reply(discovery_reply(ENGINE, 1, 50));

        let first = Pdu::build(PduType::Get, Some(10), 0, 0, vec![]).unwrap();
        transport.push_reply(v3_response(ENGINE, 10));
        let second = Pdu::build(PduType::Get, Some(11), 0, 0, vec![]).unwrap();
        transport.push_reply(v3_response(ENGINE, 11));

        let params = SecurityParameters::builder("unsafe").build().unwrap();
        let mut session = Session::usm_over(transport.clone(), params, Bytes::new());

        session.send_request(&first).await.unwrap();
        session.send_request(&second).await.unwrap();

        // One probe, two requests
        assert_eq!(transport.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_v3_discovery_timeout_propagates() {
        let transport = MockTransport::default();
        let request = Pdu::build(PduType::Get, Some(1), 0, 0, vec![]).unwrap();

        let params = SecurityParameters::builder("unsafe").build().unwrap();
        let mut session = Session::usm_over(transport.clone(), params, Bytes::new());

        let err = session.send_request(&request).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(session.engine_sync().is_none());
        // Only the probe went out
        assert_eq!(transport.sent_count(), 1);
    }

    #[test]
    fn test_validate_request_id() {
        assert!(validate_request_id(5, 5).is_ok());
        assert!(validate_request_id(5, 0).is_ok());
        assert!(validate_request_id(5, 6).is_err());
    }

    #[test]
    fn test_time_gap_math() {
        // T0=10_000, E0=1_000, timeout=3s: gap = 10_000 - (1_000 + 3 + 2)
        let gap = compute_time_gap(10_000, 1_000, Duration::from_secs(3));
        assert_eq!(gap, 8_995);

        // A request at T1 estimates engine time T1 - gap
        assert_eq!(estimate_engine_time(10_060, gap), 1_065);
    }

    #[test]
    fn test_estimate_engine_time_clamps() {
        assert_eq!(estimate_engine_time(5, 100), 0);
        assert_eq!(estimate_engine_time(i64::MAX, 0), u32::MAX);
    }
}
