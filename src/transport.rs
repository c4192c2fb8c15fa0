//! Transport layer.
//!
//! One connected UDP socket per session, with a timed receive. A transport
//! is a cheap `Arc` clone, so an externally supplied ("proxy") transport can
//! be shared with a session: the socket stays open until the last clone is
//! dropped, and the session never tears down a transport it does not own.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Largest datagram a session will accept.
const MAX_DATAGRAM: usize = 65535;

/// Client-side transport abstraction.
///
/// `Clone` is required so sessions and callers can share one transport;
/// implementations wrap their socket in an `Arc`.
pub trait Transport: Send + Sync + Clone {
    /// Send one request datagram.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Receive one reply datagram, waiting at most `recv_timeout`.
    fn recv(&self, recv_timeout: Duration) -> impl Future<Output = Result<Bytes>> + Send;

    /// The peer address this transport talks to.
    fn peer_addr(&self) -> SocketAddr;
}

/// UDP transport for a single target.
#[derive(Clone)]
pub struct UdpTransport {
    inner: Arc<UdpTransportInner>,
}

struct UdpTransportInner {
    /// Behind a mutex so a stale socket can be replaced after a timeout.
    socket: Mutex<UdpSocket>,
    target: SocketAddr,
}

impl UdpTransport {
    /// Connect an ephemeral UDP socket to `target`.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        tracing::debug!(target: "snmp_client::transport", peer = %target, "connecting UDP transport");
        let socket = Self::open_socket(target).await?;
        Ok(Self {
            inner: Arc::new(UdpTransportInner {
                socket: Mutex::new(socket),
                target,
            }),
        })
    }

    async fn open_socket(target: SocketAddr) -> Result<UdpSocket> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            "0.0.0.0:0".parse().expect("literal address")
        } else {
            "[::]:0".parse().expect("literal address")
        };
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| Error::Io {
            target: Some(target),
            source: e,
        })?;
        socket.connect(target).await.map_err(|e| Error::Io {
            target: Some(target),
            source: e,
        })?;
        Ok(socket)
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmp_client::transport",
            peer = %self.inner.target,
            bytes = data.len(),
            "UDP send"
        );
        let socket = self.inner.socket.lock().await;
        socket.send(data).await.map_err(|e| Error::Io {
            target: Some(self.inner.target),
            source: e,
        })?;
        Ok(())
    }

    async fn recv(&self, recv_timeout: Duration) -> Result<Bytes> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let mut socket = self.inner.socket.lock().await;

        match timeout(recv_timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => {
                buf.truncate(len);
                tracing::trace!(
                    target: "snmp_client::transport",
                    peer = %self.inner.target,
                    bytes = len,
                    "UDP recv"
                );
                Ok(Bytes::from(buf))
            }
            Ok(Err(e)) => Err(Error::Io {
                target: Some(self.inner.target),
                source: e,
            }),
            Err(_) => {
                // Stale-socket hygiene: a fresh socket drops any reply that
                // straggles in for the abandoned request, so it cannot be
                // read as the answer to the next one
                tracing::trace!(
                    target: "snmp_client::transport",
                    peer = %self.inner.target,
                    timeout_ms = recv_timeout.as_millis() as u64,
                    "UDP recv timeout, reconnecting socket"
                );
                if let Ok(fresh) = Self::open_socket(self.inner.target).await {
                    *socket = fresh;
                }
                Err(Error::Timeout {
                    target: Some(self.inner.target),
                    elapsed: recv_timeout,
                    retries: 0,
                })
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }
}
