//! # snmp-client
//!
//! Async SNMP client protocol engine for Rust.
//!
//! ## Features
//!
//! - SNMPv1, v2c, and v3 (User-based Security Model)
//! - Byte-exact BER/DER framing for interoperability with third-party agents
//! - RFC 3414 key derivation, HMAC-96 authentication, DES/AES privacy
//! - Engine discovery with time synchronization, bounded retries
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use snmp_client::{oid, Client};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> snmp_client::Result<()> {
//!     // SNMPv2c client
//!     let mut client = Client::builder("192.168.1.1:161")
//!         .version_str("2c")?
//!         .community("public")
//!         .timeout(Duration::from_secs(5))
//!         .connect()
//!         .await?;
//!
//!     for vb in client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await? {
//!         println!("sysDescr: {vb}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## SNMPv3
//!
//! ```rust,no_run
//! use snmp_client::{oid, Client};
//! use snmp_client::v3::{AuthProtocol, PrivProtocol};
//!
//! # async fn example() -> snmp_client::Result<()> {
//! let mut client = Client::builder("192.168.1.1")
//!     .username("admin")
//!     .auth(AuthProtocol::Sha1, "authpass123")
//!     .privacy(PrivProtocol::Aes, "privpass123")
//!     .connect()
//!     .await?;
//!
//! let result = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//! # Ok(())
//! # }
//! ```

pub mod ber;
pub mod client;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod session;
pub mod timetick;
pub mod transport;
pub mod v3;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

pub use client::{Client, ClientBuilder};
pub use error::{
    AuthErrorKind, CryptoErrorKind, DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result,
};
pub use message::{CommunityMessage, ScopedPdu, V3Message};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use session::{DiscoveryState, Session};
pub use timetick::Timetick;
pub use transport::{Transport, UdpTransport};
pub use v3::{AuthProtocol, PrivProtocol, SecurityLevel, SecurityParameters};
pub use value::{OpaqueHints, Value};
pub use varbind::VarBind;
pub use version::Version;
