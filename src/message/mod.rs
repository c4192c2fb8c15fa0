//! SNMP message formats.
//!
//! v1/v2c use the community wrapper; v3 adds the USM header, optional
//! authentication, and optional scoped-PDU encryption.

mod community;
mod v3;

pub use community::CommunityMessage;
pub use v3::{ScopedPdu, V3Message, MSG_MAX_SIZE};
