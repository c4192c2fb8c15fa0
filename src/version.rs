//! SNMP protocol version.

use crate::error::{Error, Result};

/// SNMP protocol version.
///
/// The discriminants are the wire values: 0 for v1, 1 for v2c, 3 for v3
/// (2 was party-based SNMPv2, never deployed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Version {
    V1 = 0,
    V2c = 1,
    V3 = 3,
}

impl Version {
    /// Create from the wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::V1),
            1 => Some(Self::V2c),
            3 => Some(Self::V3),
            _ => None,
        }
    }

    /// Get the wire value.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Parse common version spellings: `1`, `v1`, `2`, `2c`, `v2c`, `3`, `v3`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "1" => Ok(Self::V1),
            "2" | "2c" | "2C" => Ok(Self::V2c),
            "3" => Ok(Self::V3),
            _ => Err(Error::Config(format!("unsupported snmp version ({s})"))),
        }
    }
}

impl std::str::FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "1"),
            Self::V2c => write!(f, "2c"),
            Self::V3 => write!(f, "3"),
        }
    }
}
