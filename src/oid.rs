//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for
//! common OIDs. Every constructed `Oid` has at least two arcs; this is a
//! structural property of the BER encoding (the first subidentifier packs
//! arcs one and two together) and the library enforces it everywhere.

use crate::error::{Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Object Identifier: an ordered sequence of arc values, minimum length 2.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an OID from a slice of arcs.
    ///
    /// # Panics
    ///
    /// Panics if `arcs` has fewer than 2 elements. Use [`Oid::parse`] for
    /// fallible construction from untrusted input.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_client::oid::Oid;
    ///
    /// let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    /// assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    /// ```
    pub fn from_slice(arcs: &[u32]) -> Self {
        assert!(arcs.len() >= 2, "OID must have at least 2 arcs");
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Create an OID from an iterator of arc values.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields fewer than 2 values.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        let arcs: SmallVec<[u32; 16]> = arcs.into_iter().collect();
        assert!(arcs.len() >= 2, "OID must have at least 2 arcs");
        Self { arcs }
    }

    /// Parse an OID from dotted decimal notation.
    ///
    /// A single leading dot is accepted (`.1.3.6.1` parses the same as
    /// `1.3.6.1`). Empty segments, trailing dots, non-numeric segments, and
    /// identifiers with fewer than two arcs are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_client::oid::Oid;
    ///
    /// let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    ///
    /// assert!(Oid::parse("1").is_err());
    /// assert!(Oid::parse(".1.").is_err());
    /// assert!(Oid::parse("blablabla").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::TooShort, s));
        }

        let mut arcs = SmallVec::new();
        for part in trimmed.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        if arcs.len() < 2 {
            return Err(Error::invalid_oid_with_input(OidErrorKind::TooShort, s));
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Always false; an `Oid` has at least 2 arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether this OID is a strict prefix of `other`.
    ///
    /// An OID is not its own parent.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_client::oid::Oid;
    ///
    /// let system = Oid::parse("1.3.6.1.2.1.1").unwrap();
    /// let sys_descr = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
    ///
    /// assert!(system.is_parent_of(&sys_descr));
    /// assert!(!sys_descr.is_parent_of(&system));
    /// assert!(!system.is_parent_of(&system));
    /// ```
    pub fn is_parent_of(&self, other: &Oid) -> bool {
        self.arcs.len() < other.arcs.len() && other.arcs[..self.arcs.len()] == self.arcs[..]
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Encode to BER content bytes (X.690 Section 8.19).
    ///
    /// The first two arcs are combined into one subidentifier as
    /// `arc0 * 40 + arc1`; every subidentifier is base-128 packed with
    /// continuation bits.
    pub fn to_ber(&self) -> SmallVec<[u8; 32]> {
        let mut bytes = SmallVec::new();

        let first_subid = self.arcs[0] * 40 + self.arcs[1];
        encode_subidentifier(&mut bytes, first_subid);
        for &arc in &self.arcs[2..] {
            encode_subidentifier(&mut bytes, arc);
        }

        bytes
    }

    /// Decode from BER content bytes.
    ///
    /// Empty content fails with `InvalidOid`: a wire OID always carries at
    /// least one subidentifier, which expands to two arcs.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::invalid_oid(OidErrorKind::TooShort));
        }

        let mut arcs = SmallVec::new();

        let (first_subid, consumed) = decode_subidentifier(data)?;
        if first_subid < 40 {
            arcs.push(0);
            arcs.push(first_subid);
        } else if first_subid < 80 {
            arcs.push(1);
            arcs.push(first_subid - 40);
        } else {
            arcs.push(2);
            arcs.push(first_subid - 80);
        }

        let mut i = consumed;
        while i < data.len() {
            let (arc, n) = decode_subidentifier(&data[i..])?;
            arcs.push(arc);
            i += n;
        }

        Ok(Self { arcs })
    }
}

/// Append a base-128 subidentifier with continuation bits.
#[inline]
fn encode_subidentifier(bytes: &mut SmallVec<[u8; 32]>, value: u32) {
    if value == 0 {
        bytes.push(0);
        return;
    }

    let mut groups = 0;
    let mut temp = value;
    while temp > 0 {
        groups += 1;
        temp >>= 7;
    }

    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode one base-128 subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut i = 0;

    loop {
        let byte = *data.get(i).ok_or_else(|| {
            Error::decode(i, crate::error::DecodeErrorKind::TruncatedData)
        })?;
        i += 1;

        if value > (u32::MAX >> 7) {
            return Err(Error::decode(
                i,
                crate::error::DecodeErrorKind::IntegerOverflow,
            ));
        }

        value = (value << 7) | (byte & 0x7F) as u32;

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, i))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({self})")
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Create an OID from literal arcs.
///
/// # Examples
///
/// ```
/// use snmp_client::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    }

    #[test]
    fn test_parse_leading_dot() {
        let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Oid::parse("blablabla").is_err());
        assert!(Oid::parse("1.3.abc.1").is_err());
        assert!(Oid::parse("1.3.-6.1").is_err());
    }

    #[test]
    fn test_parse_rejects_stray_dots() {
        assert!(Oid::parse(".1.").is_err());
        assert!(Oid::parse("1.3.").is_err());
        assert!(Oid::parse("1..3").is_err());
        assert!(Oid::parse("..1.3").is_err());
    }

    #[test]
    fn test_parse_rejects_too_short() {
        assert!(Oid::parse("").is_err());
        assert!(Oid::parse("1").is_err());
        assert!(Oid::parse(".1").is_err());

        let err = Oid::parse("1").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOid {
                kind: OidErrorKind::TooShort,
                ..
            }
        ));
    }

    #[test]
    fn test_two_arcs_is_minimum() {
        assert_eq!(Oid::parse("1.3").unwrap().arcs(), &[1, 3]);
    }

    #[test]
    fn test_display_normalizes() {
        assert_eq!(
            Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap().to_string(),
            "1.3.6.1.2.1.1.1.0"
        );
    }

    #[test]
    fn test_ber_encoding() {
        // 1.3.6.1 encodes as (1*40+3)=43, 6, 1
        let oid = Oid::parse("1.3.6.1").unwrap();
        assert_eq!(&oid.to_ber()[..], &[0x2B, 0x06, 0x01]);
    }

    #[test]
    fn test_ber_multibyte_subidentifier() {
        // 2011 = 0x7DB needs two base-128 bytes: 0x8F 0x5B
        let oid = Oid::parse("1.3.6.1.4.1.2011").unwrap();
        assert_eq!(
            &oid.to_ber()[..],
            &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x8F, 0x5B]
        );
    }

    #[test]
    fn test_ber_roundtrip() {
        for text in ["1.3.6.1.2.1.1.1.0", "0.0", "1.39", "2.999.3", "1.3.6.1.4.1.2011.5.117.1"] {
            let oid = Oid::parse(text).unwrap();
            let decoded = Oid::from_ber(&oid.to_ber()).unwrap();
            assert_eq!(oid, decoded, "roundtrip failed for {text}");
        }
    }

    #[test]
    fn test_from_ber_first_subid_ranges() {
        assert_eq!(Oid::from_ber(&[39]).unwrap().arcs(), &[0, 39]);
        assert_eq!(Oid::from_ber(&[40]).unwrap().arcs(), &[1, 0]);
        assert_eq!(Oid::from_ber(&[79]).unwrap().arcs(), &[1, 39]);
        assert_eq!(Oid::from_ber(&[80]).unwrap().arcs(), &[2, 0]);
    }

    #[test]
    fn test_from_ber_empty_rejected() {
        assert!(Oid::from_ber(&[]).is_err());
    }

    #[test]
    fn test_from_ber_truncated_subidentifier() {
        // continuation bit set on the last byte
        assert!(Oid::from_ber(&[0x2B, 0x8F]).is_err());
    }

    #[test]
    fn test_is_parent_of() {
        let root = Oid::parse("1.3.6.1.2.1.1").unwrap();
        let leaf = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        let other = Oid::parse("1.3.6.1.2.1.2").unwrap();

        assert!(root.is_parent_of(&leaf));
        assert!(!leaf.is_parent_of(&root));
        assert!(!root.is_parent_of(&root));
        assert!(!root.is_parent_of(&other));
    }

    #[test]
    fn test_not_parent_when_arc_is_numeric_prefix() {
        // 1.3.6.1.1 is not a parent of 1.3.6.1.10 even though "1" prefixes "10"
        let a = Oid::parse("1.3.6.1.1").unwrap();
        let b = Oid::parse("1.3.6.1.10").unwrap();
        assert!(!a.is_parent_of(&b));
    }

    #[test]
    fn test_ordering() {
        let a = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        let b = Oid::parse("1.3.6.1.2.1.1.2.0").unwrap();
        let prefix = Oid::parse("1.3.6.1.2.1.1").unwrap();
        assert!(a < b);
        assert!(prefix < a);
    }

    #[test]
    fn test_macro() {
        let oid = oid!(1, 3, 6, 1);
        assert_eq!(oid.arcs(), &[1, 3, 6, 1]);
    }

    #[test]
    fn test_child() {
        let oid = oid!(1, 3, 6).child(1);
        assert_eq!(oid.to_string(), "1.3.6.1");
    }

    #[test]
    #[should_panic(expected = "at least 2 arcs")]
    fn test_from_slice_single_arc_panics() {
        let _ = Oid::from_slice(&[1]);
    }
}
