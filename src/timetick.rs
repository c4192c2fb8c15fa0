//! TimeTicks value type.
//!
//! A `Timetick` counts hundredths of a second since some device epoch
//! (typically the agent's last restart). It behaves like a plain unsigned
//! integer in arithmetic and renders human-readably.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Hundredths of a second since an agent-defined epoch.
///
/// Wire form is APPLICATION tag 3 with exactly four big-endian bytes.
///
/// # Examples
///
/// ```
/// use snmp_client::Timetick;
///
/// let uptime = Timetick::new(1_525_917_187);
/// assert_eq!(
///     uptime.to_string(),
///     "Timeticks: (1525917187) 176 days, 14:39:31.87"
/// );
/// assert_eq!((uptime + 1).ticks(), 1_525_917_188);
/// assert_eq!((1_525_917_188 - uptime).ticks(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timetick(u64);

impl Timetick {
    /// Create from a raw tick count.
    pub fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Raw tick count (hundredths of a second).
    pub fn ticks(&self) -> u64 {
        self.0
    }

    /// Whole seconds represented by this tick count.
    pub fn as_secs(&self) -> u64 {
        self.0 / 100
    }

    /// The low 32 bits, as carried on the wire.
    pub(crate) fn wire_value(&self) -> u32 {
        self.0 as u32
    }
}

impl From<u64> for Timetick {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

impl From<u32> for Timetick {
    fn from(ticks: u32) -> Self {
        Self(ticks as u64)
    }
}

impl From<Timetick> for u64 {
    fn from(t: Timetick) -> Self {
        t.0
    }
}

impl Add<u64> for Timetick {
    type Output = Timetick;
    fn add(self, rhs: u64) -> Timetick {
        Timetick(self.0 + rhs)
    }
}

impl Add<Timetick> for u64 {
    type Output = Timetick;
    fn add(self, rhs: Timetick) -> Timetick {
        Timetick(self + rhs.0)
    }
}

impl Sub<u64> for Timetick {
    type Output = Timetick;
    fn sub(self, rhs: u64) -> Timetick {
        Timetick(self.0 - rhs)
    }
}

impl Sub<Timetick> for u64 {
    type Output = Timetick;
    fn sub(self, rhs: Timetick) -> Timetick {
        Timetick(self - rhs.0)
    }
}

impl Mul<u64> for Timetick {
    type Output = Timetick;
    fn mul(self, rhs: u64) -> Timetick {
        Timetick(self.0 * rhs)
    }
}

impl Mul<Timetick> for u64 {
    type Output = Timetick;
    fn mul(self, rhs: Timetick) -> Timetick {
        Timetick(self * rhs.0)
    }
}

impl Div<u64> for Timetick {
    type Output = Timetick;
    fn div(self, rhs: u64) -> Timetick {
        Timetick(self.0 / rhs)
    }
}

impl Div<Timetick> for u64 {
    type Output = Timetick;
    fn div(self, rhs: Timetick) -> Timetick {
        Timetick(self / rhs.0)
    }
}

impl fmt::Display for Timetick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let centis = self.0 % 100;
        let secs = self.0 / 100;
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3_600;
        let minutes = (secs % 3_600) / 60;
        let seconds = secs % 60;
        write!(
            f,
            "Timeticks: ({}) {} days, {:02}:{:02}:{:02}.{:02}",
            self.0, days, hours, minutes, seconds, centis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let t = Timetick::new(1_525_917_187);
        assert_eq!(
            t.to_string(),
            "Timeticks: (1525917187) 176 days, 14:39:31.87"
        );
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(
            Timetick::new(0).to_string(),
            "Timeticks: (0) 0 days, 00:00:00.00"
        );
    }

    #[test]
    fn test_display_sub_minute() {
        // 4321 ticks = 43.21 seconds
        assert_eq!(
            Timetick::new(4321).to_string(),
            "Timeticks: (4321) 0 days, 00:00:43.21"
        );
    }

    #[test]
    fn test_arithmetic_with_integers() {
        let t = Timetick::new(1_525_917_187);
        assert_eq!((1 + t).ticks(), 1_525_917_188);
        assert_eq!((t + 1).ticks(), 1_525_917_188);
        assert_eq!((1_525_917_188 - t).ticks(), 1);
        assert_eq!((10 * t).ticks(), 15_259_171_870);
        assert_eq!((1_525_917_187 / t).ticks(), 1);
        assert_eq!((t / 100).ticks(), 15_259_171);
    }

    #[test]
    fn test_as_secs() {
        assert_eq!(Timetick::new(12_345).as_secs(), 123);
    }

    #[test]
    fn test_ordering() {
        assert!(Timetick::new(1) < Timetick::new(2));
    }
}
