use serde::{Deserialize, Serialize};

/// Milliseconds, as used by the host event loop (timers, animation durations).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub const fn new(ms: u32) -> Self {
        Millis(ms)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Multiplies a base delay by an index, saturating instead of wrapping.
    pub fn times(self, n: usize) -> Self {
        let n = u32::try_from(n).unwrap_or(u32::MAX);
        Millis(self.0.saturating_mul(n))
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;

    #[test]
    fn times_saturates() {
        assert_eq!(Millis(100).times(3), Millis(300));
        assert_eq!(Millis(u32::MAX).times(2), Millis(u32::MAX));
    }
}
