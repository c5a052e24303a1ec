use std::fmt;

/// Result of one estimation run.
///
/// Keeps the aggregate inside-count and the number of samples actually drawn,
/// which may be fewer than requested when the parallel partition truncates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiEstimate {
    pub inside: u64,
    pub drawn: u64,
}

impl PiEstimate {
    pub(crate) fn new(inside: u64, drawn: u64) -> Self {
        debug_assert!(drawn > 0);
        debug_assert!(inside <= drawn);
        PiEstimate { inside, drawn }
    }

    /// `4 * inside / drawn`, always in [0, 4].
    pub fn value(&self) -> f64 {
        4.0 * self.inside as f64 / self.drawn as f64
    }

    /// Signed distance from `std::f64::consts::PI`.
    pub fn error(&self) -> f64 {
        std::f64::consts::PI - self.value()
    }
}

impl fmt::Display for PiEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
