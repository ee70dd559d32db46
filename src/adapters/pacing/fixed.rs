//! Constant reveal delay.

use std::time::Duration;

use crate::ports::PacingPolicy;

/// Reveals every bot turn after the same delay.
///
/// `FixedPacing::immediate()` is the zero-delay policy used by tests and
/// when pacing is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPacing(Duration);

impl FixedPacing {
    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }

    pub fn immediate() -> Self {
        Self(Duration::ZERO)
    }
}

impl PacingPolicy for FixedPacing {
    fn reveal_delay(&self) -> Duration {
        self.0
    }
}
