//! Random reveal delay drawn from a configured range.

use rand::Rng;
use std::time::Duration;

use crate::config::PacingConfig;
use crate::ports::PacingPolicy;

/// Draws each reveal delay uniformly from `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomPacing {
    min: Duration,
    max: Duration,
}

impl RandomPacing {
    /// Creates a policy for the given range. Bounds are swapped if inverted.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for RandomPacing {
    /// 500 to 1500 ms.
    fn default() -> Self {
        Self::from(&PacingConfig::default())
    }
}

impl From<&PacingConfig> for RandomPacing {
    fn from(config: &PacingConfig) -> Self {
        Self::new(config.min_delay(), config.max_delay())
    }
}

impl PacingPolicy for RandomPacing {
    fn reveal_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let mut rng = rand::thread_rng();
        let min = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rng.gen_range(min..=max))
    }
}
