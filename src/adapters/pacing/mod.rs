//! Pacing Policy Adapters.
//!
//! - `RandomPacing` - Uniform delay from a configured range
//! - `FixedPacing` - Constant delay, or none

mod fixed;
mod random;

pub use fixed::FixedPacing;
pub use random::RandomPacing;

use std::sync::Arc;

use crate::config::PacingConfig;
use crate::ports::PacingPolicy;

/// Builds the policy described by configuration.
pub fn from_config(config: &PacingConfig) -> Arc<dyn PacingPolicy> {
    if config.enabled {
        Arc::new(RandomPacing::from(config))
    } else {
        Arc::new(FixedPacing::immediate())
    }
}
