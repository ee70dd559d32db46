//! Pacing Port - Decides how long a bot turn stays behind the typing indicator.

use std::time::Duration;

/// Scheduling policy from "response received" to "turn revealed".
///
/// Injected into the engine so tests can reveal turns with no delay.
pub trait PacingPolicy: Send + Sync {
    /// Delay to hold the next bot turn before revealing it.
    fn reveal_delay(&self) -> Duration;
}
