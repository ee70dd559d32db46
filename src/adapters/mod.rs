//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to external systems:
//! - `dialogue` - Dialogue service transports (HTTP, scripted mock)
//! - `pacing` - Reveal delay policies (random range, fixed)

pub mod dialogue;
pub mod pacing;

pub use dialogue::{HttpDialogueTransport, HttpTransportConfig, MockDialogueTransport};
pub use pacing::{FixedPacing, RandomPacing};
