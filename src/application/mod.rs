//! Application layer - the assistant session engine.
//!
//! The engine orchestrates the conversation domain and the satisfaction
//! sub-flow over the dialogue transport and pacing ports. Callers dispatch
//! intents and render the snapshots it publishes.

pub mod engine;
pub mod scheduler;
pub mod snapshot;

pub use engine::{AssistantEngine, EngineError, SATISFIED_LABEL};
pub use scheduler::{InputGuard, TurnScheduler};
pub use snapshot::{EngineSnapshot, IgnoreReason, TurnOutcome};
