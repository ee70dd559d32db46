//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! - `DialogueTransport` - Request/response client to the dialogue service
//! - `PacingPolicy` - Reveal delay applied before a bot turn is shown

mod dialogue_transport;
mod pacing;

pub use dialogue_transport::{
    DialogueTransport, RespondRequest, SatisfactionRequest, SatisfactionResponse, StartRequest,
    TransportError, TurnResponse,
};
pub use pacing::PacingPolicy;
