//! Dialogue Transport Adapters.
//!
//! - `HttpDialogueTransport` - JSON over HTTP to the dialogue service
//! - `MockDialogueTransport` - Scripted replies for tests and offline demos

mod http_transport;
mod mock_transport;

pub use http_transport::{HttpDialogueTransport, HttpTransportConfig};
pub use mock_transport::{MockCall, MockDialogueTransport, MOCK_SESSION_ID};
