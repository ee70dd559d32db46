//! Rental Assistant - conversational session engine
//!
//! Drives a multi-flow property-rental assistant: opens a session with the
//! remote dialogue service, exchanges turns under an input lock with paced
//! reveal, selects how each bot turn is collected, and runs the
//! end-of-conversation satisfaction step.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
