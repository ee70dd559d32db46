//! Domain layer containing the assistant's state machines and value types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine trait)
//! - `conversation` - Session lifecycle, turns, message log and input-type dispatch
//! - `satisfaction` - End-of-conversation satisfaction and escalation sub-flow

pub mod conversation;
pub mod foundation;
pub mod satisfaction;
