//! Domain services used by the HTTP routes and background tasks.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the chat semantics (registry, messages, responder,
//! history, persistence) so route handlers stay focused on protocol
//! translation.

pub mod chatroom;
pub mod history;
pub mod message;
pub mod persistence;
pub mod preferences;
pub mod responder;
pub mod validation;
