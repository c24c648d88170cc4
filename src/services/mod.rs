//! Business logic services
//!
//! Services own their configuration and collaborators explicitly; nothing is
//! process-global, so independently configured instances can coexist (and be
//! tested) side by side.

pub mod session_token;

pub use session_token::{HttpSessionApi, SessionApi, SessionStartParams, SessionTokenService};
