//! HTTP request handlers
//!
//! Thin handlers that validate at the boundary and delegate to the service
//! layer.

pub mod health;
pub mod session;
