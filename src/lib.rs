//! KS broker
//!
//! A thin integration layer between an embedded video player widget and a
//! third-party video platform's session-token API. The web layer exposes a
//! single token issuance endpoint; the player module manages the lifecycle
//! of the vendor player object around the tokens it obtains.

pub mod config;
pub mod errors;
pub mod models;
pub mod player;
pub mod services;
pub mod web;

pub use config::Config;
pub use errors::{AppError, AppResult, PlayerError, PlayerResult};
pub use models::{EntryId, PrivilegeSet, SessionToken};
pub use services::SessionTokenService;
