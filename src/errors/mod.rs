//! Centralized error handling for the KS broker
//!
//! Errors split along the two components of the application: `AppError`
//! covers the token issuance path (configuration, validation, upstream
//! provider failures), while `PlayerError` covers the player lifecycle
//! controller. Validation failures are reported at the boundary with field
//! details; everything else is logged internally and surfaced as a stable,
//! generic message.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for player lifecycle Results
pub type PlayerResult<T> = Result<T, PlayerError>;
