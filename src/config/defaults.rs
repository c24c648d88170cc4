//! Default value helpers for configuration deserialization

use std::time::Duration;

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    3000
}

pub fn default_cors_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// 24 hours, matching the provider's maximum user-session window
pub fn default_ks_expiry() -> Duration {
    Duration::from_secs(86_400)
}

pub fn default_script_poll_interval() -> Duration {
    Duration::from_millis(500)
}

pub fn default_script_timeout() -> Duration {
    Duration::from_secs(10)
}
