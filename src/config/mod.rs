use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

/// External provider account configuration
///
/// `api_endpoint`, `partner_id` and `admin_secret` are required before any
/// token can be issued; the remaining fields feed the default privilege set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API, e.g. `https://www.example.com/api_v3`
    #[serde(default)]
    pub api_endpoint: String,
    /// Partner account id; 0 means unset
    #[serde(default)]
    pub partner_id: i64,
    #[serde(default)]
    pub admin_secret: String,
    /// Session token lifetime requested from the provider
    #[serde(default = "default_ks_expiry", with = "duration_serde::duration")]
    pub ks_expiry: Duration,
    /// Entry granted playback when no explicit entry id is requested
    #[serde(default)]
    pub default_entry_id: String,
    #[serde(default)]
    pub privacy_context: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub virtual_event_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed cross-origin hosts; `*` means any origin
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

/// Player widget configuration consumed by the lifecycle controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub partner_id: i64,
    #[serde(default)]
    pub ui_conf_id: i64,
    /// Entry loaded when the caller does not supply one
    #[serde(default)]
    pub default_entry_id: String,
    /// How often to re-check vendor script availability
    #[serde(
        default = "default_script_poll_interval",
        with = "duration_serde::duration"
    )]
    pub script_poll_interval: Duration,
    /// Give up waiting for the vendor script after this long
    #[serde(default = "default_script_timeout", with = "duration_serde::duration")]
    pub script_timeout: Duration,
    #[serde(default)]
    pub autoplay: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            partner_id: 0,
            admin_secret: String::new(),
            ks_expiry: default_ks_expiry(),
            default_entry_id: String::new(),
            privacy_context: String::new(),
            app_id: String::new(),
            virtual_event_id: String::new(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_allowed_origins(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            partner_id: 0,
            ui_conf_id: 0,
            default_entry_id: String::new(),
            script_poll_interval: default_script_poll_interval(),
            script_timeout: default_script_timeout(),
            autoplay: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            web: WebConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Compose the default privilege set from the configured account values
    ///
    /// Entries whose configured value is empty are dropped, so a minimal
    /// account still produces a valid privileges string.
    pub fn default_privileges(&self) -> Vec<String> {
        let candidates = [
            "setrole:PLAYBACK_BASE_ROLE".to_string(),
            prefixed("sview", &self.default_entry_id),
            prefixed("eventsessioncontextid", &self.default_entry_id),
            prefixed("privacycontext", &self.privacy_context),
            "enableentitlement".to_string(),
            prefixed("appid", &self.app_id),
            prefixed("virtualeventid", &self.virtual_event_id),
            "restrictexplicitliveview:*".to_string(),
        ];
        candidates.into_iter().filter(|p| !p.is_empty()).collect()
    }
}

fn prefixed(prefix: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{prefix}:{value}")
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let mut config: Config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay `KS_BROKER_*` environment variables on the loaded file
    ///
    /// Lets secret-bearing provider fields stay out of the config file in
    /// containerized deployments.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KS_BROKER_API_ENDPOINT") {
            self.provider.api_endpoint = v;
        }
        if let Ok(v) = std::env::var("KS_BROKER_PARTNER_ID")
            && let Ok(id) = v.parse()
        {
            self.provider.partner_id = id;
        }
        if let Ok(v) = std::env::var("KS_BROKER_ADMIN_SECRET") {
            self.provider.admin_secret = v;
        }
        if let Ok(v) = std::env::var("KS_BROKER_KS_EXPIRY_SECONDS")
            && let Ok(secs) = v.parse()
        {
            self.provider.ks_expiry = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("KS_BROKER_DEFAULT_ENTRY_ID") {
            self.provider.default_entry_id = v;
        }
        if let Ok(v) = std::env::var("KS_BROKER_PRIVACY_CONTEXT") {
            self.provider.privacy_context = v;
        }
        if let Ok(v) = std::env::var("KS_BROKER_APP_ID") {
            self.provider.app_id = v;
        }
        if let Ok(v) = std::env::var("KS_BROKER_VIRTUAL_EVENT_ID") {
            self.provider.virtual_event_id = v;
        }
        if let Ok(v) = std::env::var("KS_BROKER_PORT")
            && let Ok(port) = v.parse()
        {
            self.web.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_privileges_skip_unset_values() {
        let provider = ProviderConfig::default();
        let privileges = provider.default_privileges();

        assert_eq!(
            privileges,
            vec![
                "setrole:PLAYBACK_BASE_ROLE".to_string(),
                "enableentitlement".to_string(),
                "restrictexplicitliveview:*".to_string(),
            ]
        );
    }

    #[test]
    fn default_privileges_include_configured_values_in_order() {
        let provider = ProviderConfig {
            default_entry_id: "1_defgh1234".to_string(),
            privacy_context: "ctx1".to_string(),
            app_id: "myapp".to_string(),
            virtual_event_id: "42".to_string(),
            ..ProviderConfig::default()
        };

        assert_eq!(
            provider.default_privileges(),
            vec![
                "setrole:PLAYBACK_BASE_ROLE".to_string(),
                "sview:1_defgh1234".to_string(),
                "eventsessioncontextid:1_defgh1234".to_string(),
                "privacycontext:ctx1".to_string(),
                "enableentitlement".to_string(),
                "appid:myapp".to_string(),
                "virtualeventid:42".to_string(),
                "restrictexplicitliveview:*".to_string(),
            ]
        );
    }

    #[test]
    fn config_parses_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            api_endpoint = "https://example.com/api_v3"
            partner_id = 123
            admin_secret = "s3cret"
            ks_expiry = "12h"

            [web]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.partner_id, 123);
        assert_eq!(config.provider.ks_expiry, Duration::from_secs(43_200));
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.player.script_timeout, Duration::from_secs(10));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.web.port, 3000);
        assert_eq!(
            config.player.script_poll_interval,
            Duration::from_millis(500)
        );
        assert!(config.provider.api_endpoint.is_empty());
    }
}
