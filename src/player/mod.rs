//! Player lifecycle management
//!
//! The controller drives one external player object through its lifecycle:
//! wait for the vendor script, fetch a session token, construct the player,
//! load media, and tear everything down on re-entry or disposal. Tokens come
//! through the [`TokenSupplier`] seam; the vendor object sits behind the
//! capability traits in [`factory`].

pub mod controller;
pub mod factory;

pub use controller::{PlayerController, PlayerControllerBuilder, PlayerState};
pub use factory::{
    AttachmentSignal, PlayerEvent, PlayerFactory, PlayerHandle, PlayerSetupConfig, RenderTarget,
};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::errors::{AppError, AppResult};
use crate::models::{EntryId, SessionToken};
use crate::services::SessionTokenService;

/// Source of session tokens for the controller
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    async fn fetch_token(&self, entry_id: Option<&EntryId>) -> AppResult<SessionToken>;
}

/// Fetches tokens from the broker's `/api/ks` endpoint
///
/// This is what the player widget uses in a deployed page; in-process
/// callers can use [`SessionTokenService`] directly instead.
pub struct ApiTokenClient {
    client: reqwest::Client,
    ks_endpoint: String,
}

impl ApiTokenClient {
    pub fn new(ks_endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            ks_endpoint: ks_endpoint.into(),
        }
    }
}

#[derive(Deserialize)]
struct KsBody {
    ks: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[async_trait]
impl TokenSupplier for ApiTokenClient {
    async fn fetch_token(&self, entry_id: Option<&EntryId>) -> AppResult<SessionToken> {
        let payload = match entry_id {
            Some(id) => json!({ "entryId": id.as_str() }),
            None => json!({}),
        };

        let response = self
            .client
            .post(&self.ks_endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("token endpoint returned HTTP {status}"));
            return Err(AppError::upstream(message));
        }

        let body: KsBody = response.json().await?;
        SessionToken::from_raw(&body.ks)
            .ok_or_else(|| AppError::upstream("empty token from broker"))
    }
}

/// In-process token supply for co-hosted deployments and tests
#[async_trait]
impl TokenSupplier for SessionTokenService {
    async fn fetch_token(&self, entry_id: Option<&EntryId>) -> AppResult<SessionToken> {
        self.issue(entry_id, &[]).await
    }
}
