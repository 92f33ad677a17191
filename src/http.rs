//! HTTP implementation of [`AuthService`] for the `/api/v1/auth` REST API.
//!
//! Thin reqwest wrapper. Response parsing lives in pure functions
//! (`parse_identity`, `parse_token`, `rejection_detail`) for testability.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx answers become `AuthError::Rejected` carrying the server's
//! `detail` message. Transport failures (including the request timeout)
//! become `AuthError::Transport`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::identity::{Credential, Identity};
use crate::service::AuthService;
use crate::token_store::TokenStore;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const REGISTER_PATH: &str = "/api/v1/auth/register";
const ME_PATH: &str = "/api/v1/auth/me";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthService {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpAuthService {
    /// Build a client for `config.base_url`, persisting credentials in `tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned(), tokens })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait::async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint(LOGIN_PATH))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let body = read_success(response).await?;
        let token = parse_token(&body)?;
        self.tokens.store(Credential::new(token))?;
        debug!(%username, "login succeeded; credential stored");
        Ok(())
    }

    async fn register(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let response = self
            .http
            .post(self.endpoint(REGISTER_PATH))
            .json(&RegisterRequest { username, password })
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let body = read_success(response).await?;
        parse_identity(&body)
    }

    async fn who_am_i(&self) -> Result<Identity, AuthError> {
        let credential = self.tokens.load().ok_or(AuthError::MissingCredential)?;
        let response = self
            .http
            .get(self.endpoint(ME_PATH))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let body = read_success(response).await?;
        parse_identity(&body)
    }

    fn clear_credential(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "credential removal failed");
        }
    }
}

async fn read_success(response: reqwest::Response) -> Result<String, AuthError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| AuthError::Transport(e.to_string()))?;

    if !(200..300).contains(&status) {
        return Err(AuthError::Rejected { status, detail: rejection_detail(&text) });
    }
    Ok(text)
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_identity(json: &str) -> Result<Identity, AuthError> {
    serde_json::from_str(json).map_err(|e| AuthError::Decode(e.to_string()))
}

fn parse_token(json: &str) -> Result<String, AuthError> {
    let resp: TokenResponse = serde_json::from_str(json).map_err(|e| AuthError::Decode(e.to_string()))?;
    if let Some(kind) = resp.token_type.as_deref() {
        if !kind.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::Decode(format!("unsupported token type: {kind}")));
        }
    }
    if resp.access_token.is_empty() {
        return Err(AuthError::Decode("empty access token".to_owned()));
    }
    Ok(resp.access_token)
}

/// Extract a human-readable message from an error body.
///
/// Handles `{"detail": "..."}` and validation errors shaped as
/// `{"detail": [{"msg": "..."}]}`; anything else is returned verbatim.
fn rejection_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_owned();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
            .map_or_else(|| body.trim().to_owned(), ToOwned::to_owned),
        _ => body.trim().to_owned(),
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;
