//! Error types for the auth boundary.
//!
//! ERROR HANDLING
//! ==============
//! `AuthError` is the only error the session controller deals with. Identity
//! resolution absorbs it; sign-in and sign-up hand it back to the caller
//! unchanged so the UI can present it.

/// Failure reported by a [`TokenStore`](crate::token_store::TokenStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced by [`AuthService`](crate::service::AuthService) operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential is stored, so there is no session to query.
    #[error("no stored credential")]
    MissingCredential,

    /// The auth service answered with a non-success status.
    #[error("auth service rejected request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body did not match the expected schema.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The issued credential could not be persisted.
    #[error("credential store failed: {0}")]
    CredentialStore(#[from] TokenStoreError),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AuthError {
    /// Stable machine-readable code for UI mapping.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "E_MISSING_CREDENTIAL",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Decode(_) => "E_DECODE",
            Self::CredentialStore(_) => "E_CREDENTIAL_STORE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    ///
    /// The controller never retries on its own; this is for callers.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rejected { status: 429 | 500..=599, .. })
    }

    /// Whether the failure means "no valid session".
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::Rejected { status: 401, .. })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
