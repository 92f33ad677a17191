//! # session-controller
//!
//! Client-side session/identity controller. Tracks whether the user is
//! authenticated, exposes the current identity to observers, and mediates
//! sign-in, sign-up and sign-out against a remote auth service.
//!
//! The `controller` module is the state machine. `service` and
//! `token_store` define its collaborators; `http` implements them for the
//! `/api/v1/auth` REST backend.

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod identity;
pub mod observe;
pub mod service;
pub mod token_store;

pub use config::AuthConfig;
pub use controller::{SessionController, SessionOptions, StaleResolution};
pub use error::{AuthError, TokenStoreError};
pub use http::HttpAuthService;
pub use identity::{Credential, Identity, Role, SessionPhase, SessionState};
pub use observe::Subscription;
pub use service::AuthService;
pub use token_store::{MemoryTokenStore, TokenStore};
