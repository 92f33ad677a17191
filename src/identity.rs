//! Session data model: identity, role, observable session state, credential.
//!
//! DESIGN
//! ======
//! `Identity` mirrors the backend's `UserOut` payload so serde decoding of
//! `/api/v1/auth/me` and `/api/v1/auth/register` stays lossless. Absence of
//! an identity is modelled as `Option::None`, never as a sentinel user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role label carried by an identity. No permission logic hangs off it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user's public profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-assigned user id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Role label (`user` or `admin`).
    pub role: Role,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Coarse view of [`SessionState`] for rendering decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Identity is not yet determined. Not the same as signed out.
    Resolving,
    SignedIn,
    SignedOut,
}

/// Snapshot of the controller's state handed to observers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub resolving: bool,
}

impl SessionState {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// True once no resolution is in flight.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.resolving
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (&self.identity, self.resolving) {
            (_, true) => SessionPhase::Resolving,
            (Some(_), false) => SessionPhase::SignedIn,
            (None, false) => SessionPhase::SignedOut,
        }
    }
}

/// Opaque bearer token proving an established session.
///
/// `Debug` is redacted so tokens never end up in log output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;
