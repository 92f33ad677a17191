//! The remote auth boundary consumed by the session controller.

use crate::error::AuthError;
use crate::identity::Identity;

/// Remote authentication service. Enables mocking in tests.
///
/// Implementations own the credential: `login` persists it, `who_am_i`
/// reads it, `clear_credential` removes it.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and persist the issued session credential.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on bad credentials or transport failure.
    async fn login(&self, username: &str, password: &str) -> Result<(), AuthError>;

    /// Create an account. Does not establish a session.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on conflict, validation or transport failure.
    async fn register(&self, username: &str, password: &str) -> Result<Identity, AuthError>;

    /// Resolve the identity behind the stored credential.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the credential is missing, expired or
    /// invalid, or the request fails.
    async fn who_am_i(&self) -> Result<Identity, AuthError>;

    /// Remove the stored credential. Best effort; never fails from the
    /// caller's point of view.
    fn clear_credential(&self);
}
