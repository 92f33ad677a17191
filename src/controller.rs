//! Session controller: identity state machine over an [`AuthService`].
//!
//! DESIGN
//! ======
//! The controller owns a `StateCell<SessionState>` and exposes snapshots,
//! listeners and three transitions (`sign_in`, `sign_up`, `sign_out`).
//! Identity is only ever derived from `who_am_i`; `sign_in` logs in and then
//! re-resolves rather than trusting anything the login call returns.
//!
//! `resolving` is held by a `ResolvingGuard`. Every completion clears it,
//! and the guard also releases in `Drop`, so the flag returns to `false` on
//! every exit path: success, error, panic, or a dropped future.
//!
//! TRADE-OFFS
//! ==========
//! Overlapping resolutions are not serialized. By default the last one to
//! complete writes both `identity` and `resolving`, so an older call that
//! finishes after a newer one overwrites it. `StaleResolution::Discard`
//! turns on a generation guard: completions older than the newest
//! resolution or sign-out touch neither field.
//!
//! The initial resolution runs on a spawned task holding only a weak
//! reference to controller state. If every handle is dropped before it
//! completes, the completion is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::identity::{Identity, SessionState};
use crate::observe::{StateCell, Subscription};
use crate::service::AuthService;

/// How to treat a resolution that completes after a newer one started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaleResolution {
    /// Whichever resolution completes last writes `identity`.
    #[default]
    LastWriteWins,
    /// Completions older than the newest resolution or sign-out are ignored.
    Discard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub stale_resolution: StaleResolution,
}

// =============================================================================
// SHARED STATE
// =============================================================================

struct Shared {
    service: Arc<dyn AuthService>,
    state: StateCell<SessionState>,
    options: SessionOptions,
    /// Bumped by every resolution start and every sign-out.
    generation: AtomicU64,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        match self.options.stale_resolution {
            StaleResolution::LastWriteWins => true,
            StaleResolution::Discard => self.generation.load(Ordering::SeqCst) == generation,
        }
    }

    /// Finish one resolution. A current completion writes its outcome (if
    /// any) and clears `resolving`; a stale one changes nothing.
    fn release(&self, generation: u64, outcome: Option<Option<Identity>>) {
        self.state.update_if(|state| {
            if !self.is_current(generation) {
                debug!(generation, "discarding stale identity resolution");
                return false;
            }
            let mut changed = false;
            if let Some(identity) = outcome {
                if state.identity != identity {
                    state.identity = identity;
                    changed = true;
                }
            }
            if state.resolving {
                state.resolving = false;
                changed = true;
            }
            changed
        });
    }
}

/// Scoped hold on `resolving` for one identity resolution.
struct ResolvingGuard {
    shared: Weak<Shared>,
    generation: u64,
    armed: bool,
}

impl ResolvingGuard {
    fn acquire(shared: &Arc<Shared>) -> Self {
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        shared.state.update_if(|state| {
            let changed = !state.resolving;
            state.resolving = true;
            changed
        });
        Self { shared: Arc::downgrade(shared), generation, armed: true }
    }

    /// Record the outcome and release in a single state transition.
    fn complete(mut self, identity: Option<Identity>) {
        self.armed = false;
        match self.shared.upgrade() {
            Some(shared) => shared.release(self.generation, Some(identity)),
            None => debug!("session controller dropped before resolution completed"),
        }
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.release(self.generation, None);
        }
    }
}

async fn run_resolution(service: Arc<dyn AuthService>, guard: ResolvingGuard) {
    let identity = match service.who_am_i().await {
        Ok(identity) => {
            debug!(user_id = identity.id, username = %identity.username, "identity resolved");
            Some(identity)
        }
        Err(e) => {
            debug!(error = %e, code = e.error_code(), "no valid session");
            None
        }
    };
    guard.complete(identity);
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Client-side session state machine. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    /// Create a controller and schedule resolution of the existing session.
    ///
    /// The returned controller starts in `(absent, resolving)`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn create(service: Arc<dyn AuthService>) -> Self {
        Self::with_options(service, SessionOptions::default())
    }

    /// [`SessionController::create`] with explicit options.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn with_options(service: Arc<dyn AuthService>, options: SessionOptions) -> Self {
        let shared = Arc::new(Shared {
            service,
            state: StateCell::new(SessionState::default()),
            options,
            generation: AtomicU64::new(0),
        });
        let guard = ResolvingGuard::acquire(&shared);
        tokio::spawn(run_resolution(Arc::clone(&shared.service), guard));
        info!(stale_resolution = ?options.stale_resolution, "session controller created");
        Self { shared }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.shared.state.get()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.snapshot().identity
    }

    #[must_use]
    pub fn resolving(&self) -> bool {
        self.snapshot().resolving
    }

    /// Register a listener called with the current state now and after every
    /// change. Listeners may call back into the controller; updates made from
    /// inside a listener are delivered after it returns.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.shared.state.subscribe(listener)
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.shared.state.watch()
    }

    /// Wait until `resolving` is false and return that state.
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.shared.state.watch();
        match rx.wait_for(SessionState::is_settled).await {
            Ok(state) => SessionState::clone(&state),
            Err(_) => self.snapshot(),
        }
    }

    /// Re-derive `identity` from the stored credential. Never fails.
    pub(crate) async fn resolve_identity(&self) {
        let guard = ResolvingGuard::acquire(&self.shared);
        run_resolution(Arc::clone(&self.shared.service), guard).await;
    }

    /// Log in, then re-resolve identity from the new credential.
    ///
    /// # Errors
    ///
    /// Returns the service's [`AuthError`] unchanged if login fails; state is
    /// left untouched in that case.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<(), AuthError> {
        self.shared
            .service
            .login(username, password)
            .await
            .inspect_err(|e| debug!(%username, error = %e, "sign-in rejected"))?;
        self.resolve_identity().await;
        info!(%username, signed_in = self.snapshot().is_signed_in(), "sign-in complete");
        Ok(())
    }

    /// Register an account. Does not sign in and does not touch state.
    ///
    /// # Errors
    ///
    /// Returns the service's [`AuthError`] unchanged if registration fails.
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let identity = self.shared.service.register(username, password).await?;
        info!(user_id = identity.id, username = %identity.username, role = %identity.role, "account registered");
        Ok(())
    }

    /// Clear the credential and drop to `(absent, settled)`. Local only.
    pub fn sign_out(&self) {
        self.shared.service.clear_credential();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.state.update_if(|state| {
            let changed = state.identity.is_some() || state.resolving;
            state.identity = None;
            state.resolving = false;
            changed
        });
        info!("signed out");
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
