//! Session-loss recovery.
//!
//! Clears the session, remembers where the user was, and sends them to
//! login. Any number of concurrent session-loss classifications collapse
//! into a single clear and a single redirect via the latch in
//! [`RedirectState`].

use std::sync::Arc;

use crate::navigation::LOGIN_PATH;
use crate::session::{LoginRedirector, RedirectState, SessionStore};

/// Runs the session-loss procedure.
#[derive(Clone)]
pub struct SessionRecovery {
    session: SessionStore,
    redirect: Arc<RedirectState>,
    redirector: Arc<dyn LoginRedirector>,
}

impl SessionRecovery {
    pub fn new(
        session: SessionStore,
        redirect: Arc<RedirectState>,
        redirector: Arc<dyn LoginRedirector>,
    ) -> Self {
        Self {
            session,
            redirect,
            redirector,
        }
    }

    /// Handle a session-loss classification for a request that was sent
    /// with `sent_token` attached.
    ///
    /// A reply to a request carrying a credential other than the current
    /// one is stale and ignored: the session it refers to is already
    /// gone. Returns `true` only for the call that issued the redirect.
    pub fn on_session_loss(&self, sent_token: Option<&str>) -> bool {
        if let Some(current) = self.session.token() {
            if sent_token != Some(current.as_str()) {
                tracing::debug!("Ignoring session loss reported for a superseded credential");
                return false;
            }
        }

        let cleared = self.session.clear();

        if !self.redirect.try_trip() {
            tracing::debug!(cleared, "Session loss already being handled");
            return false;
        }

        if let Some(location) = self.redirector.current_location() {
            if location.path() != LOGIN_PATH {
                self.redirect.record(location);
            }
        }

        let redirected = self.redirector.redirect_to_login();

        tracing::warn!(
            cleared,
            redirected,
            pending = %self.redirect.pending().map(|l| l.full_path()).unwrap_or_default(),
            "Session lost, returning to login"
        );
        true
    }
}
