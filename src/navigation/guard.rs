//! Navigation guard - evaluated before every view transition.
//!
//! Routes are opt-in to protection: a route without metadata, or a path
//! with no route at all, never requires a session.

use std::sync::Arc;

use crate::navigation::{Location, RouteTable, LOGIN_PATH};
use crate::session::{RedirectState, SessionStore};

/// Outcome of evaluating one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The view may mount; its title (if declared) should be applied.
    Allowed { title: Option<String> },
    /// No session for a protected view; `pending` was recorded for
    /// restoration after login.
    RedirectToLogin { pending: Location },
    /// Already signed in; login is skipped in favour of the dashboard.
    RedirectToDefault,
}

/// Decides whether a navigation target may mount.
#[derive(Clone)]
pub struct NavigationGuard {
    session: SessionStore,
    redirect: Arc<RedirectState>,
    routes: Arc<RouteTable>,
}

impl NavigationGuard {
    pub fn new(session: SessionStore, redirect: Arc<RedirectState>, routes: Arc<RouteTable>) -> Self {
        Self {
            session,
            redirect,
            routes,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Evaluate a navigation attempt.
    ///
    /// Rejection records the target as the pending redirect and clears
    /// whatever is left of the session.
    pub fn evaluate(&self, target: &Location) -> GuardDecision {
        let authenticated = self.session.is_authenticated();

        if target.path() == LOGIN_PATH && authenticated {
            tracing::debug!("Signed-in user sent away from login view");
            return GuardDecision::RedirectToDefault;
        }

        let route = self.routes.resolve(target.path());
        let requires_auth = route.map(|r| r.requires_auth()).unwrap_or(false);

        if requires_auth && !authenticated {
            tracing::info!(target = %target, "Protected view requires sign-in");
            self.redirect.record(target.clone());
            self.session.clear();
            return GuardDecision::RedirectToLogin {
                pending: target.clone(),
            };
        }

        tracing::debug!(
            target = %target,
            route = route.map(|r| r.name.as_str()).unwrap_or("-"),
            "View allowed"
        );
        GuardDecision::Allowed {
            title: route.and_then(|r| r.title()).map(String::from),
        }
    }
}
