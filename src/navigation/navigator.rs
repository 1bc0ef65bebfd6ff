//! Navigator - applies guard decisions and tracks the mounted view.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::navigation::{GuardDecision, Location, NavigationGuard, DASHBOARD_PATH, LOGIN_PATH};
use crate::session::{LoginRedirector, RedirectState};

/// Bound on chained redirects (route aliases plus guard redirects) per attempt.
const MAX_REDIRECTS: usize = 4;

/// How a transition was applied to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Push,
    Replace,
}

/// One committed view transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    pub from: Option<Location>,
    pub to: Location,
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// What the caller asked for.
    pub requested: Location,
    /// What actually mounted.
    pub landed: Location,
    /// The guard's verdict on the requested target.
    pub decision: GuardDecision,
}

#[derive(Debug, Default)]
struct NavigatorState {
    current: Option<Location>,
    title: Option<String>,
    history: Vec<NavigationEvent>,
}

/// Single navigation context of the console.
#[derive(Clone)]
pub struct Navigator {
    guard: NavigationGuard,
    redirect: Arc<RedirectState>,
    title_suffix: Arc<str>,
    state: Arc<Mutex<NavigatorState>>,
}

impl Navigator {
    pub fn new(guard: NavigationGuard, redirect: Arc<RedirectState>, title_suffix: &str) -> Self {
        Self {
            guard,
            redirect,
            title_suffix: Arc::from(title_suffix),
            state: Arc::new(Mutex::new(NavigatorState::default())),
        }
    }

    /// Navigate to a location, adding a history entry.
    pub fn push(&self, target: impl Into<Location>) -> Navigation {
        self.transition(target.into(), NavigationKind::Push)
    }

    /// Navigate to a location, replacing the current history entry.
    pub fn replace(&self, target: impl Into<Location>) -> Navigation {
        self.transition(target.into(), NavigationKind::Replace)
    }

    /// Restore the user's destination after a successful sign-in.
    ///
    /// Consumes the pending redirect target (dashboard if none) and
    /// performs exactly one navigation to it.
    pub fn complete_login(&self) -> Navigation {
        self.redirect.rearm();
        let target = self
            .redirect
            .take()
            .unwrap_or_else(|| Location::parse(DASHBOARD_PATH));
        tracing::info!(target = %target, "Restoring navigation after sign-in");
        self.replace(target)
    }

    pub fn current(&self) -> Option<Location> {
        self.state.lock().current.clone()
    }

    /// Page title as it would appear in the window title bar.
    pub fn title(&self) -> Option<String> {
        self.state.lock().title.clone()
    }

    pub fn history(&self) -> Vec<NavigationEvent> {
        self.state.lock().history.clone()
    }

    fn transition(&self, requested: Location, kind: NavigationKind) -> Navigation {
        let mut target = self.follow_alias(requested.clone());
        let decision = self.guard.evaluate(&target);
        let mut verdict = decision.clone();

        for _ in 0..MAX_REDIRECTS {
            match verdict {
                GuardDecision::Allowed { title } => {
                    self.commit(target.clone(), title, kind);
                    return Navigation {
                        requested,
                        landed: target,
                        decision,
                    };
                }
                GuardDecision::RedirectToLogin { .. } => {
                    target = Location::parse(LOGIN_PATH);
                }
                GuardDecision::RedirectToDefault => {
                    target = self.follow_alias(Location::parse(DASHBOARD_PATH));
                }
            }
            verdict = self.guard.evaluate(&target);
        }

        tracing::warn!(
            requested = %requested,
            target = %target,
            "Redirect limit reached, mounting last target"
        );
        self.commit(target.clone(), None, kind);
        Navigation {
            requested,
            landed: target,
            decision,
        }
    }

    fn follow_alias(&self, mut target: Location) -> Location {
        for _ in 0..MAX_REDIRECTS {
            match self
                .guard
                .routes()
                .resolve(target.path())
                .and_then(|r| r.redirect.clone())
            {
                Some(alias) => target = Location::parse(&alias),
                None => break,
            }
        }
        target
    }

    fn commit(&self, to: Location, title: Option<String>, kind: NavigationKind) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let from = state.current.replace(to.clone());

        if let Some(title) = title {
            state.title = Some(format!("{} - {}", title, self.title_suffix));
        }

        tracing::debug!(
            from = %from.as_ref().map(|l| l.full_path()).unwrap_or_default(),
            to = %to,
            kind = ?kind,
            "View mounted"
        );

        let event = NavigationEvent { kind, from, to };
        if kind == NavigationKind::Replace && !state.history.is_empty() {
            let last = state.history.len() - 1;
            state.history[last] = event;
        } else {
            state.history.push(event);
        }
    }
}

impl LoginRedirector for Navigator {
    fn current_location(&self) -> Option<Location> {
        self.current()
    }

    fn redirect_to_login(&self) -> bool {
        if self
            .current()
            .map(|l| l.path() == LOGIN_PATH)
            .unwrap_or(false)
        {
            return false;
        }
        self.replace(LOGIN_PATH);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RouteTable;
    use crate::session::{Session, SessionStore};

    fn navigator() -> (Navigator, SessionStore, Arc<RedirectState>) {
        let session = SessionStore::in_memory();
        let redirect = Arc::new(RedirectState::new());
        let guard = NavigationGuard::new(
            session.clone(),
            redirect.clone(),
            Arc::new(RouteTable::admin_console()),
        );
        (
            Navigator::new(guard, redirect.clone(), "WAF Admin"),
            session,
            redirect,
        )
    }

    #[test]
    fn test_protected_push_lands_on_login() {
        let (nav, _session, redirect) = navigator();

        let result = nav.push("/rules?page=2");
        assert_eq!(result.landed, Location::parse(LOGIN_PATH));
        assert!(matches!(result.decision, GuardDecision::RedirectToLogin { .. }));
        assert_eq!(redirect.pending(), Some(Location::parse("/rules?page=2")));
        assert_eq!(nav.title().as_deref(), Some("Login - WAF Admin"));
    }

    #[test]
    fn test_complete_login_restores_pending_once() {
        let (nav, session, redirect) = navigator();
        nav.push("/rules?page=2");

        session.establish(Session::new("tok", None)).unwrap();
        let before = nav.history().len();
        let result = nav.complete_login();

        assert_eq!(result.landed.full_path(), "/rules?page=2");
        assert_eq!(nav.current(), Some(Location::parse("/rules?page=2")));
        assert!(redirect.pending().is_none());

        let history = nav.history();
        assert_eq!(history.len(), before);
        let restored: Vec<_> = history
            .iter()
            .filter(|e| e.to.full_path() == "/rules?page=2")
            .collect();
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_complete_login_defaults_to_dashboard() {
        let (nav, session, _redirect) = navigator();
        nav.push(LOGIN_PATH);

        session.establish(Session::new("tok", None)).unwrap();
        let result = nav.complete_login();
        assert_eq!(result.landed, Location::parse(DASHBOARD_PATH));
        assert_eq!(nav.title().as_deref(), Some("Dashboard - WAF Admin"));
    }

    #[test]
    fn test_login_while_signed_in_goes_to_dashboard() {
        let (nav, session, _redirect) = navigator();
        session.establish(Session::new("tok", None)).unwrap();

        let result = nav.push(LOGIN_PATH);
        assert_eq!(result.decision, GuardDecision::RedirectToDefault);
        assert_eq!(result.landed, Location::parse(DASHBOARD_PATH));
        assert!(nav.history().iter().all(|e| e.to.path() != LOGIN_PATH));
    }

    #[test]
    fn test_login_trailing_slash_while_signed_in_goes_to_dashboard() {
        let (nav, session, _redirect) = navigator();
        session.establish(Session::new("tok", None)).unwrap();

        let result = nav.push("/login/");
        assert_eq!(result.decision, GuardDecision::RedirectToDefault);
        assert_eq!(result.landed, Location::parse(DASHBOARD_PATH));
        assert_eq!(nav.title().as_deref(), Some("Dashboard - WAF Admin"));
    }

    #[test]
    fn test_root_alias_follows_to_dashboard() {
        let (nav, session, _redirect) = navigator();
        session.establish(Session::new("tok", None)).unwrap();

        let result = nav.push("/");
        assert_eq!(result.landed, Location::parse(DASHBOARD_PATH));
    }

    #[test]
    fn test_untitled_view_keeps_previous_title() {
        let (nav, _session, _redirect) = navigator();
        nav.push(LOGIN_PATH);
        nav.push("/help");

        assert_eq!(nav.current(), Some(Location::parse("/help")));
        assert_eq!(nav.title().as_deref(), Some("Login - WAF Admin"));
    }

    #[test]
    fn test_redirect_to_login_is_noop_when_already_there() {
        let (nav, _session, _redirect) = navigator();
        nav.push(LOGIN_PATH);
        let before = nav.history();

        assert!(!nav.redirect_to_login());
        assert_eq!(nav.history(), before);
    }

    #[test]
    fn test_redirect_to_login_replaces_current() {
        let (nav, session, _redirect) = navigator();
        session.establish(Session::new("tok", None)).unwrap();
        nav.push("/logs");
        session.clear();

        assert!(nav.redirect_to_login());
        assert_eq!(nav.current(), Some(Location::parse(LOGIN_PATH)));

        let last = nav.history().last().cloned().unwrap();
        assert_eq!(last.kind, NavigationKind::Replace);
        assert_eq!(last.to, Location::parse(LOGIN_PATH));
    }
}
