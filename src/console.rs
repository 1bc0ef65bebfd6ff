//! Console facade - wires session storage, gateway and navigation.

use std::sync::Arc;

use crate::api::{self, LoginRequest};
use crate::config::Config;
use crate::error::ConsoleResult;
use crate::gateway::{
    Notifier, RawResponse, ReqwestTransport, RequestGateway, SessionRecovery, TracingNotifier,
    Transport,
};
use crate::navigation::{Navigation, NavigationGuard, Navigator, RouteTable, LOGIN_PATH};
use crate::session::{
    FileSessionPersistence, RedirectState, Session, SessionPersistence, SessionStore, UserProfile,
};

/// The running admin console.
pub struct Console {
    gateway: Arc<RequestGateway>,
    navigator: Navigator,
    session: SessionStore,
}

impl Console {
    /// Build a console talking to the configured backend over HTTP.
    pub fn bootstrap(config: &Config) -> ConsoleResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.backend.timeout())?);
        let persistence = Arc::new(FileSessionPersistence::new(&config.session.path));
        Ok(Self::assemble(
            config,
            transport,
            persistence,
            Arc::new(TracingNotifier),
        ))
    }

    /// Build a console from explicit parts.
    pub fn assemble(
        config: &Config,
        transport: Arc<dyn Transport>,
        persistence: Arc<dyn SessionPersistence>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let session = SessionStore::restore(persistence.clone());
        let redirect = Arc::new(RedirectState::restore(persistence));
        let guard = NavigationGuard::new(
            session.clone(),
            redirect.clone(),
            Arc::new(RouteTable::admin_console()),
        );
        let navigator = Navigator::new(guard, redirect.clone(), &config.console.title_suffix);
        let recovery = SessionRecovery::new(session.clone(), redirect, Arc::new(navigator.clone()));
        let gateway = Arc::new(RequestGateway::new(
            &config.backend,
            transport,
            session.clone(),
            recovery,
            notifier,
        ));

        Self {
            gateway,
            navigator,
            session,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Sign in and restore the destination the user was headed to.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<Navigation> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = api::auth::login(&self.gateway, &request).await?;

        tracing::info!(
            user = %response.user.username,
            role = %response.user.role,
            tenant_id = response.user.tenant_id,
            "Signed in"
        );

        self.session
            .establish(Session::new(response.token, Some(response.user)))?;
        Ok(self.navigator.complete_login())
    }

    /// Sign out: best-effort backend logout, then drop the session and
    /// show the login view.
    pub async fn logout(&self) -> Navigation {
        if self.session.is_authenticated() {
            if let Err(e) = api::auth::logout(&self.gateway).await {
                tracing::warn!(error = %e, "Backend logout failed, clearing local session anyway");
            }
        }

        let user = self.session.profile().map(|p| p.username);
        self.session.clear();
        tracing::info!(user = user.as_deref().unwrap_or("-"), "Signed out");
        self.navigator.replace(LOGIN_PATH)
    }

    /// Fetch the current user and refresh the cached profile.
    pub async fn refresh_profile(&self) -> ConsoleResult<UserProfile> {
        let profile = api::auth::user_info(&self.gateway).await?;
        self.session.update_profile(profile.clone())?;
        Ok(profile)
    }

    /// Navigate to a view through the guard.
    pub fn open(&self, target: &str) -> Navigation {
        self.navigator.push(target)
    }

    pub async fn export_attack_logs(&self, ids: &[u64]) -> ConsoleResult<RawResponse> {
        api::logs::export_attack_logs(&self.gateway, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;
    use crate::gateway::testing::{envelope, RecordingNotifier, ScriptedTransport};
    use crate::navigation::{GuardDecision, Location, DASHBOARD_PATH};
    use crate::session::MemorySessionPersistence;
    use serde_json::{json, Value};

    fn login_reply(token: &str) -> RawResponse {
        envelope(
            200,
            "login ok",
            json!({
                "token": token,
                "user": {"id": 1, "username": "admin", "role": "admin", "tenant_id": 0}
            }),
        )
    }

    fn build_console(transport: ScriptedTransport) -> (Console, Arc<ScriptedTransport>) {
        crate::logging::init_test();
        let transport = Arc::new(transport);
        let console = Console::assemble(
            &Config::default(),
            transport.clone(),
            Arc::new(MemorySessionPersistence::new()),
            Arc::new(RecordingNotifier::default()),
        );
        (console, transport)
    }

    #[tokio::test]
    async fn test_login_restores_pending_target() {
        let (console, _transport) = build_console(ScriptedTransport::new().then(Ok(login_reply("t1"))));

        let attempt = console.open("/rules?page=2");
        assert!(matches!(attempt.decision, GuardDecision::RedirectToLogin { .. }));

        let landed = console.login("admin", "admin123").await.unwrap();
        assert_eq!(landed.landed.full_path(), "/rules?page=2");
        assert_eq!(console.session().token().as_deref(), Some("t1"));
        assert_eq!(console.session().profile().unwrap().username, "admin");
        assert_eq!(
            console.navigator().title().as_deref(),
            Some("Rules - WAF Admin")
        );

        // The pending target was consumed.
        console.open(LOGIN_PATH);
        let again = console.navigator().complete_login();
        assert_eq!(again.landed, Location::parse(DASHBOARD_PATH));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_login_view() {
        let (console, _transport) = build_console(ScriptedTransport::new().then(Ok(envelope(
            401,
            "invalid username or password",
            Value::Null,
        ))));

        console.open("/policies");
        let err = console.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, ConsoleError::Business { code: 401, .. }));

        assert!(!console.session().is_authenticated());
        assert_eq!(
            console.navigator().current(),
            Some(Location::parse(LOGIN_PATH))
        );
    }

    #[tokio::test]
    async fn test_session_loss_then_relogin() {
        let (console, transport) = build_console(
            ScriptedTransport::new()
                .then(Ok(login_reply("t1")))
                .then(Ok(envelope(401, "token expired", Value::Null)))
                .then(Ok(login_reply("t2"))),
        );

        console.open(LOGIN_PATH);
        console.login("admin", "admin123").await.unwrap();
        console.open("/logs?action=block");

        let err = console.refresh_profile().await.unwrap_err();
        assert!(err.is_session_loss());
        assert!(!console.session().is_authenticated());
        assert_eq!(
            console.navigator().current(),
            Some(Location::parse(LOGIN_PATH))
        );

        let landed = console.login("admin", "admin123").await.unwrap();
        assert_eq!(landed.landed.full_path(), "/logs?action=block");

        let requests = transport.requests();
        assert!(requests[0].header("Authorization").is_none());
        assert_eq!(requests[1].header("Authorization"), Some("Bearer t1"));
        assert!(requests[2].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let (console, _transport) = build_console(
            ScriptedTransport::new()
                .then(Ok(login_reply("t1")))
                .then(Ok(RawResponse::new(404, "404 page not found"))),
        );

        console.login("admin", "admin123").await.unwrap();
        let landed = console.logout().await;

        assert_eq!(landed.landed, Location::parse(LOGIN_PATH));
        assert!(!console.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_pending_target_carries_over_to_next_run() {
        let persistence: Arc<dyn SessionPersistence> = Arc::new(MemorySessionPersistence::new());

        let first = Console::assemble(
            &Config::default(),
            Arc::new(ScriptedTransport::new()),
            persistence.clone(),
            Arc::new(RecordingNotifier::default()),
        );
        let attempt = first.open("/rules?page=2");
        assert_eq!(attempt.landed, Location::parse(LOGIN_PATH));

        let transport = Arc::new(ScriptedTransport::new().then(Ok(login_reply("t1"))));
        let second = Console::assemble(
            &Config::default(),
            transport,
            persistence.clone(),
            Arc::new(RecordingNotifier::default()),
        );
        let landed = second.login("admin", "admin123").await.unwrap();
        assert_eq!(landed.landed.full_path(), "/rules?page=2");

        // Consumed: a third run starts without a pending target.
        assert!(persistence.load_pending().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restored_session_skips_login() {
        let persistence = Arc::new(MemorySessionPersistence::new());
        persistence
            .save(&Session::new("persisted", None))
            .unwrap();

        let console = Console::assemble(
            &Config::default(),
            Arc::new(ScriptedTransport::new()),
            persistence,
            Arc::new(RecordingNotifier::default()),
        );

        let result = console.open(LOGIN_PATH);
        assert_eq!(result.decision, GuardDecision::RedirectToDefault);
        assert_eq!(result.landed, Location::parse(DASHBOARD_PATH));
    }
}
