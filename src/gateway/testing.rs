//! Test doubles for the gateway seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::gateway::{
    Notice, Notifier, OutboundRequest, RawResponse, RequestGateway, SessionRecovery, Transport,
    TransportFailure,
};
use crate::navigation::{Location, NavigationGuard, Navigator, RouteTable};
use crate::session::{LoginRedirector, RedirectState, SessionStore};

pub type Reply = Result<RawResponse, TransportFailure>;

/// Envelope reply with a matching transport status.
pub fn envelope(code: i64, message: &str, data: Value) -> RawResponse {
    let status = if code == 200 { 200 } else { code as u16 };
    RawResponse::new(
        status,
        json!({"code": code, "message": message, "data": data}).to_string(),
    )
    .with_content_type("application/json")
}

/// Transport that replays scripted replies and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<Reply>>,
    requests: Mutex<Vec<OutboundRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever the script is exhausted.
    pub fn always(reply: Reply) -> Self {
        let transport = Self::default();
        *transport.fallback.lock() = Some(reply);
        transport
    }

    /// Queue a reply for the next unanswered request.
    pub fn then(self, reply: Reply) -> Self {
        self.script.lock().push_back(reply);
        self
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportFailure> {
        self.requests.lock().push(request);

        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        let next = self.script.lock().pop_front();
        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .lock()
                .clone()
                .unwrap_or_else(|| Err(TransportFailure::Network("script exhausted".to_string()))),
        }
    }
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Wraps a navigator and counts redirects that actually happened.
pub struct CountingRedirector {
    inner: Navigator,
    redirects: AtomicUsize,
}

impl CountingRedirector {
    pub fn new(inner: Navigator) -> Self {
        Self {
            inner,
            redirects: AtomicUsize::new(0),
        }
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl LoginRedirector for CountingRedirector {
    fn current_location(&self) -> Option<Location> {
        self.inner.current_location()
    }

    fn redirect_to_login(&self) -> bool {
        let redirected = self.inner.redirect_to_login();
        if redirected {
            self.redirects.fetch_add(1, Ordering::SeqCst);
        }
        redirected
    }
}

/// A gateway wired to scripted doubles.
pub struct Harness {
    pub gateway: RequestGateway,
    pub session: SessionStore,
    pub redirect: Arc<RedirectState>,
    pub navigator: Navigator,
    pub redirector: Arc<CountingRedirector>,
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self::with_config(transport, BackendConfig::default())
    }

    pub fn with_config(transport: ScriptedTransport, config: BackendConfig) -> Self {
        let session = SessionStore::in_memory();
        let redirect = Arc::new(RedirectState::new());
        let guard = NavigationGuard::new(
            session.clone(),
            redirect.clone(),
            Arc::new(RouteTable::admin_console()),
        );
        let navigator = Navigator::new(guard, redirect.clone(), "WAF Admin");
        let redirector = Arc::new(CountingRedirector::new(navigator.clone()));
        let recovery = SessionRecovery::new(session.clone(), redirect.clone(), redirector.clone());
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());

        let gateway = RequestGateway::new(
            &config,
            transport.clone(),
            session.clone(),
            recovery,
            notifier.clone(),
        );

        Self {
            gateway,
            session,
            redirect,
            navigator,
            redirector,
            transport,
            notifier,
        }
    }
}
