//! Request gateway - the single point of egress for backend calls.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::gateway::{
    classify, Notice, Notifier, OutboundRequest, Outcome, RawResponse, SessionRecovery, Transport,
    TransportFailure,
};
use crate::session::SessionStore;

/// Header carrying the per-dispatch correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// What a resource wrapper asks the gateway to send.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the configured backend root.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Reply is a file/stream; skip envelope handling entirely.
    pub binary: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            binary: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[allow(dead_code)]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. Repeated keys are kept.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> ConsoleResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }
}

/// Successful result of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// `data` of a success envelope.
    Payload(Value),
    /// Raw reply of a binary dispatch.
    Binary(RawResponse),
}

/// Attaches credentials, sends, classifies, and recovers from session loss.
pub struct RequestGateway {
    api_root: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    session: SessionStore,
    recovery: SessionRecovery,
    notifier: Arc<dyn Notifier>,
}

impl RequestGateway {
    pub fn new(
        config: &BackendConfig,
        transport: Arc<dyn Transport>,
        session: SessionStore,
        recovery: SessionRecovery,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api_root: config.api_root(),
            timeout: config.timeout(),
            transport,
            session,
            recovery,
            notifier,
        }
    }

    /// Send a request and resolve it to exactly one terminal outcome.
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> ConsoleResult<Dispatched> {
        let url = self.resolve_url(&descriptor.path)?;
        let request_id = Uuid::new_v4();
        let token = self.session.token();

        let mut headers = vec![(REQUEST_ID_HEADER.to_string(), request_id.to_string())];
        if let Some(token) = &token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        tracing::debug!(
            request_id = %request_id,
            method = %descriptor.method,
            path = %descriptor.path,
            authenticated = token.is_some(),
            binary = descriptor.binary,
            "Dispatching request"
        );

        let request = OutboundRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            query: descriptor.query.clone(),
            body: descriptor.body.clone(),
        };

        let reply = match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(reply) => reply,
            Err(_) => Err(TransportFailure::Timeout),
        };

        let outcome = classify(reply, descriptor.binary);
        self.settle(outcome, token.as_deref(), request_id, &descriptor)
    }

    /// Dispatch and deserialize the success payload.
    pub async fn fetch<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> ConsoleResult<T> {
        match self.dispatch(descriptor).await? {
            Dispatched::Payload(data) => Ok(serde_json::from_value(data)?),
            Dispatched::Binary(_) => Err(ConsoleError::InvalidRequest(
                "binary descriptor passed to fetch".to_string(),
            )),
        }
    }

    /// Dispatch as binary and return the reply untouched.
    pub async fn download(&self, descriptor: RequestDescriptor) -> ConsoleResult<RawResponse> {
        match self.dispatch(descriptor.binary()).await? {
            Dispatched::Binary(raw) => Ok(raw),
            Dispatched::Payload(_) => Err(ConsoleError::InvalidRequest(
                "binary dispatch produced an envelope payload".to_string(),
            )),
        }
    }

    fn settle(
        &self,
        outcome: Outcome,
        sent_token: Option<&str>,
        request_id: Uuid,
        descriptor: &RequestDescriptor,
    ) -> ConsoleResult<Dispatched> {
        let session_loss = outcome.is_session_loss();

        match outcome {
            Outcome::Success(data) => Ok(Dispatched::Payload(data)),
            Outcome::Binary(raw) => {
                tracing::debug!(
                    request_id = %request_id,
                    status = raw.status,
                    bytes = raw.body.len(),
                    "Binary reply passed through"
                );
                Ok(Dispatched::Binary(raw))
            }
            Outcome::BusinessError { code, message } => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %descriptor.method,
                    path = %descriptor.path,
                    code,
                    message = %message,
                    "Backend rejected request"
                );
                let shown = if message.is_empty() {
                    "Request failed".to_string()
                } else {
                    message.clone()
                };
                self.notifier.notify(Notice::warning(shown));
                if session_loss {
                    self.recovery.on_session_loss(sent_token);
                }
                Err(ConsoleError::Business { code, message })
            }
            Outcome::TransportError(error) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %descriptor.method,
                    path = %descriptor.path,
                    kind = %error.kind,
                    status = ?error.status,
                    detail = %error.detail,
                    "Request failed"
                );
                self.notifier.notify(Notice::error(error.kind.user_message()));
                if session_loss {
                    self.recovery.on_session_loss(sent_token);
                }
                Err(error.into())
            }
        }
    }

    fn resolve_url(&self, path: &str) -> ConsoleResult<String> {
        if path.contains("://") || path.starts_with("//") {
            return Err(ConsoleError::InvalidRequest(format!(
                "path must be relative to the backend root: {}",
                path
            )));
        }

        if path.is_empty() || path.starts_with('/') {
            Ok(format!("{}{}", self.api_root, path))
        } else {
            Ok(format!("{}/{}", self.api_root, path))
        }
    }
}
