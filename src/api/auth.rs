//! Authentication endpoints.

use crate::api::{LoginRequest, LoginResponse};
use crate::error::ConsoleResult;
use crate::gateway::{RequestDescriptor, RequestGateway};
use crate::session::UserProfile;

/// POST /auth/login
pub async fn login(gateway: &RequestGateway, request: &LoginRequest) -> ConsoleResult<LoginResponse> {
    gateway
        .fetch(RequestDescriptor::post("/auth/login").json(request)?)
        .await
}

/// GET /auth/userinfo
pub async fn user_info(gateway: &RequestGateway) -> ConsoleResult<UserProfile> {
    gateway.fetch(RequestDescriptor::get("/auth/userinfo")).await
}

/// POST /auth/logout
pub async fn logout(gateway: &RequestGateway) -> ConsoleResult<()> {
    gateway.fetch(RequestDescriptor::post("/auth/logout")).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{envelope, Harness, ScriptedTransport};
    use crate::session::Session;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_parses_backend_user() {
        let h = Harness::new(ScriptedTransport::always(Ok(envelope(
            200,
            "login ok",
            json!({
                "token": "jwt-token",
                "user": {
                    "id": 1,
                    "username": "admin",
                    "email": "admin@example.com",
                    "role": "admin",
                    "tenant_id": 0,
                    "status": "active",
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                }
            }),
        ))));

        let request = LoginRequest {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        };
        let response = login(&h.gateway, &request).await.unwrap();
        assert_eq!(response.token, "jwt-token");
        assert_eq!(response.user.username, "admin");
        assert_eq!(response.user.tenant_id, 0);

        let sent = &h.transport.requests()[0];
        assert_eq!(sent.url, "http://127.0.0.1:8080/api/v1/auth/login");
        assert_eq!(
            sent.body,
            Some(json!({"username": "admin", "password": "admin123"}))
        );
    }

    #[tokio::test]
    async fn test_user_info_sends_credential() {
        let h = Harness::new(ScriptedTransport::always(Ok(envelope(
            200,
            "ok",
            json!({"id": 5, "username": "ops", "role": "viewer", "tenant_id": 3}),
        ))));
        h.session.establish(Session::new("tok", None)).unwrap();

        let profile = user_info(&h.gateway).await.unwrap();
        assert_eq!(profile.role, "viewer");
        assert_eq!(profile.tenant_id, 3);
        assert_eq!(
            h.transport.requests()[0].header("Authorization"),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn test_logout_accepts_null_payload() {
        let h = Harness::new(ScriptedTransport::always(Ok(envelope(
            200,
            "bye",
            serde_json::Value::Null,
        ))));
        assert!(logout(&h.gateway).await.is_ok());
    }
}
