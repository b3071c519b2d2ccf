//! Live client for a Supabase project
//!
//! Auth goes to the GoTrue endpoints under `/auth/v1`, table reads to
//! PostgREST under `/rest/v1`. The current session is kept in memory and
//! mirrored to secure storage so it survives restarts.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::sync::Arc;

use leadline_storage::SecureStore;

use crate::client::{Backend, IdentityApi, QueryApi};
use crate::config::AnonKey;
use crate::error::BackendError;
use crate::events::{AuthEvents, AuthSubscription};
use crate::types::{AuthEvent, QueryRequest, Session};
use crate::Result;

/// Sessions this close to expiry are refreshed before being handed out
const EXPIRY_MARGIN_SECS: i64 = 10;

pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: AnonKey,
    store: Arc<dyn SecureStore>,
    storage_key: String,
    current: RwLock<Option<Session>>,
    events: AuthEvents,
}

impl SupabaseClient {
    pub fn new(url: &str, anon_key: AnonKey, store: Arc<dyn SecureStore>) -> Self {
        Self::with_http(Client::new(), url, anon_key, store)
    }

    pub fn with_http(
        http: Client,
        url: &str,
        anon_key: AnonKey,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key,
            store,
            storage_key: storage_key_for(url),
            current: RwLock::new(None),
            events: AuthEvents::default(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Attach the project key and a bearer token (the anon key when signed out)
    fn authorized(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or_else(|| self.anon_key.expose());
        request
            .header("apikey", self.anon_key.expose())
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn load_persisted(&self) -> Option<Session> {
        let raw = match self.store.get_item(&self.storage_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                let _ = self.store.remove_item(&self.storage_key);
                None
            }
        }
    }

    fn held_session(&self) -> Option<Session> {
        let held = self.current.read().clone();
        held.or_else(|| self.load_persisted())
    }

    /// Make `session` current, persist it and notify subscribers
    fn adopt(&self, session: Session, event: fn(Session) -> AuthEvent) {
        *self.current.write() = Some(session.clone());

        match serde_json::to_string(&session) {
            Ok(raw) => {
                if let Err(e) = self.store.set_item(&self.storage_key, &raw) {
                    tracing::warn!(error = %e, "Could not persist session");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not encode session"),
        }

        self.events.publish(event(session));
    }

    fn discard(&self) {
        *self.current.write() = None;
        if let Err(e) = self.store.remove_item(&self.storage_key) {
            tracing::warn!(error = %e, "Could not remove persisted session");
        }
        self.events.publish(AuthEvent::signed_out());
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let request = self
            .http
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        let body = self.send(self.authorized(request, None)).await?;
        let session: Session = serde_json::from_value(body)?;
        Ok(session.stamped())
    }
}

#[async_trait]
impl IdentityApi for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.held_session() else {
            return Ok(None);
        };

        if !session.expires_within(EXPIRY_MARGIN_SECS) {
            *self.current.write() = Some(session.clone());
            return Ok(Some(session));
        }

        tracing::debug!(user_id = %session.user.id, "Refreshing expiring session");
        match self.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                self.adopt(refreshed.clone(), AuthEvent::token_refreshed);
                Ok(Some(refreshed))
            }
            Err(BackendError::Api { status, message }) => {
                tracing::info!(status, message = %message, "Refresh rejected, dropping session");
                self.discard();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let request = self
            .http
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let body = self.send(self.authorized(request, None)).await?;

        let session: Session = serde_json::from_value::<Session>(body)?.stamped();
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.adopt(session.clone(), AuthEvent::signed_in);

        Ok(Some(session))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let request = self
            .http
            .post(self.endpoint("auth/v1/signup"))
            .json(&json!({ "email": email, "password": password }));
        let body = self.send(self.authorized(request, None)).await?;

        // Without auto-confirm the response is the pending user, not a session
        if body.get("access_token").is_none() {
            tracing::info!("Sign-up pending email confirmation");
            return Ok(None);
        }

        let session: Session = serde_json::from_value::<Session>(body)?.stamped();
        tracing::info!(user_id = %session.user.id, "Signed up");
        self.adopt(session.clone(), AuthEvent::signed_in);

        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        let result = match self.held_session() {
            Some(session) => {
                let request = self.http.post(self.endpoint("auth/v1/logout"));
                self.send(self.authorized(request, Some(&session.access_token)))
                    .await
                    .map(|_| ())
            }
            None => Ok(()),
        };

        // Local state goes regardless of what the server said
        self.discard();

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Server sign-out failed; local session cleared");
        }
        result
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }
}

#[async_trait]
impl QueryApi for SupabaseClient {
    async fn select(&self, request: &QueryRequest) -> Result<Vec<Value>> {
        let access_token = self.current.read().as_ref().map(|s| s.access_token.clone());

        let http_request = self
            .http
            .get(self.endpoint(&format!("rest/v1/{}", request.table)))
            .query(&request.query_pairs());
        let body = self
            .send(self.authorized(http_request, access_token.as_deref()))
            .await?;

        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

impl Backend for SupabaseClient {
    fn is_configured(&self) -> bool {
        true
    }
}

/// `sb-<project ref>-auth-token`, the project ref being the first host label
fn storage_key_for(url: &str) -> String {
    let project = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.split('.').next().unwrap_or(h).to_string()))
        .unwrap_or_else(|| "local".to_string());
    format!("sb-{}-auth-token", project)
}

fn api_error(status: u16, body: &str) -> BackendError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|field| value.get(*field).and_then(Value::as_str).map(str::to_string))
        })
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("request failed with status {}", status));

    BackendError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthEventKind;
    use chrono::Utc;
    use leadline_storage::MemorySecureStore;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_json(access: &str, expires_at: i64) -> Value {
        json!({
            "access_token": access,
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": expires_at,
            "refresh_token": format!("{}-refresh", access),
            "user": {"id": "user-1", "email": "sales@example.com"}
        })
    }

    fn client(server: &MockServer, store: &MemorySecureStore) -> SupabaseClient {
        SupabaseClient::new(
            &server.uri(),
            AnonKey::new("anon"),
            Arc::new(store.clone()),
        )
    }

    /// URL of a local port nothing listens on
    fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}", port)
    }

    #[test]
    fn test_storage_key_uses_project_ref() {
        assert_eq!(
            storage_key_for("https://abcd1234.supabase.co"),
            "sb-abcd1234-auth-token"
        );
        assert_eq!(storage_key_for("::"), "sb-local-auth-token");
    }

    #[test]
    fn test_api_error_message_fields() {
        match api_error(400, r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#) {
            BackendError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(api_error(502, "").user_message(), "request failed with status 502");
        assert_eq!(api_error(500, "upstream down").user_message(), "upstream down");
    }

    #[tokio::test]
    async fn test_sign_in_persists_and_notifies() {
        let server = MockServer::start().await;
        let expires_at = Utc::now().timestamp() + 3600;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_json(json!({"email": "sales@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("a1", expires_at)))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let client = client(&server, &store);
        let mut events = client.on_auth_state_change();

        let session = client
            .sign_in_with_password("sales@example.com", "pw")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.access_token, "a1");

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(event.session.as_ref(), Some(&session));

        assert!(store.get_item(client.storage_key()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let err = client(&server, &store)
            .sign_in_with_password("sales@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_restores_persisted_session() {
        let server = MockServer::start().await;
        let store = MemorySecureStore::new();
        let first = client(&server, &store);
        let persisted = session_json("a1", Utc::now().timestamp() + 3600);
        store
            .set_item(first.storage_key(), &persisted.to_string())
            .unwrap();

        let restored = client(&server, &store).get_session().await.unwrap().unwrap();
        assert_eq!(restored.access_token, "a1");
        assert_eq!(restored.user.email.as_deref(), Some("sales@example.com"));
    }

    #[tokio::test]
    async fn test_expiring_session_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({"refresh_token": "a1-refresh"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(session_json("a2", Utc::now().timestamp() + 3600)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let client = client(&server, &store);
        let stale = session_json("a1", Utc::now().timestamp() - 60);
        store.set_item(client.storage_key(), &stale.to_string()).unwrap();
        let mut events = client.on_auth_state_change();

        let session = client.get_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "a2");
        assert_eq!(events.recv().await.unwrap().kind, AuthEventKind::TokenRefreshed);
    }

    #[tokio::test]
    async fn test_rejected_refresh_drops_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error_description": "Refresh Token Not Found"})),
            )
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let client = client(&server, &store);
        let stale = session_json("a1", Utc::now().timestamp() - 60);
        store.set_item(client.storage_key(), &stale.to_string()).unwrap();

        assert!(client.get_session().await.unwrap().is_none());
        assert!(store.get_item(client.storage_key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let client = client(&server, &store);
        let persisted = session_json("a1", Utc::now().timestamp() + 3600);
        store
            .set_item(client.storage_key(), &persisted.to_string())
            .unwrap();
        let mut events = client.on_auth_state_change();

        let err = client.sign_out().await.unwrap_err();
        assert_eq!(err.user_message(), "upstream down");

        assert_eq!(events.recv().await.unwrap().kind, AuthEventKind::SignedOut);
        assert!(store.get_item(client.storage_key()).unwrap().is_none());
        assert!(client.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "new@example.com",
                "confirmation_sent_at": "2024-05-01T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let session = client(&server, &store)
            .sign_up("new@example.com", "pw")
            .await
            .unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn test_select_builds_rest_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/leads"))
            .and(query_param("select", "id,full_name"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "l1", "full_name": "Nguyen Van A"},
                {"id": "l2", "full_name": "Tran Thi B"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemorySecureStore::new();
        let rows = client(&server, &store)
            .select(
                &QueryRequest::table("leads")
                    .select("id, full_name")
                    .order("created_at", false)
                    .limit(30),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["full_name"], "Nguyen Van A");
    }

    #[tokio::test]
    async fn test_refresh_network_failure_keeps_stored_session() {
        let store = MemorySecureStore::new();
        let client = SupabaseClient::new(
            &unreachable_url(),
            AnonKey::new("anon"),
            Arc::new(store.clone()),
        );
        let stale = session_json("a1", Utc::now().timestamp() - 60);
        store.set_item(client.storage_key(), &stale.to_string()).unwrap();

        let err = client.get_session().await.unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
        assert!(err.user_message().starts_with("Network error"));

        // Only a rejected refresh drops the session
        assert!(store.get_item(client.storage_key()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_network_failure() {
        let store = MemorySecureStore::new();
        let client = SupabaseClient::new(
            &unreachable_url(),
            AnonKey::new("anon"),
            Arc::new(store.clone()),
        );

        let err = client
            .sign_in_with_password("sales@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
        assert!(store.get_item(client.storage_key()).unwrap().is_none());
    }
}
