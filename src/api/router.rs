//! HTTP router for the HealBuddy API.
//!
//! Routes live under `/api/`. Uploaded report files are served read-only
//! under `/uploads/`, and `/health` is also answered at the root.
//!
//! Middleware stack (outermost → innermost):
//! 1. Access log → 2. CORS → 3. Auth (protected routes only)

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Room for multipart boundaries and the `reportType` field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full application router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer
/// of the protected group). Handlers use `State<ApiContext>`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let upload_root = core.files().root().to_path_buf();
    let upload_limit = core.files().max_bytes().saturating_add(MULTIPART_OVERHEAD_BYTES);
    let ctx = ApiContext::new(core);

    // NOTE: matchit requires the same param name at the same position, so
    // `:id` is the user id or the record id depending on the route.
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/patients/dashboard/:id", get(endpoints::patients::dashboard))
        .route(
            "/patients/:id",
            get(endpoints::patients::profile).put(endpoints::patients::update),
        )
        .route("/symptoms", post(endpoints::symptoms::create_from_body))
        .route(
            "/symptoms/:id",
            get(endpoints::symptoms::list)
                .post(endpoints::symptoms::create_for_user)
                .put(endpoints::symptoms::update)
                .delete(endpoints::symptoms::remove),
        )
        .route("/symptoms/:id/solutions", post(endpoints::symptoms::solutions))
        .route("/symptoms/:id/:child", get(endpoints::symptoms::detail))
        .route(
            "/reports/:id",
            get(endpoints::reports::list).delete(endpoints::reports::remove),
        )
        .route(
            "/reports/upload/:id",
            post(endpoints::reports::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/reports/:id/scan", post(endpoints::reports::trigger_scan))
        .route("/reports/:id/:child", get(endpoints::reports::detail))
        .route("/chatbot/conversation/start", post(endpoints::chatbot::start))
        .route("/chatbot/message", post(endpoints::chatbot::message))
        .route("/chatbot/:id/conversations", get(endpoints::chatbot::conversations))
        .route("/chatbot/:id/:child", get(endpoints::chatbot::history))
        .route("/ai/assess-symptoms", post(endpoints::ai::assess_symptoms))
        .route("/ai/analyze-report/:id", post(endpoints::ai::analyze_report))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so the auth middleware can reach ApiContext
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx);

    let api = protected.merge(public).layer(SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    ));

    Router::new()
        .nest("/api", api)
        .route("/health", get(endpoints::health::check))
        .nest_service("/uploads", ServeDir::new(upload_root))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::core_state::testing::test_state;
    use crate::db;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct TestApp {
        _dir: tempfile::TempDir,
        core: Arc<CoreState>,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let (dir, core) = test_state();
            let router = api_router(core.clone());
            Self { _dir: dir, core, router }
        }

        /// Same temp data dir, with the configuration adjusted.
        fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
            let (dir, base) = test_state();
            let mut config = base.config.clone();
            adjust(&mut config);
            let core = Arc::new(CoreState::new(config));
            let router = api_router(core.clone());
            Self { _dir: dir, core, router }
        }

        async fn send(&self, req: Request<Body>) -> Response {
            self.router.clone().oneshot(req).await.unwrap()
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.send(req).await;
            let status = response.status();
            let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        /// Register a patient and return (token, user id).
        async fn register(&self, name: &str, email: &str) -> (String, String) {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(json!({"name": name, "email": email, "password": "secret1"})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            (
                body["token"].as_str().unwrap().to_string(),
                body["user"]["id"].as_str().unwrap().to_string(),
            )
        }

        async fn upload(&self, token: &str, user_id: &str, file_name: &str, bytes: &[u8]) -> (StatusCode, Value) {
            let boundary = "healbuddy-test-boundary";
            let mut body = Vec::new();
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"reportType\"\r\n\r\nBlood Test\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

            let req = Request::builder()
                .method(Method::POST)
                .uri(format!("/api/reports/upload/{user_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap();
            let response = self.send(req).await;
            let status = response.status();
            let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        }
    }

    #[tokio::test]
    async fn health_is_public_at_root_and_under_api() {
        let app = TestApp::new();
        for uri in ["/health", "/api/health"] {
            let (status, body) = app.call(Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
        }
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let (status, _) = app.call(Method::GET, "/api/auth/me", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn api_responses_are_not_cached() {
        let app = TestApp::new();
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app.send(req).await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn register_login_and_duplicate_email() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;

        let (status, me) = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], user_id.as_str());
        assert_eq!(me["role"], "patient");
        assert!(me.get("passwordHash").is_none());

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "ASHA@example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user_id.as_str());
        assert_ne!(body["token"].as_str().unwrap(), token);

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "asha@example.com", "password": "wrong1"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

        let (status, _) = app
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"name": "Other", "email": "Asha@Example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unrepresentable_session_expiry_fails_cleanly_without_orphan_account() {
        let app = TestApp::with_config(|config| {
            config.session_ttl = std::time::Duration::from_secs(10_000_000_000_000);
        });
        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"name": "Asha", "email": "asha@example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL");

        let conn = app.core.open_db().unwrap();
        assert!(db::get_credentials_by_email(&conn, "asha@example.com").unwrap().is_none());
    }

    #[tokio::test]
    async fn huge_upload_limit_does_not_overflow() {
        let app = TestApp::with_config(|config| config.max_upload_bytes = usize::MAX);
        let (status, _) = app.call(Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = TestApp::new();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.send(req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_invalidates_token() {
        let app = TestApp::new();
        let (token, _) = app.register("Asha", "asha@example.com").await;

        let (status, _) = app.call(Method::POST, "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn symptom_lifecycle_and_dashboard() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/symptoms/{user_id}"),
                Some(&token),
                Some(json!({
                    "symptomName": "Headache",
                    "severity": "Mild",
                    "duration": "2 days",
                    "startDate": "2024-01-01"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["symptom"]["status"], "Active");
        let symptom_id = body["symptom"]["id"].as_str().unwrap().to_string();

        let (status, detail) = app
            .call(Method::GET, &format!("/api/symptoms/{user_id}/{symptom_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["symptomName"], "Headache");

        let (status, body) = app
            .call(
                Method::PUT,
                &format!("/api/symptoms/{symptom_id}"),
                Some(&token),
                Some(json!({"status": "Resolved"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symptom"]["status"], "Resolved");
        assert_eq!(body["symptom"]["severity"], "Mild");

        let (status, solutions) = app
            .call(Method::POST, &format!("/api/symptoms/{symptom_id}/solutions"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!solutions["immediateAid"].as_array().unwrap().is_empty());

        let (status, dashboard) = app
            .call(Method::GET, &format!("/api/patients/dashboard/{user_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["totalSymptoms"], 1);
        assert!(dashboard["activeSymptoms"].as_array().unwrap().is_empty());

        let (status, _) = app
            .call(Method::DELETE, &format!("/api/symptoms/{symptom_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = app
            .call(Method::GET, &format!("/api/symptoms/{user_id}"), Some(&token), None)
            .await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_symptom_enum_is_400() {
        let app = TestApp::new();
        let (token, _) = app.register("Asha", "asha@example.com").await;
        let (status, _) = app
            .call(
                Method::POST,
                "/api/symptoms",
                Some(&token),
                Some(json!({
                    "symptomName": "Headache",
                    "severity": "Extreme",
                    "duration": "2 days",
                    "startDate": "2024-01-01"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patient_cannot_touch_another_patients_data() {
        let app = TestApp::new();
        let (asha, _) = app.register("Asha", "asha@example.com").await;
        let (_, ravi_id) = app.register("Ravi", "ravi@example.com").await;

        let (status, _) = app
            .call(Method::GET, &format!("/api/symptoms/{ravi_id}"), Some(&asha), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(
                Method::PUT,
                &format!("/api/patients/{ravi_id}"),
                Some(&asha),
                Some(json!({"name": "Hijacked"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/symptoms",
                Some(&asha),
                Some(json!({
                    "userId": ravi_id,
                    "symptomName": "Fever",
                    "severity": "Mild",
                    "duration": "1 day",
                    "startDate": "2024-01-01"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn profile_update_returns_new_values() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;
        let (status, body) = app
            .call(
                Method::PUT,
                &format!("/api/patients/{user_id}"),
                Some(&token),
                Some(json!({"age": 34, "phone": "555-0101", "name": "  Asha Rao  "})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["user"]["age"], 34);
        assert_eq!(body["user"]["phone"], "555-0101");
        assert_eq!(body["user"]["name"], "Asha Rao");
    }

    #[tokio::test]
    async fn assessment_applies_duration_rule() {
        let app = TestApp::new();
        let (token, _) = app.register("Asha", "asha@example.com").await;
        let (status, body) = app
            .call(
                Method::POST,
                "/api/ai/assess-symptoms",
                Some(&token),
                Some(json!({"symptoms": ["Fever"], "duration": "5 days", "severity": "Mild"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let conditions = body["possibleConditions"].as_array().unwrap();
        assert!(conditions.contains(&json!("Viral infection")));
        assert_eq!(body["doctorConsultationNeeded"], true);
    }

    #[tokio::test]
    async fn upload_scan_and_poll_until_completed() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;

        let (status, body) = app.upload(&token, &user_id, "cbc.png", PNG_BYTES).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["report"]["scanStatus"], "Pending");
        let report_id = body["report"]["id"].as_str().unwrap().to_string();
        let file_url = body["report"]["fileUrl"].as_str().unwrap().to_string();
        assert!(file_url.starts_with("/uploads/reports/"));

        let req = Request::builder().uri(&file_url).body(Body::empty()).unwrap();
        let served = app.send(req).await;
        assert_eq!(served.status(), StatusCode::OK);

        let (status, body) = app
            .call(Method::POST, &format!("/api/reports/{report_id}/scan"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Report scanning initiated");
        assert_eq!(body["report"]["scanStatus"], "Processing");

        let detail_uri = format!("/api/reports/{user_id}/{report_id}");
        let mut completed = Value::Null;
        for _ in 0..40 {
            tokio::time::sleep(app.core.config.scan_delay / 2).await;
            let (_, report) = app.call(Method::GET, &detail_uri, Some(&token), None).await;
            if report["scanStatus"] == "Completed" {
                completed = report;
                break;
            }
        }
        assert_eq!(completed["confidence"], 85);
        assert_eq!(completed["findings"].as_array().unwrap().len(), 3);

        let (status, _) = app
            .call(Method::POST, &format!("/api/reports/{report_id}/scan"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn report_deleted_during_scan_stays_deleted() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;
        let (_, body) = app.upload(&token, &user_id, "scan.png", PNG_BYTES).await;
        let report_id = body["report"]["id"].as_str().unwrap().to_string();

        app.call(Method::POST, &format!("/api/reports/{report_id}/scan"), Some(&token), None)
            .await;
        let (status, _) = app
            .call(Method::DELETE, &format!("/api/reports/{report_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        tokio::time::sleep(app.core.config.scan_delay * 3).await;
        let (status, _) = app
            .call(Method::GET, &format!("/api/reports/{user_id}/{report_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, list) = app
            .call(Method::GET, &format!("/api/reports/{user_id}"), Some(&token), None)
            .await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_with_mismatched_content_is_rejected() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;
        let (status, _) = app.upload(&token, &user_id, "notes.pdf", b"plain text, not a pdf").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_flow_keeps_order() {
        let app = TestApp::new();
        let (token, user_id) = app.register("Asha", "asha@example.com").await;

        let (status, start) = app
            .call(Method::POST, "/api/chatbot/conversation/start", Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(start["initialMessage"]["sender"], "bot");
        let conversation_id = start["conversationId"].as_str().unwrap().to_string();

        let (status, turn) = app
            .call(
                Method::POST,
                "/api/chatbot/message",
                Some(&token),
                Some(json!({"conversationId": conversation_id, "message": "I have a fever"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{turn}");
        assert!(turn["botMessage"]["message"].as_str().unwrap().starts_with("High fever"));

        let (status, history) = app
            .call(
                Method::GET,
                &format!("/api/chatbot/{user_id}/{conversation_id}"),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let senders: Vec<&str> = history
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["sender"].as_str().unwrap())
            .collect();
        assert_eq!(senders, ["bot", "user", "bot"]);

        let (status, list) = app
            .call(Method::GET, &format!("/api/chatbot/{user_id}/conversations"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn message_to_unknown_conversation_is_404() {
        let app = TestApp::new();
        let (token, _) = app.register("Asha", "asha@example.com").await;
        let (status, _) = app
            .call(
                Method::POST,
                "/api/chatbot/message",
                Some(&token),
                Some(json!({"conversationId": "conv-missing", "message": "hello"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
