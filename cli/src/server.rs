use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bapsang_core::DietError;
use bapsang_core::models::{Profile, ProfileInput};
use bapsang_core::service::DietService;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;

use crate::kakao::{SkillRequest, SkillResponse};
use crate::replies;

const BODY_LIMIT: usize = 64 * 1024; // 64 KB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<DietService>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> std::sync::MutexGuard<'_, DietService> {
        self.service
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<DietError> for ApiError {
    fn from(err: DietError) -> Self {
        match err {
            DietError::Storage(inner) => Self::Internal(inner),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

/// Render a service outcome as a chatbot reply. Validation failures and a missing profile are
/// ordinary replies; only storage failures become an HTTP error.
fn skill_reply<T>(
    result: Result<T, DietError>,
    render: impl FnOnce(&T) -> SkillResponse,
) -> Result<Json<SkillResponse>, ApiError> {
    match result {
        Ok(value) => Ok(Json(render(&value))),
        Err(DietError::ProfileMissing) => Ok(Json(replies::missing_profile())),
        Err(DietError::Storage(err)) => Err(ApiError::Internal(err)),
        Err(other) => Ok(Json(replies::invalid_input(
            &other.user_messages().unwrap_or_default(),
        ))),
    }
}

fn user_key(req: &SkillRequest) -> Result<&str, ApiError> {
    let key = req.user_key().trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("Missing user id".to_string()));
    }
    Ok(key)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Skill handlers ---

async fn set_profile(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let input = ProfileInput {
        birth_date: req.param("birth_date"),
        gender: req.param("gender"),
        height: req.param("height"),
        weight: req.param("weight"),
        goal_weight: req.param("goal_weight"),
    };
    let result = state.service().set_profile(user, &input, today());
    skill_reply(result, replies::profile_saved)
}

async fn profile_info(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let result = state.service().profile_report(user, today());
    skill_reply(result, replies::profile_info)
}

async fn update_weight(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let result = state
        .service()
        .update_weight(user, &req.param("weight"), today());
    skill_reply(result, replies::weight_changed)
}

async fn weight_history(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let result = state.service().weight_history(user);
    skill_reply(result, |records| replies::weight_history(records))
}

async fn update_goal(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let result = state
        .service()
        .update_goal_weight(user, &req.param("goal_weight"), today());
    skill_reply(result, replies::goal_updated)
}

async fn goal_history(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let result = state.service().goal_history(user);
    skill_reply(result, |records| replies::goal_history(records))
}

async fn today_menu(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillResponse>, ApiError> {
    let user = user_key(&req)?;
    let result = {
        let mut rng = rand::rng();
        state.service().today_menu(user, &mut rng)
    };
    skill_reply(result, replies::today_menu)
}

// --- Admin handlers ---

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Profile>>, ApiError> {
    let profiles = state.service().list_profiles()?;
    Ok(Json(profiles))
}

fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/user", post(set_profile))
        .route("/info", post(profile_info))
        .route("/weight", post(update_weight))
        .route("/weight_history", post(weight_history))
        .route("/goal", post(update_goal))
        .route("/goal_history", post(goal_history))
        .route("/menu", post(today_menu))
        .merge(admin)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of `key`, or a placeholder when it is too short to mask.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    service: DietService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "Admin API key: {} (see api_key file in data directory)",
            mask_key(key)
        );
    } else {
        tracing::warn!("Authentication disabled (--no-auth); /api/users is open to anyone");
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    tracing::info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use bapsang_core::catalog::MenuCatalog;
    use bapsang_core::energy::EnergySettings;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>) -> AppState {
        let catalog = Arc::new(MenuCatalog::builtin().unwrap());
        let service = DietService::new_in_memory(EnergySettings::default(), catalog).unwrap();
        AppState {
            service: Arc::new(Mutex::new(service)),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    fn skill_body(user: &str, params: &Value) -> Body {
        let mut detail = serde_json::Map::new();
        if let Some(obj) = params.as_object() {
            for (name, value) in obj {
                detail.insert(name.clone(), json!({ "origin": value, "value": value }));
            }
        }
        Body::from(
            json!({
                "userRequest": {"user": {"id": user}, "utterance": "test"},
                "action": {"detailParams": detail},
            })
            .to_string(),
        )
    }

    async fn call(app: &Router, path: &str, user: &str, params: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                axum::http::Request::post(path)
                    .header("content-type", "application/json")
                    .body(skill_body(user, &params))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn text(reply: &Value) -> &str {
        reply["template"]["outputs"][0]["simpleText"]["text"]
            .as_str()
            .unwrap()
    }

    fn valid_profile() -> Value {
        json!({
            "birth_date": "900101",
            "gender": "여",
            "height": "165",
            "weight": "60",
            "goal_weight": "55",
        })
    }

    #[tokio::test]
    async fn set_profile_replies_with_summary() {
        let app = test_app(None);
        let (status, reply) = call(&app, "/user", "u1", valid_profile()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["version"], "2.0");
        assert!(text(&reply).starts_with("🔔"));
        assert!(text(&reply).contains("⚖️ 체중 60kg"));
        assert!(text(&reply).contains("성별 여자 기준"));
        assert_eq!(reply["template"]["quickReplies"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn set_profile_accepts_numeric_origins() {
        let app = test_app(None);
        let mut params = valid_profile();
        params["height"] = json!(165);
        params["weight"] = json!(60);
        let (status, reply) = call(&app, "/user", "u1", params).await;
        assert_eq!(status, StatusCode::OK);
        assert!(text(&reply).starts_with("🔔"));
    }

    #[tokio::test]
    async fn set_profile_lists_every_invalid_field() {
        let app = test_app(None);
        let (status, reply) = call(
            &app,
            "/user",
            "u1",
            json!({
                "birth_date": "1990",
                "gender": "male",
                "height": "165",
                "weight": "60",
                "goal_weight": "55",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body = text(&reply);
        assert!(body.starts_with(replies::INVALID_INPUT_HEADER));
        assert!(body.contains(bapsang_core::models::BIRTH_DATE_MESSAGE));
        assert!(body.contains(bapsang_core::models::GENDER_MESSAGE));
        assert!(!body.contains(bapsang_core::models::HEIGHT_MESSAGE));
    }

    #[tokio::test]
    async fn endpoints_require_profile() {
        let app = test_app(None);
        for path in ["/info", "/weight_history", "/goal_history", "/menu"] {
            let (status, reply) = call(&app, path, "ghost", json!({})).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(text(&reply), replies::MISSING_PROFILE, "{path}");
        }
        let (_, reply) = call(&app, "/weight", "ghost", json!({"weight": "70"})).await;
        assert_eq!(text(&reply), replies::MISSING_PROFILE);
    }

    #[tokio::test]
    async fn weight_update_and_history() {
        let app = test_app(None);
        call(&app, "/user", "u1", valid_profile()).await;

        let (_, reply) = call(&app, "/weight", "u1", json!({"weight": "58"})).await;
        assert!(text(&reply).contains("60kg에서 58kg로 -2kg 감소했어요!"));
        assert!(text(&reply).contains("목표까지 3kg 남았어요"));

        let (_, reply) = call(&app, "/weight_history", "u1", json!({})).await;
        let lines: Vec<&str> = text(&reply).lines().skip(2).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" 60kg"));
        assert!(lines[1].ends_with(" 58kg"));
    }

    #[tokio::test]
    async fn weight_update_rejects_text() {
        let app = test_app(None);
        call(&app, "/user", "u1", valid_profile()).await;
        let (_, reply) = call(&app, "/weight", "u1", json!({"weight": "sixty"})).await;
        assert!(text(&reply).contains(bapsang_core::models::WEIGHT_MESSAGE));
    }

    #[tokio::test]
    async fn goal_update_and_history() {
        let app = test_app(None);
        call(&app, "/user", "u1", valid_profile()).await;

        let (_, reply) = call(&app, "/goal", "u1", json!({"goal_weight": "52"})).await;
        assert_eq!(text(&reply), "🎯 목표 체중이 52kg로 업데이트 되었습니다.");

        let (_, reply) = call(&app, "/goal_history", "u1", json!({})).await;
        let body = text(&reply);
        assert!(body.contains(" 55kg\n"));
        assert!(body.ends_with(" 52kg"));
    }

    #[tokio::test]
    async fn menu_reply_has_three_slots() {
        let app = test_app(None);
        call(&app, "/user", "u1", valid_profile()).await;

        let (status, reply) = call(&app, "/menu", "u1", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let body = text(&reply);
        assert!(body.starts_with(replies::MENU_HEADER));
        assert!(body.contains("🍳 아침"));
        assert!(body.contains("🌞 점심"));
        assert!(body.contains("🍽️ 저녁"));
        assert_eq!(reply["template"]["quickReplies"][0]["label"], "다른 식단 추천받기");
    }

    #[tokio::test]
    async fn missing_user_id_is_bad_request() {
        let app = test_app(None);
        let (status, json) = call(&app, "/info", "  ", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing user id");
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/users")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_lists_users() {
        let app = test_app(Some("test-key-abc123".to_string()));
        call(&app, "/user", "u1", valid_profile()).await;

        let response = app
            .oneshot(
                axum::http::Request::get("/api/users")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["user_key"], "u1");
        assert_eq!(json[0]["gender"], "female");
    }

    #[tokio::test]
    async fn skill_routes_skip_auth() {
        let app = test_app(Some("secret".to_string()));
        let (status, _) = call(&app, "/info", "u1", json!({})).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None);

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/user")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn storage_error_does_not_leak_details() {
        let result: Result<(), DietError> =
            Err(DietError::Storage(anyhow::anyhow!("disk I/O error at /var/lib/bapsang.db")));
        let Err(error) = skill_reply(result, |_| SkillResponse::text("unreachable")) else {
            panic!("storage failure must not become a reply");
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert!(!json["error"].as_str().unwrap().contains("bapsang.db"));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("0123456789abcdef"), "0123...cdef");
        assert_eq!(mask_key("short"), "****");
    }
}
