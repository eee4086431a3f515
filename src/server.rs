use crate::error::{AppError, Result};
use crate::google::{FileHandle, GoogleAuth, SheetHandle, SheetsClient, SheetsOperations};
use crate::importer;
use crate::mapper::{ColumnMapping, MappingSummary};
use crate::models::TransactionRecord;
use crate::session::{self, SessionStore};
use crate::sink::ImportSink;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<GoogleAuth>,
    pub sessions: SessionStore,
    pub sink: Arc<dyn ImportSink>,
}

pub fn create_router(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| AppError::Config(format!("Invalid CORS origin: {}", e)))?;

    // Credentialed CORS: the session cookie has to survive the browser's
    // cross-origin policy for the frontend to hold a session at all.
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/api/sheets/auth-url", get(auth_url))
        .route("/api/sheets/callback", get(callback))
        .route("/api/sheets/spreadsheets", get(list_spreadsheets))
        .route("/api/sheets/sheets", get(list_sheets))
        .route("/api/sheets/preview-sheet", post(preview_sheet))
        .route("/api/sheets/import-sheet", post(import_sheet))
        .route("/api/sheets/disconnect", post(disconnect))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Session identity for this request. First contact mints a fresh id plus
/// the Set-Cookie that carries it back.
fn resolve_session(headers: &HeaderMap) -> (String, Option<String>) {
    match session::session_id_from_headers(headers) {
        Some(id) => (id, None),
        None => {
            let id = SessionStore::new_session_id();
            let cookie = session::session_cookie(&id);
            (id, Some(cookie))
        }
    }
}

fn with_session_cookie(cookie: Option<String>, body: impl IntoResponse) -> Response {
    match cookie {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], body).into_response(),
        None => body.into_response(),
    }
}

/// Build a Sheets client from the session's stored tokens, refreshing an
/// expired access token first. Missing tokens are an auth failure, not a
/// fault.
async fn authorized_client(state: &AppState, session_id: &str) -> Result<SheetsClient> {
    let tokens = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

    let tokens = if tokens.is_expired() {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

        let refreshed = state.auth.refresh_tokens(refresh_token).await?;
        // Awaited so the next request for this session sees the new tokens.
        state.sessions.store(session_id, refreshed.clone()).await;
        refreshed
    } else {
        tokens
    };

    Ok(SheetsClient::new(
        state.auth.http_client(),
        tokens.access_token,
    ))
}

#[derive(Serialize)]
struct AuthUrlBody {
    url: String,
}

async fn auth_url(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (_, cookie) = resolve_session(&headers);

    let body = Json(AuthUrlBody {
        url: state.auth.authorize_url().to_string(),
    });

    with_session_cookie(cookie, body)
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

#[derive(Serialize)]
struct FileListBody {
    success: bool,
    sheets: Vec<FileHandle>,
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let (session_id, cookie) = resolve_session(&headers);

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Auth("No code provided".to_string()))?;

    let tokens = state.auth.exchange_code(&code).await?;

    // The browser fires a dependent request as soon as this response lands;
    // the token write must be visible before we reply.
    state.sessions.store(&session_id, tokens.clone()).await;

    let client = SheetsClient::new(state.auth.http_client(), tokens.access_token);
    let sheets = client.list_spreadsheets().await?;

    Ok(with_session_cookie(
        cookie,
        Json(FileListBody {
            success: true,
            sheets,
        }),
    ))
}

async fn list_spreadsheets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FileListBody>> {
    let (session_id, _) = resolve_session(&headers);
    let client = authorized_client(&state, &session_id).await?;

    let sheets = client.list_spreadsheets().await?;

    Ok(Json(FileListBody {
        success: true,
        sheets,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetsQuery {
    file_id: String,
}

#[derive(Serialize)]
struct SheetListBody {
    success: bool,
    sheets: Vec<SheetHandle>,
}

async fn list_sheets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SheetsQuery>,
) -> Result<Json<SheetListBody>> {
    let (session_id, _) = resolve_session(&headers);
    let client = authorized_client(&state, &session_id).await?;

    let sheets = client.list_sheets(&query.file_id).await?;

    Ok(Json(SheetListBody {
        success: true,
        sheets,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    file_id: String,
    #[serde(default)]
    sheet_id: Option<i64>,
    #[serde(default)]
    sheet_name: Option<String>,
}

#[derive(Serialize)]
struct PreviewBody {
    success: bool,
    headers: Vec<String>,
    preview: Vec<TransactionRecord>,
}

async fn preview_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewBody>> {
    let (session_id, _) = resolve_session(&headers);
    let client = authorized_client(&state, &session_id).await?;

    debug!(
        file_id = %request.file_id,
        sheet_id = ?request.sheet_id,
        sheet_name = ?request.sheet_name,
        "Previewing sheet"
    );

    let outcome =
        importer::preview(&client, &request.file_id, request.sheet_name.as_deref()).await?;

    Ok(Json(PreviewBody {
        success: true,
        headers: outcome.headers,
        preview: outcome.sample,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    file_id: String,
    #[serde(default)]
    sheet_name: Option<String>,
    mappings: ColumnMapping,
}

#[derive(Serialize)]
struct ImportBody {
    success: bool,
    count: usize,
    summary: MappingSummary,
}

async fn import_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportBody>> {
    let (session_id, _) = resolve_session(&headers);
    let client = authorized_client(&state, &session_id).await?;

    let outcome = importer::import(
        &client,
        state.sink.as_ref(),
        &request.file_id,
        request.sheet_name.as_deref(),
        &request.mappings,
    )
    .await?;

    Ok(Json(ImportBody {
        success: true,
        count: outcome.count,
        summary: outcome.summary,
    }))
}

#[derive(Serialize)]
struct DisconnectBody {
    success: bool,
}

/// Drop the session's tokens server-side. The provider-side grant stays
/// live; re-connecting runs the consent flow again.
async fn disconnect(State(state): State<AppState>, headers: HeaderMap) -> Json<DisconnectBody> {
    let (session_id, _) = resolve_session(&headers);
    state.sessions.remove(&session_id).await;

    Json(DisconnectBody { success: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleConfig;
    use crate::session::TokenSet;
    use crate::sink::LoggingSink;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = GoogleConfig {
            client_id: "client_123".to_string(),
            client_secret: "secret_123".to_string(),
            redirect_uri: "http://localhost:5173/auth/callback".to_string(),
        };

        AppState {
            auth: Arc::new(GoogleAuth::new(&config).unwrap()),
            sessions: SessionStore::new(),
            sink: Arc::new(LoggingSink),
        }
    }

    fn test_router(state: AppState) -> Router {
        create_router(state, "http://localhost:5173").unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_auth_url_returns_consent_url_and_session_cookie() {
        let router = test_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/sheets/auth-url")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with(session::SESSION_COOKIE));

        let body = body_json(response).await;
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with("https://accounts.google.com/"));
        assert!(url.contains("prompt=consent"));
    }

    #[tokio::test]
    async fn test_callback_without_code_is_rejected_before_any_remote_call() {
        let router = test_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/sheets/callback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "No code provided" })
        );
    }

    #[tokio::test]
    async fn test_callback_with_empty_code_is_rejected() {
        let router = test_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/sheets/callback?code=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sheets_requires_authentication() {
        let router = test_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/sheets/sheets?fileId=file_1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Not authenticated" })
        );
    }

    #[tokio::test]
    async fn test_preview_requires_authentication() {
        let router = test_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/sheets/preview-sheet")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"fileId": "file_1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Not authenticated" })
        );
    }

    #[tokio::test]
    async fn test_disconnect_clears_stored_tokens() {
        let state = test_state();
        let session_id = "session_abc";
        state
            .sessions
            .store(
                session_id,
                TokenSet {
                    access_token: "access_123".to_string(),
                    refresh_token: None,
                    expires_at: chrono::Utc::now().timestamp() + 3600,
                },
            )
            .await;

        let router = test_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/sheets/disconnect")
                    .header(
                        header::COOKIE,
                        format!("{}={}", session::SESSION_COOKIE, session_id),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "success": true })
        );
        assert_eq!(state.sessions.get(session_id).await, None);
    }
}
