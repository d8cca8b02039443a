//! HTTP API server for Kast.
//!
//! Exposes the pipeline over REST: a health probe and a generation
//! endpoint. Every route except `/health` requires the access token
//! configured via the `KAST_ACCESS_TOKEN` environment variable; when the
//! variable is unset the check is disabled (local development).

use crate::error::{KastError, Result};
use crate::pipeline::Pipeline;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Header carrying the API access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-kast-access-token";

/// Environment variable holding the expected access token.
pub const ACCESS_TOKEN_ENV: &str = "KAST_ACCESS_TOKEN";

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
    access_token: Option<String>,
}

/// Run the HTTP API server.
pub async fn run_server(host: &str, port: u16, pipeline: Pipeline) -> Result<()> {
    let access_token = std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty());
    if access_token.is_none() {
        warn!(
            "{} is not set; the API is accepting unauthenticated requests",
            ACCESS_TOKEN_ENV
        );
    }

    let state = Arc::new(AppState {
        pipeline,
        access_token,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/generate", post(generate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Reject requests without the expected access token.
async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let expected = match &state.access_token {
        Some(token) => token,
        None => return next.run(request).await,
    };

    let presented = request
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if presented != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing access token".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct GenerateRequest {
    /// Source URLs (webpages or YouTube videos), processed in order.
    #[serde(default)]
    urls: Vec<String>,
    /// Caller-provided text, generated over directly without extraction.
    /// Accepts a single string or an array of strings.
    #[serde(default)]
    text: Option<TextInput>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextInput {
    Single(String),
    Many(Vec<String>),
}

impl TextInput {
    fn into_vec(self) -> Vec<String> {
        match self {
            TextInput::Single(text) => vec![text],
            TextInput::Many(texts) => texts,
        }
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    request_id: String,
    text: String,
    token_count: u32,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    url: String,
    kind: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let texts = req.text.map(TextInput::into_vec).unwrap_or_default();
    info!(
        request_id = %request_id,
        urls = req.urls.len(),
        texts = texts.len(),
        "Generation request"
    );

    match state.pipeline.run_inputs(&req.urls, &texts).await {
        Ok(result) => Json(GenerateResponse {
            request_id,
            text: result.content.text,
            token_count: result.content.token_count,
            sources: result
                .sources
                .into_iter()
                .map(|s| SourceInfo {
                    url: s.source_url,
                    kind: s.source_kind.to_string(),
                })
                .collect(),
        })
        .into_response(),
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Generation request failed");
            (
                error_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Map pipeline errors to response status codes.
fn error_status(error: &KastError) -> StatusCode {
    match error {
        KastError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        KastError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        KastError::Extraction(_)
        | KastError::Generation(_)
        | KastError::OpenAI(_)
        | KastError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&KastError::InvalidInput("bad".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&KastError::Extraction("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&KastError::Generation("quota".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&KastError::Config("oops".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_generate_request_deserializes() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"urls": ["https://example.com"]}"#).unwrap();
        assert_eq!(req.urls.len(), 1);
        assert!(req.text.is_none());
    }

    #[test]
    fn test_generate_request_accepts_single_text() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"text": "some source material"}"#).unwrap();
        assert!(req.urls.is_empty());
        assert_eq!(
            req.text.unwrap().into_vec(),
            vec!["some source material".to_string()]
        );
    }

    #[test]
    fn test_generate_request_accepts_text_array_with_urls() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{"urls": ["https://example.com"], "text": ["one", "two"]}"#,
        )
        .unwrap();
        assert_eq!(req.urls.len(), 1);
        assert_eq!(
            req.text.unwrap().into_vec(),
            vec!["one".to_string(), "two".to_string()]
        );
    }
}
