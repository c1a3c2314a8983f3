//! Web server exposing OCR text extraction.
//!
//! Routes:
//! - `POST /extract-text`: multipart upload (`file`, optional `language`)
//! - `GET /health`: liveness probe

mod error;
mod handlers;
mod routes;

pub use error::{ApiError, ErrorBody};
pub use handlers::ExtractTextResponse;
pub use routes::create_router;

use std::sync::Arc;

use crate::config::Settings;
use crate::language::LanguageMap;
use crate::ocr::TextExtractor;
use crate::speech::SpeechNotifier;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub extractor: TextExtractor,
    pub languages: Arc<LanguageMap>,
    pub speech: SpeechNotifier,
    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(settings: &Settings, speech: SpeechNotifier) -> Self {
        Self {
            extractor: TextExtractor::from_settings(&settings.ocr),
            languages: Arc::new(settings.languages.clone()),
            speech,
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}

/// Start the web server and run until Ctrl+C.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let (speech, worker) =
        SpeechNotifier::from_settings(&settings.speech, settings.languages.clone());
    let state = AppState::new(settings, speech);

    for (tool, available, hint) in [
        (
            state.extractor.engine().name(),
            state.extractor.engine().is_available(),
            state.extractor.engine().availability_hint(),
        ),
        (
            state.extractor.rasterizer().name(),
            state.extractor.rasterizer().is_available(),
            state.extractor.rasterizer().availability_hint(),
        ),
    ] {
        if !available {
            tracing::warn!("{} unavailable: {}", tool, hint);
        }
    }

    let app = create_router(state);

    let host = host.trim_start_matches('[').trim_end_matches(']');
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(worker) = worker {
        worker.abort().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn setup_test_app() -> axum::Router {
        let settings = Settings::default();
        let speech = SpeechNotifier::disabled(settings.languages.clone());
        create_router(AppState::new(&settings, speech))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = setup_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let response = setup_test_app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/extract-text")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_non_multipart_body_has_no_file() {
        let response = setup_test_app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/extract-text")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "No file uploaded"})
        );
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let response = setup_test_app()
            .oneshot(
                Request::builder()
                    .uri("/extract-text")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
