use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::web::handlers;

// ---------------------------------------------------------------------------
// HTTP application
// ---------------------------------------------------------------------------

/// Build the router over an already-loaded state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/visualize", get(handlers::visualize))
        .route("/plot_image", get(handlers::plot_image))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::data::model::Dataset;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn sample_state() -> AppState {
        let rows = [
            ["Music", "1000", "50"],
            ["Music", "2000", "100"],
            ["Gaming", "500", "10"],
        ];
        let dataset = Dataset::from_rows(
            vec!["category_name".into(), "view_count".into(), "likes".into()],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        AppState::new(dataset, (400, 300)).unwrap()
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_index_lists_categories() {
        let (status, _, body) = get(sample_state(), "/").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("<option value=\"Gaming\">"));
        assert!(html.contains("<option value=\"Music\">"));
        assert!(!html.contains("<img"));
    }

    #[tokio::test]
    async fn test_visualize_embeds_plot_image() {
        let (status, _, body) =
            get(sample_state(), "/visualize?category=Music&plot=likes_vs_views&sample=10").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Likes vs Views (Music)"));
        assert!(html.contains("value=\"100\""));
        assert!(html.contains("<img"));
    }

    #[tokio::test]
    async fn test_visualize_on_empty_dataset_is_server_error() {
        let state = AppState::new(Dataset::empty(), (400, 300)).unwrap();
        let (status, _, _) = get(state, "/visualize?plot=corr").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_plot_image_returns_png() {
        for uri in [
            "/plot_image?plot=top_categories",
            "/plot_image?category=Music&plot=views_dist",
            "/plot_image?category=Nobody&plot=corr",
            "/plot_image?plot=publish_hour",
            "/plot_image?plot=mystery",
            "/plot_image?plot=likes_vs_views&sample=abc",
        ] {
            let (status, content_type, body) = get(sample_state(), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(content_type.as_deref(), Some("image/png"), "{uri}");
            assert!(body.starts_with(PNG_MAGIC), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_plot_image_on_empty_dataset_is_plain_text_error() {
        let state = AppState::new(Dataset::empty(), (400, 300)).unwrap();
        let (status, content_type, body) = get(state, "/plot_image?plot=views_dist").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert!(String::from_utf8(body).unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_health_reports_dataset_shape() {
        let (status, _, body) = get(sample_state(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["rows"], 3);
        assert_eq!(json["categories"], 2);
    }
}
