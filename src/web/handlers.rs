//! Route handlers for the form pages and the chart image endpoint.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::pages::{IndexView, Selection};
use crate::chart::payload::render_payload;
use crate::chart::render::{placeholder, render_or_placeholder};
use crate::chart::{ChartKind, ChartMeta, SampleSize};
use crate::data::filter::CategorySelector;
use crate::error::AggregateError;
use crate::state::AppState;

/// Query string shared by `/visualize` and `/plot_image`.
///
/// `sample` stays a string so a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PlotQuery {
    pub category: Option<String>,
    pub plot: Option<String>,
    pub sample: Option<String>,
}

impl PlotQuery {
    pub fn selection(&self) -> Selection {
        Selection {
            category: CategorySelector::from_param(self.category.as_deref()),
            plot: self
                .plot
                .clone()
                .unwrap_or_else(|| ChartKind::default().slug().to_string()),
            sample: SampleSize::from_param(self.sample.as_deref()),
        }
    }
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

fn page_error(e: handlebars::RenderError) -> Response {
    log::error!("Template rendering failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Page rendering failed").into_response()
}

fn png(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

/// `GET /` – the bare selection form.
pub async fn index(State(state): State<AppState>) -> Response {
    let view = IndexView::new(state.dataset.len(), &state.categories, None);
    match state.pages.index(&view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => page_error(e),
    }
}

/// `GET /visualize` – the form with the chosen chart embedded.
pub async fn visualize(State(state): State<AppState>, Query(query): Query<PlotQuery>) -> Response {
    if state.dataset.is_empty() {
        return AggregateError::DatasetEmpty.into_response();
    }

    let selection = query.selection();
    let title = ChartMeta::for_plot(&selection.plot, &selection.category).title;
    let view = IndexView::new(
        state.dataset.len(),
        &state.categories,
        Some((&selection, title)),
    );
    match state.pages.index(&view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => page_error(e),
    }
}

/// `GET /plot_image` – the chart as PNG.
///
/// Aggregation and drawing run on the blocking pool. Anything short of an
/// unusable dataset still answers with an image.
pub async fn plot_image(State(state): State<AppState>, Query(query): Query<PlotQuery>) -> Response {
    let Selection {
        category,
        plot,
        sample,
    } = query.selection();
    let dataset = state.dataset.clone();
    let canvas = state.canvas;

    let task = tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();
        let payload = render_payload(&dataset, &category, &plot, sample, &mut rng)?;
        let meta = ChartMeta::for_plot(&plot, &category);
        Ok::<_, AggregateError>(render_or_placeholder(&payload, &meta, canvas))
    });

    match task.await {
        Ok(Ok(bytes)) => png(bytes),
        Ok(Err(e)) => {
            log::warn!("Chart request rejected: {e}");
            e.into_response()
        }
        Err(e) => {
            log::error!("Render task failed: {e}");
            png(placeholder(&format!("Error plotting: {e}")))
        }
    }
}

/// `GET /health` – liveness plus a summary of the loaded data.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "rows": state.dataset.len(),
        "columns": state.dataset.column_names(),
        "categories": state.categories.len(),
    }))
}
