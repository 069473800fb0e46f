//! Error types for each layer.

use std::path::PathBuf;

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetLoadError {
    #[error("Data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Zip archive contains no files")]
    EmptyArchive,

    #[error("Could not parse {entry}: {message}")]
    Parse { entry: String, message: String },
}

/// Structural failures of the aggregation layer. Per-request anomalies
/// (no rows, missing column, unknown chart) are notices, not errors.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Dataset not loaded or empty. Check server logs.")]
    DatasetEmpty,
}

/// Failures while drawing or encoding a chart.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("drawing failed: {0}")]
    Drawing(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for RenderError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(err.to_string())
    }
}
