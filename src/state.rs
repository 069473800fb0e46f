use std::sync::Arc;

use crate::data::model::Dataset;
use crate::web::pages::Pages;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything a request handler needs. Built once before serving and never
/// mutated afterwards, so clones share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Loaded dataset (empty when loading failed).
    pub dataset: Arc<Dataset>,

    /// Sorted distinct category labels, computed once.
    pub categories: Arc<Vec<String>>,

    /// Compiled page templates.
    pub pages: Arc<Pages>,

    /// Chart canvas size in pixels.
    pub canvas: (u32, u32),
}

impl AppState {
    pub fn new(dataset: Dataset, canvas: (u32, u32)) -> Result<Self, handlebars::TemplateError> {
        let categories = dataset.categories();
        Ok(Self {
            dataset: Arc::new(dataset),
            categories: Arc::new(categories),
            pages: Arc::new(Pages::new()?),
            canvas,
        })
    }
}
