use super::model::{CellValue, Dataset, CATEGORY_COLUMN};

/// Wire value meaning "do not filter by category".
pub const ALL_CATEGORIES: &str = "__all__";

// ---------------------------------------------------------------------------
// Category selector
// ---------------------------------------------------------------------------

/// Which rows of the dataset a request looks at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelector {
    #[default]
    All,
    /// Exact match against the string form of `category_name`.
    Named(String),
}

impl CategorySelector {
    /// Interpret a query parameter; absent or the sentinel means all rows.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None | Some(ALL_CATEGORIES) => CategorySelector::All,
            Some(name) => CategorySelector::Named(name.to_string()),
        }
    }

    /// Value to put back into a query string or a form.
    pub fn as_param(&self) -> &str {
        match self {
            CategorySelector::All => ALL_CATEGORIES,
            CategorySelector::Named(name) => name,
        }
    }

    /// Human-readable label used in chart titles.
    pub fn label(&self) -> &str {
        match self {
            CategorySelector::All => "All Categories",
            CategorySelector::Named(name) => name,
        }
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Request-scoped subset of dataset rows. Borrows the dataset, never copies
/// or mutates it.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Every row of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Rows matching `selector`. A named selector on a dataset without a
    /// category column matches nothing.
    pub fn select(dataset: &'a Dataset, selector: &CategorySelector) -> Self {
        let name = match selector {
            CategorySelector::All => return Self::all(dataset),
            CategorySelector::Named(name) => name,
        };
        let indices = match dataset.column(CATEGORY_COLUMN) {
            Some(col) => col
                .values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.as_label().as_deref() == Some(name.as_str()))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };
        FilteredView { dataset, indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.dataset.has_column(name)
    }

    /// Keep only the given positions of this view (positions index into
    /// `indices()`, not into the dataset).
    pub fn retain_positions(&self, positions: &[usize]) -> FilteredView<'a> {
        FilteredView {
            dataset: self.dataset,
            indices: positions.iter().map(|&p| self.indices[p]).collect(),
        }
    }

    /// Raw cells of `column` for the rows in view.
    pub fn cells(&self, column: &str) -> Option<Vec<&'a CellValue>> {
        let col = self.dataset.column(column)?;
        Some(self.indices.iter().map(|&i| &col.values[i]).collect())
    }

    /// Numeric coercion of `column`, one entry per row in view. Cells that
    /// fail coercion are `None`; other columns are unaffected.
    pub fn numeric(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let col = self.dataset.column(column)?;
        Some(
            self.indices
                .iter()
                .map(|&i| col.values[i].to_numeric())
                .collect(),
        )
    }

    /// Coerced values of `column` with missing cells dropped.
    pub fn numeric_present(&self, column: &str) -> Option<Vec<f64>> {
        self.numeric(column)
            .map(|vals| vals.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let rows = [
            ["Music", "1000", "50"],
            ["Music", "oops", "100"],
            ["Gaming", "500", "10"],
        ];
        Dataset::from_rows(
            vec!["category_name".into(), "view_count".into(), "likes".into()],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn selector_from_param() {
        assert_eq!(CategorySelector::from_param(None), CategorySelector::All);
        assert_eq!(
            CategorySelector::from_param(Some("__all__")),
            CategorySelector::All
        );
        assert_eq!(
            CategorySelector::from_param(Some("Music")),
            CategorySelector::Named("Music".into())
        );
    }

    #[test]
    fn select_filters_by_exact_label() {
        let ds = dataset();
        let view = FilteredView::select(&ds, &CategorySelector::Named("Music".into()));
        assert_eq!(view.indices(), &[0, 1]);
        let view = FilteredView::select(&ds, &CategorySelector::Named("music".into()));
        assert!(view.is_empty());
        assert_eq!(FilteredView::select(&ds, &CategorySelector::All).len(), 3);
    }

    #[test]
    fn coercion_failure_only_affects_its_column() {
        let ds = dataset();
        let view = FilteredView::all(&ds);
        assert_eq!(
            view.numeric("view_count").unwrap(),
            vec![Some(1000.0), None, Some(500.0)]
        );
        assert_eq!(view.numeric_present("likes").unwrap(), vec![50.0, 100.0, 10.0]);
        assert!(view.numeric("dislikes").is_none());
    }

    #[test]
    fn named_selector_without_category_column_is_empty() {
        let ds = Dataset::from_rows(vec!["view_count".into()], vec![vec!["1".to_string()]]);
        let view = FilteredView::select(&ds, &CategorySelector::Named("Music".into()));
        assert!(view.is_empty());
    }
}
