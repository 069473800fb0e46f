use handlebars::Handlebars;
use serde::Serialize;

use crate::chart::{ChartKind, SampleSize};
use crate::data::filter::CategorySelector;

const BASE_TEMPLATE: &str = include_str!("../../templates/base.hbs");
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.hbs");

// ---------------------------------------------------------------------------
// Template registry
// ---------------------------------------------------------------------------

/// Compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("base", BASE_TEMPLATE)?;
        registry.register_template_string("index", INDEX_TEMPLATE)?;
        Ok(Pages { registry })
    }

    /// Render the selection form, with a chart reference when `view` has one.
    pub fn index(&self, view: &IndexView<'_>) -> Result<String, handlebars::RenderError> {
        self.registry.render("index", view)
    }
}

// ---------------------------------------------------------------------------
// Page context
// ---------------------------------------------------------------------------

/// What the user picked, echoed back into the form.
#[derive(Debug, Clone)]
pub struct Selection {
    pub category: CategorySelector,
    pub plot: String,
    pub sample: SampleSize,
}

impl Selection {
    /// Relative URL of the image for this selection.
    pub fn plot_url(&self) -> String {
        format!(
            "/plot_image?plot={}&category={}&sample={}",
            urlencoding::encode(&self.plot),
            urlencoding::encode(self.category.as_param()),
            self.sample.get()
        )
    }
}

#[derive(Debug, Serialize)]
struct OptionItem<'a> {
    value: &'a str,
    label: &'a str,
    selected: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexView<'a> {
    row_count: usize,
    categories: Vec<OptionItem<'a>>,
    plots: Vec<OptionItem<'a>>,
    sample: usize,
    sample_min: usize,
    sample_max: usize,
    plot_url: Option<String>,
    title: Option<String>,
}

impl<'a> IndexView<'a> {
    /// Form context. `chart` carries the selection and its computed title.
    pub fn new(
        row_count: usize,
        categories: &'a [String],
        chart: Option<(&'a Selection, String)>,
    ) -> Self {
        let selection = chart.as_ref().map(|(s, _)| *s);
        let selected_category = selection.and_then(|s| match &s.category {
            CategorySelector::All => None,
            CategorySelector::Named(name) => Some(name.as_str()),
        });
        let selected_plot = selection.map(|s| s.plot.as_str());

        IndexView {
            row_count,
            categories: categories
                .iter()
                .map(|c| OptionItem {
                    value: c,
                    label: c,
                    selected: selected_category == Some(c.as_str()),
                })
                .collect(),
            plots: ChartKind::ALL
                .iter()
                .map(|k| OptionItem {
                    value: k.slug(),
                    label: k.label(),
                    selected: selected_plot.is_some_and(|p| p.parse::<ChartKind>() == Ok(*k)),
                })
                .collect(),
            sample: selection.map_or(SampleSize::DEFAULT, |s| s.sample.get()),
            sample_min: SampleSize::MIN,
            sample_max: SampleSize::MAX,
            plot_url: selection.map(Selection::plot_url),
            title: chart.map(|(_, title)| title),
        }
    }
}
