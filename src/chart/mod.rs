//! Chart kinds, request parameters, and per-chart metadata.
//!
//! `payload` turns a dataset and a request into numbers, `render` turns
//! numbers into a PNG. `stats` holds the shared numeric routines.

pub mod payload;
pub mod render;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use crate::data::filter::CategorySelector;

// ---------------------------------------------------------------------------
// Chart kind
// ---------------------------------------------------------------------------

/// The fixed menu of charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    ViewsDistribution,
    TopCategories,
    LikesVsViews,
    LikeRatioDistribution,
    UploadsByHour,
    EngagementCorrelation,
}

/// A plot name that is not in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChartKind(pub String);

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::ViewsDistribution,
        ChartKind::TopCategories,
        ChartKind::LikesVsViews,
        ChartKind::LikeRatioDistribution,
        ChartKind::UploadsByHour,
        ChartKind::EngagementCorrelation,
    ];

    /// Value used in query strings and form options.
    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::ViewsDistribution => "views_dist",
            ChartKind::TopCategories => "top_categories",
            ChartKind::LikesVsViews => "likes_vs_views",
            ChartKind::LikeRatioDistribution => "like_ratio",
            ChartKind::UploadsByHour => "publish_hour",
            ChartKind::EngagementCorrelation => "corr",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            ChartKind::ViewsDistribution => "views-distribution",
            ChartKind::TopCategories => "top-categories",
            ChartKind::LikesVsViews => "likes-vs-views",
            ChartKind::LikeRatioDistribution => "like-ratio-distribution",
            ChartKind::UploadsByHour => "uploads-by-hour",
            ChartKind::EngagementCorrelation => "engagement-correlation",
        }
    }

    /// Label shown in the form's drop-down.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::ViewsDistribution => "Views Distribution",
            ChartKind::TopCategories => "Top Categories by Views",
            ChartKind::LikesVsViews => "Likes vs Views (scatter)",
            ChartKind::LikeRatioDistribution => "Like Ratio Distribution",
            ChartKind::UploadsByHour => "Uploads by Hour",
            ChartKind::EngagementCorrelation => "Engagement Correlation",
        }
    }

    /// Whether the category filter applies to this chart.
    pub fn uses_category(self) -> bool {
        !matches!(self, ChartKind::TopCategories)
    }
}

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.slug() == s || k.alias() == s)
            .ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// ---------------------------------------------------------------------------
// Sample size
// ---------------------------------------------------------------------------

/// Row bound for sampled charts, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSize(usize);

impl SampleSize {
    pub const MIN: usize = 100;
    pub const MAX: usize = 50_000;
    pub const DEFAULT: usize = 5_000;

    pub fn new(requested: i64) -> Self {
        SampleSize(requested.clamp(Self::MIN as i64, Self::MAX as i64) as usize)
    }

    /// Parse a query parameter. Absent or unparsable input gives the default.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") => SampleSize::default(),
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => SampleSize::new(n),
                Err(_) => {
                    log::warn!("Ignoring invalid sample size {raw:?}");
                    SampleSize::default()
                }
            },
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for SampleSize {
    fn default() -> Self {
        SampleSize(Self::DEFAULT)
    }
}

// ---------------------------------------------------------------------------
// Chart metadata
// ---------------------------------------------------------------------------

/// Title and axis labels handed to the renderer alongside a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMeta {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

impl ChartMeta {
    pub fn for_kind(kind: ChartKind, category: &CategorySelector) -> Self {
        let (x_label, y_label) = match kind {
            ChartKind::ViewsDistribution => ("Views (log scale)", "Number of Videos"),
            ChartKind::TopCategories => ("Total Views", "Category"),
            ChartKind::LikesVsViews => ("Views (log)", "Likes (log)"),
            ChartKind::LikeRatioDistribution => ("Like Ratio", "Number of Videos"),
            ChartKind::UploadsByHour => ("Hour of Day", "Number of Uploads"),
            ChartKind::EngagementCorrelation => ("", ""),
        };
        ChartMeta {
            title: title_for(kind, category),
            x_label,
            y_label,
        }
    }

    /// Metadata for a plot name that did not parse.
    pub fn unknown() -> Self {
        ChartMeta {
            title: "Visualization".to_string(),
            x_label: "",
            y_label: "",
        }
    }

    /// Metadata for a raw plot parameter, known or not.
    pub fn for_plot(plot: &str, category: &CategorySelector) -> Self {
        match plot.parse::<ChartKind>() {
            Ok(kind) => ChartMeta::for_kind(kind, category),
            Err(_) => ChartMeta::unknown(),
        }
    }
}

fn title_for(kind: ChartKind, category: &CategorySelector) -> String {
    let label = category.label();
    match kind {
        ChartKind::ViewsDistribution => format!("Views Distribution ({label})"),
        ChartKind::TopCategories => "Top Categories by Total Views".to_string(),
        ChartKind::LikesVsViews => format!("Likes vs Views ({label})"),
        ChartKind::LikeRatioDistribution => format!("Like Ratio Distribution ({label})"),
        ChartKind::UploadsByHour => "Uploads by Hour".to_string(),
        ChartKind::EngagementCorrelation => "Engagement Correlation Heatmap".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slugs_and_aliases() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.slug().parse::<ChartKind>(), Ok(kind));
            assert_eq!(kind.alias().parse::<ChartKind>(), Ok(kind));
        }
        assert_eq!(
            "pie".parse::<ChartKind>(),
            Err(UnknownChartKind("pie".to_string()))
        );
    }

    #[test]
    fn sample_size_is_clamped() {
        assert_eq!(SampleSize::new(10).get(), 100);
        assert_eq!(SampleSize::new(1_000_000).get(), 50_000);
        assert_eq!(SampleSize::new(-5).get(), 100);
        assert_eq!(SampleSize::new(2500).get(), 2500);
    }

    #[test]
    fn sample_size_param_defaults() {
        assert_eq!(SampleSize::from_param(None).get(), 5000);
        assert_eq!(SampleSize::from_param(Some("abc")).get(), 5000);
        assert_eq!(SampleSize::from_param(Some("10")).get(), 100);
        assert_eq!(SampleSize::from_param(Some("99999999999")).get(), 50_000);
    }

    #[test]
    fn titles_follow_category() {
        let all = CategorySelector::All;
        let music = CategorySelector::Named("Music".into());
        assert_eq!(
            ChartMeta::for_kind(ChartKind::ViewsDistribution, &all).title,
            "Views Distribution (All Categories)"
        );
        assert_eq!(
            ChartMeta::for_kind(ChartKind::LikesVsViews, &music).title,
            "Likes vs Views (Music)"
        );
        assert_eq!(ChartMeta::for_plot("nope", &music).title, "Visualization");
    }
}
