use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

use super::stats::{self, Bin};
use super::{ChartKind, SampleSize};
use crate::data::filter::{CategorySelector, FilteredView};
use crate::data::model::{Dataset, CATEGORY_COLUMN, NUMERIC_COLUMNS};
use crate::error::AggregateError;

const VIEWS_BINS: usize = 80;
const LIKE_RATIO_BINS: usize = 40;
const DENSITY_POINTS: usize = 200;
const TOP_CATEGORIES: usize = 10;
pub const HOURS: usize = 24;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Numbers handed to the renderer: already filtered, coerced and aggregated.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPayload {
    Histogram {
        bins: Vec<Bin>,
        log_x: bool,
        /// Density curve in count units, drawn over the bars.
        density: Option<Vec<(f64, f64)>>,
    },
    /// `(label, value)` pairs, largest first.
    RankedBars(Vec<(String, f64)>),
    Scatter {
        points: Vec<(f64, f64)>,
        log_x: bool,
        log_y: bool,
    },
    HourCounts([usize; HOURS]),
    /// Fewer than two columns is valid; the renderer shows a notice for it.
    Correlation {
        columns: Vec<String>,
        matrix: Vec<Vec<Option<f64>>>,
    },
    Notice(Notice),
}

/// A valid request that produced nothing to plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EmptyResult,
    MissingColumn(String),
    UnknownChartKind(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyResult => f.write_str("No data for selected category"),
            Notice::MissingColumn(col) => write!(f, "{col} column not available"),
            Notice::UnknownChartKind(kind) => write!(f, "Unknown plot type: {kind}"),
        }
    }
}

impl From<Notice> for ChartPayload {
    fn from(notice: Notice) -> Self {
        ChartPayload::Notice(notice)
    }
}

// ---------------------------------------------------------------------------
// Aggregation entry-point
// ---------------------------------------------------------------------------

/// Compute the payload for one chart request.
///
/// Only a dataset without rows is an error. An unknown plot name, a
/// category with no rows, or a missing column come back as a
/// [`ChartPayload::Notice`].
pub fn render_payload<R: Rng + ?Sized>(
    dataset: &Dataset,
    category: &CategorySelector,
    plot: &str,
    sample: SampleSize,
    rng: &mut R,
) -> Result<ChartPayload, AggregateError> {
    if dataset.is_empty() {
        return Err(AggregateError::DatasetEmpty);
    }

    let kind = match plot.parse::<ChartKind>() {
        Ok(kind) => kind,
        Err(unknown) => return Ok(Notice::UnknownChartKind(unknown.0).into()),
    };

    let view = FilteredView::select(dataset, category);
    if view.is_empty() {
        return Ok(Notice::EmptyResult.into());
    }

    let payload = match kind {
        ChartKind::ViewsDistribution => views_distribution(&view),
        ChartKind::TopCategories => top_categories(&FilteredView::all(dataset)),
        ChartKind::LikesVsViews => likes_vs_views(&view, sample, rng),
        ChartKind::LikeRatioDistribution => like_ratio_distribution(&view),
        ChartKind::UploadsByHour => uploads_by_hour(&view),
        ChartKind::EngagementCorrelation => engagement_correlation(&view),
    };
    let rows = if kind.uses_category() {
        view.len()
    } else {
        dataset.len()
    };
    log::debug!("{kind} for {:?} over {rows} rows", category.as_param());
    Ok(payload)
}

fn views_distribution(view: &FilteredView<'_>) -> ChartPayload {
    let Some(views) = view.numeric_present("view_count") else {
        return Notice::MissingColumn("view_count".into()).into();
    };
    let bins = stats::log_histogram(&views, VIEWS_BINS);
    if bins.is_empty() {
        return Notice::EmptyResult.into();
    }
    ChartPayload::Histogram {
        bins,
        log_x: true,
        density: None,
    }
}

fn top_categories(view: &FilteredView<'_>) -> ChartPayload {
    let Some(labels) = view.cells(CATEGORY_COLUMN) else {
        return Notice::MissingColumn(CATEGORY_COLUMN.into()).into();
    };
    let Some(views) = view.numeric("view_count") else {
        return Notice::MissingColumn("view_count".into()).into();
    };

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (label, value) in labels.iter().zip(views) {
        if let (Some(label), Some(value)) = (label.as_label(), value) {
            *totals.entry(label).or_default() += value;
        }
    }

    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    // stable: equal totals stay in label order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(TOP_CATEGORIES);

    if ranked.is_empty() {
        return Notice::EmptyResult.into();
    }
    ChartPayload::RankedBars(ranked)
}

fn likes_vs_views<R: Rng + ?Sized>(
    view: &FilteredView<'_>,
    sample: SampleSize,
    rng: &mut R,
) -> ChartPayload {
    for col in ["view_count", "likes"] {
        if !view.has_column(col) {
            return Notice::MissingColumn(col.into()).into();
        }
    }

    let sampled = if view.len() > sample.get() {
        let mut positions = rand::seq::index::sample(rng, view.len(), sample.get()).into_vec();
        positions.sort_unstable();
        view.retain_positions(&positions)
    } else {
        view.clone()
    };

    let views = sampled.numeric("view_count").unwrap_or_default();
    let likes = sampled.numeric("likes").unwrap_or_default();
    let points: Vec<(f64, f64)> = views
        .into_iter()
        .zip(likes)
        .filter_map(|(v, l)| Some((v?, l?)))
        .filter(|(v, l)| *v > 0.0 && *l > 0.0)
        .collect();

    if points.is_empty() {
        return Notice::EmptyResult.into();
    }
    ChartPayload::Scatter {
        points,
        log_x: true,
        log_y: true,
    }
}

fn like_ratio_distribution(view: &FilteredView<'_>) -> ChartPayload {
    let Some(ratios) = view.numeric_present("like_ratio") else {
        return Notice::MissingColumn("like_ratio".into()).into();
    };
    let bins = stats::histogram(&ratios, LIKE_RATIO_BINS);
    let Some(first) = bins.first() else {
        return Notice::EmptyResult.into();
    };

    // scale the density so it overlays bars of this width
    let scale = ratios.len() as f64 * (first.upper - first.lower);
    let density = stats::gaussian_kde(&ratios, DENSITY_POINTS)
        .map(|curve| curve.into_iter().map(|(x, d)| (x, d * scale)).collect());

    ChartPayload::Histogram {
        bins,
        log_x: false,
        density,
    }
}

fn uploads_by_hour(view: &FilteredView<'_>) -> ChartPayload {
    let Some(hours) = view.numeric("publish_hour") else {
        return Notice::MissingColumn("publish_hour".into()).into();
    };
    let mut counts = [0usize; HOURS];
    for hour in hours.into_iter().flatten() {
        if hour.fract() == 0.0 && (0.0..HOURS as f64).contains(&hour) {
            counts[hour as usize] += 1;
        }
    }
    ChartPayload::HourCounts(counts)
}

fn engagement_correlation(view: &FilteredView<'_>) -> ChartPayload {
    let (columns, values): (Vec<String>, Vec<Vec<Option<f64>>>) = NUMERIC_COLUMNS
        .iter()
        .filter_map(|&col| Some((col.to_string(), view.numeric(col)?)))
        .unzip();
    let matrix = stats::correlation_matrix(&values);
    ChartPayload::Correlation { columns, matrix }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::from_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn music_gaming() -> Dataset {
        dataset(
            &["category_name", "view_count", "likes"],
            &[
                &["Music", "1000", "50"],
                &["Music", "2000", "100"],
                &["Gaming", "500", "10"],
            ],
        )
    }

    fn run(ds: &Dataset, category: CategorySelector, plot: &str) -> ChartPayload {
        let mut rng = StdRng::seed_from_u64(7);
        render_payload(ds, &category, plot, SampleSize::default(), &mut rng).unwrap()
    }

    #[test]
    fn top_categories_ranks_by_total_views() {
        let payload = run(&music_gaming(), CategorySelector::All, "top_categories");
        assert_eq!(
            payload,
            ChartPayload::RankedBars(vec![("Music".into(), 3000.0), ("Gaming".into(), 500.0)])
        );
    }

    #[test]
    fn top_categories_ignores_category_filter() {
        let payload = run(
            &music_gaming(),
            CategorySelector::Named("Gaming".into()),
            "top-categories",
        );
        let ChartPayload::RankedBars(ranked) = payload else {
            panic!("expected ranked bars, got {payload:?}");
        };
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, "Music");
    }

    #[test]
    fn top_categories_keeps_ten_largest() {
        let rows: Vec<Vec<String>> = (0..15)
            .map(|i| vec![format!("cat{i:02}"), (i * 100).to_string()])
            .collect();
        let refs: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = refs.iter().map(Vec::as_slice).collect();
        let ds = dataset(&["category_name", "view_count"], &slices);

        let ChartPayload::RankedBars(ranked) = run(&ds, CategorySelector::All, "top_categories")
        else {
            panic!("expected ranked bars");
        };
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0], ("cat14".to_string(), 1400.0));
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn top_categories_omits_groups_without_values() {
        let ds = dataset(
            &["category_name", "view_count"],
            &[&["Music", "10"], &["News", "n/a"], &["", "99"]],
        );
        assert_eq!(
            run(&ds, CategorySelector::All, "top_categories"),
            ChartPayload::RankedBars(vec![("Music".into(), 10.0)])
        );
    }

    #[test]
    fn empty_view_is_a_notice_for_every_kind() {
        let ds = music_gaming();
        for kind in ChartKind::ALL {
            let payload = run(&ds, CategorySelector::Named("Sports".into()), kind.slug());
            assert_eq!(payload, ChartPayload::Notice(Notice::EmptyResult), "{kind}");
        }
    }

    #[test]
    fn unknown_kind_is_a_notice() {
        assert_eq!(
            run(&music_gaming(), CategorySelector::All, "pie_chart"),
            ChartPayload::Notice(Notice::UnknownChartKind("pie_chart".into()))
        );
    }

    #[test]
    fn missing_publish_hour_is_a_notice() {
        assert_eq!(
            run(&music_gaming(), CategorySelector::All, "publish_hour"),
            ChartPayload::Notice(Notice::MissingColumn("publish_hour".into()))
        );
    }

    #[test]
    fn empty_dataset_is_structural_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = render_payload(
            &Dataset::empty(),
            &CategorySelector::All,
            "views_dist",
            SampleSize::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(AggregateError::DatasetEmpty)));
    }

    #[test]
    fn uploads_by_hour_counts_valid_hours() {
        let ds = dataset(
            &["category_name", "publish_hour"],
            &[&["A", "0"], &["A", "23"], &["A", "23"], &["A", "24"], &["A", "x"], &["A", "5.5"]],
        );
        let ChartPayload::HourCounts(counts) = run(&ds, CategorySelector::All, "publish_hour")
        else {
            panic!("expected hour counts");
        };
        assert_eq!(counts[0], 1);
        assert_eq!(counts[23], 2);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn coercion_failure_does_not_drop_row_elsewhere() {
        let ds = dataset(
            &["category_name", "view_count", "like_ratio"],
            &[&["A", "bad", "0.5"], &["A", "100", "0.7"], &["A", "200", "0.9"]],
        );
        let ChartPayload::Histogram { bins, .. } = run(&ds, CategorySelector::All, "like_ratio")
        else {
            panic!("expected histogram");
        };
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);

        let ChartPayload::Histogram { bins, log_x, .. } =
            run(&ds, CategorySelector::All, "views_dist")
        else {
            panic!("expected histogram");
        };
        assert!(log_x);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn like_ratio_density_is_optional() {
        let ds = dataset(&["like_ratio"], &[&["0.5"], &["0.5"]]);
        let ChartPayload::Histogram { density, .. } = run(&ds, CategorySelector::All, "like_ratio")
        else {
            panic!("expected histogram");
        };
        assert!(density.is_none());
    }

    #[test]
    fn scatter_is_sampled_without_replacement() {
        let rows: Vec<Vec<String>> = (1..=500)
            .map(|i| vec![(i * 10).to_string(), i.to_string()])
            .collect();
        let refs: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = refs.iter().map(Vec::as_slice).collect();
        let ds = dataset(&["view_count", "likes"], &slices);

        let mut rng = StdRng::seed_from_u64(42);
        let payload = render_payload(
            &ds,
            &CategorySelector::All,
            "likes_vs_views",
            SampleSize::new(150),
            &mut rng,
        )
        .unwrap();
        let ChartPayload::Scatter { points, log_x, log_y } = payload else {
            panic!("expected scatter");
        };
        assert!(log_x && log_y);
        assert_eq!(points.len(), 150);
        let mut likes: Vec<i64> = points.iter().map(|p| p.1 as i64).collect();
        likes.dedup();
        assert_eq!(likes.len(), 150);
    }

    #[test]
    fn scatter_uses_all_rows_below_sample_size() {
        let payload = run(&music_gaming(), CategorySelector::Named("Music".into()), "likes_vs_views");
        assert_eq!(
            payload,
            ChartPayload::Scatter {
                points: vec![(1000.0, 50.0), (2000.0, 100.0)],
                log_x: true,
                log_y: true,
            }
        );
    }

    #[test]
    fn correlation_covers_present_columns() {
        let ChartPayload::Correlation { columns, matrix } =
            run(&music_gaming(), CategorySelector::All, "corr")
        else {
            panic!("expected correlation");
        };
        assert_eq!(columns, vec!["view_count".to_string(), "likes".to_string()]);
        assert_eq!(matrix.len(), 2);
        assert!(matrix[0][1].unwrap() > 0.9);
    }

    #[test]
    fn correlation_with_one_column_is_vacuous_but_ok() {
        let ds = dataset(&["view_count"], &[&["1"], &["2"]]);
        let ChartPayload::Correlation { columns, matrix } = run(&ds, CategorySelector::All, "corr")
        else {
            panic!("expected correlation");
        };
        assert_eq!(columns.len(), 1);
        assert_eq!(matrix, vec![vec![Some(1.0)]]);
    }
}
