/// One histogram bucket, `[lower, upper)` (the last bucket is closed).
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width buckets over `values`.
pub fn histogram(values: &[f64], n_bins: usize) -> Vec<Bin> {
    bucket(values, n_bins, |v| v, |e| e)
}

/// Buckets of equal width in log10 space. Non-positive values are ignored.
pub fn log_histogram(values: &[f64], n_bins: usize) -> Vec<Bin> {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    bucket(&positive, n_bins, f64::log10, |e| 10f64.powf(e))
}

/// Bucket `values` after mapping them with `forward`; edges are mapped back
/// with `inverse`. A degenerate range is widened by half a unit on each side.
fn bucket(
    values: &[f64],
    n_bins: usize,
    forward: impl Fn(f64) -> f64,
    inverse: impl Fn(f64) -> f64,
) -> Vec<Bin> {
    if values.is_empty() || n_bins == 0 {
        return Vec::new();
    }
    let mapped: Vec<f64> = values.iter().map(|&v| forward(v)).collect();
    let (mut lo, mut hi) = min_max(&mapped);
    if hi - lo < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / n_bins as f64;

    let mut counts = vec![0usize; n_bins];
    for v in mapped {
        let idx = (((v - lo) / width) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: inverse(lo + width * i as f64),
            upper: inverse(lo + width * (i + 1) as f64),
            count,
        })
        .collect()
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated at
/// `points` evenly spaced positions spanning the data.
///
/// `None` for fewer than two values or zero variance.
pub fn gaussian_kde(values: &[f64], points: usize) -> Option<Vec<(f64, f64)>> {
    if values.len() < 2 || points < 2 {
        return None;
    }
    let sd = std_dev(values);
    if sd.is_nan() || sd <= 0.0 {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = sd * n.powf(-1.0 / 5.0);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let (lo, hi) = min_max(values);
    let step = (hi - lo) / (points - 1) as f64;
    Some(
        (0..points)
            .map(|i| {
                let x = lo + step * i as f64;
                let density: f64 = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum();
                (x, density * norm)
            })
            .collect(),
    )
}

/// Pearson correlation over the rows where both sides are present.
///
/// `None` with fewer than two complete pairs or a constant side.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise-complete correlation matrix; `matrix[i][j]` pairs column i with j.
pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}
