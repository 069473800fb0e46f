use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::payload::{ChartPayload, HOURS};
use super::stats::Bin;
use super::ChartMeta;
use crate::color::{generate_palette, BlueRamp};
use crate::error::RenderError;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const FONT: &str = "sans-serif";
const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);
const DENSITY_COLOR: RGBColor = RGBColor(221, 132, 82);
const MISSING_CELL: RGBColor = RGBColor(220, 220, 220);

/// Size of a notice or placeholder image.
pub const NOTICE_SIZE: (u32, u32) = (600, 300);

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Draw `payload` and encode it as PNG. Notices ignore `size` and use
/// [`NOTICE_SIZE`].
pub fn render_png(
    payload: &ChartPayload,
    meta: &ChartMeta,
    size: (u32, u32),
) -> Result<Vec<u8>, RenderError> {
    match payload {
        ChartPayload::Notice(notice) => render_notice(&notice.to_string()),
        ChartPayload::Correlation { columns, .. } if columns.len() < 2 => {
            render_notice("Not enough numeric columns for a correlation")
        }
        _ => draw_to_png(size, |root| draw_payload(root, payload, meta)),
    }
}

/// Like [`render_png`], but a failure becomes a placeholder image that
/// carries the error text.
pub fn render_or_placeholder(payload: &ChartPayload, meta: &ChartMeta, size: (u32, u32)) -> Vec<u8> {
    match render_png(payload, meta, size) {
        Ok(png) => png,
        Err(e) => {
            log::error!("Rendering {:?} failed: {e}", meta.title);
            placeholder(&format!("Error plotting: {e}"))
        }
    }
}

/// Centred message on a white canvas. Falls back to a blank image if text
/// cannot be drawn.
pub fn placeholder(message: &str) -> Vec<u8> {
    match render_notice(message) {
        Ok(png) => png,
        Err(e) => {
            log::error!("Placeholder rendering failed: {e}");
            blank_png(NOTICE_SIZE)
        }
    }
}

/// Plain white PNG, encoded without touching the drawing backend.
pub fn blank_png((width, height): (u32, u32)) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    encode_png(img).unwrap_or_else(|e| {
        log::error!("Encoding blank image failed: {e}");
        Vec::new()
    })
}

// ---------------------------------------------------------------------------
// Backend plumbing
// ---------------------------------------------------------------------------

fn draw_to_png(
    (width, height): (u32, u32),
    draw: impl FnOnce(&Area<'_>) -> Result<(), RenderError>,
) -> Result<Vec<u8>, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::Drawing(format!("empty canvas {width}x{height}")));
    }
    let mut buf = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    let img = RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| RenderError::Drawing("pixel buffer has the wrong size".into()))?;
    encode_png(img)
}

fn encode_png(img: RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn render_notice(message: &str) -> Result<Vec<u8>, RenderError> {
    draw_to_png(NOTICE_SIZE, |root| {
        let style = TextStyle::from((FONT, 20).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let (w, h) = NOTICE_SIZE;
        root.draw_text(message, &style, (w as i32 / 2, h as i32 / 2))?;
        Ok(())
    })
}

fn draw_payload(root: &Area<'_>, payload: &ChartPayload, meta: &ChartMeta) -> Result<(), RenderError> {
    match payload {
        ChartPayload::Histogram {
            bins,
            log_x,
            density,
        } => draw_histogram(root, meta, bins, *log_x, density.as_deref()),
        ChartPayload::RankedBars(ranked) => draw_ranked_bars(root, meta, ranked),
        ChartPayload::Scatter {
            points,
            log_x,
            log_y,
        } => draw_scatter(root, meta, points, *log_x, *log_y),
        ChartPayload::HourCounts(counts) => draw_hour_counts(root, meta, counts),
        ChartPayload::Correlation { columns, matrix } => {
            draw_heatmap(root, meta, columns, matrix)
        }
        // notices never reach the chart path
        ChartPayload::Notice(_) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Short human form of a number: 1.2K, 3.4M, 5.6B.
fn compact(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else if a >= 10.0 || a == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Label for an axis whose coordinates are log10 of the data.
fn pow10_label(v: &f64) -> String {
    compact(10f64.powf(*v))
}

fn to_axis(v: f64, log: bool) -> f64 {
    if log {
        v.log10()
    } else {
        v
    }
}

/// `(lo, hi)` with a little headroom; never degenerate.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Index label for a category axis; empty off the integer positions.
fn index_label(v: f64, names: &[String]) -> String {
    let i = v.round();
    if (v - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    names.get(i as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

fn draw_histogram(
    root: &Area<'_>,
    meta: &ChartMeta,
    bins: &[Bin],
    log_x: bool,
    density: Option<&[(f64, f64)]>,
) -> Result<(), RenderError> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let x_range = to_axis(first.lower, log_x)..to_axis(last.upper, log_x);
    let mut y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    if let Some(curve) = density {
        y_max = curve.iter().map(|p| p.1).fold(y_max, f64::max);
    }
    let y_max = (y_max * 1.05).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(&meta.title, (FONT, 24))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0f64..y_max)?;

    let x_fmt = |v: &f64| if log_x { pow10_label(v) } else { compact(*v) };
    chart
        .configure_mesh()
        .x_desc(meta.x_label)
        .y_desc(meta.y_label)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|v| compact(*v))
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new(
            [
                (to_axis(b.lower, log_x), 0.0),
                (to_axis(b.upper, log_x), b.count as f64),
            ],
            BAR_COLOR.mix(0.8).filled(),
        )
    }))?;

    if let Some(curve) = density {
        chart.draw_series(LineSeries::new(
            curve.iter().map(|&(x, y)| (to_axis(x, log_x), y)),
            DENSITY_COLOR.stroke_width(2),
        ))?;
    }
    Ok(())
}

fn draw_ranked_bars(
    root: &Area<'_>,
    meta: &ChartMeta,
    ranked: &[(String, f64)],
) -> Result<(), RenderError> {
    let n = ranked.len();
    // largest at the top: row i is drawn at y = n - 1 - i
    let names: Vec<String> = ranked.iter().rev().map(|(name, _)| name.clone()).collect();
    let x_max = ranked.iter().map(|r| r.1).fold(0.0, f64::max).max(1.0) * 1.05;
    let palette = generate_palette(n);

    let mut chart = ChartBuilder::on(root)
        .caption(&meta.title, (FONT, 24))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(160)
        .build_cartesian_2d(0f64..x_max, -0.5f64..(n as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(meta.x_label)
        .y_desc(meta.y_label)
        .y_labels(n)
        .x_label_formatter(&|v| compact(*v))
        .y_label_formatter(&|v| index_label(*v, &names))
        .draw()?;

    chart.draw_series(ranked.iter().enumerate().map(|(i, (_, total))| {
        let y = (n - 1 - i) as f64;
        Rectangle::new([(0.0, y - 0.4), (*total, y + 0.4)], palette[i].filled())
    }))?;
    Ok(())
}

fn draw_scatter(
    root: &Area<'_>,
    meta: &ChartMeta,
    points: &[(f64, f64)],
    log_x: bool,
    log_y: bool,
) -> Result<(), RenderError> {
    let mapped: Vec<(f64, f64)> = points
        .iter()
        .map(|&(x, y)| (to_axis(x, log_x), to_axis(y, log_y)))
        .collect();
    let (x_lo, x_hi) = mapped
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let (y_lo, y_hi) = mapped
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if !x_lo.is_finite() || !y_lo.is_finite() {
        return Ok(());
    }
    let (x_lo, x_hi) = padded(x_lo, x_hi);
    let (y_lo, y_hi) = padded(y_lo, y_hi);

    let mut chart = ChartBuilder::on(root)
        .caption(&meta.title, (FONT, 24))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    let x_fmt = |v: &f64| if log_x { pow10_label(v) } else { compact(*v) };
    let y_fmt = |v: &f64| if log_y { pow10_label(v) } else { compact(*v) };
    chart
        .configure_mesh()
        .x_desc(meta.x_label)
        .y_desc(meta.y_label)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    chart.draw_series(
        mapped
            .iter()
            .map(|&p| Circle::new(p, 3, BAR_COLOR.mix(0.4).filled())),
    )?;
    Ok(())
}

fn draw_hour_counts(
    root: &Area<'_>,
    meta: &ChartMeta,
    counts: &[usize; HOURS],
) -> Result<(), RenderError> {
    let y_max = (counts.iter().copied().max().unwrap_or(0) as f64 * 1.05).max(1.0);
    let hours: Vec<String> = (0..HOURS).map(|h| h.to_string()).collect();

    let mut chart = ChartBuilder::on(root)
        .caption(&meta.title, (FONT, 24))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(HOURS as f64 - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(meta.x_label)
        .y_desc(meta.y_label)
        .x_labels(HOURS)
        .x_label_formatter(&|v| index_label(*v, &hours))
        .y_label_formatter(&|v| compact(*v))
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(h, &c)| {
        let x = h as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, c as f64)], BAR_COLOR.filled())
    }))?;
    Ok(())
}

fn draw_heatmap(
    root: &Area<'_>,
    meta: &ChartMeta,
    columns: &[String],
    matrix: &[Vec<Option<f64>>],
) -> Result<(), RenderError> {
    let n = columns.len();
    let ramp = BlueRamp::default();
    // first column at the top
    let rows: Vec<String> = columns.iter().rev().cloned().collect();
    let range = -0.5f64..(n as f64 - 0.5);

    let mut chart = ChartBuilder::on(root)
        .caption(&meta.title, (FONT, 24))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(130)
        .build_cartesian_2d(range.clone(), range)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|v| index_label(*v, columns))
        .y_label_formatter(&|v| index_label(*v, &rows))
        .draw()?;

    for (i, row) in matrix.iter().enumerate() {
        let y = (n - 1 - i) as f64;
        for (j, cell) in row.iter().enumerate() {
            let x = j as f64;
            // correlations span [-1, 1]; the ramp spans [0, 1]
            let t = cell.map(|r| (r + 1.0) / 2.0);
            let fill = t.map_or(MISSING_CELL, |t| ramp.color_at(t));
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                fill.filled(),
            )))?;

            let text_color = if t.is_some_and(|t| ramp.needs_light_text(t)) {
                WHITE
            } else {
                BLACK
            };
            let label = cell.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"));
            let style = TextStyle::from((FONT, 18).into_font())
                .color(&text_color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart.draw_series(std::iter::once(Text::new(label, (x, y), style)))?;
        }
    }
    Ok(())
}
