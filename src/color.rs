use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_rgb(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential ramp for heatmaps
// ---------------------------------------------------------------------------

/// Light-to-dark blue ramp over `[0, 1]`, mixed in linear RGB.
#[derive(Debug, Clone, Copy)]
pub struct BlueRamp {
    low: LinSrgb,
    high: LinSrgb,
}

impl Default for BlueRamp {
    fn default() -> Self {
        BlueRamp {
            low: Srgb::new(0.97f32, 0.98, 1.0).into_linear(),
            high: Srgb::new(0.03f32, 0.19, 0.42).into_linear(),
        }
    }
}

impl BlueRamp {
    /// Colour at `t`; values outside `[0, 1]` are clamped.
    pub fn color_at(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } as f32;
        to_rgb(Srgb::from_linear(self.low.mix(self.high, t)))
    }

    /// Whether text drawn over `color_at(t)` should be white.
    pub fn needs_light_text(&self, t: f64) -> bool {
        t > 0.55
    }
}

fn to_rgb(rgb: Srgb) -> RGBColor {
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_length_and_distinct_colors() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!((a.0, a.1, a.2), (b.0, b.1, b.2));
            }
        }
    }

    #[test]
    fn ramp_darkens_and_clamps() {
        let ramp = BlueRamp::default();
        let low = ramp.color_at(0.0);
        let high = ramp.color_at(1.0);
        assert!(high.2 < low.2 || high.0 < low.0);
        let (a, b) = (ramp.color_at(-3.0), low);
        assert_eq!((a.0, a.1, a.2), (b.0, b.1, b.2));
        let (a, b) = (ramp.color_at(f64::NAN), low);
        assert_eq!((a.0, a.1, a.2), (b.0, b.1, b.2));
    }
}
