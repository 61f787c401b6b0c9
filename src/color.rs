use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

/// Red → yellow → green for `t` in `[0, 1]`.
pub fn diverging(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    hsl_to_color32(t * 120.0, 0.7, 0.5)
}

/// Dark blue → bright yellow for `t` in `[0, 1]`.
pub fn sequential(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    hsl_to_color32(240.0 - t * 180.0, 0.65, 0.3 + t * 0.35)
}

/// Position of `value` inside `[lo, hi]`, or the midpoint for a flat range.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    let range = hi - lo;
    if range.abs() < f64::EPSILON {
        0.5
    } else {
        (value - lo) / range
    }
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the labels of one categorical column (departments, segments, years)
/// to distinct colours, so a category keeps its colour across charts.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from the column's unique labels.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let labels: Vec<String> = labels.into_iter().map(|l| l.to_string()).collect();
        let palette = generate_palette(labels.len());
        ColorMap {
            mapping: labels.into_iter().zip(palette).collect(),
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}
