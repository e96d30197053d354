//! Summary statistics overlaid on the finished map.

use crate::canvas::{escape_html, MapCanvas};
use crate::render::center_of;
use crate::strategy::Builder;
use crate::types::{DataShape, Dataset, Records, Theme};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub shape: DataShape,
    pub count: usize,
    /// Sum of the quantity/value field, when the records carry one.
    pub total: Option<f64>,
    pub mean: Option<f64>,
    /// Mean (latitude, longitude), for coordinate data only.
    pub center: Option<(f64, f64)>,
}

fn sum_and_mean(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    let mean = if n == 0 { 0.0 } else { sum / n as f64 };
    (sum, mean)
}

pub fn compute(dataset: &Dataset) -> DatasetStats {
    let (total, mean, center) = match &dataset.records {
        Records::Points(points) => {
            let (total, mean) = if dataset.has_quantity {
                let (s, m) = sum_and_mean(points.iter().map(|p| p.quantity.unwrap_or(0.0)));
                (Some(s), Some(m))
            } else {
                (None, None)
            };
            (total, mean, center_of(points))
        }
        Records::States(states) => {
            let (s, m) = sum_and_mean(states.iter().map(|s| s.quantity));
            (Some(s), Some(m), None)
        }
        Records::Municipalities(rows) => {
            let (s, m) = sum_and_mean(rows.iter().map(|r| r.value));
            (Some(s), Some(m), None)
        }
    };

    DatasetStats {
        shape: dataset.shape,
        count: dataset.records.len(),
        total,
        mean,
        center,
    }
}

fn count_label(shape: DataShape) -> &'static str {
    match shape {
        DataShape::Coordinates => "Total points",
        DataShape::StateChoropleth => "Total states",
        DataShape::MunicipalityChoropleth => "Total municipalities",
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The fixed-position overlay fragment.
pub fn overlay_html(stats: &DatasetStats, builder: Builder, theme: Theme) -> String {
    let (background, foreground) = match theme {
        Theme::Light => ("white", "black"),
        Theme::Dark => ("#222", "#eee"),
    };

    let mut html = format!(
        "<div class=\"map-stats\" style=\"position: fixed; top: 10px; right: 10px; width: 220px; \
         height: auto; background-color: {background}; color: {foreground}; \
         border: 2px solid grey; z-index: 9999; font-size: 14px; padding: 10px\">\
         <h4>Statistics</h4>\
         <p><strong>{}:</strong> {}</p>\
         <p><strong>Type:</strong> {}</p>\
         <p><strong>Theme:</strong> {}</p>",
        count_label(stats.shape),
        stats.count,
        escape_html(builder.label()),
        title_case(theme.name()),
    );

    if let (Some(total), Some(mean)) = (stats.total, stats.mean) {
        html.push_str(&format!(
            "<p><strong>Total:</strong> {total:.1}</p><p><strong>Mean:</strong> {mean:.1}</p>"
        ));
    }
    if let Some((lat, lon)) = stats.center {
        html.push_str(&format!(
            "<p><strong>Center:</strong><br>Lat: {lat:.4}<br>Lon: {lon:.4}</p>"
        ));
    }

    html.push_str("</div>");
    html
}

/// Computes the statistics and attaches them to the artifact.
pub fn annotate<C: MapCanvas>(
    canvas: &mut C,
    dataset: &Dataset,
    builder: Builder,
    theme: Theme,
) -> DatasetStats {
    let stats = compute(dataset);
    canvas.attach_overlay(overlay_html(&stats, builder, theme));
    stats
}
