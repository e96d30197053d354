//! Drawing primitives the map builders emit, and the backend trait that
//! receives them.

use crate::error::Result;
use crate::types::Theme;
use geojson::Feature;
use serde::Serialize;

/// Initial viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    /// HTML body of the click popup.
    pub popup: String,
    pub tooltip: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

/// Kernel parameters shared by every point of a heat layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatKernel {
    pub radius: f64,
    pub blur: f64,
    pub min_opacity: f64,
    pub max_zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    pub lat: f64,
    pub lon: f64,
    /// Pixels.
    pub radius: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_weight: f64,
    pub popup: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_weight: f64,
    pub stroke_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LegendScale {
    /// Discrete swatches, each with its label.
    Classes(Vec<(String, String)>),
    /// Continuous ramp: colors evenly spaced between the two end labels.
    Ramp {
        colors: Vec<String>,
        min: String,
        max: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub caption: String,
    pub scale: LegendScale,
}

/// Handle for a polygon placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub usize);

/// A rendering backend. Builders only talk to this trait; the backend owns
/// how the commands turn into a displayable document.
pub trait MapCanvas {
    fn create(view: MapView, theme: Theme) -> Self
    where
        Self: Sized;

    fn place_marker(&mut self, marker: Marker);

    fn set_heat_kernel(&mut self, kernel: HeatKernel);

    fn draw_heat_point(&mut self, point: HeatPoint);

    fn draw_circle(&mut self, circle: Circle);

    fn style_polygon(&mut self, feature: &Feature, style: PolygonStyle) -> RegionId;

    fn draw_tooltip(&mut self, region: RegionId, text: String);

    fn add_legend(&mut self, legend: Legend);

    /// Attaches a raw HTML fragment on top of the map.
    fn attach_overlay(&mut self, html: String);

    /// Serializes everything drawn so far into a self-contained document.
    fn finalize(&self) -> Result<String>;
}

/// Escapes text for embedding in HTML content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Ré" & 'co'</b>"#),
            "&lt;b&gt;&quot;Ré&quot; &amp; &#39;co&#39;&lt;/b&gt;"
        );
    }
}
