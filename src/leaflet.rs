//! Leaflet backend: records draw commands and finalizes them into a single
//! HTML page that loads Leaflet from a CDN.

use crate::canvas::{
    escape_html, Circle, HeatKernel, HeatPoint, Legend, LegendScale, MapCanvas, MapView, Marker,
    PolygonStyle, RegionId,
};
use crate::error::{MapError, Result};
use crate::render::HEAT_KERNEL;
use crate::types::Theme;
use geojson::Feature;
use serde::Serialize;
use std::fmt::Write;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_HEAT_JS: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

const POPUP_MAX_WIDTH: u32 = 250;

struct Tiles {
    url: &'static str,
    attribution: &'static str,
}

fn tiles_for(theme: Theme) -> Tiles {
    match theme {
        Theme::Light => Tiles {
            url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            attribution: "&copy; OpenStreetMap contributors",
        },
        Theme::Dark => Tiles {
            url: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
            attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
        },
    }
}

/// A polygon with its style and hover text.
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub feature: Feature,
    pub style: PolygonStyle,
    pub tooltip: Option<String>,
}

/// Layer data as embedded into the page script.
#[derive(Serialize)]
struct Layers<'a> {
    view: &'a MapView,
    tiles: &'static str,
    attribution: &'static str,
    popup_max_width: u32,
    markers: &'a [Marker],
    heat: Option<HeatLayer<'a>>,
    circles: &'a [Circle],
    regions: &'a [Region],
}

#[derive(Serialize)]
struct HeatLayer<'a> {
    kernel: &'a HeatKernel,
    points: Vec<[f64; 3]>,
}

#[derive(Debug, Clone)]
pub struct LeafletMap {
    view: MapView,
    theme: Theme,
    markers: Vec<Marker>,
    heat_kernel: Option<HeatKernel>,
    heat_points: Vec<HeatPoint>,
    circles: Vec<Circle>,
    regions: Vec<Region>,
    legends: Vec<Legend>,
    overlays: Vec<String>,
}

impl LeafletMap {
    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn heat_kernel(&self) -> Option<&HeatKernel> {
        self.heat_kernel.as_ref()
    }

    pub fn heat_points(&self) -> &[HeatPoint] {
        &self.heat_points
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    pub fn overlays(&self) -> &[String] {
        &self.overlays
    }

    fn layers_json(&self) -> Result<String> {
        let heat = (!self.heat_points.is_empty()).then(|| HeatLayer {
            kernel: self.heat_kernel.as_ref().unwrap_or(&HEAT_KERNEL),
            points: self
                .heat_points
                .iter()
                .map(|p| [p.lat, p.lon, p.weight])
                .collect(),
        });
        let tiles = tiles_for(self.theme);
        let layers = Layers {
            view: &self.view,
            tiles: tiles.url,
            attribution: tiles.attribution,
            popup_max_width: POPUP_MAX_WIDTH,
            markers: &self.markers,
            heat,
            circles: &self.circles,
            regions: &self.regions,
        };
        let json = serde_json::to_string(&layers).map_err(MapError::render)?;
        // Keep "</script>" inside strings from closing the script element.
        Ok(json.replace("</", "<\\/"))
    }
}

fn legend_html(legend: &Legend, offset: usize) -> String {
    let mut html = format!(
        "<div class=\"legend\" style=\"bottom: {}px\"><strong>{}</strong>",
        20 + offset * 90,
        escape_html(&legend.caption)
    );
    match &legend.scale {
        LegendScale::Classes(classes) => {
            for (color, label) in classes {
                let _ = write!(
                    html,
                    "<div><i style=\"background: {}\"></i>{}</div>",
                    escape_html(color),
                    escape_html(label)
                );
            }
        }
        LegendScale::Ramp { colors, min, max } => {
            let gradient = colors
                .iter()
                .map(|c| escape_html(c))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(
                html,
                "<div class=\"ramp\" style=\"background: linear-gradient(to right, {})\"></div>\
                 <div class=\"ramp-labels\"><span>{}</span><span>{}</span></div>",
                gradient,
                escape_html(min),
                escape_html(max)
            );
        }
    }
    html.push_str("</div>");
    html
}

const PAGE_STYLE: &str = r#"
html, body { width: 100%; height: 100%; margin: 0; padding: 0; }
#map { position: absolute; top: 0; bottom: 0; right: 0; left: 0; }
.pin { width: 14px; height: 14px; border-radius: 50% 50% 50% 0; border: 2px solid #fff;
       transform: rotate(-45deg); box-shadow: 0 0 3px rgba(0,0,0,0.6); }
.legend { position: fixed; right: 10px; z-index: 9999; background: #fff; padding: 8px 10px;
          border: 2px solid grey; font: 12px sans-serif; }
.legend i { display: inline-block; width: 16px; height: 12px; margin-right: 6px; }
.legend .ramp { width: 180px; height: 12px; margin-top: 4px; }
.legend .ramp-labels { display: flex; justify-content: space-between; }
"#;

const PAGE_SCRIPT: &str = r#"
var map = L.map('map').setView([layers.view.latitude, layers.view.longitude], layers.view.zoom);
L.tileLayer(layers.tiles, { attribution: layers.attribution, maxZoom: 19 }).addTo(map);
layers.regions.forEach(function (r) {
  var s = r.style;
  var layer = L.geoJSON(r.feature, { style: function () {
    return { fillColor: s.fill_color, fillOpacity: s.fill_opacity, color: s.stroke_color,
             weight: s.stroke_weight, opacity: s.stroke_opacity };
  } });
  if (r.tooltip !== null) { layer.bindTooltip(r.tooltip, { sticky: true }); }
  layer.addTo(map);
});
layers.markers.forEach(function (m) {
  var icon = L.divIcon({ className: '', iconSize: [18, 18], iconAnchor: [9, 18],
    html: '<div class="pin" style="background:' + m.color + '"></div>' });
  L.marker([m.lat, m.lon], { icon: icon })
    .bindPopup(m.popup, { maxWidth: layers.popup_max_width })
    .bindTooltip(m.tooltip)
    .addTo(map);
});
layers.circles.forEach(function (c) {
  L.circleMarker([c.lat, c.lon], { radius: c.radius, color: c.stroke_color, weight: c.stroke_weight,
    fill: true, fillColor: c.fill_color, fillOpacity: c.fill_opacity })
    .bindPopup(c.popup, { maxWidth: layers.popup_max_width })
    .bindTooltip(c.tooltip)
    .addTo(map);
});
if (layers.heat !== null) {
  var k = layers.heat.kernel;
  L.heatLayer(layers.heat.points, { radius: k.radius, blur: k.blur, minOpacity: k.min_opacity,
    maxZoom: k.max_zoom }).addTo(map);
}
"#;

impl MapCanvas for LeafletMap {
    fn create(view: MapView, theme: Theme) -> Self {
        Self {
            view,
            theme,
            markers: Vec::new(),
            heat_kernel: None,
            heat_points: Vec::new(),
            circles: Vec::new(),
            regions: Vec::new(),
            legends: Vec::new(),
            overlays: Vec::new(),
        }
    }

    fn place_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn set_heat_kernel(&mut self, kernel: HeatKernel) {
        self.heat_kernel = Some(kernel);
    }

    fn draw_heat_point(&mut self, point: HeatPoint) {
        self.heat_points.push(point);
    }

    fn draw_circle(&mut self, circle: Circle) {
        self.circles.push(circle);
    }

    fn style_polygon(&mut self, feature: &Feature, style: PolygonStyle) -> RegionId {
        self.regions.push(Region {
            feature: feature.clone(),
            style,
            tooltip: None,
        });
        RegionId(self.regions.len() - 1)
    }

    fn draw_tooltip(&mut self, region: RegionId, text: String) {
        if let Some(r) = self.regions.get_mut(region.0) {
            r.tooltip = Some(text);
        }
    }

    fn add_legend(&mut self, legend: Legend) {
        self.legends.push(legend);
    }

    fn attach_overlay(&mut self, html: String) {
        self.overlays.push(html);
    }

    fn finalize(&self) -> Result<String> {
        let layers = self.layers_json()?;
        let mut page = String::new();

        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        let _ = writeln!(page, "<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">");
        let _ = writeln!(page, "<script src=\"{LEAFLET_JS}\"></script>");
        if !self.heat_points.is_empty() {
            let _ = writeln!(page, "<script src=\"{LEAFLET_HEAT_JS}\"></script>");
        }
        let _ = writeln!(page, "<style>{PAGE_STYLE}</style>\n</head>\n<body>");
        page.push_str("<div id=\"map\"></div>\n");

        for (i, legend) in self.legends.iter().enumerate() {
            page.push_str(&legend_html(legend, i));
            page.push('\n');
        }
        for overlay in &self.overlays {
            page.push_str(overlay);
            page.push('\n');
        }

        let _ = writeln!(page, "<script>\nvar layers = {layers};{PAGE_SCRIPT}</script>");
        page.push_str("</body>\n</html>\n");
        Ok(page)
    }
}
