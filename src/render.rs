//! The five map builders. Each turns a normalized dataset into draw commands
//! on a `MapCanvas`.

use crate::boundary::{feature_property, BoundaryKind, BoundarySource};
use crate::canvas::{
    escape_html, Circle, HeatKernel, HeatPoint, Legend, LegendScale, MapCanvas, MapView, Marker,
    PolygonStyle,
};
use crate::colors::{
    circle_color, circle_radius, marker_color, municipality_color, normalize, state_color,
    value_range, NO_DATA_FILL, STATE_CLASSES, YL_GN_BU_STOPS,
};
use crate::data::format_number;
use crate::error::{MapError, Result};
use crate::leaflet::LeafletMap;
use crate::processing::pad_ibge_code;
use crate::regions::state_code;
use crate::strategy::Builder;
use crate::types::{Dataset, MunicipalityAggregate, PointRecord, Records, StateAggregate, Theme};
use geo::{Centroid, MultiPoint};
use std::collections::HashMap;
use thiserror::Error;

/// The artifact every builder produces in this crate.
pub type MapArtifact = LeafletMap;

/// City/region scale, for point maps.
pub const POINT_ZOOM: u8 = 10;
/// Geographic center of Brazil.
pub const NATIONAL_CENTER: (f64, f64) = (-14.235004, -51.92528);
pub const NATIONAL_ZOOM: u8 = 4;

pub const HEAT_KERNEL: HeatKernel = HeatKernel {
    radius: 25.0,
    blur: 15.0,
    min_opacity: 0.2,
    max_zoom: 18,
};

const NO_DATA_LABEL: &str = "no data";

#[derive(Error, Debug)]
#[error("{builder:?} builder cannot draw {records} records")]
pub struct ShapeMismatch {
    builder: Builder,
    records: &'static str,
}

fn national_view() -> MapView {
    MapView {
        latitude: NATIONAL_CENTER.0,
        longitude: NATIONAL_CENTER.1,
        zoom: NATIONAL_ZOOM,
    }
}

/// Arithmetic mean of the point coordinates as (latitude, longitude).
pub fn center_of(points: &[PointRecord]) -> Option<(f64, f64)> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| (p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .into();
    multi.centroid().map(|c| (c.y(), c.x()))
}

fn point_view(points: &[PointRecord]) -> MapView {
    match center_of(points) {
        Some((latitude, longitude)) => MapView {
            latitude,
            longitude,
            zoom: POINT_ZOOM,
        },
        None => national_view(),
    }
}

/// Runs `builder` over the dataset.
pub fn build<C: MapCanvas>(
    builder: Builder,
    dataset: &Dataset,
    theme: Theme,
    boundaries: &dyn BoundarySource,
) -> Result<C> {
    match (builder, &dataset.records) {
        (Builder::Markers, Records::Points(points)) => Ok(build_markers(points, theme)),
        (Builder::Heat, Records::Points(points)) => Ok(build_heat(points, theme)),
        (Builder::Circles, Records::Points(points)) => Ok(build_circles(points, theme)),
        (Builder::States, Records::States(states)) => build_states(states, theme, boundaries),
        (Builder::Municipalities, Records::Municipalities(rows)) => {
            build_municipalities(rows, theme, boundaries)
        }
        (builder, records) => Err(MapError::render(ShapeMismatch {
            builder,
            records: match records {
                Records::Points(_) => "point",
                Records::States(_) => "state",
                Records::Municipalities(_) => "municipality",
            },
        })),
    }
}

fn point_popup(point: &PointRecord, quantity: Option<f64>) -> String {
    let mut html = format!(
        "<div style=\"width: 200px;\"><h4>{}</h4>\
         <p><strong>Latitude:</strong> {:.6}</p>\
         <p><strong>Longitude:</strong> {:.6}</p>",
        escape_html(&point.description),
        point.latitude,
        point.longitude
    );
    if let Some(q) = quantity {
        html.push_str(&format!(
            "<p><strong>Quantity:</strong> {}</p>",
            format_number(q)
        ));
    }
    html.push_str("</div>");
    html
}

/// One marker per record, colored by row position.
pub fn build_markers<C: MapCanvas>(points: &[PointRecord], theme: Theme) -> C {
    let mut canvas = C::create(point_view(points), theme);
    for (i, point) in points.iter().enumerate() {
        canvas.place_marker(Marker {
            lat: point.latitude,
            lon: point.longitude,
            popup: point_popup(point, point.quantity),
            tooltip: escape_html(&point.description),
            color: marker_color(i),
        });
    }
    canvas
}

/// One weighted heat point per record.
pub fn build_heat<C: MapCanvas>(points: &[PointRecord], theme: Theme) -> C {
    let mut canvas = C::create(point_view(points), theme);
    canvas.set_heat_kernel(HEAT_KERNEL);
    for point in points {
        canvas.draw_heat_point(HeatPoint {
            lat: point.latitude,
            lon: point.longitude,
            weight: point.quantity.unwrap_or(1.0),
        });
    }
    canvas
}

/// Circles sized and colored by min-max normalized quantity.
pub fn build_circles<C: MapCanvas>(points: &[PointRecord], theme: Theme) -> C {
    let mut canvas = C::create(point_view(points), theme);
    let quantity = |p: &PointRecord| p.quantity.unwrap_or(1.0);
    let (min, max) = value_range(points.iter().map(quantity)).unwrap_or((0.0, 0.0));

    for point in points {
        let q = quantity(point);
        let t = normalize(q, min, max);
        canvas.draw_circle(Circle {
            lat: point.latitude,
            lon: point.longitude,
            radius: circle_radius(t),
            fill_color: circle_color(t).to_string(),
            fill_opacity: 0.7,
            stroke_color: "white".to_string(),
            stroke_weight: 2.0,
            popup: point_popup(point, Some(q)),
            tooltip: format!("{} ({})", escape_html(&point.description), format_number(q)),
        });
    }
    canvas
}

fn hover_label(name: &str, code: &str, value: Option<f64>) -> String {
    let value = value.map(format_number);
    format!(
        "{} ({}): {}",
        escape_html(name),
        escape_html(code),
        value.as_deref().unwrap_or(NO_DATA_LABEL)
    )
}

fn no_data_style(stroke_color: &str, stroke_weight: f64, stroke_opacity: f64) -> PolygonStyle {
    PolygonStyle {
        fill_color: NO_DATA_FILL.to_string(),
        fill_opacity: 0.3,
        stroke_color: stroke_color.to_string(),
        stroke_weight,
        stroke_opacity,
    }
}

fn rounded(v: f64) -> String {
    format_number((v * 10.0).round() / 10.0)
}

/// State choropleth over the boundary polygons. Every state polygon is drawn
/// and labelled, with or without data.
pub fn build_states<C: MapCanvas>(
    states: &[StateAggregate],
    theme: Theme,
    boundaries: &dyn BoundarySource,
) -> Result<C> {
    let geometry = boundaries.lookup(BoundaryKind::State)?;

    // Repeated states: the last row wins.
    let by_code: HashMap<String, f64> = states
        .iter()
        .map(|s| (state_code(&s.state_key_normalized), s.quantity))
        .collect();
    let (min, max) = value_range(by_code.values().copied()).unwrap_or((0.0, 0.0));

    let mut canvas = C::create(national_view(), theme);
    for feature in &geometry.features {
        let code = feature_property(feature, BoundaryKind::State.code_property()).unwrap_or_default();
        let name = feature_property(feature, "name").unwrap_or_else(|| code.clone());
        let value = by_code.get(&code).copied();

        let style = match value {
            Some(v) => PolygonStyle {
                fill_color: state_color(normalize(v, min, max)).to_hex(),
                fill_opacity: 0.7,
                stroke_color: "#000000".to_string(),
                stroke_weight: 1.0,
                stroke_opacity: 0.2,
            },
            None => no_data_style("#000000", 1.0, 0.2),
        };
        let region = canvas.style_polygon(feature, style);
        canvas.draw_tooltip(region, hover_label(&name, &code, value));
    }

    // Constant data has no range to split.
    let classes = if normalize(max, min, max).is_none() {
        vec![(state_color(None).to_hex(), rounded(min))]
    } else {
        let step = (max - min) / STATE_CLASSES.len() as f64;
        STATE_CLASSES
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let lo = min + step * i as f64;
                let label = if i + 1 == STATE_CLASSES.len() {
                    format!("≥ {}", rounded(lo))
                } else {
                    format!("{} – {}", rounded(lo), rounded(lo + step))
                };
                (color.to_hex(), label)
            })
            .collect()
    };
    canvas.add_legend(Legend {
        caption: "Quantity by state".to_string(),
        scale: LegendScale::Classes(classes),
    });

    Ok(canvas)
}

/// Municipality choropleth on a continuous scale. Municipalities without a
/// matching row are drawn in neutral gray.
pub fn build_municipalities<C: MapCanvas>(
    rows: &[MunicipalityAggregate],
    theme: Theme,
    boundaries: &dyn BoundarySource,
) -> Result<C> {
    let geometry = boundaries.lookup(BoundaryKind::Municipality)?;

    let by_code: HashMap<&str, f64> = rows
        .iter()
        .map(|r| (r.ibge_code.as_str(), r.value))
        .collect();
    let (min, max) = value_range(by_code.values().copied()).unwrap_or((0.0, 0.0));

    let mut canvas = C::create(national_view(), theme);
    for feature in &geometry.features {
        let code = feature_property(feature, BoundaryKind::Municipality.code_property())
            .map(|id| pad_ibge_code(&id))
            .unwrap_or_default();
        let name = feature_property(feature, "name").unwrap_or_else(|| code.clone());
        let value = by_code.get(code.as_str()).copied();

        let style = match value {
            Some(v) => PolygonStyle {
                fill_color: municipality_color(normalize(v, min, max)).to_hex(),
                fill_opacity: 0.9,
                stroke_color: "#555".to_string(),
                stroke_weight: 0.6,
                stroke_opacity: 1.0,
            },
            None => no_data_style("#555", 0.6, 1.0),
        };
        let region = canvas.style_polygon(feature, style);
        canvas.draw_tooltip(region, hover_label(&name, &code, value));
    }

    canvas.add_legend(Legend {
        caption: "Value".to_string(),
        scale: LegendScale::Ramp {
            colors: YL_GN_BU_STOPS.iter().map(|s| s.color.to_hex()).collect(),
            min: rounded(min),
            max: rounded(max),
        },
    });

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::StaticBoundaries;
    use crate::types::DataShape;
    use geojson::{Feature, FeatureCollection};
    use serde_json::json;

    fn point(lat: f64, lon: f64, q: Option<f64>) -> PointRecord {
        PointRecord {
            latitude: lat,
            longitude: lon,
            description: format!("p{lat}"),
            quantity: q,
        }
    }

    fn feature(props: serde_json::Value) -> Feature {
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: props.as_object().cloned(),
            foreign_members: None,
        }
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn state(name: &str, q: f64) -> StateAggregate {
        StateAggregate {
            state_name_raw: name.to_string(),
            state_key_normalized: crate::regions::normalize_state_key(name),
            quantity: q,
        }
    }

    #[test]
    fn test_center_is_mean() {
        let points = [point(-10.0, -40.0, None), point(-20.0, -50.0, None)];
        let (lat, lon) = center_of(&points).unwrap();
        assert!((lat + 15.0).abs() < 1e-9);
        assert!((lon + 45.0).abs() < 1e-9);
        assert_eq!(center_of(&[]), None);
    }

    #[test]
    fn test_markers_cycle_palette() {
        let points: Vec<PointRecord> = (0..13).map(|i| point(i as f64, 0.0, None)).collect();
        let map: LeafletMap = build_markers(&points, Theme::Light);
        assert_eq!(map.markers().len(), 13);
        assert_eq!(map.markers()[0].color, "red");
        assert_eq!(map.markers()[12].color, "red");
        assert_eq!(map.view().zoom, POINT_ZOOM);
        assert!(!map.markers()[0].popup.contains("Quantity"));
    }

    #[test]
    fn test_marker_popup_escapes_description() {
        let mut p = point(1.0, 2.0, Some(3.0));
        p.description = "<b>A & B</b>".into();
        let map: LeafletMap = build_markers(&[p], Theme::Light);
        let popup = &map.markers()[0].popup;
        assert!(popup.contains("&lt;b&gt;A &amp; B&lt;/b&gt;"));
        assert!(popup.contains("<strong>Latitude:</strong> 1.000000"));
        assert!(popup.contains("<strong>Quantity:</strong> 3"));
    }

    #[test]
    fn test_tooltips_escape_description() {
        let mut p = point(1.0, 2.0, Some(3.0));
        p.description = "<img src=x onerror=alert(1)>".into();

        let markers: LeafletMap = build_markers(&[p.clone()], Theme::Light);
        assert_eq!(
            markers.markers()[0].tooltip,
            "&lt;img src=x onerror=alert(1)&gt;"
        );
        assert!(!markers.finalize().unwrap().contains("<img src=x"));

        let circles: LeafletMap = build_circles(&[p], Theme::Light);
        assert_eq!(
            circles.circles()[0].tooltip,
            "&lt;img src=x onerror=alert(1)&gt; (3)"
        );
    }

    #[test]
    fn test_region_tooltips_escape_names() {
        let boundaries = StaticBoundaries::new().with(
            BoundaryKind::State,
            collection(vec![feature(json!({"name": "<b>Acre</b>", "sigla": "AC"}))]),
        );
        let map: LeafletMap = build_states(&[state("Acre", 1.0)], Theme::Light, &boundaries).unwrap();
        assert_eq!(
            map.regions()[0].tooltip.as_deref(),
            Some("&lt;b&gt;Acre&lt;/b&gt; (AC): 1")
        );
    }

    #[test]
    fn test_constant_states_single_legend_class() {
        let boundaries = StaticBoundaries::new().with(
            BoundaryKind::State,
            collection(vec![
                feature(json!({"name": "Acre", "sigla": "AC"})),
                feature(json!({"name": "Bahia", "sigla": "BA"})),
            ]),
        );
        let states = [state("Acre", 4.0), state("Bahia", 4.0)];
        let map: LeafletMap = build_states(&states, Theme::Light, &boundaries).unwrap();
        match &map.legends()[0].scale {
            LegendScale::Classes(classes) => {
                assert_eq!(classes, &vec![(STATE_CLASSES[2].to_hex(), "4".to_string())]);
            }
            other => panic!("unexpected scale: {other:?}"),
        }
        assert_eq!(map.regions()[0].style.fill_color, STATE_CLASSES[2].to_hex());
    }

    #[test]
    fn test_heat_uses_quantity_weight() {
        let map: LeafletMap = build_heat(&[point(-23.55, -46.64, Some(12400000.0))], Theme::Dark);
        assert_eq!(
            map.heat_points(),
            [HeatPoint {
                lat: -23.55,
                lon: -46.64,
                weight: 12400000.0
            }]
        );
        assert_eq!(map.heat_kernel(), Some(&HEAT_KERNEL));
    }

    #[test]
    fn test_circle_radii() {
        let points = [
            point(1.0, 1.0, Some(10.0)),
            point(2.0, 2.0, Some(20.0)),
            point(3.0, 3.0, Some(30.0)),
        ];
        let map: LeafletMap = build_circles(&points, Theme::Light);
        let radii: Vec<f64> = map.circles().iter().map(|c| c.radius).collect();
        assert_eq!(radii, vec![10.0, 55.0, 100.0]);
        let colors: Vec<&str> = map.circles().iter().map(|c| c.fill_color.as_str()).collect();
        assert_eq!(colors, ["green", "orange", "red"]);
    }

    #[test]
    fn test_constant_circles() {
        let points = [point(1.0, 1.0, Some(5.0)), point(2.0, 2.0, Some(5.0))];
        let map: LeafletMap = build_circles(&points, Theme::Light);
        assert!(map.circles().iter().all(|c| c.radius == 30.0 && c.fill_color == "blue"));
    }

    #[test]
    fn test_states_label_every_polygon() {
        let boundaries = StaticBoundaries::new().with(
            BoundaryKind::State,
            collection(vec![
                feature(json!({"name": "São Paulo", "sigla": "SP"})),
                feature(json!({"name": "Bahia", "sigla": "BA"})),
                feature(json!({"name": "Acre", "sigla": "AC"})),
            ]),
        );
        let states = [state("São Paulo", 100.0), state("bahia", 0.0)];
        let map: LeafletMap = build_states(&states, Theme::Light, &boundaries).unwrap();

        let regions = map.regions();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].tooltip.as_deref(), Some("São Paulo (SP): 100"));
        assert_eq!(regions[0].style.fill_color, "#006837");
        assert_eq!(regions[1].tooltip.as_deref(), Some("Bahia (BA): 0"));
        assert_eq!(regions[1].style.fill_color, "#ffffcc");
        assert_eq!(regions[2].tooltip.as_deref(), Some("Acre (AC): no data"));
        assert_eq!(regions[2].style.fill_color, NO_DATA_FILL);
        assert_eq!(map.view().zoom, NATIONAL_ZOOM);
        assert_eq!(map.legends().len(), 1);
    }

    #[test]
    fn test_states_accept_codes_as_names() {
        let boundaries = StaticBoundaries::new().with(
            BoundaryKind::State,
            collection(vec![feature(json!({"name": "Rio de Janeiro", "sigla": "RJ"}))]),
        );
        let map: LeafletMap = build_states(&[state("rj", 7.0)], Theme::Light, &boundaries).unwrap();
        assert_eq!(map.regions()[0].tooltip.as_deref(), Some("Rio de Janeiro (RJ): 7"));
    }

    #[test]
    fn test_states_need_boundaries() {
        let err = build_states::<LeafletMap>(&[state("Acre", 1.0)], Theme::Light, &StaticBoundaries::new())
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::BoundaryDataUnavailable {
                kind: BoundaryKind::State,
                ..
            }
        ));
    }

    #[test]
    fn test_municipalities_pad_feature_ids() {
        let boundaries = StaticBoundaries::new().with(
            BoundaryKind::Municipality,
            collection(vec![
                feature(json!({"name": "São Paulo", "id": 3550308})),
                feature(json!({"name": "Tiny", "id": "3550"})),
                feature(json!({"name": "Nowhere", "id": "1100205"})),
            ]),
        );
        let rows = [
            MunicipalityAggregate {
                ibge_code: "3550308".into(),
                value: 100.0,
            },
            MunicipalityAggregate {
                ibge_code: "0003550".into(),
                value: 0.0,
            },
        ];
        let map: LeafletMap = build_municipalities(&rows, Theme::Light, &boundaries).unwrap();
        let regions = map.regions();
        assert_eq!(regions[0].style.fill_color, "#081d58");
        assert_eq!(regions[0].style.fill_opacity, 0.9);
        assert_eq!(regions[1].style.fill_color, "#ffffd9");
        assert_eq!(regions[1].tooltip.as_deref(), Some("Tiny (0003550): 0"));
        assert_eq!(regions[2].style.fill_color, NO_DATA_FILL);
        assert_eq!(regions[2].style.fill_opacity, 0.3);
    }

    #[test]
    fn test_build_rejects_mismatched_records() {
        let dataset = Dataset {
            shape: DataShape::StateChoropleth,
            records: Records::States(vec![state("Acre", 1.0)]),
            has_quantity: true,
        };
        let err = build::<LeafletMap>(Builder::Heat, &dataset, Theme::Light, &StaticBoundaries::new())
            .unwrap_err();
        assert!(matches!(err, MapError::Render(_)));
    }
}
