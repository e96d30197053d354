//! Palettes, value normalization and color scales used by the map builders.

/// RGB color with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Marker colors, cycled by row index.
pub const MARKER_PALETTE: &[&str] = &[
    "red",
    "blue",
    "green",
    "purple",
    "orange",
    "darkred",
    "pink",
    "gray",
    "black",
    "darkblue",
    "darkgreen",
    "cadetblue",
];

pub fn marker_color(index: usize) -> &'static str {
    MARKER_PALETTE[index % MARKER_PALETTE.len()]
}

/// Min-max normalization. `None` when the range is degenerate.
pub fn normalize(value: f64, min: f64, max: f64) -> Option<f64> {
    if max == min {
        None
    } else {
        Some((value - min) / (max - min))
    }
}

/// Smallest and largest value, or `None` for an empty input.
pub fn value_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ─── Proportional circles ──────────────────────────────────────────────

pub const CIRCLE_MIN_RADIUS: f64 = 10.0;
pub const CIRCLE_RADIUS_SPAN: f64 = 90.0;
pub const CIRCLE_FLAT_RADIUS: f64 = 30.0;
pub const CIRCLE_FLAT_COLOR: &str = "blue";

pub fn circle_radius(t: Option<f64>) -> f64 {
    match t {
        Some(t) => CIRCLE_MIN_RADIUS + t * CIRCLE_RADIUS_SPAN,
        None => CIRCLE_FLAT_RADIUS,
    }
}

/// Three buckets, not a ramp.
pub fn circle_color(t: Option<f64>) -> &'static str {
    match t {
        None => CIRCLE_FLAT_COLOR,
        Some(t) if t < 0.33 => "green",
        Some(t) if t < 0.66 => "orange",
        Some(_) => "red",
    }
}

// ─── State choropleth: 5 equal-width classes ───────────────────────────

/// Light yellow -> dark green.
pub const STATE_CLASSES: [Rgb; 5] = [
    Rgb::new(0xff, 0xff, 0xcc),
    Rgb::new(0xc2, 0xe6, 0x99),
    Rgb::new(0x78, 0xc6, 0x79),
    Rgb::new(0x31, 0xa3, 0x54),
    Rgb::new(0x00, 0x68, 0x37),
];

/// Class index for a normalized value: <0.2, <0.4, <0.6, <0.8, >=0.8.
/// A degenerate range lands in the middle class.
pub fn state_class(t: Option<f64>) -> usize {
    let t = t.unwrap_or(0.5);
    STATE_CLASS_BREAKS
        .iter()
        .position(|upper| t < *upper)
        .unwrap_or(STATE_CLASSES.len() - 1)
}

const STATE_CLASS_BREAKS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

pub fn state_color(t: Option<f64>) -> Rgb {
    STATE_CLASSES[state_class(t)]
}

// ─── Municipality choropleth: continuous YlGnBu ────────────────────────

pub const YL_GN_BU_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 0xff, 0xff, 0xd9),
    ColorStop::new(0.125, 0xed, 0xf8, 0xb1),
    ColorStop::new(0.250, 0xc7, 0xe9, 0xb4),
    ColorStop::new(0.375, 0x7f, 0xcd, 0xbb),
    ColorStop::new(0.500, 0x41, 0xb6, 0xc4),
    ColorStop::new(0.625, 0x1d, 0x91, 0xc0),
    ColorStop::new(0.750, 0x22, 0x5e, 0xa8),
    ColorStop::new(0.875, 0x25, 0x34, 0x94),
    ColorStop::new(1.000, 0x08, 0x1d, 0x58),
];

/// Fill for municipalities that have no matching row.
pub const NO_DATA_FILL: &str = "#EEEEEE";

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

/// Multi-stop linear interpolation, clamped to the end stops.
pub fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Continuous scale spanning the observed range. A degenerate range maps
/// to the low end of the ramp.
pub fn municipality_color(t: Option<f64>) -> Rgb {
    multi_stop(YL_GN_BU_STOPS, t.unwrap_or(0.0))
}
