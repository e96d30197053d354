use serde::Serialize;
use std::fmt;

/// The domain category a spreadsheet was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataShape {
    Coordinates,
    StateChoropleth,
    MunicipalityChoropleth,
}

impl DataShape {
    pub fn name(&self) -> &'static str {
        match self {
            DataShape::Coordinates => "coordinates",
            DataShape::StateChoropleth => "states",
            DataShape::MunicipalityChoropleth => "municipalities",
        }
    }
}

impl fmt::Display for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateAggregate {
    pub state_name_raw: String,
    pub state_key_normalized: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityAggregate {
    /// Seven-digit, zero-padded IBGE municipality code.
    pub ibge_code: String,
    pub value: f64,
}

/// A cleaned dataset. Every record shares one variant, so the variant doubles
/// as the shape tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    Points(Vec<PointRecord>),
    States(Vec<StateAggregate>),
    Municipalities(Vec<MunicipalityAggregate>),
}

impl Records {
    pub fn len(&self) -> usize {
        match self {
            Records::Points(r) => r.len(),
            Records::States(r) => r.len(),
            Records::Municipalities(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of normalization: records plus the capability flags the renderer
/// selection depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub shape: DataShape,
    pub records: Records,
    /// True when the records carry a numeric weight usable for heat/circle sizing.
    pub has_quantity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Traditional,
    Heat,
    Circles,
    Choropleth,
    Municipalities,
}

impl RenderMode {
    pub const ALL: &[RenderMode] = &[
        Self::Traditional,
        Self::Heat,
        Self::Circles,
        Self::Choropleth,
        Self::Municipalities,
    ];

    /// Parses the form values the web front end sends (Portuguese) as well as
    /// the English names. Anything unrecognised is the traditional marker map.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "calor" | "heat" | "heatmap" => RenderMode::Heat,
            "circulos" | "círculos" | "circles" => RenderMode::Circles,
            "coropletico" | "coroplético" | "choropleth" | "estados" | "states" => {
                RenderMode::Choropleth
            }
            "municipios" | "municípios" | "municipalities" => RenderMode::Municipalities,
            _ => RenderMode::Traditional,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderMode::Traditional => "traditional",
            RenderMode::Heat => "heat",
            RenderMode::Circles => "circles",
            RenderMode::Choropleth => "choropleth",
            RenderMode::Municipalities => "municipalities",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "escuro" | "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub requested_mode: RenderMode,
    pub theme: Theme,
}

impl RenderRequest {
    pub fn new(requested_mode: RenderMode, theme: Theme) -> Self {
        Self {
            requested_mode,
            theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parses_form_values() {
        assert_eq!(RenderMode::from_str("calor"), RenderMode::Heat);
        assert_eq!(RenderMode::from_str(" Circulos "), RenderMode::Circles);
        assert_eq!(RenderMode::from_str("coropletico"), RenderMode::Choropleth);
        assert_eq!(RenderMode::from_str("municipios"), RenderMode::Municipalities);
        assert_eq!(RenderMode::from_str("tradicional"), RenderMode::Traditional);
        assert_eq!(RenderMode::from_str("whatever"), RenderMode::Traditional);
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in RenderMode::ALL {
            assert_eq!(RenderMode::from_str(mode.name()), *mode);
        }
    }

    #[test]
    fn test_theme_defaults_to_light() {
        assert_eq!(Theme::from_str("escuro"), Theme::Dark);
        assert_eq!(Theme::from_str("claro"), Theme::Light);
        assert_eq!(Theme::from_str(""), Theme::Light);
    }
}
