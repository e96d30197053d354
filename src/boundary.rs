//! Region boundary geometry, keyed by region code.
//!
//! State features carry their two-letter code in `properties.sigla`;
//! municipality features carry the IBGE code in `properties.id`. Both carry
//! a display name in `properties.name`.

use crate::data::format_number;
use crate::error::{MapError, Result};
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const STATES_URL: &str =
    "https://raw.githubusercontent.com/codeforamerica/click_that_hood/master/public/data/brazil-states.geojson";
pub const MUNICIPALITIES_URL: &str =
    "https://raw.githubusercontent.com/tbrugz/geodata-br/master/geojson/geojs-100-mun.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    State,
    Municipality,
}

impl BoundaryKind {
    /// Property holding the region code.
    pub fn code_property(&self) -> &'static str {
        match self {
            BoundaryKind::State => "sigla",
            BoundaryKind::Municipality => "id",
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundaryKind::State => "state",
            BoundaryKind::Municipality => "municipality",
        })
    }
}

/// Reads a feature property as text, accepting strings and numbers.
pub fn feature_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.properties.as_ref()?.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(match n.as_f64() {
            Some(f) => format_number(f),
            None => n.to_string(),
        }),
        _ => None,
    }
}

/// Provider of boundary feature collections.
pub trait BoundarySource {
    fn lookup(&self, kind: BoundaryKind) -> Result<Arc<FeatureCollection>>;
}

impl<T: BoundarySource + ?Sized> BoundarySource for Arc<T> {
    fn lookup(&self, kind: BoundaryKind) -> Result<Arc<FeatureCollection>> {
        (**self).lookup(kind)
    }
}

/// Where a boundary dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    File(PathBuf),
}

impl Location {
    /// `http(s)://` strings are URLs, everything else is a local path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Location::Url(s.to_string())
        } else {
            Location::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => f.write_str(url),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
struct Endpoint {
    location: Location,
    timeout: Duration,
}

/// Fetches boundaries from their configured locations and keeps every
/// successful result for the lifetime of the process. Failures are not cached.
pub struct ConfiguredBoundaries {
    states: Endpoint,
    municipalities: Endpoint,
    cache: Mutex<HashMap<BoundaryKind, Arc<FeatureCollection>>>,
}

impl ConfiguredBoundaries {
    pub fn new(
        states: Location,
        states_timeout: Duration,
        municipalities: Location,
        municipalities_timeout: Duration,
    ) -> Self {
        Self {
            states: Endpoint {
                location: states,
                timeout: states_timeout,
            },
            municipalities: Endpoint {
                location: municipalities,
                timeout: municipalities_timeout,
            },
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn endpoint(&self, kind: BoundaryKind) -> &Endpoint {
        match kind {
            BoundaryKind::State => &self.states,
            BoundaryKind::Municipality => &self.municipalities,
        }
    }

    fn cached(&self, kind: BoundaryKind) -> Option<Arc<FeatureCollection>> {
        self.cache.lock().ok()?.get(&kind).cloned()
    }

    fn fetch(&self, kind: BoundaryKind) -> anyhow::Result<FeatureCollection> {
        let endpoint = self.endpoint(kind);
        info!("Fetching {} boundaries from {}", kind, endpoint.location);
        match &endpoint.location {
            Location::Url(url) => fetch_url(url, endpoint.timeout),
            Location::File(path) => load_file(path, kind),
        }
    }
}

impl BoundarySource for ConfiguredBoundaries {
    fn lookup(&self, kind: BoundaryKind) -> Result<Arc<FeatureCollection>> {
        if let Some(hit) = self.cached(kind) {
            debug!("Using cached {} boundaries", kind);
            return Ok(hit);
        }

        let collection = self.fetch(kind).map_err(|e| {
            warn!("Failed to load {} boundaries: {:#}", kind, e);
            MapError::BoundaryDataUnavailable {
                kind,
                reason: format!("{:#}", e),
            }
        })?;
        info!("Loaded {} {} features", collection.features.len(), kind);

        let collection = Arc::new(collection);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(kind, Arc::clone(&collection));
        }
        Ok(collection)
    }
}

fn fetch_url(url: &str, timeout: Duration) -> anyhow::Result<FeatureCollection> {
    use anyhow::Context;

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Request to {} failed", url))?;
    if !response.status().is_success() {
        anyhow::bail!("{} returned HTTP {}", url, response.status());
    }
    let body = response.text().context("Failed to read response body")?;
    parse_collection(&body)
}

fn parse_collection(text: &str) -> anyhow::Result<FeatureCollection> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => anyhow::bail!("GeoJSON must be a FeatureCollection"),
    }
}

fn load_file(path: &Path, kind: BoundaryKind) -> anyhow::Result<FeatureCollection> {
    use anyhow::Context;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| anyhow::anyhow!("Boundary file {:?} has no extension", path))?;

    match extension.as_str() {
        "json" | "geojson" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
            parse_collection(&text).context("Failed to parse GeoJSON")
        }
        "shp" => load_shapefile(path, kind),
        _ => anyhow::bail!("Unsupported boundary format: {}", extension),
    }
}

/// Converts a shapefile into features, copying the code and name attributes
/// into GeoJSON properties.
fn load_shapefile(path: &Path, kind: BoundaryKind) -> anyhow::Result<FeatureCollection> {
    use anyhow::{anyhow, Context};
    use shapefile::dbase::FieldValue;

    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let code_key = kind.code_property();
    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => continue,
        };

        let mut properties = serde_json::Map::new();
        for (field, value) in record.into_iter() {
            let value = match value {
                FieldValue::Character(Some(s)) => serde_json::Value::String(s.trim().to_string()),
                FieldValue::Numeric(Some(n)) => serde_json::json!(n),
                FieldValue::Integer(i) => serde_json::json!(i),
                _ => continue,
            };
            let key = field.to_lowercase();
            let key = match key.as_str() {
                "nome" | "nm_mun" | "nm_uf" => "name".to_string(),
                "cd_mun" | "cd_ibge" if code_key == "id" => "id".to_string(),
                "sigla_uf" | "sg_uf" if code_key == "sigla" => "sigla".to_string(),
                _ => key,
            };
            properties.insert(key, value);
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// In-memory boundaries, for tests and offline rendering.
#[derive(Debug, Clone, Default)]
pub struct StaticBoundaries {
    collections: HashMap<BoundaryKind, Arc<FeatureCollection>>,
}

impl StaticBoundaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: BoundaryKind, collection: FeatureCollection) -> Self {
        self.collections.insert(kind, Arc::new(collection));
        self
    }
}

impl BoundarySource for StaticBoundaries {
    fn lookup(&self, kind: BoundaryKind) -> Result<Arc<FeatureCollection>> {
        self.collections
            .get(&kind)
            .cloned()
            .ok_or(MapError::BoundaryDataUnavailable {
                kind,
                reason: "no boundary data loaded".to_string(),
            })
    }
}
