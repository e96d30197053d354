//! Resolution of the requested render mode against what the data supports.

use crate::types::{DataShape, RenderMode};

pub const WARN_NO_QUANTITY: &str =
    "Map changed to traditional: quantity column not found.";
pub const WARN_NO_REGIONS: &str =
    "Map changed to traditional: state/municipality data not found.";
pub const WARN_NO_MUNICIPALITIES: &str =
    "Map changed to traditional: municipality data not found; expected ibge_code + value columns.";

/// Mode actually used after fallback, with the warning explaining a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub effective_mode: RenderMode,
    pub warning: Option<&'static str>,
}

impl Resolution {
    fn keep(mode: RenderMode) -> Self {
        Self {
            effective_mode: mode,
            warning: None,
        }
    }

    fn fallback(warning: &'static str) -> Self {
        Self {
            effective_mode: RenderMode::Traditional,
            warning: Some(warning),
        }
    }
}

/// Total over every input: unsupported combinations fall back to the
/// traditional marker map with a warning.
pub fn resolve(requested: RenderMode, shape: DataShape, has_quantity: bool) -> Resolution {
    match requested {
        RenderMode::Heat | RenderMode::Circles if !has_quantity => {
            Resolution::fallback(WARN_NO_QUANTITY)
        }
        RenderMode::Choropleth if shape == DataShape::Coordinates => {
            Resolution::fallback(WARN_NO_REGIONS)
        }
        RenderMode::Municipalities if shape != DataShape::MunicipalityChoropleth => {
            Resolution::fallback(WARN_NO_MUNICIPALITIES)
        }
        mode => Resolution::keep(mode),
    }
}

/// The drawing algorithm that produces the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builder {
    Markers,
    Heat,
    Circles,
    States,
    Municipalities,
}

impl Builder {
    /// Label shown in the statistics overlay.
    pub fn label(&self) -> &'static str {
        match self {
            Builder::Markers => "Traditional",
            Builder::Heat => "Heat",
            Builder::Circles => "Circles",
            Builder::States => "Choropleth",
            Builder::Municipalities => "Choropleth (Municipalities)",
        }
    }
}

/// Picks the builder for a resolved mode. Aggregate data can only be drawn
/// as its own choropleth, so the shape decides for state and municipality
/// sheets; coordinate sheets follow the effective mode.
pub fn builder_for(effective_mode: RenderMode, shape: DataShape) -> Builder {
    match (shape, effective_mode) {
        (DataShape::StateChoropleth, _) => Builder::States,
        (DataShape::MunicipalityChoropleth, _) => Builder::Municipalities,
        (DataShape::Coordinates, RenderMode::Heat) => Builder::Heat,
        (DataShape::Coordinates, RenderMode::Circles) => Builder::Circles,
        (DataShape::Coordinates, _) => Builder::Markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPES: [DataShape; 3] = [
        DataShape::Coordinates,
        DataShape::StateChoropleth,
        DataShape::MunicipalityChoropleth,
    ];

    #[test]
    fn test_heat_without_quantity_falls_back() {
        let r = resolve(RenderMode::Heat, DataShape::Coordinates, false);
        assert_eq!(r.effective_mode, RenderMode::Traditional);
        assert_eq!(r.warning, Some(WARN_NO_QUANTITY));
    }

    #[test]
    fn test_circles_with_quantity_kept() {
        let r = resolve(RenderMode::Circles, DataShape::Coordinates, true);
        assert_eq!(r, Resolution::keep(RenderMode::Circles));
    }

    #[test]
    fn test_municipalities_need_municipality_data() {
        for has_quantity in [true, false] {
            let r = resolve(RenderMode::Municipalities, DataShape::StateChoropleth, has_quantity);
            assert_eq!(r.effective_mode, RenderMode::Traditional);
            assert!(r.warning.is_some());
        }
        let r = resolve(
            RenderMode::Municipalities,
            DataShape::MunicipalityChoropleth,
            true,
        );
        assert_eq!(r, Resolution::keep(RenderMode::Municipalities));
    }

    #[test]
    fn test_choropleth_needs_regions() {
        let r = resolve(RenderMode::Choropleth, DataShape::Coordinates, true);
        assert_eq!(r.warning, Some(WARN_NO_REGIONS));
        for shape in [DataShape::StateChoropleth, DataShape::MunicipalityChoropleth] {
            assert_eq!(
                resolve(RenderMode::Choropleth, shape, true),
                Resolution::keep(RenderMode::Choropleth)
            );
        }
    }

    #[test]
    fn test_total_and_deterministic() {
        for mode in RenderMode::ALL {
            for shape in SHAPES {
                for has_quantity in [true, false] {
                    let a = resolve(*mode, shape, has_quantity);
                    let b = resolve(*mode, shape, has_quantity);
                    assert_eq!(a, b);
                    // A fallback always explains itself.
                    assert_eq!(a.effective_mode != *mode, a.warning.is_some());
                }
            }
        }
    }

    #[test]
    fn test_builder_follows_shape_for_aggregates() {
        assert_eq!(
            builder_for(RenderMode::Traditional, DataShape::StateChoropleth),
            Builder::States
        );
        assert_eq!(
            builder_for(RenderMode::Choropleth, DataShape::MunicipalityChoropleth),
            Builder::Municipalities
        );
        assert_eq!(
            builder_for(RenderMode::Heat, DataShape::Coordinates),
            Builder::Heat
        );
        assert_eq!(
            builder_for(RenderMode::Choropleth, DataShape::Coordinates),
            Builder::Markers
        );
    }
}
