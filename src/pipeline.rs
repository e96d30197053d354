//! End-to-end flow: spreadsheet -> records -> resolved mode -> artifact.

use crate::boundary::BoundarySource;
use crate::data::Sheet;
use crate::error::Result;
use crate::processing::normalize;
use crate::render::{build, MapArtifact};
use crate::stats::{annotate, DatasetStats};
use crate::strategy::{builder_for, resolve};
use crate::types::{DataShape, RenderMode, RenderRequest};

/// A finished map and what happened on the way to it.
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    pub artifact: MapArtifact,
    pub requested_mode: RenderMode,
    pub effective_mode: RenderMode,
    pub warning: Option<&'static str>,
    pub shape: DataShape,
    pub has_quantity: bool,
    pub stats: DatasetStats,
}

impl GeneratedMap {
    pub fn record_count(&self) -> usize {
        self.stats.count
    }
}

pub fn generate(
    sheet: &Sheet,
    request: RenderRequest,
    boundaries: &dyn BoundarySource,
) -> Result<GeneratedMap> {
    let dataset = normalize(sheet)?;
    let resolution = resolve(request.requested_mode, dataset.shape, dataset.has_quantity);
    let builder = builder_for(resolution.effective_mode, dataset.shape);

    let mut artifact: MapArtifact = build(builder, &dataset, request.theme, boundaries)?;
    let stats = annotate(&mut artifact, &dataset, builder, request.theme);

    Ok(GeneratedMap {
        artifact,
        requested_mode: request.requested_mode,
        effective_mode: resolution.effective_mode,
        warning: resolution.warning,
        shape: dataset.shape,
        has_quantity: dataset.has_quantity,
        stats,
    })
}
