//! Error types for the normalization and rendering core.

use crate::boundary::BoundaryKind;
use crate::types::DataShape;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    /// A required logical column could not be matched against the headers.
    #[error("column '{field}' not found; available columns: {}", available.join(", "))]
    Schema {
        field: &'static str,
        available: Vec<String>,
    },

    #[error("no valid rows left in {shape} data after cleaning")]
    EmptyDataset { shape: DataShape },

    #[error("{kind} boundary data unavailable: {reason}")]
    BoundaryDataUnavailable { kind: BoundaryKind, reason: String },

    #[error("failed to build map: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MapError {
    pub fn render(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MapError::Render(Box::new(err))
    }

    /// Whether the failure is caused by the uploaded file and the user must fix it.
    pub fn is_user_error(&self) -> bool {
        matches!(self, MapError::Schema { .. } | MapError::EmptyDataset { .. })
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
