//! Turns spreadsheets of Brazilian geographic data into interactive HTML maps.
//!
//! A sheet is classified as point coordinates, per-state aggregates or
//! per-municipality aggregates, cleaned into typed records, and drawn by the
//! builder that fits both the requested mode and the data.

pub mod boundary;
pub mod canvas;
pub mod classify;
pub mod colors;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod leaflet;
pub mod pipeline;
pub mod processing;
pub mod regions;
pub mod render;
pub mod samples;
pub mod server;
pub mod stats;
pub mod store;
pub mod strategy;
pub mod types;

pub use boundary::{BoundaryKind, BoundarySource, ConfiguredBoundaries, StaticBoundaries};
pub use canvas::MapCanvas;
pub use data::{load_sheet, load_sheet_from_bytes, Cell, Sheet};
pub use error::{MapError, Result};
pub use pipeline::{generate, GeneratedMap};
pub use types::{DataShape, Dataset, RenderMode, RenderRequest, Theme};
