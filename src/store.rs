//! On-disk storage for finished map documents.

use crate::types::{RenderMode, Theme};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MapStore {
    dir: PathBuf,
}

impl MapStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `mapa_{mode}_{theme}_{uuid}.html`
    pub fn file_name(mode: RenderMode, theme: Theme) -> String {
        format!("mapa_{}_{}_{}.html", mode.name(), theme.name(), Uuid::new_v4())
    }

    /// Writes `html` under a fresh name and returns that name.
    pub fn save(&self, mode: RenderMode, theme: Theme, html: &str) -> Result<String> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create maps directory {:?}", self.dir))?;
        let name = Self::file_name(mode, theme);
        let path = self.dir.join(&name);
        fs::write(&path, html).with_context(|| format!("Failed to write map {:?}", path))?;
        info!("Saved map to {:?}", path);
        Ok(name)
    }

    /// Reads a stored document. `Ok(None)` when no such map exists.
    pub fn load(&self, name: &str) -> Result<Option<String>> {
        if !is_plain_file_name(name) {
            bail!("invalid map name: {name}");
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        let html =
            fs::read_to_string(&path).with_context(|| format!("Failed to read map {:?}", path))?;
        Ok(Some(html))
    }
}

/// A single path component with no separators or parent references.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
