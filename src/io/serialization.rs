// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project and settings serialization.
//!
//! This module reads and writes project data (and any other serde type, such
//! as editor settings) as YAML or JSON, choosing the format from the file
//! extension.

use crate::models::project::ProjectData;
use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// File formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => bail!("Unsupported file extension: {:?}", extension),
        }
    }
}

/// Serialize a value to a string in the given format.
pub fn to_string<T: Serialize>(value: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::Yaml => serde_yaml::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)?,
    })
}

/// Parse a value from a string in the given format.
pub fn from_str<T: DeserializeOwned>(text: &str, format: Format) -> Result<T> {
    Ok(match format {
        Format::Yaml => serde_yaml::from_str(text)?,
        Format::Json => serde_json::from_str(text)?,
    })
}

/// Write a value to `path`, format chosen by extension.
pub fn write_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let text = to_string(value, Format::from_path(path)?)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read a value from `path`, format chosen by extension.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    from_str(&text, format).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Export project data to YAML or JSON.
pub fn export_project(data: &ProjectData, path: &Path) -> Result<()> {
    write_file(data, path)
}

/// Import project data from YAML or JSON.
pub fn import_project(path: &Path) -> Result<ProjectData> {
    let data: ProjectData = read_file(path)?;
    log::info!(
        "Imported {} curves ({} points) from {}",
        data.curves.len(),
        data.point_count(),
        path.display()
    );
    Ok(data)
}
